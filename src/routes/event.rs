//! Event endpoints. The `/event/:id` path is read as a user id on GET and an
//! event id on PUT/DELETE, matching the existing client contract.

use std::sync::Arc;
use axum::{
  extract::{Path, State},
  http::StatusCode,
  Json,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::protocol::{EventCreatedOut, EventIn, EventUpdateIn, EventUpdatedOut, EventsOut, MessageOut};
use crate::services::event;
use crate::state::AppState;

#[instrument(level = "info", skip(state, body), fields(user_id = %body.user_id))]
pub async fn create(
  State(state): State<Arc<AppState>>,
  Json(body): Json<EventIn>,
) -> Result<(StatusCode, Json<EventCreatedOut>), ApiError> {
  let created = event::create_event(&state, body).await?;
  Ok((
    StatusCode::CREATED,
    Json(EventCreatedOut { message: "Event created successfully!".into(), event: created }),
  ))
}

#[instrument(level = "info", skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<EventsOut>, ApiError> {
  let events = event::get_all_events(&state).await?;
  Ok(Json(EventsOut { total_events: events.len(), events }))
}

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn for_user(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
) -> Result<Json<EventsOut>, ApiError> {
  let events = event::get_user_events(&state, &user_id).await?;
  Ok(Json(EventsOut { total_events: events.len(), events }))
}

#[instrument(level = "info", skip(state, body), fields(%event_id))]
pub async fn update(
  State(state): State<Arc<AppState>>,
  Path(event_id): Path<String>,
  Json(body): Json<EventUpdateIn>,
) -> Result<Json<EventUpdatedOut>, ApiError> {
  let fields = event::update_event(&state, &event_id, body).await?;
  Ok(Json(EventUpdatedOut { message: "Event updated successfully!".into(), event: fields }))
}

#[instrument(level = "info", skip(state), fields(%event_id))]
pub async fn remove(
  State(state): State<Arc<AppState>>,
  Path(event_id): Path<String>,
) -> Result<Json<MessageOut>, ApiError> {
  event::delete_event(&state, &event_id).await?;
  Ok(Json(MessageOut { message: "Event deleted successfully!".into() }))
}
