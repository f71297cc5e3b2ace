//! Degree endpoints. Thin wrappers that forward to the degree service and
//! translate results into status codes and JSON bodies.

use std::sync::Arc;
use axum::{
  extract::{Path, State},
  http::StatusCode,
  Json,
};
use tracing::instrument;

use crate::domain::Degree;
use crate::error::ApiError;
use crate::protocol::{
  CourseWithDegree, DegreeCreatedOut, DegreeIn, DegreeUpdatedOut, Doc, MessageOut,
};
use crate::services::degree;
use crate::state::AppState;

#[instrument(level = "info", skip(state, body))]
pub async fn create(
  State(state): State<Arc<AppState>>,
  Json(body): Json<DegreeIn>,
) -> Result<(StatusCode, Json<DegreeCreatedOut>), ApiError> {
  let degree_id = degree::add_degree(&state, body).await?;
  Ok((
    StatusCode::CREATED,
    Json(DegreeCreatedOut { message: "Degree added successfully!".into(), degree_id }),
  ))
}

#[instrument(level = "info", skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Doc<Degree>>>, ApiError> {
  Ok(Json(degree::get_all_degrees(&state).await?))
}

#[instrument(level = "info", skip(state), fields(%degree_id))]
pub async fn get_by_id(
  State(state): State<Arc<AppState>>,
  Path(degree_id): Path<String>,
) -> Result<Json<Degree>, ApiError> {
  match degree::get_degree_by_id(&state, &degree_id).await? {
    Some(degree) => Ok(Json(degree)),
    None => Err(ApiError::NotFound("Degree not found".into())),
  }
}

#[instrument(level = "info", skip(state, body), fields(%degree_id))]
pub async fn edit(
  State(state): State<Arc<AppState>>,
  Path(degree_id): Path<String>,
  Json(body): Json<DegreeIn>,
) -> Result<Json<DegreeUpdatedOut>, ApiError> {
  let degree = degree::edit_degree(&state, &degree_id, body).await?;
  Ok(Json(DegreeUpdatedOut { message: "Degree updated successfully".into(), degree }))
}

#[instrument(level = "info", skip(state), fields(%degree_id))]
pub async fn remove(
  State(state): State<Arc<AppState>>,
  Path(degree_id): Path<String>,
) -> Result<Json<MessageOut>, ApiError> {
  degree::delete_degree(&state, &degree_id).await?;
  Ok(Json(MessageOut { message: "Degree deleted successfully".into() }))
}

#[instrument(level = "info", skip(state), fields(%course_id))]
pub async fn get_by_course(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
) -> Result<Json<Doc<Degree>>, ApiError> {
  Ok(Json(degree::get_degree_by_course_id(&state, &course_id).await?))
}

#[instrument(level = "info", skip(state), fields(%course_id))]
pub async fn get_course(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
) -> Result<Json<CourseWithDegree>, ApiError> {
  Ok(Json(degree::get_course_by_id(&state, &course_id).await?))
}
