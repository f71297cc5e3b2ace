//! Event service: per-user calendar CRUD with day-span durations.
//! No cross-event invariants (overlap, capacity) are enforced.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::domain::Event;
use crate::error::ApiError;
use crate::protocol::{Doc, EventIn, EventUpdateIn};
use crate::state::AppState;

fn parse_date(s: &str) -> Result<DateTime<Utc>, ApiError> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  // bare dates are taken as midnight UTC
  if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    if let Some(dt) = date.and_hms_opt(0, 0, 0) {
      return Ok(DateTime::from_naive_utc_and_offset(dt, Utc));
    }
  }
  Err(ApiError::Validation(format!("Invalid date: {s}")))
}

/// Absolute start/end distance in days, fractional.
fn day_span(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
  ((end - start).num_milliseconds().abs() as f64) / 86_400_000.0
}

#[instrument(level = "info", skip(state, input))]
pub async fn create_event(state: &AppState, input: EventIn) -> Result<Doc<Event>, ApiError> {
  if input.user_id.is_empty()
    || input.title.is_empty()
    || input.start_date.is_empty()
    || input.end_date.is_empty()
  {
    return Err(ApiError::Validation(
      "Missing required fields: userId, title, startDate, or endDate".into(),
    ));
  }
  let start = parse_date(&input.start_date)?;
  let end = parse_date(&input.end_date)?;

  let event = Event {
    user_id: input.user_id,
    title: input.title,
    start_date: start.to_rfc3339(),
    end_date: end.to_rfc3339(),
    duration: day_span(start, end),
    created_at: Utc::now().timestamp_millis(),
    updated_at: None,
  };
  let id = state
    .store
    .add(&state.config.collections.events, serde_json::to_value(&event)?)
    .await?;
  info!(target: "event", %id, user_id = %event.user_id, "event created");
  Ok(Doc { id, body: event })
}

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn get_user_events(state: &AppState, user_id: &str) -> Result<Vec<Doc<Event>>, ApiError> {
  if user_id.is_empty() {
    return Err(ApiError::Validation("User ID is required".into()));
  }
  let docs = state
    .store
    .query_eq(&state.config.collections.events, "userId", user_id)
    .await?;
  let mut out = Vec::with_capacity(docs.len());
  for (id, doc) in docs {
    out.push(Doc { id, body: serde_json::from_value(doc)? });
  }
  Ok(out)
}

/// Full update of the mutable fields; `duration` is recomputed, `createdAt`
/// and `userId` stay as stored.
#[instrument(level = "info", skip(state, input), fields(%event_id))]
pub async fn update_event(
  state: &AppState,
  event_id: &str,
  input: EventUpdateIn,
) -> Result<Value, ApiError> {
  if input.title.is_empty() || input.start_date.is_empty() || input.end_date.is_empty() {
    return Err(ApiError::Validation(
      "Missing required fields: eventId, title, startDate, or endDate".into(),
    ));
  }
  let events = &state.config.collections.events;
  if state.store.get(events, event_id).await?.is_none() {
    return Err(ApiError::NotFound("Event not found.".into()));
  }
  let start = parse_date(&input.start_date)?;
  let end = parse_date(&input.end_date)?;

  let fields = json!({
    "title": input.title,
    "startDate": start.to_rfc3339(),
    "endDate": end.to_rfc3339(),
    "duration": day_span(start, end),
    "updatedAt": Utc::now().timestamp_millis(),
  });
  state.store.update(events, event_id, fields.clone()).await?;
  info!(target: "event", %event_id, "event updated");
  Ok(fields)
}

#[instrument(level = "info", skip(state), fields(%event_id))]
pub async fn delete_event(state: &AppState, event_id: &str) -> Result<(), ApiError> {
  let events = &state.config.collections.events;
  if state.store.get(events, event_id).await?.is_none() {
    return Err(ApiError::NotFound("Event not found.".into()));
  }
  state.store.delete(events, event_id).await?;
  info!(target: "event", %event_id, "event deleted");
  Ok(())
}

#[instrument(level = "info", skip(state))]
pub async fn get_all_events(state: &AppState) -> Result<Vec<Doc<Event>>, ApiError> {
  let docs = state.store.list(&state.config.collections.events).await?;
  let mut out = Vec::with_capacity(docs.len());
  for (id, doc) in docs {
    out.push(Doc { id, body: serde_json::from_value(doc)? });
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::state::testutil::memory_state;
  use serde_json::json;

  fn event_input(user_id: &str, start: &str, end: &str) -> EventIn {
    serde_json::from_value(json!({
      "userId": user_id,
      "title": "Retreat",
      "startDate": start,
      "endDate": end
    }))
    .expect("event input")
  }

  #[tokio::test]
  async fn duration_is_the_absolute_day_span() {
    let (state, _, _, _) = memory_state();
    let created = create_event(&state, event_input("u-1", "2026-03-01", "2026-03-03"))
      .await
      .expect("create");
    assert_eq!(created.body.duration, 2.0);

    // reversed dates still yield a positive span
    let reversed = create_event(&state, event_input("u-1", "2026-03-03", "2026-03-01"))
      .await
      .expect("create");
    assert_eq!(reversed.body.duration, 2.0);

    let partial = create_event(
      &state,
      event_input("u-1", "2026-03-01T00:00:00Z", "2026-03-01T12:00:00Z"),
    )
    .await
    .expect("create");
    assert_eq!(partial.body.duration, 0.5);
  }

  #[tokio::test]
  async fn missing_fields_and_bad_dates_are_validation_errors() {
    let (state, store, _, _) = memory_state();

    let missing: EventIn =
      serde_json::from_value(json!({ "userId": "u-1", "title": "X" })).expect("input");
    let err = create_event(&state, missing).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = create_event(&state, event_input("u-1", "not-a-date", "2026-03-03"))
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(store.count("events").await, 0);
  }

  #[tokio::test]
  async fn user_events_are_filtered_by_owner() {
    let (state, _, _, _) = memory_state();
    create_event(&state, event_input("u-1", "2026-03-01", "2026-03-02")).await.expect("create");
    create_event(&state, event_input("u-2", "2026-03-01", "2026-03-02")).await.expect("create");

    assert_eq!(get_user_events(&state, "u-1").await.expect("query").len(), 1);
    assert_eq!(get_all_events(&state).await.expect("all").len(), 2);
  }

  #[tokio::test]
  async fn update_recomputes_duration_and_requires_existence() {
    let (state, _, _, _) = memory_state();
    let created = create_event(&state, event_input("u-1", "2026-03-01", "2026-03-02"))
      .await
      .expect("create");

    let update: EventUpdateIn = serde_json::from_value(json!({
      "title": "Extended Retreat",
      "startDate": "2026-03-01",
      "endDate": "2026-03-05"
    }))
    .expect("input");
    let fields = update_event(&state, &created.id, update).await.expect("update");
    assert_eq!(fields["duration"], 4.0);

    let events = get_user_events(&state, "u-1").await.expect("query");
    assert_eq!(events[0].body.title, "Extended Retreat");
    assert!(events[0].body.updated_at.is_some());
    assert_eq!(events[0].body.created_at, created.body.created_at);

    let update: EventUpdateIn = serde_json::from_value(json!({
      "title": "X",
      "startDate": "2026-03-01",
      "endDate": "2026-03-02"
    }))
    .expect("input");
    let err = update_event(&state, "ghost", update).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }

  #[tokio::test]
  async fn delete_requires_existence() {
    let (state, store, _, _) = memory_state();
    let created = create_event(&state, event_input("u-1", "2026-03-01", "2026-03-02"))
      .await
      .expect("create");
    delete_event(&state, &created.id).await.expect("delete");
    assert_eq!(store.count("events").await, 0);

    let err = delete_event(&state, &created.id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }
}
