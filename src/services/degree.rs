//! Degree catalog service: validation, tree building, persistence, lookups.

use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::builders::build_degree;
use crate::domain::Degree;
use crate::error::ApiError;
use crate::protocol::{CourseWithDegree, DegreeIn, Doc};
use crate::state::AppState;

/// Depth-first title validation; the first missing title aborts the whole
/// operation before any upload or write happens.
fn check_required_titles(input: &DegreeIn) -> Result<(), ApiError> {
  if input.name.trim().is_empty() {
    return Err(ApiError::Validation("Degree title is required".into()));
  }
  for course in &input.courses {
    if course.title.trim().is_empty() {
      return Err(ApiError::Validation("Course title is required".into()));
    }
    for chapter in &course.chapters {
      if chapter.title.trim().is_empty() {
        return Err(ApiError::Validation("Chapter title is required".into()));
      }
      for lesson in &chapter.lessons {
        if lesson.title.trim().is_empty() {
          return Err(ApiError::Validation("Lesson title is required".into()));
        }
      }
    }
  }
  Ok(())
}

async fn find_degree_doc(
  state: &AppState,
  degree_id: &str,
) -> Result<(String, Value), ApiError> {
  state
    .store
    .query_eq(&state.config.collections.degrees, "degreeId", degree_id)
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| ApiError::NotFound(format!("No degree found with degreeId: {degree_id}")))
}

#[instrument(level = "info", skip(state, input))]
pub async fn add_degree(state: &AppState, input: DegreeIn) -> Result<String, ApiError> {
  check_required_titles(&input)?;
  let degree = build_degree(&state.blobs, input, None).await?;
  let doc = serde_json::to_value(&degree)?;
  state.store.add(&state.config.collections.degrees, doc).await?;
  info!(target: "degree", degree_id = %degree.degree_id, "degree added");
  Ok(degree.degree_id)
}

/// Every degree, unfiltered and unpaginated. O(collection size) per call;
/// acceptable while the catalog stays small.
#[instrument(level = "info", skip(state))]
pub async fn get_all_degrees(state: &AppState) -> Result<Vec<Doc<Degree>>, ApiError> {
  let docs = state.store.list(&state.config.collections.degrees).await?;
  let mut out = Vec::with_capacity(docs.len());
  for (id, doc) in docs {
    out.push(Doc { id, body: serde_json::from_value(doc)? });
  }
  Ok(out)
}

/// Point lookup by the domain `degreeId` field (not the storage key).
/// Absent is `None`, not an error.
#[instrument(level = "info", skip(state), fields(%degree_id))]
pub async fn get_degree_by_id(
  state: &AppState,
  degree_id: &str,
) -> Result<Option<Degree>, ApiError> {
  let hits = state
    .store
    .query_eq(&state.config.collections.degrees, "degreeId", degree_id)
    .await?;
  match hits.into_iter().next() {
    Some((_, doc)) => Ok(Some(serde_json::from_value(doc)?)),
    None => Ok(None),
  }
}

/// Rebuild the whole tree from the payload and replace the stored content
/// fields. Fields omitted from a nested object drop out of the document;
/// only identifiers (and `createdAt`) survive an edit untouched.
#[instrument(level = "info", skip(state, input), fields(%degree_id))]
pub async fn edit_degree(
  state: &AppState,
  degree_id: &str,
  input: DegreeIn,
) -> Result<Degree, ApiError> {
  check_required_titles(&input)?;
  let (doc_id, existing) = find_degree_doc(state, degree_id).await?;

  let mut degree = build_degree(&state.blobs, input, Some(degree_id)).await?;
  if let Some(created) = existing.get("createdAt").and_then(Value::as_i64) {
    degree.created_at = created;
  }
  degree.updated_at = Some(Utc::now().timestamp_millis());

  let mut fields = serde_json::to_value(&degree)?;
  if let Value::Object(map) = &mut fields {
    map.remove("degreeId");
    map.remove("createdAt");
  }
  state.store.update(&state.config.collections.degrees, &doc_id, fields).await?;
  info!(target: "degree", %degree_id, "degree updated");
  Ok(degree)
}

/// Deletes only the catalog document. Purchased-course mirrors referencing
/// this degree are left alone (no cascade).
#[instrument(level = "info", skip(state), fields(%degree_id))]
pub async fn delete_degree(state: &AppState, degree_id: &str) -> Result<(), ApiError> {
  let (doc_id, _) = find_degree_doc(state, degree_id).await?;
  state.store.delete(&state.config.collections.degrees, &doc_id).await?;
  info!(target: "degree", %degree_id, "degree deleted");
  Ok(())
}

/// Linear scan over every degree's embedded `courses[]`. The costliest call
/// in the system, a direct consequence of embedding courses instead of
/// indexing them separately; fine at the expected catalog scale.
#[instrument(level = "info", skip(state), fields(%course_id))]
pub async fn get_degree_by_course_id(
  state: &AppState,
  course_id: &str,
) -> Result<Doc<Degree>, ApiError> {
  let docs = state.store.list(&state.config.collections.degrees).await?;
  for (id, doc) in docs {
    let degree: Degree = serde_json::from_value(doc)?;
    if degree.courses.iter().any(|c| c.course_id == course_id) {
      return Ok(Doc { id, body: degree });
    }
  }
  warn!(target: "degree", %course_id, "course not found in any degree");
  Err(ApiError::NotFound(format!("No degree found for course ID: {course_id}")))
}

/// Same scan as above, returning the embedded course itself.
#[instrument(level = "info", skip(state), fields(%course_id))]
pub async fn get_course_by_id(
  state: &AppState,
  course_id: &str,
) -> Result<CourseWithDegree, ApiError> {
  let docs = state.store.list(&state.config.collections.degrees).await?;
  for (_, doc) in docs {
    let degree: Degree = serde_json::from_value(doc)?;
    if let Some(course) = degree.courses.iter().find(|c| c.course_id == course_id) {
      return Ok(CourseWithDegree {
        degree_id: degree.degree_id.clone(),
        course: course.clone(),
      });
    }
  }
  Err(ApiError::NotFound(format!("Course with ID {course_id} not found")))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::state::testutil::memory_state;
  use serde_json::json;

  fn degree_input(v: Value) -> DegreeIn {
    serde_json::from_value(v).expect("degree input")
  }

  fn sample_degree() -> DegreeIn {
    degree_input(json!({
      "name": "Bachelor of Theology",
      "description": "Three-year program",
      "overviewPoints": [{ "title": "Accredited", "description": "Fully accredited" }],
      "courses": [{
        "title": "New Testament Survey",
        "price": 120.0,
        "chapters": [{
          "title": "Gospels",
          "lessons": [{
            "title": "Introduction",
            "file": { "url": "https://cdn.example.com/videos/intro.mp4", "type": "video", "name": "intro.mp4" }
          }],
          "test": {
            "questions": [
              { "question": "Who wrote Luke?", "type": "MCQ", "options": ["Luke", "Paul"], "correctAnswer": "Luke", "marks": 2 }
            ]
          }
        }],
        "finalTest": {
          "questions": [{ "question": "Summarize the gospels", "type": "Typed", "marks": 10 }]
        }
      }]
    }))
  }

  #[tokio::test]
  async fn add_degree_persists_and_returns_generated_id() {
    let (state, store, _, _) = memory_state();
    let id = add_degree(&state, sample_degree()).await.expect("add");
    assert!(!id.is_empty());
    assert_eq!(store.count("degrees").await, 1);

    let degree = get_degree_by_id(&state, &id).await.expect("get").expect("present");
    assert_eq!(degree.degree_title, "Bachelor of Theology");
    let chapter_test = degree.courses[0].chapters[0].test.as_ref().expect("test");
    assert_eq!(chapter_test.total_marks, 2.0);
    assert_eq!(degree.courses[0].final_test.as_ref().expect("final").total_marks, 10.0);
  }

  #[tokio::test]
  async fn missing_degree_lookup_is_none_not_an_error() {
    let (state, _, _, _) = memory_state();
    assert!(get_degree_by_id(&state, "absent").await.expect("query").is_none());
  }

  #[tokio::test]
  async fn empty_chapter_title_fails_with_zero_writes_and_uploads() {
    let (state, store, blobs, _) = memory_state();
    let input = degree_input(json!({
      "name": "Divinity",
      "courses": [{
        "title": "Church History",
        "thumbnail": { "name": "c.png", "contentType": "image/png", "dataBase64": "aGk=" },
        "chapters": [{ "title": "", "lessons": [] }]
      }]
    }));

    let err = add_degree(&state, input).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(err.to_string(), "Chapter title is required");
    assert_eq!(store.count("degrees").await, 0);
    assert_eq!(blobs.object_count().await, 0);
  }

  #[tokio::test]
  async fn edit_replaces_subtrees_wholesale_and_preserves_ids() {
    let (state, _, _, _) = memory_state();
    let id = add_degree(&state, sample_degree()).await.expect("add");
    let before = get_degree_by_id(&state, &id).await.expect("get").expect("present");
    let course_id = before.courses[0].course_id.clone();
    let chapter_id = before.courses[0].chapters[0].chapter_id.clone();
    let lesson_id = before.courses[0].chapters[0].lessons[0].lesson_id.clone();

    // The edit omits the lesson file and the final test entirely.
    let edit = degree_input(json!({
      "name": "Bachelor of Theology (Revised)",
      "courses": [{
        "courseId": course_id,
        "title": "New Testament Survey",
        "chapters": [{
          "chapterId": chapter_id,
          "title": "Gospels",
          "lessons": [{ "lessonId": lesson_id, "title": "Introduction" }]
        }]
      }]
    }));

    let updated = edit_degree(&state, &id, edit).await.expect("edit");
    assert_eq!(updated.degree_id, id);

    let after = get_degree_by_id(&state, &id).await.expect("get").expect("present");
    assert_eq!(after.degree_title, "Bachelor of Theology (Revised)");
    assert_eq!(after.courses[0].course_id, course_id);
    assert_eq!(after.courses[0].chapters[0].chapter_id, chapter_id);
    assert_eq!(after.courses[0].chapters[0].lessons[0].lesson_id, lesson_id);
    // wholesale replace: omitted fields are gone, not carried over
    assert!(after.courses[0].chapters[0].lessons[0].file.is_none());
    assert!(after.courses[0].final_test.is_none());
    assert!(after.courses[0].chapters[0].test.is_none());
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at.is_some());
  }

  #[tokio::test]
  async fn repeated_edits_keep_identifiers_stable() {
    let (state, _, _, _) = memory_state();
    let id = add_degree(&state, sample_degree()).await.expect("add");
    let first = get_degree_by_id(&state, &id).await.expect("get").expect("present");

    let edit = |degree: &Degree| {
      degree_input(json!({
        "name": degree.degree_title,
        "courses": [{
          "courseId": degree.courses[0].course_id,
          "title": degree.courses[0].course_title,
          "chapters": [{
            "chapterId": degree.courses[0].chapters[0].chapter_id,
            "title": degree.courses[0].chapters[0].chapter_title,
            "lessons": [{
              "lessonId": degree.courses[0].chapters[0].lessons[0].lesson_id,
              "title": degree.courses[0].chapters[0].lessons[0].lesson_title
            }],
            "test": {
              "testId": degree.courses[0].chapters[0].test.as_ref().expect("test").test_id,
              "questions": [{ "question": "Who wrote Luke?", "type": "MCQ", "marks": 2 }]
            }
          }]
        }]
      }))
    };

    edit_degree(&state, &id, edit(&first)).await.expect("first edit");
    let second = get_degree_by_id(&state, &id).await.expect("get").expect("present");
    edit_degree(&state, &id, edit(&second)).await.expect("second edit");
    let third = get_degree_by_id(&state, &id).await.expect("get").expect("present");

    assert_eq!(third.degree_id, first.degree_id);
    assert_eq!(third.courses[0].course_id, first.courses[0].course_id);
    assert_eq!(
      third.courses[0].chapters[0].test.as_ref().expect("test").test_id,
      first.courses[0].chapters[0].test.as_ref().expect("test").test_id
    );
    assert_eq!(third.courses[0].chapters[0].test.as_ref().expect("test").total_marks, 2.0);
  }

  #[tokio::test]
  async fn course_scan_finds_owning_degree_or_fails() {
    let (state, _, _, _) = memory_state();
    let id = add_degree(&state, sample_degree()).await.expect("add");
    let degree = get_degree_by_id(&state, &id).await.expect("get").expect("present");
    let course_id = degree.courses[0].course_id.clone();

    let owning = get_degree_by_course_id(&state, &course_id).await.expect("found");
    assert_eq!(owning.body.degree_id, id);

    let course = get_course_by_id(&state, &course_id).await.expect("course");
    assert_eq!(course.course.course_title, "New Testament Survey");
    assert_eq!(course.degree_id, id);

    let err = get_degree_by_course_id(&state, "nope").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }

  #[tokio::test]
  async fn delete_degree_removes_document_or_fails_when_absent() {
    let (state, store, _, _) = memory_state();
    let id = add_degree(&state, sample_degree()).await.expect("add");
    delete_degree(&state, &id).await.expect("delete");
    assert_eq!(store.count("degrees").await, 0);

    let err = delete_degree(&state, &id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }
}
