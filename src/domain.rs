//! Persisted document shapes: the degree catalog tree, user accounts with
//! their purchased-course mirrors, and calendar events.
//!
//! Wire names are camelCase to match the documents already in the store.
//! Embedded entities are optional-field records with explicit defaulting
//! (see `builders`) rather than open-ended maps.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Degree {
  pub degree_id: String,
  pub degree_title: String,
  pub description: Option<String>,
  pub thumbnail: Option<String>,
  #[serde(default)]
  pub overview_points: Vec<OverviewPoint>,
  #[serde(default)]
  pub courses: Vec<Course>,
  pub created_at: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewPoint {
  pub title: Option<String>,
  pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub course_id: String,
  pub course_title: String,
  pub description: Option<String>,
  pub thumbnail: Option<String>,
  pub price: Option<f64>,
  #[serde(default)]
  pub overview_points: Vec<OverviewPoint>,
  #[serde(default)]
  pub chapters: Vec<Chapter>,
  pub final_test: Option<Test>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
  pub chapter_id: String,
  pub chapter_title: String,
  pub description: Option<String>,
  pub test: Option<Test>,
  #[serde(default)]
  pub lessons: Vec<Lesson>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
  pub lesson_id: String,
  pub lesson_title: String,
  pub file: Option<LessonFile>,
}

/// Metadata of an uploaded lesson asset. `duration` is only meaningful for
/// audio/video and comes from the client's payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonFile {
  pub url: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub name: String,
  pub duration: Option<f64>,
}

/// A test embedded in a chapter (`Chapter.test`) or at course level
/// (`Course.finalTest`). `totalMarks` is always recomputed from the
/// questions, never trusted from input.
///
/// `userMarks`/`progress` only appear on the copies mirrored into a user's
/// purchased courses, where scoring mutates them in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
  pub test_id: String,
  pub title: Option<String>,
  pub time_limit: Option<f64>,
  #[serde(rename = "type")]
  pub kind: Option<String>,
  #[serde(default)]
  pub questions: Vec<Question>,
  pub total_marks: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_marks: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub progress: Option<f64>,
}

/// One question of a test. MCQ questions carry `options`/`correctAnswer`,
/// typed questions carry `answer`. Unknown answer types keep only
/// `question`/`answerType` and no marks, which is deliberate passthrough.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub question: Option<String>,
  pub answer_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub correct_answer: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub answer: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub marks: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub validated: Option<bool>,
}

/// A user account document. The document id doubles as the identity-provider
/// uid for federated accounts and is a generated uuid for manual ones.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub username: String,
  /// bcrypt hash; `null` for federated accounts (no local password).
  pub password: Option<String>,
  #[serde(default)]
  pub profile_picture: String,
  #[serde(default)]
  pub profile_banner: String,
  #[serde(default)]
  pub mobile_no: String,
  #[serde(default)]
  pub marital_status: String,
  #[serde(default)]
  pub dob: String,
  #[serde(default)]
  pub gender: String,
  #[serde(default)]
  pub applying_for: String,
  #[serde(default)]
  pub educational_qualification: String,
  #[serde(default)]
  pub theological_qualification: String,
  #[serde(default)]
  pub present_address: String,
  #[serde(default)]
  pub ministry_experience: String,
  #[serde(default)]
  pub salvation_experience: String,
  #[serde(default)]
  pub signature_file: String,
  #[serde(default)]
  pub passport_photo_file: String,
  #[serde(default)]
  pub education_cert_file: String,
  #[serde(default)]
  pub purchased_courses: Vec<PurchasedCourse>,
  pub role: String,
  pub joined_date: String,
}

impl User {
  /// Copy for API responses with the password hash stripped.
  pub fn sanitized(mut self) -> Self {
    self.password = None;
    self
  }
}

/// A course a user bought, denormalized with the owning degree's identity and
/// a structural mirror of the course's chapters so scoring has somewhere to
/// write `userMarks`/`progress` without re-reading the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedCourse {
  pub course_id: String,
  pub course_title: String,
  pub degree_id: String,
  pub degree_title: String,
  pub progress: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub final_test_marks: Option<f64>,
  #[serde(default)]
  pub chapters: Vec<PurchasedChapter>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedChapter {
  pub chapter_id: String,
  pub chapter_title: String,
  pub test: Option<Test>,
  #[serde(default)]
  pub lessons: Vec<PurchasedLesson>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedLesson {
  pub lesson_id: String,
  pub lesson_title: String,
}

/// A calendar event owned by one user (unenforced foreign key).
/// `duration` is the absolute start/end distance in days, fractional.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
  pub user_id: String,
  pub title: String,
  pub start_date: String,
  pub end_date: String,
  pub duration: f64,
  pub created_at: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<i64>,
}
