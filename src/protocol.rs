//! Public request/response DTOs for the HTTP API (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Client payloads use `name`/`title` keys while stored documents use
//! `degreeTitle`/`courseTitle`; the asymmetry is part of the existing wire
//! contract and is preserved here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Course, Degree, Event, PurchasedCourse, User};

//
// Shared pieces
//

/// A stored document together with its storage-assigned id.
#[derive(Debug, Serialize)]
pub struct Doc<T: Serialize> {
    pub id: String,
    #[serde(flatten)]
    pub body: T,
}

/// A file reference in a write payload: either metadata of an already
/// uploaded object, or inline base64 content for the backend to upload.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum FileIn {
    Uploaded(UploadedFileIn),
    Inline(InlineFileIn),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileIn {
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineFileIn {
    pub name: String,
    pub content_type: String,
    pub data_base64: String,
    #[serde(default)]
    pub duration: Option<f64>,
}

//
// Degree payloads
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreeIn {
    #[serde(default)]
    pub degree_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<FileIn>,
    #[serde(default)]
    pub overview_points: Vec<OverviewPointIn>,
    #[serde(default)]
    pub courses: Vec<CourseIn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewPointIn {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseIn {
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<FileIn>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub overview_points: Vec<OverviewPointIn>,
    #[serde(default)]
    pub chapters: Vec<ChapterIn>,
    #[serde(default)]
    pub final_test: Option<TestIn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterIn {
    #[serde(default)]
    pub chapter_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub test: Option<TestIn>,
    #[serde(default)]
    pub lessons: Vec<LessonIn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonIn {
    #[serde(default)]
    pub lesson_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub file: Option<FileIn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestIn {
    #[serde(default)]
    pub test_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub time_limit: Option<f64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionIn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionIn {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub marks: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreeCreatedOut {
    pub message: String,
    pub degree_id: String,
}

#[derive(Serialize)]
pub struct DegreeUpdatedOut {
    pub message: String,
    pub degree: Degree,
}

/// `GET /course/:courseId` response: the embedded course plus the domain id
/// of the degree that owns it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithDegree {
    pub degree_id: String,
    #[serde(flatten)]
    pub course: Course,
}

//
// User payloads
//

/// Signup body. Presence of `idToken` selects the federated path; the
/// remaining fields are only read for manual signups.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupIn {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginIn {
    #[serde(default)]
    pub email_or_username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordIn {
    #[serde(default)]
    pub email: String,
}

/// Partial profile update: absent fields stay untouched (merge semantics,
/// unlike the degree editor's wholesale replace).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUserIn {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_no: Option<String>,
    #[serde(default)]
    pub marital_status: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub applying_for: Option<String>,
    #[serde(default)]
    pub educational_qualification: Option<String>,
    #[serde(default)]
    pub theological_qualification: Option<String>,
    #[serde(default)]
    pub present_address: Option<String>,
    #[serde(default)]
    pub ministry_experience: Option<String>,
    #[serde(default)]
    pub salvation_experience: Option<String>,

    #[serde(default)]
    pub profile_picture: Option<FileIn>,
    #[serde(default)]
    pub profile_banner: Option<FileIn>,
    #[serde(default)]
    pub signature_file: Option<FileIn>,
    #[serde(default)]
    pub passport_photo_file: Option<FileIn>,
    #[serde(default)]
    pub education_cert_file: Option<FileIn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCourseIn {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub course_title: String,
}

/// Score submission. `testType` is either the literal `"finalTest"` or the
/// `testId` of a chapter test inside the purchased course.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAnswersIn {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub test_type: String,
    #[serde(default)]
    pub answers: Value,
    #[serde(default)]
    pub marks: f64,
    #[serde(default)]
    pub total_marks: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateMarksIn {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub test_id: String,
    /// Positional; `null` entries leave the matching question untouched.
    #[serde(default)]
    pub validated_answers: Vec<Option<ValidatedAnswerIn>>,
}

#[derive(Debug, Deserialize)]
pub struct ValidatedAnswerIn {
    #[serde(default)]
    pub marks: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupOut {
    pub message: String,
    pub user_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOut {
    pub message: String,
    pub user_id: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct UsersOut {
    pub users: Vec<Doc<User>>,
}

#[derive(Serialize)]
pub struct UserOut {
    pub user: Doc<User>,
}

#[derive(Serialize)]
pub struct UpdatesOut {
    pub message: String,
    pub updates: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedOut {
    pub message: String,
    pub purchased_courses: Vec<PurchasedCourse>,
}

#[derive(Serialize)]
pub struct EnrolledCoursesOut {
    pub courses: Vec<PurchasedCourse>,
}

//
// Event payloads
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventIn {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdateIn {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

#[derive(Serialize)]
pub struct EventCreatedOut {
    pub message: String,
    pub event: Doc<Event>,
}

#[derive(Serialize)]
pub struct EventUpdatedOut {
    pub message: String,
    pub event: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsOut {
    pub total_events: usize,
    pub events: Vec<Doc<Event>>,
}

//
// Misc
//

#[derive(Serialize)]
pub struct MessageOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
