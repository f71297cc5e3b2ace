//! Domain builders: turn raw nested payloads into normalized documents,
//! assigning generated identifiers and computed fields.
//!
//! Identifier policy: an id present on an incoming nested object is passed
//! through unchanged (edit), an absent id is generated (create). Content
//! fields are always rebuilt from the payload, so omitted fields drop out of
//! the stored document — degree edits are wholesale replaces, not merges.
//!
//! Uploads fan out per nesting level and are awaited jointly; the first
//! failure aborts the whole build with no cleanup of blobs already uploaded.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use futures::future::try_join_all;
use uuid::Uuid;

use crate::blobs::BlobStore;
use crate::domain::{
  Chapter, Course, Degree, Lesson, LessonFile, OverviewPoint, Question, Test, User,
};
use crate::error::ApiError;
use crate::identity::Claims;
use crate::protocol::{
  ChapterIn, CourseIn, DegreeIn, FileIn, LessonIn, OverviewPointIn, QuestionIn, SignupIn, TestIn,
};

fn new_id() -> String {
  Uuid::new_v4().to_string()
}

/// Storage folder and normalized kind for an incoming content type.
/// Returns None for types the platform does not accept.
fn classify_content_type(content_type: &str) -> Option<(&'static str, &'static str)> {
  let (top, sub) = content_type.split_once('/').unwrap_or((content_type, ""));
  match top {
    "video" => Some(("video", "videos")),
    "audio" => Some(("audio", "audios")),
    "image" => Some(("image", "images")),
    "text" => Some(("document", "documents")),
    "application" => match sub {
      "pdf" => Some(("pdf", "documents")),
      "msword" => Some(("document", "documents")),
      "vnd.ms-powerpoint" => Some(("ppt", "presentations")),
      _ if sub.contains("presentation") => Some(("ppt", "presentations")),
      _ if sub.contains("word") || sub.contains("document") => Some(("document", "documents")),
      _ => None,
    },
    _ => None,
  }
}

fn object_path(folder: &str, name: &str) -> String {
  format!("{}/{}_{}", folder, new_id(), name)
}

fn decode_payload(data_base64: &str) -> Result<Vec<u8>, ApiError> {
  STANDARD
    .decode(data_base64)
    .map_err(|e| ApiError::Upload(format!("Invalid base64 file payload: {e}")))
}

/// Resolve a file reference to a bare URL, uploading inline content into the
/// given folder. Used for thumbnails and user profile files.
pub async fn upload_to_folder(
  blobs: &BlobStore,
  folder: &str,
  file: &FileIn,
) -> Result<String, ApiError> {
  match file {
    FileIn::Uploaded(meta) => Ok(meta.url.clone()),
    FileIn::Inline(inline) => {
      let bytes = decode_payload(&inline.data_base64)?;
      blobs.put(&object_path(folder, &inline.name), bytes, &inline.content_type).await
    }
  }
}

/// Resolve a lesson file reference to stored metadata, routing inline content
/// to the folder matching its type.
pub async fn upload_lesson_file(blobs: &BlobStore, file: &FileIn) -> Result<LessonFile, ApiError> {
  match file {
    FileIn::Uploaded(meta) => Ok(LessonFile {
      url: meta.url.clone(),
      kind: meta.kind.clone().unwrap_or_default(),
      name: meta.name.clone().unwrap_or_default(),
      duration: meta.duration,
    }),
    FileIn::Inline(inline) => {
      let (kind, folder) = classify_content_type(&inline.content_type)
        .ok_or_else(|| ApiError::Upload(format!("Unsupported file type: {}", inline.content_type)))?;
      let bytes = decode_payload(&inline.data_base64)?;
      let url = blobs.put(&object_path(folder, &inline.name), bytes, &inline.content_type).await?;
      Ok(LessonFile {
        url,
        kind: kind.to_string(),
        name: inline.name.clone(),
        duration: inline.duration,
      })
    }
  }
}

/// Build a normalized test. `totalMarks` is recomputed from the questions on
/// every build — never copied from input.
pub fn build_test(input: Option<&TestIn>) -> Option<Test> {
  let input = input?;
  let questions: Vec<Question> = input.questions.iter().map(build_question).collect();
  let total_marks = questions.iter().filter_map(|q| q.marks).sum();
  Some(Test {
    test_id: input.test_id.clone().unwrap_or_else(new_id),
    title: input.title.clone(),
    time_limit: input.time_limit,
    kind: input.kind.clone(),
    questions,
    total_marks,
    user_marks: None,
    progress: None,
  })
}

/// Normalize one question. Types other than MCQ/Typed keep only
/// `question`/`answerType` and carry no marks (intentional passthrough).
pub fn build_question(input: &QuestionIn) -> Question {
  let mut q = Question {
    question: input.question.clone(),
    answer_type: input.kind.clone(),
    ..Question::default()
  };
  match input.kind.as_deref() {
    Some("MCQ") => {
      q.options = Some(input.options.clone().unwrap_or_default());
      q.correct_answer = input.correct_answer.clone();
      q.marks = Some(input.marks.unwrap_or(1.0));
    }
    Some("Typed") => {
      q.answer = Some(input.answer.clone().unwrap_or_default());
      q.marks = Some(input.marks.unwrap_or(0.0));
    }
    _ => {}
  }
  q
}

fn build_overview_points(points: Vec<OverviewPointIn>) -> Vec<OverviewPoint> {
  points
    .into_iter()
    .map(|p| OverviewPoint { title: p.title, description: p.description })
    .collect()
}

async fn build_lesson(blobs: &BlobStore, input: LessonIn) -> Result<Lesson, ApiError> {
  let file = match &input.file {
    Some(f) => Some(upload_lesson_file(blobs, f).await?),
    None => None,
  };
  Ok(Lesson {
    lesson_id: input.lesson_id.unwrap_or_else(new_id),
    lesson_title: input.title,
    file,
  })
}

async fn build_chapter(blobs: &BlobStore, input: ChapterIn) -> Result<Chapter, ApiError> {
  let test = build_test(input.test.as_ref());
  let lessons = try_join_all(input.lessons.into_iter().map(|l| build_lesson(blobs, l))).await?;
  Ok(Chapter {
    chapter_id: input.chapter_id.unwrap_or_else(new_id),
    chapter_title: input.title,
    description: input.description,
    test,
    lessons,
  })
}

async fn build_course(blobs: &BlobStore, input: CourseIn) -> Result<Course, ApiError> {
  let thumbnail = match &input.thumbnail {
    Some(f) => Some(upload_to_folder(blobs, "thumbnails", f).await?),
    None => None,
  };
  let final_test = build_test(input.final_test.as_ref());
  let chapters = try_join_all(input.chapters.into_iter().map(|c| build_chapter(blobs, c))).await?;
  Ok(Course {
    course_id: input.course_id.unwrap_or_else(new_id),
    course_title: input.title,
    description: input.description,
    thumbnail,
    price: input.price,
    overview_points: build_overview_points(input.overview_points),
    chapters,
    final_test,
  })
}

/// Build a full degree tree from a write payload, uploading every referenced
/// file. `existing_id` wins over any id in the payload; both beat generation.
pub async fn build_degree(
  blobs: &BlobStore,
  input: DegreeIn,
  existing_id: Option<&str>,
) -> Result<Degree, ApiError> {
  let thumbnail = match &input.thumbnail {
    Some(f) => Some(upload_to_folder(blobs, "thumbnails", f).await?),
    None => None,
  };
  let degree_id = existing_id
    .map(str::to_string)
    .or(input.degree_id)
    .unwrap_or_else(new_id);
  let courses = try_join_all(input.courses.into_iter().map(|c| build_course(blobs, c))).await?;
  Ok(Degree {
    degree_id,
    degree_title: input.name,
    description: input.description,
    thumbnail,
    overview_points: build_overview_points(input.overview_points),
    courses,
    created_at: Utc::now().timestamp_millis(),
    updated_at: None,
  })
}

/// Build a user record. Federated signups take their profile from verified
/// token claims and have no local password; manual signups are hashed.
pub fn build_user(input: &SignupIn, claims: Option<&Claims>) -> Result<User, ApiError> {
  let joined_date = Utc::now().to_rfc3339();
  let user = match claims {
    Some(claims) => {
      let display_name = claims.name.clone().unwrap_or_default();
      let mut parts = display_name.split_whitespace();
      let first_name = parts.next().unwrap_or_default().to_string();
      let last_name = parts.next().unwrap_or_default().to_string();
      let username = claims.email.split('@').next().unwrap_or_default().to_string();
      User {
        first_name,
        last_name,
        email: claims.email.clone(),
        username,
        password: None,
        profile_picture: claims.picture.clone().unwrap_or_default(),
        profile_banner: String::new(),
        mobile_no: String::new(),
        marital_status: String::new(),
        dob: String::new(),
        gender: String::new(),
        applying_for: String::new(),
        educational_qualification: String::new(),
        theological_qualification: String::new(),
        present_address: String::new(),
        ministry_experience: String::new(),
        salvation_experience: String::new(),
        signature_file: String::new(),
        passport_photo_file: String::new(),
        education_cert_file: String::new(),
        purchased_courses: Vec::new(),
        role: "client".into(),
        joined_date,
      }
    }
    None => {
      let hash = bcrypt::hash(&input.password, bcrypt::DEFAULT_COST)?;
      User {
        first_name: input.first_name.clone(),
        last_name: input.last_name.clone(),
        email: input.email.clone(),
        username: input.username.clone(),
        password: Some(hash),
        profile_picture: String::new(),
        profile_banner: String::new(),
        mobile_no: String::new(),
        marital_status: String::new(),
        dob: String::new(),
        gender: String::new(),
        applying_for: String::new(),
        educational_qualification: String::new(),
        theological_qualification: String::new(),
        present_address: String::new(),
        ministry_experience: String::new(),
        salvation_experience: String::new(),
        signature_file: String::new(),
        passport_photo_file: String::new(),
        education_cert_file: String::new(),
        purchased_courses: Vec::new(),
        role: "client".into(),
        joined_date,
      }
    }
  };
  Ok(user)
}
