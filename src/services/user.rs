//! User service: signup/login/password flows, profile edits, course
//! purchases, and test scoring over the purchased-course mirrors.
//!
//! Purchased-course scoring is a read-modify-write of one array field. The
//! store only guarantees single-document write atomicity, so those sequences
//! take a per-user lock (see `AppState::user_lock`); signup uniqueness stays
//! query-before-write and can still race across processes.

use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::builders::{build_user, upload_to_folder};
use crate::domain::{Course, PurchasedChapter, PurchasedCourse, PurchasedLesson, User};
use crate::error::ApiError;
use crate::protocol::{Doc, EditUserIn, LoginIn, MarkAnswersIn, SignupIn, ValidateMarksIn};
use crate::services::degree;
use crate::state::AppState;
use crate::util::is_email;

fn parse_user(doc: Value) -> Result<User, ApiError> {
  Ok(serde_json::from_value(doc)?)
}

async fn load_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
  let doc = state
    .store
    .get(&state.config.collections.users, user_id)
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found.".into()))?;
  parse_user(doc)
}

async fn exists_with(state: &AppState, field: &str, value: &str) -> Result<bool, ApiError> {
  Ok(!state
    .store
    .query_eq(&state.config.collections.users, field, value)
    .await?
    .is_empty())
}

async fn persist_purchases(
  state: &AppState,
  user_id: &str,
  purchases: &[PurchasedCourse],
) -> Result<(), ApiError> {
  state
    .store
    .update(
      &state.config.collections.users,
      user_id,
      json!({ "purchasedCourses": purchases }),
    )
    .await
}

fn progress_pct(marks: f64, total_marks: f64) -> f64 {
  if total_marks > 0.0 { marks / total_marks * 100.0 } else { 0.0 }
}

/// Returns `(user id, human message)`. Federated re-signup with an existing
/// account is a no-op success, not an error.
#[instrument(level = "info", skip(state, input), fields(federated = input.id_token.is_some()))]
pub async fn signup_user(state: &AppState, input: SignupIn) -> Result<(String, String), ApiError> {
  let users = &state.config.collections.users;

  if let Some(token) = input.id_token.clone() {
    let claims = state.identity.verify_token(&token).await?;
    if state.store.get(users, &claims.uid).await?.is_some() {
      info!(target: "user", uid = %claims.uid, "federated re-signup; account already present");
      return Ok((claims.uid, "User already exists!".into()));
    }
    let user = build_user(&input, Some(&claims))?;
    state.store.set(users, &claims.uid, serde_json::to_value(&user)?).await?;
    info!(target: "user", uid = %claims.uid, "federated signup complete");
    return Ok((claims.uid, "Federated signup successful!".into()));
  }

  if input.first_name.is_empty()
    || input.last_name.is_empty()
    || input.email.is_empty()
    || input.username.is_empty()
    || input.password.is_empty()
  {
    return Err(ApiError::Validation("All fields are required for manual signup.".into()));
  }

  // Existence checks are not atomic with the write below; concurrent signups
  // of the same name can still race.
  if exists_with(state, "username", &input.username).await? {
    return Err(ApiError::Conflict("Username already exists!".into()));
  }
  if exists_with(state, "email", &input.email).await? {
    return Err(ApiError::Conflict("Email already exists!".into()));
  }

  let user = build_user(&input, None)?;
  let user_id = Uuid::new_v4().to_string();
  state.store.set(users, &user_id, serde_json::to_value(&user)?).await?;
  info!(target: "user", %user_id, "manual signup complete");
  Ok((user_id, "Manual signup successful!".into()))
}

/// Returns `(user id, user)` with the password hash stripped. Federated login
/// never creates an account — signup must happen first.
#[instrument(level = "info", skip(state, input), fields(federated = input.id_token.is_some()))]
pub async fn login_user(state: &AppState, input: LoginIn) -> Result<(String, User), ApiError> {
  let users = &state.config.collections.users;

  if let Some(token) = &input.id_token {
    let claims = state.identity.verify_token(token).await?;
    let doc = state
      .store
      .get(users, &claims.uid)
      .await?
      .ok_or_else(|| ApiError::NotFound("User not found. Please sign up first.".into()))?;
    let user = parse_user(doc)?;
    info!(target: "user", uid = %claims.uid, "federated login");
    return Ok((claims.uid, user.sanitized()));
  }

  if input.email_or_username.is_empty() || input.password.is_empty() {
    return Err(ApiError::Validation("Email/Username and Password are required.".into()));
  }

  let field = if is_email(&input.email_or_username) { "email" } else { "username" };
  let hits = state.store.query_eq(users, field, &input.email_or_username).await?;
  let (user_id, doc) = hits
    .into_iter()
    .next()
    .ok_or_else(|| ApiError::Auth("Invalid username or email.".into()))?;
  let user = parse_user(doc)?;

  let valid = match &user.password {
    Some(hash) => bcrypt::verify(&input.password, hash)?,
    None => false,
  };
  if !valid {
    warn!(target: "user", %user_id, "password mismatch");
    return Err(ApiError::Auth("Incorrect password.".into()));
  }
  info!(target: "user", %user_id, "manual login");
  Ok((user_id, user.sanitized()))
}

/// Delegates to the identity provider's reset-email flow. Accounts without a
/// local password (federated-only) are rejected with a distinct message.
#[instrument(level = "info", skip(state), fields(%email))]
pub async fn forgot_password(state: &AppState, email: &str) -> Result<String, ApiError> {
  if email.is_empty() {
    return Err(ApiError::Validation("Email is required to reset the password.".into()));
  }
  let hits = state
    .store
    .query_eq(&state.config.collections.users, "email", email)
    .await?;
  let (_, doc) = hits
    .into_iter()
    .next()
    .ok_or_else(|| ApiError::NotFound("No user found with this email.".into()))?;
  let user = parse_user(doc)?;

  if user.password.is_none() {
    return Err(ApiError::Conflict(
      "This account uses a federated sign-in provider. Reset your password through that provider."
        .into(),
    ));
  }

  state.identity.send_password_reset(email).await?;
  info!(target: "user", %email, "password reset email requested");
  Ok("Password reset email sent successfully. Please check your inbox.".into())
}

/// Field-level merge: only the fields present (and non-empty) in the payload
/// are written; everything else stays untouched. Deliberately the opposite of
/// the degree editor's wholesale replace.
#[instrument(level = "info", skip(state, input), fields(%user_id))]
pub async fn edit_user(
  state: &AppState,
  user_id: &str,
  input: EditUserIn,
) -> Result<Value, ApiError> {
  let users = &state.config.collections.users;
  if state.store.get(users, user_id).await?.is_none() {
    return Err(ApiError::NotFound("User not found.".into()));
  }

  let mut updates = Map::new();
  let text_fields: [(&str, &Option<String>); 13] = [
    ("firstName", &input.first_name),
    ("lastName", &input.last_name),
    ("email", &input.email),
    ("mobileNo", &input.mobile_no),
    ("maritalStatus", &input.marital_status),
    ("dob", &input.dob),
    ("gender", &input.gender),
    ("applyingFor", &input.applying_for),
    ("educationalQualification", &input.educational_qualification),
    ("theologicalQualification", &input.theological_qualification),
    ("presentAddress", &input.present_address),
    ("ministryExperience", &input.ministry_experience),
    ("salvationExperience", &input.salvation_experience),
  ];
  for (key, value) in text_fields {
    if let Some(v) = value {
      if !v.is_empty() {
        updates.insert(key.to_string(), Value::String(v.clone()));
      }
    }
  }

  let file_fields = [
    ("profilePicture", "profilePictures", &input.profile_picture),
    ("profileBanner", "profileBanners", &input.profile_banner),
    ("signatureFile", "signatures", &input.signature_file),
    ("passportPhotoFile", "passportPhotos", &input.passport_photo_file),
    ("educationCertFile", "educationCerts", &input.education_cert_file),
  ];
  for (key, folder, file) in file_fields {
    if let Some(f) = file {
      let url = upload_to_folder(&state.blobs, folder, f).await?;
      updates.insert(key.to_string(), Value::String(url));
    }
  }

  if updates.is_empty() {
    return Err(ApiError::Validation("No valid fields to update.".into()));
  }

  state.store.update(users, user_id, Value::Object(updates.clone())).await?;
  info!(target: "user", %user_id, fields = updates.len(), "profile updated");
  Ok(Value::Object(updates))
}

#[instrument(level = "info", skip(state))]
pub async fn get_all_users(state: &AppState) -> Result<Vec<Doc<User>>, ApiError> {
  let docs = state.store.list(&state.config.collections.users).await?;
  let mut out = Vec::with_capacity(docs.len());
  for (id, doc) in docs {
    out.push(Doc { id, body: parse_user(doc)?.sanitized() });
  }
  Ok(out)
}

#[instrument(level = "info", skip(state), fields(%role))]
pub async fn get_users_by_role(state: &AppState, role: &str) -> Result<Vec<Doc<User>>, ApiError> {
  let docs = state
    .store
    .query_eq(&state.config.collections.users, "role", role)
    .await?;
  let mut out = Vec::with_capacity(docs.len());
  for (id, doc) in docs {
    out.push(Doc { id, body: parse_user(doc)?.sanitized() });
  }
  Ok(out)
}

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn get_user_by_id(state: &AppState, user_id: &str) -> Result<Doc<User>, ApiError> {
  let user = load_user(state, user_id).await?;
  Ok(Doc { id: user_id.to_string(), body: user.sanitized() })
}

/// Removes both the document-store record and the identity-provider account.
#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn delete_user(state: &AppState, user_id: &str) -> Result<(), ApiError> {
  let users = &state.config.collections.users;
  if state.store.get(users, user_id).await?.is_none() {
    return Err(ApiError::NotFound("User not found.".into()));
  }
  state.store.delete(users, user_id).await?;
  state.identity.delete_account(user_id).await?;
  info!(target: "user", %user_id, "user deleted");
  Ok(())
}

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn get_enrolled_courses(
  state: &AppState,
  user_id: &str,
) -> Result<Vec<PurchasedCourse>, ApiError> {
  let doc = state
    .store
    .get(&state.config.collections.users, user_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("No user found with ID: {user_id}")))?;
  Ok(parse_user(doc)?.purchased_courses)
}

fn mirror_chapters(course: &Course) -> Vec<PurchasedChapter> {
  course
    .chapters
    .iter()
    .map(|ch| PurchasedChapter {
      chapter_id: ch.chapter_id.clone(),
      chapter_title: ch.chapter_title.clone(),
      test: ch.test.clone(),
      lessons: ch
        .lessons
        .iter()
        .map(|l| PurchasedLesson {
          lesson_id: l.lesson_id.clone(),
          lesson_title: l.lesson_title.clone(),
        })
        .collect(),
    })
    .collect()
}

/// Resolves the owning degree, mirrors the course structure and appends the
/// purchase. A second purchase of the same course is a conflict; the list
/// never holds two entries for one courseId.
#[instrument(level = "info", skip(state), fields(%user_id, %course_id))]
pub async fn add_course_to_user(
  state: &AppState,
  user_id: &str,
  course_id: &str,
  course_title: &str,
) -> Result<Vec<PurchasedCourse>, ApiError> {
  let lock = state.user_lock(user_id).await;
  let _guard = lock.lock().await;

  let owning = degree::get_degree_by_course_id(state, course_id).await?;
  let mut user = load_user(state, user_id).await?;
  if user.purchased_courses.iter().any(|p| p.course_id == course_id) {
    return Err(ApiError::Conflict("You have already purchased this course.".into()));
  }

  let degree = owning.body;
  let course = degree
    .courses
    .iter()
    .find(|c| c.course_id == course_id)
    .ok_or_else(|| ApiError::NotFound(format!("No degree found for course ID: {course_id}")))?;

  let title = if course_title.is_empty() {
    course.course_title.clone()
  } else {
    course_title.to_string()
  };
  user.purchased_courses.push(PurchasedCourse {
    course_id: course_id.to_string(),
    course_title: title,
    degree_id: degree.degree_id.clone(),
    degree_title: degree.degree_title.clone(),
    progress: 0.0,
    final_test_marks: None,
    chapters: mirror_chapters(course),
  });

  persist_purchases(state, user_id, &user.purchased_courses).await?;
  info!(target: "user", %user_id, %course_id, "course purchased");
  Ok(user.purchased_courses)
}

/// Record a score: `finalTest` writes course-level marks, any other
/// `testType` is the testId of a chapter test inside the mirror. Progress is
/// recomputed from the submitted marks on every call.
#[instrument(level = "info", skip(state, input), fields(%user_id, course_id = %input.course_id, test_type = %input.test_type))]
pub async fn mark_user_answers(
  state: &AppState,
  user_id: &str,
  input: MarkAnswersIn,
) -> Result<(), ApiError> {
  let lock = state.user_lock(user_id).await;
  let _guard = lock.lock().await;

  // Submitted answers ride along for audit logging only; scoring trusts the
  // caller-computed marks.
  if !input.answers.is_null() {
    debug!(target: "user", answers = %input.answers, "answer payload received");
  }

  let mut user = load_user(state, user_id).await?;
  let mut matched = false;
  for course in user.purchased_courses.iter_mut().filter(|c| c.course_id == input.course_id) {
    if input.test_type == "finalTest" {
      course.final_test_marks = Some(input.marks);
      course.progress = progress_pct(input.marks, input.total_marks);
      matched = true;
    } else {
      for chapter in &mut course.chapters {
        if let Some(test) = chapter.test.as_mut() {
          if test.test_id == input.test_type {
            test.user_marks = Some(input.marks);
            test.progress = Some(progress_pct(input.marks, input.total_marks));
            matched = true;
          }
        }
      }
    }
  }
  if !matched {
    return Err(ApiError::NotFound("No purchased course matches this test.".into()));
  }

  persist_purchases(state, user_id, &user.purchased_courses).await?;
  info!(target: "user", %user_id, "answers marked and progress updated");
  Ok(())
}

/// Apply per-question validated marks positionally, flag them, and re-sum
/// the mirror test's `totalMarks`.
#[instrument(level = "info", skip(state, input), fields(%user_id, course_id = %input.course_id, test_id = %input.test_id))]
pub async fn validate_and_update_marks(
  state: &AppState,
  user_id: &str,
  input: ValidateMarksIn,
) -> Result<String, ApiError> {
  let lock = state.user_lock(user_id).await;
  let _guard = lock.lock().await;

  let mut user = load_user(state, user_id).await?;
  let mut matched = false;
  for course in user.purchased_courses.iter_mut().filter(|c| c.course_id == input.course_id) {
    for chapter in &mut course.chapters {
      if let Some(test) = chapter.test.as_mut() {
        if test.test_id == input.test_id {
          for (idx, question) in test.questions.iter_mut().enumerate() {
            if let Some(Some(validated)) = input.validated_answers.get(idx) {
              question.marks = Some(validated.marks);
              question.validated = Some(true);
            }
          }
          test.total_marks = test.questions.iter().filter_map(|q| q.marks).sum();
          matched = true;
        }
      }
    }
  }
  if !matched {
    return Err(ApiError::NotFound("No purchased course test matches this testId.".into()));
  }

  persist_purchases(state, user_id, &user.purchased_courses).await?;
  info!(target: "user", %user_id, "validated marks applied");
  Ok("Test marks updated successfully".into())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::identity::Claims;
  use crate::services::degree::add_degree;
  use crate::state::testutil::memory_state;
  use serde_json::json;

  fn signup_input(email: &str, username: &str) -> SignupIn {
    serde_json::from_value(json!({
      "firstName": "Ada",
      "lastName": "Lovelace",
      "email": email,
      "username": username,
      "password": "s3cret"
    }))
    .expect("signup input")
  }

  async fn seed_degree_with_course(state: &AppState) -> String {
    let input = serde_json::from_value(json!({
      "name": "Bachelor of Theology",
      "courses": [{
        "courseId": "c-1",
        "title": "New Testament Survey",
        "chapters": [{
          "chapterId": "ch-1",
          "title": "Gospels",
          "lessons": [{ "lessonId": "l-1", "title": "Introduction" }],
          "test": {
            "testId": "t-1",
            "questions": [
              { "question": "Who wrote Luke?", "type": "MCQ", "options": ["Luke", "Paul"], "correctAnswer": "Luke", "marks": 2 },
              { "question": "Summarize Mark", "type": "Typed", "marks": 2 }
            ]
          }
        }]
      }]
    }))
    .expect("degree input");
    add_degree(state, input).await.expect("seed degree")
  }

  #[tokio::test]
  async fn duplicate_username_conflicts_even_with_new_email() {
    let (state, _, _, _) = memory_state();
    signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("first");
    let err = signup_user(&state, signup_input("other@example.com", "ada")).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(err.to_string(), "Username already exists!");
  }

  #[tokio::test]
  async fn duplicate_email_conflicts() {
    let (state, _, _, _) = memory_state();
    signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("first");
    let err = signup_user(&state, signup_input("ada@example.com", "ada2")).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(err.to_string(), "Email already exists!");
  }

  #[tokio::test]
  async fn manual_signup_requires_every_field() {
    let (state, _, _, _) = memory_state();
    let input: SignupIn =
      serde_json::from_value(json!({ "email": "x@y.z", "password": "p" })).expect("input");
    let err = signup_user(&state, input).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
  }

  #[tokio::test]
  async fn federated_signup_is_idempotent() {
    let (state, store, _, identity) = memory_state();
    identity
      .register_token(
        "tok-1",
        Claims {
          uid: "uid-1".into(),
          email: "grace@example.com".into(),
          name: Some("Grace Hopper".into()),
          picture: None,
        },
      )
      .await;

    let input = || {
      serde_json::from_value::<SignupIn>(json!({ "idToken": "tok-1" })).expect("input")
    };
    let (uid, _) = signup_user(&state, input()).await.expect("first signup");
    assert_eq!(uid, "uid-1");
    let (uid2, message) = signup_user(&state, input()).await.expect("re-signup");
    assert_eq!(uid2, "uid-1");
    assert_eq!(message, "User already exists!");
    assert_eq!(store.count("users").await, 1);
  }

  #[tokio::test]
  async fn federated_login_requires_prior_signup() {
    let (state, _, _, identity) = memory_state();
    identity
      .register_token(
        "tok-1",
        Claims { uid: "uid-1".into(), email: "g@x.io".into(), name: None, picture: None },
      )
      .await;
    let input: LoginIn = serde_json::from_value(json!({ "idToken": "tok-1" })).expect("input");
    let err = login_user(&state, input).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }

  #[tokio::test]
  async fn manual_login_by_email_or_username() {
    let (state, _, _, _) = memory_state();
    let (user_id, _) =
      signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("signup");

    let by_email: LoginIn = serde_json::from_value(
      json!({ "emailOrUsername": "ada@example.com", "password": "s3cret" }),
    )
    .expect("input");
    let (id, user) = login_user(&state, by_email).await.expect("login by email");
    assert_eq!(id, user_id);
    // the response never carries the hash
    assert_eq!(user.password, None);

    let by_username: LoginIn =
      serde_json::from_value(json!({ "emailOrUsername": "ada", "password": "s3cret" }))
        .expect("input");
    login_user(&state, by_username).await.expect("login by username");

    let wrong: LoginIn =
      serde_json::from_value(json!({ "emailOrUsername": "ada", "password": "nope" }))
        .expect("input");
    let err = login_user(&state, wrong).await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(_)));
  }

  #[tokio::test]
  async fn forgot_password_flows() {
    let (state, _, _, identity) = memory_state();

    let err = forgot_password(&state, "ghost@example.com").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("signup");
    forgot_password(&state, "ada@example.com").await.expect("reset");
    assert_eq!(identity.sent_resets().await, vec!["ada@example.com".to_string()]);

    // federated-only account: no local password to reset
    identity
      .register_token(
        "tok-1",
        Claims { uid: "uid-1".into(), email: "grace@example.com".into(), name: None, picture: None },
      )
      .await;
    let fed: SignupIn = serde_json::from_value(json!({ "idToken": "tok-1" })).expect("input");
    signup_user(&state, fed).await.expect("federated signup");
    let err = forgot_password(&state, "grace@example.com").await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
  }

  #[tokio::test]
  async fn edit_user_merges_and_leaves_other_fields_alone() {
    let (state, _, blobs, _) = memory_state();
    let (user_id, _) =
      signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("signup");

    let input: EditUserIn = serde_json::from_value(json!({
      "mobileNo": "555-0100",
      "profilePicture": { "name": "me.png", "contentType": "image/png", "dataBase64": "aGk=" }
    }))
    .expect("edit input");
    let updates = edit_user(&state, &user_id, input).await.expect("edit");
    assert_eq!(updates["mobileNo"], "555-0100");
    assert!(updates["profilePicture"].as_str().expect("url").starts_with("memory://profilePictures/"));
    assert_eq!(blobs.object_count().await, 1);

    let user = get_user_by_id(&state, &user_id).await.expect("get").body;
    assert_eq!(user.mobile_no, "555-0100");
    // merge semantics: untouched fields survive
    assert_eq!(user.first_name, "Ada");
    assert_eq!(user.email, "ada@example.com");
  }

  #[tokio::test]
  async fn edit_user_with_nothing_to_apply_is_a_validation_error() {
    let (state, _, _, _) = memory_state();
    let (user_id, _) =
      signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("signup");
    let err = edit_user(&state, &user_id, EditUserIn::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
  }

  #[tokio::test]
  async fn purchasing_twice_keeps_exactly_one_entry() {
    let (state, _, _, _) = memory_state();
    seed_degree_with_course(&state).await;
    let (user_id, _) =
      signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("signup");

    let purchases = add_course_to_user(&state, &user_id, "c-1", "New Testament Survey")
      .await
      .expect("purchase");
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].progress, 0.0);
    // the mirror carries the chapter test definition for later scoring
    assert_eq!(purchases[0].chapters[0].test.as_ref().expect("test").test_id, "t-1");

    let err = add_course_to_user(&state, &user_id, "c-1", "New Testament Survey")
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(get_enrolled_courses(&state, &user_id).await.expect("enrolled").len(), 1);
  }

  #[tokio::test]
  async fn purchasing_an_unknown_course_is_not_found() {
    let (state, _, _, _) = memory_state();
    let (user_id, _) =
      signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("signup");
    let err = add_course_to_user(&state, &user_id, "ghost", "Ghost").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }

  #[tokio::test]
  async fn final_test_marks_update_course_progress() {
    let (state, _, _, _) = memory_state();
    seed_degree_with_course(&state).await;
    let (user_id, _) =
      signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("signup");
    add_course_to_user(&state, &user_id, "c-1", "").await.expect("purchase");

    let input: MarkAnswersIn = serde_json::from_value(json!({
      "courseId": "c-1",
      "testType": "finalTest",
      "marks": 30,
      "totalMarks": 60
    }))
    .expect("input");
    mark_user_answers(&state, &user_id, input).await.expect("mark");

    let courses = get_enrolled_courses(&state, &user_id).await.expect("enrolled");
    assert_eq!(courses[0].final_test_marks, Some(30.0));
    assert_eq!(courses[0].progress, 50.0);
  }

  #[tokio::test]
  async fn chapter_test_marks_land_on_the_mirrored_test() {
    let (state, _, _, _) = memory_state();
    seed_degree_with_course(&state).await;
    let (user_id, _) =
      signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("signup");
    add_course_to_user(&state, &user_id, "c-1", "").await.expect("purchase");

    let input: MarkAnswersIn = serde_json::from_value(json!({
      "courseId": "c-1",
      "testType": "t-1",
      "marks": 3,
      "totalMarks": 4
    }))
    .expect("input");
    mark_user_answers(&state, &user_id, input).await.expect("mark");

    let courses = get_enrolled_courses(&state, &user_id).await.expect("enrolled");
    let test = courses[0].chapters[0].test.as_ref().expect("test");
    assert_eq!(test.user_marks, Some(3.0));
    assert_eq!(test.progress, Some(75.0));

    let missing: MarkAnswersIn = serde_json::from_value(json!({
      "courseId": "c-1",
      "testType": "no-such-test",
      "marks": 1,
      "totalMarks": 4
    }))
    .expect("input");
    let err = mark_user_answers(&state, &user_id, missing).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }

  #[tokio::test]
  async fn validated_marks_rewrite_questions_and_totals() {
    let (state, _, _, _) = memory_state();
    seed_degree_with_course(&state).await;
    let (user_id, _) =
      signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("signup");
    add_course_to_user(&state, &user_id, "c-1", "").await.expect("purchase");

    let input: ValidateMarksIn = serde_json::from_value(json!({
      "courseId": "c-1",
      "testId": "t-1",
      "validatedAnswers": [{ "marks": 1 }, null]
    }))
    .expect("input");
    validate_and_update_marks(&state, &user_id, input).await.expect("validate");

    let courses = get_enrolled_courses(&state, &user_id).await.expect("enrolled");
    let test = courses[0].chapters[0].test.as_ref().expect("test");
    assert_eq!(test.questions[0].marks, Some(1.0));
    assert_eq!(test.questions[0].validated, Some(true));
    // the null entry leaves the second question untouched
    assert_eq!(test.questions[1].marks, Some(2.0));
    assert_eq!(test.questions[1].validated, None);
    assert_eq!(test.total_marks, 3.0);
  }

  #[tokio::test]
  async fn delete_user_removes_document_and_identity_account() {
    let (state, store, _, identity) = memory_state();
    let (user_id, _) =
      signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("signup");

    delete_user(&state, &user_id).await.expect("delete");
    assert_eq!(store.count("users").await, 0);
    assert_eq!(identity.deleted_accounts().await, vec![user_id.clone()]);

    let err = delete_user(&state, &user_id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }

  #[tokio::test]
  async fn role_queries_filter_users() {
    let (state, _, _, _) = memory_state();
    signup_user(&state, signup_input("ada@example.com", "ada")).await.expect("signup");
    assert_eq!(get_users_by_role(&state, "client").await.expect("query").len(), 1);
    assert!(get_users_by_role(&state, "admin").await.expect("query").is_empty());
    assert_eq!(get_all_users(&state).await.expect("all").len(), 1);
  }
}
