//! User endpoints: account lifecycle, profile edits, purchases and scoring.

use std::sync::Arc;
use axum::{
  extract::{Path, State},
  http::StatusCode,
  Json,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::protocol::{
  AddCourseIn, EditUserIn, EnrolledCoursesOut, ForgotPasswordIn, LoginIn, LoginOut,
  MarkAnswersIn, MessageOut, PurchasedOut, SignupIn, SignupOut, UpdatesOut, UserOut, UsersOut,
  ValidateMarksIn,
};
use crate::services::user;
use crate::state::AppState;

#[instrument(level = "info", skip(state, body))]
pub async fn signup(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SignupIn>,
) -> Result<(StatusCode, Json<SignupOut>), ApiError> {
  let (user_id, message) = user::signup_user(&state, body).await?;
  Ok((StatusCode::CREATED, Json(SignupOut { message, user_id })))
}

#[instrument(level = "info", skip(state, body))]
pub async fn login(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LoginIn>,
) -> Result<Json<LoginOut>, ApiError> {
  let (user_id, user) = user::login_user(&state, body).await?;
  Ok(Json(LoginOut { message: "Login successful!".into(), user_id, user }))
}

#[instrument(level = "info", skip(state, body))]
pub async fn forgot_password(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ForgotPasswordIn>,
) -> Result<Json<MessageOut>, ApiError> {
  let message = user::forgot_password(&state, &body.email).await?;
  Ok(Json(MessageOut { message }))
}

#[instrument(level = "info", skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<UsersOut>, ApiError> {
  Ok(Json(UsersOut { users: user::get_all_users(&state).await? }))
}

#[instrument(level = "info", skip(state), fields(%role))]
pub async fn list_by_role(
  State(state): State<Arc<AppState>>,
  Path(role): Path<String>,
) -> Result<Json<UsersOut>, ApiError> {
  Ok(Json(UsersOut { users: user::get_users_by_role(&state, &role).await? }))
}

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn get_by_id(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
) -> Result<Json<UserOut>, ApiError> {
  Ok(Json(UserOut { user: user::get_user_by_id(&state, &user_id).await? }))
}

#[instrument(level = "info", skip(state, body), fields(%user_id))]
pub async fn edit(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
  Json(body): Json<EditUserIn>,
) -> Result<Json<UpdatesOut>, ApiError> {
  let updates = user::edit_user(&state, &user_id, body).await?;
  Ok(Json(UpdatesOut { message: "User updated successfully!".into(), updates }))
}

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn remove(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
) -> Result<Json<MessageOut>, ApiError> {
  user::delete_user(&state, &user_id).await?;
  Ok(Json(MessageOut { message: "User deleted successfully.".into() }))
}

#[instrument(level = "info", skip(state, body), fields(%user_id, course_id = %body.course_id))]
pub async fn add_course(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
  Json(body): Json<AddCourseIn>,
) -> Result<Json<PurchasedOut>, ApiError> {
  let purchased_courses =
    user::add_course_to_user(&state, &user_id, &body.course_id, &body.course_title).await?;
  Ok(Json(PurchasedOut { message: "Course purchased successfully".into(), purchased_courses }))
}

#[instrument(level = "info", skip(state, body), fields(%user_id))]
pub async fn mark_answers(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
  Json(body): Json<MarkAnswersIn>,
) -> Result<Json<MessageOut>, ApiError> {
  user::mark_user_answers(&state, &user_id, body).await?;
  Ok(Json(MessageOut { message: "User answers and progress updated successfully!".into() }))
}

#[instrument(level = "info", skip(state, body), fields(%user_id))]
pub async fn validate_marks(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
  Json(body): Json<ValidateMarksIn>,
) -> Result<Json<MessageOut>, ApiError> {
  let message = user::validate_and_update_marks(&state, &user_id, body).await?;
  Ok(Json(MessageOut { message }))
}

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn enrolled_courses(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
) -> Result<Json<EnrolledCoursesOut>, ApiError> {
  Ok(Json(EnrolledCoursesOut { courses: user::get_enrolled_courses(&state, &user_id).await? }))
}
