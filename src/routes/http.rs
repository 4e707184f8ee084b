//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::{header, HeaderMap, StatusCode},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::auth::{clear_cookie, session_cookie, token_from_headers, CurrentUser};
use crate::domain::SubmittedAnswer;
use crate::error::{AppError, AppResult};
use crate::logic;
use crate::protocol::*;
use crate::routes::extract::ValidJson;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body), fields(email = %body.email))]
pub async fn http_register(
  State(state): State<Arc<AppState>>,
  ValidJson(body): ValidJson<RegisterIn>,
) -> AppResult<impl IntoResponse> {
  let (user, token) = logic::register(&state, body).await?;
  let cookie = session_cookie(&token, state.sessions.ttl());
  Ok((
    StatusCode::CREATED,
    [(header::SET_COOKIE, cookie)],
    Json(ok("User registered successfully", SessionOut { user: UserOut::from(&user), token })),
  ))
}

#[instrument(level = "info", skip(state, body), fields(email = %body.email))]
pub async fn http_login(
  State(state): State<Arc<AppState>>,
  ValidJson(body): ValidJson<LoginIn>,
) -> AppResult<impl IntoResponse> {
  let (user, token) = logic::login(&state, body).await?;
  let cookie = session_cookie(&token, state.sessions.ttl());
  Ok((
    [(header::SET_COOKIE, cookie)],
    Json(ok("Login successful", SessionOut { user: UserOut::from(&user), token })),
  ))
}

#[instrument(level = "info", skip_all)]
pub async fn http_logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
  let token = token_from_headers(&headers);
  logic::logout(&state, token.as_deref()).await;
  (
    [(header::SET_COOKIE, clear_cookie())],
    Json(Envelope::<()> { success: true, message: "Logout successful", data: None }),
  )
}

#[instrument(level = "info", skip(state, q), fields(user_id = user.0))]
pub async fn http_get_questions(
  State(state): State<Arc<AppState>>,
  user: CurrentUser,
  Query(q): Query<QuestionsQuery>,
) -> AppResult<impl IntoResponse> {
  let raw = q.test_id.unwrap_or_else(|| "1".into());
  let test_id: u64 = raw
    .trim()
    .parse()
    .map_err(|_| AppError::Validation("Invalid test ID".into()))?;
  let questions = logic::questions_for_display(&state.store, test_id).await;
  info!(target: "assessment", %test_id, count = questions.len(), "HTTP questions served");
  Ok(Json(ok("Questions fetched successfully", questions)))
}

#[instrument(level = "info", skip(state, body), fields(user_id = user.0))]
pub async fn http_submit(
  State(state): State<Arc<AppState>>,
  user: CurrentUser,
  ValidJson(body): ValidJson<SubmitIn>,
) -> AppResult<impl IntoResponse> {
  // Presence of both fields is guaranteed by validation.
  let test_id = body.test_id.ok_or_else(|| AppError::Validation("test_id: is required".into()))?;
  let answers = body
    .answers
    .ok_or_else(|| AppError::Validation("answers: is required".into()))?
    .into_iter()
    .filter_map(|a| {
      a.question_id.map(|question_id| SubmittedAnswer {
        question_id,
        user_answer: a.user_answer,
        response_time: a.response_time,
      })
    })
    .collect();

  let result = logic::submit_test(&state.store, user.0, test_id, answers, body.time_taken).await?;
  info!(target: "assessment", result_id = result.result.id, score = result.result.score, "HTTP submission stored");
  Ok(Json(ok("Test submitted successfully", result)))
}

#[instrument(level = "info", skip(state), fields(user_id = user.0))]
pub async fn http_get_results(
  State(state): State<Arc<AppState>>,
  user: CurrentUser,
) -> impl IntoResponse {
  let results = logic::list_results(&state.store, user.0).await;
  Json(ok("Results fetched successfully", results))
}

#[instrument(level = "info", skip(state), fields(user_id = user.0))]
pub async fn http_get_result(
  State(state): State<Arc<AppState>>,
  user: CurrentUser,
  Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
  let result_id: u64 = id
    .parse()
    .map_err(|_| AppError::Validation("Invalid result ID".into()))?;
  let detail = logic::get_result(&state.store, result_id, user.0).await?;
  Ok(Json(ok("Result fetched successfully", detail)))
}
