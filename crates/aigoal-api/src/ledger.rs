//! Handlers for the per-goal comment and progress ledgers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/goals/:id/comments` | Ascending by id |
//! | `POST` | `/goals/:id/comments` | Body: `{"content":"..."}`; any account |
//! | `GET`  | `/goals/:id/comments/:n` | Single comment |
//! | `GET`  | `/goals/:id/progress` | Ascending by id |
//! | `POST` | `/goals/:id/progress` | Body: [`NewProgressUpdate`]; creator only |
//! | `GET`  | `/goals/:id/progress/:n` | Single update |

use aigoal_core::{
  Error as CoreError, GoalId,
  ledger::{Comment, NewProgressUpdate, ProgressUpdate},
  store::GoalStore,
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::{
  AppState,
  auth::Actor,
  error::ApiError,
  extract::{Body, Path},
};

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub content: String,
}

pub async fn list_comments<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Path(goal_id): Path<GoalId>,
) -> Result<Json<Vec<Comment>>, ApiError> {
  let comments = state
    .store
    .list_comments(goal_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(comments))
}

pub async fn add_comment<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(goal_id): Path<GoalId>,
  Body(body): Body<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let comment = state
    .store
    .add_comment(goal_id, actor, body.content)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_comment<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Path((goal_id, comment_id)): Path<(GoalId, u64)>,
) -> Result<Json<Comment>, ApiError> {
  let comment = state
    .store
    .get_comment(goal_id, comment_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(CoreError::CommentNotFound { goal_id, comment_id })?;
  Ok(Json(comment))
}

// ─── Progress ────────────────────────────────────────────────────────────────

pub async fn list_progress<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Path(goal_id): Path<GoalId>,
) -> Result<Json<Vec<ProgressUpdate>>, ApiError> {
  let updates = state
    .store
    .list_progress_updates(goal_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(updates))
}

pub async fn add_progress<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(goal_id): Path<GoalId>,
  Body(input): Body<NewProgressUpdate>,
) -> Result<impl IntoResponse, ApiError> {
  let update = state
    .store
    .add_progress_update(goal_id, actor, input)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(
    goal_id,
    update_id = update.id,
    percentage = update.progress_percentage,
    "progress recorded"
  );
  Ok((StatusCode::CREATED, Json(update)))
}

pub async fn get_progress<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Path((goal_id, update_id)): Path<(GoalId, u64)>,
) -> Result<Json<ProgressUpdate>, ApiError> {
  let update = state
    .store
    .get_progress_update(goal_id, update_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(CoreError::ProgressUpdateNotFound { goal_id, update_id })?;
  Ok(Json(update))
}
