//! Handlers for the goal registry and its resolution.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/goals` | At most one of `?status`, `?creator`, `?witness`; returns ids |
//! | `POST` | `/goals` | Body: [`NewGoal`]; returns 201 + goal view |
//! | `GET`  | `/goals/:id` | Goal with derived `all_confirmed` / `progress_complete` |
//! | `POST` | `/goals/:id/confirm` | Witness confirmation by the actor |
//! | `POST` | `/goals/:id/complete` | Creator resolves as Completed |
//! | `POST` | `/goals/:id/fail` | Resolve as Failed |

use aigoal_core::{
  Address, Error as CoreError, GoalId, GoalStatus,
  goal::{GoalView, NewGoal},
  store::{GoalFilter, GoalStore},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::{
  AppState,
  auth::Actor,
  error::ApiError,
  extract::{Body, Path, Query},
};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub status:  Option<GoalStatus>,
  pub creator: Option<Address>,
  pub witness: Option<Address>,
}

impl ListParams {
  fn filter(&self) -> Result<GoalFilter, ApiError> {
    match (self.status, self.creator, self.witness) {
      (None, None, None) => Ok(GoalFilter::All),
      (Some(s), None, None) => Ok(GoalFilter::Status(s)),
      (None, Some(c), None) => Ok(GoalFilter::CreatedBy(c)),
      (None, None, Some(w)) => Ok(GoalFilter::WitnessedBy(w)),
      _ => Err(ApiError::BadRequest(
        "use at most one of status, creator, witness".into(),
      )),
    }
  }
}

/// `GET /goals[?status=active|completed|failed][?creator=0x…][?witness=0x…]`
pub async fn list<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<GoalId>>, ApiError> {
  let ids = state
    .store
    .goal_ids(params.filter()?)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(ids))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /goals/:id`
pub async fn get_one<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<GoalId>,
) -> Result<Json<GoalView>, ApiError> {
  let goal = state
    .store
    .get_goal(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(CoreError::GoalNotFound(id))?;
  Ok(Json(goal.into()))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /goals`: returns 201 + the new goal.
pub async fn create<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Actor(creator): Actor,
  Body(input): Body<NewGoal>,
) -> Result<impl IntoResponse, ApiError> {
  let goal = state
    .store
    .create_goal(creator, input)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(goal_id = goal.id, %creator, "goal created");
  Ok((StatusCode::CREATED, Json(GoalView::from(goal))))
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// `POST /goals/:id/confirm`
pub async fn confirm<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Actor(witness): Actor,
  Path(id): Path<GoalId>,
) -> Result<Json<GoalView>, ApiError> {
  let goal = state
    .store
    .confirm_witness(id, witness)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(goal.into()))
}

/// `POST /goals/:id/complete`
pub async fn complete<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(id): Path<GoalId>,
) -> Result<Json<GoalView>, ApiError> {
  let goal = state
    .store
    .complete_goal(id, actor)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(goal_id = id, "goal completed");
  Ok(Json(goal.into()))
}

/// `POST /goals/:id/fail`
pub async fn fail<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(id): Path<GoalId>,
) -> Result<Json<GoalView>, ApiError> {
  let goal = state
    .store
    .fail_goal(id, actor)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(goal_id = id, %actor, "goal failed");
  Ok(Json(goal.into()))
}
