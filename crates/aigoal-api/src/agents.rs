//! Handlers for goal ↔ agent links.

use aigoal_core::{
  Error as CoreError, GoalId,
  agent::{Agent, NewAgent},
  store::GoalStore,
};
use axum::{Json, extract::State};
use uuid::Uuid;

use crate::{
  AppState,
  auth::Actor,
  error::ApiError,
  extract::{Body, Path},
};

/// `GET /goals/:id/agent`
pub async fn goal_agent<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Path(goal_id): Path<GoalId>,
) -> Result<Json<Agent>, ApiError> {
  let agent = state
    .store
    .goal_agent(goal_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(CoreError::NoAgent(goal_id))?;
  Ok(Json(agent))
}

/// `PUT /goals/:id/agent`: link or re-link. Creator only.
pub async fn set_agent<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(goal_id): Path<GoalId>,
  Body(input): Body<NewAgent>,
) -> Result<Json<Agent>, ApiError> {
  let agent = state
    .store
    .set_agent(goal_id, actor, input)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(goal_id, agent_id = %agent.agent_id, "agent linked");
  Ok(Json(agent))
}

/// `GET /agents/:agent_id`
pub async fn get_one<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Path(agent_id): Path<Uuid>,
) -> Result<Json<Agent>, ApiError> {
  let agent = state
    .store
    .get_agent(agent_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(CoreError::AgentNotFound(agent_id))?;
  Ok(Json(agent))
}
