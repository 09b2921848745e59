//! Handlers for the event log and per-account aggregates.
//!
//! Block ranges are inclusive. When `to_block` is omitted it defaults to the
//! latest committed block; when `from_block` is omitted the range reaches
//! back [`DEFAULT_LOOKBACK_BLOCKS`] blocks from `to_block`. A `from_block`
//! past the head with no `to_block` yields nothing rather than an error.

use aigoal_core::{
  Address,
  activity::{ActivityFeed, DEFAULT_LOOKBACK_BLOCKS, UserStatistics},
  event::{BlockRange, Event},
  store::{GoalFilter, GoalStore},
};
use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{
  AppState,
  error::ApiError,
  extract::{Path, Query},
};

#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
  pub from_block: Option<u64>,
  pub to_block:   Option<u64>,
}

impl RangeParams {
  /// The inclusive range to scan, or `None` when `from_block` lies past the
  /// head and `to_block` was left to default.
  pub fn resolve(&self, latest: u64) -> Result<Option<BlockRange>, ApiError> {
    let to = self.to_block.unwrap_or(latest);
    let from = self
      .from_block
      .unwrap_or_else(|| to.saturating_sub(DEFAULT_LOOKBACK_BLOCKS));
    if from <= to {
      return Ok(Some(BlockRange::new(from, to)));
    }
    match self.to_block {
      Some(_) => Err(ApiError::BadRequest(format!(
        "from_block {from} is after to_block {to}"
      ))),
      None => Ok(None),
    }
  }
}

async fn range_events<S: GoalStore>(
  store: &S,
  params: &RangeParams,
) -> Result<(BlockRange, Vec<Event>), ApiError> {
  let latest = store.latest_block().await.map_err(ApiError::from_store)?;
  let Some(range) = params.resolve(latest)? else {
    return Ok((BlockRange::new(latest, latest), Vec::new()));
  };
  let events = store.events(range).await.map_err(ApiError::from_store)?;
  Ok((range, events))
}

/// `GET /events[?from_block=&to_block=]`: ascending.
pub async fn events<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Query(params): Query<RangeParams>,
) -> Result<Json<Vec<Event>>, ApiError> {
  let (_, events) = range_events(state.store.as_ref(), &params).await?;
  Ok(Json(events))
}

/// `GET /accounts/:address/events[?from_block=&to_block=]`: the account's
/// activity, most recent first, with its reward total.
pub async fn account_events<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Path(address): Path<Address>,
  Query(params): Query<RangeParams>,
) -> Result<Json<ActivityFeed>, ApiError> {
  let (range, events) = range_events(state.store.as_ref(), &params).await?;
  Ok(Json(ActivityFeed::for_account(events, &address, range)))
}

/// `GET /accounts/:address/statistics`: counts of the goals the account
/// created, by status.
pub async fn statistics<S: GoalStore + 'static>(
  State(state): State<AppState<S>>,
  Path(address): Path<Address>,
) -> Result<Json<UserStatistics>, ApiError> {
  let ids = state
    .store
    .goal_ids(GoalFilter::CreatedBy(address))
    .await
    .map_err(ApiError::from_store)?;

  let mut statuses = Vec::with_capacity(ids.len());
  for id in ids {
    if let Some(goal) = state.store.get_goal(id).await.map_err(ApiError::from_store)? {
      statuses.push(goal.status);
    }
  }
  Ok(Json(UserStatistics::tally(statuses)))
}
