//! Read-side aggregation over the event log: per-user activity feeds, reward
//! totals and goal statistics. Everything here is a pure function of its
//! input.

use serde::{Deserialize, Serialize};

use crate::{
  address::Address,
  event::{BlockRange, Event, EventKind},
  goal::GoalStatus,
};

/// How many recent blocks an activity query covers by default.
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 1000;

// ─── Rewards ─────────────────────────────────────────────────────────────────

/// Points awarded for one event of `kind`.
pub fn reward_points(kind: EventKind) -> u64 {
  match kind {
    EventKind::GoalCreated => 100,
    EventKind::GoalCompleted => 100,
    EventKind::GoalFailed => 100,
    EventKind::WitnessConfirmed => 50,
    EventKind::CommentCreated => 10,
    EventKind::ProgressUpdated => 10,
    EventKind::AgentCreated => 200,
    EventKind::AgentUpdated => 100,
  }
}

pub fn reward_total<'a>(events: impl IntoIterator<Item = &'a Event>) -> u64 {
  events.into_iter().map(|e| reward_points(e.kind())).sum()
}

// ─── Activity feed ───────────────────────────────────────────────────────────

/// Events inside `range` in which `account` plays an actor role, most recent
/// first (descending block number, then descending log index).
pub fn user_events(
  events: impl IntoIterator<Item = Event>,
  account: &Address,
  range: BlockRange,
) -> Vec<Event> {
  let mut matched: Vec<Event> = events
    .into_iter()
    .filter(|e| range.contains(e.block_number) && e.involves(account))
    .collect();
  matched.sort_by(|a, b| b.order_key().cmp(&a.order_key()));
  matched
}

/// A user's recent activity together with its reward total.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityFeed {
  pub events:       Vec<Event>,
  pub reward_total: u64,
}

impl ActivityFeed {
  pub fn for_account(
    events: impl IntoIterator<Item = Event>,
    account: &Address,
    range: BlockRange,
  ) -> Self {
    let events = user_events(events, account, range);
    let reward_total = reward_total(&events);
    Self { events, reward_total }
  }
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Counts of one user's goals by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatistics {
  pub active:    u64,
  pub completed: u64,
  pub failed:    u64,
  pub total:     u64,
}

impl UserStatistics {
  pub fn tally(statuses: impl IntoIterator<Item = GoalStatus>) -> Self {
    statuses.into_iter().fold(Self::default(), |mut acc, status| {
      match status {
        GoalStatus::Active => acc.active += 1,
        GoalStatus::Completed => acc.completed += 1,
        GoalStatus::Failed => acc.failed += 1,
      }
      acc.total += 1;
      acc
    })
  }
}
