//! Event log entries.
//!
//! Every state-changing operation appends exactly one [`Event`]. The payload
//! is a sum type: each kind carries its own typed arguments, and the variant
//! name doubles as the `event_name` discriminant stored with the log entry.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, address::Address, goal::GoalId};

// ─── Payload ─────────────────────────────────────────────────────────────────

/// Kind-specific event arguments.
///
/// The actor-typed fields are `creator`, `completer`, `witness` and `failer`;
/// every variant has exactly one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::EnumDiscriminants)]
#[serde(tag = "event_name", content = "args")]
#[strum_discriminants(
  name(EventKind),
  derive(
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
  )
)]
pub enum EventPayload {
  GoalCreated {
    goal_id:   GoalId,
    creator:   Address,
    title:     String,
    witnesses: Vec<Address>,
    #[serde(with = "crate::amount")]
    amount:    u128,
    deadline:  DateTime<Utc>,
  },
  GoalCompleted {
    goal_id:   GoalId,
    completer: Address,
  },
  WitnessConfirmed {
    goal_id: GoalId,
    witness: Address,
  },
  GoalFailed {
    goal_id: GoalId,
    failer:  Address,
  },
  CommentCreated {
    goal_id:    GoalId,
    comment_id: u64,
    creator:    Address,
    content:    String,
  },
  ProgressUpdated {
    goal_id:             GoalId,
    update_id:           u64,
    creator:             Address,
    content:             String,
    progress_percentage: u8,
    proof_file_blob_id:  Option<String>,
  },
  AgentCreated {
    goal_id:    GoalId,
    agent_id:   Uuid,
    agent_name: String,
    creator:    Address,
  },
  AgentUpdated {
    goal_id:    GoalId,
    agent_id:   Uuid,
    agent_name: String,
    creator:    Address,
  },
}

impl EventPayload {
  pub fn kind(&self) -> EventKind { EventKind::from(self) }

  /// The `event_name` string stored alongside the payload.
  /// Matches the serde tag of the variant.
  pub fn discriminant(&self) -> &'static str { self.kind().into() }

  /// The goal this event belongs to.
  pub fn goal_id(&self) -> GoalId {
    match self {
      Self::GoalCreated { goal_id, .. }
      | Self::GoalCompleted { goal_id, .. }
      | Self::WitnessConfirmed { goal_id, .. }
      | Self::GoalFailed { goal_id, .. }
      | Self::CommentCreated { goal_id, .. }
      | Self::ProgressUpdated { goal_id, .. }
      | Self::AgentCreated { goal_id, .. }
      | Self::AgentUpdated { goal_id, .. } => *goal_id,
    }
  }

  /// The account in the event's actor-typed field.
  pub fn actor(&self) -> &Address {
    match self {
      Self::GoalCreated { creator, .. }
      | Self::CommentCreated { creator, .. }
      | Self::ProgressUpdated { creator, .. }
      | Self::AgentCreated { creator, .. }
      | Self::AgentUpdated { creator, .. } => creator,
      Self::GoalCompleted { completer, .. } => completer,
      Self::WitnessConfirmed { witness, .. } => witness,
      Self::GoalFailed { failer, .. } => failer,
    }
  }

  /// Serialise only the arguments (without the `event_name` tag) for the
  /// `args_json` database column.
  pub fn to_args_json(&self) -> Result<serde_json::Value> {
    let full = serde_json::to_value(self)?;
    Ok(full.get("args").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Rebuild a payload from the stored `event_name` and argument JSON.
  pub fn from_parts(event_name: &str, args: serde_json::Value) -> Result<Self> {
    let wrapped = serde_json::json!({ "event_name": event_name, "args": args });
    Ok(serde_json::from_value(wrapped)?)
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// A committed log entry. Ordered by `(block_number, log_index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub block_number:     u64,
  pub log_index:        u32,
  pub transaction_hash: String,
  pub recorded_at:      DateTime<Utc>,
  pub payload:          EventPayload,
}

impl Event {
  pub fn kind(&self) -> EventKind { self.payload.kind() }

  pub fn order_key(&self) -> (u64, u32) { (self.block_number, self.log_index) }

  /// Whether `account` appears in any actor-typed field of the payload.
  pub fn involves(&self, account: &Address) -> bool { self.payload.actor() == account }
}

// ─── Block range ─────────────────────────────────────────────────────────────

/// An inclusive range of block numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
  pub from: u64,
  pub to:   u64,
}

impl BlockRange {
  pub fn new(from: u64, to: u64) -> Self { Self { from, to } }

  /// The `blocks` most recent blocks up to and including `latest`,
  /// saturating at block 0.
  pub fn lookback(latest: u64, blocks: u64) -> Self {
    Self { from: latest.saturating_sub(blocks), to: latest }
  }

  pub fn contains(&self, block: u64) -> bool { self.as_range().contains(&block) }

  pub fn as_range(&self) -> RangeInclusive<u64> { self.from..=self.to }
}
