//! Goals: the staked commitments at the centre of the ledger.
//!
//! A goal is created Active and ends in exactly one terminal state. Its
//! witness list and stake are fixed at creation; confirmations, progress and
//! the ledger counters only ever grow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Goal identifier: assigned from 1 upwards, never reused.
pub type GoalId = u64;

/// Completion percentage at which a goal counts as done.
pub const FULL_PROGRESS: u8 = 100;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status. `Active` is the only non-terminal state.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GoalStatus {
  Active,
  Completed,
  Failed,
}

impl GoalStatus {
  /// Numeric status code as exposed by the contract interface.
  pub fn code(self) -> u8 {
    match self {
      Self::Active => 0,
      Self::Completed => 1,
      Self::Failed => 2,
    }
  }

  pub fn from_code(code: u8) -> crate::Result<Self> {
    match code {
      0 => Ok(Self::Active),
      1 => Ok(Self::Completed),
      2 => Ok(Self::Failed),
      other => Err(crate::Error::UnknownStatus(other)),
    }
  }

  pub fn is_terminal(self) -> bool { !matches!(self, Self::Active) }
}

// ─── Goal ────────────────────────────────────────────────────────────────────

/// The canonical goal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
  pub id:                      GoalId,
  pub title:                   String,
  pub description:             String,
  /// Plan text produced by the planning assistant; may be empty.
  pub ai_suggestion:           String,
  pub creator:                 Address,
  /// Stake in the smallest currency unit. Never changes after creation.
  #[serde(with = "crate::amount")]
  pub amount:                  u128,
  pub status:                  GoalStatus,
  pub created_at:              DateTime<Utc>,
  pub deadline:                DateTime<Utc>,
  pub comment_counter:         u64,
  pub progress_percentage:     u8,
  pub progress_update_counter: u64,
  /// Fixed at creation, in the order the creator listed them.
  pub witnesses:               Vec<Address>,
  /// Witnesses who have confirmed, in confirmation order.
  pub confirmations:           Vec<Address>,
}

impl Goal {
  pub fn is_witness(&self, account: &Address) -> bool {
    self.witnesses.contains(account)
  }

  pub fn has_confirmed(&self, account: &Address) -> bool {
    self.confirmations.contains(account)
  }

  pub fn progress_complete(&self) -> bool {
    self.progress_percentage >= FULL_PROGRESS
  }

  /// Witnesses who have not confirmed yet.
  pub fn pending_witnesses(&self) -> impl Iterator<Item = &Address> {
    self.witnesses.iter().filter(|w| !self.has_confirmed(w))
  }

  /// True when the goal has at least one witness and all of them confirmed.
  ///
  /// A goal without witnesses is never "all confirmed"; see
  /// [`Goal::pending_witnesses`] for the completion gate, which is vacuously
  /// satisfied in that case.
  pub fn all_confirmed(&self) -> bool {
    !self.witnesses.is_empty() && self.pending_witnesses().next().is_none()
  }

  pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool { now >= self.deadline }
}

// ─── NewGoal ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::GoalStore::create_goal`].
/// The id, timestamps, status and counters are always set by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
  pub title:         String,
  pub description:   String,
  #[serde(default)]
  pub ai_suggestion: String,
  pub deadline:      DateTime<Utc>,
  #[serde(default)]
  pub witnesses:     Vec<Address>,
  #[serde(with = "crate::amount")]
  pub amount:        u128,
}

impl NewGoal {
  /// Convenience constructor with no witnesses and no AI suggestion.
  pub fn new(
    title: impl Into<String>,
    description: impl Into<String>,
    deadline: DateTime<Utc>,
    amount: u128,
  ) -> Self {
    Self {
      title: title.into(),
      description: description.into(),
      ai_suggestion: String::new(),
      deadline,
      witnesses: Vec::new(),
      amount,
    }
  }

  pub fn with_witnesses(mut self, witnesses: impl IntoIterator<Item = Address>) -> Self {
    self.witnesses = witnesses.into_iter().collect();
    self
  }

  pub fn with_ai_suggestion(mut self, suggestion: impl Into<String>) -> Self {
    self.ai_suggestion = suggestion.into();
    self
  }
}

// ─── Materialised view ───────────────────────────────────────────────────────

/// A goal with its derived flags. Never stored; computed on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalView {
  #[serde(flatten)]
  pub goal:              Goal,
  pub all_confirmed:     bool,
  pub progress_complete: bool,
}

impl From<Goal> for GoalView {
  fn from(goal: Goal) -> Self {
    Self {
      all_confirmed: goal.all_confirmed(),
      progress_complete: goal.progress_complete(),
      goal,
    }
  }
}
