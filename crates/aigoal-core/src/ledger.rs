//! Per-goal append-only ledgers: progress updates and comments.
//!
//! Entries are keyed by `(goal_id, id)` where `id` is a 1-based sequence
//! assigned by the store. Neither ledger supports edits or deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{address::Address, goal::GoalId};

/// A creator-authored report that advances a goal's completion percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
  pub goal_id:             GoalId,
  /// 1-based, contiguous within the goal.
  pub id:                  u64,
  pub content:             String,
  /// Opaque reference into the proof-file blob store.
  pub proof_file_blob_id:  Option<String>,
  /// The percentage the goal was moved to by this update.
  pub progress_percentage: u8,
  pub creator:             Address,
  pub created_at:          DateTime<Utc>,
}

/// Input to [`crate::store::GoalStore::add_progress_update`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProgressUpdate {
  pub content:            String,
  pub percentage:         u8,
  #[serde(default)]
  pub proof_file_blob_id: Option<String>,
}

impl NewProgressUpdate {
  pub fn new(content: impl Into<String>, percentage: u8) -> Self {
    Self {
      content: content.into(),
      percentage,
      proof_file_blob_id: None,
    }
  }

  pub fn with_proof(mut self, blob_id: impl Into<String>) -> Self {
    self.proof_file_blob_id = Some(blob_id.into());
    self
  }
}

/// A free-text comment; any account may post one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub goal_id:    GoalId,
  /// 1-based, contiguous within the goal; independent of progress ids.
  pub id:         u64,
  pub content:    String,
  pub creator:    Address,
  pub created_at: DateTime<Utc>,
}
