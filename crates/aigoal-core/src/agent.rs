//! Planning-agent association.
//!
//! A goal may be linked to at most one agent record. The agent itself lives in
//! an external runtime; the ledger only keeps its id, name and character
//! configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::goal::GoalId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
  pub agent_id:       Uuid,
  pub goal_id:        GoalId,
  pub name:           String,
  /// Character configuration as handed to the agent runtime; opaque JSON text.
  pub character_json: String,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

/// Input to [`crate::store::GoalStore::set_agent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAgent {
  pub agent_id:       Uuid,
  pub name:           String,
  #[serde(default)]
  pub character_json: String,
}
