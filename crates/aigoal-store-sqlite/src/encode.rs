//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, addresses their `0x` lowercase hex form,
//! stake amounts decimal strings (SQLite integers stop at 64 bits) and UUIDs
//! hyphenated lowercase strings.

use aigoal_core::{
  Address, Goal, GoalStatus,
  agent::Agent,
  event::{Event, EventPayload},
  ledger::{Comment, ProgressUpdate},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_address(a: &Address) -> String { a.to_string() }

pub fn decode_address(s: &str) -> Result<Address> { Ok(s.parse()?) }

pub fn encode_amount(amount: u128) -> String { amount.to_string() }

pub fn decode_amount(s: &str) -> Result<u128> {
  s.parse()
    .map_err(|_| Error::Corrupt(format!("stake amount {s:?}")))
}

fn decode_percentage(p: u8) -> Result<u8> {
  if p > aigoal_core::goal::FULL_PROGRESS {
    return Err(Error::Corrupt(format!("progress percentage {p}")));
  }
  Ok(p)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `goals` row.
pub struct RawGoal {
  pub goal_id:                 u64,
  pub title:                   String,
  pub description:             String,
  pub ai_suggestion:           String,
  pub creator:                 String,
  pub amount:                  String,
  pub status:                  u8,
  pub created_at:              String,
  pub deadline:                String,
  pub comment_counter:         u64,
  pub progress_percentage:     u8,
  pub progress_update_counter: u64,
}

/// Select list matching [`RawGoal::from_row`].
pub const GOAL_COLUMNS: &str = "goal_id, title, description, ai_suggestion, creator, amount,
  status, created_at, deadline, comment_counter, progress_percentage,
  progress_update_counter";

impl RawGoal {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      goal_id:                 row.get(0)?,
      title:                   row.get(1)?,
      description:             row.get(2)?,
      ai_suggestion:           row.get(3)?,
      creator:                 row.get(4)?,
      amount:                  row.get(5)?,
      status:                  row.get(6)?,
      created_at:              row.get(7)?,
      deadline:                row.get(8)?,
      comment_counter:         row.get(9)?,
      progress_percentage:     row.get(10)?,
      progress_update_counter: row.get(11)?,
    })
  }

  /// `witnesses` in declaration order; `confirmed` in confirmation order.
  pub fn into_goal(self, witnesses: &[String], confirmed: &[String]) -> Result<Goal> {
    Ok(Goal {
      id:                      self.goal_id,
      title:                   self.title,
      description:             self.description,
      ai_suggestion:           self.ai_suggestion,
      creator:                 decode_address(&self.creator)?,
      amount:                  decode_amount(&self.amount)?,
      status:                  GoalStatus::from_code(self.status)?,
      created_at:              decode_dt(&self.created_at)?,
      deadline:                decode_dt(&self.deadline)?,
      comment_counter:         self.comment_counter,
      progress_percentage:     decode_percentage(self.progress_percentage)?,
      progress_update_counter: self.progress_update_counter,
      witnesses:               witnesses
        .iter()
        .map(|w| decode_address(w))
        .collect::<Result<_>>()?,
      confirmations:           confirmed
        .iter()
        .map(|w| decode_address(w))
        .collect::<Result<_>>()?,
    })
  }
}

pub struct RawProgressUpdate {
  pub goal_id:             u64,
  pub update_id:           u64,
  pub content:             String,
  pub proof_file_blob_id:  Option<String>,
  pub progress_percentage: u8,
  pub creator:             String,
  pub created_at:          String,
}

pub const PROGRESS_COLUMNS: &str = "goal_id, update_id, content, proof_file_blob_id,
  progress_percentage, creator, created_at";

impl RawProgressUpdate {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      goal_id:             row.get(0)?,
      update_id:           row.get(1)?,
      content:             row.get(2)?,
      proof_file_blob_id:  row.get(3)?,
      progress_percentage: row.get(4)?,
      creator:             row.get(5)?,
      created_at:          row.get(6)?,
    })
  }

  pub fn into_update(self) -> Result<ProgressUpdate> {
    Ok(ProgressUpdate {
      goal_id:             self.goal_id,
      id:                  self.update_id,
      content:             self.content,
      proof_file_blob_id:  self.proof_file_blob_id,
      progress_percentage: decode_percentage(self.progress_percentage)?,
      creator:             decode_address(&self.creator)?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawComment {
  pub goal_id:    u64,
  pub comment_id: u64,
  pub content:    String,
  pub creator:    String,
  pub created_at: String,
}

pub const COMMENT_COLUMNS: &str = "goal_id, comment_id, content, creator, created_at";

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      goal_id:    row.get(0)?,
      comment_id: row.get(1)?,
      content:    row.get(2)?,
      creator:    row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      goal_id:    self.goal_id,
      id:         self.comment_id,
      content:    self.content,
      creator:    decode_address(&self.creator)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawAgent {
  pub agent_id:       String,
  pub goal_id:        u64,
  pub name:           String,
  pub character_json: String,
  pub created_at:     String,
  pub updated_at:     String,
}

pub const AGENT_COLUMNS: &str = "agent_id, goal_id, name, character_json, created_at, updated_at";

impl RawAgent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      agent_id:       row.get(0)?,
      goal_id:        row.get(1)?,
      name:           row.get(2)?,
      character_json: row.get(3)?,
      created_at:     row.get(4)?,
      updated_at:     row.get(5)?,
    })
  }

  pub fn into_agent(self) -> Result<Agent> {
    Ok(Agent {
      agent_id:       decode_uuid(&self.agent_id)?,
      goal_id:        self.goal_id,
      name:           self.name,
      character_json: self.character_json,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawEvent {
  pub block_number:     u64,
  pub log_index:        u32,
  pub transaction_hash: String,
  pub event_name:       String,
  pub args_json:        String,
  pub recorded_at:      String,
}

pub const EVENT_COLUMNS: &str =
  "block_number, log_index, transaction_hash, event_name, args_json, recorded_at";

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      block_number:     row.get(0)?,
      log_index:        row.get(1)?,
      transaction_hash: row.get(2)?,
      event_name:       row.get(3)?,
      args_json:        row.get(4)?,
      recorded_at:      row.get(5)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    let args: serde_json::Value = serde_json::from_str(&self.args_json)?;
    Ok(Event {
      block_number:     self.block_number,
      log_index:        self.log_index,
      transaction_hash: self.transaction_hash,
      recorded_at:      decode_dt(&self.recorded_at)?,
      payload:          EventPayload::from_parts(&self.event_name, args)?,
    })
  }
}
