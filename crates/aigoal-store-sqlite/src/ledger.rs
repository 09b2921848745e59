//! Synchronous row access used inside a single SQLite transaction.
//!
//! Everything here runs on the `tokio_rusqlite` connection thread and takes
//! a plain `&Connection`, so the same helpers serve both read queries and the
//! write transactions in [`crate::store`] (`Transaction` derefs to it).

use aigoal_core::{
  Address, Error as CoreError, Goal, GoalId,
  agent::Agent,
  event::{BlockRange, Event, EventPayload},
  ledger::{Comment, ProgressUpdate},
  store::GoalFilter,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, ToSql, params};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    AGENT_COLUMNS, COMMENT_COLUMNS, EVENT_COLUMNS, GOAL_COLUMNS, PROGRESS_COLUMNS, RawAgent,
    RawComment, RawEvent, RawGoal, RawProgressUpdate, encode_address, encode_amount,
    encode_dt, encode_uuid,
  },
};

// ─── Goals ───────────────────────────────────────────────────────────────────

pub fn load_goal(conn: &Connection, id: GoalId) -> Result<Option<Goal>> {
  let raw = conn
    .query_row(
      &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE goal_id = ?1"),
      params![id],
      RawGoal::from_row,
    )
    .optional()?;
  let Some(raw) = raw else {
    return Ok(None);
  };

  let mut stmt = conn.prepare(
    "SELECT witness, confirmed_block FROM witnesses WHERE goal_id = ?1 ORDER BY position",
  )?;
  let rows = stmt
    .query_map(params![id], |r| {
      Ok((r.get::<_, String>(0)?, r.get::<_, Option<u64>>(1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let witnesses: Vec<String> = rows.iter().map(|(w, _)| w.clone()).collect();
  let mut confirmed: Vec<(u64, String)> = rows
    .into_iter()
    .filter_map(|(w, block)| block.map(|b| (b, w)))
    .collect();
  confirmed.sort_unstable();
  let confirmed: Vec<String> = confirmed.into_iter().map(|(_, w)| w).collect();

  Ok(Some(raw.into_goal(&witnesses, &confirmed)?))
}

/// Like [`load_goal`] but a missing goal is a rejection.
pub fn require_goal(conn: &Connection, id: GoalId) -> Result<Goal> {
  load_goal(conn, id)?.ok_or_else(|| CoreError::GoalNotFound(id).into())
}

pub fn next_goal_id(conn: &Connection) -> Result<GoalId> {
  let max: u64 = conn.query_row("SELECT COALESCE(MAX(goal_id), 0) FROM goals", [], |r| {
    r.get(0)
  })?;
  Ok(max + 1)
}

pub fn insert_goal(conn: &Connection, goal: &Goal) -> Result<()> {
  conn.execute(
    "INSERT INTO goals (
       goal_id, title, description, ai_suggestion, creator, amount, status,
       created_at, deadline, comment_counter, progress_percentage,
       progress_update_counter
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    params![
      goal.id,
      goal.title,
      goal.description,
      goal.ai_suggestion,
      encode_address(&goal.creator),
      encode_amount(goal.amount),
      goal.status.code(),
      encode_dt(goal.created_at),
      encode_dt(goal.deadline),
      goal.comment_counter,
      goal.progress_percentage,
      goal.progress_update_counter,
    ],
  )?;

  let mut stmt =
    conn.prepare("INSERT INTO witnesses (goal_id, position, witness) VALUES (?1, ?2, ?3)")?;
  for (position, witness) in goal.witnesses.iter().enumerate() {
    stmt.execute(params![goal.id, position as u64, encode_address(witness)])?;
  }
  Ok(())
}

/// Persist the mutable scalar state of `goal`.
pub fn save_goal_state(conn: &Connection, goal: &Goal) -> Result<()> {
  conn.execute(
    "UPDATE goals
        SET status = ?2, comment_counter = ?3, progress_percentage = ?4,
            progress_update_counter = ?5
      WHERE goal_id = ?1",
    params![
      goal.id,
      goal.status.code(),
      goal.comment_counter,
      goal.progress_percentage,
      goal.progress_update_counter,
    ],
  )?;
  Ok(())
}

pub fn stamp_confirmation(
  conn: &Connection,
  goal_id: GoalId,
  witness: &Address,
  block: u64,
) -> Result<()> {
  conn.execute(
    "UPDATE witnesses SET confirmed_block = ?3
      WHERE goal_id = ?1 AND witness = ?2 AND confirmed_block IS NULL",
    params![goal_id, encode_address(witness), block],
  )?;
  Ok(())
}

pub fn goal_ids(conn: &Connection, filter: GoalFilter) -> Result<Vec<GoalId>> {
  let (sql, arg): (&str, Option<Box<dyn ToSql>>) = match filter {
    GoalFilter::All => ("SELECT goal_id FROM goals ORDER BY goal_id", None),
    GoalFilter::Status(status) => (
      "SELECT goal_id FROM goals WHERE status = ?1 ORDER BY goal_id",
      Some(Box::new(status.code())),
    ),
    GoalFilter::CreatedBy(creator) => (
      "SELECT goal_id FROM goals WHERE creator = ?1 ORDER BY goal_id",
      Some(Box::new(encode_address(&creator))),
    ),
    GoalFilter::WitnessedBy(witness) => (
      "SELECT goal_id FROM witnesses WHERE witness = ?1 ORDER BY goal_id",
      Some(Box::new(encode_address(&witness))),
    ),
  };

  let mut stmt = conn.prepare(sql)?;
  let ids: rusqlite::Result<Vec<GoalId>> = match arg {
    Some(arg) => stmt.query_map(params![arg], |r| r.get(0))?.collect(),
    None => stmt.query_map([], |r| r.get(0))?.collect(),
  };
  Ok(ids?)
}

// ─── Progress & comments ─────────────────────────────────────────────────────

pub fn insert_progress(conn: &Connection, update: &ProgressUpdate) -> Result<()> {
  conn.execute(
    "INSERT INTO progress_updates (
       goal_id, update_id, content, proof_file_blob_id, progress_percentage,
       creator, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      update.goal_id,
      update.id,
      update.content,
      update.proof_file_blob_id,
      update.progress_percentage,
      encode_address(&update.creator),
      encode_dt(update.created_at),
    ],
  )?;
  Ok(())
}

pub fn load_progress(
  conn: &Connection,
  goal_id: GoalId,
  update_id: Option<u64>,
) -> Result<Vec<ProgressUpdate>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {PROGRESS_COLUMNS} FROM progress_updates
      WHERE goal_id = ?1 AND (?2 IS NULL OR update_id = ?2)
      ORDER BY update_id"
  ))?;
  let raws = stmt
    .query_map(params![goal_id, update_id], RawProgressUpdate::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawProgressUpdate::into_update).collect()
}

pub fn insert_comment(conn: &Connection, comment: &Comment) -> Result<()> {
  conn.execute(
    "INSERT INTO comments (goal_id, comment_id, content, creator, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      comment.goal_id,
      comment.id,
      comment.content,
      encode_address(&comment.creator),
      encode_dt(comment.created_at),
    ],
  )?;
  Ok(())
}

pub fn load_comments(
  conn: &Connection,
  goal_id: GoalId,
  comment_id: Option<u64>,
) -> Result<Vec<Comment>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {COMMENT_COLUMNS} FROM comments
      WHERE goal_id = ?1 AND (?2 IS NULL OR comment_id = ?2)
      ORDER BY comment_id"
  ))?;
  let raws = stmt
    .query_map(params![goal_id, comment_id], RawComment::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawComment::into_comment).collect()
}

// ─── Agents ──────────────────────────────────────────────────────────────────

pub fn agent_by_id(conn: &Connection, agent_id: Uuid) -> Result<Option<Agent>> {
  conn
    .query_row(
      &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE agent_id = ?1"),
      params![encode_uuid(agent_id)],
      RawAgent::from_row,
    )
    .optional()?
    .map(RawAgent::into_agent)
    .transpose()
}

pub fn agent_by_goal(conn: &Connection, goal_id: GoalId) -> Result<Option<Agent>> {
  conn
    .query_row(
      &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE goal_id = ?1"),
      params![goal_id],
      RawAgent::from_row,
    )
    .optional()?
    .map(RawAgent::into_agent)
    .transpose()
}

/// Replace whatever agent the goal had with `agent`.
pub fn replace_agent(conn: &Connection, agent: &Agent) -> Result<()> {
  conn.execute("DELETE FROM agents WHERE goal_id = ?1", params![agent.goal_id])?;
  conn.execute(
    "INSERT INTO agents (agent_id, goal_id, name, character_json, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      encode_uuid(agent.agent_id),
      agent.goal_id,
      agent.name,
      agent.character_json,
      encode_dt(agent.created_at),
      encode_dt(agent.updated_at),
    ],
  )?;
  Ok(())
}

// ─── Event log ───────────────────────────────────────────────────────────────

pub fn latest_block(conn: &Connection) -> Result<u64> {
  Ok(conn.query_row("SELECT COALESCE(MAX(block_number), 0) FROM events", [], |r| {
    r.get(0)
  })?)
}

/// `0x`-prefixed SHA-256 over the block number and the serialised payload.
pub fn transaction_hash(block: u64, event_name: &str, args_json: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(block.to_be_bytes());
  hasher.update(event_name.as_bytes());
  hasher.update(args_json.as_bytes());
  format!("0x{}", hex::encode(hasher.finalize()))
}

/// Append `payload` as the single event of a new block.
pub fn append_event(
  conn: &Connection,
  payload: EventPayload,
  now: DateTime<Utc>,
) -> Result<Event> {
  let block = latest_block(conn)? + 1;
  let event_name = payload.discriminant();
  let args_json = payload.to_args_json()?.to_string();

  let event = Event {
    block_number:     block,
    log_index:        0,
    transaction_hash: transaction_hash(block, event_name, &args_json),
    recorded_at:      now,
    payload,
  };

  conn.execute(
    "INSERT INTO events (
       block_number, log_index, transaction_hash, event_name, goal_id, actor,
       args_json, recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    params![
      event.block_number,
      event.log_index,
      event.transaction_hash,
      event_name,
      event.payload.goal_id(),
      encode_address(event.payload.actor()),
      args_json,
      encode_dt(event.recorded_at),
    ],
  )?;
  Ok(event)
}

/// Events in `range`, ascending. Rows that no longer decode (e.g. an event
/// kind this build does not know) are logged and skipped.
pub fn load_events(conn: &Connection, range: BlockRange) -> Result<Vec<Event>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {EVENT_COLUMNS} FROM events
      WHERE block_number BETWEEN ?1 AND ?2
      ORDER BY block_number, log_index"
  ))?;
  let raws = stmt
    .query_map(params![range.from, range.to], RawEvent::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(
    raws
      .into_iter()
      .filter_map(|raw| {
        let block = raw.block_number;
        match raw.into_event() {
          Ok(event) => Some(event),
          Err(e) => {
            tracing::warn!(block, error = %e, "skipping undecodable event row");
            None
          }
        }
      })
      .collect(),
  )
}
