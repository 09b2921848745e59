//! [`SqliteStore`], the SQLite implementation of [`GoalStore`].

use std::path::Path;

use aigoal_core::{
  Address, Goal, GoalId,
  agent::{Agent, NewAgent},
  goal::NewGoal,
  event::{BlockRange, Event},
  ledger::{Comment, NewProgressUpdate, ProgressUpdate},
  lifecycle,
  store::{GoalFilter, GoalStore},
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use crate::{Error, Result, ledger, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An AIGoal ledger backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is shared. All clones
/// funnel through one connection thread, so mutations are serialised and
/// block numbers come out strictly increasing.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` against the connection thread.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(&*conn))).await?
  }

  /// Run `f` inside an immediate write transaction. The transaction commits
  /// only if `f` succeeds; any rejection rolls back every write it made.
  /// `f` returns its result together with the event it appended, which is
  /// logged once the commit has gone through.
  pub(crate) async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection, DateTime<Utc>) -> Result<(T, Event)> + Send + 'static,
  {
    let now = Utc::now();
    let (value, event) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        match f(&*tx, now) {
          Ok(done) => {
            tx.commit()?;
            Ok(Ok(done))
          }
          Err(e) => Ok(Err(e)),
        }
      })
      .await??;
    committed(&event);
    Ok(value)
  }
}

fn committed(event: &Event) {
  tracing::debug!(
    block = event.block_number,
    goal_id = event.payload.goal_id(),
    event = event.payload.discriminant(),
    tx = %event.transaction_hash,
    "event committed"
  );
}

// ─── GoalStore impl ──────────────────────────────────────────────────────────

impl GoalStore for SqliteStore {
  type Error = Error;

  // ── Goal registry ─────────────────────────────────────────────────────────

  async fn create_goal(&self, creator: Address, input: NewGoal) -> Result<Goal> {
    self
      .write(move |conn, now| {
        let id = ledger::next_goal_id(conn)?;
        let (goal, payload) = lifecycle::create(id, creator, input, now)?;
        ledger::insert_goal(conn, &goal)?;
        let event = ledger::append_event(conn, payload, now)?;
        Ok((goal, event))
      })
      .await
  }

  async fn get_goal(&self, id: GoalId) -> Result<Option<Goal>> {
    self.read(move |conn| ledger::load_goal(conn, id)).await
  }

  async fn goal_ids(&self, filter: GoalFilter) -> Result<Vec<GoalId>> {
    self.read(move |conn| ledger::goal_ids(conn, filter)).await
  }

  async fn complete_goal(&self, id: GoalId, actor: Address) -> Result<Goal> {
    self
      .write(move |conn, now| {
        let mut goal = ledger::require_goal(conn, id)?;
        let payload = lifecycle::complete(&mut goal, &actor)?;
        ledger::save_goal_state(conn, &goal)?;
        let event = ledger::append_event(conn, payload, now)?;
        Ok((goal, event))
      })
      .await
  }

  async fn fail_goal(&self, id: GoalId, actor: Address) -> Result<Goal> {
    self
      .write(move |conn, now| {
        let mut goal = ledger::require_goal(conn, id)?;
        let payload = lifecycle::fail(&mut goal, &actor, now)?;
        ledger::save_goal_state(conn, &goal)?;
        let event = ledger::append_event(conn, payload, now)?;
        Ok((goal, event))
      })
      .await
  }

  // ── Witness confirmation ──────────────────────────────────────────────────

  async fn confirm_witness(&self, id: GoalId, actor: Address) -> Result<Goal> {
    self
      .write(move |conn, now| {
        let mut goal = ledger::require_goal(conn, id)?;
        let payload = lifecycle::confirm(&mut goal, &actor)?;
        let event = ledger::append_event(conn, payload, now)?;
        ledger::stamp_confirmation(conn, id, &actor, event.block_number)?;
        Ok((goal, event))
      })
      .await
  }

  // ── Progress ledger ───────────────────────────────────────────────────────

  async fn add_progress_update(
    &self,
    goal_id: GoalId,
    actor: Address,
    input: NewProgressUpdate,
  ) -> Result<ProgressUpdate> {
    self
      .write(move |conn, now| {
        let mut goal = ledger::require_goal(conn, goal_id)?;
        let (update, payload) = lifecycle::record_progress(&mut goal, &actor, input, now)?;
        ledger::insert_progress(conn, &update)?;
        ledger::save_goal_state(conn, &goal)?;
        let event = ledger::append_event(conn, payload, now)?;
        Ok((update, event))
      })
      .await
  }

  async fn get_progress_update(
    &self,
    goal_id: GoalId,
    update_id: u64,
  ) -> Result<Option<ProgressUpdate>> {
    self
      .read(move |conn| {
        Ok(ledger::load_progress(conn, goal_id, Some(update_id))?.into_iter().next())
      })
      .await
  }

  async fn list_progress_updates(&self, goal_id: GoalId) -> Result<Vec<ProgressUpdate>> {
    self
      .read(move |conn| {
        ledger::require_goal(conn, goal_id)?;
        ledger::load_progress(conn, goal_id, None)
      })
      .await
  }

  // ── Comment ledger ────────────────────────────────────────────────────────

  async fn add_comment(&self, goal_id: GoalId, actor: Address, content: String) -> Result<Comment> {
    self
      .write(move |conn, now| {
        let mut goal = ledger::require_goal(conn, goal_id)?;
        let (comment, payload) = lifecycle::record_comment(&mut goal, &actor, content, now)?;
        ledger::insert_comment(conn, &comment)?;
        ledger::save_goal_state(conn, &goal)?;
        let event = ledger::append_event(conn, payload, now)?;
        Ok((comment, event))
      })
      .await
  }

  async fn get_comment(&self, goal_id: GoalId, comment_id: u64) -> Result<Option<Comment>> {
    self
      .read(move |conn| {
        Ok(ledger::load_comments(conn, goal_id, Some(comment_id))?.into_iter().next())
      })
      .await
  }

  async fn list_comments(&self, goal_id: GoalId) -> Result<Vec<Comment>> {
    self
      .read(move |conn| {
        ledger::require_goal(conn, goal_id)?;
        ledger::load_comments(conn, goal_id, None)
      })
      .await
  }

  // ── Agents ────────────────────────────────────────────────────────────────

  async fn set_agent(&self, goal_id: GoalId, actor: Address, input: NewAgent) -> Result<Agent> {
    self
      .write(move |conn, now| {
        let goal = ledger::require_goal(conn, goal_id)?;
        let existing = ledger::agent_by_goal(conn, goal_id)?;
        let holder = ledger::agent_by_id(conn, input.agent_id)?.map(|a| a.goal_id);
        let (agent, payload) =
          lifecycle::link_agent(&goal, &actor, existing.as_ref(), holder, input, now)?;
        ledger::replace_agent(conn, &agent)?;
        let event = ledger::append_event(conn, payload, now)?;
        Ok((agent, event))
      })
      .await
  }

  async fn get_agent(&self, agent_id: Uuid) -> Result<Option<Agent>> {
    self.read(move |conn| ledger::agent_by_id(conn, agent_id)).await
  }

  async fn goal_agent(&self, goal_id: GoalId) -> Result<Option<Agent>> {
    self
      .read(move |conn| {
        ledger::require_goal(conn, goal_id)?;
        ledger::agent_by_goal(conn, goal_id)
      })
      .await
  }

  // ── Event log ─────────────────────────────────────────────────────────────

  async fn latest_block(&self) -> Result<u64> { self.read(ledger::latest_block).await }

  async fn events(&self, range: BlockRange) -> Result<Vec<Event>> {
    // SQLite integers are signed 64-bit.
    let range = BlockRange::new(range.from, range.to.min(i64::MAX as u64));
    if range.from > range.to {
      return Ok(Vec::new());
    }
    self.read(move |conn| ledger::load_events(conn, range)).await
  }
}
