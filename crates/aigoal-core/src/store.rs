//! The `GoalStore` trait and supporting query types.
//!
//! The trait is implemented by ledger backends (e.g. `aigoal-store-sqlite`).
//! Higher layers (`aigoal-api`, the server binary) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  address::Address,
  agent::{Agent, NewAgent},
  event::{BlockRange, Event},
  goal::{Goal, GoalId, GoalStatus, NewGoal},
  ledger::{Comment, NewProgressUpdate, ProgressUpdate},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Which goal ids [`GoalStore::goal_ids`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalFilter {
  All,
  Status(GoalStatus),
  /// Goals created by this account.
  CreatedBy(Address),
  /// Goals listing this account as a witness.
  WitnessedBy(Address),
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Error bound for store backends.
///
/// Callers need to tell a rule rejection (bad input, wrong actor, missing
/// record) apart from an infrastructure failure; backends expose the former
/// through [`StoreError::rejection`].
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn rejection(&self) -> Option<&crate::Error>;
}

impl StoreError for crate::Error {
  fn rejection(&self) -> Option<&crate::Error> { self.kind().map(|_| self) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an AIGoal ledger backend.
///
/// Every mutation validates against the current record with the rules in
/// [`crate::lifecycle`] and, on success, persists the state change together
/// with exactly one appended [`Event`] as a single atomic unit. A rejected
/// mutation changes nothing and appends nothing.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait GoalStore: Send + Sync {
  type Error: StoreError;

  // ── Goal registry ─────────────────────────────────────────────────────

  /// Create a goal owned by `creator` and return it with its assigned id.
  fn create_goal(
    &self,
    creator: Address,
    input: NewGoal,
  ) -> impl Future<Output = Result<Goal, Self::Error>> + Send + '_;

  /// Retrieve a goal by id. Returns `None` if not found.
  fn get_goal(
    &self,
    id: GoalId,
  ) -> impl Future<Output = Result<Option<Goal>, Self::Error>> + Send + '_;

  /// Ids of the goals matching `filter`, ascending.
  fn goal_ids(
    &self,
    filter: GoalFilter,
  ) -> impl Future<Output = Result<Vec<GoalId>, Self::Error>> + Send + '_;

  /// Resolve the goal as Completed. Creator only.
  fn complete_goal(
    &self,
    id: GoalId,
    actor: Address,
  ) -> impl Future<Output = Result<Goal, Self::Error>> + Send + '_;

  /// Resolve the goal as Failed.
  fn fail_goal(
    &self,
    id: GoalId,
    actor: Address,
  ) -> impl Future<Output = Result<Goal, Self::Error>> + Send + '_;

  // ── Witness confirmation ──────────────────────────────────────────────

  /// Record `actor`'s confirmation. Fails for non-witnesses and repeats.
  fn confirm_witness(
    &self,
    id: GoalId,
    actor: Address,
  ) -> impl Future<Output = Result<Goal, Self::Error>> + Send + '_;

  // ── Progress ledger ───────────────────────────────────────────────────

  fn add_progress_update(
    &self,
    goal_id: GoalId,
    actor: Address,
    input: NewProgressUpdate,
  ) -> impl Future<Output = Result<ProgressUpdate, Self::Error>> + Send + '_;

  fn get_progress_update(
    &self,
    goal_id: GoalId,
    update_id: u64,
  ) -> impl Future<Output = Result<Option<ProgressUpdate>, Self::Error>> + Send + '_;

  /// All updates for the goal, ascending by id.
  fn list_progress_updates(
    &self,
    goal_id: GoalId,
  ) -> impl Future<Output = Result<Vec<ProgressUpdate>, Self::Error>> + Send + '_;

  // ── Comment ledger ────────────────────────────────────────────────────

  fn add_comment(
    &self,
    goal_id: GoalId,
    actor: Address,
    content: String,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    goal_id: GoalId,
    comment_id: u64,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// All comments for the goal, ascending by id.
  fn list_comments(
    &self,
    goal_id: GoalId,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  // ── Agents ────────────────────────────────────────────────────────────

  /// Link or re-link the goal's planning agent. Creator only.
  fn set_agent(
    &self,
    goal_id: GoalId,
    actor: Address,
    input: NewAgent,
  ) -> impl Future<Output = Result<Agent, Self::Error>> + Send + '_;

  fn get_agent(
    &self,
    agent_id: Uuid,
  ) -> impl Future<Output = Result<Option<Agent>, Self::Error>> + Send + '_;

  fn goal_agent(
    &self,
    goal_id: GoalId,
  ) -> impl Future<Output = Result<Option<Agent>, Self::Error>> + Send + '_;

  // ── Event log ─────────────────────────────────────────────────────────

  /// The highest committed block number; `0` for an empty ledger.
  fn latest_block(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Events whose block lies in `range`, ascending by `(block, log_index)`.
  fn events(
    &self,
    range: BlockRange,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;
}
