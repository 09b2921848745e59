//! Error types for `aigoal-core`.
//!
//! Every variant is a domain rejection: the request was well-formed but the
//! ledger refused it. [`Error::kind`] groups them for callers that only care
//! about the broad category (e.g. for HTTP status mapping).

use thiserror::Error;

use crate::{address::Address, goal::GoalId};

/// Broad category of a domain rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The request violates a precondition on the goal or its input.
  Validation,
  /// The actor lacks the role the operation requires.
  Authorization,
  /// A referenced record does not exist.
  NotFound,
}

#[derive(Debug, Error)]
pub enum Error {
  // ── Not found ─────────────────────────────────────────────────────────────
  #[error("goal not found: {0}")]
  GoalNotFound(GoalId),

  #[error("comment {comment_id} not found on goal {goal_id}")]
  CommentNotFound { goal_id: GoalId, comment_id: u64 },

  #[error("progress update {update_id} not found on goal {goal_id}")]
  ProgressUpdateNotFound { goal_id: GoalId, update_id: u64 },

  #[error("agent not found: {0}")]
  AgentNotFound(uuid::Uuid),

  #[error("goal {0} has no agent")]
  NoAgent(GoalId),

  // ── Validation ────────────────────────────────────────────────────────────
  #[error("{0} must not be empty")]
  EmptyField(&'static str),

  #[error("deadline must be in the future")]
  DeadlineInPast,

  #[error("stake amount must be greater than zero")]
  ZeroStake,

  #[error("witness {0} is listed more than once")]
  DuplicateWitness(Address),

  #[error("the creator cannot witness their own goal")]
  SelfWitness,

  #[error("goal {0} is no longer active")]
  GoalNotActive(GoalId),

  #[error("progress cannot go from {current}% to {requested}%")]
  ProgressRegression { current: u8, requested: u8 },

  #[error("progress percentage {0} is out of range 0-100")]
  ProgressOutOfRange(u8),

  #[error("witness {0} has already confirmed")]
  AlreadyConfirmed(Address),

  #[error("goal {goal_id} is at {progress}%; it must reach 100% first")]
  ProgressIncomplete { goal_id: GoalId, progress: u8 },

  #[error("goal {goal_id} still awaits {pending} witness confirmation(s)")]
  ConfirmationsPending { goal_id: GoalId, pending: usize },

  #[error("agent {agent_id} is already linked to goal {goal_id}")]
  AgentAlreadyLinked { agent_id: uuid::Uuid, goal_id: GoalId },

  // ── Authorization ─────────────────────────────────────────────────────────
  #[error("only the creator of goal {0} may do this")]
  NotCreator(GoalId),

  #[error("{witness} is not a witness of goal {goal_id}")]
  NotWitness { goal_id: GoalId, witness: Address },

  #[error("goal {0} may only be failed by its creator before the deadline")]
  FailBeforeDeadline(GoalId),

  // ── Encoding ──────────────────────────────────────────────────────────────
  #[error("invalid address: {0:?}")]
  InvalidAddress(String),

  #[error("unknown goal status code: {0}")]
  UnknownStatus(u8),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// The broad category of this error, or `None` for encoding failures that
  /// are not rejections on the merits.
  pub fn kind(&self) -> Option<ErrorKind> {
    match self {
      Self::GoalNotFound(_)
      | Self::CommentNotFound { .. }
      | Self::ProgressUpdateNotFound { .. }
      | Self::AgentNotFound(_)
      | Self::NoAgent(_) => Some(ErrorKind::NotFound),

      Self::EmptyField(_)
      | Self::DeadlineInPast
      | Self::ZeroStake
      | Self::DuplicateWitness(_)
      | Self::SelfWitness
      | Self::GoalNotActive(_)
      | Self::ProgressRegression { .. }
      | Self::ProgressOutOfRange(_)
      | Self::AlreadyConfirmed(_)
      | Self::ProgressIncomplete { .. }
      | Self::ConfirmationsPending { .. }
      | Self::AgentAlreadyLinked { .. } => Some(ErrorKind::Validation),

      Self::NotCreator(_)
      | Self::NotWitness { .. }
      | Self::FailBeforeDeadline(_) => Some(ErrorKind::Authorization),

      Self::InvalidAddress(_) | Self::UnknownStatus(_) | Self::Serialization(_) => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
