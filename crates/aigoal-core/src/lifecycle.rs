//! The goal state machine.
//!
//! Each function here checks a request against the current goal record and,
//! if it is allowed, applies it in memory and returns the event to append.
//! Nothing is touched when a check fails. Storage backends load the goal
//! inside a transaction, call the matching function, and persist the result
//! together with the event, so these rules hold for every backend.
//!
//! ```text
//! Active ──complete──▶ Completed
//!    └────fail──────▶ Failed
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  address::Address,
  agent::{Agent, NewAgent},
  event::EventPayload,
  goal::{FULL_PROGRESS, Goal, GoalId, GoalStatus, NewGoal},
  ledger::{Comment, NewProgressUpdate, ProgressUpdate},
};

fn require_text(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::EmptyField(field));
  }
  Ok(())
}

fn require_active(goal: &Goal) -> Result<()> {
  if goal.status.is_terminal() {
    return Err(Error::GoalNotActive(goal.id));
  }
  Ok(())
}

fn require_creator(goal: &Goal, actor: &Address) -> Result<()> {
  if &goal.creator != actor {
    return Err(Error::NotCreator(goal.id));
  }
  Ok(())
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// Validate a creation request without building anything.
pub fn check_new_goal(creator: &Address, input: &NewGoal, now: DateTime<Utc>) -> Result<()> {
  require_text("title", &input.title)?;
  require_text("description", &input.description)?;
  if input.deadline <= now {
    return Err(Error::DeadlineInPast);
  }
  if input.amount == 0 {
    return Err(Error::ZeroStake);
  }

  let mut seen = HashSet::with_capacity(input.witnesses.len());
  for witness in &input.witnesses {
    if witness == creator {
      return Err(Error::SelfWitness);
    }
    if !seen.insert(witness) {
      return Err(Error::DuplicateWitness(*witness));
    }
  }
  Ok(())
}

/// Build a fresh Active goal with id `id`.
pub fn create(
  id: GoalId,
  creator: Address,
  input: NewGoal,
  now: DateTime<Utc>,
) -> Result<(Goal, EventPayload)> {
  check_new_goal(&creator, &input, now)?;

  let goal = Goal {
    id,
    title: input.title,
    description: input.description,
    ai_suggestion: input.ai_suggestion,
    creator,
    amount: input.amount,
    status: GoalStatus::Active,
    created_at: now,
    deadline: input.deadline,
    comment_counter: 0,
    progress_percentage: 0,
    progress_update_counter: 0,
    witnesses: input.witnesses,
    confirmations: Vec::new(),
  };

  let event = EventPayload::GoalCreated {
    goal_id:   goal.id,
    creator:   goal.creator,
    title:     goal.title.clone(),
    witnesses: goal.witnesses.clone(),
    amount:    goal.amount,
    deadline:  goal.deadline,
  };
  Ok((goal, event))
}

/// Creator-only transition to `Completed` once progress is full and every
/// witness has confirmed. A goal without witnesses only needs full progress.
pub fn check_complete(goal: &Goal, actor: &Address) -> Result<()> {
  require_active(goal)?;
  require_creator(goal, actor)?;
  if !goal.progress_complete() {
    return Err(Error::ProgressIncomplete {
      goal_id:  goal.id,
      progress: goal.progress_percentage,
    });
  }
  let pending = goal.pending_witnesses().count();
  if pending > 0 {
    return Err(Error::ConfirmationsPending { goal_id: goal.id, pending });
  }
  Ok(())
}

pub fn complete(goal: &mut Goal, actor: &Address) -> Result<EventPayload> {
  check_complete(goal, actor)?;
  goal.status = GoalStatus::Completed;
  Ok(EventPayload::GoalCompleted { goal_id: goal.id, completer: *actor })
}

/// The creator may give up at any time; anyone else may only fail a goal
/// whose deadline has passed.
pub fn check_fail(goal: &Goal, actor: &Address, now: DateTime<Utc>) -> Result<()> {
  require_active(goal)?;
  if &goal.creator != actor && !goal.deadline_passed(now) {
    return Err(Error::FailBeforeDeadline(goal.id));
  }
  Ok(())
}

pub fn fail(goal: &mut Goal, actor: &Address, now: DateTime<Utc>) -> Result<EventPayload> {
  check_fail(goal, actor, now)?;
  goal.status = GoalStatus::Failed;
  Ok(EventPayload::GoalFailed { goal_id: goal.id, failer: *actor })
}

// ─── Witness confirmation ────────────────────────────────────────────────────

pub fn check_confirm(goal: &Goal, actor: &Address) -> Result<()> {
  require_active(goal)?;
  if !goal.is_witness(actor) {
    return Err(Error::NotWitness { goal_id: goal.id, witness: *actor });
  }
  if goal.has_confirmed(actor) {
    return Err(Error::AlreadyConfirmed(*actor));
  }
  if !goal.progress_complete() {
    return Err(Error::ProgressIncomplete {
      goal_id:  goal.id,
      progress: goal.progress_percentage,
    });
  }
  Ok(())
}

pub fn confirm(goal: &mut Goal, actor: &Address) -> Result<EventPayload> {
  check_confirm(goal, actor)?;
  goal.confirmations.push(*actor);
  Ok(EventPayload::WitnessConfirmed { goal_id: goal.id, witness: *actor })
}

// ─── Progress ledger ─────────────────────────────────────────────────────────

pub fn check_progress(goal: &Goal, actor: &Address, input: &NewProgressUpdate) -> Result<()> {
  require_active(goal)?;
  require_creator(goal, actor)?;
  require_text("content", &input.content)?;
  if input.percentage > FULL_PROGRESS {
    return Err(Error::ProgressOutOfRange(input.percentage));
  }
  if input.percentage < goal.progress_percentage {
    return Err(Error::ProgressRegression {
      current:   goal.progress_percentage,
      requested: input.percentage,
    });
  }
  Ok(())
}

/// Append a progress update: the goal takes the reported percentage and the
/// entry gets the next sequence id.
pub fn record_progress(
  goal: &mut Goal,
  actor: &Address,
  input: NewProgressUpdate,
  now: DateTime<Utc>,
) -> Result<(ProgressUpdate, EventPayload)> {
  check_progress(goal, actor, &input)?;

  goal.progress_update_counter += 1;
  goal.progress_percentage = input.percentage;

  let update = ProgressUpdate {
    goal_id:             goal.id,
    id:                  goal.progress_update_counter,
    content:             input.content,
    proof_file_blob_id:  input.proof_file_blob_id,
    progress_percentage: input.percentage,
    creator:             *actor,
    created_at:          now,
  };
  let event = EventPayload::ProgressUpdated {
    goal_id:             goal.id,
    update_id:           update.id,
    creator:             *actor,
    content:             update.content.clone(),
    progress_percentage: update.progress_percentage,
    proof_file_blob_id:  update.proof_file_blob_id.clone(),
  };
  Ok((update, event))
}

// ─── Comment ledger ──────────────────────────────────────────────────────────

/// Comments are open to every account and allowed in every status.
pub fn record_comment(
  goal: &mut Goal,
  actor: &Address,
  content: String,
  now: DateTime<Utc>,
) -> Result<(Comment, EventPayload)> {
  require_text("content", &content)?;

  goal.comment_counter += 1;
  let comment = Comment {
    goal_id:    goal.id,
    id:         goal.comment_counter,
    content,
    creator:    *actor,
    created_at: now,
  };
  let event = EventPayload::CommentCreated {
    goal_id:    goal.id,
    comment_id: comment.id,
    creator:    *actor,
    content:    comment.content.clone(),
  };
  Ok((comment, event))
}

// ─── Agent association ───────────────────────────────────────────────────────

/// Link (or re-link) the goal's planning agent. Creator only; the first link
/// emits `AgentCreated`, later ones `AgentUpdated`.
///
/// `existing` is the goal's current agent; `holder` is the goal that currently
/// owns `input.agent_id`, if any. An agent serves one goal only.
pub fn link_agent(
  goal: &Goal,
  actor: &Address,
  existing: Option<&Agent>,
  holder: Option<GoalId>,
  input: NewAgent,
  now: DateTime<Utc>,
) -> Result<(Agent, EventPayload)> {
  require_creator(goal, actor)?;
  require_text("agent name", &input.name)?;
  if let Some(other) = holder.filter(|g| *g != goal.id) {
    return Err(Error::AgentAlreadyLinked { agent_id: input.agent_id, goal_id: other });
  }

  let agent = Agent {
    agent_id:       input.agent_id,
    goal_id:        goal.id,
    name:           input.name,
    character_json: input.character_json,
    created_at:     existing.map_or(now, |a| a.created_at),
    updated_at:     now,
  };

  let event = if existing.is_some() {
    EventPayload::AgentUpdated {
      goal_id:    goal.id,
      agent_id:   agent.agent_id,
      agent_name: agent.name.clone(),
      creator:    *actor,
    }
  } else {
    EventPayload::AgentCreated {
      goal_id:    goal.id,
      agent_id:   agent.agent_id,
      agent_name: agent.name.clone(),
      creator:    *actor,
    }
  };
  Ok((agent, event))
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;
  use crate::ErrorKind;

  fn addr(b: u8) -> Address { Address::from_bytes([b; 20]) }

  const CREATOR: u8 = 0xC0;
  const W1: u8 = 0x01;
  const W2: u8 = 0x02;
  const W3: u8 = 0x03;

  fn new_goal(witnesses: &[u8]) -> (Goal, DateTime<Utc>) {
    let now = Utc::now();
    let input = NewGoal::new("Run 5k", "Finish a 5k run", now + Duration::days(7), 1_000)
      .with_witnesses(witnesses.iter().copied().map(addr));
    let (goal, _) = create(1, addr(CREATOR), input, now).unwrap();
    (goal, now)
  }

  fn at_full_progress(witnesses: &[u8]) -> Goal {
    let (mut goal, now) = new_goal(witnesses);
    record_progress(&mut goal, &addr(CREATOR), NewProgressUpdate::new("done", 100), now).unwrap();
    goal
  }

  // ── Creation ──────────────────────────────────────────────────────────────

  #[test]
  fn create_starts_active_and_empty() {
    let (goal, _) = new_goal(&[W1, W2]);
    assert_eq!(goal.status, GoalStatus::Active);
    assert_eq!(goal.progress_percentage, 0);
    assert_eq!(goal.comment_counter, 0);
    assert_eq!(goal.progress_update_counter, 0);
    assert!(goal.confirmations.is_empty());
    assert_eq!(goal.witnesses, vec![addr(W1), addr(W2)]);
  }

  #[test]
  fn create_rejects_bad_input() {
    let now = Utc::now();
    let future = now + Duration::days(1);
    let creator = addr(CREATOR);

    let blank_title = NewGoal::new("  ", "d", future, 1);
    assert!(matches!(check_new_goal(&creator, &blank_title, now), Err(Error::EmptyField("title"))));

    let past = NewGoal::new("t", "d", now - Duration::seconds(1), 1);
    assert!(matches!(check_new_goal(&creator, &past, now), Err(Error::DeadlineInPast)));

    let exact = NewGoal::new("t", "d", now, 1);
    assert!(matches!(check_new_goal(&creator, &exact, now), Err(Error::DeadlineInPast)));

    let free = NewGoal::new("t", "d", future, 0);
    assert!(matches!(check_new_goal(&creator, &free, now), Err(Error::ZeroStake)));

    let selfie = NewGoal::new("t", "d", future, 1).with_witnesses([creator]);
    assert!(matches!(check_new_goal(&creator, &selfie, now), Err(Error::SelfWitness)));

    let twice = NewGoal::new("t", "d", future, 1).with_witnesses([addr(W1), addr(W1)]);
    assert!(matches!(check_new_goal(&creator, &twice, now), Err(Error::DuplicateWitness(_))));
  }

  // ── Progress ──────────────────────────────────────────────────────────────

  #[test]
  fn progress_is_monotonic_and_counted() {
    let (mut goal, now) = new_goal(&[W1]);
    let creator = addr(CREATOR);

    let (first, _) =
      record_progress(&mut goal, &creator, NewProgressUpdate::new("halfway", 50), now).unwrap();
    let (second, _) =
      record_progress(&mut goal, &creator, NewProgressUpdate::new("done", 100), now).unwrap();

    assert_eq!((first.id, second.id), (1, 2));
    assert_eq!(goal.progress_percentage, 100);
    assert_eq!(goal.progress_update_counter, 2);
  }

  #[test]
  fn progress_regression_leaves_goal_untouched() {
    let (mut goal, now) = new_goal(&[W1]);
    let creator = addr(CREATOR);
    record_progress(&mut goal, &creator, NewProgressUpdate::new("most", 80), now).unwrap();
    let before = goal.clone();

    let err = record_progress(&mut goal, &creator, NewProgressUpdate::new("oops", 40), now)
      .unwrap_err();
    assert!(matches!(err, Error::ProgressRegression { current: 80, requested: 40 }));
    assert_eq!(goal, before);

    let err = record_progress(&mut goal, &creator, NewProgressUpdate::new("more", 101), now)
      .unwrap_err();
    assert!(matches!(err, Error::ProgressOutOfRange(101)));
  }

  #[test]
  fn progress_same_percentage_is_allowed() {
    let (mut goal, now) = new_goal(&[]);
    let creator = addr(CREATOR);
    record_progress(&mut goal, &creator, NewProgressUpdate::new("a", 30), now).unwrap();
    record_progress(&mut goal, &creator, NewProgressUpdate::new("b", 30), now).unwrap();
    assert_eq!(goal.progress_update_counter, 2);
  }

  #[test]
  fn progress_by_non_creator_is_unauthorized() {
    let (mut goal, now) = new_goal(&[W1]);
    let err = record_progress(&mut goal, &addr(W1), NewProgressUpdate::new("me", 10), now)
      .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Authorization));
  }

  // ── Confirmation ──────────────────────────────────────────────────────────

  #[test]
  fn confirm_requires_full_progress() {
    let (mut goal, _) = new_goal(&[W1]);
    let err = confirm(&mut goal, &addr(W1)).unwrap_err();
    assert!(matches!(err, Error::ProgressIncomplete { progress: 0, .. }));
    assert!(goal.confirmations.is_empty());
  }

  #[test]
  fn confirm_by_stranger_is_unauthorized() {
    let mut goal = at_full_progress(&[W1, W2]);
    let err = confirm(&mut goal, &addr(W3)).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Authorization));
    assert!(goal.confirmations.is_empty());
  }

  #[test]
  fn confirm_twice_fails() {
    let mut goal = at_full_progress(&[W1, W2]);
    confirm(&mut goal, &addr(W1)).unwrap();
    let err = confirm(&mut goal, &addr(W1)).unwrap_err();
    assert!(matches!(err, Error::AlreadyConfirmed(a) if a == addr(W1)));
    assert_eq!(goal.confirmations, vec![addr(W1)]);
  }

  #[test]
  fn all_confirmed_needs_witnesses() {
    let mut goal = at_full_progress(&[W1, W2]);
    assert!(!goal.all_confirmed());
    confirm(&mut goal, &addr(W2)).unwrap();
    assert!(!goal.all_confirmed());
    confirm(&mut goal, &addr(W1)).unwrap();
    assert!(goal.all_confirmed());

    let lonely = at_full_progress(&[]);
    assert!(!lonely.all_confirmed());
  }

  // ── Resolution ────────────────────────────────────────────────────────────

  #[test]
  fn complete_after_all_confirmations() {
    let mut goal = at_full_progress(&[W1, W2]);

    let err = complete(&mut goal, &addr(CREATOR)).unwrap_err();
    assert!(matches!(err, Error::ConfirmationsPending { pending: 2, .. }));

    confirm(&mut goal, &addr(W1)).unwrap();
    confirm(&mut goal, &addr(W2)).unwrap();

    let err = complete(&mut goal, &addr(W1)).unwrap_err();
    assert!(matches!(err, Error::NotCreator(_)));

    let event = complete(&mut goal, &addr(CREATOR)).unwrap();
    assert_eq!(goal.status, GoalStatus::Completed);
    assert!(matches!(event, EventPayload::GoalCompleted { completer, .. } if completer == addr(CREATOR)));
  }

  #[test]
  fn complete_requires_full_progress() {
    let (mut goal, _) = new_goal(&[]);
    let err = complete(&mut goal, &addr(CREATOR)).unwrap_err();
    assert!(matches!(err, Error::ProgressIncomplete { .. }));
    assert_eq!(goal.status, GoalStatus::Active);
  }

  #[test]
  fn witnessless_goal_completes_on_progress_alone() {
    let mut goal = at_full_progress(&[]);
    complete(&mut goal, &addr(CREATOR)).unwrap();
    assert_eq!(goal.status, GoalStatus::Completed);
  }

  #[test]
  fn terminal_states_are_final() {
    let mut goal = at_full_progress(&[]);
    let now = Utc::now();
    complete(&mut goal, &addr(CREATOR)).unwrap();

    assert!(matches!(fail(&mut goal, &addr(CREATOR), now), Err(Error::GoalNotActive(1))));
    assert!(matches!(complete(&mut goal, &addr(CREATOR)), Err(Error::GoalNotActive(1))));
    assert!(matches!(
      record_progress(&mut goal, &addr(CREATOR), NewProgressUpdate::new("x", 100), now),
      Err(Error::GoalNotActive(1))
    ));
    assert_eq!(goal.status, GoalStatus::Completed);
  }

  #[test]
  fn fail_policy_depends_on_deadline() {
    let (mut goal, now) = new_goal(&[W1]);

    let err = fail(&mut goal, &addr(W1), now).unwrap_err();
    assert!(matches!(err, Error::FailBeforeDeadline(1)));
    assert_eq!(err.kind(), Some(ErrorKind::Authorization));

    let after_deadline = goal.deadline + Duration::seconds(1);
    fail(&mut goal, &addr(W3), after_deadline).unwrap();
    assert_eq!(goal.status, GoalStatus::Failed);
  }

  #[test]
  fn creator_may_fail_early() {
    let (mut goal, now) = new_goal(&[W1]);
    let event = fail(&mut goal, &addr(CREATOR), now).unwrap();
    assert_eq!(goal.status, GoalStatus::Failed);
    assert_eq!(event.actor(), &addr(CREATOR));
  }

  // ── Comments and agents ───────────────────────────────────────────────────

  #[test]
  fn comments_open_to_anyone_in_any_status() {
    let mut goal = at_full_progress(&[]);
    complete(&mut goal, &addr(CREATOR)).unwrap();

    let (c, _) = record_comment(&mut goal, &addr(W3), "congrats".into(), Utc::now()).unwrap();
    assert_eq!(c.id, 1);
    assert_eq!(goal.comment_counter, 1);

    let err = record_comment(&mut goal, &addr(W3), " ".into(), Utc::now()).unwrap_err();
    assert!(matches!(err, Error::EmptyField("content")));
    assert_eq!(goal.comment_counter, 1);
  }

  #[test]
  fn relinking_agent_emits_update() {
    let (goal, now) = new_goal(&[]);
    let input = NewAgent {
      agent_id:       uuid::Uuid::new_v4(),
      name:           "coach".into(),
      character_json: "{}".into(),
    };

    let (agent, event) =
      link_agent(&goal, &addr(CREATOR), None, None, input.clone(), now).unwrap();
    assert!(matches!(event, EventPayload::AgentCreated { .. }));

    let later = now + Duration::minutes(5);
    let (again, event) =
      link_agent(&goal, &addr(CREATOR), Some(&agent), Some(goal.id), input.clone(), later)
        .unwrap();
    assert!(matches!(event, EventPayload::AgentUpdated { .. }));
    assert_eq!(again.created_at, agent.created_at);
    assert_eq!(again.updated_at, later);

    assert!(matches!(
      link_agent(&goal, &addr(W1), None, None, input.clone(), now),
      Err(Error::NotCreator(1))
    ));
    assert!(matches!(
      link_agent(&goal, &addr(CREATOR), None, Some(7), input, now),
      Err(Error::AgentAlreadyLinked { goal_id: 7, .. })
    ));
  }
}
