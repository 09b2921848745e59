//! Plain-text rendering of API responses.

use aigoal_core::{
  activity::{ActivityFeed, UserStatistics, reward_points},
  agent::Agent,
  event::Event,
  goal::GoalView,
  ledger::{Comment, ProgressUpdate},
};

pub fn goal_line(view: &GoalView) {
  let goal = &view.goal;
  println!(
    "#{:<4} {:<9} {:>3}%  {}/{} confirmed  {}",
    goal.id,
    goal.status,
    goal.progress_percentage,
    goal.confirmations.len(),
    goal.witnesses.len(),
    goal.title,
  );
}

pub fn goal_detail(view: &GoalView) {
  let goal = &view.goal;
  println!("Goal #{}: {}", goal.id, goal.title);
  println!("  status:      {}", goal.status);
  println!("  creator:     {}", goal.creator);
  println!("  stake:       {}", goal.amount);
  println!("  created:     {}", goal.created_at.to_rfc3339());
  println!("  deadline:    {}", goal.deadline.to_rfc3339());
  println!("  progress:    {}%", goal.progress_percentage);
  println!("  description: {}", goal.description);
  if !goal.ai_suggestion.is_empty() {
    println!("  suggestion:  {}", goal.ai_suggestion);
  }
  for witness in &goal.witnesses {
    let mark = if goal.has_confirmed(witness) { "x" } else { " " };
    println!("  [{mark}] witness {witness}");
  }
  if view.all_confirmed {
    println!("  all witnesses have confirmed");
  }
}

pub fn progress_updates(updates: &[ProgressUpdate]) {
  if updates.is_empty() {
    return;
  }
  println!("Progress:");
  for u in updates {
    let proof = u
      .proof_file_blob_id
      .as_deref()
      .map(|b| format!(" [proof {b}]"))
      .unwrap_or_default();
    println!("  #{} {:>3}%  {}{proof}", u.id, u.progress_percentage, u.content);
  }
}

pub fn comments(comments: &[Comment]) {
  if comments.is_empty() {
    return;
  }
  println!("Comments:");
  for c in comments {
    println!("  #{} {}: {}", c.id, c.creator, c.content);
  }
}

pub fn agent(agent: &Agent) {
  println!("Agent {} ({}) for goal #{}", agent.name, agent.agent_id, agent.goal_id);
  if !agent.character_json.is_empty() {
    println!("  character: {}", agent.character_json);
  }
}

pub fn event_line(event: &Event) {
  println!(
    "block {:>6}.{}  {:<16} goal #{:<4} {}  {}",
    event.block_number,
    event.log_index,
    event.payload.discriminant(),
    event.payload.goal_id(),
    event.payload.actor(),
    event.transaction_hash,
  );
}

pub fn activity(feed: &ActivityFeed) {
  for event in &feed.events {
    println!(
      "block {:>6}  {:<16} goal #{:<4} +{}",
      event.block_number,
      event.payload.discriminant(),
      event.payload.goal_id(),
      reward_points(event.kind()),
    );
  }
  println!("reward total: {}", feed.reward_total);
}

pub fn statistics(stats: &UserStatistics) {
  println!(
    "total {}  active {}  completed {}  failed {}",
    stats.total, stats.active, stats.completed, stats.failed
  );
}
