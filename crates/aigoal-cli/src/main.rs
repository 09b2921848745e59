//! `aigoal`: command-line client for the AIGoal ledger.
//!
//! # Usage
//!
//! ```text
//! aigoal --url http://localhost:8787 goals --status active
//! aigoal --account 0xc0… --password secret confirm 3
//! aigoal --config ~/.config/aigoal/config.toml activity
//! ```

mod client;
mod output;
mod proof;
mod retry;

use std::path::PathBuf;

use aigoal_core::{
  Address, GoalId, GoalStatus,
  activity::{ActivityFeed, UserStatistics},
  agent::NewAgent,
  goal::NewGoal,
  ledger::NewProgressUpdate,
  store::GoalFilter,
};
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, Blocks, Transition};
use proof::{DEFAULT_AGGREGATOR_URL, ProofStore};
use retry::RetryPolicy;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "aigoal", about = "Command-line client for the AIGoal ledger")]
struct Args {
  /// Path to a TOML config file (url, account, password, aggregator_url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the aigoal server (default: http://localhost:8787).
  #[arg(long, env = "AIGOAL_URL")]
  url: Option<String>,

  /// Account address mutations are submitted as.
  #[arg(long, env = "AIGOAL_ACCOUNT")]
  account: Option<Address>,

  /// Account password (plaintext).
  #[arg(long, env = "AIGOAL_PASSWORD")]
  password: Option<String>,

  /// Blob aggregator used to fetch proof files.
  #[arg(long, env = "AIGOAL_AGGREGATOR_URL")]
  aggregator_url: Option<String>,

  /// How many times a failed read is retried.
  #[arg(long, env = "AIGOAL_RETRIES", default_value_t = 3)]
  retries: u32,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List goal ids, optionally filtered.
  Goals {
    #[arg(long, conflicts_with_all = ["creator", "witness", "mine"])]
    status:  Option<GoalStatus>,
    #[arg(long, conflicts_with_all = ["witness", "mine"])]
    creator: Option<Address>,
    #[arg(long, conflicts_with = "mine")]
    witness: Option<Address>,
    /// Goals created by the configured account.
    #[arg(long)]
    mine:    bool,
  },
  /// Show a goal with its progress, comments and agent.
  Show { id: GoalId },
  /// Create a goal.
  Create {
    #[arg(long)]
    title:         String,
    #[arg(long)]
    description:   String,
    #[arg(long, default_value = "")]
    ai_suggestion: String,
    /// Deadline as RFC 3339.
    #[arg(long, conflicts_with = "days", required_unless_present = "days")]
    deadline:      Option<DateTime<Utc>>,
    /// Deadline as a number of days from now.
    #[arg(long)]
    days:          Option<i64>,
    /// Stake in the smallest currency unit.
    #[arg(long)]
    stake:         u128,
    /// Witness address; repeat for several.
    #[arg(long = "witness")]
    witnesses:     Vec<Address>,
  },
  /// Report progress on one of your goals.
  Progress {
    id:         GoalId,
    percentage: u8,
    content:    String,
    /// Blob id of an uploaded proof file.
    #[arg(long)]
    proof:      Option<String>,
  },
  /// Comment on a goal.
  Comment { id: GoalId, content: String },
  /// Confirm a goal you witness.
  Confirm { id: GoalId },
  /// Resolve one of your goals as completed.
  Complete { id: GoalId },
  /// Resolve a goal as failed.
  Fail { id: GoalId },
  /// Link a planning agent to one of your goals.
  Agent {
    id:             GoalId,
    #[arg(long)]
    name:           String,
    /// Defaults to a fresh id, or the current agent's id when re-linking.
    #[arg(long)]
    agent_id:       Option<Uuid>,
    #[arg(long, default_value = "")]
    character_json: String,
  },
  /// Show an agent by id.
  ShowAgent { agent_id: Uuid },
  /// An account's recent activity and reward total.
  Activity {
    /// Defaults to the configured account.
    account:    Option<Address>,
    #[arg(long)]
    from_block: Option<u64>,
    #[arg(long)]
    to_block:   Option<u64>,
  },
  /// Goal counts by status for an account.
  Stats { account: Option<Address> },
  /// Raw event log.
  Events {
    #[arg(long)]
    from_block: Option<u64>,
    #[arg(long)]
    to_block:   Option<u64>,
  },
  /// Download the proof file attached to a progress update.
  Proof {
    id:     GoalId,
    update: u64,
    /// Directory to write the file into.
    #[arg(long, default_value = ".")]
    out:    PathBuf,
  },
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:            String,
  account:        Option<Address>,
  #[serde(default)]
  password:       String,
  #[serde(default)]
  aggregator_url: String,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_string()) }

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:8787".to_string()),
    account:  args.account.or(file_cfg.account),
    password: args
      .password
      .or_else(|| non_empty(&file_cfg.password))
      .unwrap_or_default(),
  };
  let aggregator_url = args
    .aggregator_url
    .or_else(|| non_empty(&file_cfg.aggregator_url))
    .unwrap_or_else(|| DEFAULT_AGGREGATOR_URL.to_string());

  let retry = RetryPolicy { max_retries: args.retries, ..RetryPolicy::default() };
  let client = ApiClient::new(api_config)?.with_retry(retry);
  let proofs = ProofStore::new(aggregator_url)?.with_retry(retry);
  run(&client, &proofs, args.command).await
}

fn account_or_default(client: &ApiClient, account: Option<Address>) -> Result<Address> {
  account
    .or(client.account())
    .ok_or_else(|| anyhow!("no account given and none configured"))
}

/// The goal deadline from either `--deadline` or `--days` counted from `now`.
fn resolve_deadline(
  deadline: Option<DateTime<Utc>>,
  days: Option<i64>,
  now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
  match (deadline, days) {
    (Some(at), _) => Ok(at),
    (None, Some(days)) => Duration::try_days(days)
      .and_then(|delta| now.checked_add_signed(delta))
      .ok_or_else(|| anyhow!("--days {days} is out of range")),
    (None, None) => bail!("pass --deadline or --days"),
  }
}

async fn run(client: &ApiClient, proofs: &ProofStore, command: Command) -> Result<()> {
  match command {
    Command::Goals { status, creator, witness, mine } => {
      let filter = match (status, creator, witness, mine) {
        (Some(s), ..) => GoalFilter::Status(s),
        (_, Some(c), ..) => GoalFilter::CreatedBy(c),
        (_, _, Some(w), _) => GoalFilter::WitnessedBy(w),
        (.., true) => GoalFilter::CreatedBy(account_or_default(client, None)?),
        _ => GoalFilter::All,
      };
      for id in client.goal_ids(filter).await? {
        match client.goal(id).await? {
          Some(view) => output::goal_line(&view),
          None => tracing::warn!(goal_id = id, "listed goal vanished"),
        }
      }
    }

    Command::Show { id } => {
      let view = client
        .goal(id)
        .await?
        .ok_or_else(|| anyhow!("goal {id} not found"))?;
      output::goal_detail(&view);
      output::progress_updates(&client.progress_updates(id).await?);
      output::comments(&client.comments(id).await?);
      if let Some(agent) = client.goal_agent(id).await? {
        output::agent(&agent);
      }
    }

    Command::Create {
      title,
      description,
      ai_suggestion,
      deadline,
      days,
      stake,
      witnesses,
    } => {
      let deadline = resolve_deadline(deadline, days, Utc::now())?;
      let input = NewGoal::new(title, description, deadline, stake)
        .with_witnesses(witnesses)
        .with_ai_suggestion(ai_suggestion);
      let view = client.create_goal(&input).await?;
      println!("created goal {}", view.goal.id);
      output::goal_detail(&view);
    }

    Command::Progress { id, percentage, content, proof } => {
      let mut input = NewProgressUpdate::new(content, percentage);
      input.proof_file_blob_id = proof;
      let update = client.add_progress(id, &input).await?;
      println!("recorded update #{} at {}%", update.id, update.progress_percentage);
    }

    Command::Comment { id, content } => {
      let comment = client.add_comment(id, &content).await?;
      println!("posted comment #{}", comment.id);
    }

    Command::Confirm { id } => {
      let view = client.transition(id, Transition::Confirm).await?;
      let pending = view.goal.pending_witnesses().count();
      println!("confirmed goal {id}; {pending} witness(es) still pending");
    }

    Command::Complete { id } => {
      let view = client.transition(id, Transition::Complete).await?;
      println!("goal {id} is now {}", view.goal.status);
    }

    Command::Fail { id } => {
      let view = client.transition(id, Transition::Fail).await?;
      println!("goal {id} is now {}", view.goal.status);
    }

    Command::Agent { id, name, agent_id, character_json } => {
      let agent_id = match agent_id {
        Some(agent_id) => agent_id,
        None => client
          .goal_agent(id)
          .await?
          .map_or_else(Uuid::new_v4, |a| a.agent_id),
      };
      let agent = client
        .set_agent(id, &NewAgent { agent_id, name, character_json })
        .await?;
      output::agent(&agent);
    }

    Command::ShowAgent { agent_id } => {
      let agent = client
        .agent(agent_id)
        .await?
        .ok_or_else(|| anyhow!("agent {agent_id} not found"))?;
      output::agent(&agent);
    }

    Command::Activity { account, from_block, to_block } => {
      let account = account_or_default(client, account)?;
      let blocks = Blocks { from: from_block, to: to_block };
      let feed = client
        .account_events(account, blocks)
        .await
        .unwrap_or_else(|e| {
          tracing::warn!(error = %e, %account, "activity feed unavailable");
          ActivityFeed::default()
        });
      output::activity(&feed);
    }

    Command::Stats { account } => {
      let account = account_or_default(client, account)?;
      let stats = client.statistics(account).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, %account, "statistics unavailable");
        UserStatistics::default()
      });
      output::statistics(&stats);
    }

    Command::Events { from_block, to_block } => {
      let events = client
        .events(Blocks { from: from_block, to: to_block })
        .await
        .unwrap_or_else(|e| {
          tracing::warn!(error = %e, "event log unavailable");
          Vec::new()
        });
      for event in &events {
        output::event_line(event);
      }
    }

    Command::Proof { id, update, out } => {
      let update = client
        .progress_update(id, update)
        .await?
        .ok_or_else(|| anyhow!("progress update {update} not found on goal {id}"))?;
      let blob_id = update
        .proof_file_blob_id
        .ok_or_else(|| anyhow!("update #{} has no proof attached", update.id))?;

      let file = proofs.download(&blob_id).await?;
      let path = out.join(&file.filename);
      tokio::fs::write(&path, &file.bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
      println!("saved {} ({} bytes)", path.display(), file.bytes.len());
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deadline_from_days() {
    let now = Utc::now();
    assert_eq!(resolve_deadline(None, Some(7), now).unwrap(), now + Duration::days(7));

    let at = now + Duration::hours(3);
    assert_eq!(resolve_deadline(Some(at), None, now).unwrap(), at);
    assert!(resolve_deadline(None, None, now).is_err());
  }

  #[test]
  fn deadline_days_out_of_range() {
    let now = Utc::now();
    let err = resolve_deadline(None, Some(200_000_000), now).unwrap_err();
    assert!(err.to_string().contains("out of range"));
    assert!(resolve_deadline(None, Some(i64::MAX), now).is_err());
    assert!(resolve_deadline(None, Some(i64::MIN), now).is_err());
  }
}
