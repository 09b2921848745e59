//! Async HTTP client wrapping the AIGoal JSON API.

use std::time::Duration;

use aigoal_core::{
  Address, GoalId,
  activity::{ActivityFeed, UserStatistics},
  agent::{Agent, NewAgent},
  event::Event,
  goal::{GoalView, NewGoal},
  ledger::{Comment, NewProgressUpdate, ProgressUpdate},
  store::GoalFilter,
};
use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::retry::{RetryPolicy, send_with_retry};

/// Connection settings for the AIGoal API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// The account mutations are submitted as. Reads work without one.
  pub account:  Option<Address>,
  pub password: String,
}

/// Error body rendered by the server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  error: String,
  kind:  String,
}

/// Optional block bounds for event queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blocks {
  pub from: Option<u64>,
  pub to:   Option<u64>,
}

impl Blocks {
  fn query(&self) -> Vec<(&'static str, String)> {
    let mut q = Vec::new();
    if let Some(from) = self.from {
      q.push(("from_block", from.to_string()));
    }
    if let Some(to) = self.to {
      q.push(("to_block", to.to_string()));
    }
    q
  }
}

/// Async HTTP client for the AIGoal JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based. Reads are
/// retried on transient failures; mutations are sent exactly once.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
  retry:  RetryPolicy,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config, retry: RetryPolicy::default() })
  }

  /// Replace the backoff policy used for reads.
  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn account(&self) -> Option<Address> { self.config.account }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  // ── Transport ─────────────────────────────────────────────────────────────

  async fn fetch(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
    let url = self.url(path);
    send_with_retry(&self.retry, path, || self.client.get(&url).query(query))
      .await
      .with_context(|| format!("GET {path} failed"))
  }

  async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
    let resp = self.fetch(path, query).await?;
    decode(resp, &format!("GET {path}")).await
  }

  /// Like [`Self::get`], mapping 404 to `None`.
  async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
    let resp = self.fetch(path, &[]).await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    decode(resp, &format!("GET {path}")).await.map(Some)
  }

  async fn mutate<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let account = self
      .config
      .account
      .ok_or_else(|| anyhow!("an account is required for {method} {path}; pass --account"))?;

    let mut req = self
      .client
      .request(method.clone(), self.url(path))
      .basic_auth(account, Some(&self.config.password));
    if let Some(body) = body {
      req = req.json(body);
    }

    let resp = req
      .send()
      .await
      .with_context(|| format!("{method} {path} failed"))?;
    decode(resp, &format!("{method} {path}")).await
  }

  // ── Goals ─────────────────────────────────────────────────────────────────

  /// `GET /api/goals`
  pub async fn goal_ids(&self, filter: GoalFilter) -> Result<Vec<GoalId>> {
    let query = match filter {
      GoalFilter::All => vec![],
      GoalFilter::Status(status) => vec![("status", status.to_string())],
      GoalFilter::CreatedBy(creator) => vec![("creator", creator.to_string())],
      GoalFilter::WitnessedBy(witness) => vec![("witness", witness.to_string())],
    };
    self.get("/goals", &query).await
  }

  /// `GET /api/goals/:id`
  pub async fn goal(&self, id: GoalId) -> Result<Option<GoalView>> {
    self.get_optional(&format!("/goals/{id}")).await
  }

  /// `POST /api/goals`
  pub async fn create_goal(&self, input: &NewGoal) -> Result<GoalView> {
    self.mutate(Method::POST, "/goals", Some(input)).await
  }

  /// `POST /api/goals/:id/{confirm,complete,fail}`
  pub async fn transition(&self, id: GoalId, action: Transition) -> Result<GoalView> {
    let path = format!("/goals/{id}/{}", action.as_str());
    self.mutate::<(), _>(Method::POST, &path, None).await
  }

  // ── Ledgers ───────────────────────────────────────────────────────────────

  pub async fn progress_updates(&self, id: GoalId) -> Result<Vec<ProgressUpdate>> {
    self.get(&format!("/goals/{id}/progress"), &[]).await
  }

  pub async fn progress_update(&self, id: GoalId, n: u64) -> Result<Option<ProgressUpdate>> {
    self.get_optional(&format!("/goals/{id}/progress/{n}")).await
  }

  pub async fn add_progress(&self, id: GoalId, input: &NewProgressUpdate) -> Result<ProgressUpdate> {
    self
      .mutate(Method::POST, &format!("/goals/{id}/progress"), Some(input))
      .await
  }

  pub async fn comments(&self, id: GoalId) -> Result<Vec<Comment>> {
    self.get(&format!("/goals/{id}/comments"), &[]).await
  }

  pub async fn add_comment(&self, id: GoalId, content: &str) -> Result<Comment> {
    let body = serde_json::json!({ "content": content });
    self
      .mutate(Method::POST, &format!("/goals/{id}/comments"), Some(&body))
      .await
  }

  // ── Agents ────────────────────────────────────────────────────────────────

  pub async fn goal_agent(&self, id: GoalId) -> Result<Option<Agent>> {
    self.get_optional(&format!("/goals/{id}/agent")).await
  }

  pub async fn agent(&self, agent_id: Uuid) -> Result<Option<Agent>> {
    self.get_optional(&format!("/agents/{agent_id}")).await
  }

  pub async fn set_agent(&self, id: GoalId, input: &NewAgent) -> Result<Agent> {
    self
      .mutate(Method::PUT, &format!("/goals/{id}/agent"), Some(input))
      .await
  }

  // ── Activity ──────────────────────────────────────────────────────────────

  pub async fn events(&self, blocks: Blocks) -> Result<Vec<Event>> {
    self.get("/events", &blocks.query()).await
  }

  pub async fn account_events(&self, account: Address, blocks: Blocks) -> Result<ActivityFeed> {
    self
      .get(&format!("/accounts/{account}/events"), &blocks.query())
      .await
  }

  pub async fn statistics(&self, account: Address) -> Result<UserStatistics> {
    self
      .get(&format!("/accounts/{account}/statistics"), &[])
      .await
  }
}

/// A resolution or confirmation request.
#[derive(Debug, Clone, Copy)]
pub enum Transition {
  Confirm,
  Complete,
  Fail,
}

impl Transition {
  fn as_str(self) -> &'static str {
    match self {
      Self::Confirm => "confirm",
      Self::Complete => "complete",
      Self::Fail => "fail",
    }
  }
}

async fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
  let status = resp.status();
  if status.is_success() {
    return resp
      .json()
      .await
      .with_context(|| format!("deserialising {what} response"));
  }

  let text = resp.text().await.unwrap_or_default();
  match serde_json::from_str::<ErrorBody>(&text) {
    Ok(body) => Err(anyhow!("{what} → {status} ({}): {}", body.kind, body.error)),
    Err(_) => Err(anyhow!("{what} → {status}: {text}")),
  }
}
