//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use aigoal_core::Address;
use aigoal_store_sqlite::SqliteStore;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::{Duration, Utc};
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AccountConfig, Accounts, api_router};

fn addr(b: u8) -> Address { Address::from_bytes([b; 20]) }

const CREATOR: u8 = 0xC0;
const W1: u8 = 0x01;
const W2: u8 = 0x02;
const OUTSIDER: u8 = 0x0F;

fn password(who: u8) -> String { format!("pw-{who:02x}") }

/// Cheap argon2 parameters; verification reads them back from the PHC string.
fn hash(password: &str) -> String {
  let params = Params::new(1024, 1, 1, None).unwrap();
  let salt = SaltString::generate(&mut OsRng);
  Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    .hash_password(password.as_bytes(), &salt)
    .unwrap()
    .to_string()
}

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let accounts = Accounts::new([CREATOR, W1, W2, OUTSIDER].map(|who| AccountConfig {
    address:       addr(who),
    password_hash: hash(&password(who)),
  }));
  api_router(Arc::new(store), accounts)
}

fn basic(who: u8) -> String {
  format!("Basic {}", B64.encode(format!("{}:{}", addr(who), password(who))))
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  auth: Option<u8>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(who) = auth {
    builder = builder.header(header::AUTHORIZATION, basic(who));
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

fn new_goal_body() -> Value {
  json!({
    "title": "Run 5k",
    "description": "Finish a 5k under 30 minutes",
    "ai_suggestion": "Three short runs a week",
    "deadline": Utc::now() + Duration::days(7),
    "witnesses": [addr(W1), addr(W2)],
    "amount": "1000000000000000000",
  })
}

async fn create_goal(app: &Router) -> u64 {
  let (status, goal) = send(app, "POST", "/goals", Some(CREATOR), Some(new_goal_body())).await;
  assert_eq!(status, StatusCode::CREATED, "{goal}");
  goal["id"].as_u64().unwrap()
}

async fn progress(app: &Router, id: u64, percentage: u8) -> (StatusCode, Value) {
  send(
    app,
    "POST",
    &format!("/goals/{id}/progress"),
    Some(CREATOR),
    Some(json!({ "content": format!("at {percentage}%"), "percentage": percentage })),
  )
  .await
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_lifecycle() {
  let app = app().await;
  let id = create_goal(&app).await;

  let (status, goal) = send(&app, "GET", &format!("/goals/{id}"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(goal["status"], "active");
  assert_eq!(goal["amount"], "1000000000000000000");
  assert_eq!(goal["all_confirmed"], false);
  assert_eq!(goal["progress_complete"], false);

  assert_eq!(progress(&app, id, 50).await.0, StatusCode::CREATED);
  let (status, update) = progress(&app, id, 100).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(update["id"], 2);

  for witness in [W1, W2] {
    let (status, _) =
      send(&app, "POST", &format!("/goals/{id}/confirm"), Some(witness), None).await;
    assert_eq!(status, StatusCode::OK);
  }

  let (status, goal) =
    send(&app, "POST", &format!("/goals/{id}/complete"), Some(CREATOR), None).await;
  assert_eq!(status, StatusCode::OK, "{goal}");
  assert_eq!(goal["status"], "completed");
  assert_eq!(goal["all_confirmed"], true);
  assert_eq!(goal["progress_percentage"], 100);
  assert_eq!(goal["progress_update_counter"], 2);
}

#[tokio::test]
async fn complete_before_full_progress_is_unprocessable() {
  let app = app().await;
  let id = create_goal(&app).await;
  progress(&app, id, 60).await;

  let (status, body) =
    send(&app, "POST", &format!("/goals/{id}/complete"), Some(CREATOR), None).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["kind"], "validation");
  assert!(body["error"].as_str().unwrap().contains("100%"));
}

#[tokio::test]
async fn outsider_confirmation_is_forbidden() {
  let app = app().await;
  let id = create_goal(&app).await;
  progress(&app, id, 100).await;

  let (status, body) =
    send(&app, "POST", &format!("/goals/{id}/confirm"), Some(OUTSIDER), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["kind"], "authorization");

  let (_, goal) = send(&app, "GET", &format!("/goals/{id}"), None, None).await;
  assert_eq!(goal["confirmations"], json!([]));
}

#[tokio::test]
async fn only_creator_records_progress() {
  let app = app().await;
  let id = create_goal(&app).await;
  let (status, _) = send(
    &app,
    "POST",
    &format!("/goals/{id}/progress"),
    Some(W1),
    Some(json!({ "content": "sneaky", "percentage": 100 })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, updates) = send(&app, "GET", &format!("/goals/{id}/progress"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updates, json!([]));
}

// ─── Authentication ──────────────────────────────────────────────────────────

#[tokio::test]
async fn mutations_require_credentials() {
  let app = app().await;
  let req = Request::builder()
    .method("POST")
    .uri("/goals")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(new_goal_body().to_string()))
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

  let wrong = format!("Basic {}", B64.encode(format!("{}:nope", addr(CREATOR))));
  let req = Request::builder()
    .method("POST")
    .uri("/goals/1/fail")
    .header(header::AUTHORIZATION, wrong)
    .body(Body::empty())
    .unwrap();
  let resp = app.oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ─── Malformed requests & missing records ────────────────────────────────────

#[tokio::test]
async fn missing_records_are_not_found() {
  let app = app().await;
  let (status, body) = send(&app, "GET", "/goals/99", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["kind"], "not_found");

  let (status, _) = send(&app, "POST", "/goals/99/fail", Some(CREATOR), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let id = create_goal(&app).await;
  let (status, body) = send(&app, "GET", &format!("/goals/{id}/comments/1"), None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], format!("comment 1 not found on goal {id}"));

  let (status, body) = send(&app, "GET", &format!("/goals/{id}/progress/2"), None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], format!("progress update 2 not found on goal {id}"));

  let (status, body) = send(&app, "GET", &format!("/goals/{id}/agent"), None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], format!("goal {id} has no agent"));

  let agent_id = Uuid::new_v4();
  let (status, body) = send(&app, "GET", &format!("/agents/{agent_id}"), None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["kind"], "not_found");
  assert_eq!(body["error"], format!("agent not found: {agent_id}"));
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
  let app = app().await;

  let (status, body) = send(&app, "GET", "/goals/not-a-number", None, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "bad_request");

  let (status, _) = send(
    &app,
    "POST",
    "/goals",
    Some(CREATOR),
    Some(json!({ "title": "missing everything else" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(&app, "GET", "/goals?status=paused", None, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let uri = format!("/goals?status=active&creator={}", addr(CREATOR));
  let (status, _) = send(&app, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(&app, "GET", "/events?from_block=5&to_block=2", None, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_goal_ids_by_filter() {
  let app = app().await;
  let first = create_goal(&app).await;
  let second = create_goal(&app).await;
  send(&app, "POST", &format!("/goals/{second}/fail"), Some(CREATOR), None).await;

  let (_, all) = send(&app, "GET", "/goals", None, None).await;
  assert_eq!(all, json!([first, second]));

  let (_, active) = send(&app, "GET", "/goals?status=active", None, None).await;
  assert_eq!(active, json!([first]));

  let (_, failed) = send(&app, "GET", "/goals?status=failed", None, None).await;
  assert_eq!(failed, json!([second]));

  let uri = format!("/goals?witness={}", addr(W2));
  let (_, witnessing) = send(&app, "GET", &uri, None, None).await;
  assert_eq!(witnessing, json!([first, second]));

  let uri = format!("/goals?creator={}", addr(OUTSIDER));
  let (_, none) = send(&app, "GET", &uri, None, None).await;
  assert_eq!(none, json!([]));
}

// ─── Comments & agents ───────────────────────────────────────────────────────

#[tokio::test]
async fn comments_from_any_account() {
  let app = app().await;
  let id = create_goal(&app).await;

  let (status, comment) = send(
    &app,
    "POST",
    &format!("/goals/{id}/comments"),
    Some(OUTSIDER),
    Some(json!({ "content": "rooting for you" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(comment["id"], 1);
  assert_eq!(comment["creator"], addr(OUTSIDER).to_string());

  let (_, comments) = send(&app, "GET", &format!("/goals/{id}/comments"), None, None).await;
  assert_eq!(comments.as_array().unwrap().len(), 1);

  let (status, _) = send(
    &app,
    "POST",
    &format!("/goals/{id}/comments"),
    Some(W1),
    Some(json!({ "content": "   " })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn agent_link_roundtrip() {
  let app = app().await;
  let id = create_goal(&app).await;
  let agent_id = Uuid::new_v4();

  let (status, _) = send(&app, "GET", &format!("/goals/{id}/agent"), None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let body = json!({ "agent_id": agent_id, "name": "Coach", "character_json": "{}" });
  let (status, agent) =
    send(&app, "PUT", &format!("/goals/{id}/agent"), Some(CREATOR), Some(body.clone())).await;
  assert_eq!(status, StatusCode::OK, "{agent}");
  assert_eq!(agent["goal_id"], id);

  let (status, _) =
    send(&app, "PUT", &format!("/goals/{id}/agent"), Some(W1), Some(body)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, fetched) = send(&app, "GET", &format!("/agents/{agent_id}"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["name"], "Coach");
}

// ─── Activity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn account_feed_and_statistics() {
  let app = app().await;
  let id = create_goal(&app).await;
  create_goal(&app).await;
  send(
    &app,
    "POST",
    &format!("/goals/{id}/comments"),
    Some(W1),
    Some(json!({ "content": "go" })),
  )
  .await;
  send(&app, "POST", &format!("/goals/{id}/fail"), Some(CREATOR), None).await;

  let uri = format!("/accounts/{}/events", addr(CREATOR));
  let (status, feed) = send(&app, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::OK);
  let blocks: Vec<u64> = feed["events"]
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["block_number"].as_u64().unwrap())
    .collect();
  assert_eq!(blocks, vec![4, 2, 1]);
  assert_eq!(feed["reward_total"], 300);

  let uri = format!("/accounts/{}/events?from_block=3", addr(W1));
  let (_, feed) = send(&app, "GET", &uri, None, None).await;
  assert_eq!(feed["events"].as_array().unwrap().len(), 1);
  assert_eq!(feed["reward_total"], 10);

  let uri = format!("/accounts/{}/statistics", addr(CREATOR));
  let (_, stats) = send(&app, "GET", &uri, None, None).await;
  assert_eq!(stats, json!({ "active": 1, "completed": 0, "failed": 1, "total": 2 }));

  let (_, events) = send(&app, "GET", "/events?from_block=2&to_block=3", None, None).await;
  let names: Vec<&str> = events
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["payload"]["event_name"].as_str().unwrap())
    .collect();
  assert_eq!(names, vec!["GoalCreated", "CommentCreated"]);
}

#[tokio::test]
async fn from_block_past_head_gives_empty_feed() {
  let app = app().await;
  create_goal(&app).await;

  let uri = format!("/accounts/{}/events?from_block=5", addr(CREATOR));
  let (status, feed) = send(&app, "GET", &uri, None, None).await;
  assert_eq!(status, StatusCode::OK, "{feed}");
  assert_eq!(feed["events"], json!([]));
  assert_eq!(feed["reward_total"], 0);

  let (status, events) = send(&app, "GET", "/events?from_block=5", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(events, json!([]));
}
