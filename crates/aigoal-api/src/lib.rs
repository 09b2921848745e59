//! JSON REST API for AIGoal.
//!
//! Exposes an axum [`Router`] backed by any [`aigoal_core::store::GoalStore`].
//! Reads are open; mutations require HTTP Basic credentials for one of the
//! configured accounts (see [`auth`]). TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", aigoal_api::api_router(store.clone(), accounts))
//! ```

pub mod activity;
pub mod agents;
pub mod auth;
pub mod error;
pub mod extract;
pub mod goals;
pub mod ledger;

use std::sync::Arc;

use aigoal_core::store::GoalStore;
use axum::{
  Router,
  routing::{get, post},
};

pub use auth::{AccountConfig, Accounts, Actor};
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub accounts: Arc<Accounts>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      accounts: Arc::clone(&self.accounts),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, accounts: Accounts) -> Router<()>
where
  S: GoalStore + 'static,
{
  let state = AppState { store, accounts: Arc::new(accounts) };

  Router::new()
    // Goal registry
    .route("/goals", get(goals::list::<S>).post(goals::create::<S>))
    .route("/goals/{id}", get(goals::get_one::<S>))
    .route("/goals/{id}/confirm", post(goals::confirm::<S>))
    .route("/goals/{id}/complete", post(goals::complete::<S>))
    .route("/goals/{id}/fail", post(goals::fail::<S>))
    // Ledgers
    .route(
      "/goals/{id}/comments",
      get(ledger::list_comments::<S>).post(ledger::add_comment::<S>),
    )
    .route("/goals/{id}/comments/{n}", get(ledger::get_comment::<S>))
    .route(
      "/goals/{id}/progress",
      get(ledger::list_progress::<S>).post(ledger::add_progress::<S>),
    )
    .route("/goals/{id}/progress/{n}", get(ledger::get_progress::<S>))
    // Agents
    .route("/goals/{id}/agent", get(agents::goal_agent::<S>).put(agents::set_agent::<S>))
    .route("/agents/{agent_id}", get(agents::get_one::<S>))
    // Activity
    .route("/events", get(activity::events::<S>))
    .route("/accounts/{address}/events", get(activity::account_events::<S>))
    .route("/accounts/{address}/statistics", get(activity::statistics::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
