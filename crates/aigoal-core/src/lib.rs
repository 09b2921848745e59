//! Core types and trait definitions for the AIGoal ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the goal state machine: the rule checks in [`lifecycle`] decide whether a
//! request may proceed, and storage backends apply the result.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod activity;
pub mod address;
pub mod amount;
pub mod agent;
pub mod error;
pub mod event;
pub mod goal;
pub mod ledger;
pub mod lifecycle;
pub mod store;

pub use address::Address;
pub use error::{Error, ErrorKind, Result};
pub use goal::{Goal, GoalId, GoalStatus};
