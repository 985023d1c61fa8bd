//! Core types, scoring rules and aggregation for the hanchan score tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Everything in [`score`] and [`aggregate`] is a pure function of its inputs;
//! the [`store`] module only declares the persistence seam.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod error;
pub mod game;
pub mod group;
pub mod participant;
pub mod rules;
pub mod score;
pub mod session;
pub mod store;

pub use error::{Error, Result};
