//! JSON REST API for the hanchan score tracker.
//!
//! Exposes an axum [`Router`] backed by any [`hanchan_core::store::ScoreStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", hanchan_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod games;
pub mod groups;
pub mod players;
pub mod preview;
pub mod sessions;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, patch, post, put},
};
use hanchan_core::store::ScoreStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ScoreStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Users
    .route("/users", post(users::create::<S>))
    .route("/users/{id}", get(users::get_one::<S>))
    .route("/users/{id}/history", get(users::history::<S>))
    // Groups
    .route("/groups", post(groups::create::<S>))
    .route("/groups/{id}", get(groups::get_one::<S>))
    .route(
      "/groups/{id}/members",
      get(groups::list_members::<S>).post(groups::add_member::<S>),
    )
    .route(
      "/groups/{id}/rules",
      get(groups::get_rules::<S>).patch(groups::update_rules::<S>),
    )
    .route("/groups/{id}/leaderboard", get(groups::leaderboard::<S>))
    // Sessions
    .route("/sessions", get(sessions::list::<S>).post(sessions::create::<S>))
    .route(
      "/sessions/{id}",
      get(sessions::get_one::<S>).delete(sessions::delete_one::<S>),
    )
    .route("/sessions/{id}/summary", get(sessions::summary::<S>))
    .route("/sessions/{id}/games", post(games::create::<S>))
    // Games
    .route("/games/{id}", delete(games::delete_one::<S>))
    .route("/games/{id}/results/{player_id}", put(games::record_score::<S>))
    .route("/games/{id}/yakuman", post(games::add_yakuman::<S>))
    .route("/yakuman/{id}", delete(games::remove_yakuman::<S>))
    // Players
    .route("/players/{id}", patch(players::rename::<S>))
    // Preview
    .route("/preview", post(preview::handler))
    .with_state(store)
}
