//! The `ScoreStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `hanchan-store-sqlite`).
//! Higher layers (`hanchan-api`) depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  game::{Game, YakumanEvent, YakumanKind},
  group::{Group, GroupMember, MemberRole, NewGroup},
  participant::{Participant, SessionPlayer, User},
  rules::{RuleConfig, RulesPatch},
  session::{GameSeats, NewSession, Session},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`ScoreStore::list_sessions`]. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
  pub group_id:   Option<Uuid>,
  pub created_by: Option<Uuid>,
  /// Only sessions where this user holds a registered seat.
  pub player:     Option<Uuid>,
  /// Newest first; applied after the filters above.
  pub limit:      Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a score store backend.
///
/// Writes that touch raw scores leave the affected game fully rescored under
/// the session's rules before they return.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ScoreStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  fn add_user(
    &self,
    display_name: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  /// Create a group with default rules, seating its creator as admin.
  fn create_group(
    &self,
    input: NewGroup,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  fn add_member(
    &self,
    group_id: Uuid,
    participant: Participant,
    role: MemberRole,
  ) -> impl Future<Output = Result<GroupMember, Self::Error>> + Send + '_;

  /// Current members in join order.
  fn list_members(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Vec<GroupMember>, Self::Error>> + Send + '_;

  fn get_rules(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Option<RuleConfig>, Self::Error>> + Send + '_;

  /// Apply an admin edit and return the resulting rules.
  ///
  /// Games already scored keep their stored deltas until one of their raw
  /// scores is next edited.
  fn update_rules(
    &self,
    group_id: Uuid,
    patch: RulesPatch,
  ) -> impl Future<Output = Result<RuleConfig, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn create_session(
    &self,
    input: NewSession,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Materialise a session with roster, games, results and yakuman.
  fn get_session(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  fn list_sessions<'a>(
    &'a self,
    query: &'a SessionQuery,
  ) -> impl Future<Output = Result<Vec<Session>, Self::Error>> + Send + 'a;

  /// Delete a session and everything in it.
  fn delete_session(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Games ─────────────────────────────────────────────────────────────

  /// Append a game with empty seats. New guest seats are added to the
  /// roster for [`GameSeats::Names`].
  fn add_game(
    &self,
    session_id: Uuid,
    seats: GameSeats,
  ) -> impl Future<Output = Result<Game, Self::Error>> + Send + '_;

  fn delete_game(
    &self,
    game_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Set or clear one seat's raw score and rescore the game.
  fn record_raw_score(
    &self,
    game_id: Uuid,
    player_id: Uuid,
    raw_score: Option<i64>,
  ) -> impl Future<Output = Result<Game, Self::Error>> + Send + '_;

  // ── Yakuman ───────────────────────────────────────────────────────────

  fn add_yakuman(
    &self,
    game_id: Uuid,
    player_id: Uuid,
    kind: YakumanKind,
  ) -> impl Future<Output = Result<YakumanEvent, Self::Error>> + Send + '_;

  fn remove_yakuman(
    &self,
    yakuman_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Players ───────────────────────────────────────────────────────────

  /// Rename a guest seat. Registered seats are rejected.
  fn rename_guest(
    &self,
    player_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<SessionPlayer, Self::Error>> + Send + '_;
}
