//! Error types for `hanchan-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// A rule field or score is missing, non-numeric or out of range.
  #[error("invalid `{field}`: {reason}")]
  Validation { field: &'static str, reason: String },

  #[error("a game seats at most {max} players, got {got}")]
  TooManySeats { max: usize, got: usize },

  #[error("player {0} cannot take two seats in one game")]
  DuplicateSeat(Uuid),

  #[error("session not found: {0}")]
  SessionNotFound(Uuid),

  #[error("game not found: {0}")]
  GameNotFound(Uuid),

  #[error("player not found: {0}")]
  PlayerNotFound(Uuid),

  #[error("group not found: {0}")]
  GroupNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("yakuman not found: {0}")]
  YakumanNotFound(Uuid),

  #[error("user {user} is already a member of group {group}")]
  AlreadyMember { group: Uuid, user: Uuid },

  #[error("player {0} is a registered user and cannot be renamed")]
  NotAGuest(Uuid),

  #[error("player {player} has no seat in game {game}")]
  PlayerNotSeated { game: Uuid, player: Uuid },

  #[error("unknown yakuman: {0:?}")]
  UnknownYakuman(String),
}

impl Error {
  /// True for errors that mean "no such record" rather than a fault.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::SessionNotFound(_)
        | Self::GameNotFound(_)
        | Self::PlayerNotFound(_)
        | Self::GroupNotFound(_)
        | Self::UserNotFound(_)
        | Self::YakumanNotFound(_)
    )
  }

  pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
    Self::Validation { field, reason: reason.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
