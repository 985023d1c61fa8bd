//! Participants — who sits at the table.
//!
//! A participant is either a registered user, identified by their user id, or
//! an ad hoc guest, identified by nothing more than the name typed for them.
//! Two guests with the same name are the same identity everywhere they are
//! compared; the same person typed two ways is two identities. That weak
//! matching is intentional and callers must not try to repair it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Users ───────────────────────────────────────────────────────────────────

/// A registered account. Authentication lives outside this system; only the
/// id and display name matter here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:      Uuid,
  pub display_name: String,
  pub created_at:   DateTime<Utc>,
}

// ─── Participant ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Participant {
  Registered {
    user_id:      Uuid,
    /// Name at the time the record was read; not part of the identity.
    display_name: String,
  },
  Guest {
    name: String,
  },
}

impl Participant {
  pub fn registered(user_id: Uuid, display_name: impl Into<String>) -> Self {
    Self::Registered { user_id, display_name: display_name.into() }
  }

  pub fn guest(name: impl Into<String>) -> Self {
    Self::Guest { name: name.into() }
  }

  /// The key under which this participant is matched across games and
  /// sessions.
  pub fn identity_key(&self) -> IdentityKey {
    match self {
      Self::Registered { user_id, .. } => IdentityKey::User(*user_id),
      Self::Guest { name } => IdentityKey::Guest(name.clone()),
    }
  }

  pub fn display_name(&self) -> &str {
    match self {
      Self::Registered { display_name, .. } => display_name,
      Self::Guest { name } => name,
    }
  }

  pub fn is_guest(&self) -> bool { matches!(self, Self::Guest { .. }) }

  pub fn user_id(&self) -> Option<Uuid> {
    match self {
      Self::Registered { user_id, .. } => Some(*user_id),
      Self::Guest { .. } => None,
    }
  }
}

// ─── Identity key ────────────────────────────────────────────────────────────

/// Identity used by aggregation. Guests compare by exact name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum IdentityKey {
  User(Uuid),
  Guest(String),
}

impl fmt::Display for IdentityKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::User(id) => write!(f, "user:{id}"),
      Self::Guest(name) => write!(f, "guest:{name}"),
    }
  }
}

// ─── Session seat ────────────────────────────────────────────────────────────

/// One participant's seat in a session. Game results refer to the
/// session-local `player_id`, never directly to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPlayer {
  pub player_id:   Uuid,
  pub session_id:  Uuid,
  /// Zero-based position in the session roster.
  pub seat_index:  u32,
  pub participant: Participant,
}

impl SessionPlayer {
  /// The name shown for this seat. Blank names fall back to `プレイヤーN`.
  pub fn display_name(&self) -> String {
    let name = self.participant.display_name().trim();
    if name.is_empty() {
      format!("プレイヤー{}", self.seat_index + 1)
    } else {
      name.to_owned()
    }
  }

  pub fn identity_key(&self) -> IdentityKey { self.participant.identity_key() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn guests_with_equal_names_share_identity() {
    assert_eq!(
      Participant::guest("Taro").identity_key(),
      Participant::guest("Taro").identity_key()
    );
    assert_ne!(
      Participant::guest("Taro").identity_key(),
      Participant::guest("taro").identity_key()
    );
  }

  #[test]
  fn registered_identity_ignores_display_name() {
    let id = Uuid::new_v4();
    assert_eq!(
      Participant::registered(id, "Hanako").identity_key(),
      Participant::registered(id, "Hanako-san").identity_key()
    );
  }

  #[test]
  fn registered_user_never_collides_with_guest_of_same_name() {
    let id = Uuid::new_v4();
    assert_ne!(
      Participant::registered(id, "Taro").identity_key(),
      Participant::guest("Taro").identity_key()
    );
  }

  #[test]
  fn blank_name_falls_back_to_seat_label() {
    let seat = SessionPlayer {
      player_id:   Uuid::new_v4(),
      session_id:  Uuid::new_v4(),
      seat_index:  2,
      participant: Participant::guest("  "),
    };
    assert_eq!(seat.display_name(), "プレイヤー3");
  }
}
