//! Groups — a standing circle of players sharing one rule set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::participant::Participant;

/// A group. Its [`RuleConfig`](crate::rules::RuleConfig) is stored alongside
/// and fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub group_id:    Uuid,
  pub name:        String,
  /// Supplied by the caller; generating codes is not this system's concern.
  pub invite_code: String,
  pub created_by:  Uuid,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
  /// May edit the group's rules.
  Admin,
  #[default]
  Member,
}

/// A member of a group's roster. Guests may be listed too; they are matched
/// against game results by name like everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
  pub group_id:    Uuid,
  pub participant: Participant,
  pub role:        MemberRole,
  pub joined_at:   DateTime<Utc>,
}

/// Input to [`crate::store::ScoreStore::create_group`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
  pub name:        String,
  pub invite_code: String,
  /// Becomes the group's first admin.
  pub created_by:  Uuid,
}
