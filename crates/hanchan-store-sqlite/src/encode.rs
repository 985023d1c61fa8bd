//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates `YYYY-MM-DD`. UUIDs are
//! hyphenated lowercase strings. Enums are stored by their wire tag.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use hanchan_core::{
  game::{Game, GameResult, YakumanEvent, YakumanKind},
  group::{Group, GroupMember, MemberRole},
  participant::{Participant, SessionPlayer, User},
  rules::{GameType, RuleConfig},
  session::Session,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_role(r: MemberRole) -> &'static str {
  match r {
    MemberRole::Admin => "admin",
    MemberRole::Member => "member",
  }
}

pub fn decode_role(s: &str) -> Result<MemberRole> {
  match s {
    "admin" => Ok(MemberRole::Admin),
    "member" => Ok(MemberRole::Member),
    other => Err(Error::Decode { column: "role", value: other.to_owned() }),
  }
}

pub fn decode_game_type(s: &str) -> Result<GameType> {
  GameType::from_str(s).map_err(|_| Error::Decode { column: "game_type", value: s.to_owned() })
}

pub fn decode_yakuman_kind(s: &str) -> Result<YakumanKind> {
  YakumanKind::from_str(s).map_err(|_| Error::Decode { column: "kind", value: s.to_owned() })
}

pub fn encode_rules_json(rules: &RuleConfig) -> Result<String> {
  Ok(serde_json::to_string(rules)?)
}

pub fn decode_rules_json(s: &str) -> Result<RuleConfig> { Ok(serde_json::from_str(s)?) }

/// Build a participant from the nullable `user_id` / `guest_name` column pair.
fn decode_participant(
  user_id: Option<String>,
  guest_name: Option<String>,
  display_name: Option<String>,
) -> Result<Participant> {
  match (user_id, guest_name) {
    (Some(id), _) => Ok(Participant::registered(decode_uuid(&id)?, display_name.unwrap_or_default())),
    (None, Some(name)) => Ok(Participant::guest(name)),
    (None, None) => Err(Error::Decode { column: "user_id", value: "NULL".to_owned() }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:      String,
  pub display_name: String,
  pub created_at:   String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      decode_uuid(&self.user_id)?,
      display_name: self.display_name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawGroup {
  pub group_id:    String,
  pub name:        String,
  pub invite_code: String,
  pub created_by:  String,
  pub created_at:  String,
}

impl RawGroup {
  pub fn into_group(self) -> Result<Group> {
    Ok(Group {
      group_id:    decode_uuid(&self.group_id)?,
      name:        self.name,
      invite_code: self.invite_code,
      created_by:  decode_uuid(&self.created_by)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// A `group_members` row joined with `users.display_name`.
pub struct RawMember {
  pub group_id:     String,
  pub user_id:      Option<String>,
  pub guest_name:   Option<String>,
  pub display_name: Option<String>,
  pub role:         String,
  pub joined_at:    String,
}

impl RawMember {
  pub fn into_member(self) -> Result<GroupMember> {
    Ok(GroupMember {
      group_id:    decode_uuid(&self.group_id)?,
      participant: decode_participant(self.user_id, self.guest_name, self.display_name)?,
      role:        decode_role(&self.role)?,
      joined_at:   decode_dt(&self.joined_at)?,
    })
  }
}

pub struct RawRules {
  pub game_type:    String,
  pub start_score:  i64,
  pub return_score: i64,
  pub uma:          [i64; 4],
  pub has_oka:      bool,
}

impl RawRules {
  pub fn into_rules(self) -> Result<RuleConfig> {
    Ok(RuleConfig {
      game_type:    decode_game_type(&self.game_type)?,
      start_score:  self.start_score,
      return_score: self.return_score,
      uma:          self.uma,
      has_oka:      self.has_oka,
    })
  }
}

pub struct RawSession {
  pub session_id: String,
  pub group_id:   Option<String>,
  pub date:       String,
  pub created_by: String,
  pub created_at: String,
  pub rules_json: Option<String>,
}

/// A `session_players` row joined with `users.display_name`.
pub struct RawPlayer {
  pub player_id:    String,
  pub session_id:   String,
  pub seat_index:   i64,
  pub user_id:      Option<String>,
  pub guest_name:   Option<String>,
  pub display_name: Option<String>,
}

impl RawPlayer {
  pub fn into_player(self) -> Result<SessionPlayer> {
    Ok(SessionPlayer {
      player_id:   decode_uuid(&self.player_id)?,
      session_id:  decode_uuid(&self.session_id)?,
      seat_index:  u32::try_from(self.seat_index).map_err(|_| Error::Decode {
        column: "seat_index",
        value:  self.seat_index.to_string(),
      })?,
      participant: decode_participant(self.user_id, self.guest_name, self.display_name)?,
    })
  }
}

pub struct RawGame {
  pub game_id:     String,
  pub game_number: i64,
}

pub struct RawResult {
  pub result_id: String,
  pub game_id:   String,
  pub player_id: String,
  pub raw_score: Option<i64>,
  pub rank:      Option<i64>,
  pub score:     i64,
}

impl RawResult {
  fn into_result(self) -> Result<(Uuid, GameResult)> {
    let rank = self
      .rank
      .map(|r| u8::try_from(r).map_err(|_| Error::Decode { column: "rank", value: r.to_string() }))
      .transpose()?;
    Ok((decode_uuid(&self.game_id)?, GameResult {
      result_id: decode_uuid(&self.result_id)?,
      player_id: decode_uuid(&self.player_id)?,
      raw_score: self.raw_score,
      rank,
      score: self.score,
    }))
  }
}

pub struct RawYakuman {
  pub yakuman_id: String,
  pub game_id:    String,
  pub player_id:  String,
  pub kind:       String,
}

impl RawYakuman {
  pub fn into_event(self) -> Result<YakumanEvent> {
    Ok(YakumanEvent {
      yakuman_id: decode_uuid(&self.yakuman_id)?,
      game_id:    decode_uuid(&self.game_id)?,
      player_id:  decode_uuid(&self.player_id)?,
      kind:       decode_yakuman_kind(&self.kind)?,
    })
  }
}

// ─── Session bundle ──────────────────────────────────────────────────────────

/// Every row needed to materialise one session, read in a single call.
pub struct RawSessionBundle {
  pub session:     RawSession,
  /// The owning group's rules; `None` for free play.
  pub group_rules: Option<RawRules>,
  pub players:     Vec<RawPlayer>,
  /// Ordered by game number.
  pub games:       Vec<RawGame>,
  /// Ordered by seat within each game.
  pub results:     Vec<RawResult>,
  pub yakuman:     Vec<RawYakuman>,
}

impl RawSessionBundle {
  pub fn into_session(self) -> Result<Session> {
    let session_id = decode_uuid(&self.session.session_id)?;

    let rules = match (self.group_rules, self.session.rules_json) {
      (Some(raw), _) => raw.into_rules()?,
      (None, Some(json)) => decode_rules_json(&json)?,
      (None, None) => RuleConfig::default(),
    };

    let mut games: Vec<Game> = self
      .games
      .into_iter()
      .map(|g| {
        Ok(Game {
          game_id: decode_uuid(&g.game_id)?,
          session_id,
          game_number: u32::try_from(g.game_number).map_err(|_| Error::Decode {
            column: "game_number",
            value:  g.game_number.to_string(),
          })?,
          results: Vec::new(),
          yakuman: Vec::new(),
        })
      })
      .collect::<Result<_>>()?;

    for raw in self.results {
      let (game_id, result) = raw.into_result()?;
      if let Some(game) = games.iter_mut().find(|g| g.game_id == game_id) {
        game.results.push(result);
      }
    }

    for raw in self.yakuman {
      let event = raw.into_event()?;
      if let Some(game) = games.iter_mut().find(|g| g.game_id == event.game_id) {
        game.yakuman.push(event);
      }
    }

    Ok(Session {
      session_id,
      date: decode_date(&self.session.date)?,
      group_id: self.session.group_id.as_deref().map(decode_uuid).transpose()?,
      created_by: decode_uuid(&self.session.created_by)?,
      created_at: decode_dt(&self.session.created_at)?,
      rules,
      players: self
        .players
        .into_iter()
        .map(RawPlayer::into_player)
        .collect::<Result<_>>()?,
      games,
    })
  }
}
