//! Sessions — one dated sitting, its roster and the games played in it.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  game::Game,
  participant::{IdentityKey, Participant, SessionPlayer},
  rules::{RuleConfig, SEATS},
};

// ─── Session ─────────────────────────────────────────────────────────────────

/// A fully materialised session: roster, games, and the rules its games are
/// scored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub session_id: Uuid,
  pub date:       NaiveDate,
  /// `None` for free play.
  pub group_id:   Option<Uuid>,
  pub created_by: Uuid,
  pub created_at: DateTime<Utc>,
  /// The group's rules for group sessions, the ad hoc rules otherwise.
  pub rules:      RuleConfig,
  /// Ordered by seat index.
  pub players:    Vec<SessionPlayer>,
  /// Ordered by game number.
  pub games:      Vec<Game>,
}

impl Session {
  pub fn is_free_play(&self) -> bool { self.group_id.is_none() }

  pub fn player(&self, player_id: Uuid) -> Option<&SessionPlayer> {
    self.players.iter().find(|p| p.player_id == player_id)
  }

  /// The seat held by `key` in this session, if any.
  pub fn player_by_identity(&self, key: &IdentityKey) -> Option<&SessionPlayer> {
    self.players.iter().find(|p| &p.identity_key() == key)
  }

  /// The seat held by a registered user, if they played as themselves.
  pub fn player_for_user(&self, user_id: Uuid) -> Option<&SessionPlayer> {
    self.player_by_identity(&IdentityKey::User(user_id))
  }

  pub fn game(&self, game_id: Uuid) -> Option<&Game> {
    self.games.iter().find(|g| g.game_id == game_id)
  }

  pub fn game_mut(&mut self, game_id: Uuid) -> Option<&mut Game> {
    self.games.iter_mut().find(|g| g.game_id == game_id)
  }

  /// Number for the next game: one past the highest so far.
  pub fn next_game_number(&self) -> u32 {
    self.games.iter().map(|g| g.game_number).max().unwrap_or(0) + 1
  }

  /// Sum of one seat's scores over every game in the session.
  pub fn total_for(&self, player_id: Uuid) -> i64 {
    self
      .games
      .iter()
      .filter_map(|g| g.result_for(player_id))
      .map(|r| r.score)
      .sum()
  }

  /// Work out who sits in a new game.
  ///
  /// Names are matched against existing seats by displayed name; unknown names
  /// become new guest seats appended to the roster. Nobody sits twice.
  pub fn plan_seats(&self, seats: &GameSeats) -> Result<SeatPlan> {
    let mut plan = SeatPlan::default();

    match seats {
      GameSeats::All => {
        plan.player_ids = self.players.iter().map(|p| p.player_id).collect();
      }
      GameSeats::Players(ids) => {
        for id in ids {
          let player = self.player(*id).ok_or(Error::PlayerNotFound(*id))?;
          plan.player_ids.push(player.player_id);
        }
      }
      GameSeats::Names(names) => {
        for name in names {
          let existing = self
            .players
            .iter()
            .chain(&plan.new_players)
            .find(|p| p.display_name() == *name);
          match existing {
            Some(p) => plan.player_ids.push(p.player_id),
            None => {
              let seat_index = (self.players.len() + plan.new_players.len()) as u32;
              let player = SessionPlayer {
                player_id: Uuid::new_v4(),
                session_id: self.session_id,
                seat_index,
                participant: Participant::guest(name.clone()),
              };
              plan.player_ids.push(player.player_id);
              plan.new_players.push(player);
            }
          }
        }
      }
    }

    if plan.player_ids.len() > SEATS {
      return Err(Error::TooManySeats { max: SEATS, got: plan.player_ids.len() });
    }
    let mut seen = HashSet::new();
    if let Some(dup) = plan.player_ids.iter().find(|id| !seen.insert(**id)) {
      return Err(Error::DuplicateSeat(*dup));
    }
    Ok(plan)
  }
}

// ─── Seating ─────────────────────────────────────────────────────────────────

/// Who plays in a game being added to a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "by", content = "seats", rename_all = "snake_case")]
pub enum GameSeats {
  /// Everyone on the session roster.
  #[default]
  All,
  /// A subset of the roster, for sessions with more players than seats.
  Players(Vec<Uuid>),
  /// Free play: seat by name, adding guests for names not yet seen.
  Names(Vec<String>),
}

/// Result of [`Session::plan_seats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatPlan {
  /// Seats for the new game, in order.
  pub player_ids:  Vec<Uuid>,
  /// Roster additions that must be persisted before the game.
  pub new_players: Vec<SessionPlayer>,
}

// ─── NewSession ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::ScoreStore::create_session`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
  pub date:       NaiveDate,
  pub group_id:   Option<Uuid>,
  pub created_by: Uuid,
  /// Initial roster, in seat order.
  pub players:    Vec<Participant>,
  /// Ad hoc rules for free play. Ignored for group sessions, which always use
  /// the group's rules; defaults apply when absent.
  pub rules:      Option<RuleConfig>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn session(names: &[&str]) -> Session {
    let session_id = Uuid::new_v4();
    Session {
      session_id,
      date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
      group_id: None,
      created_by: Uuid::new_v4(),
      created_at: Utc::now(),
      rules: RuleConfig::default(),
      players: names
        .iter()
        .enumerate()
        .map(|(i, n)| SessionPlayer {
          player_id:   Uuid::new_v4(),
          session_id,
          seat_index:  i as u32,
          participant: Participant::guest(*n),
        })
        .collect(),
      games: Vec::new(),
    }
  }

  #[test]
  fn all_seats_everyone() {
    let s = session(&["A", "B", "C", "D"]);
    let plan = s.plan_seats(&GameSeats::All).unwrap();
    assert_eq!(plan.player_ids.len(), 4);
    assert!(plan.new_players.is_empty());
  }

  #[test]
  fn names_reuse_existing_seats_and_add_guests() {
    let s = session(&["A", "B", "C", "D"]);
    let names = ["A", "E", "C", "F"].map(String::from).to_vec();
    let plan = s.plan_seats(&GameSeats::Names(names)).unwrap();

    assert_eq!(plan.new_players.len(), 2);
    assert_eq!(plan.new_players[0].seat_index, 4);
    assert_eq!(plan.new_players[1].seat_index, 5);
    assert_eq!(plan.player_ids[0], s.players[0].player_id);
    assert_eq!(plan.player_ids[1], plan.new_players[0].player_id);
    assert_eq!(plan.player_ids[2], s.players[2].player_id);
    assert_eq!(plan.player_ids[3], plan.new_players[1].player_id);
  }

  #[test]
  fn a_repeated_name_cannot_take_two_seats() {
    let s = session(&["A", "B", "C", "D"]);
    let names = ["A", "E", "C", "E"].map(String::from).to_vec();
    let err = s.plan_seats(&GameSeats::Names(names)).unwrap_err();
    assert!(matches!(err, Error::DuplicateSeat(_)));

    let names = ["A", "B", "A"].map(String::from).to_vec();
    let err = s.plan_seats(&GameSeats::Names(names)).unwrap_err();
    assert!(matches!(err, Error::DuplicateSeat(id) if id == s.players[0].player_id));
  }

  #[test]
  fn a_repeated_player_id_cannot_take_two_seats() {
    let s = session(&["A", "B", "C", "D"]);
    let dup = s.players[1].player_id;
    let err = s.plan_seats(&GameSeats::Players(vec![dup, dup])).unwrap_err();
    assert!(matches!(err, Error::DuplicateSeat(id) if id == dup));
  }

  #[test]
  fn unknown_player_id_is_rejected() {
    let s = session(&["A", "B", "C", "D"]);
    let err = s.plan_seats(&GameSeats::Players(vec![Uuid::new_v4()])).unwrap_err();
    assert!(matches!(err, Error::PlayerNotFound(_)));
  }

  #[test]
  fn five_players_cannot_share_a_table() {
    let s = session(&["A", "B", "C", "D", "E"]);
    let err = s.plan_seats(&GameSeats::All).unwrap_err();
    assert!(matches!(err, Error::TooManySeats { got: 5, .. }));
  }

  #[test]
  fn next_game_number_follows_highest() {
    let mut s = session(&["A", "B", "C", "D"]);
    assert_eq!(s.next_game_number(), 1);
    let ids: Vec<Uuid> = s.players.iter().map(|p| p.player_id).collect();
    s.games.push(Game::new(s.session_id, 3, &ids));
    assert_eq!(s.next_game_number(), 4);
  }
}
