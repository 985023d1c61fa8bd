//! Aggregation — folding game results into totals, rank counts and
//! leaderboards.
//!
//! Everything here reads already-scored [`Session`]s and never mutates them.
//! Players are matched across games and sessions by
//! [`IdentityKey`](crate::participant::IdentityKey): registered users by id,
//! guests by exact name. Two different guests who typed the same name are one
//! row; one person who typed their name two ways is two rows.

use std::collections::HashMap;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  game::Game,
  participant::{IdentityKey, Participant, SessionPlayer},
  rules::SEATS,
  session::Session,
};

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One participant's statistics over some set of games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
  pub identity:      IdentityKey,
  pub display_name:  String,
  pub is_guest:      bool,
  /// Sum of normalised deltas.
  pub total:         i64,
  /// Finishes per rank; index 0 counts first places.
  pub rank_counts:   [u32; SEATS],
  /// Completed games played.
  pub game_count:    u32,
  pub yakuman_count: u32,
}

impl PlayerStats {
  fn empty(participant: &Participant, display_name: String) -> Self {
    Self {
      identity:      participant.identity_key(),
      display_name,
      is_guest:      participant.is_guest(),
      total:         0,
      rank_counts:   [0; SEATS],
      game_count:    0,
      yakuman_count: 0,
    }
  }

  /// Mean finishing rank, or `None` before the first completed game.
  pub fn average_rank(&self) -> Option<f64> {
    if self.game_count == 0 {
      return None;
    }
    let weighted: u32 = self
      .rank_counts
      .iter()
      .enumerate()
      .map(|(i, n)| (i as u32 + 1) * n)
      .sum();
    Some(f64::from(weighted) / f64::from(self.game_count))
  }
}

// ─── Tally ───────────────────────────────────────────────────────────────────

/// Accumulator keyed by identity, remembering first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Tally {
  rows:  Vec<PlayerStats>,
  index: HashMap<IdentityKey, usize>,
}

impl Tally {
  pub fn new() -> Self { Self::default() }

  /// Start with a zero row for every roster entry, so players without games
  /// still appear.
  pub fn with_roster<'a>(roster: impl IntoIterator<Item = &'a Participant>) -> Self {
    let mut tally = Self::new();
    for participant in roster {
      tally.entry(participant, participant.display_name().to_owned());
    }
    tally
  }

  /// Like [`Tally::with_roster`], but rows take each seat's shown name, so
  /// blank guests appear as `プレイヤーN`.
  pub fn with_seats<'a>(seats: impl IntoIterator<Item = &'a SessionPlayer>) -> Self {
    let mut tally = Self::new();
    for seat in seats {
      tally.seat(seat);
    }
    tally
  }

  fn entry(&mut self, participant: &Participant, display_name: String) -> &mut PlayerStats {
    let key = participant.identity_key();
    let i = match self.index.get(&key) {
      Some(&i) => i,
      None => {
        self.rows.push(PlayerStats::empty(participant, display_name));
        let last = self.rows.len() - 1;
        self.index.insert(key, last);
        return &mut self.rows[last];
      }
    };
    let row = &mut self.rows[i];
    if row.display_name.trim().is_empty() {
      row.display_name = display_name;
    }
    row
  }

  fn seat(&mut self, seat: &SessionPlayer) -> &mut PlayerStats {
    self.entry(&seat.participant, seat.display_name())
  }

  /// Fold one game of `session` into the tally. Incomplete games add nothing
  /// but their yakuman.
  pub fn add_game(&mut self, session: &Session, game: &Game) {
    if game.is_complete() {
      for result in &game.results {
        let (Some(player), Some(rank)) = (session.player(result.player_id), result.rank) else {
          continue;
        };
        let row = self.seat(player);
        row.total += result.score;
        row.game_count += 1;
        if let Some(slot) = usize::from(rank).checked_sub(1).and_then(|i| row.rank_counts.get_mut(i)) {
          *slot += 1;
        }
      }
    }

    for event in &game.yakuman {
      if let Some(player) = session.player(event.player_id) {
        self.seat(player).yakuman_count += 1;
      }
    }
  }

  pub fn add_session(&mut self, session: &Session) {
    for game in &session.games {
      self.add_game(session, game);
    }
  }

  pub fn rows(&self) -> &[PlayerStats] { &self.rows }

  pub fn get(&self, key: &IdentityKey) -> Option<&PlayerStats> {
    self.index.get(key).map(|&i| &self.rows[i])
  }

  /// Rows by total, highest first. Equal totals keep first-seen order; there
  /// is no secondary key.
  pub fn into_leaderboard(self) -> Vec<PlayerStats> {
    let mut rows = self.rows;
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
  }
}

// ─── Session level ───────────────────────────────────────────────────────────

/// Leaderboard for a single session, one row per roster seat.
pub fn session_leaderboard(session: &Session) -> Vec<PlayerStats> {
  let mut tally = Tally::with_seats(&session.players);
  tally.add_session(session);
  tally.into_leaderboard()
}

// ─── Group level ─────────────────────────────────────────────────────────────

/// Time window for a group ranking, ending on a caller-supplied day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPeriod {
  Week,
  Month,
  Quarter,
  Year,
  #[default]
  AllTime,
}

impl RankingPeriod {
  /// Whether a session dated `date` falls in this period ending `today`.
  /// Bounded periods cover `(today - period, today]`.
  pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
    let start = match self {
      Self::AllTime => return true,
      Self::Week => today.checked_sub_days(Days::new(7)),
      Self::Month => today.checked_sub_months(Months::new(1)),
      Self::Quarter => today.checked_sub_months(Months::new(3)),
      Self::Year => today.checked_sub_months(Months::new(12)),
    };
    date <= today && start.is_none_or(|start| date > start)
  }
}

/// Leaderboard for a group.
///
/// `roster` is the group's current member list; each member gets a row even
/// with no games. Only sessions belonging to `group_id` and dated within
/// `period` count. Players who appear in those sessions but are not on the
/// roster (typically guests) are appended after the members.
pub fn group_leaderboard(
  group_id: Uuid,
  roster: &[Participant],
  sessions: &[Session],
  period: RankingPeriod,
  today: NaiveDate,
) -> Vec<PlayerStats> {
  let mut tally = Tally::with_roster(roster);
  sessions
    .iter()
    .filter(|s| s.group_id == Some(group_id))
    .filter(|s| period.contains(s.date, today))
    .for_each(|s| tally.add_session(s));
  tally.into_leaderboard()
}

// ─── Per-user history ────────────────────────────────────────────────────────

/// One session as seen by one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
  pub session_id:  Uuid,
  pub date:        NaiveDate,
  pub group_id:    Option<Uuid>,
  /// The user's seat in this session.
  pub player_id:   Uuid,
  pub total:       i64,
  pub rank_counts: [u32; SEATS],
  pub game_count:  u32,
}

/// A user's sessions, newest first, plus the grand total over those listed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct History {
  pub sessions:   Vec<SessionSummary>,
  pub total:      i64,
  pub game_count: u32,
}

/// Summarise every session in which `user_id` held a seat as a registered
/// player. Sessions they only watched or created are skipped, as are seats
/// where they were entered as a guest.
pub fn user_history(user_id: Uuid, sessions: &[Session], limit: Option<usize>) -> History {
  let key = IdentityKey::User(user_id);

  let mut played: Vec<&Session> = sessions
    .iter()
    .filter(|s| s.player_for_user(user_id).is_some())
    .collect();
  played.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));

  let mut history = History::default();
  for session in played.into_iter().take(limit.unwrap_or(usize::MAX)) {
    let Some(player) = session.player_by_identity(&key) else {
      continue;
    };

    let mut tally = Tally::new();
    tally.add_session(session);
    let (total, rank_counts, game_count) = tally
      .get(&key)
      .map(|r| (r.total, r.rank_counts, r.game_count))
      .unwrap_or((0, [0; SEATS], 0));

    history.total += total;
    history.game_count += game_count;
    history.sessions.push(SessionSummary {
      session_id: session.session_id,
      date: session.date,
      group_id: session.group_id,
      player_id: player.player_id,
      total,
      rank_counts,
      game_count,
    });
  }
  history
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{
    game::{YakumanEvent, YakumanKind},
    rules::RuleConfig,
  };

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 6, d).unwrap() }

  struct Builder {
    session: Session,
  }

  impl Builder {
    fn new(group_id: Option<Uuid>, date: NaiveDate, roster: &[Participant]) -> Self {
      let session_id = Uuid::new_v4();
      let players = roster
        .iter()
        .enumerate()
        .map(|(i, p)| SessionPlayer {
          player_id:   Uuid::new_v4(),
          session_id,
          seat_index:  i as u32,
          participant: p.clone(),
        })
        .collect();
      Self {
        session: Session {
          session_id,
          date,
          group_id,
          created_by: Uuid::new_v4(),
          created_at: Utc::now(),
          rules: RuleConfig::default(),
          players,
          games: Vec::new(),
        },
      }
    }

    /// Add a game seating roster entries `seats` with the given raw scores.
    fn game(mut self, seats: &[usize], raw: &[Option<i64>]) -> Self {
      let ids: Vec<Uuid> = seats.iter().map(|&i| self.session.players[i].player_id).collect();
      let n = self.session.next_game_number();
      let mut game = Game::new(self.session.session_id, n, &ids);
      for (id, r) in ids.iter().zip(raw) {
        game.set_raw_score(*id, *r, &self.session.rules).unwrap();
      }
      self.session.games.push(game);
      self
    }

    fn build(self) -> Session { self.session }
  }

  fn table() -> [Option<i64>; 4] { [Some(42_000), Some(32_000), Some(18_000), Some(8000)] }

  fn guests(names: &[&str]) -> Vec<Participant> {
    names.iter().map(|n| Participant::guest(*n)).collect()
  }

  // ── Session ─────────────────────────────────────────────────────────────

  #[test]
  fn session_leaderboard_sums_and_sorts() {
    let s = Builder::new(None, day(1), &guests(&["A", "B", "C", "D"]))
      .game(&[0, 1, 2, 3], &table())
      .game(&[3, 2, 1, 0], &table())
      .build();

    let board = session_leaderboard(&s);
    let totals: Vec<(&str, i64)> = board.iter().map(|r| (r.display_name.as_str(), r.total)).collect();
    // A: 52 - 42, B: 12 - 22, C: -22 + 12, D: -42 + 52
    assert_eq!(totals, vec![("A", 10), ("D", 10), ("B", -10), ("C", -10)]);
    assert_eq!(board[0].rank_counts, [1, 0, 0, 1]);
    assert_eq!(board.iter().map(|r| r.total).sum::<i64>(), 0);
  }

  #[test]
  fn sitting_out_a_game_contributes_zero() {
    let s = Builder::new(None, day(1), &guests(&["A", "B", "C", "D", "E"]))
      .game(&[0, 1, 2, 3], &table())
      .game(&[4, 1, 2, 3], &table())
      .build();

    let board = session_leaderboard(&s);
    let a = board.iter().find(|r| r.display_name == "A").unwrap();
    let e = board.iter().find(|r| r.display_name == "E").unwrap();
    assert_eq!((a.total, a.game_count), (52, 1));
    assert_eq!((e.total, e.game_count), (52, 1));
  }

  #[test]
  fn incomplete_game_is_ignored() {
    let s = Builder::new(None, day(1), &guests(&["A", "B", "C", "D"]))
      .game(&[0, 1, 2, 3], &[Some(42_000), None, Some(18_000), Some(8000)])
      .build();

    let board = session_leaderboard(&s);
    assert_eq!(board.len(), 4);
    assert!(board.iter().all(|r| r.total == 0 && r.game_count == 0));
  }

  #[test]
  fn yakuman_are_counted_but_not_scored() {
    let mut s = Builder::new(None, day(1), &guests(&["A", "B", "C", "D"]))
      .game(&[0, 1, 2, 3], &table())
      .build();
    let game_id = s.games[0].game_id;
    let player_id = s.players[3].player_id;
    s.games[0].yakuman.push(YakumanEvent {
      yakuman_id: Uuid::new_v4(),
      game_id,
      player_id,
      kind: YakumanKind::Daisangen,
    });

    let board = session_leaderboard(&s);
    let d = board.iter().find(|r| r.display_name == "D").unwrap();
    assert_eq!(d.yakuman_count, 1);
    assert_eq!(d.total, -42);
  }

  #[test]
  fn blank_guest_rows_use_the_seat_label() {
    let s = Builder::new(None, day(1), &guests(&["A", "  ", "C", "D"]))
      .game(&[0, 1, 2, 3], &table())
      .build();

    let board = session_leaderboard(&s);
    let blank = board.iter().find(|r| r.total == 12).unwrap();
    assert_eq!(blank.display_name, "プレイヤー2");

    let group = Uuid::new_v4();
    let s = Builder::new(Some(group), day(1), &guests(&["A", "", "C", "D"]))
      .game(&[0, 1, 2, 3], &table())
      .build();
    let board = group_leaderboard(group, &guests(&[""]), &[s], RankingPeriod::AllTime, day(2));
    let blank = board
      .iter()
      .find(|r| r.identity == IdentityKey::Guest(String::new()))
      .unwrap();
    assert_eq!((blank.display_name.as_str(), blank.game_count), ("プレイヤー2", 1));
  }

  // ── Identity ────────────────────────────────────────────────────────────

  #[test]
  fn guests_named_alike_in_different_sessions_merge() {
    let group = Uuid::new_v4();
    let first = Builder::new(Some(group), day(1), &guests(&["Taro", "B", "C", "D"]))
      .game(&[0, 1, 2, 3], &table())
      .build();
    let second = Builder::new(Some(group), day(2), &guests(&["W", "X", "Taro", "Y"]))
      .game(&[0, 1, 2, 3], &table())
      .build();

    let board = group_leaderboard(group, &[], &[first, second], RankingPeriod::AllTime, day(30));
    let taro: Vec<&PlayerStats> = board.iter().filter(|r| r.display_name == "Taro").collect();
    assert_eq!(taro.len(), 1);
    assert_eq!(taro[0].game_count, 2);
    assert_eq!(taro[0].total, 52 - 22);
    assert_eq!(taro[0].rank_counts, [1, 0, 1, 0]);
  }

  #[test]
  fn registered_users_match_by_id_not_name() {
    let group = Uuid::new_v4();
    let hanako = Uuid::new_v4();
    let mut first_roster = guests(&["B", "C", "D"]);
    first_roster.insert(0, Participant::registered(hanako, "Hanako"));
    let mut second_roster = guests(&["B", "C", "D"]);
    second_roster.insert(0, Participant::registered(hanako, "Hanako (renamed)"));

    let sessions = [
      Builder::new(Some(group), day(1), &first_roster).game(&[0, 1, 2, 3], &table()).build(),
      Builder::new(Some(group), day(2), &second_roster).game(&[0, 1, 2, 3], &table()).build(),
    ];

    let board = group_leaderboard(group, &[], &sessions, RankingPeriod::AllTime, day(30));
    let rows: Vec<&PlayerStats> = board
      .iter()
      .filter(|r| r.identity == IdentityKey::User(hanako))
      .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].game_count, 2);
    assert!(!rows[0].is_guest);
  }

  // ── Group ───────────────────────────────────────────────────────────────

  #[test]
  fn group_with_no_games_lists_every_member() {
    let roster = vec![
      Participant::registered(Uuid::new_v4(), "Hanako"),
      Participant::registered(Uuid::new_v4(), "Jiro"),
      Participant::guest("Taro"),
    ];
    let board = group_leaderboard(Uuid::new_v4(), &roster, &[], RankingPeriod::AllTime, day(30));
    assert_eq!(board.len(), 3);
    assert!(board.iter().all(|r| r.total == 0 && r.game_count == 0 && r.rank_counts == [0; 4]));
    assert_eq!(board[0].display_name, "Hanako");
  }

  #[test]
  fn other_groups_and_free_play_are_excluded() {
    let group = Uuid::new_v4();
    let roster = guests(&["A", "B", "C", "D"]);
    let sessions = [
      Builder::new(Some(group), day(1), &roster).game(&[0, 1, 2, 3], &table()).build(),
      Builder::new(Some(Uuid::new_v4()), day(1), &roster).game(&[0, 1, 2, 3], &table()).build(),
      Builder::new(None, day(1), &roster).game(&[0, 1, 2, 3], &table()).build(),
    ];
    let board = group_leaderboard(group, &roster, &sessions, RankingPeriod::AllTime, day(30));
    assert_eq!(board[0].display_name, "A");
    assert_eq!(board[0].total, 52);
    assert_eq!(board[0].game_count, 1);
  }

  #[test]
  fn period_limits_sessions_by_date() {
    let group = Uuid::new_v4();
    let roster = guests(&["A", "B", "C", "D"]);
    let old = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    let sessions = [
      Builder::new(Some(group), old, &roster).game(&[0, 1, 2, 3], &table()).build(),
      Builder::new(Some(group), day(20), &roster).game(&[3, 2, 1, 0], &table()).build(),
    ];
    let week = group_leaderboard(group, &roster, &sessions, RankingPeriod::Week, day(25));
    let a = week.iter().find(|r| r.display_name == "A").unwrap();
    assert_eq!((a.total, a.game_count), (-42, 1));

    let all = group_leaderboard(group, &roster, &sessions, RankingPeriod::AllTime, day(25));
    let a = all.iter().find(|r| r.display_name == "A").unwrap();
    assert_eq!((a.total, a.game_count), (10, 2));
  }

  #[test]
  fn period_bounds() {
    let today = day(15);
    assert!(RankingPeriod::Week.contains(day(9), today));
    assert!(!RankingPeriod::Week.contains(day(8), today));
    assert!(!RankingPeriod::Week.contains(day(16), today));
    assert!(RankingPeriod::Month.contains(NaiveDate::from_ymd_opt(2024, 5, 16).unwrap(), today));
    assert!(!RankingPeriod::Month.contains(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(), today));
    assert!(RankingPeriod::AllTime.contains(NaiveDate::MIN, today));
  }

  // ── History ─────────────────────────────────────────────────────────────

  #[test]
  fn history_lists_sessions_newest_first_with_totals() {
    let me = Uuid::new_v4();
    let mut roster = guests(&["B", "C", "D"]);
    roster.push(Participant::registered(me, "Me"));

    let sessions = [
      Builder::new(None, day(1), &roster).game(&[3, 0, 1, 2], &table()).build(),
      Builder::new(None, day(5), &roster)
        .game(&[0, 1, 2, 3], &table())
        .game(&[0, 1, 3, 2], &table())
        .build(),
      Builder::new(None, day(3), &guests(&["W", "X", "Y", "Z"]))
        .game(&[0, 1, 2, 3], &table())
        .build(),
    ];

    let h = user_history(me, &sessions, None);
    assert_eq!(h.sessions.len(), 2);
    assert_eq!(h.sessions[0].date, day(5));
    assert_eq!(h.sessions[0].total, -42 - 22);
    assert_eq!(h.sessions[0].game_count, 2);
    assert_eq!(h.sessions[1].total, 52);
    assert_eq!(h.total, 52 - 42 - 22);
    assert_eq!(h.game_count, 3);

    let limited = user_history(me, &sessions, Some(1));
    assert_eq!(limited.sessions.len(), 1);
    assert_eq!(limited.total, -64);
  }

  #[test]
  fn history_ignores_guest_seats_with_the_users_name() {
    let me = Uuid::new_v4();
    let s = Builder::new(None, day(1), &guests(&["Me", "B", "C", "D"]))
      .game(&[0, 1, 2, 3], &table())
      .build();
    assert!(user_history(me, &[s], None).sessions.is_empty());
  }

  #[test]
  fn aggregation_leaves_sessions_untouched() {
    let s = Builder::new(None, day(1), &guests(&["A", "B", "C", "D"]))
      .game(&[0, 1, 2, 3], &table())
      .build();
    let before = s.clone();
    let _ = session_leaderboard(&s);
    let _ = group_leaderboard(Uuid::new_v4(), &[], std::slice::from_ref(&s), RankingPeriod::AllTime, day(2));
    assert_eq!(s, before);
  }

  #[test]
  fn average_rank_is_none_without_games() {
    let row = PlayerStats::empty(&Participant::guest("A"), "A".into());
    assert_eq!(row.average_rank(), None);
    let row = PlayerStats { rank_counts: [1, 0, 1, 0], game_count: 2, ..row };
    assert_eq!(row.average_rank(), Some(2.0));
  }
}
