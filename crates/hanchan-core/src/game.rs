//! Games (hanchan) — one table's raw scores plus any yakuman recorded in it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result, rules::RuleConfig, score};

// ─── Yakuman ─────────────────────────────────────────────────────────────────

/// Limit hands worth recording. The tag is the Japanese name, which is also
/// the stored and wire representation.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
pub enum YakumanKind {
  #[serde(rename = "国士無双")]
  #[strum(serialize = "国士無双")]
  KokushiMusou,
  #[serde(rename = "四暗刻")]
  #[strum(serialize = "四暗刻")]
  Suuankou,
  #[serde(rename = "大三元")]
  #[strum(serialize = "大三元")]
  Daisangen,
  #[serde(rename = "字一色")]
  #[strum(serialize = "字一色")]
  Tsuuiisou,
  #[serde(rename = "小四喜")]
  #[strum(serialize = "小四喜")]
  Shousuushii,
  #[serde(rename = "大四喜")]
  #[strum(serialize = "大四喜")]
  Daisuushii,
  #[serde(rename = "緑一色")]
  #[strum(serialize = "緑一色")]
  Ryuuiisou,
  #[serde(rename = "清老頭")]
  #[strum(serialize = "清老頭")]
  Chinroutou,
  #[serde(rename = "九蓮宝燈")]
  #[strum(serialize = "九蓮宝燈")]
  ChuurenPoutou,
  #[serde(rename = "四槓子")]
  #[strum(serialize = "四槓子")]
  Suukantsu,
  #[serde(rename = "天和")]
  #[strum(serialize = "天和")]
  Tenhou,
  #[serde(rename = "地和")]
  #[strum(serialize = "地和")]
  Chiihou,
}

impl YakumanKind {
  pub fn parse_tag(tag: &str) -> Result<Self> {
    Self::from_str(tag).map_err(|_| Error::UnknownYakuman(tag.to_owned()))
  }
}

/// A yakuman scored by one player in one game. Never affects the deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YakumanEvent {
  pub yakuman_id: Uuid,
  pub game_id:    Uuid,
  pub player_id:  Uuid,
  pub kind:       YakumanKind,
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// One seat's row in a game.
///
/// `raw_score` is `None` until entered. `rank` and `score` are derived and
/// only meaningful once every seat in the game has a raw score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
  pub result_id: Uuid,
  pub player_id: Uuid,
  pub raw_score: Option<i64>,
  pub rank:      Option<u8>,
  pub score:     i64,
}

impl GameResult {
  /// An empty seat awaiting its raw score.
  pub fn placeholder(player_id: Uuid) -> Self {
    Self { result_id: Uuid::new_v4(), player_id, raw_score: None, rank: None, score: 0 }
  }
}

// ─── Game ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
  pub game_id:     Uuid,
  pub session_id:  Uuid,
  /// 1-based position within the session.
  pub game_number: u32,
  /// Seats in the order they were created.
  pub results:     Vec<GameResult>,
  pub yakuman:     Vec<YakumanEvent>,
}

impl Game {
  pub fn new(session_id: Uuid, game_number: u32, player_ids: &[Uuid]) -> Self {
    Self {
      game_id: Uuid::new_v4(),
      session_id,
      game_number,
      results: player_ids.iter().copied().map(GameResult::placeholder).collect(),
      yakuman: Vec::new(),
    }
  }

  /// True once every seat has a raw score.
  pub fn is_complete(&self) -> bool {
    !self.results.is_empty() && self.results.iter().all(|r| r.raw_score.is_some())
  }

  pub fn result_for(&self, player_id: Uuid) -> Option<&GameResult> {
    self.results.iter().find(|r| r.player_id == player_id)
  }

  /// Re-derive every seat's rank and score from the raw scores.
  ///
  /// The whole game is rescored, never patched. An incomplete game has all
  /// ranks cleared and all scores zeroed.
  pub fn recompute(&mut self, rules: &RuleConfig) -> Result<()> {
    match score::normalize_results(rules, &self.results)? {
      Some(normalized) => {
        for (result, n) in self.results.iter_mut().zip(normalized) {
          result.rank = Some(n.rank);
          result.score = n.delta;
        }
      }
      None => {
        for result in &mut self.results {
          result.rank = None;
          result.score = 0;
        }
      }
    }
    Ok(())
  }

  /// Enter (or clear) one seat's raw score and rescore the game.
  pub fn set_raw_score(
    &mut self,
    player_id: Uuid,
    raw_score: Option<i64>,
    rules: &RuleConfig,
  ) -> Result<()> {
    let game_id = self.game_id;
    let seat = self
      .results
      .iter_mut()
      .find(|r| r.player_id == player_id)
      .ok_or(Error::PlayerNotSeated { game: game_id, player: player_id })?;
    seat.raw_score = raw_score;
    self.recompute(rules)
  }

  pub fn total_score(&self) -> i64 { self.results.iter().map(|r| r.score).sum() }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  fn four_seat_game() -> (Game, Vec<Uuid>) {
    let players: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    (Game::new(Uuid::new_v4(), 1, &players), players)
  }

  #[test]
  fn new_game_is_incomplete_with_zero_scores() {
    let (game, _) = four_seat_game();
    assert!(!game.is_complete());
    assert!(game.results.iter().all(|r| r.rank.is_none() && r.score == 0));
  }

  #[test]
  fn last_score_entered_completes_and_scores_game() {
    let (mut game, p) = four_seat_game();
    let rules = RuleConfig::default();
    game.set_raw_score(p[0], Some(42_000), &rules).unwrap();
    game.set_raw_score(p[1], Some(32_000), &rules).unwrap();
    game.set_raw_score(p[2], Some(18_000), &rules).unwrap();
    assert!(!game.is_complete());
    assert_eq!(game.result_for(p[0]).unwrap().rank, None);

    game.set_raw_score(p[3], Some(8000), &rules).unwrap();
    assert!(game.is_complete());
    let scores: Vec<i64> = game.results.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![52, 12, -22, -42]);
    assert_eq!(game.total_score(), 0);
  }

  #[test]
  fn editing_a_score_reorders_ranks() {
    let (mut game, p) = four_seat_game();
    let rules = RuleConfig::default();
    for (id, raw) in p.iter().zip([42_000, 32_000, 18_000, 8000]) {
      game.set_raw_score(*id, Some(raw), &rules).unwrap();
    }
    game.set_raw_score(p[3], Some(50_000), &rules).unwrap();
    assert_eq!(game.result_for(p[3]).unwrap().rank, Some(1));
    assert_eq!(game.result_for(p[0]).unwrap().rank, Some(2));
    assert_eq!(game.total_score(), 0);
  }

  #[test]
  fn clearing_a_score_resets_the_game() {
    let (mut game, p) = four_seat_game();
    let rules = RuleConfig::default();
    for (id, raw) in p.iter().zip([42_000, 32_000, 18_000, 8000]) {
      game.set_raw_score(*id, Some(raw), &rules).unwrap();
    }
    game.set_raw_score(p[1], None, &rules).unwrap();
    assert!(game.results.iter().all(|r| r.rank.is_none() && r.score == 0));
  }

  #[test]
  fn zero_is_a_real_raw_score() {
    let (mut game, p) = four_seat_game();
    let rules = RuleConfig::default();
    for (id, raw) in p.iter().zip([50_000, 30_000, 20_000, 0]) {
      game.set_raw_score(*id, Some(raw), &rules).unwrap();
    }
    assert!(game.is_complete());
    assert_eq!(game.result_for(p[3]).unwrap().score, -50);
  }

  #[test]
  fn unseated_player_is_rejected() {
    let (mut game, _) = four_seat_game();
    let err = game
      .set_raw_score(Uuid::new_v4(), Some(1), &RuleConfig::default())
      .unwrap_err();
    assert!(matches!(err, Error::PlayerNotSeated { .. }));
  }

  #[test]
  fn yakuman_tags_round_trip_through_strings() {
    assert_eq!(YakumanKind::iter().count(), 12);
    for kind in YakumanKind::iter() {
      assert_eq!(YakumanKind::parse_tag(kind.as_ref()).unwrap(), kind);
    }
    assert_eq!(YakumanKind::KokushiMusou.to_string(), "国士無双");
    assert!(matches!(YakumanKind::parse_tag("立直"), Err(Error::UnknownYakuman(_))));
  }
}
