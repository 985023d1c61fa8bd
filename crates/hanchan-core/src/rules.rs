//! Ranking rules — the uma/oka configuration a game is scored under.
//!
//! A [`RuleConfig`] is always passed explicitly into scoring and aggregation.
//! Groups own one (created with [`RuleConfig::default`]); free sessions carry
//! an ad hoc copy.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Error, Result};

/// Number of seats at the table, and the length of the uma table.
pub const SEATS: usize = 4;

// ─── Game type ───────────────────────────────────────────────────────────────

/// Length of a single game. Informational; scoring does not depend on it.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
pub enum GameType {
  /// East round only.
  #[serde(rename = "東風")]
  #[strum(serialize = "東風")]
  EastOnly,
  /// East and south rounds.
  #[default]
  #[serde(rename = "東南")]
  #[strum(serialize = "東南")]
  EastSouth,
}

// ─── RuleConfig ──────────────────────────────────────────────────────────────

/// Scoring rules for one group or one free session.
///
/// Uma values are taken as given; no ordering between them is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
  #[serde(default)]
  pub game_type:    GameType,
  /// Points every player starts the game with.
  pub start_score:  i64,
  /// Baseline that raw scores are measured against.
  pub return_score: i64,
  /// Bonus or penalty per finishing rank, 1st to 4th.
  pub uma:          [i64; SEATS],
  pub has_oka:      bool,
}

impl Default for RuleConfig {
  fn default() -> Self {
    Self {
      game_type:    GameType::EastSouth,
      start_score:  25_000,
      return_score: 30_000,
      uma:          [20, 10, -10, -20],
      has_oka:      true,
    }
  }
}

impl RuleConfig {
  /// Uma for a 1-based rank. Ranks outside the table score no uma.
  pub fn uma_for(&self, rank: u8) -> i64 {
    usize::from(rank)
      .checked_sub(1)
      .and_then(|i| self.uma.get(i))
      .copied()
      .unwrap_or(0)
  }

  /// The oka pool for a table of `seats` players, in thousands of points.
  ///
  /// The exact pool `(return - start) * seats / 1000` is rounded once with
  /// 五捨六入; a gap of 5100 over four seats gives 20, 5150 gives 21.
  ///
  /// Only consulted by the independent scoring path; see
  /// [`crate::score::score_independent`].
  pub fn oka(&self, seats: usize) -> Result<i64> {
    if !self.has_oka {
      return Ok(0);
    }
    let pool = self
      .return_score
      .checked_sub(self.start_score)
      .zip(i64::try_from(seats).ok())
      .and_then(|(gap, seats)| gap.checked_mul(seats))
      .ok_or_else(|| Error::validation("start_score", "oka pool out of range"))?;
    Ok(crate::score::RoundingMode::GoshaRokunyu.apply(pool, 1000))
  }

  /// Build a rule set from a loosely-typed record as kept by the data layer.
  ///
  /// Expects the flat column layout (`return_score`, `start_score`,
  /// `uma_first` .. `uma_fourth`, `has_oka`, optional `game_type`). Missing or
  /// non-integer fields are rejected; nothing is coerced.
  pub fn from_record(record: &Value) -> Result<Self> {
    let obj = record
      .as_object()
      .ok_or_else(|| Error::validation("rules", "expected a JSON object"))?;

    let int = |field: &'static str| -> Result<i64> {
      match obj.get(field) {
        None | Some(Value::Null) => Err(Error::validation(field, "missing")),
        Some(v) => v
          .as_i64()
          .ok_or_else(|| Error::validation(field, format!("not an integer: {v}"))),
      }
    };

    let has_oka = match obj.get("has_oka") {
      None | Some(Value::Null) => {
        return Err(Error::validation("has_oka", "missing"));
      }
      Some(v) => v
        .as_bool()
        .ok_or_else(|| Error::validation("has_oka", format!("not a boolean: {v}")))?,
    };

    let game_type = match obj.get("game_type") {
      None | Some(Value::Null) => GameType::default(),
      Some(Value::String(s)) => s
        .parse()
        .map_err(|_| Error::validation("game_type", format!("unknown game type {s:?}")))?,
      Some(v) => {
        return Err(Error::validation("game_type", format!("not a string: {v}")));
      }
    };

    Ok(Self {
      game_type,
      start_score: int("start_score")?,
      return_score: int("return_score")?,
      uma: [
        int("uma_first")?,
        int("uma_second")?,
        int("uma_third")?,
        int("uma_fourth")?,
      ],
      has_oka,
    })
  }

  /// The flat record form accepted by [`RuleConfig::from_record`].
  pub fn to_record(&self) -> Value {
    serde_json::json!({
      "game_type":    self.game_type.as_ref(),
      "start_score":  self.start_score,
      "return_score": self.return_score,
      "uma_first":    self.uma[0],
      "uma_second":   self.uma[1],
      "uma_third":    self.uma[2],
      "uma_fourth":   self.uma[3],
      "has_oka":      self.has_oka,
    })
  }
}

// ─── Partial updates ─────────────────────────────────────────────────────────

/// An admin edit to a group's rules. Unset fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesPatch {
  pub game_type:    Option<GameType>,
  pub start_score:  Option<i64>,
  pub return_score: Option<i64>,
  pub uma:          Option<[i64; SEATS]>,
  pub has_oka:      Option<bool>,
}

impl RulesPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  pub fn apply(&self, base: &RuleConfig) -> RuleConfig {
    RuleConfig {
      game_type:    self.game_type.unwrap_or(base.game_type),
      start_score:  self.start_score.unwrap_or(base.start_score),
      return_score: self.return_score.unwrap_or(base.return_score),
      uma:          self.uma.unwrap_or(base.uma),
      has_oka:      self.has_oka.unwrap_or(base.has_oka),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn record() -> Value {
    json!({
      "start_score": 25000,
      "return_score": 30000,
      "uma_first": 30,
      "uma_second": 10,
      "uma_third": -10,
      "uma_fourth": -30,
      "has_oka": false,
    })
  }

  #[test]
  fn default_rules_are_25k_30k_with_oka() {
    let r = RuleConfig::default();
    assert_eq!(r.start_score, 25_000);
    assert_eq!(r.return_score, 30_000);
    assert_eq!(r.uma, [20, 10, -10, -20]);
    assert!(r.has_oka);
    assert_eq!(r.game_type, GameType::EastSouth);
  }

  #[test]
  fn record_parses_flat_columns() {
    let r = RuleConfig::from_record(&record()).unwrap();
    assert_eq!(r.uma, [30, 10, -10, -30]);
    assert!(!r.has_oka);
    assert_eq!(r.game_type, GameType::EastSouth);
    assert_eq!(RuleConfig::from_record(&r.to_record()).unwrap(), r);
  }

  #[test]
  fn record_with_string_score_is_rejected() {
    let mut rec = record();
    rec["return_score"] = json!("30000");
    let err = RuleConfig::from_record(&rec).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "return_score", .. }));
  }

  #[test]
  fn record_with_fractional_uma_is_rejected() {
    let mut rec = record();
    rec["uma_third"] = json!(-10.5);
    let err = RuleConfig::from_record(&rec).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "uma_third", .. }));
  }

  #[test]
  fn record_missing_oka_flag_is_rejected() {
    let mut rec = record();
    rec.as_object_mut().unwrap().remove("has_oka");
    let err = RuleConfig::from_record(&rec).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "has_oka", .. }));
  }

  #[test]
  fn game_type_parses_japanese_tag() {
    let mut rec = record();
    rec["game_type"] = json!("東風");
    assert_eq!(RuleConfig::from_record(&rec).unwrap().game_type, GameType::EastOnly);

    rec["game_type"] = json!("南場");
    assert!(RuleConfig::from_record(&rec).is_err());
  }

  #[test]
  fn oka_is_zero_when_disabled() {
    let mut r = RuleConfig::default();
    assert_eq!(r.oka(4).unwrap(), 20);
    r.has_oka = false;
    assert_eq!(r.oka(4).unwrap(), 0);
  }

  #[test]
  fn oka_rounds_the_whole_pool_once() {
    let with_gap = |gap: i64| RuleConfig { start_score: 30_000 - gap, ..RuleConfig::default() };
    // 5.1 * 4 = 20.4, 5.125 * 4 = 20.5, 5.15 * 4 = 20.6
    assert_eq!(with_gap(5100).oka(4).unwrap(), 20);
    assert_eq!(with_gap(5125).oka(4).unwrap(), 20);
    assert_eq!(with_gap(5150).oka(4).unwrap(), 21);
    assert_eq!(with_gap(5000).oka(3).unwrap(), 15);
  }

  #[test]
  fn oka_pool_overflow_is_refused() {
    let r = RuleConfig { start_score: i64::MIN, ..RuleConfig::default() };
    assert!(matches!(r.oka(4), Err(Error::Validation { .. })));
    let r = RuleConfig { start_score: 0, return_score: i64::MAX / 2, ..RuleConfig::default() };
    assert!(matches!(r.oka(4), Err(Error::Validation { .. })));
  }

  #[test]
  fn patch_only_touches_set_fields() {
    let base = RuleConfig::default();
    let patch = RulesPatch { return_score: Some(25_000), ..Default::default() };
    let next = patch.apply(&base);
    assert_eq!(next.return_score, 25_000);
    assert_eq!(next.uma, base.uma);
    assert!(RulesPatch::default().is_empty());
  }
}
