//! Score normalisation — raw table points to uma-adjusted deltas.
//!
//! The canonical path is [`normalize`]: every rank below first is computed
//! from its raw score and uma, and first place is forced to the negated sum
//! of the others. The deltas of a complete game therefore always sum to
//! exactly zero, and all rounding residue lands on the winner.
//!
//! A consequence is that oka never shows up in the batch result; first place
//! absorbs it along with everything else. [`score_independent`] is the
//! per-seat alternative that does apply oka, at the cost of the zero-sum
//! guarantee. It exists for previews of partially-entered games only.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  game::GameResult,
  rules::{RuleConfig, SEATS},
};

/// Raw points per unit of delta.
pub const POINTS_PER_UNIT: i64 = 1000;

// ─── Rounding ────────────────────────────────────────────────────────────────

/// How a fractional `raw / 1000` is brought to an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
  /// 五捨六入: a fraction of at most one half is truncated toward zero,
  /// anything larger rounds away from zero. Exactly .5 truncates.
  #[default]
  GoshaRokunyu,
  /// Ordinary rounding with .5 going away from zero.
  HalfAwayFromZero,
}

impl RoundingMode {
  /// Round `numer / denom` with this policy. `denom` must be positive.
  ///
  /// Works on the integer remainder so the .5 boundary is exact.
  pub fn apply(self, numer: i64, denom: i64) -> i64 {
    let quotient = numer / denom;
    let twice_rem = (numer % denom).abs() * 2;
    let away = match self {
      Self::GoshaRokunyu => twice_rem > denom,
      Self::HalfAwayFromZero => twice_rem >= denom,
    };
    if away && twice_rem != 0 {
      quotient + numer.signum()
    } else {
      quotient
    }
  }
}

fn out_of_range(field: &'static str) -> Error { Error::validation(field, "out of range") }

/// Raw score relative to the return score, in units, before uma.
fn base_points(raw: i64, rules: &RuleConfig, mode: RoundingMode) -> Result<i64> {
  let diff = raw
    .checked_sub(rules.return_score)
    .ok_or_else(|| out_of_range("raw_score"))?;
  Ok(mode.apply(diff, POINTS_PER_UNIT))
}

/// Base points plus uma for a seat that finished `rank`.
fn with_uma(raw: i64, rank: u8, rules: &RuleConfig, mode: RoundingMode) -> Result<i64> {
  base_points(raw, rules, mode)?
    .checked_add(rules.uma_for(rank))
    .ok_or_else(|| out_of_range("uma"))
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

/// 1-based finishing rank for each entry, by raw score descending.
///
/// Equal scores keep input order: the earlier entry gets the better rank.
pub fn assign_ranks(raw_scores: &[i64]) -> Vec<u8> {
  let mut order: Vec<usize> = (0..raw_scores.len()).collect();
  // `sort_by` is stable, which is what makes the tie-break deterministic.
  order.sort_by(|&a, &b| raw_scores[b].cmp(&raw_scores[a]));

  let mut ranks = vec![0u8; raw_scores.len()];
  for (position, index) in order.into_iter().enumerate() {
    ranks[index] = u8::try_from(position + 1).unwrap_or(u8::MAX);
  }
  ranks
}

// ─── Batch (zero-sum) ────────────────────────────────────────────────────────

/// Rank and delta for one seat of a complete game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
  pub rank:  u8,
  pub delta: i64,
}

/// Score a complete game. Output is in input order and sums to zero.
///
/// Inputs extreme enough to overflow any step are refused with
/// [`Error::Validation`].
pub fn normalize(rules: &RuleConfig, raw_scores: &[i64]) -> Result<Vec<Placement>> {
  if raw_scores.len() > SEATS {
    return Err(Error::TooManySeats { max: SEATS, got: raw_scores.len() });
  }

  let ranks = assign_ranks(raw_scores);
  let mut placements = raw_scores
    .iter()
    .zip(&ranks)
    .map(|(&raw, &rank)| {
      let delta = if rank == 1 {
        0
      } else {
        with_uma(raw, rank, rules, RoundingMode::GoshaRokunyu)?
      };
      Ok(Placement { rank, delta })
    })
    .collect::<Result<Vec<_>>>()?;

  let others = placements
    .iter()
    .try_fold(0i64, |sum, p| sum.checked_add(p.delta))
    .and_then(i64::checked_neg)
    .ok_or_else(|| out_of_range("raw_score"))?;
  if let Some(top) = placements.iter_mut().find(|p| p.rank == 1) {
    top.delta = others;
  }

  Ok(placements)
}

/// A seat's normalised result, keyed by session player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedResult {
  pub player_id: Uuid,
  pub rank:      u8,
  pub delta:     i64,
}

/// Score a game's results if every seat has a raw score.
///
/// Returns `Ok(None)` for an incomplete game; that is a normal state, not an
/// error.
pub fn normalize_results(
  rules: &RuleConfig,
  results: &[GameResult],
) -> Result<Option<Vec<NormalizedResult>>> {
  let raw: Option<Vec<i64>> = results.iter().map(|r| r.raw_score).collect();
  let Some(raw) = raw else {
    return Ok(None);
  };
  if raw.is_empty() {
    return Ok(None);
  }

  let placements = normalize(rules, &raw)?;
  Ok(Some(
    results
      .iter()
      .zip(placements)
      .map(|(r, p)| NormalizedResult { player_id: r.player_id, rank: p.rank, delta: p.delta })
      .collect(),
  ))
}

// ─── Independent (preview) ───────────────────────────────────────────────────

/// Score one seat on its own: rounding, uma and, for first place, oka.
///
/// Deltas produced this way are not forced to sum to zero.
pub fn score_independent(
  raw: i64,
  rank: u8,
  rules: &RuleConfig,
  seats: usize,
  mode: RoundingMode,
) -> Result<i64> {
  let delta = with_uma(raw, rank, rules, mode)?;
  if rank != 1 {
    return Ok(delta);
  }
  delta
    .checked_add(rules.oka(seats)?)
    .ok_or_else(|| out_of_range("raw_score"))
}

/// Preview a possibly partial set of raw scores. Entries without a score are
/// `None`; present ones are ranked among themselves and scored independently.
pub fn preview(
  rules: &RuleConfig,
  raw_scores: &[Option<i64>],
  mode: RoundingMode,
) -> Result<Vec<Option<Placement>>> {
  let present: Vec<i64> = raw_scores.iter().flatten().copied().collect();
  let mut ranks = assign_ranks(&present).into_iter();
  let seats = raw_scores.len();

  let mut placements = Vec::with_capacity(seats);
  for &raw in raw_scores {
    let placement = match raw.zip(raw.and_then(|_| ranks.next())) {
      Some((raw, rank)) => Some(Placement {
        rank,
        delta: score_independent(raw, rank, rules, seats, mode)?,
      }),
      None => None,
    };
    placements.push(placement);
  }
  Ok(placements)
}
