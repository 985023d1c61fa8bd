//! `POST /preview` — score a possibly partial table without storing it.
//!
//! Uses the independent path, so first place includes oka and the deltas need
//! not sum to zero. Stored games never go through here.

use axum::Json;
use hanchan_core::{
  Error as CoreError,
  rules::{RuleConfig, SEATS},
  score::{self, Placement, RoundingMode},
};
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ApiError, groups::merge_rules};

#[derive(Debug, Deserialize)]
pub struct PreviewBody {
  /// One entry per seat; `null` for seats not yet entered.
  pub raw_scores: Vec<Option<i64>>,
  /// Any subset of the flat rule record, over the defaults.
  pub rules:      Option<Value>,
  #[serde(default)]
  pub rounding:   RoundingMode,
}

/// `POST /preview` — one entry per seat, `null` where no score was given.
pub async fn handler(Json(body): Json<PreviewBody>) -> Result<Json<Vec<Option<Placement>>>, ApiError> {
  if body.raw_scores.len() > SEATS {
    return Err(CoreError::TooManySeats { max: SEATS, got: body.raw_scores.len() }.into());
  }
  let rules = match &body.rules {
    Some(record) => merge_rules(&RuleConfig::default(), record)?,
    None => RuleConfig::default(),
  };
  Ok(Json(score::preview(&rules, &body.raw_scores, body.rounding)?))
}
