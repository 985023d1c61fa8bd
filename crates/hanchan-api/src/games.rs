//! Handlers for game, score and yakuman endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/sessions/:id/games` | Body: `{"by":"all"}`, `{"by":"players","seats":[..]}` or `{"by":"names","seats":[..]}` |
//! | `DELETE` | `/games/:id` | |
//! | `PUT`    | `/games/:id/results/:player_id` | Body: `{"raw_score":32000}` or `{"raw_score":null}` |
//! | `POST`   | `/games/:id/yakuman` | Body: `{"player_id":"..","kind":"国士無双"}` |
//! | `DELETE` | `/yakuman/:id` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use hanchan_core::{
  game::{Game, YakumanKind},
  session::GameSeats,
  store::ScoreStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Games ────────────────────────────────────────────────────────────────────

/// `POST /sessions/:id/games` — returns 201 + the new, unscored [`Game`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Path(session_id): Path<Uuid>,
  Json(seats): Json<GameSeats>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScoreStore,
{
  let game = store
    .add_game(session_id, seats)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(game)))
}

/// `DELETE /games/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ScoreStore,
{
  store.delete_game(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Scores ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScoreBody {
  /// `null` clears the seat.
  pub raw_score: Option<i64>,
}

/// `PUT /games/:id/results/:player_id` — returns the rescored game.
pub async fn record_score<S>(
  State(store): State<Arc<S>>,
  Path((game_id, player_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<ScoreBody>,
) -> Result<Json<Game>, ApiError>
where
  S: ScoreStore,
{
  let game = store
    .record_raw_score(game_id, player_id, body.raw_score)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(game))
}

// ─── Yakuman ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct YakumanBody {
  pub player_id: Uuid,
  /// Japanese name of the hand.
  pub kind:      String,
}

/// `POST /games/:id/yakuman` — returns 201 + the recorded event.
pub async fn add_yakuman<S>(
  State(store): State<Arc<S>>,
  Path(game_id): Path<Uuid>,
  Json(body): Json<YakumanBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScoreStore,
{
  let kind = YakumanKind::parse_tag(&body.kind)?;
  let event = store
    .add_yakuman(game_id, body.player_id, kind)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `DELETE /yakuman/:id`
pub async fn remove_yakuman<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ScoreStore,
{
  store.remove_yakuman(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
