//! Handlers for `/sessions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/sessions` | Optional `group_id`, `created_by`, `player`, `limit` |
//! | `POST`   | `/sessions` | Body: [`CreateBody`]; returns 201 + session |
//! | `GET`    | `/sessions/:id` | Roster, games, results and yakuman |
//! | `DELETE` | `/sessions/:id` | Removes every game in it |
//! | `GET`    | `/sessions/:id/summary` | Per-player totals for the session |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use hanchan_core::{
  aggregate::{PlayerStats, session_leaderboard},
  rules::RuleConfig,
  session::{NewSession, Session},
  store::{ScoreStore, SessionQuery},
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{error::ApiError, groups::merge_rules, players::ParticipantBody};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub group_id:   Option<Uuid>,
  pub created_by: Option<Uuid>,
  /// Only sessions this registered user sat in.
  pub player:     Option<Uuid>,
  pub limit:      Option<usize>,
}

/// `GET /sessions[?group_id=...][&created_by=...][&player=...][&limit=N]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Session>>, ApiError>
where
  S: ScoreStore,
{
  let query = SessionQuery {
    group_id:   params.group_id,
    created_by: params.created_by,
    player:     params.player,
    limit:      params.limit,
  };
  let sessions = store
    .list_sessions(&query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(sessions))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /sessions`.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub date:       NaiveDate,
  pub group_id:   Option<Uuid>,
  pub created_by: Uuid,
  #[serde(default)]
  pub players:    Vec<ParticipantBody>,
  /// Free play only: any subset of the flat rule record, over the defaults.
  pub rules:      Option<Value>,
}

/// `POST /sessions` — returns 201 + the materialised [`Session`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScoreStore,
{
  let rules = body
    .rules
    .as_ref()
    .map(|record| merge_rules(&RuleConfig::default(), record))
    .transpose()?;
  let players = body
    .players
    .into_iter()
    .map(ParticipantBody::into_participant)
    .collect::<Result<Vec<_>, _>>()?;

  let session = store
    .create_session(NewSession {
      date: body.date,
      group_id: body.group_id,
      created_by: body.created_by,
      players,
      rules,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(session)))
}

// ─── Get / delete ─────────────────────────────────────────────────────────────

async fn load<S: ScoreStore>(store: &S, id: Uuid) -> Result<Session, ApiError> {
  store
    .get_session(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("session {id} not found")))
}

/// `GET /sessions/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Session>, ApiError>
where
  S: ScoreStore,
{
  Ok(Json(load(store.as_ref(), id).await?))
}

/// `DELETE /sessions/:id` — 204 on success.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ScoreStore,
{
  store.delete_session(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Summary ──────────────────────────────────────────────────────────────────

/// `GET /sessions/:id/summary` — one row per roster seat, best total first.
pub async fn summary<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<PlayerStats>>, ApiError>
where
  S: ScoreStore,
{
  let session = load(store.as_ref(), id).await?;
  Ok(Json(session_leaderboard(&session)))
}
