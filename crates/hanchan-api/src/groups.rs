//! Handlers for `/groups` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/groups` | Body: `{"name","invite_code","created_by"}` |
//! | `GET`   | `/groups/:id` | 404 if not found |
//! | `GET`   | `/groups/:id/members` | Join order |
//! | `POST`  | `/groups/:id/members` | Body: participant plus optional `role` |
//! | `GET`   | `/groups/:id/rules` | Flat rule record |
//! | `PATCH` | `/groups/:id/rules` | Any subset of the flat rule record |
//! | `GET`   | `/groups/:id/leaderboard` | `?period=week\|month\|quarter\|year\|all_time&today=YYYY-MM-DD` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use hanchan_core::{
  aggregate::{PlayerStats, RankingPeriod, group_leaderboard},
  group::{Group, GroupMember, MemberRole, NewGroup},
  participant::Participant,
  rules::{RuleConfig, RulesPatch},
  store::{ScoreStore, SessionQuery},
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{error::ApiError, players::ParticipantBody};

// ─── Rule records ─────────────────────────────────────────────────────────────

/// Overlay a loose rule record onto `base` and validate the result.
///
/// Fields absent from `record` keep `base`'s value; unknown fields are
/// rejected rather than ignored.
pub fn merge_rules(base: &RuleConfig, record: &Value) -> Result<RuleConfig, ApiError> {
  let patch = record
    .as_object()
    .ok_or_else(|| ApiError::BadRequest("rules must be a JSON object".into()))?;

  let mut merged = base.to_record();
  if let Some(fields) = merged.as_object_mut() {
    for (key, value) in patch {
      if !fields.contains_key(key) {
        return Err(ApiError::BadRequest(format!("unknown rule field `{key}`")));
      }
      fields.insert(key.clone(), value.clone());
    }
  }

  Ok(RuleConfig::from_record(&merged)?)
}

// ─── Create / get ─────────────────────────────────────────────────────────────

/// `POST /groups` — returns 201; the creator becomes the first admin.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewGroup>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScoreStore,
{
  let group = store.create_group(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(group)))
}

/// `GET /groups/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Group>, ApiError>
where
  S: ScoreStore,
{
  let group = store
    .get_group(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("group {id} not found")))?;
  Ok(Json(group))
}

// ─── Members ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddMemberBody {
  #[serde(flatten)]
  pub participant: ParticipantBody,
  #[serde(default)]
  pub role:        MemberRole,
}

/// `GET /groups/:id/members`
pub async fn list_members<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<GroupMember>>, ApiError>
where
  S: ScoreStore,
{
  let members = store.list_members(id).await.map_err(ApiError::from_store)?;
  Ok(Json(members))
}

/// `POST /groups/:id/members` — 409 if the user is already listed.
pub async fn add_member<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AddMemberBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScoreStore,
{
  let participant = body.participant.into_participant()?;
  let member = store
    .add_member(id, participant, body.role)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(member)))
}

// ─── Rules ────────────────────────────────────────────────────────────────────

async fn current_rules<S: ScoreStore>(store: &S, id: Uuid) -> Result<RuleConfig, ApiError> {
  store
    .get_rules(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("group {id} not found")))
}

/// `GET /groups/:id/rules` — the flat record form.
pub async fn get_rules<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: ScoreStore,
{
  Ok(Json(current_rules(store.as_ref(), id).await?.to_record()))
}

/// `PATCH /groups/:id/rules` — body is any subset of the flat record.
pub async fn update_rules<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError>
where
  S: ScoreStore,
{
  let current = current_rules(store.as_ref(), id).await?;
  let next = merge_rules(&current, &body)?;

  let patch = RulesPatch {
    game_type:    Some(next.game_type),
    start_score:  Some(next.start_score),
    return_score: Some(next.return_score),
    uma:          Some(next.uma),
    has_oka:      Some(next.has_oka),
  };
  let rules = store
    .update_rules(id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rules.to_record()))
}

// ─── Leaderboard ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
  #[serde(default)]
  pub period: RankingPeriod,
  /// End of the period. Defaults to today (UTC).
  pub today:  Option<NaiveDate>,
}

/// `GET /groups/:id/leaderboard[?period=...][&today=...]`
pub async fn leaderboard<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<LeaderboardParams>,
) -> Result<Json<Vec<PlayerStats>>, ApiError>
where
  S: ScoreStore,
{
  let roster: Vec<Participant> = store
    .list_members(id)
    .await
    .map_err(ApiError::from_store)?
    .into_iter()
    .map(|m| m.participant)
    .collect();

  let query = SessionQuery { group_id: Some(id), ..SessionQuery::default() };
  let sessions = store
    .list_sessions(&query)
    .await
    .map_err(ApiError::from_store)?;

  let today = params.today.unwrap_or_else(|| Utc::now().date_naive());
  Ok(Json(group_leaderboard(id, &roster, &sessions, params.period, today)))
}
