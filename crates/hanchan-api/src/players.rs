//! Handlers for `/players` endpoints, plus the participant body shared by
//! every endpoint that seats someone.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `PATCH` | `/players/:id` | Body: `{"name":"..."}`; guests only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use hanchan_core::{
  participant::{Participant, SessionPlayer},
  store::ScoreStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Participant body ─────────────────────────────────────────────────────────

/// `{"user_id":"..."}` seats a registered user, `{"name":"..."}` a guest.
#[derive(Debug, Deserialize)]
pub struct ParticipantBody {
  pub user_id: Option<Uuid>,
  pub name:    Option<String>,
}

impl ParticipantBody {
  pub fn into_participant(self) -> Result<Participant, ApiError> {
    match (self.user_id, self.name) {
      (Some(user_id), name) => Ok(Participant::registered(user_id, name.unwrap_or_default())),
      (None, Some(name)) => Ok(Participant::guest(name)),
      (None, None) => Err(ApiError::BadRequest(
        "a participant needs either `user_id` or `name`".into(),
      )),
    }
  }
}

// ─── Rename ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RenameBody {
  pub name: String,
}

/// `PATCH /players/:id` — rename a guest seat.
pub async fn rename<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RenameBody>,
) -> Result<Json<SessionPlayer>, ApiError>
where
  S: ScoreStore,
{
  let player = store
    .rename_guest(id, body.name)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(player))
}
