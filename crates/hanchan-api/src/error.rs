//! API error type and [`axum::response::IntoResponse`] implementation.

use std::error::Error as StdError;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use hanchan_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn StdError + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by the domain error somewhere in its source
  /// chain. Anything without one is an internal failure.
  pub fn from_store<E>(err: E) -> Self
  where
    E: StdError + Send + Sync + 'static,
  {
    let core = std::iter::successors(Some(&err as &(dyn StdError + 'static)), |e| (*e).source())
      .find_map(|e| e.downcast_ref::<CoreError>());

    match core.map(classify) {
      Some(Some(api)) => api,
      _ => ApiError::Store(Box::new(err)),
    }
  }
}

/// Status for a domain error, or `None` if it is not the caller's fault.
fn classify(err: &CoreError) -> Option<ApiError> {
  let message = err.to_string();
  if err.is_not_found() {
    return Some(ApiError::NotFound(message));
  }
  match err {
    CoreError::AlreadyMember { .. } => Some(ApiError::Conflict(message)),
    CoreError::Validation { .. }
    | CoreError::TooManySeats { .. }
    | CoreError::DuplicateSeat(_)
    | CoreError::NotAGuest(_)
    | CoreError::PlayerNotSeated { .. }
    | CoreError::UnknownYakuman(_) => Some(ApiError::BadRequest(message)),
    _ => None,
  }
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self { ApiError::from_store(err) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[derive(Debug, Error)]
  #[error("backend: {0}")]
  struct Wrapped(#[source] CoreError);

  #[test]
  fn domain_errors_are_found_through_wrappers() {
    let id = Uuid::new_v4();
    assert!(matches!(
      ApiError::from_store(Wrapped(CoreError::SessionNotFound(id))),
      ApiError::NotFound(_)
    ));
    assert!(matches!(
      ApiError::from_store(Wrapped(CoreError::NotAGuest(id))),
      ApiError::BadRequest(_)
    ));
    assert!(matches!(
      ApiError::from_store(Wrapped(CoreError::AlreadyMember { group: id, user: id })),
      ApiError::Conflict(_)
    ));
    assert!(matches!(
      ApiError::from_store(Wrapped(CoreError::DuplicateSeat(id))),
      ApiError::BadRequest(_)
    ));
  }

  #[test]
  fn bare_domain_error_is_classified() {
    let err: ApiError = CoreError::Validation { field: "raw_score", reason: "overflow".into() }.into();
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
  }

  #[test]
  fn unknown_errors_are_internal() {
    let err = ApiError::from_store(std::io::Error::other("disk on fire"));
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
