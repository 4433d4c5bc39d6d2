use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Invalid game name")]
  InvalidName,

  #[error("Download failed: {0}")]
  DownloadFailed(String),

  #[error("Unsupported archive: only ZIP files can be installed")]
  UnsupportedArchive,

  #[error("Token not found")]
  TokenNotFound,

  #[error("Token already used")]
  TokenAlreadyUsed,

  #[error("Token expired")]
  TokenExpired,

  #[error("Invalid plan type: {0}")]
  InvalidPlanType(String),

  #[error("Invalid token quantity: {0}")]
  InvalidQuantity(u32),

  #[error("Access denied: plan is not active")]
  AccessDenied,

  #[error("Game not found")]
  GameNotFound,

  #[error("Game `{0}` is not installed")]
  NotInstalled(String),

  #[error("No launchable executable recorded for `{0}`")]
  NoExecutable(String),

  #[error("Catalog request failed: {0}")]
  Catalog(String),

  #[error("Install of `{0}` already in progress")]
  InstallInProgress(String),

  #[error("Cancelled")]
  Cancelled,

  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] json::Error),

  #[error("Internal error: {0}")]
  Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::InvalidName
      | Error::InvalidPlanType(_)
      | Error::InvalidQuantity(_)
      | Error::TokenExpired
      | Error::UnsupportedArchive => StatusCode::BAD_REQUEST,
      Error::TokenNotFound
      | Error::GameNotFound
      | Error::NotInstalled(_)
      | Error::NoExecutable(_) => StatusCode::NOT_FOUND,
      Error::TokenAlreadyUsed | Error::InstallInProgress(_) => {
        StatusCode::CONFLICT
      }
      Error::AccessDenied => StatusCode::FORBIDDEN,
      Error::DownloadFailed(_) | Error::Catalog(_) => StatusCode::BAD_GATEWAY,
      Error::Cancelled
      | Error::Database(_)
      | Error::Io(_)
      | Error::Json(_)
      | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = match &self {
      Error::Database(err) => {
        tracing::error!("Database error: {err}");
        "Database error".to_string()
      }
      Error::Io(err) => {
        tracing::error!("IO error: {err}");
        "IO error".to_string()
      }
      other => other.to_string(),
    };

    let body = json::json!({
      "success": false,
      "error": message,
    });

    (status, axum::Json(body)).into_response()
  }
}
