use mongodb::error::Error as DbError;
use rocket::{http::Status, response::Responder, serde::json::Json};
use thiserror::Error;

use crate::api::response::ApiResponse;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way a poll operation can fail, kinded so the gateway maps each
/// failure to a status code deterministically.
#[derive(Debug, Error)]
pub enum Error {
    /// The storage engine itself failed (MongoDB only).
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Not found: {0}")]
    NotFound(String),
    /// Lost a compare-and-swap race past the retry bound, or tried to create
    /// a poll under an ID that already exists.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// A legal request aimed at a poll whose lifecycle forbids it.
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl Error {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = match &self {
            Self::Db(_) => Status::InternalServerError,
            Self::NotFound(_) => Status::NotFound,
            Self::Conflict(_) | Self::InvalidState(_) => Status::Conflict,
            Self::Validation(_) => Status::BadRequest,
        };
        // Storage failures are our fault; don't echo their internals.
        let envelope: ApiResponse<()> = match &self {
            Self::Db(err) => {
                error!("Storage failure: {err}");
                ApiResponse::failure_with_details(
                    "Internal server error",
                    "the storage layer failed; see server logs",
                )
            }
            _ => ApiResponse::failure(self.to_string()),
        };
        (status, Json(envelope)).respond_to(req)
    }
}
