mod db;
mod mappers;
mod ratings;
mod remove;
mod session;

pub use db::DbHandle;
pub use ratings::RatingsRepository;
pub use remove::{RemoveFromTrakt, RemoveMode};
pub use session::{UserSession, TRAKT_SERVICE};

use shiori_api::TraktError;
use shiori_core::error::ShioriError;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("api error: {0}")]
    Api(String),

    #[error("not authorized: {0}")]
    Auth(String),

    #[error("storage error: {0}")]
    Storage(#[from] ShioriError),

    #[error("invalid rating value: {0} (expected 1-10)")]
    InvalidRating(u8),
}

impl From<TraktError> for RuntimeError {
    fn from(err: TraktError) -> Self {
        match err {
            TraktError::Auth(msg) => Self::Auth(msg),
            other => Self::Api(other.to_string()),
        }
    }
}
