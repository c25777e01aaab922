//! Trait definitions for the Trakt sync surface.
//!
//! `TraktClient` implements these; the runtime repositories depend on the
//! traits so tests can substitute stub services.

use std::future::Future;

use crate::error::TraktError;
use crate::types::{RatingEntry, SyncItem, SyncRequest};

/// Remote ratings operations used by the ratings sync repository.
///
/// Fetches return the complete set for the account; there is no
/// pagination on these endpoints.
pub trait TraktSync: Send + Sync {
    fn fetch_shows_ratings(
        &self,
    ) -> impl Future<Output = Result<Vec<RatingEntry>, TraktError>> + Send;

    fn fetch_seasons_ratings(
        &self,
    ) -> impl Future<Output = Result<Vec<RatingEntry>, TraktError>> + Send;

    fn fetch_episodes_ratings(
        &self,
    ) -> impl Future<Output = Result<Vec<RatingEntry>, TraktError>> + Send;

    /// Post a rating (1-10) for a single item.
    fn post_rating(
        &self,
        item: SyncItem,
        rating: u8,
    ) -> impl Future<Output = Result<(), TraktError>> + Send;

    /// Remove the rating for a single item.
    fn delete_rating(&self, item: SyncItem) -> impl Future<Output = Result<(), TraktError>> + Send;
}

/// Hidden-item removal operations.
pub trait TraktHidden: Send + Sync {
    /// Un-hide the items from the progress section.
    fn remove_hidden(
        &self,
        request: &SyncRequest,
    ) -> impl Future<Output = Result<(), TraktError>> + Send;

    /// Un-hide the items from the dropped section.
    fn remove_dropped(
        &self,
        request: &SyncRequest,
    ) -> impl Future<Output = Result<(), TraktError>> + Send;
}
