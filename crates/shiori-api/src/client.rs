use reqwest::Client;

use crate::error::TraktError;
use crate::traits::{TraktHidden, TraktSync};
use crate::types::{AnticipatedMovie, Movie, RatingEntry, SyncItem, SyncRequest, TrendingMovie};

const BASE_URL: &str = "https://api.trakt.tv";
const API_VERSION: &str = "2";

/// Trakt API v2 client.
///
/// Discovery endpoints work with just a client id; the sync endpoints
/// additionally require a user access token.
pub struct TraktClient {
    client_id: String,
    access_token: Option<String>,
    http: Client,
}

impl TraktClient {
    pub fn new(client_id: String, access_token: Option<String>) -> Self {
        Self {
            client_id,
            access_token,
            http: Client::new(),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{BASE_URL}{path}"))
            .header("Content-Type", "application/json")
            .header("trakt-api-version", API_VERSION)
            .header("trakt-api-key", &self.client_id)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{BASE_URL}{path}"))
            .header("Content-Type", "application/json")
            .header("trakt-api-version", API_VERSION)
            .header("trakt-api-key", &self.client_id)
    }

    /// Bearer header for the authorized endpoints, or `Auth` when no
    /// session is loaded.
    fn auth_header(&self) -> Result<String, TraktError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| TraktError::Auth("no access token".into()))?;
        Ok(format!("Bearer {token}"))
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TraktError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else if status.as_u16() == 401 || status.as_u16() == 403 {
            let body = resp.text().await.unwrap_or_default();
            Err(TraktError::Auth(body))
        } else {
            let status = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "Trakt API error");
            Err(TraktError::Api {
                status,
                message: body,
            })
        }
    }

    async fn fetch_ratings(&self, segment: &str) -> Result<Vec<RatingEntry>, TraktError> {
        let resp = self
            .get(&format!("/sync/ratings/{segment}"))
            .header("Authorization", self.auth_header()?)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json().await.map_err(|e| TraktError::Parse(e.to_string()))
    }

    async fn post_sync(&self, path: &str, request: &SyncRequest) -> Result<(), TraktError> {
        let resp = self
            .post(path)
            .header("Authorization", self.auth_header()?)
            .json(request)
            .send()
            .await?;

        Self::check_response(resp).await?;
        Ok(())
    }

    // ── Movies ──────────────────────────────────────────────────

    /// Fetch a single movie with full details.
    pub async fn fetch_movie(&self, trakt_id: i64) -> Result<Movie, TraktError> {
        let resp = self
            .get(&format!("/movies/{trakt_id}"))
            .query(&[("extended", "full")])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json().await.map_err(|e| TraktError::Parse(e.to_string()))
    }

    /// Fetch the most-watched movies, optionally filtered by genre slugs.
    pub async fn fetch_popular_movies(
        &self,
        genres: &str,
        limit: u32,
    ) -> Result<Vec<Movie>, TraktError> {
        let resp = self
            .get("/movies/popular")
            .query(&[
                ("extended", "full"),
                ("genres", genres),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json().await.map_err(|e| TraktError::Parse(e.to_string()))
    }

    /// Fetch the movies being watched right now.
    pub async fn fetch_trending_movies(
        &self,
        genres: &str,
        limit: u32,
    ) -> Result<Vec<TrendingMovie>, TraktError> {
        let resp = self
            .get("/movies/trending")
            .query(&[
                ("extended", "full"),
                ("genres", genres),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json().await.map_err(|e| TraktError::Parse(e.to_string()))
    }

    /// Fetch the most-listed unreleased movies.
    pub async fn fetch_anticipated_movies(
        &self,
        genres: &str,
        limit: u32,
    ) -> Result<Vec<AnticipatedMovie>, TraktError> {
        let resp = self
            .get("/movies/anticipated")
            .query(&[
                ("extended", "full"),
                ("genres", genres),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json().await.map_err(|e| TraktError::Parse(e.to_string()))
    }

    /// Fetch movies related to the given one.
    pub async fn fetch_related_movies(
        &self,
        trakt_id: i64,
        limit: u32,
    ) -> Result<Vec<Movie>, TraktError> {
        let resp = self
            .get(&format!("/movies/{trakt_id}/related"))
            .query(&[("extended", "full"), ("limit", &limit.to_string())])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json().await.map_err(|e| TraktError::Parse(e.to_string()))
    }
}

impl TraktSync for TraktClient {
    async fn fetch_shows_ratings(&self) -> Result<Vec<RatingEntry>, TraktError> {
        self.fetch_ratings("shows").await
    }

    async fn fetch_seasons_ratings(&self) -> Result<Vec<RatingEntry>, TraktError> {
        self.fetch_ratings("seasons").await
    }

    async fn fetch_episodes_ratings(&self) -> Result<Vec<RatingEntry>, TraktError> {
        self.fetch_ratings("episodes").await
    }

    async fn post_rating(&self, item: SyncItem, rating: u8) -> Result<(), TraktError> {
        self.post_sync("/sync/ratings", &SyncRequest::single(item, Some(rating)))
            .await
    }

    async fn delete_rating(&self, item: SyncItem) -> Result<(), TraktError> {
        self.post_sync("/sync/ratings/remove", &SyncRequest::single(item, None))
            .await
    }
}

impl TraktHidden for TraktClient {
    async fn remove_hidden(&self, request: &SyncRequest) -> Result<(), TraktError> {
        self.post_sync("/users/hidden/progress_watched/remove", request)
            .await
    }

    async fn remove_dropped(&self, request: &SyncRequest) -> Result<(), TraktError> {
        self.post_sync("/users/hidden/dropped/remove", request).await
    }
}
