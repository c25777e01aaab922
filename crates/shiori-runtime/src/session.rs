use chrono::{DateTime, Utc};

use shiori_api::auth::TokenResponse;

use crate::db::DbHandle;
use crate::RuntimeError;

/// Service name the Trakt token is stored under.
pub const TRAKT_SERVICE: &str = "trakt";

/// The signed-in user's Trakt session, persisted in the token table.
pub struct UserSession {
    db: DbHandle,
}

impl UserSession {
    pub fn new(db: DbHandle) -> Self {
        Self { db }
    }

    /// Verify a usable session exists and return its access token.
    ///
    /// Must pass before any authorized flow is attempted. Fails when no
    /// token is stored or the stored token has expired; a token without an
    /// expiry is treated as non-expiring.
    pub async fn check_authorization(&self) -> Result<String, RuntimeError> {
        let record = self.db.get_token_full(TRAKT_SERVICE).await?;
        let Some((token, _refresh, expires_at)) = record else {
            return Err(RuntimeError::Auth("not signed in to Trakt".into()));
        };

        if let Some(expires_at) = expires_at.as_deref() {
            let expires = DateTime::parse_from_rfc3339(expires_at)
                .map_err(|e| RuntimeError::Auth(format!("invalid token expiry: {e}")))?;
            if expires.with_timezone(&Utc) <= Utc::now() {
                return Err(RuntimeError::Auth("Trakt session expired".into()));
            }
        }

        Ok(token)
    }

    pub async fn is_authorized(&self) -> bool {
        self.check_authorization().await.is_ok()
    }

    /// The stored refresh token, if any.
    pub async fn refresh_token(&self) -> Result<Option<String>, RuntimeError> {
        let record = self.db.get_token_full(TRAKT_SERVICE).await?;
        Ok(record.and_then(|(_, refresh, _)| refresh))
    }

    /// Persist a token response from the auth flow.
    pub async fn save(&self, token: &TokenResponse) -> Result<(), RuntimeError> {
        let expires_at = match (token.created_at, token.expires_in) {
            (Some(created), Some(expires_in)) => {
                DateTime::<Utc>::from_timestamp((created + expires_in) as i64, 0)
                    .map(|dt| dt.to_rfc3339())
            }
            _ => None,
        };
        self.db
            .save_token(
                TRAKT_SERVICE,
                token.access_token.clone(),
                token.refresh_token.clone(),
                expires_at,
            )
            .await?;
        Ok(())
    }

    /// Forget the stored session.
    pub async fn clear(&self) -> Result<(), RuntimeError> {
        Ok(self.db.delete_token(TRAKT_SERVICE).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> UserSession {
        UserSession::new(DbHandle::open_memory().unwrap())
    }

    #[tokio::test]
    async fn test_check_fails_when_signed_out() {
        let session = session();
        let result = session.check_authorization().await;
        assert!(matches!(result, Err(RuntimeError::Auth(_))));
    }

    #[tokio::test]
    async fn test_check_passes_with_valid_token() {
        let session = session();
        session
            .db
            .save_token(
                TRAKT_SERVICE,
                "tok".into(),
                Some("refresh".into()),
                Some("2099-01-01T00:00:00Z".into()),
            )
            .await
            .unwrap();

        let token = session.check_authorization().await.unwrap();
        assert_eq!(token, "tok");
        assert!(session.is_authorized().await);
        assert_eq!(session.refresh_token().await.unwrap().as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn test_check_fails_with_expired_token() {
        let session = session();
        session
            .db
            .save_token(
                TRAKT_SERVICE,
                "tok".into(),
                None,
                Some("2020-01-01T00:00:00Z".into()),
            )
            .await
            .unwrap();

        let result = session.check_authorization().await;
        assert!(matches!(result, Err(RuntimeError::Auth(_))));
    }

    #[tokio::test]
    async fn test_token_without_expiry_never_expires() {
        let session = session();
        session
            .db
            .save_token(TRAKT_SERVICE, "tok".into(), None, None)
            .await
            .unwrap();

        assert!(session.is_authorized().await);
    }

    #[tokio::test]
    async fn test_clear_signs_out() {
        let session = session();
        session
            .db
            .save_token(TRAKT_SERVICE, "tok".into(), None, None)
            .await
            .unwrap();

        session.clear().await.unwrap();
        assert!(!session.is_authorized().await);
    }
}
