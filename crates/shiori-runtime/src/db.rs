use std::path::Path;

use tokio::sync::{mpsc, oneshot};

use shiori_core::error::ShioriError;
use shiori_core::models::{MediaKind, Rating};
use shiori_core::storage::{Storage, TokenRecord};

/// Async handle to the SQLite storage.
///
/// All database access runs on one dedicated thread; commands are
/// serialized through an unbounded channel.
#[derive(Clone)]
pub struct DbHandle {
    tx: mpsc::UnboundedSender<DbCommand>,
}

enum DbCommand {
    ReplaceAllRatings {
        kind: MediaKind,
        ratings: Vec<Rating>,
        reply: oneshot::Sender<Result<(), ShioriError>>,
    },
    ReplaceRating {
        rating: Rating,
        reply: oneshot::Sender<Result<(), ShioriError>>,
    },
    RatingsByKind {
        kind: MediaKind,
        reply: oneshot::Sender<Result<Vec<Rating>, ShioriError>>,
    },
    RatingsForIds {
        trakt_ids: Vec<i64>,
        kind: MediaKind,
        reply: oneshot::Sender<Result<Vec<Rating>, ShioriError>>,
    },
    DeleteRating {
        trakt_id: i64,
        kind: MediaKind,
        reply: oneshot::Sender<Result<(), ShioriError>>,
    },
    ClearRatings {
        reply: oneshot::Sender<Result<(), ShioriError>>,
    },
    SaveToken {
        service: String,
        token: String,
        refresh: Option<String>,
        expires_at: Option<String>,
        reply: oneshot::Sender<Result<(), ShioriError>>,
    },
    GetToken {
        service: String,
        reply: oneshot::Sender<Result<Option<String>, ShioriError>>,
    },
    GetTokenFull {
        service: String,
        reply: oneshot::Sender<Result<Option<TokenRecord>, ShioriError>>,
    },
    DeleteToken {
        service: String,
        reply: oneshot::Sender<Result<(), ShioriError>>,
    },
}

impl DbHandle {
    pub fn open(path: &Path) -> Option<Self> {
        let storage = Storage::open(path)
            .map_err(|e| tracing::error!("Failed to open database: {e}"))
            .ok()?;
        Self::spawn(storage)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Option<Self> {
        let storage = Storage::open_memory()
            .map_err(|e| tracing::error!("Failed to open database: {e}"))
            .ok()?;
        Self::spawn(storage)
    }

    fn spawn(storage: Storage) -> Option<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("db-actor".into())
            .spawn(move || actor_loop(storage, rx))
            .map_err(|e| tracing::error!("Failed to spawn DB thread: {e}"))
            .ok()?;

        Some(Self { tx })
    }

    pub async fn replace_all_ratings(
        &self,
        kind: MediaKind,
        ratings: Vec<Rating>,
    ) -> Result<(), ShioriError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(DbCommand::ReplaceAllRatings {
            kind,
            ratings,
            reply,
        });
        rx.await
            .unwrap_or_else(|_| Err(ShioriError::Config("DB actor closed".into())))
    }

    pub async fn replace_rating(&self, rating: Rating) -> Result<(), ShioriError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(DbCommand::ReplaceRating { rating, reply });
        rx.await
            .unwrap_or_else(|_| Err(ShioriError::Config("DB actor closed".into())))
    }

    pub async fn ratings_by_kind(&self, kind: MediaKind) -> Result<Vec<Rating>, ShioriError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(DbCommand::RatingsByKind { kind, reply });
        rx.await
            .unwrap_or_else(|_| Err(ShioriError::Config("DB actor closed".into())))
    }

    pub async fn ratings_for_ids(
        &self,
        trakt_ids: Vec<i64>,
        kind: MediaKind,
    ) -> Result<Vec<Rating>, ShioriError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(DbCommand::RatingsForIds {
            trakt_ids,
            kind,
            reply,
        });
        rx.await
            .unwrap_or_else(|_| Err(ShioriError::Config("DB actor closed".into())))
    }

    pub async fn delete_rating(&self, trakt_id: i64, kind: MediaKind) -> Result<(), ShioriError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(DbCommand::DeleteRating {
            trakt_id,
            kind,
            reply,
        });
        rx.await
            .unwrap_or_else(|_| Err(ShioriError::Config("DB actor closed".into())))
    }

    pub async fn clear_ratings(&self) -> Result<(), ShioriError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(DbCommand::ClearRatings { reply });
        rx.await
            .unwrap_or_else(|_| Err(ShioriError::Config("DB actor closed".into())))
    }

    pub async fn save_token(
        &self,
        service: impl Into<String>,
        token: String,
        refresh: Option<String>,
        expires_at: Option<String>,
    ) -> Result<(), ShioriError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(DbCommand::SaveToken {
            service: service.into(),
            token,
            refresh,
            expires_at,
            reply,
        });
        rx.await
            .unwrap_or_else(|_| Err(ShioriError::Config("DB actor closed".into())))
    }

    pub async fn get_token(
        &self,
        service: impl Into<String>,
    ) -> Result<Option<String>, ShioriError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(DbCommand::GetToken {
            service: service.into(),
            reply,
        });
        rx.await
            .unwrap_or_else(|_| Err(ShioriError::Config("DB actor closed".into())))
    }

    pub async fn get_token_full(
        &self,
        service: impl Into<String>,
    ) -> Result<Option<TokenRecord>, ShioriError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(DbCommand::GetTokenFull {
            service: service.into(),
            reply,
        });
        rx.await
            .unwrap_or_else(|_| Err(ShioriError::Config("DB actor closed".into())))
    }

    pub async fn delete_token(&self, service: impl Into<String>) -> Result<(), ShioriError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(DbCommand::DeleteToken {
            service: service.into(),
            reply,
        });
        rx.await
            .unwrap_or_else(|_| Err(ShioriError::Config("DB actor closed".into())))
    }
}

fn actor_loop(mut storage: Storage, mut rx: mpsc::UnboundedReceiver<DbCommand>) {
    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            DbCommand::ReplaceAllRatings {
                kind,
                ratings,
                reply,
            } => {
                let _ = reply.send(storage.replace_all_ratings(kind, &ratings));
            }
            DbCommand::ReplaceRating { rating, reply } => {
                let _ = reply.send(storage.replace_rating(&rating));
            }
            DbCommand::RatingsByKind { kind, reply } => {
                let _ = reply.send(storage.ratings_by_kind(kind));
            }
            DbCommand::RatingsForIds {
                trakt_ids,
                kind,
                reply,
            } => {
                let _ = reply.send(storage.ratings_for_ids(&trakt_ids, kind));
            }
            DbCommand::DeleteRating {
                trakt_id,
                kind,
                reply,
            } => {
                let _ = reply.send(storage.delete_rating(trakt_id, kind));
            }
            DbCommand::ClearRatings { reply } => {
                let _ = reply.send(storage.clear_ratings());
            }
            DbCommand::SaveToken {
                service,
                token,
                refresh,
                expires_at,
                reply,
            } => {
                let _ = reply.send(storage.save_token(
                    &service,
                    &token,
                    refresh.as_deref(),
                    expires_at.as_deref(),
                ));
            }
            DbCommand::GetToken { service, reply } => {
                let _ = reply.send(storage.get_token(&service));
            }
            DbCommand::GetTokenFull { service, reply } => {
                let _ = reply.send(storage.get_token_full(&service));
            }
            DbCommand::DeleteToken { service, reply } => {
                let _ = reply.send(storage.delete_token(&service));
            }
        }
    }
}
