use std::sync::Arc;

use shiori_api::traits::TraktSync;
use shiori_core::models::{MediaKind, MediaRef, Rating};

use crate::db::DbHandle;
use crate::{mappers, RuntimeError};

/// Keeps the local ratings mirror in sync with the user's Trakt account.
///
/// The local store is a cache of the remote state, never ahead of it:
/// preload replaces whole kinds with the latest remote snapshot, and
/// mutations write remote-first so an unconfirmed change is never
/// persisted locally.
pub struct RatingsRepository<S> {
    service: Arc<S>,
    db: DbHandle,
}

impl<S: TraktSync> RatingsRepository<S> {
    pub fn new(service: Arc<S>, db: DbHandle) -> Self {
        Self { service, db }
    }

    /// Refresh the local mirror for all three kinds.
    ///
    /// The three pipelines run concurrently and independently; a failing
    /// kind is logged and skipped so the others still refresh. This call
    /// itself never fails.
    pub async fn preload_ratings(&self) {
        let (shows, seasons, episodes) = tokio::join!(
            self.preload_kind(MediaKind::Show),
            self.preload_kind(MediaKind::Season),
            self.preload_kind(MediaKind::Episode),
        );

        let outcomes = [
            (MediaKind::Show, shows),
            (MediaKind::Season, seasons),
            (MediaKind::Episode, episodes),
        ];
        for (kind, outcome) in outcomes {
            if let Err(e) = outcome {
                tracing::warn!(kind = kind.as_db_str(), "failed to preload ratings: {e}");
            }
        }
    }

    async fn preload_kind(&self, kind: MediaKind) -> Result<(), RuntimeError> {
        let entries = match kind {
            MediaKind::Show => self.service.fetch_shows_ratings().await,
            MediaKind::Season => self.service.fetch_seasons_ratings().await,
            MediaKind::Episode => self.service.fetch_episodes_ratings().await,
        }?;

        let ratings: Vec<Rating> = entries
            .iter()
            .filter_map(|entry| mappers::rating_from_entry(entry, kind))
            .collect();

        self.db.replace_all_ratings(kind, ratings).await?;
        Ok(())
    }

    /// Load the full local mirror for a kind.
    pub async fn load_ratings(&self, kind: MediaKind) -> Result<Vec<Rating>, RuntimeError> {
        Ok(self.db.ratings_by_kind(kind).await?)
    }

    /// Load the ratings of a kind for the given Trakt ids.
    pub async fn load_ratings_for(
        &self,
        trakt_ids: &[i64],
        kind: MediaKind,
    ) -> Result<Vec<Rating>, RuntimeError> {
        Ok(self.db.ratings_for_ids(trakt_ids.to_vec(), kind).await?)
    }

    /// Load the rating for a single item, if any.
    pub async fn load_rating(&self, item: MediaRef) -> Result<Option<Rating>, RuntimeError> {
        let ratings = self
            .db
            .ratings_for_ids(vec![item.trakt_id], item.kind)
            .await?;
        Ok(ratings.into_iter().next())
    }

    /// Rate an item (1-10). The remote write must succeed before the local
    /// mirror is touched; failures propagate to the caller.
    pub async fn add_rating(&self, item: MediaRef, rating: u8) -> Result<(), RuntimeError> {
        if !(1..=10).contains(&rating) {
            return Err(RuntimeError::InvalidRating(rating));
        }

        self.service
            .post_rating(mappers::sync_item(item), rating)
            .await?;
        self.db
            .replace_rating(mappers::rating_now(item, rating))
            .await?;
        Ok(())
    }

    /// Remove an item's rating. The remote delete must succeed before the
    /// local record is removed; failures propagate to the caller.
    pub async fn delete_rating(&self, item: MediaRef) -> Result<(), RuntimeError> {
        self.service.delete_rating(mappers::sync_item(item)).await?;
        self.db.delete_rating(item.trakt_id, item.kind).await?;
        Ok(())
    }

    /// Drop the whole local mirror in one transaction. Remote ratings are
    /// untouched; used on sign-out.
    pub async fn clear(&self) -> Result<(), RuntimeError> {
        Ok(self.db.clear_ratings().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use shiori_api::types::{
        EpisodeSummary, Ids, RatingEntry, SeasonSummary, ShowSummary, SyncItem,
    };
    use shiori_api::TraktError;

    use super::*;

    #[derive(Default)]
    struct StubTrakt {
        shows: Vec<RatingEntry>,
        seasons: Vec<RatingEntry>,
        episodes: Vec<RatingEntry>,
        fail_shows: bool,
        fail_mutations: bool,
        posted: Mutex<Vec<(SyncItem, u8)>>,
        deleted: Mutex<Vec<SyncItem>>,
    }

    impl TraktSync for StubTrakt {
        async fn fetch_shows_ratings(&self) -> Result<Vec<RatingEntry>, TraktError> {
            if self.fail_shows {
                return Err(TraktError::Api {
                    status: 500,
                    message: "server error".into(),
                });
            }
            Ok(self.shows.clone())
        }

        async fn fetch_seasons_ratings(&self) -> Result<Vec<RatingEntry>, TraktError> {
            Ok(self.seasons.clone())
        }

        async fn fetch_episodes_ratings(&self) -> Result<Vec<RatingEntry>, TraktError> {
            Ok(self.episodes.clone())
        }

        async fn post_rating(&self, item: SyncItem, rating: u8) -> Result<(), TraktError> {
            if self.fail_mutations {
                return Err(TraktError::Api {
                    status: 502,
                    message: "bad gateway".into(),
                });
            }
            self.posted.lock().unwrap().push((item, rating));
            Ok(())
        }

        async fn delete_rating(&self, item: SyncItem) -> Result<(), TraktError> {
            if self.fail_mutations {
                return Err(TraktError::Api {
                    status: 502,
                    message: "bad gateway".into(),
                });
            }
            self.deleted.lock().unwrap().push(item);
            Ok(())
        }
    }

    const RATED_AT: &str = "2024-03-10T18:45:00.000Z";

    fn show_entry(trakt_id: i64, rating: u8) -> RatingEntry {
        RatingEntry {
            rated_at: Some(RATED_AT.into()),
            rating,
            item_type: Some("show".into()),
            show: Some(ShowSummary {
                ids: Ids::from_trakt(trakt_id),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn season_entry(trakt_id: i64, rating: u8) -> RatingEntry {
        RatingEntry {
            rated_at: Some(RATED_AT.into()),
            rating,
            item_type: Some("season".into()),
            season: Some(SeasonSummary {
                ids: Ids::from_trakt(trakt_id),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn episode_entry(trakt_id: i64, rating: u8) -> RatingEntry {
        RatingEntry {
            rated_at: Some(RATED_AT.into()),
            rating,
            item_type: Some("episode".into()),
            episode: Some(EpisodeSummary {
                ids: Ids::from_trakt(trakt_id),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn repository(stub: StubTrakt) -> RatingsRepository<StubTrakt> {
        RatingsRepository::new(Arc::new(stub), DbHandle::open_memory().unwrap())
    }

    #[tokio::test]
    async fn test_preload_refreshes_every_kind() {
        let repo = repository(StubTrakt {
            shows: vec![show_entry(1, 8), show_entry(2, 6)],
            seasons: vec![season_entry(10, 9)],
            episodes: vec![episode_entry(100, 10)],
            ..Default::default()
        });

        // A stale row that the preload snapshot must supersede.
        repo.db
            .replace_rating(mappers::rating_now(MediaRef::show(999), 1))
            .await
            .unwrap();

        repo.preload_ratings().await;

        let shows = repo.load_ratings(MediaKind::Show).await.unwrap();
        let mut ids: Vec<i64> = shows.iter().map(|r| r.trakt_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);

        assert_eq!(repo.load_ratings(MediaKind::Season).await.unwrap().len(), 1);
        assert_eq!(
            repo.load_ratings(MediaKind::Episode).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_preload_survives_one_failing_kind() {
        let repo = repository(StubTrakt {
            shows: vec![show_entry(1, 8)],
            seasons: vec![season_entry(10, 9)],
            episodes: vec![episode_entry(100, 10)],
            fail_shows: true,
            ..Default::default()
        });

        // A stale show row survives because the show pipeline failed.
        repo.db
            .replace_rating(mappers::rating_now(MediaRef::show(999), 1))
            .await
            .unwrap();

        repo.preload_ratings().await;

        let shows = repo.load_ratings(MediaKind::Show).await.unwrap();
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].trakt_id, 999);

        assert_eq!(repo.load_ratings(MediaKind::Season).await.unwrap().len(), 1);
        assert_eq!(
            repo.load_ratings(MediaKind::Episode).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_preload_filters_malformed_entries() {
        let malformed_no_timestamp = RatingEntry {
            rated_at: None,
            ..show_entry(3, 5)
        };
        let malformed_no_id = RatingEntry {
            show: Some(ShowSummary::default()),
            ..show_entry(0, 5)
        };

        let repo = repository(StubTrakt {
            shows: vec![show_entry(1, 8), malformed_no_timestamp, malformed_no_id],
            ..Default::default()
        });

        repo.preload_ratings().await;

        let shows = repo.load_ratings(MediaKind::Show).await.unwrap();
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].trakt_id, 1);
    }

    #[tokio::test]
    async fn test_add_rating_writes_remote_then_local() {
        let repo = repository(StubTrakt::default());

        repo.add_rating(MediaRef::show(158532), 7).await.unwrap();

        let posted = repo.service.posted.lock().unwrap().clone();
        assert_eq!(posted, vec![(SyncItem::Show(158532), 7)]);

        let stored = repo.load_rating(MediaRef::show(158532)).await.unwrap();
        let stored = stored.unwrap();
        assert_eq!(stored.rating, 7);
        assert!(stored.rated_at.timestamp() > 0);
    }

    #[tokio::test]
    async fn test_add_rating_failure_leaves_store_untouched() {
        let repo = repository(StubTrakt {
            fail_mutations: true,
            ..Default::default()
        });

        let result = repo.add_rating(MediaRef::show(158532), 7).await;
        assert!(matches!(result, Err(RuntimeError::Api(_))));
        assert!(repo
            .load_rating(MediaRef::show(158532))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_add_rating_rejects_out_of_range_values() {
        let repo = repository(StubTrakt::default());

        for value in [0, 11] {
            let result = repo.add_rating(MediaRef::show(1), value).await;
            assert!(matches!(result, Err(RuntimeError::InvalidRating(v)) if v == value));
        }
        // The gateway never saw the rejected writes.
        assert!(repo.service.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_rating_removes_remote_then_local() {
        let repo = repository(StubTrakt::default());
        repo.add_rating(MediaRef::episode(100), 9).await.unwrap();

        repo.delete_rating(MediaRef::episode(100)).await.unwrap();

        let deleted = repo.service.deleted.lock().unwrap().clone();
        assert_eq!(deleted, vec![SyncItem::Episode(100)]);
        assert!(repo
            .load_rating(MediaRef::episode(100))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_rating_failure_keeps_local_record() {
        let repo = repository(StubTrakt::default());
        repo.add_rating(MediaRef::season(10), 6).await.unwrap();

        // Subsequent mutations fail at the gateway.
        let failing = RatingsRepository::new(
            Arc::new(StubTrakt {
                fail_mutations: true,
                ..Default::default()
            }),
            repo.db.clone(),
        );
        let result = failing.delete_rating(MediaRef::season(10)).await;
        assert!(matches!(result, Err(RuntimeError::Api(_))));

        assert!(repo
            .load_rating(MediaRef::season(10))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_clear_empties_all_kinds() {
        let repo = repository(StubTrakt::default());
        repo.add_rating(MediaRef::show(1), 7).await.unwrap();
        repo.add_rating(MediaRef::season(2), 8).await.unwrap();
        repo.add_rating(MediaRef::episode(3), 9).await.unwrap();

        repo.clear().await.unwrap();

        for kind in MediaKind::ALL {
            assert!(repo.load_ratings(*kind).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_batched_load_returns_all_matches() {
        let entries: Vec<RatingEntry> = (1..=600).map(|id| show_entry(id, 7)).collect();
        let repo = repository(StubTrakt {
            shows: entries,
            ..Default::default()
        });
        repo.preload_ratings().await;

        let ids: Vec<i64> = (1..=600).collect();
        let ratings = repo.load_ratings_for(&ids, MediaKind::Show).await.unwrap();
        assert_eq!(ratings.len(), 600);
    }

    #[tokio::test]
    async fn test_load_rating_returns_none_when_absent() {
        let repo = repository(StubTrakt::default());
        assert!(repo
            .load_rating(MediaRef::show(404))
            .await
            .unwrap()
            .is_none());
    }
}
