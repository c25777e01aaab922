use serde::{Deserialize, Serialize};

// ── Shared id block ─────────────────────────────────────────────

/// External ids attached to every Trakt media object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ids {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trakt: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<i64>,
}

impl Ids {
    pub fn from_trakt(trakt_id: i64) -> Self {
        Self {
            trakt: Some(trakt_id),
            ..Default::default()
        }
    }
}

// ── Ratings responses ───────────────────────────────────────────

/// One entry of `GET /sync/ratings/{type}`.
///
/// Only the sub-object matching the entry's type is present; the rest
/// stay `None`. `rated_at` may be absent on malformed payloads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingEntry {
    pub rated_at: Option<String>,
    pub rating: u8,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub show: Option<ShowSummary>,
    pub season: Option<SeasonSummary>,
    pub episode: Option<EpisodeSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShowSummary {
    pub title: Option<String>,
    pub year: Option<u16>,
    #[serde(default)]
    pub ids: Ids,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonSummary {
    pub number: Option<u32>,
    #[serde(default)]
    pub ids: Ids,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpisodeSummary {
    pub season: Option<u32>,
    pub number: Option<u32>,
    pub title: Option<String>,
    #[serde(default)]
    pub ids: Ids,
}

// ── Sync request bodies ─────────────────────────────────────────

/// A single item heading for a sync endpoint, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncItem {
    Movie(i64),
    Show(i64),
    Season(i64),
    Episode(i64),
}

impl SyncItem {
    pub fn trakt_id(self) -> i64 {
        match self {
            Self::Movie(id) | Self::Show(id) | Self::Season(id) | Self::Episode(id) => id,
        }
    }
}

/// Body of `POST /sync/ratings`, `/sync/ratings/remove`, and the
/// `/users/hidden/{section}/remove` endpoints. Empty collections are
/// omitted from the serialized JSON.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub movies: Vec<SyncEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shows: Vec<SyncEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub seasons: Vec<SyncEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<SyncEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub ids: Ids,
}

impl SyncRequest {
    /// Build a request placing each item into its kind's collection.
    pub fn new(items: impl IntoIterator<Item = SyncItem>, rating: Option<u8>) -> Self {
        let mut request = Self::default();
        for item in items {
            let entry = SyncEntry {
                rating,
                ids: Ids::from_trakt(item.trakt_id()),
            };
            match item {
                SyncItem::Movie(_) => request.movies.push(entry),
                SyncItem::Show(_) => request.shows.push(entry),
                SyncItem::Season(_) => request.seasons.push(entry),
                SyncItem::Episode(_) => request.episodes.push(entry),
            }
        }
        request
    }

    pub fn single(item: SyncItem, rating: Option<u8>) -> Self {
        Self::new([item], rating)
    }
}

// ── Movies ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Movie {
    pub title: String,
    pub year: Option<u16>,
    #[serde(default)]
    pub ids: Ids,
    pub overview: Option<String>,
    pub released: Option<String>,
    pub runtime: Option<u32>,
    pub genres: Option<Vec<String>>,
    pub rating: Option<f32>,
    pub votes: Option<u64>,
    pub trailer: Option<String>,
    pub homepage: Option<String>,
}

/// `GET /movies/trending` wraps each movie with its live watcher count.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendingMovie {
    pub watchers: Option<u64>,
    pub movie: Movie,
}

/// `GET /movies/anticipated` wraps each movie with its list count.
#[derive(Debug, Clone, Deserialize)]
pub struct AnticipatedMovie {
    pub list_count: Option<u64>,
    pub movie: Movie,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_show_ratings() {
        let json = r#"[
            {
                "rated_at": "2024-03-10T18:45:00.000Z",
                "rating": 9,
                "type": "show",
                "show": {
                    "title": "Severance",
                    "year": 2022,
                    "ids": { "trakt": 158532, "slug": "severance", "tmdb": 95396 }
                }
            },
            {
                "rating": 7,
                "type": "show",
                "show": { "title": "Broken", "ids": {} }
            }
        ]"#;

        let entries: Vec<RatingEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.rating, 9);
        assert_eq!(first.show.as_ref().unwrap().ids.trakt, Some(158532));
        assert!(first.rated_at.is_some());

        // Second entry is malformed: no rated_at, no trakt id.
        let second = &entries[1];
        assert!(second.rated_at.is_none());
        assert!(second.show.as_ref().unwrap().ids.trakt.is_none());
    }

    #[test]
    fn test_deserialize_episode_rating() {
        let json = r#"{
            "rated_at": "2024-01-02T08:00:00.000Z",
            "rating": 10,
            "type": "episode",
            "episode": {
                "season": 1,
                "number": 9,
                "title": "The We We Are",
                "ids": { "trakt": 4358516 }
            },
            "show": { "title": "Severance", "ids": { "trakt": 158532 } }
        }"#;

        let entry: RatingEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.episode.as_ref().unwrap().ids.trakt, Some(4358516));
        assert_eq!(entry.episode.as_ref().unwrap().number, Some(9));
        assert!(entry.season.is_none());
    }

    #[test]
    fn test_sync_request_shape() {
        let request = SyncRequest::single(SyncItem::Show(158532), Some(9));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "shows": [ { "rating": 9, "ids": { "trakt": 158532 } } ]
            })
        );
    }

    #[test]
    fn test_sync_request_groups_by_kind() {
        let request = SyncRequest::new(
            [
                SyncItem::Show(1),
                SyncItem::Season(2),
                SyncItem::Episode(3),
                SyncItem::Show(4),
            ],
            None,
        );
        assert_eq!(request.shows.len(), 2);
        assert_eq!(request.seasons.len(), 1);
        assert_eq!(request.episodes.len(), 1);
        assert!(request.movies.is_empty());
        assert!(request.shows[0].rating.is_none());
    }

    #[test]
    fn test_deserialize_trending_movies() {
        let json = r#"[
            {
                "watchers": 205,
                "movie": {
                    "title": "Dune: Part Two",
                    "year": 2024,
                    "ids": { "trakt": 438207, "slug": "dune-part-two-2024" },
                    "runtime": 167,
                    "genres": ["science-fiction", "adventure"]
                }
            }
        ]"#;

        let trending: Vec<TrendingMovie> = serde_json::from_str(json).unwrap();
        assert_eq!(trending.len(), 1);
        assert_eq!(trending[0].watchers, Some(205));
        assert_eq!(trending[0].movie.ids.trakt, Some(438207));
        assert_eq!(trending[0].movie.runtime, Some(167));
    }

    #[test]
    fn test_deserialize_minimal_movie() {
        let json = r#"{ "title": "Test" }"#;
        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.title, "Test");
        assert!(movie.ids.trakt.is_none());
        assert!(movie.genres.is_none());
    }
}
