//! Pure conversions between the Trakt wire types and the local records.

use chrono::{DateTime, Utc};

use shiori_api::types::{RatingEntry, SyncItem};
use shiori_core::models::{MediaKind, MediaRef, Rating};

/// Convert a remote rating entry into a local record.
///
/// Entries missing the rating timestamp or the Trakt id of their kind are
/// dropped rather than stored.
pub fn rating_from_entry(entry: &RatingEntry, kind: MediaKind) -> Option<Rating> {
    let rated_at = entry.rated_at.as_deref()?;
    let rated_at = DateTime::parse_from_rfc3339(rated_at)
        .ok()?
        .with_timezone(&Utc);
    let trakt_id = match kind {
        MediaKind::Show => entry.show.as_ref()?.ids.trakt?,
        MediaKind::Season => entry.season.as_ref()?.ids.trakt?,
        MediaKind::Episode => entry.episode.as_ref()?.ids.trakt?,
    };
    Some(Rating {
        trakt_id,
        kind,
        rating: entry.rating,
        rated_at,
    })
}

/// Build the local record for a user-initiated rating, stamped now.
pub fn rating_now(item: MediaRef, rating: u8) -> Rating {
    Rating {
        trakt_id: item.trakt_id,
        kind: item.kind,
        rating,
        rated_at: Utc::now(),
    }
}

/// Convert a media reference into its sync-request item.
pub fn sync_item(item: MediaRef) -> SyncItem {
    match item.kind {
        MediaKind::Show => SyncItem::Show(item.trakt_id),
        MediaKind::Season => SyncItem::Season(item.trakt_id),
        MediaKind::Episode => SyncItem::Episode(item.trakt_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiori_api::types::{Ids, ShowSummary};

    fn show_entry(trakt_id: Option<i64>, rated_at: Option<&str>) -> RatingEntry {
        RatingEntry {
            rated_at: rated_at.map(Into::into),
            rating: 8,
            item_type: Some("show".into()),
            show: Some(ShowSummary {
                ids: trakt_id.map(Ids::from_trakt).unwrap_or_default(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_maps_complete_entry() {
        let entry = show_entry(Some(158532), Some("2024-03-10T18:45:00.000Z"));
        let rating = rating_from_entry(&entry, MediaKind::Show).unwrap();
        assert_eq!(rating.trakt_id, 158532);
        assert_eq!(rating.kind, MediaKind::Show);
        assert_eq!(rating.rating, 8);
    }

    #[test]
    fn test_skips_entry_without_timestamp() {
        let entry = show_entry(Some(158532), None);
        assert!(rating_from_entry(&entry, MediaKind::Show).is_none());
    }

    #[test]
    fn test_skips_entry_without_trakt_id() {
        let entry = show_entry(None, Some("2024-03-10T18:45:00.000Z"));
        assert!(rating_from_entry(&entry, MediaKind::Show).is_none());
    }

    #[test]
    fn test_skips_entry_missing_its_kind_object() {
        // A show entry cannot satisfy a season pipeline.
        let entry = show_entry(Some(158532), Some("2024-03-10T18:45:00.000Z"));
        assert!(rating_from_entry(&entry, MediaKind::Season).is_none());
    }

    #[test]
    fn test_skips_unparseable_timestamp() {
        let entry = show_entry(Some(158532), Some("not-a-date"));
        assert!(rating_from_entry(&entry, MediaKind::Show).is_none());
    }

    #[test]
    fn test_rating_now_stamps_timestamp() {
        let rating = rating_now(MediaRef::episode(42), 7);
        assert_eq!(rating.trakt_id, 42);
        assert_eq!(rating.kind, MediaKind::Episode);
        assert_eq!(rating.rating, 7);
        assert!(rating.rated_at <= Utc::now());
    }

    #[test]
    fn test_sync_item_carries_kind() {
        assert_eq!(sync_item(MediaRef::show(1)), SyncItem::Show(1));
        assert_eq!(sync_item(MediaRef::season(2)), SyncItem::Season(2));
        assert_eq!(sync_item(MediaRef::episode(3)), SyncItem::Episode(3));
    }
}
