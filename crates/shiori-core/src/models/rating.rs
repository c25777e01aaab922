use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::MediaKind;

/// A user rating mirrored from Trakt.
///
/// At most one live record exists per `(trakt_id, kind)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub trakt_id: i64,
    pub kind: MediaKind,
    /// 1-10, Trakt's rating scale.
    pub rating: u8,
    pub rated_at: DateTime<Utc>,
}
