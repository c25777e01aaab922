use serde::{Deserialize, Serialize};

/// The kind of item a rating can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Show,
    Season,
    Episode,
}

impl MediaKind {
    pub const ALL: &[MediaKind] = &[Self::Show, Self::Season, Self::Episode];

    /// Database string representation (matches the Trakt `type` field).
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Season => "season",
            Self::Episode => "episode",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "show" => Some(Self::Show),
            "season" => Some(Self::Season),
            "episode" => Some(Self::Episode),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// A reference to a ratable item: the Trakt numeric id plus what it points at.
///
/// Owned by the caller; never persisted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaRef {
    pub trakt_id: i64,
    pub kind: MediaKind,
}

impl MediaRef {
    pub fn new(trakt_id: i64, kind: MediaKind) -> Self {
        Self { trakt_id, kind }
    }

    pub fn show(trakt_id: i64) -> Self {
        Self::new(trakt_id, MediaKind::Show)
    }

    pub fn season(trakt_id: i64) -> Self {
        Self::new(trakt_id, MediaKind::Season)
    }

    pub fn episode(trakt_id: i64) -> Self {
        Self::new(trakt_id, MediaKind::Episode)
    }
}
