use std::sync::Arc;
use std::time::Duration;

use shiori_api::traits::TraktHidden;
use shiori_api::types::{SyncItem, SyncRequest};

use crate::session::UserSession;
use crate::RuntimeError;

/// Settle time the service needs between the two dependent removals.
const TRAKT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveMode {
    Show,
    Movie,
}

/// Removes hidden items from the user's Trakt account.
pub struct RemoveFromTrakt<S> {
    service: Arc<S>,
    session: UserSession,
}

impl<S: TraktHidden> RemoveFromTrakt<S> {
    pub fn new(service: Arc<S>, session: UserSession) -> Self {
        Self { service, session }
    }

    /// Un-hide the given items remotely.
    ///
    /// Shows are removed from both the progress and dropped sections; the
    /// second call waits out a fixed settle delay so the service has
    /// processed the first. Movies only live in the progress section.
    pub async fn remove_hidden(
        &self,
        trakt_ids: &[i64],
        mode: RemoveMode,
    ) -> Result<(), RuntimeError> {
        self.session.check_authorization().await?;

        match mode {
            RemoveMode::Show => {
                let request =
                    SyncRequest::new(trakt_ids.iter().map(|&id| SyncItem::Show(id)), None);
                self.service.remove_hidden(&request).await?;
                tokio::time::sleep(TRAKT_SETTLE_DELAY).await;
                self.service.remove_dropped(&request).await?;
            }
            RemoveMode::Movie => {
                let request =
                    SyncRequest::new(trakt_ids.iter().map(|&id| SyncItem::Movie(id)), None);
                self.service.remove_hidden(&request).await?;
            }
        }
        Ok(())
    }
}
