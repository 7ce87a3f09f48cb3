use std::sync::Arc;

use portal_core::model::AppState;
use storage::repository::AppStateRepository;
use tracing::warn;

use crate::error::AppStateServiceError;

/// Loads and saves the portal's routing/session state.
#[derive(Clone)]
pub struct AppStateService {
    repo: Arc<dyn AppStateRepository>,
}

impl AppStateService {
    #[must_use]
    pub fn new(repo: Arc<dyn AppStateRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted state, falling back to defaults for unreadable entries.
    ///
    /// # Errors
    ///
    /// Returns `AppStateServiceError` on storage failures.
    pub async fn hydrate(&self) -> Result<AppState, AppStateServiceError> {
        let entries = self.repo.load_entries().await?;
        let (state, issues) = AppState::from_entries(&entries);
        for issue in issues {
            warn!(%issue, "ignoring stored app state entry");
        }
        Ok(state)
    }

    /// Write every key of `state` in one batch, removing the ones that are unset.
    ///
    /// # Errors
    ///
    /// Returns `AppStateServiceError` if the state cannot be encoded or stored.
    pub async fn persist(&self, state: &AppState) -> Result<(), AppStateServiceError> {
        let entries = state.to_entries()?;
        self.repo.apply_entries(&entries).await?;
        Ok(())
    }
}
