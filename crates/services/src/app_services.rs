use std::sync::Arc;

use portal_core::PortalConfig;
use storage::catalog;
use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::app_state_service::AppStateService;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::feedback_service::FeedbackService;
use crate::player::CoursePlayerService;
use crate::portal::PortalService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    config: PortalConfig,
    storage: Storage,
    catalog: Arc<CatalogService>,
    feedback: Arc<FeedbackService>,
    players: Arc<CoursePlayerService>,
    app_state: Arc<AppStateService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, seeding the catalog into
    /// an empty database.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or seeding fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: PortalConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        if storage.courses.list_courses().await?.is_empty() {
            info!("empty database, seeding the built-in catalog");
            catalog::seed(&storage).await?;
        }
        Ok(Self::from_storage(storage, clock, config))
    }

    /// Build services over the built-in catalog held in memory.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the catalog cannot be loaded.
    pub async fn new_in_memory(clock: Clock, config: PortalConfig) -> Result<Self, AppServicesError> {
        let storage = Storage::seeded_in_memory().await?;
        Ok(Self::from_storage(storage, clock, config))
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, config: PortalConfig) -> Self {
        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&storage.courses),
            Arc::clone(&storage.employees),
        ));
        let feedback = Arc::new(FeedbackService::new(
            clock,
            config.manager_name(),
            Arc::clone(&storage.feedback),
            Arc::clone(&storage.employees),
            Arc::clone(&storage.courses),
        ));
        let players = Arc::new(CoursePlayerService::new(
            clock,
            config.completion_delay(),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.employees),
        ));
        let app_state = Arc::new(AppStateService::new(Arc::clone(&storage.app_state)));

        Self {
            config,
            storage,
            catalog,
            feedback,
            players,
            app_state,
        }
    }

    /// Restore the portal shell from persisted state.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Portal` if the state store cannot be read.
    pub async fn portal(&self) -> Result<PortalService, AppServicesError> {
        Ok(PortalService::hydrate(
            self.config.clone(),
            self.app_state.as_ref().clone(),
            Arc::clone(&self.storage.employees),
            self.catalog.as_ref().clone(),
            self.players.as_ref().clone(),
            self.feedback.as_ref().clone(),
        )
        .await?)
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn feedback(&self) -> Arc<FeedbackService> {
        Arc::clone(&self.feedback)
    }

    #[must_use]
    pub fn players(&self) -> Arc<CoursePlayerService> {
        Arc::clone(&self.players)
    }

    #[must_use]
    pub fn app_state(&self) -> Arc<AppStateService> {
        Arc::clone(&self.app_state)
    }
}
