use std::sync::Arc;

use storage::{ProgressStore, Storage};
use tutor_core::ContentGraph;

use crate::Clock;
use crate::error::AppServicesError;
use crate::onboarding_service::OnboardingService;
use crate::path_service::LearningPathService;
use crate::progress_service::ProgressService;
use crate::sessions::LessonFlowService;

/// Assembles app-facing services over one shared `ProgressStore`.
#[derive(Debug, Clone)]
pub struct AppServices {
    catalog: Arc<ContentGraph>,
    progress: Arc<ProgressService>,
    paths: Arc<LearningPathService>,
    onboarding: Arc<OnboardingService>,
    lessons: Arc<LessonFlowService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        catalog: ContentGraph,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, catalog))
    }

    /// Build services over a throwaway in-memory backend.
    #[must_use]
    pub fn in_memory(clock: Clock, catalog: ContentGraph) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, catalog)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, catalog: ContentGraph) -> Self {
        let catalog = Arc::new(catalog);
        let store = ProgressStore::new(storage, clock);

        let progress = Arc::new(ProgressService::new(store.clone(), Arc::clone(&catalog)));
        let paths = Arc::new(LearningPathService::new(store.clone(), Arc::clone(&catalog)));
        let onboarding = Arc::new(OnboardingService::new(store, Arc::clone(&catalog)));
        let lessons = Arc::new(LessonFlowService::new(
            Arc::clone(&catalog),
            Arc::clone(&progress),
        ));

        Self {
            catalog,
            progress,
            paths,
            onboarding,
            lessons,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<ContentGraph> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn paths(&self) -> Arc<LearningPathService> {
        Arc::clone(&self.paths)
    }

    #[must_use]
    pub fn onboarding(&self) -> Arc<OnboardingService> {
        Arc::clone(&self.onboarding)
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonFlowService> {
        Arc::clone(&self.lessons)
    }
}
