use std::sync::Arc;

use storage::ProgressStore;
use tracing::info;
use tutor_core::ContentGraph;
use tutor_core::model::{LearnerProgress, ProgressPatch, SubjectId};

use crate::error::OnboardingError;

/// First-run setup: language and subject selection, plus full reset.
#[derive(Debug, Clone)]
pub struct OnboardingService {
    store: ProgressStore,
    catalog: Arc<ContentGraph>,
}

impl OnboardingService {
    #[must_use]
    pub fn new(store: ProgressStore, catalog: Arc<ContentGraph>) -> Self {
        Self { store, catalog }
    }

    pub async fn is_complete(&self) -> bool {
        self.store.is_onboarding_complete().await
    }

    /// Store the learner's language and subjects and set the onboarding flag.
    ///
    /// # Errors
    ///
    /// Returns `OnboardingError` if the language or a subject is not in the
    /// catalog, or if no subject was chosen. Nothing is written in that case.
    pub async fn complete(
        &self,
        language: &str,
        subjects: &[SubjectId],
    ) -> Result<LearnerProgress, OnboardingError> {
        if self.catalog.language(language).is_none() {
            return Err(OnboardingError::UnknownLanguage(language.to_owned()));
        }
        if subjects.is_empty() {
            return Err(OnboardingError::NoSubjects);
        }
        if let Some(unknown) = subjects
            .iter()
            .find(|id| self.catalog.subject(id.as_str()).is_none())
        {
            return Err(OnboardingError::UnknownSubject(unknown.clone()));
        }

        let progress = self
            .store
            .write(
                ProgressPatch::new()
                    .with_language(language)
                    .with_selected_subjects(subjects.iter().cloned()),
            )
            .await;
        self.store.complete_onboarding().await;
        info!(language, subjects = subjects.len(), "onboarding completed");
        Ok(progress)
    }

    /// Clear the learner record, sync status and onboarding flag.
    pub async fn reset(&self) {
        self.store.reset_all().await;
        info!("learner data reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::Storage;
    use tutor_core::time::fixed_clock;

    fn service() -> OnboardingService {
        OnboardingService::new(
            ProgressStore::new(&Storage::in_memory(), fixed_clock()),
            Arc::new(ContentGraph::builtin().unwrap()),
        )
    }

    #[tokio::test]
    async fn complete_stores_choices_and_flag() {
        let svc = service();
        assert!(!svc.is_complete().await);

        let progress = svc
            .complete("hi", &[SubjectId::new("math"), SubjectId::new("physics")])
            .await
            .unwrap();

        assert!(svc.is_complete().await);
        assert_eq!(progress.current_language(), "hi");
        assert_eq!(progress.selected_subjects().len(), 2);
    }

    #[tokio::test]
    async fn rejects_unknown_choices_without_writing() {
        let svc = service();

        assert_eq!(
            svc.complete("xx", &[SubjectId::new("math")]).await,
            Err(OnboardingError::UnknownLanguage("xx".into()))
        );
        assert_eq!(
            svc.complete("en", &[SubjectId::new("astrology")]).await,
            Err(OnboardingError::UnknownSubject(SubjectId::new("astrology")))
        );
        assert_eq!(svc.complete("en", &[]).await, Err(OnboardingError::NoSubjects));
        assert!(!svc.is_complete().await);
    }

    #[tokio::test]
    async fn reset_clears_onboarding() {
        let svc = service();
        svc.complete("en", &[SubjectId::new("math")]).await.unwrap();
        svc.reset().await;

        assert!(!svc.is_complete().await);
        assert!(svc.store.read().await.selected_subjects().is_empty());
    }
}
