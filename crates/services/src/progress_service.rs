use std::sync::Arc;

use storage::{ProgressChange, ProgressStore};
use tokio::sync::broadcast;
use tracing::{debug, info};
use tutor_core::model::{LearnerProgress, LessonId, ProgressPatch, QuizId, SyncStatus};
use tutor_core::progression::{LessonOutcome, QuizScoreOutcome, XpAward};
use tutor_core::{Clock, ContentGraph, GatingResolver, ProgressionEngine};

/// Learner-facing commands and queries over the persisted record.
///
/// Every command reads the current record, lets `ProgressionEngine` decide
/// the change, and persists it as one write.
#[derive(Debug, Clone)]
pub struct ProgressService {
    store: ProgressStore,
    catalog: Arc<ContentGraph>,
}

impl ProgressService {
    #[must_use]
    pub fn new(store: ProgressStore, catalog: Arc<ContentGraph>) -> Self {
        Self { store, catalog }
    }

    #[must_use]
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    #[must_use]
    pub fn catalog(&self) -> &ContentGraph {
        &self.catalog
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.store.clock()
    }

    fn engine(&self) -> ProgressionEngine {
        ProgressionEngine::on(self.store.clock().today())
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    pub async fn progress(&self) -> LearnerProgress {
        self.store.read().await
    }

    pub async fn is_lesson_completed(&self, lesson_id: &str) -> bool {
        self.store.read().await.is_lesson_completed(lesson_id)
    }

    /// Best stored percent; `None` when the quiz was never taken.
    pub async fn quiz_score(&self, quiz_id: &str) -> Option<u8> {
        self.store.read().await.quiz_score(quiz_id)
    }

    pub async fn sync_status(&self) -> SyncStatus {
        self.store.sync_status().await
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressChange> {
        self.store.subscribe()
    }

    //
    // ─── COMMANDS ──────────────────────────────────────────────────────────────
    //

    /// Award XP and advance the streak. The award carries the new total.
    pub async fn add_xp(&self, amount: u32) -> XpAward {
        let current = self.store.read().await;
        let award = self.engine().add_xp(&current, amount);
        self.store.write(award.patch()).await;
        debug!(
            amount,
            xp = award.xp,
            streak = award.activity.streak,
            change = ?award.streak_change,
            "xp awarded"
        );
        award
    }

    /// Mark a lesson complete and award its XP. Repeat calls are no-ops.
    ///
    /// A newly completed lesson also refreshes the cached percent of its unit.
    pub async fn complete_lesson(&self, lesson_id: &LessonId, xp_reward: u32) -> LessonOutcome {
        let current = self.store.read().await;
        let outcome = self.engine().complete_lesson(&current, lesson_id, xp_reward);

        let LessonOutcome::Completed { award, patch } = &outcome else {
            debug!(lesson = %lesson_id, "lesson already completed");
            return outcome;
        };

        let mut patch = patch.clone();
        if let (Some(unit), Some(completed)) = (
            self.catalog.unit_of_lesson(lesson_id.as_str()),
            patch.completed_lessons.as_ref(),
        ) {
            let percent = GatingResolver::new(&self.catalog, completed)
                .unit_progress(unit.id.as_str())
                .percent();
            let mut units = current.units_progress().clone();
            units.insert(unit.id.clone(), percent);
            patch = patch.with_units_progress(units);
        }

        self.store.write(patch).await;
        info!(
            lesson = %lesson_id,
            xp = award.xp,
            streak = award.activity.streak,
            "lesson completed"
        );
        outcome
    }

    /// Record a quiz percentage and award XP for it.
    ///
    /// The stored best only moves up; XP is awarded on every submission.
    pub async fn save_quiz_score(&self, quiz_id: &QuizId, percent: u32) -> QuizScoreOutcome {
        let current = self.store.read().await;
        let outcome = self.engine().record_quiz_score(&current, quiz_id, percent);
        self.store.write(outcome.patch.clone()).await;
        debug!(
            quiz = %quiz_id,
            percent = outcome.percent,
            best = outcome.best,
            improved = outcome.improved,
            xp = outcome.award.xp,
            "quiz score recorded"
        );
        outcome
    }

    /// Apply an arbitrary patch without lowering xp, dropping completed
    /// lessons or lowering a quiz best.
    pub async fn update_progress(&self, patch: ProgressPatch) -> LearnerProgress {
        let current = self.store.read().await;
        self.store.write(patch.preserving(&current)).await
    }

    pub async fn mark_synced(&self, is_online: bool) -> SyncStatus {
        let status = self.store.mark_synced(is_online).await;
        info!(is_online, "progress marked synced");
        status
    }

    pub async fn set_online(&self, is_online: bool) -> SyncStatus {
        self.store.set_online(is_online).await
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use storage::Storage;
    use tutor_core::progression::StreakChange;
    use tutor_core::time::fixed_clock;

    fn service_with_clock(clock: Clock) -> ProgressService {
        let storage = Storage::in_memory();
        let catalog = Arc::new(ContentGraph::builtin().unwrap());
        ProgressService::new(ProgressStore::new(&storage, clock), catalog)
    }

    fn service() -> ProgressService {
        service_with_clock(fixed_clock())
    }

    #[tokio::test]
    async fn fresh_learner_first_award_keeps_streak() {
        let svc = service();
        let award = svc.add_xp(15).await;

        assert_eq!(award.xp, 15);
        assert_eq!(award.streak_change, StreakChange::Unchanged);
        let progress = svc.progress().await;
        assert_eq!(progress.xp(), 15);
        assert_eq!(progress.streak(), 0);
    }

    #[tokio::test]
    async fn same_day_awards_accumulate_without_extra_streak() {
        let svc = service();
        svc.update_progress(ProgressPatch::new().with_activity(
            tutor_core::model::ActivityStamp::new(4, fixed_clock().yesterday().unwrap()),
        ))
        .await;

        svc.add_xp(10).await;
        svc.add_xp(10).await;
        let progress = svc.progress().await;
        assert_eq!(progress.xp(), 20);
        assert_eq!(progress.streak(), 5);
        assert_eq!(progress.last_active_date(), fixed_clock().today());
    }

    #[tokio::test]
    async fn gap_in_activity_restarts_streak() {
        let storage = Storage::in_memory();
        let catalog = Arc::new(ContentGraph::builtin().unwrap());
        let mut clock = fixed_clock();
        let first_day = ProgressService::new(
            ProgressStore::new(&storage, clock),
            Arc::clone(&catalog),
        );
        first_day.add_xp(5).await;

        clock.advance_days(3);
        let later = ProgressService::new(ProgressStore::new(&storage, clock), catalog);
        let award = later.add_xp(5).await;
        assert_eq!(award.streak_change, StreakChange::Restarted);
        assert_eq!(award.activity.streak, 1);
        assert_eq!(award.xp, 10);
    }

    #[tokio::test]
    async fn completing_twice_awards_once() {
        let svc = service();
        let lesson = LessonId::new("algebra-1-1");

        assert!(svc.complete_lesson(&lesson, 15).await.is_new());
        assert!(!svc.complete_lesson(&lesson, 15).await.is_new());

        let progress = svc.progress().await;
        assert_eq!(progress.xp(), 15);
        assert_eq!(progress.completed_lessons().len(), 1);
    }

    #[tokio::test]
    async fn completion_refreshes_unit_percent() {
        let svc = service();
        svc.complete_lesson(&LessonId::new("algebra-1-1"), 15).await;

        let progress = svc.progress().await;
        let unit = progress
            .units_progress()
            .get("math-algebra-1")
            .copied()
            .unwrap();
        let total = svc.catalog().unit_lesson_total("math-algebra-1");
        assert_eq!(usize::from(unit), 100 / total);
    }

    #[tokio::test]
    async fn quiz_best_only_moves_up_but_xp_always_awarded() {
        let svc = service();
        let quiz = QuizId::new("quiz-algebra-1-1");

        svc.save_quiz_score(&quiz, 60).await;
        let second = svc.save_quiz_score(&quiz, 40).await;
        assert!(!second.improved);
        assert_eq!(svc.quiz_score(quiz.as_str()).await, Some(60));
        assert_eq!(svc.progress().await.xp(), 30 + 20);

        let third = svc.save_quiz_score(&quiz, 90).await;
        assert!(third.improved);
        assert_eq!(svc.quiz_score(quiz.as_str()).await, Some(90));
    }

    #[tokio::test]
    async fn unknown_quiz_has_no_score() {
        let svc = service();
        assert_eq!(svc.quiz_score("nope").await, None);
        assert!(!svc.is_lesson_completed("nope").await);
    }

    #[tokio::test]
    async fn update_progress_cannot_regress() {
        let svc = service();
        svc.complete_lesson(&LessonId::new("algebra-1-1"), 15).await;
        svc.save_quiz_score(&QuizId::new("quiz-algebra-1-1"), 80).await;

        let updated = svc
            .update_progress(
                ProgressPatch::new()
                    .with_xp(0)
                    .with_completed_lessons(Default::default())
                    .with_quiz_scores(BTreeMap::from([(QuizId::new("quiz-algebra-1-1"), 10)]))
                    .with_language("hi"),
            )
            .await;

        assert_eq!(updated.xp(), 15 + 40);
        assert!(updated.is_lesson_completed("algebra-1-1"));
        assert_eq!(updated.quiz_score("quiz-algebra-1-1"), Some(80));
        assert_eq!(updated.current_language(), "hi");
    }

    #[tokio::test]
    async fn commands_notify_subscribers_and_flag_sync() {
        let svc = service();
        let mut rx = svc.subscribe();
        svc.add_xp(1).await;

        assert_eq!(rx.recv().await.unwrap(), ProgressChange::Progress);
        assert!(svc.sync_status().await.pending_changes);
        assert!(!svc.mark_synced(true).await.pending_changes);
    }
}
