use std::sync::Arc;

use tracing::info;
use tutor_core::model::LearnerProgress;
use tutor_core::progression::{LessonOutcome, QuizScoreOutcome};
use tutor_core::{ContentGraph, GatingResolver};

use super::lesson::{LessonCompletion, LessonSession, LessonStep};
use super::quiz::AnswerOutcome;
use crate::error::LessonFlowError;
use crate::progress_service::ProgressService;

/// What a finished lesson changed in the learner record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub completion: LessonCompletion,
    pub quiz: Option<QuizScoreOutcome>,
    pub lesson: LessonOutcome,
    pub progress: LearnerProgress,
}

impl CompletionReport {
    /// XP granted by this completion, quiz included.
    #[must_use]
    pub fn earned_xp(&self) -> u32 {
        let quiz = self.quiz.as_ref().map_or(0, |q| q.award.amount);
        let lesson = self.lesson.award().map_or(0, |a| a.amount);
        quiz.saturating_add(lesson)
    }
}

/// Result of advancing a lesson through the flow service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonAdvance {
    pub step: LessonStep,
    /// Present only on the step that completed the lesson.
    pub report: Option<CompletionReport>,
}

/// Starts lesson sessions and persists their completion.
#[derive(Debug, Clone)]
pub struct LessonFlowService {
    catalog: Arc<ContentGraph>,
    progress: Arc<ProgressService>,
}

impl LessonFlowService {
    #[must_use]
    pub fn new(catalog: Arc<ContentGraph>, progress: Arc<ProgressService>) -> Self {
        Self { catalog, progress }
    }

    /// Open a session for a lesson the learner has unlocked.
    ///
    /// Completed lessons can be replayed; completing them again awards nothing.
    ///
    /// # Errors
    ///
    /// Returns `LessonFlowError::UnknownLesson` or `LessonFlowError::Locked`,
    /// or a `LessonError` if the catalog entry cannot be walked.
    pub async fn start_lesson(&self, lesson_id: &str) -> Result<LessonSession, LessonFlowError> {
        let lesson = self
            .catalog
            .lesson(lesson_id)
            .ok_or_else(|| LessonFlowError::UnknownLesson(lesson_id.to_owned()))?;

        let progress = self.progress.progress().await;
        if GatingResolver::new(&self.catalog, progress.completed_lessons())
            .is_lesson_locked(lesson_id)
        {
            return Err(LessonFlowError::Locked(lesson.id.clone()));
        }

        let quiz = self.catalog.quiz_by_lesson(lesson_id).cloned();
        Ok(LessonSession::new(lesson.clone(), quiz)?)
    }

    /// Advance the session and, when it completes, record the quiz score and
    /// then the lesson completion.
    ///
    /// # Errors
    ///
    /// Returns `LessonFlowError::Lesson` when the session rejects the step.
    pub async fn advance(
        &self,
        session: &mut LessonSession,
    ) -> Result<LessonAdvance, LessonFlowError> {
        let step = session.advance()?;
        let report = match &step {
            LessonStep::Completed(completion) => Some(self.apply(completion.clone()).await),
            _ => None,
        };
        Ok(LessonAdvance { step, report })
    }

    /// # Errors
    ///
    /// Returns `LessonFlowError::Lesson` when the session is not in its quiz
    /// or the option is out of range.
    pub fn select_answer(
        &self,
        session: &mut LessonSession,
        index: usize,
    ) -> Result<AnswerOutcome, LessonFlowError> {
        Ok(session.select_answer(index)?)
    }

    async fn apply(&self, completion: LessonCompletion) -> CompletionReport {
        let quiz = match &completion.quiz {
            Some(result) => Some(
                self.progress
                    .save_quiz_score(&result.quiz_id, u32::from(result.percent()))
                    .await,
            ),
            None => None,
        };
        let lesson = self
            .progress
            .complete_lesson(&completion.lesson_id, completion.xp_reward)
            .await;
        let progress = self.progress.progress().await;

        info!(
            lesson = %completion.lesson_id,
            first_time = lesson.is_new(),
            quiz_percent = completion.quiz.as_ref().map(|q| q.percent()),
            xp = progress.xp(),
            "lesson session finished"
        );

        CompletionReport {
            completion,
            quiz,
            lesson,
            progress,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LessonError;
    use storage::{ProgressStore, Storage};
    use tutor_core::model::LessonId;
    use tutor_core::time::fixed_clock;

    fn flow() -> (LessonFlowService, Arc<ProgressService>) {
        let catalog = Arc::new(ContentGraph::builtin().unwrap());
        let store = ProgressStore::new(&Storage::in_memory(), fixed_clock());
        let progress = Arc::new(ProgressService::new(store, Arc::clone(&catalog)));
        (LessonFlowService::new(catalog, Arc::clone(&progress)), progress)
    }

    async fn run_to_end(
        flow: &LessonFlowService,
        session: &mut LessonSession,
        pick: impl Fn(usize) -> usize,
    ) -> CompletionReport {
        loop {
            if let Some(question) = session.quiz_session().and_then(|q| q.current_question()) {
                let correct = question.correct_index;
                flow.select_answer(session, pick(correct)).unwrap();
            }
            if let Some(report) = flow.advance(session).await.unwrap().report {
                return report;
            }
        }
    }

    #[tokio::test]
    async fn unknown_and_locked_lessons_are_refused() {
        let (flow, _) = flow();
        assert!(matches!(
            flow.start_lesson("nope").await,
            Err(LessonFlowError::UnknownLesson(_))
        ));
        assert!(matches!(
            flow.start_lesson("algebra-1-2").await,
            Err(LessonFlowError::Locked(id)) if id == LessonId::new("algebra-1-2")
        ));
    }

    #[tokio::test]
    async fn quiz_score_is_recorded_before_completion() {
        let (flow, progress) = flow();
        let mut session = flow.start_lesson("algebra-1-1").await.unwrap();
        assert!(session.has_quiz());

        let report = run_to_end(&flow, &mut session, |correct| correct).await;

        let quiz = report.quiz.as_ref().unwrap();
        assert_eq!(quiz.percent, 100);
        assert_eq!(quiz.award.amount, 50);
        assert!(report.lesson.is_new());
        assert_eq!(report.earned_xp(), 50 + 15);
        assert_eq!(report.progress.xp(), 65);
        assert_eq!(progress.quiz_score("quiz-algebra-1-1").await, Some(100));
        assert!(progress.is_lesson_completed("algebra-1-1").await);

        assert!(flow.start_lesson("algebra-1-2").await.is_ok());
    }

    #[tokio::test]
    async fn lesson_without_quiz_completes_directly() {
        let (flow, _) = flow();
        let mut first = flow.start_lesson("algebra-1-1").await.unwrap();
        run_to_end(&flow, &mut first, |correct| correct).await;

        let mut second = flow.start_lesson("algebra-1-2").await.unwrap();
        assert!(!second.has_quiz());
        let report = run_to_end(&flow, &mut second, |correct| correct).await;

        assert!(report.quiz.is_none());
        assert_eq!(report.earned_xp(), 15);
        assert!(second.is_complete());
        assert!(matches!(
            flow.advance(&mut second).await,
            Err(LessonFlowError::Lesson(LessonError::Completed))
        ));
    }

    #[tokio::test]
    async fn replaying_a_lesson_awards_only_quiz_xp() {
        let (flow, progress) = flow();
        let mut session = flow.start_lesson("algebra-1-1").await.unwrap();
        run_to_end(&flow, &mut session, |correct| correct).await;
        let xp_after_first = progress.progress().await.xp();

        let mut replay = flow.start_lesson("algebra-1-1").await.unwrap();
        let report = run_to_end(&flow, &mut replay, |correct| (correct + 1) % 4).await;

        assert!(!report.lesson.is_new());
        let quiz = report.quiz.unwrap();
        assert_eq!(quiz.percent, 0);
        assert!(!quiz.improved);
        assert_eq!(report.progress.xp(), xp_after_first);
        assert_eq!(progress.quiz_score("quiz-algebra-1-1").await, Some(100));
    }
}
