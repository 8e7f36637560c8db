use std::fmt;

use tutor_core::catalog::{ContentItem, Lesson, Quiz};
use tutor_core::model::LessonId;

use super::progress::StepProgress;
use super::quiz::{AnswerOutcome, QuizAdvance, QuizResult, QuizSession};
use crate::error::{LessonError, QuizError};

//
// ─── PHASES & EVENTS ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
pub enum LessonPhase {
    Viewing { content_index: usize },
    Quiz(QuizSession),
    Complete,
}

/// Emitted once when a lesson session reaches `Complete`.
///
/// Carries what the progression rules need: the quiz result (if any) is
/// recorded first, then the lesson is completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonCompletion {
    pub lesson_id: LessonId,
    pub xp_reward: u32,
    pub quiz: Option<QuizResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonStep {
    Content { content_index: usize },
    QuizStarted,
    Question { question_index: usize },
    Completed(LessonCompletion),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Walk through a lesson's content, then its quiz when it has one.
///
/// Pure state machine: applying the completion to the learner record is the
/// caller's job.
#[derive(Clone)]
pub struct LessonSession {
    lesson: Lesson,
    quiz: Option<Quiz>,
    phase: LessonPhase,
}

impl LessonSession {
    /// # Errors
    ///
    /// Returns `LessonError` if the lesson has no content, or the quiz is
    /// empty or belongs to another lesson.
    pub fn new(lesson: Lesson, quiz: Option<Quiz>) -> Result<Self, LessonError> {
        if lesson.content.is_empty() {
            return Err(LessonError::EmptyContent(lesson.id));
        }
        if let Some(quiz) = &quiz {
            if quiz.lesson_id != lesson.id {
                return Err(LessonError::QuizMismatch {
                    quiz: quiz.id.clone(),
                    owner: quiz.lesson_id.clone(),
                    lesson: lesson.id,
                });
            }
            if quiz.questions.is_empty() {
                return Err(QuizError::Empty(quiz.id.clone()).into());
            }
        }

        Ok(Self {
            lesson,
            quiz,
            phase: LessonPhase::Viewing { content_index: 0 },
        })
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn has_quiz(&self) -> bool {
        self.quiz.is_some()
    }

    #[must_use]
    pub fn phase(&self) -> &LessonPhase {
        &self.phase
    }

    #[must_use]
    pub fn content_index(&self) -> Option<usize> {
        match self.phase {
            LessonPhase::Viewing { content_index } => Some(content_index),
            _ => None,
        }
    }

    #[must_use]
    pub fn current_content(&self) -> Option<&ContentItem> {
        self.content_index()
            .and_then(|index| self.lesson.content.get(index))
    }

    #[must_use]
    pub fn quiz_session(&self) -> Option<&QuizSession> {
        match &self.phase {
            LessonPhase::Quiz(session) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, LessonPhase::Complete)
    }

    /// Position within the content items; the quiz counts as past the end.
    #[must_use]
    pub fn progress(&self) -> StepProgress {
        let total = self.lesson.content.len();
        match self.phase {
            LessonPhase::Viewing { content_index } => StepProgress {
                position: content_index,
                total,
                is_complete: false,
            },
            LessonPhase::Quiz(_) | LessonPhase::Complete => StepProgress {
                position: total,
                total,
                is_complete: true,
            },
        }
    }

    /// Step back one content item. Stays put on the first item.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InQuiz` once the quiz started, or
    /// `LessonError::Completed` after completion.
    pub fn previous(&mut self) -> Result<usize, LessonError> {
        match self.phase {
            LessonPhase::Viewing { content_index } => {
                let content_index = content_index.saturating_sub(1);
                self.phase = LessonPhase::Viewing { content_index };
                Ok(content_index)
            }
            LessonPhase::Quiz(_) => Err(LessonError::InQuiz),
            LessonPhase::Complete => Err(LessonError::Completed),
        }
    }

    /// Move forward: next content item, into the quiz, to the next question,
    /// or to completion.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::Completed` after completion, or the quiz error
    /// when the current question is unanswered.
    pub fn advance(&mut self) -> Result<LessonStep, LessonError> {
        let last_content = self.lesson.content.len().saturating_sub(1);

        let (step, next_phase) = match &mut self.phase {
            LessonPhase::Viewing { content_index } if *content_index < last_content => {
                let content_index = *content_index + 1;
                (
                    LessonStep::Content { content_index },
                    LessonPhase::Viewing { content_index },
                )
            }
            LessonPhase::Viewing { .. } => match &self.quiz {
                Some(quiz) => (
                    LessonStep::QuizStarted,
                    LessonPhase::Quiz(QuizSession::new(quiz.clone())?),
                ),
                None => (
                    LessonStep::Completed(completion(&self.lesson, None)),
                    LessonPhase::Complete,
                ),
            },
            LessonPhase::Quiz(session) => match session.advance()? {
                QuizAdvance::NextQuestion { question_index } => {
                    return Ok(LessonStep::Question { question_index });
                }
                QuizAdvance::Finished(result) => (
                    LessonStep::Completed(completion(&self.lesson, Some(result))),
                    LessonPhase::Complete,
                ),
            },
            LessonPhase::Complete => return Err(LessonError::Completed),
        };

        self.phase = next_phase;
        Ok(step)
    }

    /// Answer the current quiz question.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::NotInQuiz` outside the quiz, or the quiz error
    /// for an out-of-range option.
    pub fn select_answer(&mut self, index: usize) -> Result<AnswerOutcome, LessonError> {
        match &mut self.phase {
            LessonPhase::Quiz(session) => Ok(session.select_answer(index)?),
            LessonPhase::Complete => Err(LessonError::Completed),
            LessonPhase::Viewing { .. } => Err(LessonError::NotInQuiz),
        }
    }
}

fn completion(lesson: &Lesson, quiz: Option<QuizResult>) -> LessonCompletion {
    LessonCompletion {
        lesson_id: lesson.id.clone(),
        xp_reward: lesson.xp_reward,
        quiz,
    }
}

impl fmt::Debug for LessonSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LessonSession")
            .field("lesson_id", &self.lesson.id)
            .field("content_len", &self.lesson.content.len())
            .field("has_quiz", &self.quiz.is_some())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::catalog::Question;
    use tutor_core::model::{QuestionId, QuizId, UnitId};

    fn lesson(items: usize) -> Lesson {
        Lesson {
            id: LessonId::new("lesson-1"),
            unit_id: UnitId::new("unit-1"),
            title: "Lesson".into(),
            description: String::new(),
            order: 1,
            xp_reward: 15,
            duration: "5 min".into(),
            content: (0..items)
                .map(|i| ContentItem::text(format!("item {i}")))
                .collect(),
        }
    }

    fn quiz(lesson_id: &str) -> Quiz {
        Quiz {
            id: QuizId::new("quiz-1"),
            lesson_id: LessonId::new(lesson_id),
            questions: vec![
                Question {
                    id: QuestionId::new("q1"),
                    prompt: "One?".into(),
                    options: vec!["yes".into(), "no".into()],
                    correct_index: 0,
                    explanation: String::new(),
                },
                Question {
                    id: QuestionId::new("q2"),
                    prompt: "Two?".into(),
                    options: vec!["yes".into(), "no".into()],
                    correct_index: 1,
                    explanation: String::new(),
                },
            ],
        }
    }

    #[test]
    fn lesson_without_quiz_completes_after_last_item() {
        let mut session = LessonSession::new(lesson(2), None).unwrap();

        assert_eq!(
            session.advance().unwrap(),
            LessonStep::Content { content_index: 1 }
        );
        let LessonStep::Completed(done) = session.advance().unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(done.lesson_id, LessonId::new("lesson-1"));
        assert_eq!(done.xp_reward, 15);
        assert!(done.quiz.is_none());
        assert!(session.is_complete());
        assert_eq!(session.advance(), Err(LessonError::Completed));
    }

    #[test]
    fn quiz_runs_after_content_and_reports_result() {
        let mut session = LessonSession::new(lesson(1), Some(quiz("lesson-1"))).unwrap();

        assert_eq!(session.select_answer(0), Err(LessonError::NotInQuiz));
        assert_eq!(session.advance().unwrap(), LessonStep::QuizStarted);
        assert!(session.current_content().is_none());

        assert_eq!(
            session.advance(),
            Err(LessonError::Quiz(QuizError::Unanswered))
        );
        session.select_answer(0).unwrap();
        assert_eq!(
            session.advance().unwrap(),
            LessonStep::Question { question_index: 1 }
        );
        session.select_answer(0).unwrap();

        let LessonStep::Completed(done) = session.advance().unwrap() else {
            panic!("expected completion");
        };
        let result = done.quiz.unwrap();
        assert_eq!((result.score, result.total), (1, 2));
        assert_eq!(result.percent(), 50);
    }

    #[test]
    fn previous_steps_back_but_not_out_of_quiz() {
        let mut session = LessonSession::new(lesson(3), Some(quiz("lesson-1"))).unwrap();
        assert_eq!(session.previous().unwrap(), 0);

        session.advance().unwrap();
        session.advance().unwrap();
        assert_eq!(session.previous().unwrap(), 1);
        assert_eq!(session.current_content().unwrap().body, "item 1");

        session.advance().unwrap();
        session.advance().unwrap();
        assert!(session.quiz_session().is_some());
        assert_eq!(session.previous(), Err(LessonError::InQuiz));
    }

    #[test]
    fn construction_checks_content_and_quiz_owner() {
        assert_eq!(
            LessonSession::new(lesson(0), None).unwrap_err(),
            LessonError::EmptyContent(LessonId::new("lesson-1"))
        );
        assert!(matches!(
            LessonSession::new(lesson(1), Some(quiz("other"))).unwrap_err(),
            LessonError::QuizMismatch { .. }
        ));
    }
}
