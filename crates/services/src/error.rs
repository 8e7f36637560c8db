//! Shared error types for the services crate.

use thiserror::Error;

use storage::sqlite::SqliteInitError;
use tutor_core::model::{LessonId, QuizId, SubjectId};

/// Misuse of a `QuizSession`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz {0} has no questions")]
    Empty(QuizId),
    #[error("quiz already finished")]
    Finished,
    #[error("answer {index} is out of range for a question with {options} options")]
    OptionOutOfRange { index: usize, options: usize },
    #[error("current question has not been answered")]
    Unanswered,
}

/// Misuse of a `LessonSession`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson {0} has no content")]
    EmptyContent(LessonId),
    #[error("quiz {quiz} belongs to lesson {owner}, not {lesson}")]
    QuizMismatch {
        quiz: QuizId,
        owner: LessonId,
        lesson: LessonId,
    },
    #[error("lesson session already completed")]
    Completed,
    #[error("lesson session is not in its quiz")]
    NotInQuiz,
    #[error("lesson content cannot be revisited during the quiz")]
    InQuiz,
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// Errors emitted by `LessonFlowService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonFlowError {
    #[error("unknown lesson {0}")]
    UnknownLesson(String),
    #[error("lesson {0} is locked until the previous lesson is completed")]
    Locked(LessonId),
    #[error(transparent)]
    Lesson(#[from] LessonError),
}

/// Errors emitted by `OnboardingService`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OnboardingError {
    #[error("unknown language {0}")]
    UnknownLanguage(String),
    #[error("unknown subject {0}")]
    UnknownSubject(SubjectId),
    #[error("at least one subject must be selected")]
    NoSubjects,
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
