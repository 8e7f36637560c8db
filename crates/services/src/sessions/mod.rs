mod lesson;
mod progress;
mod quiz;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{LessonError, LessonFlowError, QuizError};
pub use lesson::{LessonCompletion, LessonPhase, LessonSession, LessonStep};
pub use progress::StepProgress;
pub use quiz::{
    AnswerFeedback, AnswerOutcome, PASSING_PERCENT, QuizAdvance, QuizResult, QuizSession,
    QuizState, score_percent,
};
pub use workflow::{CompletionReport, LessonAdvance, LessonFlowService};
