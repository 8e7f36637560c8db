mod ids;
mod progress;
mod sync;

pub use ids::{LessonId, ParseIdError, QuestionId, QuizId, SubjectId, UnitId};
pub use progress::{ActivityStamp, DEFAULT_LANGUAGE, LearnerProgress, MAX_PERCENT, ProgressPatch};
pub use sync::SyncStatus;
