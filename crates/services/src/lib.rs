#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod onboarding_service;
pub mod path_service;
pub mod progress_service;
pub mod sessions;

pub use tutor_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, LessonError, LessonFlowError, OnboardingError, QuizError};
pub use onboarding_service::OnboardingService;
pub use path_service::{Dashboard, LearningPathService, LessonNode, SubjectSummary, UnitNode};
pub use progress_service::ProgressService;
pub use sessions::{
    CompletionReport, LessonAdvance, LessonFlowService, LessonSession, LessonStep, QuizSession,
};
