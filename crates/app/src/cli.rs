use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tutor_core::model::{LessonId, QuizId, SubjectId, UnitId};

/// Used when neither `--db` nor `TUTOR_DB_URL` is set.
pub const DEFAULT_DB_URL: &str = "sqlite:tutor.sqlite3?mode=rwc";

/// Command-line arguments for tutor
#[derive(Parser, Debug)]
#[command(name = "tutor")]
#[command(about = "Offline STEM lessons with XP, streaks and gated progression")]
#[command(version)]
pub struct Args {
    /// SQLite URL or database file path
    #[arg(long, global = true, env = "TUTOR_DB_URL", default_value = DEFAULT_DB_URL)]
    pub db: String,

    /// Catalog JSON file (built-in catalog when omitted)
    #[arg(long, global = true, env = "TUTOR_CATALOG")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// XP, streak and per-subject progress
    Progress {
        /// Print the overview as JSON
        #[arg(long)]
        json: bool,
    },
    /// Catalog subjects with completion
    Subjects,
    /// Units of a subject with their lock status
    Units { subject: SubjectId },
    /// Lessons of a unit with their lock status
    Lessons { unit: UnitId },
    /// Walk through a lesson and its quiz on stdin
    Lesson { lesson: LessonId },
    /// Award XP directly
    AddXp { amount: u32 },
    /// Record a quiz percentage (clamped to 100)
    QuizScore { quiz: QuizId, percent: u32 },
    /// Pick a language and one or more subjects
    Onboard {
        #[arg(long, default_value = "en")]
        language: String,
        #[arg(required = true, value_delimiter = ',')]
        subjects: Vec<SubjectId>,
    },
    /// Show sync status, or mark local progress as synced
    Sync {
        /// Record a completed sync now
        #[arg(long)]
        mark: bool,
        /// Record the device as offline
        #[arg(long)]
        offline: bool,
    },
    /// Delete all learner data
    Reset {
        /// Skip the confirmation guard
        #[arg(long)]
        yes: bool,
    },
}
