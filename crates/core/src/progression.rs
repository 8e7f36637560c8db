//! XP, streak and best-score rules.
//!
//! Every rule is a pure function of the current `LearnerProgress` and the
//! calendar day. Rules never mutate; they return the outcome together with the
//! `ProgressPatch` the store has to persist.

use chrono::NaiveDate;

use crate::model::{ActivityStamp, LearnerProgress, LessonId, MAX_PERCENT, ProgressPatch, QuizId};

/// XP granted per quiz percentage point (`floor(percent * 0.5)`).
pub const QUIZ_XP_DIVISOR: u32 = 2;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// How an XP award moved the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// Last activity was yesterday; the streak grew by one.
    Extended,
    /// Last activity was neither today nor yesterday; the streak restarted at 1.
    Restarted,
    /// Already active today; the streak is untouched.
    Unchanged,
}

/// Result of a single XP award.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpAward {
    pub amount: u32,
    pub xp: u32,
    pub activity: ActivityStamp,
    pub streak_change: StreakChange,
}

impl XpAward {
    #[must_use]
    pub fn patch(&self) -> ProgressPatch {
        ProgressPatch::new()
            .with_xp(self.xp)
            .with_activity(self.activity)
    }
}

/// Result of completing a lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonOutcome {
    /// The lesson was already completed; nothing changes.
    AlreadyCompleted,
    Completed { award: XpAward, patch: ProgressPatch },
}

impl LessonOutcome {
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, LessonOutcome::Completed { .. })
    }

    #[must_use]
    pub fn award(&self) -> Option<&XpAward> {
        match self {
            LessonOutcome::AlreadyCompleted => None,
            LessonOutcome::Completed { award, .. } => Some(award),
        }
    }

    /// Patch to persist; `None` when nothing changed.
    #[must_use]
    pub fn patch(&self) -> Option<&ProgressPatch> {
        match self {
            LessonOutcome::AlreadyCompleted => None,
            LessonOutcome::Completed { patch, .. } => Some(patch),
        }
    }
}

/// Result of recording a quiz submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizScoreOutcome {
    /// Submitted percentage after clamping to 0..=100.
    pub percent: u8,
    pub previous_best: Option<u8>,
    pub best: u8,
    pub improved: bool,
    pub award: XpAward,
    pub patch: ProgressPatch,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Progression rules evaluated against a fixed calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionEngine {
    today: NaiveDate,
}

impl ProgressionEngine {
    #[must_use]
    pub fn on(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Award `amount` XP and advance the daily streak.
    #[must_use]
    pub fn add_xp(&self, progress: &LearnerProgress, amount: u32) -> XpAward {
        let last = progress.last_active_date();
        let yesterday = self.today.pred_opt();

        let (streak, streak_change) = if Some(last) == yesterday {
            (progress.streak().saturating_add(1), StreakChange::Extended)
        } else if last != self.today {
            (1, StreakChange::Restarted)
        } else {
            (progress.streak(), StreakChange::Unchanged)
        };

        XpAward {
            amount,
            xp: progress.xp().saturating_add(amount),
            activity: ActivityStamp::new(streak, self.today),
            streak_change,
        }
    }

    /// Mark a lesson complete and award its XP, once per lesson.
    #[must_use]
    pub fn complete_lesson(
        &self,
        progress: &LearnerProgress,
        lesson_id: &LessonId,
        xp_reward: u32,
    ) -> LessonOutcome {
        if progress.is_lesson_completed(lesson_id.as_str()) {
            return LessonOutcome::AlreadyCompleted;
        }

        let mut completed = progress.completed_lessons().clone();
        completed.insert(lesson_id.clone());
        let award = self.add_xp(progress, xp_reward);
        let patch = ProgressPatch::new()
            .with_completed_lessons(completed)
            .and(award.patch());

        LessonOutcome::Completed { award, patch }
    }

    /// Record a quiz percentage, keeping only the best, and award XP.
    ///
    /// XP is granted on every submission, whether or not the best improved.
    #[must_use]
    pub fn record_quiz_score(
        &self,
        progress: &LearnerProgress,
        quiz_id: &QuizId,
        percent: u32,
    ) -> QuizScoreOutcome {
        let percent = clamp_percent(percent);
        let previous_best = progress.quiz_score(quiz_id.as_str());
        let improved = previous_best.is_none_or(|best| percent > best);
        let best = if improved {
            percent
        } else {
            previous_best.unwrap_or(percent)
        };

        let award = self.add_xp(progress, quiz_xp(percent));
        let mut patch = award.patch();
        if improved {
            let mut scores = progress.quiz_scores().clone();
            scores.insert(quiz_id.clone(), percent);
            patch = patch.with_quiz_scores(scores);
        }

        QuizScoreOutcome {
            percent,
            previous_best,
            best,
            improved,
            award,
            patch,
        }
    }
}

/// XP earned for a quiz percentage.
#[must_use]
pub fn quiz_xp(percent: u8) -> u32 {
    u32::from(percent) / QUIZ_XP_DIVISOR
}

fn clamp_percent(percent: u32) -> u8 {
    u8::try_from(percent.min(u32::from(MAX_PERCENT))).unwrap_or(MAX_PERCENT)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
