use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::model::ids::{LessonId, QuizId, SubjectId, UnitId};

/// Locale used until onboarding picks one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Highest storable quiz percentage.
pub const MAX_PERCENT: u8 = 100;

//
// ─── ACTIVITY STAMP ────────────────────────────────────────────────────────────
//

/// Streak counter together with the day it was last advanced.
///
/// The two values only ever change together, so they travel as one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityStamp {
    pub streak: u32,
    pub last_active_date: NaiveDate,
}

impl ActivityStamp {
    #[must_use]
    pub fn new(streak: u32, last_active_date: NaiveDate) -> Self {
        Self {
            streak,
            last_active_date,
        }
    }
}

//
// ─── LEARNER PROGRESS ──────────────────────────────────────────────────────────
//

/// The single persisted learner record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerProgress {
    current_language: String,
    selected_subjects: BTreeSet<SubjectId>,
    xp: u32,
    activity: ActivityStamp,
    completed_lessons: BTreeSet<LessonId>,
    quiz_scores: BTreeMap<QuizId, u8>,
    units_progress: BTreeMap<UnitId, u8>,
}

impl LearnerProgress {
    /// Fresh record for a learner with no history.
    ///
    /// `lastActiveDate` starts at `today`, so the first XP award of the day
    /// leaves the streak at zero.
    #[must_use]
    pub fn new_default(today: NaiveDate) -> Self {
        Self {
            current_language: DEFAULT_LANGUAGE.to_owned(),
            selected_subjects: BTreeSet::new(),
            xp: 0,
            activity: ActivityStamp::new(0, today),
            completed_lessons: BTreeSet::new(),
            quiz_scores: BTreeMap::new(),
            units_progress: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn current_language(&self) -> &str {
        &self.current_language
    }

    #[must_use]
    pub fn selected_subjects(&self) -> &BTreeSet<SubjectId> {
        &self.selected_subjects
    }

    #[must_use]
    pub fn xp(&self) -> u32 {
        self.xp
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.activity.streak
    }

    #[must_use]
    pub fn last_active_date(&self) -> NaiveDate {
        self.activity.last_active_date
    }

    #[must_use]
    pub fn activity(&self) -> ActivityStamp {
        self.activity
    }

    #[must_use]
    pub fn completed_lessons(&self) -> &BTreeSet<LessonId> {
        &self.completed_lessons
    }

    #[must_use]
    pub fn quiz_scores(&self) -> &BTreeMap<QuizId, u8> {
        &self.quiz_scores
    }

    #[must_use]
    pub fn units_progress(&self) -> &BTreeMap<UnitId, u8> {
        &self.units_progress
    }

    #[must_use]
    pub fn is_lesson_completed(&self, lesson_id: &str) -> bool {
        self.completed_lessons.contains(lesson_id)
    }

    /// Best recorded percentage for a quiz, `None` if it was never taken.
    #[must_use]
    pub fn quiz_score(&self, quiz_id: &str) -> Option<u8> {
        self.quiz_scores.get(quiz_id).copied()
    }

    /// Merge the fields present in `patch` into this record.
    ///
    /// Present fields replace the stored value wholesale; absent fields are
    /// left untouched.
    pub fn apply(&mut self, patch: ProgressPatch) {
        let ProgressPatch {
            current_language,
            selected_subjects,
            xp,
            activity,
            completed_lessons,
            quiz_scores,
            units_progress,
        } = patch;

        if let Some(language) = current_language {
            self.current_language = language;
        }
        if let Some(subjects) = selected_subjects {
            self.selected_subjects = subjects;
        }
        if let Some(xp) = xp {
            self.xp = xp;
        }
        if let Some(activity) = activity {
            self.activity = activity;
        }
        if let Some(lessons) = completed_lessons {
            self.completed_lessons = lessons;
        }
        if let Some(scores) = quiz_scores {
            self.quiz_scores = scores
                .into_iter()
                .map(|(id, score)| (id, score.min(MAX_PERCENT)))
                .collect();
        }
        if let Some(units) = units_progress {
            self.units_progress = units
                .into_iter()
                .map(|(id, pct)| (id, pct.min(MAX_PERCENT)))
                .collect();
        }
    }

    /// Returns a copy with `patch` merged in.
    #[must_use]
    pub fn merged(&self, patch: ProgressPatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

//
// ─── PROGRESS PATCH ────────────────────────────────────────────────────────────
//

/// Partial update to a `LearnerProgress`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressPatch {
    pub current_language: Option<String>,
    pub selected_subjects: Option<BTreeSet<SubjectId>>,
    pub xp: Option<u32>,
    pub activity: Option<ActivityStamp>,
    pub completed_lessons: Option<BTreeSet<LessonId>>,
    pub quiz_scores: Option<BTreeMap<QuizId, u8>>,
    pub units_progress: Option<BTreeMap<UnitId, u8>>,
}

impl ProgressPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.current_language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_selected_subjects(mut self, subjects: impl IntoIterator<Item = SubjectId>) -> Self {
        self.selected_subjects = Some(subjects.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_xp(mut self, xp: u32) -> Self {
        self.xp = Some(xp);
        self
    }

    #[must_use]
    pub fn with_activity(mut self, activity: ActivityStamp) -> Self {
        self.activity = Some(activity);
        self
    }

    #[must_use]
    pub fn with_completed_lessons(mut self, lessons: BTreeSet<LessonId>) -> Self {
        self.completed_lessons = Some(lessons);
        self
    }

    #[must_use]
    pub fn with_quiz_scores(mut self, scores: BTreeMap<QuizId, u8>) -> Self {
        self.quiz_scores = Some(scores);
        self
    }

    #[must_use]
    pub fn with_units_progress(mut self, units: BTreeMap<UnitId, u8>) -> Self {
        self.units_progress = Some(units);
        self
    }

    /// Fold this patch into another, the other's fields winning.
    #[must_use]
    pub fn and(mut self, other: ProgressPatch) -> Self {
        self.current_language = other.current_language.or(self.current_language);
        self.selected_subjects = other.selected_subjects.or(self.selected_subjects);
        self.xp = other.xp.or(self.xp);
        self.activity = other.activity.or(self.activity);
        self.completed_lessons = other.completed_lessons.or(self.completed_lessons);
        self.quiz_scores = other.quiz_scores.or(self.quiz_scores);
        self.units_progress = other.units_progress.or(self.units_progress);
        self
    }

    /// Rewrite the monotone fields so the patch cannot roll progress back.
    ///
    /// `xp` never drops below `current`, completed lessons are unioned with
    /// the stored set, and each quiz keeps the higher of the stored and
    /// patched score.
    #[must_use]
    pub fn preserving(mut self, current: &LearnerProgress) -> Self {
        if let Some(xp) = self.xp {
            self.xp = Some(xp.max(current.xp()));
        }
        if let Some(mut lessons) = self.completed_lessons.take() {
            lessons.extend(current.completed_lessons().iter().cloned());
            self.completed_lessons = Some(lessons);
        }
        if let Some(patched) = self.quiz_scores.take() {
            let mut scores = current.quiz_scores().clone();
            for (quiz_id, score) in patched {
                let score = score.min(MAX_PERCENT);
                scores
                    .entry(quiz_id)
                    .and_modify(|best| *best = (*best).max(score))
                    .or_insert(score);
            }
            self.quiz_scores = Some(scores);
        }
        self
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
