use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tutor_core::model::{
    ActivityStamp, LearnerProgress, LessonId, ProgressPatch, QuizId, SubjectId, UnitId,
};

/// On-disk JSON shape of the learner record.
///
/// Every field is optional so that a payload written by an older build, or
/// one missing fields, still loads: absent fields fall back to the default
/// record.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProgressDocument {
    #[serde(default)]
    current_language: Option<String>,
    #[serde(default)]
    selected_subjects: Option<Vec<SubjectId>>,
    #[serde(default)]
    xp: Option<u32>,
    #[serde(default)]
    streak: Option<u32>,
    #[serde(default)]
    last_active_date: Option<NaiveDate>,
    #[serde(default)]
    completed_lessons: Option<Vec<LessonId>>,
    #[serde(default)]
    quiz_scores: Option<BTreeMap<QuizId, u8>>,
    #[serde(default)]
    units_progress: Option<BTreeMap<UnitId, u8>>,
}

impl ProgressDocument {
    pub(crate) fn from_progress(progress: &LearnerProgress) -> Self {
        Self {
            current_language: Some(progress.current_language().to_owned()),
            selected_subjects: Some(progress.selected_subjects().iter().cloned().collect()),
            xp: Some(progress.xp()),
            streak: Some(progress.streak()),
            last_active_date: Some(progress.last_active_date()),
            completed_lessons: Some(progress.completed_lessons().iter().cloned().collect()),
            quiz_scores: Some(progress.quiz_scores().clone()),
            units_progress: Some(progress.units_progress().clone()),
        }
    }

    /// Overlay the stored fields on `defaults`.
    pub(crate) fn into_progress(self, defaults: LearnerProgress) -> LearnerProgress {
        let fallback = defaults.activity();
        let activity = match (self.streak, self.last_active_date) {
            (None, None) => None,
            (streak, date) => Some(ActivityStamp::new(
                streak.unwrap_or(fallback.streak),
                date.unwrap_or(fallback.last_active_date),
            )),
        };

        let patch = ProgressPatch {
            current_language: self.current_language,
            selected_subjects: self.selected_subjects.map(|s| s.into_iter().collect()),
            xp: self.xp,
            activity,
            completed_lessons: self.completed_lessons.map(|l| l.into_iter().collect()),
            quiz_scores: self.quiz_scores,
            units_progress: self.units_progress,
        };
        defaults.merged(patch)
    }
}
