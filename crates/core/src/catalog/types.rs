use serde::{Deserialize, Serialize};

use crate::model::{LessonId, QuestionId, QuizId, SubjectId, UnitId};

//
// ─── LANGUAGES & SUBJECTS ──────────────────────────────────────────────────────
//

/// A locale the learner can pick during onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub code: String,
    pub name: String,
    pub native_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    /// Advertised unit count; may exceed the units actually published.
    pub units_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: UnitId,
    pub subject_id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub order: u32,
    /// Declared lesson count, used as the progress denominator.
    pub lessons_count: u32,
}

//
// ─── LESSONS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
    Example,
    Formula,
    Tip,
}

/// One screen of lesson material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(rename = "content")]
    pub body: String,
}

impl ContentItem {
    #[must_use]
    pub fn new(kind: ContentKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(ContentKind::Text, body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub unit_id: UnitId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order: u32,
    pub xp_reward: u32,
    #[serde(default)]
    pub duration: String,
    pub content: Vec<ContentItem>,
}

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: QuizId,
    pub lesson_id: LessonId,
    pub questions: Vec<Question>,
}

//
// ─── RAW CATALOG ───────────────────────────────────────────────────────────────
//

/// Unvalidated catalog as it appears on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogData {
    #[serde(default)]
    pub languages: Vec<Language>,
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
}
