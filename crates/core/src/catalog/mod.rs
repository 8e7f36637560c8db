//! Static lesson catalog: subjects → units → lessons → quizzes.
//!
//! The graph is validated once at load time and never mutated afterwards.
//! All lookups are total: an unknown id yields `None` or an empty list.

mod types;

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::{LessonId, QuizId, SubjectId, UnitId};

pub use types::{
    CatalogData, ContentItem, ContentKind, Language, Lesson, Question, Quiz, Subject, Unit,
};

const BUILTIN_CATALOG: &str = include_str!("builtin.json");

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(String),

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("unit {unit} references unknown subject {subject}")]
    UnknownSubject { unit: UnitId, subject: SubjectId },

    #[error("lesson {lesson} references unknown unit {unit}")]
    UnknownUnit { lesson: LessonId, unit: UnitId },

    #[error("quiz {quiz} references unknown lesson {lesson}")]
    UnknownLesson { quiz: QuizId, lesson: LessonId },

    #[error("lesson {lesson} has more than one quiz")]
    DuplicateQuiz { lesson: LessonId },

    #[error("lesson {lesson} has no content")]
    EmptyLesson { lesson: LessonId },

    #[error("quiz {quiz} has no questions")]
    EmptyQuiz { quiz: QuizId },

    #[error("question {question} in quiz {quiz} needs at least two options")]
    TooFewOptions { quiz: QuizId, question: String },

    #[error("question {question} in quiz {quiz}: correct index {index} is out of range for {options} options")]
    CorrectIndexOutOfRange {
        quiz: QuizId,
        question: String,
        index: usize,
        options: usize,
    },

    #[error("order {order} is used twice under {parent}")]
    DuplicateOrder { parent: String, order: u32 },
}

//
// ─── CONTENT GRAPH ─────────────────────────────────────────────────────────────
//

/// Validated, indexed catalog.
#[derive(Debug, Clone)]
pub struct ContentGraph {
    languages: Vec<Language>,
    subjects: Vec<Subject>,
    units: Vec<Unit>,
    lessons: Vec<Lesson>,
    quizzes: Vec<Quiz>,
    subject_index: HashMap<SubjectId, usize>,
    unit_index: HashMap<UnitId, usize>,
    lesson_index: HashMap<LessonId, usize>,
    quiz_index: HashMap<QuizId, usize>,
    // Ordered by `Unit::order` / `Lesson::order`.
    units_by_subject: HashMap<SubjectId, Vec<usize>>,
    lessons_by_unit: HashMap<UnitId, Vec<usize>>,
    quiz_by_lesson: HashMap<LessonId, usize>,
    lesson_subject: HashMap<LessonId, SubjectId>,
}

impl ContentGraph {
    /// The catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the bundled asset fails validation.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse and validate a JSON catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed JSON, or a validation error.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let data: CatalogData =
            serde_json::from_str(raw).map_err(|err| CatalogError::Parse(err.to_string()))?;
        Self::from_data(data)
    }

    /// Validate raw catalog data and build the lookup indexes.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` describing the first inconsistency found.
    pub fn from_data(data: CatalogData) -> Result<Self, CatalogError> {
        let CatalogData {
            languages,
            subjects,
            units,
            lessons,
            quizzes,
        } = data;

        let mut language_codes = HashSet::new();
        for language in &languages {
            if !language_codes.insert(language.code.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "language",
                    id: language.code.clone(),
                });
            }
        }

        let subject_index = index_unique(&subjects, "subject", |s| &s.id)?;
        let unit_index = index_unique(&units, "unit", |u| &u.id)?;
        let lesson_index = index_unique(&lessons, "lesson", |l| &l.id)?;
        let quiz_index = index_unique(&quizzes, "quiz", |q| &q.id)?;

        let mut units_by_subject: HashMap<SubjectId, Vec<usize>> = HashMap::new();
        for (pos, unit) in units.iter().enumerate() {
            if !subject_index.contains_key(&unit.subject_id) {
                return Err(CatalogError::UnknownSubject {
                    unit: unit.id.clone(),
                    subject: unit.subject_id.clone(),
                });
            }
            units_by_subject
                .entry(unit.subject_id.clone())
                .or_default()
                .push(pos);
        }
        for (subject_id, positions) in &mut units_by_subject {
            sort_by_order(positions, |pos| units[pos].order, subject_id.as_str())?;
        }

        let mut lessons_by_unit: HashMap<UnitId, Vec<usize>> = HashMap::new();
        let mut lesson_subject = HashMap::with_capacity(lessons.len());
        for (pos, lesson) in lessons.iter().enumerate() {
            let Some(&unit_pos) = unit_index.get(&lesson.unit_id) else {
                return Err(CatalogError::UnknownUnit {
                    lesson: lesson.id.clone(),
                    unit: lesson.unit_id.clone(),
                });
            };
            if lesson.content.is_empty() {
                return Err(CatalogError::EmptyLesson {
                    lesson: lesson.id.clone(),
                });
            }
            lessons_by_unit
                .entry(lesson.unit_id.clone())
                .or_default()
                .push(pos);
            lesson_subject.insert(lesson.id.clone(), units[unit_pos].subject_id.clone());
        }
        for (unit_id, positions) in &mut lessons_by_unit {
            sort_by_order(positions, |pos| lessons[pos].order, unit_id.as_str())?;
        }

        let mut quiz_by_lesson = HashMap::with_capacity(quizzes.len());
        for (pos, quiz) in quizzes.iter().enumerate() {
            validate_quiz(quiz)?;
            if !lesson_index.contains_key(&quiz.lesson_id) {
                return Err(CatalogError::UnknownLesson {
                    quiz: quiz.id.clone(),
                    lesson: quiz.lesson_id.clone(),
                });
            }
            if quiz_by_lesson.insert(quiz.lesson_id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateQuiz {
                    lesson: quiz.lesson_id.clone(),
                });
            }
        }

        Ok(Self {
            languages,
            subjects,
            units,
            lessons,
            quizzes,
            subject_index,
            unit_index,
            lesson_index,
            quiz_index,
            units_by_subject,
            lessons_by_unit,
            quiz_by_lesson,
            lesson_subject,
        })
    }

    #[must_use]
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    #[must_use]
    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.code == code)
    }

    /// Subjects in catalog order.
    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    #[must_use]
    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subject_index.get(id).map(|&pos| &self.subjects[pos])
    }

    #[must_use]
    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.unit_index.get(id).map(|&pos| &self.units[pos])
    }

    #[must_use]
    pub fn lesson(&self, id: &str) -> Option<&Lesson> {
        self.lesson_index.get(id).map(|&pos| &self.lessons[pos])
    }

    #[must_use]
    pub fn quiz(&self, id: &str) -> Option<&Quiz> {
        self.quiz_index.get(id).map(|&pos| &self.quizzes[pos])
    }

    /// Units of a subject in unlock order; empty for an unknown subject.
    #[must_use]
    pub fn units_by_subject(&self, subject_id: &str) -> Vec<&Unit> {
        self.units_by_subject
            .get(subject_id)
            .map(|positions| positions.iter().map(|&pos| &self.units[pos]).collect())
            .unwrap_or_default()
    }

    /// Lessons of a unit in unlock order; empty for an unknown unit.
    #[must_use]
    pub fn lessons_by_unit(&self, unit_id: &str) -> Vec<&Lesson> {
        self.lessons_by_unit
            .get(unit_id)
            .map(|positions| positions.iter().map(|&pos| &self.lessons[pos]).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn quiz_by_lesson(&self, lesson_id: &str) -> Option<&Quiz> {
        self.quiz_by_lesson
            .get(lesson_id)
            .map(|&pos| &self.quizzes[pos])
    }

    #[must_use]
    pub fn unit_of_lesson(&self, lesson_id: &str) -> Option<&Unit> {
        self.lesson(lesson_id).and_then(|lesson| self.unit(lesson.unit_id.as_str()))
    }

    /// Subject a lesson belongs to, through the lesson → unit → subject map.
    #[must_use]
    pub fn subject_of_lesson(&self, lesson_id: &str) -> Option<&SubjectId> {
        self.lesson_subject.get(lesson_id)
    }

    /// Number of lessons that make a unit complete.
    ///
    /// The larger of the declared `lessons_count` and the lessons actually
    /// published, so a partially published unit can't report 100%.
    #[must_use]
    pub fn unit_lesson_total(&self, unit_id: &str) -> usize {
        let Some(unit) = self.unit(unit_id) else {
            return 0;
        };
        let published = self.lessons_by_unit.get(unit_id).map_or(0, Vec::len);
        usize::try_from(unit.lessons_count)
            .unwrap_or(usize::MAX)
            .max(published)
    }
}

fn index_unique<T, K>(
    items: &[T],
    kind: &'static str,
    key: impl Fn(&T) -> &K,
) -> Result<HashMap<K, usize>, CatalogError>
where
    K: Clone + Eq + std::hash::Hash + std::fmt::Display,
{
    let mut index = HashMap::with_capacity(items.len());
    for (pos, item) in items.iter().enumerate() {
        let id = key(item);
        if index.insert(id.clone(), pos).is_some() {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(index)
}

fn sort_by_order(
    positions: &mut [usize],
    order_of: impl Fn(usize) -> u32,
    parent: &str,
) -> Result<(), CatalogError> {
    positions.sort_by_key(|&pos| order_of(pos));
    for pair in positions.windows(2) {
        let order = order_of(pair[0]);
        if order == order_of(pair[1]) {
            return Err(CatalogError::DuplicateOrder {
                parent: parent.to_owned(),
                order,
            });
        }
    }
    Ok(())
}

fn validate_quiz(quiz: &Quiz) -> Result<(), CatalogError> {
    if quiz.questions.is_empty() {
        return Err(CatalogError::EmptyQuiz {
            quiz: quiz.id.clone(),
        });
    }
    for question in &quiz.questions {
        if question.options.len() < 2 {
            return Err(CatalogError::TooFewOptions {
                quiz: quiz.id.clone(),
                question: question.id.to_string(),
            });
        }
        if question.correct_index >= question.options.len() {
            return Err(CatalogError::CorrectIndexOutOfRange {
                quiz: quiz.id.clone(),
                question: question.id.to_string(),
                index: question.correct_index,
                options: question.options.len(),
            });
        }
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
