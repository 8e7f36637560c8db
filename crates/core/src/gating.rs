//! Lock / current / completed derivation for lessons and units.
//!
//! Nothing here is stored: status is recomputed from the completed-lesson set
//! and the catalog on every query.

use std::collections::BTreeSet;

use crate::catalog::{ContentGraph, Lesson, Unit};
use crate::model::LessonId;

//
// ─── STATUS TYPES ──────────────────────────────────────────────────────────────
//

/// Display status of a lesson or unit, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Completed,
    /// First incomplete entry in the sequence.
    Current,
    /// Unlocked but neither completed nor current.
    Available,
    Locked,
}

impl GateStatus {
    #[must_use]
    pub fn from_flags(completed: bool, current: bool, locked: bool) -> Self {
        if completed {
            GateStatus::Completed
        } else if current {
            GateStatus::Current
        } else if locked {
            GateStatus::Locked
        } else {
            GateStatus::Available
        }
    }
}

/// Completed vs. total lessons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Completion {
    pub completed: usize,
    pub total: usize,
}

impl Completion {
    #[must_use]
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    /// Whole percent, rounded down and capped at 100. Empty totals read 0.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.completed.min(self.total) * 100 / self.total;
        u8::try_from(pct).unwrap_or(100)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonGate<'a> {
    pub lesson: &'a Lesson,
    pub locked: bool,
    pub current: bool,
    pub completed: bool,
}

impl LessonGate<'_> {
    #[must_use]
    pub fn status(&self) -> GateStatus {
        GateStatus::from_flags(self.completed, self.current, self.locked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitGate<'a> {
    pub unit: &'a Unit,
    pub locked: bool,
    pub current: bool,
    pub progress: Completion,
}

impl UnitGate<'_> {
    #[must_use]
    pub fn status(&self) -> GateStatus {
        GateStatus::from_flags(self.progress.is_complete(), self.current, self.locked)
    }
}

//
// ─── SEQUENCE RULES ────────────────────────────────────────────────────────────
//

/// Whether entry `index` of an ordered sequence is locked.
///
/// The first entry is never locked; every later entry is locked until its
/// predecessor is done.
#[must_use]
pub fn is_locked_at(index: usize, predecessor_done: impl FnOnce(usize) -> bool) -> bool {
    index > 0 && !predecessor_done(index - 1)
}

/// First lesson in order that is not completed; `None` once all are done.
#[must_use]
pub fn current_lesson<'a>(
    lessons: &[&'a Lesson],
    completed: &BTreeSet<LessonId>,
) -> Option<&'a Lesson> {
    lessons
        .iter()
        .copied()
        .find(|lesson| !completed.contains(&lesson.id))
}

/// Gate every lesson of an ordered sequence.
#[must_use]
pub fn gate_lessons<'a>(
    lessons: &[&'a Lesson],
    completed: &BTreeSet<LessonId>,
) -> Vec<LessonGate<'a>> {
    let current = current_lesson(lessons, completed).map(|lesson| &lesson.id);
    lessons
        .iter()
        .enumerate()
        .map(|(index, &lesson)| LessonGate {
            lesson,
            locked: is_locked_at(index, |prev| completed.contains(&lessons[prev].id)),
            current: current == Some(&lesson.id),
            completed: completed.contains(&lesson.id),
        })
        .collect()
}

//
// ─── RESOLVER ──────────────────────────────────────────────────────────────────
//

/// Gating queries over one learner's completed set.
#[derive(Debug, Clone, Copy)]
pub struct GatingResolver<'a> {
    graph: &'a ContentGraph,
    completed: &'a BTreeSet<LessonId>,
}

impl<'a> GatingResolver<'a> {
    #[must_use]
    pub fn new(graph: &'a ContentGraph, completed: &'a BTreeSet<LessonId>) -> Self {
        Self { graph, completed }
    }

    /// Lessons of a unit with their gates, in order.
    #[must_use]
    pub fn unit_lessons(&self, unit_id: &str) -> Vec<LessonGate<'a>> {
        gate_lessons(&self.graph.lessons_by_unit(unit_id), self.completed)
    }

    /// Gate of a single lesson; `None` for an unknown lesson.
    #[must_use]
    pub fn lesson_gate(&self, lesson_id: &str) -> Option<LessonGate<'a>> {
        let lesson = self.graph.lesson(lesson_id)?;
        self.unit_lessons(lesson.unit_id.as_str())
            .into_iter()
            .find(|gate| gate.lesson.id.as_str() == lesson_id)
    }

    /// Unknown lessons count as locked.
    #[must_use]
    pub fn is_lesson_locked(&self, lesson_id: &str) -> bool {
        self.lesson_gate(lesson_id).is_none_or(|gate| gate.locked)
    }

    #[must_use]
    pub fn is_lesson_current(&self, lesson_id: &str) -> bool {
        self.lesson_gate(lesson_id).is_some_and(|gate| gate.current)
    }

    /// The lesson to resume in a unit; `None` when the unit is finished.
    #[must_use]
    pub fn current_lesson(&self, unit_id: &str) -> Option<&'a Lesson> {
        current_lesson(&self.graph.lessons_by_unit(unit_id), self.completed)
    }

    /// Completed lessons of a unit over its lesson total.
    #[must_use]
    pub fn unit_progress(&self, unit_id: &str) -> Completion {
        let completed = self
            .graph
            .lessons_by_unit(unit_id)
            .iter()
            .filter(|lesson| self.completed.contains(&lesson.id))
            .count();
        Completion::new(completed, self.graph.unit_lesson_total(unit_id))
    }

    /// Units of a subject with their gates, in order.
    ///
    /// Unit `i` unlocks once unit `i - 1` is at 100%; the current unit is the
    /// first one not yet complete.
    #[must_use]
    pub fn subject_units(&self, subject_id: &str) -> Vec<UnitGate<'a>> {
        let units = self.graph.units_by_subject(subject_id);
        let progress: Vec<Completion> = units
            .iter()
            .map(|unit| self.unit_progress(unit.id.as_str()))
            .collect();
        let current = progress.iter().position(|p| !p.is_complete());

        units
            .into_iter()
            .enumerate()
            .map(|(index, unit)| UnitGate {
                unit,
                locked: is_locked_at(index, |prev| progress[prev].is_complete()),
                current: current == Some(index),
                progress: progress[index],
            })
            .collect()
    }

    /// Completed lessons attributed to a subject over the lesson totals of
    /// all its units.
    #[must_use]
    pub fn subject_progress(&self, subject_id: &str) -> Completion {
        let completed = self
            .completed
            .iter()
            .filter(|lesson_id| {
                self.graph
                    .subject_of_lesson(lesson_id.as_str())
                    .is_some_and(|subject| subject.as_str() == subject_id)
            })
            .count();
        let total = self
            .graph
            .units_by_subject(subject_id)
            .iter()
            .map(|unit| self.graph.unit_lesson_total(unit.id.as_str()))
            .sum();
        Completion::new(completed, total)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogData, ContentItem, Subject};
    use crate::model::{SubjectId, UnitId};

    fn graph() -> ContentGraph {
        let subject = |id: &str| Subject {
            id: SubjectId::new(id),
            name: id.into(),
            icon: String::new(),
            description: String::new(),
            units_count: 2,
        };
        let unit = |id: &str, subject: &str, order: u32, count: u32| Unit {
            id: UnitId::new(id),
            subject_id: SubjectId::new(subject),
            name: id.into(),
            description: String::new(),
            order,
            lessons_count: count,
        };
        let lesson = |id: &str, unit: &str, order: u32| Lesson {
            id: LessonId::new(id),
            unit_id: UnitId::new(unit),
            title: id.into(),
            description: String::new(),
            order,
            xp_reward: 10,
            duration: String::new(),
            content: vec![ContentItem::text("x")],
        };

        ContentGraph::from_data(CatalogData {
            languages: Vec::new(),
            subjects: vec![subject("math"), subject("physics")],
            units: vec![
                unit("alg", "math", 1, 3),
                unit("geo", "math", 2, 2),
                unit("mech", "physics", 1, 1),
            ],
            lessons: vec![
                lesson("alg-1", "alg", 1),
                lesson("alg-2", "alg", 2),
                lesson("alg-3", "alg", 3),
                lesson("geo-1", "geo", 1),
                lesson("mech-1", "mech", 1),
            ],
            quizzes: Vec::new(),
        })
        .unwrap()
    }

    fn done(ids: &[&str]) -> BTreeSet<LessonId> {
        ids.iter().map(|id| LessonId::new(*id)).collect()
    }

    #[test]
    fn nothing_done_only_first_lesson_open() {
        let graph = graph();
        let completed = done(&[]);
        let resolver = GatingResolver::new(&graph, &completed);
        let gates = resolver.unit_lessons("alg");

        assert_eq!(gates[0].status(), GateStatus::Current);
        assert!(!gates[0].locked);
        assert!(gates[1].locked);
        assert!(gates[2].locked);
    }

    #[test]
    fn first_done_makes_second_current() {
        let graph = graph();
        let completed = done(&["alg-1"]);
        let resolver = GatingResolver::new(&graph, &completed);

        assert!(!resolver.is_lesson_locked("alg-2"));
        assert!(resolver.is_lesson_current("alg-2"));
        assert!(resolver.is_lesson_locked("alg-3"));
        assert_eq!(
            resolver.lesson_gate("alg-1").unwrap().status(),
            GateStatus::Completed
        );
    }

    #[test]
    fn all_done_has_no_current_lesson() {
        let graph = graph();
        let completed = done(&["alg-1", "alg-2", "alg-3"]);
        let resolver = GatingResolver::new(&graph, &completed);
        assert!(resolver.current_lesson("alg").is_none());
        assert!(resolver.unit_progress("alg").is_complete());
    }

    #[test]
    fn out_of_order_completion_leaves_available_lesson() {
        let graph = graph();
        let completed = done(&["alg-2"]);
        let resolver = GatingResolver::new(&graph, &completed);
        let gates = resolver.unit_lessons("alg");

        assert_eq!(gates[0].status(), GateStatus::Current);
        // alg-2 is done even though alg-1 is not, so it reports Completed.
        assert!(gates[1].locked);
        assert_eq!(gates[1].status(), GateStatus::Completed);
        assert_eq!(gates[2].status(), GateStatus::Available);
    }

    #[test]
    fn unknown_lesson_is_locked_and_not_current() {
        let graph = graph();
        let completed = done(&[]);
        let resolver = GatingResolver::new(&graph, &completed);
        assert!(resolver.is_lesson_locked("nope"));
        assert!(!resolver.is_lesson_current("nope"));
        assert!(resolver.unit_lessons("nope").is_empty());
    }

    #[test]
    fn units_unlock_after_full_predecessor() {
        let graph = graph();

        let partial = done(&["alg-1", "alg-2"]);
        let resolver = GatingResolver::new(&graph, &partial);
        let units = resolver.subject_units("math");
        assert!(!units[0].locked);
        assert_eq!(units[0].progress.percent(), 66);
        assert!(units[1].locked);
        assert_eq!(units[0].status(), GateStatus::Current);

        let full = done(&["alg-1", "alg-2", "alg-3"]);
        let resolver = GatingResolver::new(&graph, &full);
        let units = resolver.subject_units("math");
        assert!(!units[1].locked);
        assert_eq!(units[0].status(), GateStatus::Completed);
        assert_eq!(units[1].status(), GateStatus::Current);
    }

    #[test]
    fn subject_progress_uses_explicit_mapping() {
        let graph = graph();
        let completed = done(&["alg-1", "geo-1", "mech-1", "stray-lesson"]);
        let resolver = GatingResolver::new(&graph, &completed);

        assert_eq!(resolver.subject_progress("math"), Completion::new(2, 5));
        assert_eq!(resolver.subject_progress("physics"), Completion::new(1, 1));
        assert_eq!(resolver.subject_progress("chemistry"), Completion::new(0, 0));
    }

    #[test]
    fn completion_percent_edges() {
        assert_eq!(Completion::new(0, 0).percent(), 0);
        assert!(!Completion::new(0, 0).is_complete());
        assert_eq!(Completion::new(2, 3).percent(), 66);
        assert_eq!(Completion::new(5, 3).percent(), 100);
    }

    #[test]
    fn is_locked_at_first_index_never_asks() {
        assert!(!is_locked_at(0, |_| unreachable!()));
        assert!(is_locked_at(2, |_| false));
        assert!(!is_locked_at(2, |prev| prev == 1));
    }
}
