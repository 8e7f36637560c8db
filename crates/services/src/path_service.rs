use std::sync::Arc;

use serde::Serialize;
use storage::ProgressStore;
use tutor_core::catalog::{Lesson, Subject, Unit};
use tutor_core::{Completion, ContentGraph, GateStatus, GatingResolver};

//
// ─── VIEW ITEMS ────────────────────────────────────────────────────────────────
//

/// A lesson on a unit's path with its derived status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonNode {
    pub lesson: Lesson,
    #[serde(serialize_with = "serialize_status")]
    pub status: GateStatus,
    pub has_quiz: bool,
    pub best_score: Option<u8>,
}

/// A unit on a subject's path with its derived status and completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitNode {
    pub unit: Unit,
    #[serde(serialize_with = "serialize_status")]
    pub status: GateStatus,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub subject: Subject,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

/// Home-screen overview of the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub xp: u32,
    pub streak: u32,
    pub completed_lessons: usize,
    pub quizzes_taken: usize,
    /// Selected subjects in catalog order; every subject before onboarding.
    pub subjects: Vec<SubjectSummary>,
}

fn serialize_status<S: serde::Serializer>(status: &GateStatus, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_str(status_label(*status))
}

/// Lowercase label used by the CLI and the JSON views.
#[must_use]
pub fn status_label(status: GateStatus) -> &'static str {
    match status {
        GateStatus::Completed => "completed",
        GateStatus::Current => "current",
        GateStatus::Available => "available",
        GateStatus::Locked => "locked",
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Read-only gating views over the catalog and the learner's record.
#[derive(Debug, Clone)]
pub struct LearningPathService {
    store: ProgressStore,
    catalog: Arc<ContentGraph>,
}

impl LearningPathService {
    #[must_use]
    pub fn new(store: ProgressStore, catalog: Arc<ContentGraph>) -> Self {
        Self { store, catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &ContentGraph {
        &self.catalog
    }

    /// Lessons of a unit in order; empty for an unknown unit.
    pub async fn unit_path(&self, unit_id: &str) -> Vec<LessonNode> {
        let progress = self.store.read().await;
        let resolver = GatingResolver::new(&self.catalog, progress.completed_lessons());

        resolver
            .unit_lessons(unit_id)
            .into_iter()
            .map(|gate| {
                let quiz = self.catalog.quiz_by_lesson(gate.lesson.id.as_str());
                LessonNode {
                    lesson: gate.lesson.clone(),
                    status: gate.status(),
                    has_quiz: quiz.is_some(),
                    best_score: quiz.and_then(|q| progress.quiz_score(q.id.as_str())),
                }
            })
            .collect()
    }

    /// Units of a subject in order; empty for an unknown subject.
    pub async fn subject_path(&self, subject_id: &str) -> Vec<UnitNode> {
        let progress = self.store.read().await;
        let resolver = GatingResolver::new(&self.catalog, progress.completed_lessons());

        resolver
            .subject_units(subject_id)
            .into_iter()
            .map(|gate| UnitNode {
                unit: gate.unit.clone(),
                status: gate.status(),
                completed: gate.progress.completed,
                total: gate.progress.total,
                percent: gate.progress.percent(),
            })
            .collect()
    }

    pub async fn subject_progress(&self, subject_id: &str) -> Completion {
        let progress = self.store.read().await;
        GatingResolver::new(&self.catalog, progress.completed_lessons())
            .subject_progress(subject_id)
    }

    /// Whether a lesson is known and unlocked.
    pub async fn can_start(&self, lesson_id: &str) -> bool {
        let progress = self.store.read().await;
        !GatingResolver::new(&self.catalog, progress.completed_lessons())
            .is_lesson_locked(lesson_id)
    }

    /// The lesson to resume in a unit; `None` once the unit is finished.
    pub async fn current_lesson(&self, unit_id: &str) -> Option<Lesson> {
        let progress = self.store.read().await;
        GatingResolver::new(&self.catalog, progress.completed_lessons())
            .current_lesson(unit_id)
            .cloned()
    }

    pub async fn dashboard(&self) -> Dashboard {
        let progress = self.store.read().await;
        let resolver = GatingResolver::new(&self.catalog, progress.completed_lessons());
        let selected = progress.selected_subjects();

        let subjects = self
            .catalog
            .subjects()
            .iter()
            .filter(|subject| selected.is_empty() || selected.contains(&subject.id))
            .map(|subject| {
                let completion = resolver.subject_progress(subject.id.as_str());
                SubjectSummary {
                    subject: subject.clone(),
                    completed: completion.completed,
                    total: completion.total,
                    percent: completion.percent(),
                }
            })
            .collect();

        Dashboard {
            xp: progress.xp(),
            streak: progress.streak(),
            completed_lessons: progress.completed_lessons().len(),
            quizzes_taken: progress.quiz_scores().len(),
            subjects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::Storage;
    use tutor_core::model::{LessonId, ProgressPatch, QuizId, SubjectId};
    use tutor_core::time::fixed_clock;

    fn service() -> (LearningPathService, ProgressStore) {
        let store = ProgressStore::new(&Storage::in_memory(), fixed_clock());
        let catalog = Arc::new(ContentGraph::builtin().unwrap());
        (LearningPathService::new(store.clone(), catalog), store)
    }

    async fn complete(store: &ProgressStore, ids: &[&str]) {
        let lessons = ids.iter().map(|id| LessonId::new(*id)).collect();
        store
            .write(ProgressPatch::new().with_completed_lessons(lessons))
            .await;
    }

    fn statuses(path: &[LessonNode]) -> Vec<GateStatus> {
        path.iter().map(|node| node.status).collect()
    }

    #[tokio::test]
    async fn fresh_unit_path_has_one_current_lesson() {
        let (svc, _) = service();
        let path = svc.unit_path("math-algebra-1").await;

        assert_eq!(path.len(), 5);
        assert_eq!(path[0].status, GateStatus::Current);
        assert!(path[1..].iter().all(|n| n.status == GateStatus::Locked));
        assert!(path[0].has_quiz);
        assert_eq!(path[0].best_score, None);
    }

    #[tokio::test]
    async fn first_lesson_done_unlocks_second_only() {
        let (svc, store) = service();
        complete(&store, &["algebra-1-1"]).await;

        let path = svc.unit_path("math-algebra-1").await;
        assert_eq!(
            statuses(&path[..3]),
            vec![GateStatus::Completed, GateStatus::Current, GateStatus::Locked]
        );
        assert!(svc.can_start("algebra-1-2").await);
        assert!(!svc.can_start("algebra-1-3").await);
        assert_eq!(
            svc.current_lesson("math-algebra-1").await.map(|l| l.id),
            Some(LessonId::new("algebra-1-2"))
        );
    }

    #[tokio::test]
    async fn out_of_order_completion_shows_available() {
        let (svc, store) = service();
        complete(&store, &["algebra-1-1", "algebra-1-3"]).await;

        let path = svc.unit_path("math-algebra-1").await;
        assert_eq!(
            statuses(&path),
            vec![
                GateStatus::Completed,
                GateStatus::Current,
                GateStatus::Locked,
                GateStatus::Available,
                GateStatus::Locked,
            ]
        );
    }

    #[tokio::test]
    async fn unknown_ids_are_empty_or_locked() {
        let (svc, _) = service();
        assert!(svc.unit_path("nope").await.is_empty());
        assert!(svc.subject_path("nope").await.is_empty());
        assert!(!svc.can_start("nope").await);
        assert_eq!(svc.subject_progress("nope").await.percent(), 0);
    }

    #[tokio::test]
    async fn subject_path_locks_units_until_previous_finishes() {
        let (svc, store) = service();
        let units = svc.subject_path("math").await;
        assert_eq!(units[0].status, GateStatus::Current);
        assert!(units[1..].iter().all(|u| u.status == GateStatus::Locked));

        complete(
            &store,
            &["algebra-1-1", "algebra-1-2", "algebra-1-3", "algebra-1-4", "algebra-1-5"],
        )
        .await;
        let units = svc.subject_path("math").await;
        assert_eq!((units[0].completed, units[0].percent), (5, 100));
        assert_eq!(units[0].status, GateStatus::Completed);
        assert_eq!(units[1].status, GateStatus::Current);
        assert_eq!(units[2].status, GateStatus::Locked);
    }

    #[tokio::test]
    async fn dashboard_counts_selected_subjects() {
        let (svc, store) = service();
        assert_eq!(svc.dashboard().await.subjects.len(), svc.catalog().subjects().len());

        store
            .write(
                ProgressPatch::new()
                    .with_xp(70)
                    .with_selected_subjects([SubjectId::new("math")])
                    .with_completed_lessons([LessonId::new("algebra-1-1")].into())
                    .with_quiz_scores([(QuizId::new("quiz-algebra-1-1"), 67)].into()),
            )
            .await;

        let dashboard = svc.dashboard().await;
        assert_eq!(dashboard.xp, 70);
        assert_eq!(dashboard.completed_lessons, 1);
        assert_eq!(dashboard.quizzes_taken, 1);
        assert_eq!(dashboard.subjects.len(), 1);
        assert_eq!(dashboard.subjects[0].completed, 1);
    }

    #[tokio::test]
    async fn lesson_node_serializes_status_label() {
        let (svc, _) = service();
        let json = serde_json::to_string(&svc.unit_path("math-algebra-1").await[0]).unwrap();
        assert!(json.contains("\"status\":\"current\""));
        assert!(json.contains("\"hasQuiz\":true"));
    }
}
