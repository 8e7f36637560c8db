use chrono::NaiveDate;
use services::{AppServices, Clock};
use storage::Storage;
use tutor_core::ContentGraph;
use tutor_core::model::{LessonId, QuizId};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn on(storage: &Storage, d: u32) -> AppServices {
    AppServices::from_storage(
        storage,
        Clock::fixed_on(day(d)),
        ContentGraph::builtin().unwrap(),
    )
}

#[tokio::test]
async fn streak_follows_calendar_days() {
    let storage = Storage::in_memory();

    on(&storage, 1).progress().add_xp(10).await;
    assert_eq!(on(&storage, 1).progress().progress().await.streak(), 0);

    on(&storage, 2).progress().add_xp(10).await;
    on(&storage, 3).progress().add_xp(10).await;
    on(&storage, 3).progress().add_xp(10).await;
    let progress = on(&storage, 3).progress().progress().await;
    assert_eq!(progress.streak(), 2);
    assert_eq!(progress.xp(), 40);

    on(&storage, 6).progress().add_xp(1).await;
    let progress = on(&storage, 6).progress().progress().await;
    assert_eq!(progress.streak(), 1);
    assert_eq!(progress.last_active_date(), day(6));
}

#[tokio::test]
async fn completion_and_quiz_rules_hold_across_days() {
    let storage = Storage::in_memory();
    let lesson = LessonId::new("algebra-1-1");
    let quiz = QuizId::new("quiz-algebra-1-1");

    on(&storage, 1).progress().complete_lesson(&lesson, 15).await;
    on(&storage, 2).progress().complete_lesson(&lesson, 15).await;
    let progress = on(&storage, 2).progress().progress().await;
    assert_eq!(progress.xp(), 15);
    // The repeat completion awarded nothing, so day 2 did not extend the streak.
    assert_eq!(progress.last_active_date(), day(1));

    on(&storage, 2).progress().save_quiz_score(&quiz, 40).await;
    on(&storage, 2).progress().save_quiz_score(&quiz, 90).await;
    on(&storage, 2).progress().save_quiz_score(&quiz, 150).await;
    let progress = on(&storage, 2).progress().progress().await;
    assert_eq!(progress.quiz_score(quiz.as_str()), Some(100));
    assert_eq!(progress.xp(), 15 + 20 + 45 + 50);
    assert_eq!(progress.streak(), 1);
}
