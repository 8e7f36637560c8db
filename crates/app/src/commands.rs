use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use services::AppServices;
use services::path_service::status_label;
use services::sessions::{AnswerOutcome, CompletionReport, LessonFlowService, LessonSession};
use tutor_core::catalog::ContentKind;
use tutor_core::model::SyncStatus;

use crate::cli::Command;

/// Execute one subcommand, reading answers from `input` for `lesson`.
pub async fn run(
    app: &AppServices,
    command: Command,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Progress { json } => progress(app, json, out).await,
        Command::Subjects => subjects(app, out).await,
        Command::Units { subject } => units(app, subject.as_str(), out).await,
        Command::Lessons { unit } => lessons(app, unit.as_str(), out).await,
        Command::Lesson { lesson } => {
            let flow = app.lessons();
            let session = flow.start_lesson(lesson.as_str()).await?;
            walk_lesson(&flow, session, input, out).await.map(|_| ())
        }
        Command::AddXp { amount } => {
            let award = app.progress().add_xp(amount).await;
            writeln!(
                out,
                "Awarded {amount} XP. Total {} XP, streak {}.",
                award.xp, award.activity.streak
            )?;
            Ok(())
        }
        Command::QuizScore { quiz, percent } => {
            if app.catalog().quiz(quiz.as_str()).is_none() {
                bail!("unknown quiz {quiz}");
            }
            let outcome = app.progress().save_quiz_score(&quiz, percent).await;
            writeln!(
                out,
                "Recorded {}% on {quiz} (best {}%). +{} XP, total {} XP.",
                outcome.percent, outcome.best, outcome.award.amount, outcome.award.xp
            )?;
            Ok(())
        }
        Command::Onboard { language, subjects } => {
            let progress = app.onboarding().complete(&language, &subjects).await?;
            writeln!(
                out,
                "Welcome! Language {}, {} subject(s) selected.",
                progress.current_language(),
                progress.selected_subjects().len()
            )?;
            Ok(())
        }
        Command::Sync { mark, offline } => {
            let progress = app.progress();
            let status = if mark {
                progress.mark_synced(!offline).await
            } else if offline {
                progress.set_online(false).await
            } else {
                progress.sync_status().await
            };
            writeln!(out, "{}", describe_sync(&status))?;
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("reset deletes all progress; pass --yes to confirm");
            }
            app.onboarding().reset().await;
            writeln!(out, "All learner data cleared.")?;
            Ok(())
        }
    }
}

//
// ─── QUERIES ───────────────────────────────────────────────────────────────────
//

async fn progress(app: &AppServices, json: bool, out: &mut impl Write) -> Result<()> {
    let dashboard = app.paths().dashboard().await;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&dashboard)?)?;
        return Ok(());
    }

    let sync = app.progress().sync_status().await;
    writeln!(out, "XP: {}   Streak: {}", dashboard.xp, dashboard.streak)?;
    writeln!(
        out,
        "Lessons completed: {}   Quizzes taken: {}",
        dashboard.completed_lessons, dashboard.quizzes_taken
    )?;
    writeln!(out, "{}", describe_sync(&sync))?;
    for summary in &dashboard.subjects {
        writeln!(
            out,
            "  {} {:<12} {}/{} ({}%)",
            summary.subject.icon,
            summary.subject.name,
            summary.completed,
            summary.total,
            summary.percent
        )?;
    }
    Ok(())
}

async fn subjects(app: &AppServices, out: &mut impl Write) -> Result<()> {
    let paths = app.paths();
    for subject in paths.catalog().subjects() {
        let completion = paths.subject_progress(subject.id.as_str()).await;
        writeln!(
            out,
            "{:<10} {} {:<12} {:>3}%  {}",
            subject.id,
            subject.icon,
            subject.name,
            completion.percent(),
            subject.description
        )?;
    }
    Ok(())
}

async fn units(app: &AppServices, subject_id: &str, out: &mut impl Write) -> Result<()> {
    let paths = app.paths();
    if paths.catalog().subject(subject_id).is_none() {
        bail!("unknown subject {subject_id}");
    }
    for node in paths.subject_path(subject_id).await {
        writeln!(
            out,
            "[{:<9}] {:<18} {:<22} {}/{} ({}%)",
            status_label(node.status),
            node.unit.id,
            node.unit.name,
            node.completed,
            node.total,
            node.percent
        )?;
    }
    Ok(())
}

async fn lessons(app: &AppServices, unit_id: &str, out: &mut impl Write) -> Result<()> {
    let paths = app.paths();
    if paths.catalog().unit(unit_id).is_none() {
        bail!("unknown unit {unit_id}");
    }
    for node in paths.unit_path(unit_id).await {
        let quiz = match (node.has_quiz, node.best_score) {
            (true, Some(best)) => format!("quiz best {best}%"),
            (true, None) => "quiz".to_owned(),
            (false, _) => String::new(),
        };
        writeln!(
            out,
            "[{:<9}] {:<12} {:<28} +{} XP  {}  {}",
            status_label(node.status),
            node.lesson.id,
            node.lesson.title,
            node.lesson.xp_reward,
            node.lesson.duration,
            quiz
        )?;
    }
    Ok(())
}

fn describe_sync(status: &SyncStatus) -> String {
    let network = if status.is_online { "online" } else { "offline" };
    let pending = if status.pending_changes {
        "changes pending"
    } else {
        "up to date"
    };
    match status.last_synced {
        Some(at) => format!("Sync: {pending}, {network}, last synced {}", at.to_rfc3339()),
        None => format!("Sync: {pending}, {network}, never synced"),
    }
}

//
// ─── INTERACTIVE LESSON ────────────────────────────────────────────────────────
//

/// Drive a lesson session from line-based input.
///
/// Returns the completion report, or `None` if the learner quit or the input
/// ended first.
pub async fn walk_lesson(
    flow: &LessonFlowService,
    mut session: LessonSession,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Option<CompletionReport>> {
    writeln!(
        out,
        "{} ({}, +{} XP)",
        session.lesson().title,
        session.lesson().duration,
        session.lesson().xp_reward
    )?;
    render(&session, out)?;

    loop {
        let Some(line) = read_line(input)? else {
            writeln!(out, "Input closed; lesson not finished.")?;
            return Ok(None);
        };
        let cmd = line.trim();
        if cmd.eq_ignore_ascii_case("q") {
            writeln!(out, "Lesson left unfinished.")?;
            return Ok(None);
        }

        let awaiting_answer = session
            .quiz_session()
            .is_some_and(|quiz| quiz.selected().is_none());
        if awaiting_answer {
            answer(flow, &mut session, cmd, out)?;
            continue;
        }
        if cmd.eq_ignore_ascii_case("p") && session.current_content().is_some() {
            session.previous()?;
            render(&session, out)?;
            continue;
        }

        let step = flow.advance(&mut session).await?;
        if let Some(report) = step.report {
            print_report(&report, out)?;
            return Ok(Some(report));
        }
        render(&session, out)?;
    }
}

fn answer(
    flow: &LessonFlowService,
    session: &mut LessonSession,
    cmd: &str,
    out: &mut impl Write,
) -> Result<()> {
    let Some(index) = cmd.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
        writeln!(out, "Type an option number.")?;
        return Ok(());
    };

    match flow.select_answer(session, index) {
        Ok(AnswerOutcome::Recorded(feedback)) => {
            if feedback.correct {
                writeln!(out, "Correct!")?;
            } else {
                let right = session
                    .quiz_session()
                    .and_then(|quiz| quiz.current_question())
                    .and_then(|q| q.options.get(feedback.correct_index))
                    .map_or("?", String::as_str);
                writeln!(out, "Not quite. The answer is: {right}")?;
            }
            if !feedback.explanation.is_empty() {
                writeln!(out, "{}", feedback.explanation)?;
            }
            writeln!(out, "(enter: continue)")?;
        }
        Ok(AnswerOutcome::Ignored) => {}
        Err(err) => writeln!(out, "{err}")?,
    }
    Ok(())
}

fn render(session: &LessonSession, out: &mut impl Write) -> io::Result<()> {
    if let Some(item) = session.current_content() {
        let progress = session.progress();
        writeln!(
            out,
            "\n[{}/{}] {}: {}",
            progress.position + 1,
            progress.total,
            kind_label(item.kind),
            item.body
        )?;
        return writeln!(out, "(enter: next, p: back, q: quit)");
    }

    let Some(quiz) = session.quiz_session() else {
        return Ok(());
    };
    let Some(question) = quiz.current_question() else {
        return Ok(());
    };
    let progress = quiz.progress();
    writeln!(
        out,
        "\nQuestion {}/{}: {}",
        progress.position + 1,
        progress.total,
        question.prompt
    )?;
    for (i, option) in question.options.iter().enumerate() {
        writeln!(out, "  {}. {option}", i + 1)?;
    }
    writeln!(out, "(number: answer, q: quit)")
}

fn print_report(report: &CompletionReport, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "\nLesson complete!")?;
    if let Some(result) = &report.completion.quiz {
        let verdict = if result.passed() { "passed" } else { "keep practising" };
        writeln!(
            out,
            "Quiz: {}/{} ({}%), {verdict}",
            result.score,
            result.total,
            result.percent()
        )?;
    }
    if !report.lesson.is_new() {
        writeln!(out, "Already completed before; no lesson XP this time.")?;
    }
    writeln!(
        out,
        "+{} XP. Total {} XP, streak {}.",
        report.earned_xp(),
        report.progress.xp(),
        report.progress.streak()
    )
}

fn kind_label(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Text => "Text",
        ContentKind::Image => "Image",
        ContentKind::Example => "Example",
        ContentKind::Formula => "Formula",
        ContentKind::Tip => "Tip",
    }
}

fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("reading input")?;
    Ok((read > 0).then_some(line))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
