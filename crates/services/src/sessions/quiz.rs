use std::fmt;

use tutor_core::catalog::{Question, Quiz};
use tutor_core::model::QuizId;

use super::progress::StepProgress;
use crate::error::QuizError;

/// Lowest percent that counts as a pass.
pub const PASSING_PERCENT: u8 = 70;

/// Whole percent of `score` over `total`, rounded half up. Empty totals read 0.
#[must_use]
pub fn score_percent(score: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let score = score.min(total);
    let rounded = (score * 200 + total) / (total * 2);
    u8::try_from(rounded).unwrap_or(100)
}

//
// ─── STATE & EVENTS ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    InProgress {
        question_index: usize,
        selected: Option<usize>,
        correct_count: usize,
    },
    Finished {
        score: usize,
        total: usize,
    },
}

/// Final tally of a finished quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub quiz_id: QuizId,
    pub score: usize,
    pub total: usize,
}

impl QuizResult {
    #[must_use]
    pub fn percent(&self) -> u8 {
        score_percent(self.score, self.total)
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.percent() >= PASSING_PERCENT
    }
}

/// What the learner sees after picking an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub selected: usize,
    pub correct: bool,
    pub correct_index: usize,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded(AnswerFeedback),
    /// The current question was already answered; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizAdvance {
    NextQuestion { question_index: usize },
    Finished(QuizResult),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One pass through a quiz: answer each question once, then advance.
#[derive(Clone)]
pub struct QuizSession {
    quiz: Quiz,
    state: QuizState,
}

impl QuizSession {
    /// # Errors
    ///
    /// Returns `QuizError::Empty` if the quiz has no questions.
    pub fn new(quiz: Quiz) -> Result<Self, QuizError> {
        if quiz.questions.is_empty() {
            return Err(QuizError::Empty(quiz.id));
        }
        Ok(Self {
            quiz,
            state: QuizState::InProgress {
                question_index: 0,
                selected: None,
                correct_count: 0,
            },
        })
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn state(&self) -> QuizState {
        self.state
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.quiz.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            QuizState::InProgress { question_index, .. } => self.quiz.questions.get(question_index),
            QuizState::Finished { .. } => None,
        }
    }

    /// Option picked for the current question, if any.
    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        match self.state {
            QuizState::InProgress { selected, .. } => selected,
            QuizState::Finished { .. } => None,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, QuizState::Finished { .. })
    }

    #[must_use]
    pub fn result(&self) -> Option<QuizResult> {
        match self.state {
            QuizState::Finished { score, total } => Some(QuizResult {
                quiz_id: self.quiz.id.clone(),
                score,
                total,
            }),
            QuizState::InProgress { .. } => None,
        }
    }

    #[must_use]
    pub fn progress(&self) -> StepProgress {
        let total = self.total_questions();
        match self.state {
            QuizState::InProgress { question_index, .. } => StepProgress {
                position: question_index,
                total,
                is_complete: false,
            },
            QuizState::Finished { .. } => StepProgress {
                position: total,
                total,
                is_complete: true,
            },
        }
    }

    /// Answer the current question.
    ///
    /// Only the first selection per question counts; later ones are ignored.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Finished` after the last question, or
    /// `QuizError::OptionOutOfRange` for an index outside the options. The
    /// state is unchanged on error.
    pub fn select_answer(&mut self, index: usize) -> Result<AnswerOutcome, QuizError> {
        let QuizState::InProgress {
            question_index,
            selected,
            correct_count,
        } = self.state
        else {
            return Err(QuizError::Finished);
        };
        let question = self
            .quiz
            .questions
            .get(question_index)
            .ok_or(QuizError::Finished)?;

        if index >= question.options.len() {
            return Err(QuizError::OptionOutOfRange {
                index,
                options: question.options.len(),
            });
        }
        if selected.is_some() {
            return Ok(AnswerOutcome::Ignored);
        }

        let correct = question.is_correct(index);
        let feedback = AnswerFeedback {
            selected: index,
            correct,
            correct_index: question.correct_index,
            explanation: question.explanation.clone(),
        };
        self.state = QuizState::InProgress {
            question_index,
            selected: Some(index),
            correct_count: correct_count + usize::from(correct),
        };
        Ok(AnswerOutcome::Recorded(feedback))
    }

    /// Move past the answered question, finishing after the last one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Unanswered` if no option was picked yet, or
    /// `QuizError::Finished` if the quiz is already over.
    pub fn advance(&mut self) -> Result<QuizAdvance, QuizError> {
        let QuizState::InProgress {
            question_index,
            selected,
            correct_count,
        } = self.state
        else {
            return Err(QuizError::Finished);
        };
        if selected.is_none() {
            return Err(QuizError::Unanswered);
        }

        let next = question_index + 1;
        if next < self.total_questions() {
            self.state = QuizState::InProgress {
                question_index: next,
                selected: None,
                correct_count,
            };
            return Ok(QuizAdvance::NextQuestion {
                question_index: next,
            });
        }

        self.state = QuizState::Finished {
            score: correct_count,
            total: self.total_questions(),
        };
        self.result()
            .map(QuizAdvance::Finished)
            .ok_or(QuizError::Finished)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", &self.quiz.id)
            .field("questions_len", &self.quiz.questions.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
