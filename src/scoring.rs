// src/scoring.rs

//! Grading and leaderboard ranking.
//!
//! Everything here is pure: callers load the quiz and the leaderboard rows,
//! and persist results, on their own.

use std::{cmp::Ordering, collections::HashMap};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    quiz::Quiz,
    result::{GradedAnswer, LeaderboardEntry, LeaderboardRow, QuizResult, SubmittedAnswer},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("quiz '{0}' has no questions")]
    InvalidQuizDefinition(String),

    #[error("cannot compute a percentage over zero items")]
    DenominatorZero,
}

/// Which completion wins when score and time spent are both equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    EarliestFirst,
    MostRecentFirst,
}

/// Earliest completion wins exact score/time ties.
pub const COMPLETION_TIE_BREAK: TieBreak = TieBreak::EarliestFirst;

/// `round(100 * numerator / denominator)`, rounding halves up.
///
/// Integer arithmetic keeps the result exact for every input.
pub fn round_percent(numerator: usize, denominator: usize) -> Result<i32, QuizError> {
    if denominator == 0 {
        return Err(QuizError::DenominatorZero);
    }
    Ok(((200 * numerator + denominator) / (2 * denominator)) as i32)
}

/// Maps a submitted option to a position in a list of `option_count` options.
/// Non-finite, negative, fractional and out-of-range values map to nothing.
pub fn option_index(value: f64, option_count: usize) -> Option<usize> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= option_count as f64 {
        return None;
    }
    Some(value as usize)
}

/// Grades a submission against the answer key, stamped with the current time.
pub fn grade_submission(
    quiz: &Quiz,
    answers: &[SubmittedAnswer],
    total_time_spent: f64,
) -> Result<QuizResult, QuizError> {
    grade_submission_at(quiz, answers, total_time_spent, Utc::now())
}

/// Grades a submission against the answer key.
///
/// Answers are matched to questions by question id. Questions with no
/// matching answer, answers with an out-of-range option and answers for
/// unknown questions all count as incorrect; none of them is an error.
/// When several answers name the same question the first one is used.
///
/// `score` is taken over every question of the quiz, so partial
/// submissions are penalised for what they skip.
pub fn grade_submission_at(
    quiz: &Quiz,
    answers: &[SubmittedAnswer],
    total_time_spent: f64,
    completed_at: DateTime<Utc>,
) -> Result<QuizResult, QuizError> {
    let total_questions = quiz.questions.len();
    if total_questions == 0 {
        return Err(QuizError::InvalidQuizDefinition(quiz.id.clone()));
    }

    let mut by_question: HashMap<&str, &SubmittedAnswer> = HashMap::with_capacity(answers.len());
    for answer in answers {
        by_question.entry(answer.question_id.as_str()).or_insert(answer);
    }

    let even_split = total_time_spent / total_questions as f64;

    let graded: Vec<GradedAnswer> = quiz
        .questions
        .iter()
        .map(|question| {
            let submitted = by_question.get(question.id.as_str());
            let selected_option = submitted.and_then(|a| a.selected_option);
            let is_correct = selected_option
                .and_then(|value| option_index(value, question.options.len()))
                .is_some_and(|idx| idx == question.correct_answer);

            GradedAnswer {
                question_id: question.id.clone(),
                selected_option,
                is_correct,
                time_spent: submitted.and_then(|a| a.time_spent).unwrap_or(even_split),
            }
        })
        .collect();

    let correct_answers = graded.iter().filter(|a| a.is_correct).count();
    let score = round_percent(correct_answers, total_questions)?;

    Ok(QuizResult {
        session_id: Uuid::new_v4(),
        quiz_id: quiz.id.clone(),
        user_id: None,
        score,
        total_questions,
        correct_answers,
        time_spent: total_time_spent,
        answers: graded,
        completed_at,
        rank: None,
        percentile: None,
    })
}

/// Leaderboard order: score descending, time spent ascending, then
/// completion time per `tie_break`. Session id settles anything left so the
/// order is total.
pub fn compare_rows(a: &LeaderboardRow, b: &LeaderboardRow, tie_break: TieBreak) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.time_spent.total_cmp(&b.time_spent))
        .then_with(|| match tie_break {
            TieBreak::EarliestFirst => a.completed_at.cmp(&b.completed_at),
            TieBreak::MostRecentFirst => b.completed_at.cmp(&a.completed_at),
        })
        .then_with(|| a.session_id.cmp(&b.session_id))
}

pub fn sort_leaderboard(rows: &mut [LeaderboardRow]) {
    rows.sort_by(|a, b| compare_rows(a, b, COMPLETION_TIE_BREAK));
}

/// Sorts rows and assigns contiguous 1-based ranks, keeping the first `limit`.
/// Exact ties still get distinct ranks.
pub fn rank_rows(mut rows: Vec<LeaderboardRow>, limit: usize) -> Vec<LeaderboardEntry> {
    sort_leaderboard(&mut rows);
    rows.iter()
        .take(limit)
        .enumerate()
        .map(|(idx, row)| LeaderboardEntry::from_row(row, idx + 1))
        .collect()
}

/// `round(100 * (n - rank + 1) / n)`; 100 for an empty or single-entry board.
pub fn percentile(rank: usize, participants: usize) -> i32 {
    if participants == 0 {
        return 100;
    }
    let rank = rank.clamp(1, participants);
    round_percent(participants - rank + 1, participants).unwrap_or(100)
}

/// Where a submission lands among all completions of its quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub rank: usize,
    pub percentile: i32,
    pub participants: usize,
}

#[derive(Debug, Clone)]
pub struct RankedBoard {
    pub standing: Standing,

    /// Every participant, sorted, candidate included.
    pub rows: Vec<LeaderboardRow>,
}

impl RankedBoard {
    pub fn top(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.rows
            .iter()
            .take(limit)
            .enumerate()
            .map(|(idx, row)| LeaderboardEntry::from_row(row, idx + 1))
            .collect()
    }
}

/// Ranks `candidate` against the quiz's persisted completions.
///
/// The candidate always counts as a participant. `existing` may already
/// contain it (read back after saving); rows with the candidate's session id
/// are not counted twice.
pub fn rank_submission(candidate: &LeaderboardRow, existing: &[LeaderboardRow]) -> RankedBoard {
    let mut rows: Vec<LeaderboardRow> = existing
        .iter()
        .filter(|row| row.session_id != candidate.session_id)
        .cloned()
        .collect();
    rows.push(candidate.clone());
    sort_leaderboard(&mut rows);

    let participants = rows.len();
    let rank = rows
        .iter()
        .position(|row| row.session_id == candidate.session_id)
        .map_or(1, |idx| idx + 1);

    RankedBoard {
        standing: Standing {
            rank,
            percentile: percentile(rank, participants),
            participants,
        },
        rows,
    }
}

impl QuizResult {
    pub fn apply_standing(&mut self, standing: Standing) {
        self.rank = Some(standing.rank);
        self.percentile = Some(standing.percentile);
    }
}
