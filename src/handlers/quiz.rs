// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        quiz::{PublicQuiz, Quiz},
        result::{LeaderboardEntry, LeaderboardRow, QuizResult, SubmitQuizRequest},
    },
    scoring::{grade_submission, rank_rows, rank_submission},
    store::QuizStore,
};

#[derive(Debug, Serialize)]
pub struct QuizListResponse {
    pub success: bool,
    pub quizzes: Vec<PublicQuiz>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizMeta {
    pub questions_count: usize,
    pub leaderboard_count: usize,
}

#[derive(Debug, Serialize)]
pub struct QuizDetailResponse {
    pub success: bool,
    pub quiz: PublicQuiz,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub meta: QuizMeta,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub success: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub result: QuizResult,
    pub leaderboard: Vec<LeaderboardEntry>,
}

async fn require_quiz(store: &dyn QuizStore, id: &str) -> Result<Quiz, AppError> {
    store.find_quiz(id).await?.ok_or_else(|| {
        tracing::info!("Quiz {} not found", id);
        AppError::NotFound("Quiz not found".to_string())
    })
}

/// Lists every active quiz with answer keys stripped.
pub async fn list_quizzes(
    State(store): State<Arc<dyn QuizStore>>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = store.list_quizzes().await?;
    tracing::info!("Fetched {} quizzes", quizzes.len());

    let quizzes: Vec<PublicQuiz> = quizzes.iter().map(PublicQuiz::from).collect();
    Ok(Json(QuizListResponse {
        success: true,
        count: quizzes.len(),
        quizzes,
    }))
}

/// Returns one quiz and its current top entries.
pub async fn get_quiz(
    State(store): State<Arc<dyn QuizStore>>,
    State(config): State<Config>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = require_quiz(store.as_ref(), &id).await?;
    let rows = store.top_rows(&quiz.id, config.leaderboard_limit).await?;
    let leaderboard = rank_rows(rows, config.leaderboard_limit);

    tracing::info!(
        "Fetched quiz \"{}\" with {} leaderboard entries",
        quiz.title,
        leaderboard.len()
    );

    Ok(Json(QuizDetailResponse {
        success: true,
        meta: QuizMeta {
            questions_count: quiz.questions.len(),
            leaderboard_count: leaderboard.len(),
        },
        quiz: PublicQuiz::from(&quiz),
        leaderboard,
    }))
}

/// Ranked top entries for one quiz.
pub async fn get_leaderboard(
    State(store): State<Arc<dyn QuizStore>>,
    State(config): State<Config>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = require_quiz(store.as_ref(), &id).await?;
    let rows = store.top_rows(&quiz.id, config.leaderboard_limit).await?;

    Ok(Json(LeaderboardResponse {
        success: true,
        leaderboard: rank_rows(rows, config.leaderboard_limit),
    }))
}

/// Grades a submission and ranks it against the quiz's leaderboard.
///
/// * Unknown questions and out-of-range options are graded incorrect.
/// * Signed-in submissions are saved before ranking; anonymous ones are
///   ranked against the board without being saved, and left out of the
///   returned leaderboard.
pub async fn submit_quiz(
    State(store): State<Arc<dyn QuizStore>>,
    State(config): State<Config>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let quiz = require_quiz(store.as_ref(), &req.quiz_id).await?;

    let mut result = grade_submission(&quiz, &req.answers, req.time_spent).map_err(|e| {
        tracing::error!("Cannot grade quiz {}: {}", quiz.id, e);
        AppError::from(e)
    })?;
    result.user_id = req.user.as_ref().map(|user| user.fid);

    if let Some(user) = &req.user {
        store.save_session(&result, user).await?;
    }

    let rows = store.leaderboard_rows(&quiz.id).await?;
    let candidate = LeaderboardRow::from_result(&result, req.user.as_ref());
    let board = rank_submission(&candidate, &rows);
    result.apply_standing(board.standing);

    tracing::info!(
        "Quiz {} submitted: score {} ({}/{}), rank {}/{}",
        quiz.id,
        result.score,
        result.correct_answers,
        result.total_questions,
        board.standing.rank,
        board.standing.participants
    );

    let leaderboard = if req.user.is_some() {
        board.top(config.leaderboard_limit)
    } else {
        rank_rows(rows, config.leaderboard_limit)
    };

    Ok(Json(SubmitResponse {
        success: true,
        leaderboard,
        result,
    }))
}
