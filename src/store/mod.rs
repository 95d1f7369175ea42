// src/store/mod.rs

pub mod memory;
pub mod postgres;
pub mod seed;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        quiz::Quiz,
        result::{LeaderboardRow, QuizResult, Submitter},
    },
};

pub use memory::MemoryQuizStore;
pub use postgres::PgQuizStore;

/// Persistence for quizzes and completed sessions.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Active quizzes, newest first.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError>;

    async fn find_quiz(&self, id: &str) -> Result<Option<Quiz>, AppError>;

    /// Records a completed session together with its graded answers.
    async fn save_session(&self, result: &QuizResult, submitter: &Submitter) -> Result<(), AppError>;

    /// Every completion of `quiz_id`, in no particular order.
    async fn leaderboard_rows(&self, quiz_id: &str) -> Result<Vec<LeaderboardRow>, AppError>;

    /// The best `limit` completions of `quiz_id`, in leaderboard order.
    async fn top_rows(&self, quiz_id: &str, limit: usize) -> Result<Vec<LeaderboardRow>, AppError>;
}
