// src/store/memory.rs

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{QuizStore, seed};
use crate::{
    error::AppError,
    models::{
        quiz::Quiz,
        result::{LeaderboardRow, QuizResult, Submitter},
    },
    scoring::sort_leaderboard,
};

/// Process-local store used when no database is configured.
/// Sessions are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryQuizStore {
    quizzes: Vec<Quiz>,
    sessions: RwLock<Vec<(String, LeaderboardRow)>>,
}

impl MemoryQuizStore {
    pub fn new(quizzes: Vec<Quiz>) -> Self {
        Self {
            quizzes,
            sessions: RwLock::new(Vec::new()),
        }
    }

    /// Store preloaded with the built-in catalogue.
    pub fn seeded() -> Self {
        Self::new(seed::default_quizzes())
    }
}

#[async_trait]
impl QuizStore for MemoryQuizStore {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        Ok(self.quizzes.clone())
    }

    async fn find_quiz(&self, id: &str) -> Result<Option<Quiz>, AppError> {
        Ok(self.quizzes.iter().find(|quiz| quiz.id == id).cloned())
    }

    async fn save_session(&self, result: &QuizResult, submitter: &Submitter) -> Result<(), AppError> {
        let row = LeaderboardRow::from_result(result, Some(submitter));
        self.sessions.write().await.push((result.quiz_id.clone(), row));
        Ok(())
    }

    async fn leaderboard_rows(&self, quiz_id: &str) -> Result<Vec<LeaderboardRow>, AppError> {
        Ok(self
            .sessions
            .read()
            .await
            .iter()
            .filter(|(id, _)| id == quiz_id)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn top_rows(&self, quiz_id: &str, limit: usize) -> Result<Vec<LeaderboardRow>, AppError> {
        let mut rows = self.leaderboard_rows(quiz_id).await?;
        sort_leaderboard(&mut rows);
        rows.truncate(limit);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::grade_submission;

    #[tokio::test]
    async fn sessions_are_kept_per_quiz() {
        let store = MemoryQuizStore::seeded();
        let quiz = store.find_quiz("crypto-basics").await.unwrap().unwrap();
        let submitter = Submitter {
            fid: 7,
            username: Some("seven".into()),
            display_name: None,
            pfp_url: None,
        };

        let mut result = grade_submission(&quiz, &[], 30.0).unwrap();
        result.user_id = Some(submitter.fid);
        store.save_session(&result, &submitter).await.unwrap();

        let rows = store.leaderboard_rows("crypto-basics").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fid, 7);
        assert_eq!(rows[0].session_id, result.session_id);
        assert!(store.leaderboard_rows("nft-knowledge").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn top_rows_are_ordered_and_limited() {
        let store = MemoryQuizStore::seeded();
        let quiz = store.find_quiz("web3-advanced").await.unwrap().unwrap();

        for (fid, time_spent) in [(1, 90.0), (2, 30.0), (3, 60.0)] {
            let submitter = Submitter {
                fid,
                username: None,
                display_name: None,
                pfp_url: None,
            };
            let mut result = grade_submission(&quiz, &[], time_spent).unwrap();
            result.user_id = Some(fid);
            store.save_session(&result, &submitter).await.unwrap();
        }

        let top = store.top_rows("web3-advanced", 2).await.unwrap();
        let fids: Vec<i64> = top.iter().map(|row| row.fid).collect();
        assert_eq!(fids, vec![2, 3]);
    }

    #[tokio::test]
    async fn unknown_quiz_is_none() {
        let store = MemoryQuizStore::seeded();
        assert!(store.find_quiz("missing").await.unwrap().is_none());
        assert_eq!(store.list_quizzes().await.unwrap().len(), 3);
    }
}
