// src/store/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json};

use super::{QuizStore, seed};
use crate::{
    error::AppError,
    models::{
        quiz::{Difficulty, Question, Quiz},
        result::{LeaderboardRow, QuizResult, Submitter},
    },
};

const QUIZ_COLUMNS: &str = r#"
    SELECT
        q.id,
        q.title,
        q.description,
        c.name AS category,
        q.difficulty,
        q.time_limit,
        q.total_questions,
        q.image_url
    FROM quizzes q
    LEFT JOIN categories c ON q.category_id = c.id
    WHERE q.is_active = TRUE
"#;

/// Helper struct for a `quizzes` row joined with its category name.
#[derive(sqlx::FromRow)]
struct QuizRow {
    id: String,
    title: String,
    description: String,
    category: Option<String>,
    difficulty: String,
    time_limit: Option<i32>,
    total_questions: i32,
    image_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    quiz_id: String,
    id: String,
    text: String,
    options: Json<Vec<String>>,
    correct_answer: i32,
    explanation: Option<String>,
    image_url: Option<String>,
}

impl QuestionRow {
    fn into_question(self) -> Question {
        Question {
            id: self.id,
            text: self.text,
            options: self.options.0,
            // A negative key can never match a submitted index.
            correct_answer: usize::try_from(self.correct_answer).unwrap_or(usize::MAX),
            explanation: self.explanation,
            image_url: self.image_url,
        }
    }
}

fn into_quiz(row: QuizRow, questions: Vec<Question>) -> Quiz {
    Quiz {
        id: row.id,
        title: row.title,
        description: row.description,
        category: row.category.unwrap_or_else(|| "Unknown".to_string()),
        difficulty: Difficulty::from_db(&row.difficulty),
        questions,
        time_limit: row.time_limit.and_then(|t| u32::try_from(t).ok()),
        total_questions: usize::try_from(row.total_questions).unwrap_or_default(),
        image_url: row.image_url,
    }
}

#[derive(Clone)]
pub struct PgQuizStore {
    pool: PgPool,
}

impl PgQuizStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads questions for `quiz_ids`, grouped by quiz and in display order.
    async fn questions_for(&self, quiz_ids: &[String]) -> Result<HashMap<String, Vec<Question>>, AppError> {
        let rows: Vec<QuestionRow> = sqlx::query_as(
            r#"
            SELECT quiz_id, id, text, options, correct_answer, explanation, image_url
            FROM questions
            WHERE quiz_id = ANY($1)
            ORDER BY quiz_id, order_index
            "#,
        )
        .bind(quiz_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        let mut grouped: HashMap<String, Vec<Question>> = HashMap::new();
        for row in rows {
            grouped.entry(row.quiz_id.clone()).or_default().push(row.into_question());
        }
        Ok(grouped)
    }

    /// Inserts the built-in catalogue when the `quizzes` table is empty.
    pub async fn seed_defaults(&self) -> Result<usize, AppError> {
        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quizzes")
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            return Ok(0);
        }

        let quizzes = seed::default_quizzes();
        let mut tx = self.pool.begin().await?;

        for quiz in &quizzes {
            let (category_id,): (uuid::Uuid,) = sqlx::query_as(
                r#"
                INSERT INTO categories (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(&quiz.category)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO quizzes
                    (id, title, description, category_id, difficulty, time_limit, total_questions, image_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(&quiz.id)
            .bind(&quiz.title)
            .bind(&quiz.description)
            .bind(category_id)
            .bind(quiz.difficulty.as_str())
            .bind(quiz.time_limit.map(|t| t as i32))
            .bind(quiz.questions.len() as i32)
            .bind(&quiz.image_url)
            .execute(&mut *tx)
            .await?;

            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO questions (quiz_id, id, text, options, correct_answer, explanation, image_url, order_index) ",
            );
            builder.push_values(quiz.questions.iter().enumerate(), |mut b, (idx, q)| {
                b.push_bind(&quiz.id)
                    .push_bind(&q.id)
                    .push_bind(&q.text)
                    .push_bind(Json(&q.options))
                    .push_bind(q.correct_answer as i32)
                    .push_bind(&q.explanation)
                    .push_bind(&q.image_url)
                    .push_bind(idx as i32);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(quizzes.len())
    }
}

#[async_trait]
impl QuizStore for PgQuizStore {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let rows: Vec<QuizRow> = sqlx::query_as(&format!("{} ORDER BY q.created_at DESC", QUIZ_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch quizzes: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut questions = self.questions_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let qs = questions.remove(&row.id).unwrap_or_default();
                into_quiz(row, qs)
            })
            .collect())
    }

    async fn find_quiz(&self, id: &str) -> Result<Option<Quiz>, AppError> {
        let row: Option<QuizRow> = sqlx::query_as(&format!("{} AND q.id = $1", QUIZ_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch quiz {}: {:?}", id, e);
                AppError::InternalServerError(e.to_string())
            })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut questions = self.questions_for(std::slice::from_ref(&row.id)).await?;
        let qs = questions.remove(&row.id).unwrap_or_default();
        Ok(Some(into_quiz(row, qs)))
    }

    async fn save_session(&self, result: &QuizResult, submitter: &Submitter) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO quiz_sessions
                (id, quiz_id, fid, username, display_name, profile_image,
                 score, correct_answers, total_questions, time_spent, completed_at, is_completed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, TRUE)
            "#,
        )
        .bind(result.session_id)
        .bind(&result.quiz_id)
        .bind(submitter.fid)
        .bind(submitter.username())
        .bind(submitter.display_name())
        .bind(&submitter.pfp_url)
        .bind(result.score)
        .bind(result.correct_answers as i32)
        .bind(result.total_questions as i32)
        .bind(result.time_spent)
        .bind(result.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save quiz session: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        if result.answers.is_empty() {
            return Ok(());
        }

        // Per-answer rows only feed analytics; losing them does not fail the save.
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO user_answers (session_id, question_id, selected_option, is_correct, time_spent) ",
        );
        builder.push_values(&result.answers, |mut b, answer| {
            b.push_bind(result.session_id)
                .push_bind(&answer.question_id)
                .push_bind(answer.selected_option)
                .push_bind(answer.is_correct)
                .push_bind(answer.time_spent);
        });
        if let Err(e) = builder.build().execute(&self.pool).await {
            tracing::warn!("Failed to save individual answers for {}: {:?}", result.session_id, e);
        }

        Ok(())
    }

    async fn leaderboard_rows(&self, quiz_id: &str) -> Result<Vec<LeaderboardRow>, AppError> {
        sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT
                id AS session_id,
                fid,
                username,
                display_name,
                profile_image,
                score,
                time_spent,
                completed_at
            FROM quiz_sessions
            WHERE quiz_id = $1 AND is_completed = TRUE
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard for {}: {:?}", quiz_id, e);
            AppError::InternalServerError(e.to_string())
        })
    }

    async fn top_rows(&self, quiz_id: &str, limit: usize) -> Result<Vec<LeaderboardRow>, AppError> {
        // Same order as `scoring::compare_rows` with the earliest-completion tie-break.
        sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT
                id AS session_id,
                fid,
                username,
                display_name,
                profile_image,
                score,
                time_spent,
                completed_at
            FROM quiz_sessions
            WHERE quiz_id = $1 AND is_completed = TRUE
            ORDER BY score DESC, time_spent ASC, completed_at ASC, id ASC
            LIMIT $2
            "#,
        )
        .bind(quiz_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch top entries for {}: {:?}", quiz_id, e);
            AppError::InternalServerError(e.to_string())
        })
    }
}
