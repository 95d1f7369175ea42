// src/models/result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// One answer as sent by the client.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,

    /// Chosen option index as sent. Any JSON number is accepted; values that
    /// are not a whole, in-range index are graded incorrect.
    #[serde(default)]
    pub selected_option: Option<f64>,

    /// Seconds spent on this question, when the client tracks it.
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub time_spent: Option<f64>,
}

/// A submitted answer after comparison with the answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedAnswer {
    pub question_id: String,
    pub selected_option: Option<f64>,
    pub is_correct: bool,
    pub time_spent: f64,
}

/// The Farcaster user behind a submission.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Submitter {
    #[validate(range(min = 1))]
    pub fid: i64,
    #[validate(length(max = 64))]
    pub username: Option<String>,
    #[validate(length(max = 128))]
    pub display_name: Option<String>,
    #[validate(length(max = 2048))]
    pub pfp_url: Option<String>,
}

impl Submitter {
    /// `username`, or `user_{fid}` when the profile has none.
    pub fn username(&self) -> String {
        username_or_default(self.fid, self.username.as_deref())
    }

    /// `displayName`, then `username`, then `User {fid}`.
    pub fn display_name(&self) -> String {
        display_name_or_default(self.fid, self.display_name.as_deref(), self.username.as_deref())
    }
}

pub fn username_or_default(fid: i64, username: Option<&str>) -> String {
    match username {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("user_{}", fid),
    }
}

pub fn display_name_or_default(fid: i64, display_name: Option<&str>, username: Option<&str>) -> String {
    match (display_name, username) {
        (Some(name), _) if !name.is_empty() => name.to_string(),
        (_, Some(name)) if !name.is_empty() => name.to_string(),
        _ => format!("User {}", fid),
    }
}

/// Outcome of grading one submission.
/// `rank` and `percentile` stay `None` until the ranking step fills them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub session_id: Uuid,
    pub quiz_id: String,

    /// Submitter fid; `None` for anonymous play.
    pub user_id: Option<i64>,

    pub score: i32,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub time_spent: f64,
    pub answers: Vec<GradedAnswer>,
    pub completed_at: DateTime<Utc>,
    pub rank: Option<usize>,
    pub percentile: Option<i32>,
}

/// A persisted completion, as loaded back for ranking.
/// Maps the `quiz_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRow {
    pub session_id: Uuid,
    pub fid: i64,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub profile_image: Option<String>,
    pub score: i32,
    pub time_spent: f64,
    pub completed_at: DateTime<Utc>,
}

impl LeaderboardRow {
    /// Builds the row a result would occupy once saved.
    pub fn from_result(result: &QuizResult, submitter: Option<&Submitter>) -> Self {
        Self {
            session_id: result.session_id,
            fid: result.user_id.unwrap_or(0),
            username: submitter.map(Submitter::username),
            display_name: submitter.map(Submitter::display_name),
            profile_image: submitter.and_then(|s| s.pfp_url.clone()),
            score: result.score,
            time_spent: result.time_spent,
            completed_at: result.completed_at,
        }
    }
}

/// Ranked leaderboard line sent to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub profile_image: Option<String>,
    pub score: i32,
    pub time_spent: f64,
    pub completed_at: DateTime<Utc>,
    pub rank: usize,
}

impl LeaderboardEntry {
    pub fn from_row(row: &LeaderboardRow, rank: usize) -> Self {
        Self {
            user_id: row.fid.to_string(),
            username: username_or_default(row.fid, row.username.as_deref()),
            display_name: display_name_or_default(
                row.fid,
                row.display_name.as_deref(),
                row.username.as_deref(),
            ),
            profile_image: row.profile_image.clone(),
            score: row.score,
            time_spent: row.time_spent,
            completed_at: row.completed_at,
            rank,
        }
    }
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1, max = 100, message = "quizId must not be empty"))]
    pub quiz_id: String,

    #[validate(nested)]
    pub answers: Vec<SubmittedAnswer>,

    /// Total seconds spent on the quiz.
    #[validate(range(min = 0.0, message = "timeSpent must not be negative"))]
    pub time_spent: f64,

    #[validate(nested)]
    pub user: Option<Submitter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_defaults_follow_the_fallback_chain() {
        let bare = Submitter {
            fid: 42,
            username: None,
            display_name: None,
            pfp_url: None,
        };
        assert_eq!(bare.username(), "user_42");
        assert_eq!(bare.display_name(), "User 42");

        let named = Submitter {
            username: Some("alice".into()),
            ..bare.clone()
        };
        assert_eq!(named.display_name(), "alice");

        let full = Submitter {
            display_name: Some("Alice".into()),
            ..named
        };
        assert_eq!(full.display_name(), "Alice");
    }

    #[test]
    fn submit_request_rejects_negative_time() {
        let req: SubmitQuizRequest = serde_json::from_value(serde_json::json!({
            "quizId": "crypto-basics",
            "answers": [{ "questionId": "q1", "selectedOption": 0 }],
            "timeSpent": -1.0
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn submit_request_accepts_missing_optional_fields() {
        let req: SubmitQuizRequest = serde_json::from_value(serde_json::json!({
            "quizId": "crypto-basics",
            "answers": [{ "questionId": "q1" }],
            "timeSpent": 12.5
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.user.is_none());
        assert_eq!(req.answers[0].selected_option, None);
    }
}
