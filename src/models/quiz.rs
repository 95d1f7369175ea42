// src/models/quiz.rs

use serde::{Deserialize, Serialize};

/// Difficulty label shown on quiz cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Parses the database column. Unknown labels fall back to `Medium`.
    pub fn from_db(value: &str) -> Self {
        match value {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

/// A full quiz definition, answer keys included.
/// Read-only input to grading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub questions: Vec<Question>,

    /// Time limit in seconds, if the quiz is timed.
    pub time_limit: Option<u32>,

    pub total_questions: usize,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,

    /// Options are addressed by position; indices never change for the life of a quiz.
    pub options: Vec<String>,

    /// Index into `options`.
    pub correct_answer: usize,

    pub explanation: Option<String>,
    pub image_url: Option<String>,
}

/// DTO for sending a quiz to the client (answer keys stripped).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuiz {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub questions: Vec<PublicQuestion>,
    pub time_limit: Option<u32>,
    pub total_questions: usize,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub image_url: Option<String>,
}

impl From<&Quiz> for PublicQuiz {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            category: quiz.category.clone(),
            difficulty: quiz.difficulty,
            questions: quiz
                .questions
                .iter()
                .map(|q| PublicQuestion {
                    id: q.id.clone(),
                    text: q.text.clone(),
                    options: q.options.clone(),
                    image_url: q.image_url.clone(),
                })
                .collect(),
            time_limit: quiz.time_limit,
            total_questions: quiz.total_questions,
            image_url: quiz.image_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_quiz_hides_answer_keys() {
        let quiz = Quiz {
            id: "q".into(),
            title: "T".into(),
            description: "D".into(),
            category: "C".into(),
            difficulty: Difficulty::Hard,
            questions: vec![Question {
                id: "q1".into(),
                text: "?".into(),
                options: vec!["a".into(), "b".into()],
                correct_answer: 1,
                explanation: Some("because".into()),
                image_url: None,
            }],
            time_limit: Some(60),
            total_questions: 1,
            image_url: None,
        };

        let json = serde_json::to_value(PublicQuiz::from(&quiz)).unwrap();
        assert_eq!(json["difficulty"], "hard");
        assert_eq!(json["timeLimit"], 60);
        assert!(json["questions"][0].get("correctAnswer").is_none());
        assert!(json["questions"][0].get("explanation").is_none());
    }
}
