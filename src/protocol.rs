//! Public request/response structs for the HTTP API (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{Answer, Category, Question, QuestionType, Test, TestResult, User};

/// Success envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn ok<T: Serialize>(message: &'static str, data: T) -> Envelope<T> {
    Envelope { success: true, message, data: Some(data) }
}

//
// Auth
//

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterIn {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginIn {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// User as shown to clients. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserOut {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub user: UserOut,
    pub token: String,
}

//
// Questions
//

#[derive(Debug, Deserialize)]
pub struct QuestionsQuery {
    pub test_id: Option<String>,
}

/// Question for display: everything except the correct answer.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub id: u64,
    pub test_id: u64,
    pub question_text: String,
    pub question_type: QuestionType,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    pub time_limit: u32,
    pub display_time: u32,
    pub order_index: u32,
}

/// Convert a full `Question` (internal) to the public DTO.
pub fn to_out(q: &Question) -> QuestionOut {
    QuestionOut {
        id: q.id,
        test_id: q.test_id,
        question_text: q.question_text.clone(),
        question_type: q.question_type,
        category: q.category,
        options: q.options.clone(),
        time_limit: q.time_limit,
        display_time: q.display_time,
        order_index: q.order_index,
    }
}

//
// Submission
//

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitIn {
    #[validate(required(message = "is required"), range(min = 1, message = "must be positive"))]
    pub test_id: Option<u64>,
    #[validate(required(message = "is required"), nested)]
    pub answers: Option<Vec<SubmitAnswerIn>>,
    #[serde(default)]
    pub time_taken: u32,
}

// Serialize is needed by validator to report nested failures.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitAnswerIn {
    #[validate(required(message = "is required"), range(min = 1, message = "must be positive"))]
    pub question_id: Option<u64>,
    #[serde(default)]
    pub user_answer: String,
    #[serde(default)]
    pub response_time: u32,
}

//
// Results
//

#[derive(Debug, Clone, Serialize)]
pub struct TestSummary {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub duration: u32,
}

impl From<&Test> for TestSummary {
    fn from(t: &Test) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            description: t.description.clone(),
            duration: t.duration,
        }
    }
}

/// Result with its test; answers only when the shape calls for them.
#[derive(Debug, Serialize)]
pub struct ResultOut {
    #[serde(flatten)]
    pub result: TestResult,
    pub test: TestSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,
}

#[derive(Debug, Serialize)]
pub struct AnswerDetail {
    #[serde(flatten)]
    pub answer: Answer,
    pub question: QuestionOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub category: Category,
    pub correct: u32,
    pub total: u32,
}

#[derive(Debug, Serialize)]
pub struct ResultDetailOut {
    #[serde(flatten)]
    pub result: TestResult,
    pub test: TestSummary,
    pub answers: Vec<AnswerDetail>,
    pub categories: Vec<CategoryScore>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
