//! Domain models used by the backend: question types/categories, tests, users,
//! and the result/answer records produced by a submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a question is answered, and therefore which evaluation rule applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  /// Correct answer is an option key ("a", "b", ...).
  MultipleChoice,
  /// Typed answer; the stored key may list several accepted values separated by commas.
  TextInput,
  NumberInput,
  /// Ordered, comma-joined list of directions ("up,down,right,left").
  KeySequence,
  /// Anything this build does not know about. Compared by exact normalized equality.
  #[serde(other)]
  Unknown,
}

/// Cognitive domain a question belongs to. Used for reporting only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  AnalyticalReasoning,
  WorkingMemory,
  ProcessingSpeed,
  AttentionFocus,
  EmotionalRegulation,
}

impl Category {
  pub fn as_str(self) -> &'static str {
    match self {
      Category::AnalyticalReasoning => "analytical_reasoning",
      Category::WorkingMemory => "working_memory",
      Category::ProcessingSpeed => "processing_speed",
      Category::AttentionFocus => "attention_focus",
      Category::EmotionalRegulation => "emotional_regulation",
    }
  }
}

/// One item of a test. Created at seed time, never mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
  pub id: u64,
  pub test_id: u64,
  pub question_text: String,
  pub question_type: QuestionType,
  pub category: Category,
  /// JSON array of option labels, for multiple choice only.
  #[serde(default)] pub options: Option<String>,
  pub correct_answer: String,
  pub time_limit: u32,    // seconds
  pub display_time: u32,  // seconds the stimulus stays visible (memory items), 0 = n/a
  pub order_index: u32,
}

/// Test metadata. Its questions live in the store and are fetched by `test_id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Test {
  pub id: u64,
  pub name: String,
  pub description: String,
  pub duration: u32, // minutes
  pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct User {
  pub id: u64,
  pub email: String,
  pub password_hash: String,
  pub first_name: String,
  pub last_name: String,
  pub created_at: DateTime<Utc>,
}

/// One attempt at a test by one user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestResult {
  pub id: u64,
  pub user_id: u64,
  pub test_id: u64,
  pub score: u32,
  pub total_questions: u32,
  pub time_taken: u32, // seconds
  pub started_at: DateTime<Utc>,
  pub completed_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

/// Persisted, evaluated answer. Immutable once written.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Answer {
  pub id: u64,
  pub test_result_id: u64,
  pub question_id: u64,
  pub user_answer: String,
  pub is_correct: bool,
  pub response_time: u32, // milliseconds
}

/// Transient input: one answer as submitted by the client.
#[derive(Clone, Debug)]
pub struct SubmittedAnswer {
  pub question_id: u64,
  pub user_answer: String,
  pub response_time: u32,
}
