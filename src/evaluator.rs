//! Answer evaluation: decides whether one submitted answer is correct for one
//! question. Pure and deterministic; no I/O, no shared state.
//!
//! Both sides are normalized first (surrounding whitespace trimmed, lower-cased).
//! Text answers may list several accepted values in the stored key, separated
//! by commas. Every other type, including types this build does not recognise,
//! compares the full normalized strings. Numeric answers get no tolerance:
//! "13" and "13.0" differ.

use crate::domain::{Question, QuestionType};
use crate::util::normalize;

pub fn evaluate_answer(question: &Question, user_answer: &str) -> bool {
  let expected = normalize(&question.correct_answer);
  let given = normalize(user_answer);

  match question.question_type {
    QuestionType::TextInput => expected.split(',').any(|candidate| candidate.trim() == given),
    QuestionType::MultipleChoice
    | QuestionType::NumberInput
    | QuestionType::KeySequence
    | QuestionType::Unknown => expected == given,
  }
}
