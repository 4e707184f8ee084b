//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Registration, login and logout
//!   - Serving a test's questions for display
//!   - Processing a test submission (evaluate, score, persist)
//!   - Listing and fetching results, always scoped to the calling user
//!
//! Every operation takes the authenticated user id as an argument.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::auth::{dummy_hash, hash_password, verify_password};
use crate::domain::{Category, SubmittedAnswer, User};
use crate::error::{AppError, AppResult};
use crate::evaluator::evaluate_answer;
use crate::protocol::{
  to_out, AnswerDetail, CategoryScore, LoginIn, QuestionOut, RegisterIn, ResultDetailOut, ResultOut, TestSummary,
};
use crate::state::AppState;
use crate::store::{NewAnswer, NewTestResult, NewUser, Store};
use crate::util::{normalize, trunc_for_log};

// -------- Users & sessions --------

#[instrument(level = "info", skip(state, req), fields(email = %req.email))]
pub async fn register(state: &AppState, req: RegisterIn) -> AppResult<(User, String)> {
  let email = normalize(&req.email);
  let password = req.password;
  let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
    .await
    .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))??;

  let user = state
    .store
    .transaction(|tx| {
      tx.insert_user(NewUser {
        email,
        password_hash,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
      })
    })
    .await?;

  let token = state.sessions.issue(user.id).await;
  info!(target: "auth", user_id = user.id, "User registered");
  Ok((user, token))
}

/// Unknown email and wrong password are reported identically, and both pay
/// for one argon2 verification.
#[instrument(level = "info", skip(state, req), fields(email = %req.email))]
pub async fn login(state: &AppState, req: LoginIn) -> AppResult<(User, String)> {
  let email = normalize(&req.email);
  let invalid = || AppError::Unauthorized("Invalid credentials".into());

  let user = state
    .store
    .read(|t| t.user_by_email(&email).cloned())
    .await;

  let hash = user.as_ref().map(|u| u.password_hash.clone());
  let password = req.password;
  let matches = tokio::task::spawn_blocking(move || match hash {
    Some(hash) => verify_password(&hash, &password),
    None => {
      verify_password(dummy_hash(), &password);
      false
    }
  })
  .await
  .map_err(|e| AppError::Internal(format!("Failed to verify password: {e}")))?;
  let user = match user {
    Some(user) if matches => user,
    _ => return Err(invalid()),
  };

  let token = state.sessions.issue(user.id).await;
  info!(target: "auth", user_id = user.id, "User logged in");
  Ok((user, token))
}

#[instrument(level = "info", skip_all)]
pub async fn logout(state: &AppState, token: Option<&str>) {
  if let Some(token) = token {
    let revoked = state.sessions.revoke(token).await;
    debug!(target: "auth", revoked, "Logout");
  }
}

// -------- Question catalog --------

/// Questions of a test in display order, correct answers stripped.
/// An unknown test simply has no questions.
#[instrument(level = "info", skip(store))]
pub async fn questions_for_display(store: &Store, test_id: u64) -> Vec<QuestionOut> {
  store
    .read(|t| t.questions_for_test(test_id).into_iter().map(to_out).collect())
    .await
}

// -------- Submission --------

/// Evaluate and persist one test attempt.
///
/// Runs as a single store transaction: the result shell is created, each
/// submitted answer is checked against the test's own question set, answers
/// are written as one batch, then the score is recorded. Answers for
/// questions outside the test, and repeats of a question already answered in
/// this submission, are dropped without failing the submission.
/// `total_questions` counts the evaluated answers only, so `score` can never
/// exceed it. Any storage error rolls the whole attempt back.
#[instrument(level = "info", skip(store, answers), fields(submitted = answers.len()))]
pub async fn submit_test(
  store: &Store,
  user_id: u64,
  test_id: u64,
  answers: Vec<SubmittedAnswer>,
  time_taken: u32,
) -> AppResult<ResultOut> {
  let completed_at = Utc::now();
  let started_at = completed_at - chrono::Duration::seconds(i64::from(time_taken));
  let submitted = answers.len();

  let out = store
    .transaction(|tx| -> AppResult<ResultOut> {
      let shell = tx.create_result(NewTestResult {
        user_id,
        test_id,
        total_questions: u32::try_from(submitted).unwrap_or(u32::MAX),
        time_taken,
        started_at,
        completed_at,
      })?;

      let questions: HashMap<u64, _> = tx
        .questions_for_test(test_id)
        .into_iter()
        .map(|q| (q.id, q.clone()))
        .collect();

      let mut seen = HashSet::new();
      let mut batch = Vec::with_capacity(submitted);
      let mut score = 0u32;
      for a in answers {
        let Some(question) = questions.get(&a.question_id) else {
          debug!(target: "assessment", question_id = a.question_id, %test_id, "Dropping answer for a question outside the test");
          continue;
        };
        if !seen.insert(a.question_id) {
          debug!(target: "assessment", question_id = a.question_id, "Dropping repeated answer");
          continue;
        }
        let is_correct = evaluate_answer(question, &a.user_answer);
        debug!(
          target: "assessment",
          question_id = a.question_id,
          answer = %trunc_for_log(&a.user_answer, 64),
          is_correct,
          "Answer evaluated"
        );
        if is_correct {
          score += 1;
        }
        batch.push(NewAnswer {
          question_id: a.question_id,
          user_answer: a.user_answer,
          is_correct,
          response_time: a.response_time,
        });
      }

      let evaluated = batch.len() as u32;
      let answers = if batch.is_empty() { Vec::new() } else { tx.insert_answers(shell.id, batch)? };
      let result = tx.update_score(shell.id, score, evaluated)?;
      let test = tx.test(test_id).map(TestSummary::from).ok_or(AppError::NotFound("test"))?;

      Ok(ResultOut { result, test, answers: Some(answers) })
    })
    .await?;

  info!(
    target: "assessment",
    result_id = out.result.id,
    user_id,
    test_id,
    submitted,
    evaluated = out.result.total_questions,
    score = out.result.score,
    "Submission scored"
  );
  Ok(out)
}

// -------- Results --------

/// All results of the user, most recent first, each with its test.
#[instrument(level = "info", skip(store))]
pub async fn list_results(store: &Store, user_id: u64) -> Vec<ResultOut> {
  store
    .read(|t| {
      t.results_for_user(user_id)
        .into_iter()
        .filter_map(|r| {
          t.test(r.test_id).map(|test| ResultOut {
            result: r.clone(),
            test: TestSummary::from(test),
            answers: None,
          })
        })
        .collect()
    })
    .await
}

/// One result of the user with answers, their questions and a per-category
/// breakdown. A result owned by someone else is reported as not found.
#[instrument(level = "info", skip(store))]
pub async fn get_result(store: &Store, result_id: u64, user_id: u64) -> AppResult<ResultDetailOut> {
  store
    .read(|t| {
      let result = t.result_for_user(result_id, user_id)?;
      let test = t.test(result.test_id)?;
      let answers: Vec<AnswerDetail> = t
        .answers_for_result(result.id)
        .into_iter()
        .filter_map(|a| {
          t.question(a.question_id).map(|q| AnswerDetail { answer: a.clone(), question: to_out(q) })
        })
        .collect();
      let categories = category_breakdown(&answers);
      Some(ResultDetailOut {
        result: result.clone(),
        test: TestSummary::from(test),
        answers,
        categories,
      })
    })
    .await
    .ok_or(AppError::NotFound("Result"))
}

fn category_breakdown(answers: &[AnswerDetail]) -> Vec<CategoryScore> {
  let mut per: BTreeMap<Category, (u32, u32)> = BTreeMap::new();
  for a in answers {
    let entry = per.entry(a.question.category).or_insert((0, 0));
    entry.1 += 1;
    if a.answer.is_correct {
      entry.0 += 1;
    }
  }
  per
    .into_iter()
    .map(|(category, (correct, total))| CategoryScore { category, correct, total })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuestionType;
  use crate::error::StoreError;
  use crate::store::{NewQuestion, NewTest};
  use crate::config::AppConfig;

  fn question(order_index: u32, question_type: QuestionType, category: Category, correct: &str) -> NewQuestion {
    NewQuestion {
      question_text: format!("q{order_index}"),
      question_type,
      category,
      options: None,
      correct_answer: correct.into(),
      time_limit: 10,
      display_time: 0,
      order_index,
    }
  }

  fn answer(question_id: u64, user_answer: &str) -> SubmittedAnswer {
    SubmittedAnswer { question_id, user_answer: user_answer.into(), response_time: 5000 }
  }

  /// Two users and one test of the given questions. Returns (store, alice, bob, test, question ids).
  async fn fixture(questions: Vec<NewQuestion>) -> (Store, u64, u64, u64, Vec<u64>) {
    let store = Store::new();
    let ids = store
      .transaction(|tx| -> Result<_, StoreError> {
        let mut users = Vec::new();
        for email in ["alice@example.com", "bob@example.com"] {
          let u = tx.insert_user(NewUser {
            email: email.into(),
            password_hash: "x".into(),
            first_name: "F".into(),
            last_name: "L".into(),
          })?;
          users.push(u.id);
        }
        let test = tx.insert_test(NewTest { name: "Cognitive Assessment".into(), description: String::new(), duration: 60 });
        let mut qids = Vec::new();
        for q in questions {
          qids.push(tx.insert_question(test.id, q)?.id);
        }
        Ok((users[0], users[1], test.id, qids))
      })
      .await
      .unwrap();
    (store, ids.0, ids.1, ids.2, ids.3)
  }

  #[tokio::test]
  async fn single_multiple_choice_scored_case_insensitively() {
    let (store, alice, _, test, q) =
      fixture(vec![question(1, QuestionType::MultipleChoice, Category::AnalyticalReasoning, "c")]).await;

    let out = submit_test(&store, alice, test, vec![answer(q[0], "C")], 5).await.unwrap();
    let answers = out.answers.unwrap();
    assert_eq!(answers.len(), 1);
    assert!(answers[0].is_correct);
    assert_eq!(answers[0].response_time, 5000);
    assert_eq!(out.result.score, 1);
    assert_eq!(out.result.total_questions, 1);
    assert_eq!(out.test.name, "Cognitive Assessment");
    assert_eq!(out.result.completed_at - out.result.started_at, chrono::Duration::seconds(5));
  }

  #[tokio::test]
  async fn free_text_accepts_one_listed_candidate() {
    let (store, alice, _, test, q) =
      fixture(vec![question(1, QuestionType::TextInput, Category::WorkingMemory, "heavy,wooden")]).await;

    let out = submit_test(&store, alice, test, vec![answer(q[0], "Wooden ")], 30).await.unwrap();
    assert!(out.answers.unwrap()[0].is_correct);
    assert_eq!(out.result.score, 1);
  }

  #[tokio::test]
  async fn answers_outside_the_test_are_dropped() {
    let (store, alice, _, test, q) = fixture(vec![
      question(1, QuestionType::MultipleChoice, Category::AnalyticalReasoning, "a"),
      question(2, QuestionType::NumberInput, Category::WorkingMemory, "13"),
    ])
    .await;

    let out = submit_test(
      &store,
      alice,
      test,
      vec![answer(q[0], "a"), answer(9_999, "a"), answer(q[1], "13.0")],
      40,
    )
    .await
    .unwrap();

    let answers = out.answers.unwrap();
    let ids: Vec<u64> = answers.iter().map(|a| a.question_id).collect();
    assert_eq!(ids, vec![q[0], q[1]]);
    assert_eq!(out.result.score, 1);
    assert_eq!(out.result.total_questions, 2);
  }

  #[tokio::test]
  async fn repeated_question_counts_once() {
    let (store, alice, _, test, q) =
      fixture(vec![question(1, QuestionType::MultipleChoice, Category::AttentionFocus, "b")]).await;

    let out = submit_test(&store, alice, test, vec![answer(q[0], "a"), answer(q[0], "b")], 3).await.unwrap();
    let answers = out.answers.unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].user_answer, "a");
    assert_eq!(out.result.score, 0);
    assert_eq!(out.result.total_questions, 1);
  }

  #[tokio::test]
  async fn score_matches_correct_answer_count() {
    let (store, alice, _, test, q) = fixture(vec![
      question(1, QuestionType::MultipleChoice, Category::AnalyticalReasoning, "a"),
      question(2, QuestionType::KeySequence, Category::WorkingMemory, "up,down,right,left"),
      question(3, QuestionType::TextInput, Category::WorkingMemory, "gklqt"),
      question(4, QuestionType::MultipleChoice, Category::EmotionalRegulation, "a"),
    ])
    .await;

    let out = submit_test(
      &store,
      alice,
      test,
      vec![answer(q[0], "A"), answer(q[1], "up,down,left,right"), answer(q[2], " GKLQT"), answer(q[3], "")],
      100,
    )
    .await
    .unwrap();
    let correct = out.answers.as_ref().unwrap().iter().filter(|a| a.is_correct).count() as u32;
    assert_eq!(out.result.score, correct);
    assert_eq!(out.result.score, 2);
    assert!(out.result.score <= out.result.total_questions);
  }

  #[tokio::test]
  async fn empty_submission_still_records_an_attempt() {
    let (store, alice, _, test, _) =
      fixture(vec![question(1, QuestionType::MultipleChoice, Category::ProcessingSpeed, "a")]).await;

    let out = submit_test(&store, alice, test, Vec::new(), 0).await.unwrap();
    assert_eq!(out.result.score, 0);
    assert_eq!(out.result.total_questions, 0);
    assert_eq!(list_results(&store, alice).await.len(), 1);
  }

  #[tokio::test]
  async fn unknown_test_fails_without_leaving_a_result() {
    let (store, alice, _, _, q) =
      fixture(vec![question(1, QuestionType::MultipleChoice, Category::ProcessingSpeed, "a")]).await;

    let err = submit_test(&store, alice, 77, vec![answer(q[0], "a")], 5).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("test")));
    assert!(list_results(&store, alice).await.is_empty());
  }

  #[tokio::test]
  async fn results_are_private_to_their_owner() {
    let (store, alice, bob, test, q) =
      fixture(vec![question(1, QuestionType::MultipleChoice, Category::AnalyticalReasoning, "c")]).await;
    let out = submit_test(&store, alice, test, vec![answer(q[0], "c")], 5).await.unwrap();
    let rid = out.result.id;

    assert!(get_result(&store, rid, alice).await.is_ok());
    let not_owned = get_result(&store, rid, bob).await.unwrap_err();
    let missing = get_result(&store, rid + 100, bob).await.unwrap_err();
    assert_eq!(not_owned.to_string(), missing.to_string());
    assert_eq!(not_owned.status(), missing.status());
    assert!(list_results(&store, bob).await.is_empty());
  }

  #[tokio::test]
  async fn result_detail_joins_questions_and_breaks_down_categories() {
    let (store, alice, _, test, q) = fixture(vec![
      question(1, QuestionType::MultipleChoice, Category::AnalyticalReasoning, "a"),
      question(2, QuestionType::MultipleChoice, Category::AnalyticalReasoning, "b"),
      question(3, QuestionType::NumberInput, Category::WorkingMemory, "119"),
    ])
    .await;
    let out = submit_test(&store, alice, test, vec![answer(q[0], "a"), answer(q[1], "a"), answer(q[2], "119")], 60)
      .await
      .unwrap();

    let detail = get_result(&store, out.result.id, alice).await.unwrap();
    assert_eq!(detail.answers.len(), 3);
    assert_eq!(detail.answers[2].question.id, q[2]);
    assert_eq!(
      detail.categories,
      vec![
        CategoryScore { category: Category::AnalyticalReasoning, correct: 1, total: 2 },
        CategoryScore { category: Category::WorkingMemory, correct: 1, total: 1 },
      ]
    );
  }

  #[tokio::test]
  async fn results_list_most_recent_first() {
    let (store, alice, _, test, q) =
      fixture(vec![question(1, QuestionType::MultipleChoice, Category::AnalyticalReasoning, "a")]).await;
    let first = submit_test(&store, alice, test, vec![answer(q[0], "b")], 5).await.unwrap();
    let second = submit_test(&store, alice, test, vec![answer(q[0], "a")], 5).await.unwrap();

    let ids: Vec<u64> = list_results(&store, alice).await.iter().map(|r| r.result.id).collect();
    assert_eq!(ids, vec![second.result.id, first.result.id]);
  }

  #[tokio::test]
  async fn display_questions_are_ordered_and_stripped() {
    let (store, _, _, test, q) = fixture(vec![
      question(2, QuestionType::MultipleChoice, Category::AnalyticalReasoning, "a"),
      question(1, QuestionType::TextInput, Category::WorkingMemory, "cloud"),
    ])
    .await;
    let shown = questions_for_display(&store, test).await;
    assert_eq!(shown.iter().map(|s| s.id).collect::<Vec<_>>(), vec![q[1], q[0]]);
    assert!(questions_for_display(&store, 404).await.is_empty());
  }

  #[tokio::test]
  async fn login_failures_look_the_same() {
    let state = AppState::new(AppConfig::default()).await;
    register(
      &state,
      RegisterIn {
        email: "Ada@Example.com".into(),
        password: "secret-pass".into(),
        first_name: "Ada".into(),
        last_name: "L".into(),
      },
    )
    .await
    .unwrap();

    let login_as = |email: &str, password: &str| LoginIn { email: email.into(), password: password.into() };
    let unknown = login(&state, login_as("nobody@example.com", "secret-pass")).await.unwrap_err();
    let wrong = login(&state, login_as("ada@example.com", "wrong-pass")).await.unwrap_err();
    assert!(matches!(unknown, AppError::Unauthorized(_)));
    assert_eq!(unknown.to_string(), wrong.to_string());

    let (user, token) = login(&state, login_as("ADA@example.com", "secret-pass")).await.unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(state.sessions.resolve(&token).await, Some(user.id));
  }
}
