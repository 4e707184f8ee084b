//! In-process persistence: users, tests, questions, results and answers.
//!
//! All tables sit behind one `RwLock`. Reads take the read lock and look at a
//! consistent view through `Tables`. Writes go through `Store::transaction`,
//! which hands the closure a `Tx` holding the write lock; every mutation is
//! journaled, and the journal is replayed backwards unless the closure
//! returns `Ok`. Integrity rules (foreign keys, unique email, answer count and
//! score bounds) are checked here so no caller can persist an invalid row.

use std::collections::BTreeMap;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::domain::{Answer, Category, Question, QuestionType, Test, TestResult, User};
use crate::error::StoreError;

#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct NewTest {
    pub name: String,
    pub description: String,
    pub duration: u32,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_text: String,
    pub question_type: QuestionType,
    pub category: Category,
    pub options: Option<String>,
    pub correct_answer: String,
    pub time_limit: u32,
    pub display_time: u32,
    pub order_index: u32,
}

#[derive(Debug)]
pub struct NewTestResult {
    pub user_id: u64,
    pub test_id: u64,
    pub total_questions: u32,
    pub time_taken: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewAnswer {
    pub question_id: u64,
    pub user_answer: String,
    pub is_correct: bool,
    pub response_time: u32,
}

/// Last id handed out per table. Ids start at 1.
#[derive(Clone, Copy, Debug, Default)]
struct Sequences {
    user: u64,
    test: u64,
    question: u64,
    result: u64,
    answer: u64,
}

#[derive(Debug, Default)]
pub struct Tables {
    users: BTreeMap<u64, User>,
    tests: BTreeMap<u64, Test>,
    questions: BTreeMap<u64, Question>,
    results: BTreeMap<u64, TestResult>,
    answers: BTreeMap<u64, Answer>,
    seq: Sequences,
}

impl Tables {
    pub fn user(&self, id: u64) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email == email)
    }

    pub fn test(&self, id: u64) -> Option<&Test> {
        self.tests.get(&id)
    }

    pub fn question(&self, id: u64) -> Option<&Question> {
        self.questions.get(&id)
    }

    /// Questions of one test, ordered by display index (then id).
    pub fn questions_for_test(&self, test_id: u64) -> Vec<&Question> {
        let mut out: Vec<&Question> = self
            .questions
            .values()
            .filter(|q| q.test_id == test_id)
            .collect();
        out.sort_by_key(|q| (q.order_index, q.id));
        out
    }

    /// Results owned by `user_id`, most recent first.
    pub fn results_for_user(&self, user_id: u64) -> Vec<&TestResult> {
        let mut out: Vec<&TestResult> = self
            .results
            .values()
            .filter(|r| r.user_id == user_id)
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out
    }

    /// Ownership is part of the lookup: a result of another user is simply absent.
    pub fn result_for_user(&self, result_id: u64, user_id: u64) -> Option<&TestResult> {
        self.results
            .get(&result_id)
            .filter(|r| r.user_id == user_id)
    }

    /// Answers of one result in insertion order.
    pub fn answers_for_result(&self, result_id: u64) -> Vec<&Answer> {
        self.answers
            .values()
            .filter(|a| a.test_result_id == result_id)
            .collect()
    }

    pub fn all_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    #[cfg(test)]
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }
}

/// Journal entry: how to undo one mutation.
#[derive(Debug)]
enum Undo {
    User(u64),
    Test(u64),
    Question(u64),
    Result(u64),
    Answer(u64),
    ResultUpdated(TestResult),
}

/// Unit of work over the write-locked tables. Dropped without `commit`, it
/// restores every table and sequence to the state it started from.
pub struct Tx<'a> {
    tables: &'a mut Tables,
    journal: Vec<Undo>,
    seq_at_begin: Sequences,
    committed: bool,
}

impl Deref for Tx<'_> {
    type Target = Tables;

    fn deref(&self) -> &Tables {
        &*self.tables
    }
}

impl<'a> Tx<'a> {
    fn begin(tables: &'a mut Tables) -> Self {
        let seq_at_begin = tables.seq;
        Self {
            tables,
            journal: Vec::new(),
            seq_at_begin,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }

    fn rollback(&mut self) {
        while let Some(undo) = self.journal.pop() {
            match undo {
                Undo::User(id) => {
                    self.tables.users.remove(&id);
                }
                Undo::Test(id) => {
                    self.tables.tests.remove(&id);
                }
                Undo::Question(id) => {
                    self.tables.questions.remove(&id);
                }
                Undo::Result(id) => {
                    self.tables.results.remove(&id);
                }
                Undo::Answer(id) => {
                    self.tables.answers.remove(&id);
                }
                Undo::ResultUpdated(previous) => {
                    self.tables.results.insert(previous.id, previous);
                }
            }
        }
        self.tables.seq = self.seq_at_begin;
    }

    pub fn insert_user(&mut self, new: NewUser) -> Result<User, StoreError> {
        if self.tables.user_by_email(&new.email).is_some() {
            return Err(StoreError::Conflict("User already exists".into()));
        }
        self.tables.seq.user += 1;
        let user = User {
            id: self.tables.seq.user,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            created_at: Utc::now(),
        };
        self.tables.users.insert(user.id, user.clone());
        self.journal.push(Undo::User(user.id));
        Ok(user)
    }

    pub fn insert_test(&mut self, new: NewTest) -> Test {
        self.tables.seq.test += 1;
        let test = Test {
            id: self.tables.seq.test,
            name: new.name,
            description: new.description,
            duration: new.duration,
            created_at: Utc::now(),
        };
        self.tables.tests.insert(test.id, test.clone());
        self.journal.push(Undo::Test(test.id));
        test
    }

    /// Blank correct answers are refused: an empty key would match an empty submission.
    pub fn insert_question(&mut self, test_id: u64, new: NewQuestion) -> Result<Question, StoreError> {
        if self.tables.test(test_id).is_none() {
            return Err(StoreError::MissingReference { entity: "test", id: test_id });
        }
        if new.correct_answer.trim().is_empty() {
            return Err(StoreError::Constraint(format!(
                "question {:?} has a blank correct answer",
                new.question_text
            )));
        }
        self.tables.seq.question += 1;
        let question = Question {
            id: self.tables.seq.question,
            test_id,
            question_text: new.question_text,
            question_type: new.question_type,
            category: new.category,
            options: new.options,
            correct_answer: new.correct_answer,
            time_limit: new.time_limit,
            display_time: new.display_time,
            order_index: new.order_index,
        };
        self.tables.questions.insert(question.id, question.clone());
        self.journal.push(Undo::Question(question.id));
        Ok(question)
    }

    pub fn create_result(&mut self, new: NewTestResult) -> Result<TestResult, StoreError> {
        if self.tables.user(new.user_id).is_none() {
            return Err(StoreError::MissingReference { entity: "user", id: new.user_id });
        }
        if self.tables.test(new.test_id).is_none() {
            return Err(StoreError::MissingReference { entity: "test", id: new.test_id });
        }
        self.tables.seq.result += 1;
        let result = TestResult {
            id: self.tables.seq.result,
            user_id: new.user_id,
            test_id: new.test_id,
            score: 0,
            total_questions: new.total_questions,
            time_taken: new.time_taken,
            started_at: new.started_at,
            completed_at: new.completed_at,
            created_at: Utc::now(),
        };
        self.tables.results.insert(result.id, result.clone());
        self.journal.push(Undo::Result(result.id));
        Ok(result)
    }

    /// Batch insert. Every answer must reference a question of the result's
    /// test, and the result may never hold more answers than the test has questions.
    pub fn insert_answers(&mut self, result_id: u64, batch: Vec<NewAnswer>) -> Result<Vec<Answer>, StoreError> {
        let test_id = match self.tables.results.get(&result_id) {
            Some(r) => r.test_id,
            None => return Err(StoreError::MissingReference { entity: "result", id: result_id }),
        };
        let capacity = self.tables.questions_for_test(test_id).len();
        let existing = self.tables.answers_for_result(result_id).len();
        if existing + batch.len() > capacity {
            return Err(StoreError::Constraint(format!(
                "result {} would hold {} answers for a test of {} questions",
                result_id,
                existing + batch.len(),
                capacity
            )));
        }

        let mut written = Vec::with_capacity(batch.len());
        for new in batch {
            match self.tables.question(new.question_id) {
                Some(q) if q.test_id == test_id => {}
                _ => {
                    return Err(StoreError::Constraint(format!(
                        "question {} is not part of test {}",
                        new.question_id, test_id
                    )))
                }
            }
            self.tables.seq.answer += 1;
            let answer = Answer {
                id: self.tables.seq.answer,
                test_result_id: result_id,
                question_id: new.question_id,
                user_answer: new.user_answer,
                is_correct: new.is_correct,
                response_time: new.response_time,
            };
            self.tables.answers.insert(answer.id, answer.clone());
            self.journal.push(Undo::Answer(answer.id));
            written.push(answer);
        }
        Ok(written)
    }

    /// Record the outcome of a scored attempt. `score` may not exceed
    /// `total_questions`, which may not be less than the stored answer count.
    pub fn update_score(&mut self, result_id: u64, score: u32, total_questions: u32) -> Result<TestResult, StoreError> {
        let previous = match self.tables.results.get(&result_id) {
            Some(r) => r.clone(),
            None => return Err(StoreError::MissingReference { entity: "result", id: result_id }),
        };
        if score > total_questions {
            return Err(StoreError::Constraint(format!(
                "score {} exceeds total_questions {}",
                score, total_questions
            )));
        }
        let stored = self.tables.answers_for_result(result_id).len();
        if (total_questions as usize) < stored {
            return Err(StoreError::Constraint(format!(
                "total_questions {} is below the {} stored answers",
                total_questions, stored
            )));
        }
        let mut updated = previous.clone();
        updated.score = score;
        updated.total_questions = total_questions;
        self.tables.results.insert(result_id, updated.clone());
        self.journal.push(Undo::ResultUpdated(previous));
        Ok(updated)
    }
}

impl Drop for Tx<'_> {
    fn drop(&mut self) {
        if !self.committed {
            if !self.journal.is_empty() {
                warn!(target: "store", undone = self.journal.len(), "Rolling back transaction");
            }
            self.rollback();
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    tables: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against a consistent read view.
    pub async fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        let guard = self.tables.read().await;
        f(&guard)
    }

    /// Run `f` as one atomic unit of work. Nothing it wrote survives an `Err`.
    #[instrument(level = "debug", skip_all)]
    pub async fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Tx<'_>) -> Result<T, E>,
    {
        let mut guard = self.tables.write().await;
        let mut tx = Tx::begin(&mut *guard);
        let out = f(&mut tx);
        match out {
            Ok(v) => {
                debug!(target: "store", writes = tx.journal.len(), "Committing transaction");
                tx.commit();
                Ok(v)
            }
            // Dropping `tx` rolls back.
            Err(e) => Err(e),
        }
    }
}
