//! Application state: the store, the session table and the configuration.
//!
//! Startup seeding lives here as well: the built-in battery (unless disabled)
//! followed by any tests declared in the TOML config. Each test is inserted in
//! its own transaction, so one broken bank entry cannot leave a half-seeded test.

use std::collections::BTreeMap;

use tracing::{error, info, instrument, warn};

use crate::auth::Sessions;
use crate::config::{AppConfig, TestCfg};
use crate::domain::Category;
use crate::error::StoreError;
use crate::seeds::{builtin_questions, builtin_test, options_json};
use crate::store::{NewQuestion, NewTest, Store};

pub struct AppState {
    pub store: Store,
    pub sessions: Sessions,
    pub config: AppConfig,
}

impl AppState {
    /// Build state from config: create the store, seed it, set up sessions.
    #[instrument(level = "info", skip_all)]
    pub async fn new(config: AppConfig) -> Self {
        let store = Store::new();

        if config.seed_builtin {
            seed_test(&store, builtin_test(), builtin_questions()).await;
        }
        for tc in &config.tests {
            let (test, questions) = bank_entry(tc);
            seed_test(&store, test, questions).await;
        }

        // Inventory summary by category.
        let inventory: BTreeMap<Category, usize> = store
            .read(|t| {
                let mut per = BTreeMap::new();
                for q in t.all_questions() {
                    *per.entry(q.category).or_insert(0) += 1;
                }
                per
            })
            .await;
        if inventory.is_empty() {
            warn!(target: "iq_backend", "No questions seeded; every test will be empty");
        }
        for (category, count) in inventory {
            info!(target: "iq_backend", category = category.as_str(), questions = count, "Startup question inventory");
        }

        let sessions = Sessions::new(config.auth.session_ttl());
        Self { store, sessions, config }
    }
}

/// Convert a config bank entry, skipping questions that would be unanswerable
/// or trivially matched (blank correct answer).
pub fn bank_entry(tc: &TestCfg) -> (NewTest, Vec<NewQuestion>) {
    let test = NewTest {
        name: tc.name.clone(),
        description: tc.description.clone(),
        duration: tc.duration_minutes,
    };
    let mut questions = Vec::with_capacity(tc.questions.len());
    for (pos, qc) in tc.questions.iter().enumerate() {
        if qc.correct_answer.trim().is_empty() {
            error!(target: "iq_backend", test = %tc.name, position = pos + 1, "Skipping bank question: blank correct answer.");
            continue;
        }
        let options = qc
            .options
            .as_ref()
            .and_then(|opts| options_json(&opts.iter().map(String::as_str).collect::<Vec<_>>()));
        questions.push(NewQuestion {
            question_text: qc.text.clone(),
            question_type: qc.question_type,
            category: qc.category,
            options,
            correct_answer: qc.correct_answer.clone(),
            time_limit: qc.time_limit,
            display_time: qc.display_time,
            order_index: qc.order_index.unwrap_or(pos as u32 + 1),
        });
    }
    (test, questions)
}

async fn seed_test(store: &Store, test: NewTest, questions: Vec<NewQuestion>) {
    let name = test.name.clone();
    let seeded = store
        .transaction(|tx| -> Result<(u64, usize), StoreError> {
            let t = tx.insert_test(test);
            let n = questions.len();
            for q in questions {
                tx.insert_question(t.id, q)?;
            }
            Ok((t.id, n))
        })
        .await;
    match seeded {
        Ok((id, n)) => info!(target: "iq_backend", test_id = id, %name, questions = n, "Seeded test"),
        Err(e) => error!(target: "iq_backend", %name, error = %e, "Failed to seed test"),
    }
}
