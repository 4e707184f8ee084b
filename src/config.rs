//! Runtime configuration: environment variables plus an optional TOML file
//! (session lifetime, built-in battery toggle, extra question banks).
//!
//! See `AppConfig` and `TestCfg` for the expected schema.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{Category, QuestionType};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
  #[serde(default)]
  pub auth: AuthCfg,
  /// Insert the built-in "Cognitive Assessment" battery at startup.
  #[serde(default = "default_true")]
  pub seed_builtin: bool,
  /// Additional tests loaded at startup, after the built-in one.
  #[serde(default)]
  pub tests: Vec<TestCfg>,

  // Environment-only settings.
  #[serde(skip)]
  pub port: u16,
  #[serde(skip)]
  pub static_dir: PathBuf,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      auth: AuthCfg::default(),
      seed_builtin: true,
      tests: Vec::new(),
      port: DEFAULT_PORT,
      static_dir: PathBuf::from("./static"),
    }
  }
}

impl AppConfig {
  pub fn listen_addr(&self) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], self.port))
  }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthCfg {
  #[serde(default = "default_session_ttl_secs")]
  pub session_ttl_secs: u64,
}

impl Default for AuthCfg {
  fn default() -> Self {
    Self { session_ttl_secs: DEFAULT_SESSION_TTL_SECS }
  }
}

impl AuthCfg {
  pub fn session_ttl(&self) -> Duration {
    Duration::from_secs(self.session_ttl_secs)
  }
}

/// Test entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct TestCfg {
  pub name: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub duration_minutes: u32,
  #[serde(default)] pub questions: Vec<QuestionCfg>,
}

/// Question entry. `order_index` defaults to the position within the list (1-based).
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  pub text: String,
  pub question_type: QuestionType,
  pub category: Category,
  #[serde(default)] pub options: Option<Vec<String>>,
  pub correct_answer: String,
  #[serde(default)] pub time_limit: u32,
  #[serde(default)] pub display_time: u32,
  #[serde(default)] pub order_index: Option<u32>,
}

fn default_true() -> bool { true }
fn default_session_ttl_secs() -> u64 { DEFAULT_SESSION_TTL_SECS }

/// Parse the TOML part of the configuration.
pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Build the configuration from env. A missing or broken APP_CONFIG_PATH file
/// is logged and replaced by defaults; PORT and STATIC_DIR always apply.
pub fn load_config_from_env() -> AppConfig {
  let mut cfg = match std::env::var("APP_CONFIG_PATH").ok() {
    Some(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match parse_config(&s) {
        Ok(cfg) => {
          info!(target: "iq_backend", %path, tests = cfg.tests.len(), "Loaded config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "iq_backend", %path, error = %e, "Failed to parse TOML config");
          AppConfig::default()
        }
      },
      Err(e) => {
        error!(target: "iq_backend", %path, error = %e, "Failed to read TOML config file");
        AppConfig::default()
      }
    },
    None => AppConfig::default(),
  };

  cfg.port = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .unwrap_or(DEFAULT_PORT);
  cfg.static_dir = std::env::var("STATIC_DIR")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("./static"));
  cfg
}
