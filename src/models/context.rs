//! Host runtime capability: run metadata, raw inputs, diagnostics, masking.
use std::collections::HashMap;
use std::env;
use std::fmt;

use log::Level;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::domain::RunContext;

const MASK: &str = "***";

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("run context is not available")]
    Unavailable,
    #[error("invalid run id `{0}`")]
    InvalidRunId(String),
    #[error("failed to load inputs: {0}")]
    Inputs(#[from] config::ConfigError),
}

/// Registry of secret values that must never reach logs in cleartext.
#[derive(Default)]
pub struct SecretMasker {
    secrets: RwLock<Vec<String>>,
}

impl SecretMasker {
    /// Register a secret. Blank values are ignored. Returns `true` when the
    /// value was not known before.
    pub fn register(&self, secret: &str) -> bool {
        let secret = secret.trim();
        if secret.is_empty() {
            return false;
        }
        let mut secrets = self.secrets.write();
        if secrets.iter().any(|s| s == secret) {
            return false;
        }
        secrets.push(secret.to_string());
        // Longest first so a secret containing another is replaced whole.
        secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
        true
    }

    pub fn mask(&self, text: &str) -> String {
        self.secrets
            .read()
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), MASK))
    }

    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.read().is_empty()
    }
}

impl fmt::Debug for SecretMasker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretMasker")
            .field("secrets", &self.len())
            .finish()
    }
}

/// Capabilities the portal needs from the runtime hosting it.
pub trait ActionContext: Send + Sync {
    fn run_context(&self) -> Result<RunContext, ContextError>;

    /// Raw input value for `name`, exactly as the host stores it.
    fn input(&self, name: &str) -> Option<String>;

    /// Register a secret for masking in every later diagnostic.
    fn add_mask(&self, secret: &str);

    /// Emit a diagnostic. Implementations mask registered secrets first.
    fn emit(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.emit(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    fn warning(&self, message: &str) {
        self.emit(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }
}

/// Context backed by the GitHub Actions process environment.
///
/// Inputs come from `INPUT_*` variables, optionally layered over
/// `config/inputs.yaml` and `config/{APP_ENV}.yaml` for local runs.
pub struct GithubActionContext {
    inputs: config::Config,
    masker: SecretMasker,
    on_runner: bool,
}

impl GithubActionContext {
    pub fn from_env() -> Result<Self, ContextError> {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

        let inputs = config::Config::builder()
            .add_source(config::File::with_name("config/inputs").required(false))
            .add_source(config::File::with_name(&format!("config/{app_env}")).required(false))
            .add_source(config::Environment::with_prefix("INPUT"))
            .build()?;

        Ok(Self {
            inputs,
            masker: SecretMasker::default(),
            on_runner: env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true"),
        })
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ActionContext for GithubActionContext {
    fn run_context(&self) -> Result<RunContext, ContextError> {
        let run_id = match non_blank_var("GITHUB_RUN_ID") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ContextError::InvalidRunId(raw.clone()))?,
            None => 0,
        };

        Ok(RunContext {
            sha: non_blank_var("GITHUB_SHA"),
            run_id,
            repository: non_blank_var("GITHUB_REPOSITORY"),
        })
    }

    fn input(&self, name: &str) -> Option<String> {
        self.inputs.get_string(&name.to_ascii_lowercase()).ok()
    }

    fn add_mask(&self, secret: &str) {
        if self.masker.register(secret) && self.on_runner {
            println!("::add-mask::{}", secret.trim());
        }
    }

    fn emit(&self, level: Level, message: &str) {
        let message = self.masker.mask(message);
        if self.on_runner {
            match level {
                Level::Error => println!("::error::{message}"),
                Level::Warn => println!("::warning::{message}"),
                _ => {}
            }
        }
        log::log!(level, "{message}");
    }
}

/// Event observed by [`InMemoryContext`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContextEvent {
    Mask,
    Log(Level, String),
}

/// Context with fixed inputs that records everything emitted through it.
#[derive(Debug, Default)]
pub struct InMemoryContext {
    inputs: HashMap<String, String>,
    run: Option<RunContext>,
    masker: SecretMasker,
    events: Mutex<Vec<ContextEvent>>,
}

impl InMemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, name: &str, value: &str) -> Self {
        self.inputs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_run(mut self, run: RunContext) -> Self {
        self.run = Some(run);
        self
    }

    pub fn events(&self) -> Vec<ContextEvent> {
        self.events.lock().clone()
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ContextEvent::Log(l, message) if *l == level => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn masked_count(&self) -> usize {
        self.masker.len()
    }
}

impl ActionContext for InMemoryContext {
    fn run_context(&self) -> Result<RunContext, ContextError> {
        self.run.clone().ok_or(ContextError::Unavailable)
    }

    fn input(&self, name: &str) -> Option<String> {
        self.inputs.get(name).cloned()
    }

    fn add_mask(&self, secret: &str) {
        if self.masker.register(secret) {
            self.events.lock().push(ContextEvent::Mask);
        }
    }

    fn emit(&self, level: Level, message: &str) {
        let message = self.masker.mask(message);
        log::log!(level, "{message}");
        self.events.lock().push(ContextEvent::Log(level, message));
    }
}
