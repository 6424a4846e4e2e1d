//! Strongly-typed domain structures for the portal.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub mod fields;
pub mod namespace;

use namespace::{BasePath, FALLBACK_SEGMENT, is_reserved};

/// Length of the commit hash prefix used in derived endpoint keys.
const SHORT_SHA_LEN: usize = 8;

/// Strategy by which the portal is made reachable.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PortalHostMode {
    #[default]
    SelfHosted,
}

impl PortalHostMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PortalHostMode::SelfHosted => "self-hosted",
        }
    }

    /// Whether the mode relies on callbacks reaching the portal from outside.
    pub const fn requires_public_url(&self) -> bool {
        matches!(self, PortalHostMode::SelfHosted)
    }
}

impl FromStr for PortalHostMode {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "self-hosted" => Ok(PortalHostMode::SelfHosted),
            other => Err(TypeConstraintError::UnsupportedHostMode(other.to_string())),
        }
    }
}

impl fmt::Display for PortalHostMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata describing the pipeline run hosting the portal.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunContext {
    /// Commit hash the run was triggered for.
    pub sha: Option<String>,
    /// Run number; zero means "not running inside a pipeline".
    pub run_id: u64,
    /// Repository slug, `owner/name`.
    pub repository: Option<String>,
}

impl RunContext {
    /// Owner part of the repository slug, empty when unknown.
    pub fn repo_owner(&self) -> &str {
        self.repository
            .as_deref()
            .and_then(|repo| repo.split('/').next())
            .unwrap_or("")
    }
}

/// URL-safe key namespacing one run's endpoints.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct EndpointKey(String);

impl EndpointKey {
    /// Accept an explicitly configured key. Surrounding slashes and
    /// whitespace are dropped; the remainder must be URL-safe and must not
    /// shadow a namespace-independent route.
    pub fn try_explicit(raw: &str) -> Result<Option<Self>, TypeConstraintError> {
        let trimmed = raw.trim_matches(|c: char| c == '/' || c.is_whitespace());
        if trimmed.is_empty() {
            return Ok(None);
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
            || is_reserved(trimmed)
        {
            return Err(TypeConstraintError::InvalidEndpointKey(trimmed.to_string()));
        }
        Ok(Some(Self(trimmed.to_string())))
    }

    /// Derive a key from run metadata. Deterministic for the same inputs.
    pub fn derive(run: Option<&RunContext>) -> Self {
        let Some(run) = run.filter(|run| run.run_id != 0) else {
            return Self(FALLBACK_SEGMENT.to_string());
        };
        match run.sha.as_deref().map(str::trim).filter(|sha| !sha.is_empty()) {
            Some(sha) => {
                let short: String = sha.chars().take(SHORT_SHA_LEN).collect();
                Self(format!("input-{short}-{}", run.run_id))
            }
            None => Self(format!("run-{}", run.run_id)),
        }
    }

    /// Resolve the key in priority order: explicit input, run metadata,
    /// fixed fallback.
    pub fn resolve(
        explicit: &str,
        run: Option<&RunContext>,
    ) -> Result<Self, TypeConstraintError> {
        Ok(Self::try_explicit(explicit)?.unwrap_or_else(|| Self::derive(run)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn base_path(&self) -> BasePath {
        BasePath::from_segment(&self.0)
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum TypeConstraintError {
    #[error("unsupported portal host mode `{0}`")]
    UnsupportedHostMode(String),
    #[error("endpoint key `{0}` is not URL-safe")]
    InvalidEndpointKey(String),
}
