//! Canonical per-run path namespace.
//!
//! Every place that needs the base path (route attachment, redirects, the
//! home page view) derives it through [`BasePath::from_segment`], so the
//! fallback segment lives here and nowhere else.
use std::fmt;

/// Segment used when no endpoint identity is available.
pub const FALLBACK_SEGMENT: &str = "runner";

/// Header through which a reverse proxy communicates the externally visible
/// path prefix.
pub const FORWARDED_PREFIX_HEADER: &str = "X-Forwarded-Prefix";

/// Top-level segments already claimed by namespace-independent routes.
pub const RESERVED_SEGMENTS: &[&str] = &["static"];

/// Whether `segment` would collide with a namespace-independent route.
pub fn is_reserved(segment: &str) -> bool {
    RESERVED_SEGMENTS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(segment))
}

/// Forwarded prefix usable as a same-origin path, without trailing slashes.
/// Anything that could make the redirect leave the host is dropped.
fn local_prefix(raw: &str) -> Option<&str> {
    let prefix = raw.trim().trim_end_matches('/');
    let local = prefix.starts_with('/')
        && !prefix.starts_with("//")
        && !prefix.contains("://")
        && !prefix.contains('\\');
    local.then_some(prefix)
}

fn is_trimmed(c: char) -> bool {
    c == '/' || c.is_whitespace()
}

/// Reduce a raw identity to a bare path segment.
pub fn canonical_segment(raw: &str) -> &str {
    let trimmed = raw.trim_matches(is_trimmed);
    if trimmed.is_empty() {
        FALLBACK_SEGMENT
    } else {
        trimmed
    }
}

/// Base path of one run's portal, e.g. `/run-42`. Never carries a trailing slash.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct BasePath(String);

impl BasePath {
    pub fn from_segment(raw: &str) -> Self {
        Self(format!("/{}", canonical_segment(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bare segment without the leading slash.
    pub fn segment(&self) -> &str {
        &self.0[1..]
    }

    /// Canonical home location, `/<segment>/`.
    pub fn home(&self) -> String {
        format!("{}/", self.0)
    }

    /// Location unqualified requests are redirected to. A forwarded prefix,
    /// when it is a local absolute path, is prepended so the redirect
    /// survives path rewriting.
    pub fn redirect_target(&self, forwarded_prefix: Option<&str>) -> String {
        let prefix = forwarded_prefix.and_then(local_prefix).unwrap_or("");
        format!("{prefix}{}", self.home())
    }
}

impl fmt::Display for BasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
