use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::fields::Field;

/// Read-only value shown above a field.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PreOutputDto {
    pub title: String,
    pub value: String,
}

/// Data rendered on the portal home page. Built per request.
#[derive(Clone, Debug, Serialize)]
pub struct HomeViewModel<'a> {
    pub repo_owner: String,
    pub title: &'a str,
    pub fields: &'a [Field],
    /// Timeout in minutes, e.g. `5` or `1.5`.
    pub timeout: String,
    /// Base path without trailing slash, e.g. `/run-42`.
    pub base_path: String,
    /// Suggestions per field label; labels without suggestions are absent.
    pub balloon_data: BTreeMap<String, Vec<String>>,
    pub pre_output: BTreeMap<String, PreOutputDto>,
}
