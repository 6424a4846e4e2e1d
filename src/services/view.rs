//! Home page view model assembly.
use std::collections::BTreeMap;

use crate::dto::{HomeViewModel, PreOutputDto};
use crate::models::config::Config;
use crate::models::environment::Environment;

/// Render a duration in seconds as minutes, keeping up to two decimals.
pub fn seconds_to_minutes(seconds: u64) -> String {
    if seconds % 60 == 0 {
        return (seconds / 60).to_string();
    }
    let minutes = format!("{:.2}", seconds as f64 / 60.0);
    minutes.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Build the home page view for `config` against the current environment.
pub fn build_home<'a>(
    config: &'a Config,
    repo_owner: &str,
    env: &dyn Environment,
) -> HomeViewModel<'a> {
    let mut balloon_data = BTreeMap::new();
    let mut pre_output = BTreeMap::new();

    for field in config.fields.iter() {
        let properties = &field.properties;

        let suggestions: Vec<String> = properties
            .balloon_values
            .iter()
            .cloned()
            .chain(
                properties
                    .balloon_value_env_keys
                    .iter()
                    .filter_map(|key| env.non_blank(key)),
            )
            .collect();
        if !suggestions.is_empty() {
            balloon_data.insert(field.label.clone(), suggestions);
        }

        if let Some(value) = env.non_blank(&properties.output_from_env_key) {
            pre_output.insert(
                field.label.clone(),
                PreOutputDto {
                    title: properties.output_title.trim().to_string(),
                    value,
                },
            );
        }
    }

    HomeViewModel {
        repo_owner: repo_owner.to_string(),
        title: &config.title,
        fields: &config.fields.fields,
        timeout: seconds_to_minutes(config.timeout),
        base_path: config.base_path().to_string(),
        balloon_data,
        pre_output,
    }
}
