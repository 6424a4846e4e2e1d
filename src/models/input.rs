//! Raw input lookup tolerant of hyphenated and underscored names.
use crate::models::context::ActionContext;

/// Reads named inputs from an [`ActionContext`].
///
/// Runners expose `notifier-slack-token` either verbatim or as
/// `notifier_slack_token`; the hyphenated form is tried first.
pub struct InputReader<'a> {
    ctx: &'a dyn ActionContext,
}

impl<'a> InputReader<'a> {
    pub fn new(ctx: &'a dyn ActionContext) -> Self {
        Self { ctx }
    }

    /// Value for `name`, empty when unset under either spelling.
    pub fn get(&self, name: &str) -> String {
        if let Some(value) = self.ctx.input(name).filter(|v| !v.is_empty()) {
            return value;
        }
        if !name.contains('-') {
            return String::new();
        }
        self.ctx
            .input(&name.replace('-', "_"))
            .unwrap_or_default()
    }

    /// Value for `name` with surrounding whitespace removed.
    pub fn get_trimmed(&self, name: &str) -> String {
        self.get(name).trim().to_string()
    }

    /// Whether `name` is set to `true`, ignoring case and whitespace.
    pub fn get_flag(&self, name: &str) -> bool {
        self.get(name).trim().eq_ignore_ascii_case("true")
    }
}
