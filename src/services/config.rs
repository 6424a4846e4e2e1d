//! Turns raw, untrusted inputs into a validated [`Config`].
use thiserror::Error;

use crate::domain::fields::{FieldsError, parse_fields};
use crate::domain::{EndpointKey, PortalHostMode};
use crate::models::config::{
    Config, DEFAULT_LISTEN_ADDRESS, DEFAULT_TIMEOUT_SECS, DISCORD_WEBHOOK_PLACEHOLDER,
    DiscordNotifier, SLACK_TOKEN_PLACEHOLDER, SlackNotifier,
};
use crate::models::context::ActionContext;
use crate::models::input::InputReader;

pub const INPUT_TITLE: &str = "title";
pub const INPUT_INTERACTIVE: &str = "interactive";
pub const INPUT_TIMEOUT: &str = "timeout";
pub const INPUT_HOST_MODE: &str = "portal-host-mode";
pub const INPUT_LISTEN_ADDRESS: &str = "selfhosted-listen-address";
pub const INPUT_PUBLIC_URL: &str = "selfhosted-public-url";
pub const INPUT_GITHUB_TOKEN: &str = "github-token";
pub const INPUT_SLACK_ENABLED: &str = "notifier-slack-enabled";
pub const INPUT_SLACK_TOKEN: &str = "notifier-slack-token";
pub const INPUT_SLACK_CHANNEL: &str = "notifier-slack-channel";
pub const INPUT_SLACK_BOT: &str = "notifier-slack-bot";
pub const INPUT_SLACK_THREAD_TS: &str = "notifier-slack-thread-ts";
pub const INPUT_DISCORD_ENABLED: &str = "notifier-discord-enabled";
pub const INPUT_DISCORD_WEBHOOK: &str = "notifier-discord-webhook";
pub const INPUT_DISCORD_USERNAME: &str = "notifier-discord-username";
pub const INPUT_DISCORD_THREAD_ID: &str = "notifier-discord-thread-id";
pub const INPUT_ENDPOINT_KEY: &str = "runner-endpoint-key";

/// Fatal configuration problems, one per cause.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("the selfhosted-public-url input must be provided when portal-host-mode is `{0}`")]
    PublicUrlMissing(PortalHostMode),
    #[error("the github-token input was not provided")]
    GithubTokenMissing,
    #[error("cannot convert the timeout input `{0}` to a whole number of seconds")]
    InvalidTimeout(String),
    #[error("cannot convert the interactive input to a valid field list: {raw}")]
    MalformedFields {
        raw: String,
        #[source]
        source: FieldsError,
    },
    #[error("a valid Slack token was not provided while the Slack notifier is enabled")]
    InvalidSlackToken,
    #[error("a valid Discord webhook was not provided while the Discord notifier is enabled")]
    InvalidDiscordWebhook,
    #[error(
        "runner-endpoint-key `{0}` must be a single segment of letters, digits, `-`, `_`, `.` or `~`, other than `static`"
    )]
    InvalidEndpointKey(String),
}

fn fail<T>(ctx: &dyn ActionContext, err: ConfigError) -> Result<T, ConfigError> {
    ctx.error(&err.to_string());
    Err(err)
}

fn optional(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Resolve the portal configuration from the inputs exposed by `ctx`.
///
/// Secrets are registered for masking before anything is validated, so no
/// failure path below can log them.
pub fn resolve(ctx: &dyn ActionContext) -> Result<Config, ConfigError> {
    let inputs = InputReader::new(ctx);

    let github_token = inputs.get(INPUT_GITHUB_TOKEN);
    let slack_enabled = inputs.get_flag(INPUT_SLACK_ENABLED);
    let slack_token = if slack_enabled {
        inputs.get(INPUT_SLACK_TOKEN)
    } else {
        String::new()
    };
    let discord_enabled = inputs.get_flag(INPUT_DISCORD_ENABLED);
    let discord_webhook = if discord_enabled {
        inputs.get(INPUT_DISCORD_WEBHOOK)
    } else {
        String::new()
    };
    for secret in [&github_token, &slack_token, &discord_webhook] {
        ctx.add_mask(secret);
    }

    let raw_mode = inputs.get_trimmed(INPUT_HOST_MODE).to_ascii_lowercase();
    let host_mode = if raw_mode.is_empty() {
        PortalHostMode::default()
    } else {
        raw_mode.parse().unwrap_or_else(|_| {
            let fallback = PortalHostMode::default();
            ctx.warning(&format!(
                "Ignoring unsupported {INPUT_HOST_MODE} '{raw_mode}'. Only '{fallback}' is supported; using {fallback}."
            ));
            fallback
        })
    };

    let listen_address = optional(inputs.get(INPUT_LISTEN_ADDRESS))
        .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string());

    let public_url = inputs.get_trimmed(INPUT_PUBLIC_URL);
    if host_mode.requires_public_url() && public_url.is_empty() {
        return fail(ctx, ConfigError::PublicUrlMissing(host_mode));
    }

    if github_token.trim().is_empty() {
        return fail(ctx, ConfigError::GithubTokenMissing);
    }

    let raw_timeout = inputs.get(INPUT_TIMEOUT);
    let timeout = if raw_timeout.trim().is_empty() {
        ctx.debug(&format!(
            "The {INPUT_TIMEOUT} was not provided, using the default of {DEFAULT_TIMEOUT_SECS} seconds"
        ));
        DEFAULT_TIMEOUT_SECS
    } else {
        match raw_timeout.trim().parse::<u64>() {
            Ok(timeout) => timeout,
            Err(_) => return fail(ctx, ConfigError::InvalidTimeout(raw_timeout)),
        }
    };

    let title = inputs.get(INPUT_TITLE);
    if !title.is_empty() {
        ctx.debug(&format!("Title input provided: {title}"));
    }

    let raw_fields = inputs.get(INPUT_INTERACTIVE);
    let fields = match parse_fields(&raw_fields) {
        Ok(fields) => fields,
        Err(source) => {
            return fail(
                ctx,
                ConfigError::MalformedFields {
                    raw: raw_fields,
                    source,
                },
            );
        }
    };

    let slack = if slack_enabled {
        if slack_token.trim().is_empty() || slack_token == SLACK_TOKEN_PLACEHOLDER {
            return fail(ctx, ConfigError::InvalidSlackToken);
        }
        SlackNotifier {
            enabled: true,
            token: slack_token,
            channel: inputs.get(INPUT_SLACK_CHANNEL),
            bot_name: inputs.get(INPUT_SLACK_BOT),
            thread_ts: optional(inputs.get(INPUT_SLACK_THREAD_TS)),
        }
    } else {
        SlackNotifier::default()
    };

    let discord = if discord_enabled {
        if discord_webhook.trim().is_empty() || discord_webhook == DISCORD_WEBHOOK_PLACEHOLDER {
            return fail(ctx, ConfigError::InvalidDiscordWebhook);
        }
        DiscordNotifier {
            enabled: true,
            webhook: discord_webhook,
            username: inputs.get(INPUT_DISCORD_USERNAME),
            thread_id: optional(inputs.get(INPUT_DISCORD_THREAD_ID)),
        }
    } else {
        DiscordNotifier::default()
    };

    let run = ctx.run_context().ok();
    let raw_key = inputs.get(INPUT_ENDPOINT_KEY);
    let endpoint_key = match EndpointKey::resolve(&raw_key, run.as_ref()) {
        Ok(key) => key,
        Err(_) => return fail(ctx, ConfigError::InvalidEndpointKey(raw_key)),
    };
    ctx.debug(&format!("Portal endpoints namespaced under {}", endpoint_key.base_path()));

    Ok(Config {
        title,
        fields,
        timeout,
        host_mode,
        listen_address,
        public_url,
        slack,
        discord,
        github_token,
        endpoint_key,
    })
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;
    use crate::domain::RunContext;
    use crate::domain::namespace::FALLBACK_SEGMENT;
    use crate::models::context::{ContextEvent, InMemoryContext};

    fn base() -> InMemoryContext {
        InMemoryContext::new()
            .with_input(INPUT_PUBLIC_URL, "https://portal.example.com")
            .with_input(INPUT_GITHUB_TOKEN, "ghp_secret")
    }

    #[test]
    fn applies_defaults() {
        let ctx = base();
        let config = resolve(&ctx).unwrap();

        assert_eq!(config.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.listen_address, DEFAULT_LISTEN_ADDRESS);
        assert_eq!(config.host_mode, PortalHostMode::SelfHosted);
        assert_eq!(config.title, "");
        assert!(config.fields.is_empty());
        assert!(!config.slack.enabled);
        assert_eq!(config.slack.token, SLACK_TOKEN_PLACEHOLDER);
        assert!(!config.discord.enabled);
        assert_eq!(config.discord.webhook, DISCORD_WEBHOOK_PLACEHOLDER);
        assert_eq!(config.endpoint_key.as_str(), FALLBACK_SEGMENT);
    }

    #[test]
    fn blank_timeout_uses_default() {
        for raw in ["", "   "] {
            let ctx = base().with_input(INPUT_TIMEOUT, raw);
            assert_eq!(resolve(&ctx).unwrap().timeout, 300);
        }
    }

    #[test]
    fn parses_timeout() {
        let ctx = base().with_input(INPUT_TIMEOUT, " 90 ");
        assert_eq!(resolve(&ctx).unwrap().timeout, 90);
    }

    #[test]
    fn rejects_non_integer_timeout() {
        for raw in ["abc", "1.5", "-5"] {
            let ctx = base().with_input(INPUT_TIMEOUT, raw);
            let err = resolve(&ctx).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTimeout(ref value) if value == raw));
            assert_eq!(ctx.messages(Level::Error).len(), 1);
        }
    }

    #[test]
    fn unsupported_host_mode_warns_and_falls_back() {
        let ctx = base().with_input(INPUT_HOST_MODE, " NGROK ");
        let config = resolve(&ctx).unwrap();

        assert_eq!(config.host_mode, PortalHostMode::SelfHosted);
        let warnings = ctx.messages(Level::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ngrok"));
    }

    #[test]
    fn unsupported_host_mode_still_requires_public_url() {
        let ctx = InMemoryContext::new()
            .with_input(INPUT_HOST_MODE, "ngrok")
            .with_input(INPUT_GITHUB_TOKEN, "ghp_secret");
        let err = resolve(&ctx).unwrap_err();
        assert!(matches!(err, ConfigError::PublicUrlMissing(_)));
        assert_eq!(ctx.messages(Level::Warn).len(), 1);
    }

    #[test]
    fn missing_github_token_is_fatal() {
        let ctx = InMemoryContext::new().with_input(INPUT_PUBLIC_URL, "https://x");
        assert!(matches!(
            resolve(&ctx).unwrap_err(),
            ConfigError::GithubTokenMissing
        ));
    }

    #[test]
    fn accepts_underscored_input_names() {
        let ctx = InMemoryContext::new()
            .with_input("selfhosted_public_url", "https://x")
            .with_input("github_token", "ghp_secret")
            .with_input("runner_endpoint_key", "custom");
        let config = resolve(&ctx).unwrap();
        assert_eq!(config.public_url, "https://x");
        assert_eq!(config.endpoint_key.as_str(), "custom");
    }

    #[test]
    fn malformed_fields_report_raw_input() {
        let ctx = base().with_input(INPUT_INTERACTIVE, "fields: [");
        let err = resolve(&ctx).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedFields { ref raw, .. } if raw == "fields: ["));
        assert!(ctx.messages(Level::Error)[0].contains("fields: ["));
    }

    #[test]
    fn slack_placeholder_token_is_rejected() {
        let ctx = base()
            .with_input(INPUT_SLACK_ENABLED, "true")
            .with_input(INPUT_SLACK_TOKEN, SLACK_TOKEN_PLACEHOLDER);
        assert!(matches!(
            resolve(&ctx).unwrap_err(),
            ConfigError::InvalidSlackToken
        ));
    }

    #[test]
    fn slack_blank_token_is_rejected() {
        let ctx = base().with_input(INPUT_SLACK_ENABLED, "true");
        assert!(matches!(
            resolve(&ctx).unwrap_err(),
            ConfigError::InvalidSlackToken
        ));
    }

    #[test]
    fn slack_settings_pass_through() {
        let ctx = base()
            .with_input(INPUT_SLACK_ENABLED, "true")
            .with_input(INPUT_SLACK_TOKEN, "xoxb-real")
            .with_input(INPUT_SLACK_CHANNEL, "#deploys")
            .with_input(INPUT_SLACK_BOT, "")
            .with_input(INPUT_SLACK_THREAD_TS, " 1700000000.000100 ");
        let slack = resolve(&ctx).unwrap().slack;

        assert!(slack.enabled);
        assert_eq!(slack.token, "xoxb-real");
        assert_eq!(slack.channel, "#deploys");
        assert_eq!(slack.bot_name, "");
        assert_eq!(slack.thread_ts.as_deref(), Some("1700000000.000100"));
    }

    #[test]
    fn discord_placeholder_webhook_is_rejected() {
        let ctx = base()
            .with_input(INPUT_DISCORD_ENABLED, "true")
            .with_input(INPUT_DISCORD_WEBHOOK, DISCORD_WEBHOOK_PLACEHOLDER);
        assert!(matches!(
            resolve(&ctx).unwrap_err(),
            ConfigError::InvalidDiscordWebhook
        ));
    }

    #[test]
    fn discord_settings_pass_through() {
        let ctx = base()
            .with_input(INPUT_DISCORD_ENABLED, "True")
            .with_input(INPUT_DISCORD_WEBHOOK, "https://discord.example/hook")
            .with_input(INPUT_DISCORD_USERNAME, "portal")
            .with_input(INPUT_DISCORD_THREAD_ID, "  ");
        let discord = resolve(&ctx).unwrap().discord;

        assert!(discord.enabled);
        assert_eq!(discord.username, "portal");
        assert_eq!(discord.thread_id, None);
    }

    #[test]
    fn secrets_are_masked_before_any_failure() {
        let ctx = base()
            .with_input(INPUT_SLACK_ENABLED, "true")
            .with_input(INPUT_SLACK_TOKEN, "xoxb-real")
            .with_input(INPUT_TIMEOUT, "ghp_secret");
        let err = resolve(&ctx).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));

        let events = ctx.events();
        let first_log = events
            .iter()
            .position(|e| matches!(e, ContextEvent::Log(..)))
            .unwrap();
        assert!(
            events[..first_log]
                .iter()
                .filter(|e| **e == ContextEvent::Mask)
                .count()
                == 2
        );
        assert!(ctx.messages(Level::Error)[0].contains("`***`"));
    }

    #[test]
    fn derives_endpoint_key_from_run() {
        let ctx = base().with_run(RunContext {
            sha: Some("abcdef1234567890".into()),
            run_id: 42,
            repository: None,
        });
        assert_eq!(
            resolve(&ctx).unwrap().endpoint_key.as_str(),
            "input-abcdef12-42"
        );
    }

    #[test]
    fn explicit_endpoint_key_is_trimmed() {
        let ctx = base().with_input(INPUT_ENDPOINT_KEY, "/my-run/ ");
        assert_eq!(resolve(&ctx).unwrap().endpoint_key.as_str(), "my-run");
    }

    #[test]
    fn invalid_endpoint_key_is_fatal() {
        let ctx = base().with_input(INPUT_ENDPOINT_KEY, "a b");
        assert!(matches!(
            resolve(&ctx).unwrap_err(),
            ConfigError::InvalidEndpointKey(_)
        ));
    }

    #[test]
    fn reserved_endpoint_key_is_fatal() {
        let ctx = base().with_input(INPUT_ENDPOINT_KEY, "static");
        assert!(matches!(
            resolve(&ctx).unwrap_err(),
            ConfigError::InvalidEndpointKey(key) if key == "static"
        ));
        assert_eq!(ctx.messages(log::Level::Error).len(), 1);
    }
}
