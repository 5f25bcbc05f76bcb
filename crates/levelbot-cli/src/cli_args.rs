use std::time::Duration;

use clap::Parser;
use levelbot_slack_runtime::{SlackLevelBotConfig, DEFAULT_CHART_API_BASE, DEFAULT_SLACK_API_BASE};

use crate::validation::resolve_non_empty_cli_value;

#[derive(Debug, Parser)]
#[command(
    name = "levelbot",
    about = "Slack bot that records team levels and posts a status bar chart",
    version
)]
pub struct Cli {
    #[arg(
        long = "slack-bot-token",
        env = "LEVELBOT_SLACK_BOT_TOKEN",
        hide_env_values = true,
        help = "Slack bot token for Web API (xoxb-...)"
    )]
    pub slack_bot_token: Option<String>,

    #[arg(
        long = "slack-app-token",
        env = "LEVELBOT_SLACK_APP_TOKEN",
        hide_env_values = true,
        help = "Slack Socket Mode app token (xapp-...)"
    )]
    pub slack_app_token: Option<String>,

    #[arg(
        long = "slack-bot-user-id",
        env = "LEVELBOT_BOT_ID",
        help = "Bot user id whose mention addresses commands; discovered via auth.test when omitted"
    )]
    pub slack_bot_user_id: Option<String>,

    #[arg(
        long = "slack-api-base",
        env = "LEVELBOT_SLACK_API_BASE",
        default_value = DEFAULT_SLACK_API_BASE,
        help = "Slack Web API base URL"
    )]
    pub slack_api_base: String,

    #[arg(
        long = "chart-api-base",
        env = "LEVELBOT_CHART_API_BASE",
        default_value = DEFAULT_CHART_API_BASE,
        help = "Base URL of the QuickChart-compatible chart rendering service"
    )]
    pub chart_api_base: String,

    #[arg(
        long = "poll-interval-ms",
        env = "LEVELBOT_POLL_INTERVAL_MS",
        default_value_t = 1_000,
        help = "Pause between event polling cycles"
    )]
    pub poll_interval_ms: u64,

    #[arg(
        long = "request-timeout-ms",
        env = "LEVELBOT_REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        help = "Timeout for Slack and chart rendering HTTP requests"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        env = "LEVELBOT_RETRY_MAX_ATTEMPTS",
        default_value_t = 3,
        help = "Maximum attempts for retryable slack api failures (429/5xx/transport)"
    )]
    pub retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        env = "LEVELBOT_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        help = "Base backoff delay in milliseconds for slack api retries"
    )]
    pub retry_base_delay_ms: u64,
}

impl Cli {
    /// Builds the runtime configuration. Call [`Cli::validate`] first.
    pub fn to_runtime_config(&self) -> SlackLevelBotConfig {
        SlackLevelBotConfig {
            api_base: self.slack_api_base.trim().to_string(),
            chart_api_base: self.chart_api_base.trim().to_string(),
            app_token: resolve_non_empty_cli_value(self.slack_app_token.as_deref())
                .unwrap_or_default(),
            bot_token: resolve_non_empty_cli_value(self.slack_bot_token.as_deref())
                .unwrap_or_default(),
            bot_user_id: resolve_non_empty_cli_value(self.slack_bot_user_id.as_deref()),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            request_timeout_ms: self.request_timeout_ms,
            retry_max_attempts: self.retry_max_attempts,
            retry_base_delay_ms: self.retry_base_delay_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::Cli;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["levelbot"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("parse cli")
    }

    #[test]
    fn unit_cli_defaults_match_documented_values() {
        let cli = parse(&["--slack-bot-token", "xoxb-1", "--slack-app-token", "xapp-1"]);
        assert_eq!(cli.slack_api_base, "https://slack.com/api");
        assert_eq!(cli.chart_api_base, "https://quickchart.io");
        assert_eq!(cli.poll_interval_ms, 1_000);
        assert_eq!(cli.request_timeout_ms, 10_000);
        assert_eq!(cli.retry_max_attempts, 3);
        assert_eq!(cli.retry_base_delay_ms, 500);
    }

    #[test]
    fn functional_to_runtime_config_trims_values_and_drops_blank_bot_id() {
        let cli = parse(&[
            "--slack-bot-token",
            " xoxb-1 ",
            "--slack-app-token",
            "xapp-1",
            "--slack-bot-user-id",
            "  ",
            "--poll-interval-ms",
            "250",
        ]);
        let config = cli.to_runtime_config();
        assert_eq!(config.bot_token, "xoxb-1");
        assert_eq!(config.app_token, "xapp-1");
        assert_eq!(config.bot_user_id, None);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn regression_cli_rejects_non_numeric_poll_interval() {
        let error = Cli::try_parse_from(["levelbot", "--poll-interval-ms", "soon"]).unwrap_err();
        assert!(error.to_string().contains("poll-interval-ms"));
    }
}
