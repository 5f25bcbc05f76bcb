use anyhow::{bail, Result};

use crate::Cli;

pub fn resolve_non_empty_cli_value(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl Cli {
    pub fn validate(&self) -> Result<()> {
        if resolve_non_empty_cli_value(self.slack_bot_token.as_deref()).is_none() {
            bail!("--slack-bot-token (or LEVELBOT_SLACK_BOT_TOKEN) is required");
        }
        if resolve_non_empty_cli_value(self.slack_app_token.as_deref()).is_none() {
            bail!("--slack-app-token (or LEVELBOT_SLACK_APP_TOKEN) is required");
        }
        if self.slack_api_base.trim().is_empty() {
            bail!("--slack-api-base cannot be empty");
        }
        if self.chart_api_base.trim().is_empty() {
            bail!("--chart-api-base cannot be empty");
        }
        if self.poll_interval_ms == 0 {
            bail!("--poll-interval-ms must be greater than 0");
        }
        if self.retry_max_attempts == 0 {
            bail!("--retry-max-attempts must be greater than 0");
        }
        Ok(())
    }
}
