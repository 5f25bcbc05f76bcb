use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use levelbot_core::{Dispatcher, DispatcherCollaborators, DispatcherConfig};

use crate::chart_renderer::QuickChartRenderer;
use crate::slack_api_client::SlackApiClient;
use crate::slack_socket_source::SlackSocketEventSource;

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

const SOCKET_READ_WINDOW: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct SlackLevelBotConfig {
    pub api_base: String,
    pub chart_api_base: String,
    pub app_token: String,
    pub bot_token: String,
    pub bot_user_id: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

/// Connects to Slack and runs the level bot until a transport fault.
pub async fn run_slack_level_bot(config: SlackLevelBotConfig) -> Result<()> {
    let slack_client = SlackApiClient::new(
        config.api_base.clone(),
        config.app_token.clone(),
        config.bot_token.clone(),
        config.request_timeout_ms,
        config.retry_max_attempts,
        config.retry_base_delay_ms,
    )?;

    let bot_user_id = match config.bot_user_id.as_deref().map(str::trim) {
        Some(user_id) if !user_id.is_empty() => user_id.to_string(),
        _ => slack_client
            .resolve_bot_user_id()
            .await
            .context("connection failed: unable to resolve bot user id")?,
    };

    let socket_url = slack_client
        .open_socket_connection()
        .await
        .context("connection failed: unable to open socket mode connection")?;
    let events = SlackSocketEventSource::connect(&socket_url, SOCKET_READ_WINDOW)
        .await
        .context("connection failed")?;
    let renderer = QuickChartRenderer::new(config.chart_api_base.clone(), config.request_timeout_ms)?;

    let slack_client = Arc::new(slack_client);
    let mut dispatcher = Dispatcher::new(
        &bot_user_id,
        DispatcherCollaborators {
            events: Box::new(events),
            directory: slack_client.clone(),
            chat: slack_client,
            renderer: Arc::new(renderer),
        },
        DispatcherConfig {
            poll_interval: config.poll_interval,
        },
    );

    tracing::info!(bot_user_id = %bot_user_id, "level bot connected and running");
    dispatcher.run().await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::{run_slack_level_bot, SlackLevelBotConfig};

    fn config(api_base: String, bot_user_id: Option<&str>) -> SlackLevelBotConfig {
        SlackLevelBotConfig {
            api_base: api_base.clone(),
            chart_api_base: api_base,
            app_token: "xapp-test".to_string(),
            bot_token: "xoxb-test".to_string(),
            bot_user_id: bot_user_id.map(str::to_string),
            poll_interval: Duration::from_millis(10),
            request_timeout_ms: 2_000,
            retry_max_attempts: 1,
            retry_base_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn regression_run_reports_connection_failure_when_socket_open_is_rejected() {
        let server = MockServer::start();
        let open = server.mock(|when, then| {
            when.method(POST).path("/apps.connections.open");
            then.status(200)
                .json_body(json!({"ok": false, "error": "invalid_auth"}));
        });

        let error = run_slack_level_bot(config(server.base_url(), Some("UBOT")))
            .await
            .unwrap_err();
        let message = format!("{error:#}");
        assert!(message.contains("connection failed"));
        assert!(message.contains("invalid_auth"));
        assert_eq!(open.calls(), 1);
    }

    #[tokio::test]
    async fn functional_run_discovers_bot_user_id_when_not_configured() {
        let server = MockServer::start();
        let auth = server.mock(|when, then| {
            when.method(POST)
                .path("/auth.test")
                .header("authorization", "Bearer xoxb-test");
            then.status(200)
                .json_body(json!({"ok": true, "user_id": "UBOT"}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/apps.connections.open");
            then.status(200)
                .json_body(json!({"ok": false, "error": "not_allowed"}));
        });

        let error = run_slack_level_bot(config(server.base_url(), None))
            .await
            .unwrap_err();
        assert!(format!("{error:#}").contains("not_allowed"));
        assert_eq!(auth.calls(), 1);
    }
}
