//! Slack transport for the level bot.
//!
//! Provides the Web API client (identity lookup, posting, file upload), the
//! Socket Mode event source, a remote chart renderer and the runtime entry
//! point that wires them into the core dispatcher.

mod chart_renderer;
mod slack_api_client;
mod slack_helpers;
mod slack_runtime;
mod slack_socket_source;

pub use chart_renderer::{QuickChartRenderer, DEFAULT_CHART_API_BASE};
pub use slack_api_client::SlackApiClient;
pub use slack_runtime::{run_slack_level_bot, SlackLevelBotConfig, DEFAULT_SLACK_API_BASE};
pub use slack_socket_source::SlackSocketEventSource;
