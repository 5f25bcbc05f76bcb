//! Single-task polling loop that turns addressed events into replies.
//!
//! Every external call is awaited in sequence, so command handling is atomic
//! with respect to other events and `BotState` needs no locking.

use std::{future::Future, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::chart::{ChartArtifact, ChartCache, ChartDataset, ChartSpec};
use crate::command::{interpret, ParsedCommand};
use crate::mention::{MentionParser, ResolvedMention};
use crate::responses::{
    help_response, level_recorded_response, status_chart_upload, unrecognized_response,
};
use crate::state::{BotState, ChartDecision};
use crate::transport::{ChartRenderer, ChatApi, EventSource, UserDirectory};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub poll_interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// External collaborators the dispatcher drives.
pub struct DispatcherCollaborators {
    pub events: Box<dyn EventSource>,
    pub directory: Arc<dyn UserDirectory>,
    pub chat: Arc<dyn ChatApi>,
    pub renderer: Arc<dyn ChartRenderer>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollCycleReport {
    pub discovered_events: usize,
    pub mentions: usize,
    pub commands_handled: usize,
    pub resolution_failures: usize,
    pub charts_regenerated: usize,
    pub charts_reused: usize,
}

impl PollCycleReport {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

pub struct Dispatcher {
    parser: MentionParser,
    state: BotState,
    chart_cache: ChartCache,
    events: Box<dyn EventSource>,
    directory: Arc<dyn UserDirectory>,
    chat: Arc<dyn ChatApi>,
    renderer: Arc<dyn ChartRenderer>,
    poll_interval: Duration,
}

impl Dispatcher {
    pub fn new(
        bot_user_id: &str,
        collaborators: DispatcherCollaborators,
        config: DispatcherConfig,
    ) -> Self {
        let DispatcherCollaborators {
            events,
            directory,
            chat,
            renderer,
        } = collaborators;
        Self {
            parser: MentionParser::new(bot_user_id),
            state: BotState::new(),
            chart_cache: ChartCache::new(),
            events,
            directory,
            chat,
            renderer,
            poll_interval: config.poll_interval,
        }
    }

    pub fn state(&self) -> &BotState {
        &self.state
    }

    pub fn chart_cache(&self) -> &ChartCache {
        &self.chart_cache
    }

    /// Polls until a transport fault occurs or ctrl-c is received.
    pub async fn run(&mut self) -> Result<()> {
        let ctrl_c = tokio::spawn(tokio::signal::ctrl_c());
        let listener = ctrl_c.abort_handle();
        let result = self
            .run_until(async move {
                match ctrl_c.await {
                    Ok(Ok(())) => {}
                    Ok(Err(error)) => {
                        tracing::warn!("ctrl-c handler unavailable: {error}");
                        std::future::pending::<()>().await;
                    }
                    Err(_) => std::future::pending::<()>().await,
                }
            })
            .await;
        listener.abort();
        result
    }

    /// Polls until a transport fault occurs or `shutdown` resolves. A shutdown
    /// that fires mid-cycle is honored once that cycle completes.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let report = self.run_cycle().await.inspect_err(|error| {
                tracing::error!("level bot dispatch loop stopped: {error:#}");
            })?;
            if !report.is_empty() {
                tracing::info!(
                    discovered = report.discovered_events,
                    mentions = report.mentions,
                    handled = report.commands_handled,
                    resolution_failures = report.resolution_failures,
                    charts_regenerated = report.charts_regenerated,
                    charts_reused = report.charts_reused,
                    "level bot cycle"
                );
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("level bot shutdown requested");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Pulls one batch of raw events and handles each in order.
    pub async fn run_cycle(&mut self) -> Result<PollCycleReport> {
        let mut report = PollCycleReport::default();
        let batch = self
            .events
            .next_batch()
            .await
            .context("failed to read event batch")?;
        for raw_event in &batch {
            self.handle_raw_event(raw_event, &mut report).await?;
        }
        Ok(report)
    }

    async fn handle_raw_event(
        &mut self,
        raw_event: &Value,
        report: &mut PollCycleReport,
    ) -> Result<()> {
        report.discovered_events = report.discovered_events.saturating_add(1);

        let resolved = match self
            .parser
            .parse(raw_event, self.state.profiles_mut(), self.directory.as_ref())
            .await
        {
            Ok(Some(resolved)) => resolved,
            Ok(None) => return Ok(()),
            Err(error) => {
                report.resolution_failures = report.resolution_failures.saturating_add(1);
                tracing::warn!(user_id = error.user_id(), "dropping event: {error}");
                return Ok(());
            }
        };
        report.mentions = report.mentions.saturating_add(1);

        let command = interpret(&resolved.mention.command_text);
        tracing::debug!(
            command = command.name(),
            channel = %resolved.mention.channel,
            user_id = %resolved.mention.user_id,
            "handling command"
        );
        self.handle_command(&resolved, command, report).await?;
        report.commands_handled = report.commands_handled.saturating_add(1);
        Ok(())
    }

    async fn handle_command(
        &mut self,
        resolved: &ResolvedMention,
        command: ParsedCommand,
        report: &mut PollCycleReport,
    ) -> Result<()> {
        let channel = resolved.mention.channel.as_str();
        match command {
            ParsedCommand::Help => {
                let (text, attachments) = help_response();
                self.chat
                    .post_message(channel, &text, &attachments)
                    .await
                    .context("failed to post help response")?;
            }
            ParsedCommand::SetLevel(argument) => {
                let value = argument.response_value();
                self.state.apply_level(&resolved.mention.user_id, value);
                let text = level_recorded_response(&resolved.display_name, value);
                self.chat
                    .post_message(channel, &text, &[])
                    .await
                    .context("failed to post level acknowledgment")?;
            }
            ParsedCommand::Status => self.publish_status(channel, report).await?,
            ParsedCommand::Unrecognized => {
                let text = unrecognized_response(&resolved.display_name);
                self.chat
                    .post_message(channel, &text, &[])
                    .await
                    .context("failed to post fallback response")?;
            }
        }
        Ok(())
    }

    async fn publish_status(&mut self, channel: &str, report: &mut PollCycleReport) -> Result<()> {
        let bytes = match self.state.request_status() {
            ChartDecision::Regenerate(dataset) => self.regenerate_chart(dataset, report).await?,
            ChartDecision::Reuse => match self.chart_cache.latest() {
                Some(artifact) => {
                    report.charts_reused = report.charts_reused.saturating_add(1);
                    artifact.bytes().to_vec()
                }
                None => {
                    let dataset = self.state.chart_dataset();
                    self.regenerate_chart(dataset, report).await?
                }
            },
        };
        self.chat
            .upload_file(channel, status_chart_upload(bytes))
            .await
            .context("failed to upload status chart")
    }

    async fn regenerate_chart(
        &mut self,
        dataset: ChartDataset,
        report: &mut PollCycleReport,
    ) -> Result<Vec<u8>> {
        let spec = ChartSpec::for_dataset(dataset, &chrono::Local::now());
        let bytes = match self.renderer.render(&spec).await {
            Ok(bytes) => bytes,
            Err(error) => {
                self.state.invalidate_chart();
                return Err(error.context("failed to render status chart"));
            }
        };
        self.chart_cache
            .store(ChartArtifact::new(bytes.clone(), spec.dataset));
        report.charts_regenerated = report.charts_regenerated.saturating_add(1);
        Ok(bytes)
    }
}
