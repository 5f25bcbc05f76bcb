use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use levelbot_core::{ChartRenderer, ChartSpec};
use serde_json::{json, Value};

use crate::slack_helpers::clip_error_body;

pub const DEFAULT_CHART_API_BASE: &str = "https://quickchart.io";

const BAR_COLOR: &str = "rgba(54, 162, 235, 0.8)";

/// Renders status charts through a QuickChart-compatible HTTP endpoint.
#[derive(Clone)]
pub struct QuickChartRenderer {
    http: reqwest::Client,
    api_base: String,
}

impl QuickChartRenderer {
    pub fn new(api_base: String, request_timeout_ms: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("levelbot")
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create chart renderer client")?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

/// Chart.js request body; the y axis is pinned to `ChartSpec::y_range`.
fn chart_request_body(spec: &ChartSpec) -> Value {
    let (y_min, y_max) = spec.y_range;
    json!({
        "width": spec.width,
        "height": spec.height,
        "format": "png",
        "backgroundColor": "white",
        "chart": {
            "type": "bar",
            "data": {
                "labels": spec.dataset.labels(),
                "datasets": [{
                    "label": spec.y_axis_title,
                    "data": spec.dataset.levels(),
                    "backgroundColor": BAR_COLOR,
                }],
            },
            "options": {
                "legend": { "display": false },
                "title": { "display": true, "text": spec.title },
                "scales": {
                    "xAxes": [{
                        "scaleLabel": { "display": true, "labelString": spec.x_axis_title },
                    }],
                    "yAxes": [{
                        "scaleLabel": { "display": true, "labelString": spec.y_axis_title },
                        "ticks": { "min": y_min, "max": y_max },
                    }],
                },
            },
        },
    })
}

#[async_trait]
impl ChartRenderer for QuickChartRenderer {
    async fn render(&self, spec: &ChartSpec) -> Result<Vec<u8>> {
        let response = self
            .http
            .post(format!("{}/chart", self.api_base))
            .json(&chart_request_body(spec))
            .send()
            .await
            .context("chart render request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "chart render failed with status {}: {}",
                status.as_u16(),
                clip_error_body(&body)
            );
        }

        let bytes = response
            .bytes()
            .await
            .context("failed to read chart render response")?;
        if bytes.is_empty() {
            bail!("chart render returned an empty image");
        }
        tracing::debug!(
            entries = spec.dataset.len(),
            size = bytes.len(),
            "rendered status chart"
        );
        Ok(bytes.to_vec())
    }
}
