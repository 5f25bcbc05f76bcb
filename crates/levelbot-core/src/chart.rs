//! Status chart dataset, visual contract and the last rendered artifact.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::user_directory::UserProfile;

pub const CHART_TITLE_PREFIX: &str = "WTF Bar Chart - ";
/// Locale-style timestamp appended to the chart title.
pub const CHART_TITLE_TIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";
pub const CHART_WIDTH: u32 = 600;
pub const CHART_HEIGHT: u32 = 250;
pub const CHART_X_AXIS_TITLE: &str = "Team Members";
pub const CHART_Y_AXIS_TITLE: &str = "WTF Level (0-100)";
pub const CHART_Y_RANGE: (i64, i64) = (0, 100);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartEntry {
    pub name: String,
    pub level: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// One bar per user with a recorded level, in first-resolution order.
pub struct ChartDataset {
    entries: Vec<ChartEntry>,
}

impl ChartDataset {
    /// Profiles without a recorded level contribute nothing.
    pub fn from_profiles(profiles: &[UserProfile]) -> Self {
        let entries = profiles
            .iter()
            .filter_map(|profile| {
                profile.level.map(|level| ChartEntry {
                    name: profile.display_name.clone(),
                    level,
                })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ChartEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn levels(&self) -> Vec<i64> {
        self.entries.iter().map(|entry| entry.level).collect()
    }
}

impl FromIterator<ChartEntry> for ChartDataset {
    fn from_iter<I: IntoIterator<Item = ChartEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Everything a renderer needs to draw the status bar chart.
pub struct ChartSpec {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub x_axis_title: String,
    pub y_axis_title: String,
    /// Fixed display range, independent of the data.
    pub y_range: (i64, i64),
    pub dataset: ChartDataset,
}

impl ChartSpec {
    /// The timestamp only labels the title; it plays no part in caching.
    pub fn for_dataset<Tz>(dataset: ChartDataset, generated_at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            title: format!(
                "{CHART_TITLE_PREFIX}{}",
                generated_at.format(CHART_TITLE_TIME_FORMAT)
            ),
            width: CHART_WIDTH,
            height: CHART_HEIGHT,
            x_axis_title: CHART_X_AXIS_TITLE.to_string(),
            y_axis_title: CHART_Y_AXIS_TITLE.to_string(),
            y_range: CHART_Y_RANGE,
            dataset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Rendered chart image together with the data it was drawn from.
pub struct ChartArtifact {
    bytes: Vec<u8>,
    dataset: ChartDataset,
}

impl ChartArtifact {
    pub fn new(bytes: Vec<u8>, dataset: ChartDataset) -> Self {
        Self { bytes, dataset }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn dataset(&self) -> &ChartDataset {
        &self.dataset
    }
}

#[derive(Debug, Default)]
/// Holds the most recently rendered chart so a `Reuse` decision can re-send it.
pub struct ChartCache {
    latest: Option<ChartArtifact>,
}

impl ChartCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, artifact: ChartArtifact) {
        self.latest = Some(artifact);
    }

    pub fn latest(&self) -> Option<&ChartArtifact> {
        self.latest.as_ref()
    }
}
