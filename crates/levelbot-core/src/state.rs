//! Per-user levels and the chart dirty flag.

use crate::chart::ChartDataset;
use crate::user_directory::UserDirectoryCache;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartDecision {
    Regenerate(ChartDataset),
    Reuse,
}

#[derive(Debug)]
/// Process-wide bot state, owned by the dispatcher.
///
/// `dirty` is true whenever a level changed after the last chart
/// generation; it starts true so the first status request always renders.
pub struct BotState {
    profiles: UserDirectoryCache,
    dirty: bool,
}

impl Default for BotState {
    fn default() -> Self {
        Self {
            profiles: UserDirectoryCache::new(),
            dirty: true,
        }
    }
}

impl BotState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profiles(&self) -> &UserDirectoryCache {
        &self.profiles
    }

    /// Resolution only inserts identities; it never touches levels or `dirty`.
    pub fn profiles_mut(&mut self) -> &mut UserDirectoryCache {
        &mut self.profiles
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Records `value` for an already-resolved user, without range checks.
    /// Returns false when the user was never resolved.
    pub fn apply_level(&mut self, user_id: &str, value: i64) -> bool {
        let Some(profile) = self.profiles.get_mut(user_id) else {
            return false;
        };
        profile.level = Some(value);
        self.dirty = true;
        true
    }

    /// Decides between regenerating and reusing the chart. A `Regenerate`
    /// decision clears the dirty flag immediately.
    pub fn request_status(&mut self) -> ChartDecision {
        if !self.dirty {
            return ChartDecision::Reuse;
        }
        self.dirty = false;
        ChartDecision::Regenerate(self.chart_dataset())
    }

    pub fn chart_dataset(&self) -> ChartDataset {
        ChartDataset::from_profiles(self.profiles.profiles())
    }

    /// Marks the chart stale again, used when a regeneration did not produce
    /// an artifact.
    pub fn invalidate_chart(&mut self) {
        self.dirty = true;
    }
}
