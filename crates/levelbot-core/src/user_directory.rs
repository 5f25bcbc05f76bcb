//! Append-only cache of resolved chat users.
//!
//! Profiles are resolved once on first mention and kept for the process
//! lifetime: no eviction, no expiry, no re-fetch of display names.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ResolutionError;
use crate::transport::UserDirectory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A chat user known to the bot.
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    /// Absent until the user records a level.
    pub level: Option<i64>,
}

#[derive(Debug, Default)]
pub struct UserDirectoryCache {
    profiles: Vec<UserProfile>,
    index: HashMap<String, usize>,
}

impl UserDirectoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, user_id: &str) -> Option<&UserProfile> {
        self.index
            .get(user_id)
            .and_then(|slot| self.profiles.get(*slot))
    }

    pub(crate) fn get_mut(&mut self, user_id: &str) -> Option<&mut UserProfile> {
        let slot = *self.index.get(user_id)?;
        self.profiles.get_mut(slot)
    }

    /// Profiles in first-resolution order.
    pub fn profiles(&self) -> &[UserProfile] {
        &self.profiles
    }

    /// Returns the cached profile for `user_id`, looking it up through
    /// `directory` only on a miss.
    pub async fn resolve(
        &mut self,
        user_id: &str,
        directory: &dyn UserDirectory,
    ) -> Result<&UserProfile, ResolutionError> {
        if let Some(slot) = self.index.get(user_id).copied() {
            return Ok(&self.profiles[slot]);
        }

        let display_name = directory.lookup_user(user_id).await?;
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ResolutionError::MissingName {
                user_id: user_id.to_string(),
            });
        }

        tracing::debug!(user_id, display_name, "cached new user profile");
        let slot = self.profiles.len();
        self.profiles.push(UserProfile {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            level: None,
        });
        self.index.insert(user_id.to_string(), slot);
        Ok(&self.profiles[slot])
    }
}
