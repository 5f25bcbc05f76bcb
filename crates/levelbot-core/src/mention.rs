//! Recognition of events that address the bot.
//!
//! Raw events arrive in one of two shapes: a direct event carrying `text`,
//! `channel` and `user` at the top level, or an edit-style event whose
//! payload is nested under `message`. Both shapes are tried, direct first,
//! and the first one with the bot mention token, a channel and a user wins.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ResolutionError;
use crate::transport::UserDirectory;
use crate::user_directory::UserDirectoryCache;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectEvent {
    pub text: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NestedMessage {
    pub text: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NestedMessageEvent {
    #[serde(default)]
    pub channel: Option<String>,
    pub message: NestedMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A raw event decoded into one of the known shapes.
pub enum RawEvent {
    Direct(DirectEvent),
    NestedMessage(NestedMessageEvent),
}

impl RawEvent {
    /// Decodes every known shape `value` matches, in preference order.
    /// An empty result means the event is rejected at the boundary.
    pub fn shapes(value: &Value) -> Vec<RawEvent> {
        let mut shapes = Vec::with_capacity(2);
        if let Ok(direct) = DirectEvent::deserialize(value) {
            shapes.push(RawEvent::Direct(direct));
        }
        if let Ok(nested) = NestedMessageEvent::deserialize(value) {
            shapes.push(RawEvent::NestedMessage(nested));
        }
        shapes
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Direct(event) => &event.text,
            Self::NestedMessage(event) => &event.message.text,
        }
    }

    pub fn user(&self) -> Option<&str> {
        let user = match self {
            Self::Direct(event) => event.user.as_deref(),
            Self::NestedMessage(event) => event.message.user.as_deref(),
        };
        user.map(str::trim).filter(|value| !value.is_empty())
    }

    /// The outer channel wins for nested events; the nested message's own
    /// channel is only a fallback.
    pub fn channel(&self) -> Option<&str> {
        let channel = match self {
            Self::Direct(event) => event.channel.as_deref(),
            Self::NestedMessage(event) => event
                .channel
                .as_deref()
                .or(event.message.channel.as_deref()),
        };
        channel.map(str::trim).filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Command addressed to the bot, before identity resolution.
pub struct Mention {
    pub command_text: String,
    pub channel: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMention {
    pub mention: Mention,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct MentionParser {
    mention_token: String,
}

impl MentionParser {
    pub fn new(bot_user_id: &str) -> Self {
        Self {
            mention_token: mention_token_for(bot_user_id),
        }
    }

    pub fn mention_token(&self) -> &str {
        &self.mention_token
    }

    /// Extracts the addressed command without touching any cache.
    pub fn extract(&self, value: &Value) -> Option<Mention> {
        RawEvent::shapes(value).into_iter().find_map(|shape| {
            let command_text = command_text_after_mention(shape.text(), &self.mention_token)?;
            Some(Mention {
                command_text,
                channel: shape.channel()?.to_string(),
                user_id: shape.user()?.to_string(),
            })
        })
    }

    /// Extracts the addressed command and resolves the speaker through the
    /// user cache. Non-qualifying events yield `Ok(None)` with no side effects.
    pub async fn parse(
        &self,
        value: &Value,
        cache: &mut UserDirectoryCache,
        directory: &dyn UserDirectory,
    ) -> Result<Option<ResolvedMention>, ResolutionError> {
        let Some(mention) = self.extract(value) else {
            return Ok(None);
        };
        let profile = cache.resolve(&mention.user_id, directory).await?;
        let display_name = profile.display_name.clone();
        Ok(Some(ResolvedMention {
            mention,
            display_name,
        }))
    }
}

pub fn mention_token_for(bot_user_id: &str) -> String {
    format!("<@{}>", bot_user_id.trim())
}

/// Text after the first mention token, trimmed and lower-cased.
pub fn command_text_after_mention(text: &str, mention_token: &str) -> Option<String> {
    let (_, remainder) = text.split_once(mention_token)?;
    Some(remainder.trim().to_lowercase())
}
