//! Collaborator contracts the dispatcher drives: event intake, identity
//! lookup, chat posting/uploading and chart rendering.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chart::ChartSpec;
use crate::error::ResolutionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One field of a structured message attachment.
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Structured attachment rendered below a posted message.
pub struct MessageAttachment {
    pub color: String,
    pub title: String,
    #[serde(default)]
    pub fields: Vec<AttachmentField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Binary payload posted to a channel as a file.
pub struct FileUpload {
    pub filename: String,
    pub title: String,
    pub initial_comment: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
/// Source of raw chat events. An `Err` is a transport fault and ends the loop.
pub trait EventSource: Send {
    async fn next_batch(&mut self) -> Result<Vec<Value>>;
}

#[async_trait]
/// Identity lookup used on a user-cache miss.
pub trait UserDirectory: Send + Sync {
    /// Returns the display name for `user_id`.
    async fn lookup_user(&self, user_id: &str) -> Result<String, ResolutionError>;
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: &[MessageAttachment],
    ) -> Result<()>;

    async fn upload_file(&self, channel: &str, upload: FileUpload) -> Result<()>;
}

#[async_trait]
pub trait ChartRenderer: Send + Sync {
    /// Renders `spec` and returns the encoded PNG image.
    async fn render(&self, spec: &ChartSpec) -> Result<Vec<u8>>;
}
