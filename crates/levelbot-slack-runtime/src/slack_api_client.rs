//! Slack Web API client used for identity lookup, replies and chart uploads.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use levelbot_core::{ChatApi, FileUpload, MessageAttachment, ResolutionError, UserDirectory};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::slack_helpers::{
    clip_error_body, is_retryable_status, is_retryable_transport_error, retry_after, RetryPolicy,
};

const RETRY_ATTEMPT_HEADER: &str = "x-levelbot-retry-attempt";

#[derive(Debug, Clone, Deserialize)]
struct SlackAuthTestResponse {
    ok: bool,
    user_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackOpenSocketResponse {
    ok: bool,
    url: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackUserInfoResponse {
    ok: bool,
    #[serde(default)]
    user: Option<SlackUserRecord>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackUserRecord {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackChatMessageResponse {
    ok: bool,
    ts: Option<String>,
    channel: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackGetUploadUrlExternalResponse {
    ok: bool,
    upload_url: Option<String>,
    file_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackCompleteUploadExternalResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlackPostedMessage {
    pub(crate) channel: String,
    pub(crate) ts: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlackUploadedFile {
    pub(crate) file_id: String,
}

#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    app_token: String,
    bot_token: String,
    retry: RetryPolicy,
}

impl SlackApiClient {
    pub fn new(
        api_base: String,
        app_token: String,
        bot_token: String,
        request_timeout_ms: u64,
        retry_max_attempts: usize,
        retry_base_delay_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("levelbot"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            app_token: app_token.trim().to_string(),
            bot_token: bot_token.trim().to_string(),
            retry: RetryPolicy::new(retry_max_attempts, retry_base_delay_ms),
        })
    }

    /// Discovers the bot's own user id, used to build its mention token.
    pub async fn resolve_bot_user_id(&self) -> Result<String> {
        let response: SlackAuthTestResponse = self
            .request_json("auth.test", || {
                self.http
                    .post(format!("{}/auth.test", self.api_base))
                    .bearer_auth(&self.bot_token)
            })
            .await?;

        if !response.ok {
            bail!(
                "slack auth.test failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        response
            .user_id
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("slack auth.test did not return user_id"))
    }

    pub async fn open_socket_connection(&self) -> Result<String> {
        let response: SlackOpenSocketResponse = self
            .request_json("apps.connections.open", || {
                self.http
                    .post(format!("{}/apps.connections.open", self.api_base))
                    .bearer_auth(&self.app_token)
            })
            .await?;
        if !response.ok {
            bail!(
                "slack apps.connections.open failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }
        response
            .url
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("slack apps.connections.open did not return url"))
    }

    pub(crate) async fn fetch_user_name(&self, user_id: &str) -> Result<String, ResolutionError> {
        let response: SlackUserInfoResponse = self
            .request_json("users.info", || {
                self.http
                    .get(format!("{}/users.info", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .query(&[("user", user_id)])
            })
            .await
            .map_err(|error| ResolutionError::LookupFailed {
                user_id: user_id.to_string(),
                reason: format!("{error:#}"),
            })?;

        if !response.ok {
            return Err(ResolutionError::LookupFailed {
                user_id: user_id.to_string(),
                reason: response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        response
            .user
            .and_then(|user| user.name)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ResolutionError::MissingName {
                user_id: user_id.to_string(),
            })
    }

    pub(crate) async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: &[MessageAttachment],
    ) -> Result<SlackPostedMessage> {
        let mut payload = json!({
            "channel": channel,
            "text": text,
            "as_user": true,
        });
        if !attachments.is_empty() {
            payload["attachments"] =
                serde_json::to_value(attachments).context("failed to encode attachments")?;
        }

        let response: SlackChatMessageResponse = self
            .request_json("chat.postMessage", || {
                self.http
                    .post(format!("{}/chat.postMessage", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .json(&payload)
            })
            .await?;

        if !response.ok {
            bail!(
                "slack chat.postMessage failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        Ok(SlackPostedMessage {
            channel: response.channel.unwrap_or_else(|| channel.to_string()),
            ts: response
                .ts
                .ok_or_else(|| anyhow!("slack chat.postMessage response missing ts"))?,
        })
    }

    pub(crate) async fn upload_file_v2(
        &self,
        channel: &str,
        upload: &FileUpload,
    ) -> Result<SlackUploadedFile> {
        if upload.filename.trim().is_empty() {
            bail!("slack files upload requires non-empty filename");
        }
        let file_size = upload.bytes.len();
        if file_size == 0 {
            bail!("slack files upload requires non-empty payload");
        }

        let get_upload: SlackGetUploadUrlExternalResponse = self
            .request_json("files.getUploadURLExternal", || {
                self.http
                    .post(format!("{}/files.getUploadURLExternal", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .json(&json!({
                        "filename": upload.filename,
                        "length": file_size,
                    }))
            })
            .await?;
        if !get_upload.ok {
            bail!(
                "slack files.getUploadURLExternal failed: {}",
                get_upload
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }
        let upload_url = get_upload
            .upload_url
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("slack files.getUploadURLExternal missing upload_url"))?;
        let file_id = get_upload
            .file_id
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("slack files.getUploadURLExternal missing file_id"))?;

        let upload_response = self
            .http
            .post(upload_url)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(upload.bytes.clone())
            .send()
            .await
            .context("failed to upload file payload to slack external upload URL")?;
        if !upload_response.status().is_success() {
            let status = upload_response.status();
            let body = upload_response.text().await.unwrap_or_default();
            bail!(
                "slack external upload failed: status={} body={}",
                status,
                clip_error_body(&body)
            );
        }

        let mut complete_payload = json!({
            "files": [{ "id": file_id.clone(), "title": upload.title }],
            "channel_id": channel,
        });
        let initial_comment = upload.initial_comment.trim();
        if !initial_comment.is_empty() {
            complete_payload["initial_comment"] = Value::String(initial_comment.to_string());
        }

        let complete: SlackCompleteUploadExternalResponse = self
            .request_json("files.completeUploadExternal", || {
                self.http
                    .post(format!("{}/files.completeUploadExternal", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .json(&complete_payload)
            })
            .await?;
        if !complete.ok {
            bail!(
                "slack files.completeUploadExternal failed: {}",
                complete
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        Ok(SlackUploadedFile { file_id })
    }

    async fn request_json<T, F>(&self, operation: &str, mut builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = builder()
                .header(RETRY_ATTEMPT_HEADER, attempt.saturating_sub(1).to_string())
                .send()
                .await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed = response
                            .json::<T>()
                            .await
                            .with_context(|| format!("failed to decode slack {operation}"))?;
                        return Ok(parsed);
                    }

                    let retry_after_hint = retry_after(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if self.retry.allows_retry_after(attempt) && is_retryable_status(status) {
                        tracing::debug!(
                            operation,
                            attempt,
                            status = status.as_u16(),
                            "retrying slack api call"
                        );
                        tokio::time::sleep(self.retry.delay(attempt, retry_after_hint)).await;
                        continue;
                    }

                    bail!(
                        "slack api {operation} failed with status {}: {}",
                        status.as_u16(),
                        clip_error_body(&body)
                    );
                }
                Err(error) => {
                    if self.retry.allows_retry_after(attempt) && is_retryable_transport_error(&error)
                    {
                        tokio::time::sleep(self.retry.delay(attempt, None)).await;
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("slack api {operation} request failed"));
                }
            }
        }
    }
}

#[async_trait]
impl UserDirectory for SlackApiClient {
    async fn lookup_user(&self, user_id: &str) -> Result<String, ResolutionError> {
        self.fetch_user_name(user_id).await
    }
}

#[async_trait]
impl ChatApi for SlackApiClient {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: &[MessageAttachment],
    ) -> Result<()> {
        let posted = SlackApiClient::post_message(self, channel, text, attachments).await?;
        tracing::debug!(channel = %posted.channel, ts = %posted.ts, "posted slack message");
        Ok(())
    }

    async fn upload_file(&self, channel: &str, upload: FileUpload) -> Result<()> {
        let uploaded = self.upload_file_v2(channel, &upload).await?;
        tracing::debug!(channel, file_id = %uploaded.file_id, "uploaded slack file");
        Ok(())
    }
}
