//! Chat history: fetching it from Slack, storing it as a snapshot, and
//! reading that snapshot back for the report.
//!
//! The snapshot is a JSON array of objects with `text`, `link`, `service`,
//! `fullDate` and `timestamp` fields. Messages without a URL carry the
//! `No link found` sentinel in `link`.

use crate::error::FetchError;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const NO_LINK: &str = "No link found";
pub const NO_SERVICE: &str = "No service info found";

const HISTORY_PAGE_LIMIT: u32 = 1000;

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(https?://[^>|]+)[^>]*>").expect("link pattern is valid"));

/// A chat message as stored in the snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub text: String,
    pub link: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub full_date: String,
    /// Epoch seconds with a fractional part, e.g. `"1718010000.123456"`.
    pub timestamp: String,
}

impl ChatMessage {
    pub fn from_raw(text: &str, ts: &str) -> Self {
        let mut message = Self {
            text: text.to_string(),
            link: extract_link(text).unwrap_or_else(|| NO_LINK.to_string()),
            service: extract_service(text),
            full_date: String::new(),
            timestamp: ts.to_string(),
        };
        message.full_date = message
            .sent_at()
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();
        message
    }

    /// The extracted URL, or `None` for the sentinel.
    pub fn link(&self) -> Option<&str> {
        match self.link.as_str() {
            "" | NO_LINK => None,
            link => Some(link),
        }
    }

    /// Send time parsed from the epoch-seconds timestamp.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        parse_epoch_seconds(&self.timestamp)
    }
}

/// Parses `"seconds[.fraction]"` with microsecond precision.
pub fn parse_epoch_seconds(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    // Slack timestamps are unsigned.
    if !secs.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let secs: i64 = secs.parse().ok()?;
    let micros = format!("{:0<6}", frac.get(..6).unwrap_or(frac));
    let micros: u32 = micros.parse().ok()?;
    DateTime::from_timestamp(secs, micros * 1_000)
}

pub fn extract_link(text: &str) -> Option<String> {
    LINK_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn extract_service(text: &str) -> String {
    let service = text.split('<').next().unwrap_or_default().trim();
    if service.is_empty() {
        NO_SERVICE.to_string()
    } else {
        service.to_string()
    }
}

/// Reads the snapshot. An unreadable or malformed file yields no messages.
pub fn load_snapshot(path: &Path) -> Vec<ChatMessage> {
    match read_snapshot(path) {
        Ok(messages) => {
            tracing::info!(path = %path.display(), count = messages.len(), "Loaded chat snapshot");
            messages
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                "Could not load chat snapshot, no PR will match an announcement: {:#}",
                e
            );
            Vec::new()
        }
    }
}

fn read_snapshot(path: &Path) -> anyhow::Result<Vec<ChatMessage>> {
    let data = fs::read_to_string(path).context("failed to read snapshot")?;
    let messages = serde_json::from_str(&data).context("failed to parse snapshot")?;
    Ok(messages)
}

pub fn save_snapshot(path: &Path, messages: &[ChatMessage]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(messages)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    messages: Vec<RawMessage>,
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    text: String,
    ts: String,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

pub struct SlackClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(api_url: &str, token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Pages through `conversations.history` for a channel, newest first.
    pub async fn fetch_history(&self, channel_id: &str) -> Result<Vec<ChatMessage>, FetchError> {
        let url = format!("{}/conversations.history", self.api_url);
        let mut messages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let limit = HISTORY_PAGE_LIMIT.to_string();
            let mut query = vec![("channel", channel_id), ("limit", limit.as_str())];
            if let Some(cursor) = cursor.as_deref() {
                query.push(("cursor", cursor));
            }

            let response: HistoryResponse = self
                .http
                .get(&url)
                .bearer_auth(&self.token)
                .query(&query)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            if !response.ok {
                return Err(FetchError::SlackApi(
                    response.error.unwrap_or_else(|| "unknown error".to_string()),
                ));
            }

            tracing::debug!(page_len = response.messages.len(), "Fetched chat history page");
            messages.extend(
                response
                    .messages
                    .iter()
                    .map(|raw| ChatMessage::from_raw(&raw.text, &raw.ts)),
            );

            match response.response_metadata.and_then(|m| m.next_cursor) {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(messages)
    }
}
