//! Jenkins wire entities and their parsers.
//!
//! Queue items and build results arrive as JSON from `api/json`
//! endpoints. Console chunks are raw text whose paging state travels in
//! the `x-more-data` and `x-text-size` response headers.

use jenkins_queue_core::types::ExecutableRef;
use serde::Deserialize;

/// Header announcing whether more console text will follow.
pub const HEADER_MORE_DATA: &str = "x-more-data";

/// Header carrying the byte offset to request next.
pub const HEADER_TEXT_SIZE: &str = "x-text-size";

/// Body of `GET <queue item>/api/json`.
///
/// Jenkins spells the flag `cancelled`; `canceled` is accepted too in case
/// that ever gets corrected. Either one being `true` cancels the item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueEntry {
    #[serde(default)]
    pub cancelled: Option<bool>,
    #[serde(default)]
    pub canceled: Option<bool>,
    /// `null` or missing while the item is still waiting.
    #[serde(default)]
    pub executable: Option<QueueExecutable>,
    #[serde(default)]
    pub task: Option<QueueTask>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueExecutable {
    pub number: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueTask {
    pub name: String,
}

/// What a single queue poll tells the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueState {
    Cancelled,
    Waiting,
    Dequeued(ExecutableRef),
}

impl QueueEntry {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.unwrap_or(false) || self.canceled.unwrap_or(false)
    }

    /// Interpret the entry. An executable without a task name is rejected
    /// since the attachment naming depends on it.
    pub fn state(&self) -> Result<QueueState, String> {
        if self.is_cancelled() {
            return Ok(QueueState::Cancelled);
        }
        let Some(executable) = &self.executable else {
            return Ok(QueueState::Waiting);
        };
        let task = self
            .task
            .as_ref()
            .ok_or_else(|| "queue item has an executable but no task".to_string())?;
        Ok(QueueState::Dequeued(ExecutableRef {
            task_name: task.name.clone(),
            number: executable.number,
            url: executable.url.clone(),
        }))
    }
}

/// One page of progressive console text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleChunk {
    pub text: String,
    pub has_more: bool,
    /// Offset for the next request; only guaranteed when `has_more`.
    pub next_offset: Option<u64>,
}

impl ConsoleChunk {
    /// Build a chunk from the raw body and the two paging headers.
    ///
    /// `has_more` is set only for the literal value `true`. When more data
    /// is announced the text size header must be a valid offset, and a
    /// multi-byte character cut off at the end of the page is left for the
    /// next request instead of being decoded in halves.
    pub fn from_parts(
        body: &[u8],
        more_data: Option<&str>,
        text_size: Option<&str>,
    ) -> Result<Self, String> {
        let has_more = more_data == Some("true");
        let mut next_offset = text_size.and_then(|v| v.trim().parse::<u64>().ok());
        if has_more && next_offset.is_none() {
            return Err(format!(
                "{HEADER_MORE_DATA} is true but {HEADER_TEXT_SIZE} is {text_size:?}"
            ));
        }

        let mut end = body.len();
        if has_more {
            let tail = incomplete_utf8_tail(body);
            if let Some(offset) = next_offset.and_then(|n| n.checked_sub(tail as u64)) {
                next_offset = Some(offset);
                end -= tail;
            }
        }

        Ok(Self {
            text: String::from_utf8_lossy(&body[..end]).into_owned(),
            has_more,
            next_offset,
        })
    }
}

/// Length of a truncated UTF-8 sequence at the end of `bytes`, 0 if the
/// last character is complete or invalid.
fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    let window = bytes.len().saturating_sub(3);
    let Some(start) = (window..bytes.len())
        .rev()
        .find(|&i| bytes[i] & 0b1100_0000 != 0b1000_0000)
    else {
        return 0;
    };
    match std::str::from_utf8(&bytes[start..]) {
        Err(e) if e.valid_up_to() == 0 && e.error_len().is_none() => bytes.len() - start,
        _ => 0,
    }
}

/// Body of `GET <build>/api/json`, reduced to the field we need.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobResult {
    #[serde(default)]
    pub result: Option<String>,
}

impl JobResult {
    /// The result code, or `None` while the build is still running.
    pub fn code(&self) -> Option<&str> {
        self.result.as_deref().filter(|code| !code.is_empty())
    }
}

/// Parse a queue item body.
pub fn parse_queue_entry(body: &str) -> Result<QueueEntry, serde_json::Error> {
    serde_json::from_str(body)
}

/// Parse a build body.
pub fn parse_job_result(body: &str) -> Result<JobResult, serde_json::Error> {
    serde_json::from_str(body)
}
