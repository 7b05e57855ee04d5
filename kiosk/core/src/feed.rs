//! Scan feed
//!
//! Newline-delimited scan input for the catalog service. Each line is one of:
//!
//! - an unsigned integer: a scanned tag id, looked up in the catalog
//! - a JSON value: forwarded verbatim as the notification payload
//! - blank: ignored
//!
//! Anything else is reported as [`FeedError::Unrecognised`] and skipped by
//! the caller. The reader can be stdin, a FIFO or any other `AsyncBufRead`.

use std::str::FromStr;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// Errors from reading or parsing the feed
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Line is neither a tag id nor JSON
    #[error("unrecognised scan line: {0:?}")]
    Unrecognised(String),

    /// Reading from the underlying source failed
    #[error("scan feed read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One parsed feed line
#[derive(Debug, Clone, PartialEq)]
pub enum ScanLine {
    /// A scanned tag id
    Tag(u32),
    /// A full payload to forward
    Payload(Value),
    /// Nothing on this line
    Blank,
}

impl FromStr for ScanLine {
    type Err = FeedError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Blank);
        }
        if let Ok(id) = line.parse::<u32>() {
            return Ok(Self::Tag(id));
        }
        match serde_json::from_str::<Value>(line) {
            // Numbers that are not valid tag ids are not payloads either
            Ok(Value::Number(_)) | Err(_) => Err(FeedError::Unrecognised(line.to_string())),
            Ok(value) => Ok(Self::Payload(value)),
        }
    }
}

/// Line reader over a scan source
#[derive(Debug)]
pub struct ScanFeed<R> {
    lines: Lines<R>,
    lines_read: u64,
}

impl<R: AsyncBufRead + Unpin> ScanFeed<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            lines_read: 0,
        }
    }

    /// Next non-blank line. `Ok(None)` at end of feed.
    ///
    /// Cancel safe.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Unrecognised`] for a garbage line (the feed stays
    /// usable) or [`FeedError::Io`] when the source fails.
    pub async fn next_scan(&mut self) -> Result<Option<ScanLine>, FeedError> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            self.lines_read += 1;
            match line.parse::<ScanLine>()? {
                ScanLine::Blank => continue,
                scan => return Ok(Some(scan)),
            }
        }
    }

    /// Lines consumed so far, blanks included
    #[must_use]
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}
