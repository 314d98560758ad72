//! On-disk log encodings
//!
//! The target file's extension picks the encoding:
//! - `txt`: `Key: Value` blocks separated by a blank line
//! - `json`: one JSON record per line
//! - anything else: MessagePack frames, each prefixed by a big-endian `u32` length
//!
//! Decoding is lenient. A damaged record is skipped with a warning so one bad
//! write does not hide the rest of the file.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};

use super::error::LogError;
use super::record::{FieldValue, LogEvent, LogField, LogRecord, RawPayload};

const FRAME_HEADER_LEN: usize = 4;
const FIELD_PREFIX: &str = "Field.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
    Binary,
}

impl LogFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("txt") => Self::Text,
            Some("json") => Self::Json,
            _ => Self::Binary,
        }
    }

    /// Encode one record as it is appended to a file
    pub fn encode(self, record: &LogRecord) -> Result<Vec<u8>, LogError> {
        match self {
            Self::Json => {
                let mut line = serde_json::to_vec(record)?;
                line.push(b'\n');
                Ok(line)
            }
            Self::Binary => {
                let payload = rmp_serde::to_vec_named(record)?;
                let len = u32::try_from(payload.len())
                    .map_err(|_| LogError::Malformed("record exceeds frame size".to_string()))?;
                let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
                frame.extend_from_slice(&len.to_be_bytes());
                frame.extend_from_slice(&payload);
                Ok(frame)
            }
            Self::Text => {
                let mut block = encode_text(record)?;
                block.push('\n');
                Ok(block.into_bytes())
            }
        }
    }

    /// Decode every readable record in a file's contents
    pub fn decode_all(self, bytes: &[u8]) -> Vec<LogRecord> {
        match self {
            Self::Json => decode_json_lines(bytes),
            Self::Binary => decode_frames(bytes),
            Self::Text => decode_text_blocks(bytes),
        }
    }
}

fn decode_json_lines(bytes: &[u8]) -> Vec<LogRecord> {
    bytes
        .split(|b| *b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .filter_map(|line| match serde_json::from_slice(line) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable JSON log line");
                None
            }
        })
        .collect()
}

fn decode_frames(bytes: &[u8]) -> Vec<LogRecord> {
    let mut records = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let Some((header, body)) = rest.split_first_chunk::<FRAME_HEADER_LEN>() else {
            tracing::warn!(remaining = rest.len(), "Truncated log frame header");
            break;
        };
        let len = u32::from_be_bytes(*header) as usize;
        if body.len() < len {
            tracing::warn!(expected = len, available = body.len(), "Truncated log frame");
            break;
        }
        let (payload, tail) = body.split_at(len);
        match rmp_serde::from_slice(payload) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(error = %e, "Skipping unreadable log frame"),
        }
        rest = tail;
    }
    records
}

fn decode_text_blocks(bytes: &[u8]) -> Vec<LogRecord> {
    let text = String::from_utf8_lossy(bytes);
    let mut records = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    for line in text.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !block.is_empty() {
                match decode_text(&block) {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!(error = %e, "Skipping unreadable text log block"),
                }
                block.clear();
            }
        } else {
            block.push(line);
        }
    }
    records
}

// Text encoding

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn push_line(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(&escape(value));
    out.push('\n');
}

fn encode_text(record: &LogRecord) -> Result<String, LogError> {
    let mut out = String::new();
    match record {
        LogRecord::Event(event) => {
            push_line(&mut out, "Kind", "Event");
            push_line(&mut out, "Id", &event.id);
            push_line(&mut out, "Source", &event.source);
            push_line(&mut out, "Date", &event.date);
            push_line(&mut out, "Level", &event.level);
            if let Some(ts) = &event.timestamp {
                push_line(&mut out, "Timestamp", ts);
            }
            if let Some(template) = &event.message_template {
                push_line(&mut out, "MessageTemplate", template);
            }
            if let Some(message) = &event.message {
                push_line(&mut out, "Message", message);
            }
            for field in &event.fields {
                let key = format!("{FIELD_PREFIX}{}", escape(&field.key));
                push_line(&mut out, &key, &serde_json::to_string(&field.value)?);
            }
        }
        LogRecord::Raw(raw) => {
            push_line(&mut out, "Kind", "Raw");
            push_line(&mut out, "Id", &raw.id);
            push_line(&mut out, "Source", &raw.source);
            push_line(&mut out, "Date", &raw.date);
            push_line(&mut out, "ReceivedAt", &raw.received_at.to_rfc3339());
            if let Some(ct) = &raw.content_type {
                push_line(&mut out, "ContentType", ct);
            }
            push_line(&mut out, "Bytes", &STANDARD.encode(&raw.bytes));
        }
    }
    Ok(out)
}

fn decode_text(lines: &[&str]) -> Result<LogRecord, LogError> {
    let mut pairs = Vec::with_capacity(lines.len());
    for line in lines {
        let (key, value) = line
            .split_once(": ")
            .ok_or_else(|| LogError::Malformed(format!("line without separator: {line}")))?;
        pairs.push((key, unescape(value)));
    }

    let take = |name: &str| -> Option<String> {
        pairs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.clone())
    };
    let require = |name: &str| take(name).ok_or_else(|| LogError::Malformed(format!("missing {name}")));

    match require("Kind")?.as_str() {
        "Event" => {
            let mut fields = Vec::new();
            for (key, value) in &pairs {
                if let Some(name) = key.strip_prefix(FIELD_PREFIX) {
                    let value: FieldValue = serde_json::from_str(value)?;
                    fields.push(LogField {
                        key: unescape(name),
                        value,
                    });
                }
            }
            Ok(LogRecord::Event(LogEvent {
                id: require("Id")?,
                source: require("Source")?,
                date: require("Date")?,
                timestamp: take("Timestamp"),
                level: require("Level")?,
                message_template: take("MessageTemplate"),
                message: take("Message"),
                fields,
            }))
        }
        "Raw" => {
            let received_at = DateTime::parse_from_rfc3339(&require("ReceivedAt")?)
                .map_err(|e| LogError::Malformed(format!("bad ReceivedAt: {e}")))?
                .with_timezone(&Utc);
            let bytes = STANDARD
                .decode(require("Bytes")?)
                .map_err(|e| LogError::Malformed(format!("bad Bytes: {e}")))?;
            Ok(LogRecord::Raw(RawPayload {
                id: require("Id")?,
                source: require("Source")?,
                date: require("Date")?,
                received_at,
                content_type: take("ContentType"),
                bytes,
            }))
        }
        other => Err(LogError::Malformed(format!("unknown Kind {other}"))),
    }
}
