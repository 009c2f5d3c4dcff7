use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::correlation::DEFAULT_CORRELATION_ID;
use super::record::LogRecord;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const STANDARD_KEYS: [&str; 7] = [
    "timestamp",
    "msecs",
    "levelname",
    "correlation_token",
    "logger_name",
    "line",
    "message",
];

/// How a record is rendered for a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    /// `(<token>) <logger> <line> - <message>`
    Console,
    /// One JSON object per line, extras included.
    Json,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    timestamp: String,
    msecs: u32,
    levelname: &'a str,
    correlation_token: &'a str,
    logger_name: &'a str,
    line: u32,
    message: &'a str,
    #[serde(flatten)]
    extra: BTreeMap<&'a str, &'a Value>,
}

impl Formatter {
    /// Render `record` without a trailing newline.
    pub fn format(&self, record: &LogRecord) -> String {
        let token = record
            .correlation_id
            .as_deref()
            .unwrap_or(DEFAULT_CORRELATION_ID);

        match self {
            Formatter::Console => format!(
                "({token}) {} {} - {}",
                record.logger_name, record.line, record.message
            ),
            Formatter::Json => {
                let line = JsonLine {
                    timestamp: record.timestamp.format(DATE_FORMAT).to_string(),
                    msecs: record.timestamp.timestamp_subsec_millis().min(999),
                    levelname: record.level.levelname(),
                    correlation_token: token,
                    logger_name: &record.logger_name,
                    line: record.line,
                    message: &record.message,
                    extra: record
                        .extra
                        .iter()
                        .filter(|(k, _)| !STANDARD_KEYS.contains(&k.as_str()))
                        .map(|(k, v)| (k.as_str(), v))
                        .collect(),
                };
                // A map of strings to JSON values always serializes.
                serde_json::to_string(&line).unwrap_or_else(|e| {
                    format!("{{\"message\":\"unserializable record: {e}\"}}")
                })
            }
        }
    }
}
