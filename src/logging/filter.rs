//! Record filters applied before formatting.
//!
//! Every stage returns whether the record may continue. Stages run in the
//! order they were attached, on one record, on the calling thread.

use serde_json::Value;

use super::correlation::{self, DEFAULT_CORRELATION_ID};
use super::obfuscate::obfuscate;
use super::record::{LogLevel, LogRecord};
use crate::error::MalformedInputError;

/// Attribute rewritten by [`RedactionFilter`].
pub const EMAIL_FIELD: &str = "email";

/// Logger name used for diagnostics emitted by the pipeline itself.
pub const DIAGNOSTIC_LOGGER: &str = "social_media::logging";

/// Attaches the ambient correlation token, or `-` outside a request.
///
/// Every token it writes is cut to `length` characters, whether it was
/// generated here or sent in by the client.
#[derive(Debug, Clone)]
pub struct CorrelationTagger {
    length: usize,
}

impl CorrelationTagger {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn apply(&self, record: &mut LogRecord) -> bool {
        let token = record.correlation_id.take().unwrap_or_else(|| {
            correlation::current()
                .map(|id| id.to_string())
                .unwrap_or_else(|| DEFAULT_CORRELATION_ID.to_string())
        });
        record.correlation_id = Some(truncate_chars(token, self.length));
        true
    }
}

fn truncate_chars(mut token: String, length: usize) -> String {
    if let Some((end, _)) = token.char_indices().nth(length) {
        token.truncate(end);
    }
    token
}

/// Rewrites the `email` attribute with [`obfuscate`]. Never drops a record.
#[derive(Debug, Clone)]
pub struct RedactionFilter {
    name: String,
    reveal_length: usize,
}

impl RedactionFilter {
    pub fn new(name: impl Into<String>, reveal_length: usize) -> Self {
        Self {
            name: name.into(),
            reveal_length,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reveal_length(&self) -> usize {
        self.reveal_length
    }

    pub fn apply(&self, record: &mut LogRecord) -> Result<bool, MalformedInputError> {
        let Some(value) = record.extra.get_mut(EMAIL_FIELD) else {
            return Ok(true);
        };
        let redacted = match value {
            Value::String(email) => obfuscate(email, self.reveal_length)?,
            _ => return Err(MalformedInputError),
        };
        *value = Value::String(redacted);
        Ok(true)
    }
}

/// The closed set of pipeline stages.
#[derive(Debug, Clone)]
pub enum RecordFilter {
    Correlation(CorrelationTagger),
    Redaction(RedactionFilter),
}

impl RecordFilter {
    pub fn name(&self) -> &str {
        match self {
            RecordFilter::Correlation(_) => "correlation_id",
            RecordFilter::Redaction(f) => f.name(),
        }
    }

    pub fn apply(&self, record: &mut LogRecord) -> Result<bool, MalformedInputError> {
        match self {
            RecordFilter::Correlation(f) => Ok(f.apply(record)),
            RecordFilter::Redaction(f) => f.apply(record),
        }
    }
}

/// Result of running a chain over one record.
#[derive(Debug, Default)]
pub struct ChainOutcome {
    pub allowed: bool,
    /// Records describing filter failures, to be written after the record.
    pub diagnostics: Vec<LogRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    stages: Vec<RecordFilter>,
}

impl FilterChain {
    pub fn new(stages: Vec<RecordFilter>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[RecordFilter] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order. A malformed `email` is stripped from the
    /// record rather than written in clear, the record still continues,
    /// and one diagnostic is returned for it.
    pub fn apply(&self, record: &mut LogRecord) -> ChainOutcome {
        let mut outcome = ChainOutcome {
            allowed: true,
            diagnostics: Vec::new(),
        };

        for stage in &self.stages {
            match stage.apply(record) {
                Ok(true) => {}
                Ok(false) => {
                    outcome.allowed = false;
                    break;
                }
                Err(e) => {
                    record.extra.remove(EMAIL_FIELD);
                    outcome.diagnostics.push(diagnostic_for(record, stage.name(), &e));
                }
            }
        }

        outcome
    }
}

fn diagnostic_for(record: &LogRecord, filter: &str, err: &MalformedInputError) -> LogRecord {
    let mut diagnostic = LogRecord::new(
        LogLevel::Warn,
        DIAGNOSTIC_LOGGER,
        format!(
            "Filter '{filter}' failed on record from {}:{} ({err}); email attribute removed",
            record.logger_name, record.line
        ),
    );
    diagnostic.line = line!();
    diagnostic.correlation_id = record.correlation_id.clone();
    diagnostic
}
