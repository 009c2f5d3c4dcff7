//! Structured logging with email redaction and request correlation.
//!
//! Code logs through `tracing`. [`PipelineLayer`] turns each event into a
//! [`LogRecord`] and hands it to a [`LogPipeline`], which routes it by
//! logger name to sinks. Each sink runs its filter chain (correlation
//! tagging, then email redaction), formats the record and writes it:
//! a human-readable line on the console, one JSON object per line in a
//! size-rotated file.

pub mod correlation;
pub mod filter;
pub mod format;
pub mod layer;
pub mod obfuscate;
pub mod pipeline;
pub mod record;
pub mod rotation;
pub mod sink;

pub use correlation::CorrelationId;
pub use filter::{CorrelationTagger, FilterChain, RecordFilter, RedactionFilter};
pub use format::Formatter;
pub use layer::PipelineLayer;
pub use obfuscate::obfuscate;
pub use pipeline::{LogPipeline, LogPipelineBuilder, LoggerConfig};
pub use record::{LogLevel, LogRecord};
pub use rotation::RotatingFileWriter;
pub use sink::{Sink, SinkConfig, SinkTarget, SinkTargetConfig};

use parking_lot::Mutex;
use tracing_subscriber::{EnvFilter, prelude::*};

use crate::config::LogSettings;
use crate::error::ConfigurationError;

static INITIALIZED: Mutex<bool> = Mutex::new(false);

/// Build the standard pipeline and install it as the global subscriber.
///
/// Runs once per process; later calls return `Ok(())` without touching
/// the installed pipeline. `RUST_LOG`, when set, narrows what reaches the
/// pipeline further.
pub fn init_logging(settings: &LogSettings) -> Result<(), ConfigurationError> {
    let mut initialized = INITIALIZED.lock();
    if *initialized {
        return Ok(());
    }

    let pipeline = LogPipeline::standard(settings)?;
    let env_filter = EnvFilter::try_from_default_env().ok();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(PipelineLayer::new(pipeline))
        .try_init()
        .map_err(|e| ConfigurationError::SubscriberInstall(e.to_string()))?;

    *initialized = true;
    Ok(())
}
