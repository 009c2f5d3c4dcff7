use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::subscriber::Interest;
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::pipeline::LogPipeline;
use super::record::{LogLevel, LogRecord};

/// Feeds `tracing` events into a [`LogPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineLayer {
    pipeline: Arc<LogPipeline>,
}

impl PipelineLayer {
    pub fn new(pipeline: LogPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn pipeline(&self) -> &LogPipeline {
        &self.pipeline
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    extra: BTreeMap<String, Value>,
}

impl RecordVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        // Fields forwarded by tracing-log describe the callsite, not the event.
        if field.name().starts_with("log.") {
            return;
        }
        self.extra.insert(field.name().to_string(), value);
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.insert(field, Value::String(format!("{value:?}")));
        }
    }
}

impl<S> Layer<S> for PipelineLayer
where
    S: Subscriber,
{
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        // Thresholds belong to this pipeline, not the callsite.
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        metadata.is_event()
            && self
                .pipeline
                .enabled(metadata.target(), LogLevel::from(metadata.level()))
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let mut record = LogRecord::new(
            LogLevel::from(metadata.level()),
            metadata.target(),
            visitor.message.unwrap_or_default(),
        );
        record.line = metadata.line().unwrap_or(0);
        record.extra = visitor.extra;

        self.pipeline.dispatch(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::correlation::{CorrelationId, sync_scope};
    use crate::logging::format::Formatter;
    use crate::logging::pipeline::LoggerConfig;
    use crate::logging::sink::SinkConfig;
    use crate::logging::filter::{CorrelationTagger, FilterChain, RecordFilter, RedactionFilter};
    use crate::test_support::SharedBuffer;
    use tracing_subscriber::prelude::*;

    fn layer(buffer: &SharedBuffer, formatter: Formatter) -> PipelineLayer {
        let filters = FilterChain::new(vec![
            RecordFilter::Correlation(CorrelationTagger::new(8)),
            RecordFilter::Redaction(RedactionFilter::new("email_obfuscation", 3)),
        ]);
        let pipeline = LogPipeline::builder()
            .sink(SinkConfig::writer("capture", formatter, buffer.clone()).filters(filters))
            .logger(LoggerConfig::new("social_media", LogLevel::Info).sink("capture"))
            .build()
            .unwrap();
        PipelineLayer::new(pipeline)
    }

    #[test]
    fn test_event_becomes_console_line() {
        let buffer = SharedBuffer::new();
        let subscriber = tracing_subscriber::registry().with(layer(&buffer, Formatter::Console));

        tracing::subscriber::with_default(subscriber, || {
            sync_scope(CorrelationId::new("1234abcd"), || {
                tracing::info!(target: "social_media::handler::post", "Creating post {}", 5);
            });
        });

        let contents = buffer.contents();
        assert!(contents.starts_with("(1234abcd) social_media::handler::post "));
        assert!(contents.trim_end().ends_with("- Creating post 5"));
    }

    #[test]
    fn test_event_fields_become_redacted_extras() {
        let buffer = SharedBuffer::new();
        let subscriber = tracing_subscriber::registry().with(layer(&buffer, Formatter::Json));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(
                target: "social_media::handler::user",
                email = %"john.doe@example.com",
                user_id = 7u64,
                admin = false,
                "Registering user"
            );
        });

        let value: Value = serde_json::from_str(buffer.lines()[0].as_str()).unwrap();
        assert_eq!(value["message"], "Registering user");
        assert_eq!(value["email"], "joh*****@example.com");
        assert_eq!(value["user_id"], 7);
        assert_eq!(value["admin"], false);
        assert_eq!(value["correlation_token"], "-");
        assert!(value["line"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_below_threshold_and_foreign_targets_ignored() {
        let buffer = SharedBuffer::new();
        let subscriber = tracing_subscriber::registry().with(layer(&buffer, Formatter::Console));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "social_media", "too verbose");
            tracing::error!(target: "other_crate", "not ours");
        });

        assert!(buffer.contents().is_empty());
    }
}
