//! Logger/sink wiring.
//!
//! A pipeline is a set of named sinks plus a set of named loggers. A
//! record is routed to the logger whose name is the longest prefix of the
//! record's logger name (segments split on `::` or `.`), checked against
//! that logger's threshold, and handed to each attached sink. Loggers with
//! `propagate` set also hand the record to their nearest configured
//! ancestor's sinks.

use std::collections::HashSet;

use super::filter::{CorrelationTagger, FilterChain, RecordFilter, RedactionFilter};
use super::format::Formatter;
use super::record::{LogLevel, LogRecord};
use super::rotation::RotatingFileWriter;
use super::sink::{Sink, SinkConfig, SinkTarget, SinkTargetConfig};
use crate::config::LogSettings;
use crate::error::ConfigurationError;

/// Logger owning everything this crate emits.
pub const APP_LOGGER: &str = "social_media";

pub const CONSOLE_SINK: &str = "console";
pub const FILE_SINK: &str = "rotating_file";

/// Downstream crates routed to the console only, with coarser thresholds.
const LIBRARY_LOGGERS: [(&str, LogLevel); 3] = [
    ("axum", LogLevel::Info),
    ("hyper", LogLevel::Warn),
    ("tower", LogLevel::Warn),
];

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub name: String,
    pub level: LogLevel,
    pub sinks: Vec<String>,
    pub propagate: bool,
}

impl LoggerConfig {
    pub fn new(name: impl Into<String>, level: LogLevel) -> Self {
        Self {
            name: name.into(),
            level,
            sinks: Vec::new(),
            propagate: true,
        }
    }

    #[must_use]
    pub fn sink(mut self, name: impl Into<String>) -> Self {
        self.sinks.push(name.into());
        self
    }

    #[must_use]
    pub fn propagate(mut self, propagate: bool) -> Self {
        self.propagate = propagate;
        self
    }
}

#[derive(Debug)]
struct Logger {
    name: String,
    level: LogLevel,
    sinks: Vec<usize>,
    propagate: bool,
}

/// Whether `target` is `name` or one of its descendants.
fn is_within(name: &str, target: &str) -> bool {
    match target.strip_prefix(name) {
        Some("") => true,
        Some(rest) => rest.starts_with("::") || rest.starts_with('.'),
        None => false,
    }
}

#[derive(Debug, Default)]
pub struct LogPipelineBuilder {
    sinks: Vec<SinkConfig>,
    loggers: Vec<LoggerConfig>,
}

impl LogPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sink(mut self, sink: SinkConfig) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use]
    pub fn logger(mut self, logger: LoggerConfig) -> Self {
        self.loggers.push(logger);
        self
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let mut sink_names = HashSet::new();
        for sink in &self.sinks {
            if sink.name.trim().is_empty() {
                return Err(ConfigurationError::Invalid("Sink name cannot be empty".into()));
            }
            if !sink_names.insert(sink.name.as_str()) {
                return Err(ConfigurationError::Duplicate {
                    kind: "sink",
                    name: sink.name.clone(),
                });
            }
        }

        let mut logger_names = HashSet::new();
        for logger in &self.loggers {
            if logger.name.trim().is_empty() {
                return Err(ConfigurationError::Invalid("Logger name cannot be empty".into()));
            }
            if !logger_names.insert(logger.name.as_str()) {
                return Err(ConfigurationError::Duplicate {
                    kind: "logger",
                    name: logger.name.clone(),
                });
            }
            if let Some(missing) = logger.sinks.iter().find(|s| !sink_names.contains(s.as_str())) {
                return Err(ConfigurationError::UnknownSink {
                    logger: logger.name.clone(),
                    sink: missing.clone(),
                });
            }
        }

        Ok(())
    }

    /// Validate the wiring, then open every sink target.
    pub fn build(self) -> Result<LogPipeline, ConfigurationError> {
        self.validate()?;

        let sink_names: Vec<String> = self.sinks.iter().map(|s| s.name.clone()).collect();

        let mut sinks = Vec::with_capacity(self.sinks.len());
        for config in self.sinks {
            let target = match config.target {
                SinkTargetConfig::Stdout => SinkTarget::Stdout,
                SinkTargetConfig::Stderr => SinkTarget::Stderr,
                SinkTargetConfig::RotatingFile {
                    path,
                    max_bytes,
                    backup_count,
                } => {
                    let writer = RotatingFileWriter::open(&path, max_bytes, backup_count)
                        .map_err(|source| ConfigurationError::SinkOpen {
                            path: path.display().to_string(),
                            source,
                        })?;
                    SinkTarget::File(writer)
                }
                SinkTargetConfig::Writer(slot) => SinkTarget::Writer(slot.0),
            };
            sinks.push(Sink::new(
                config.name,
                config.threshold,
                config.formatter,
                config.filters,
                target,
            ));
        }

        let loggers = self
            .loggers
            .into_iter()
            .map(|config| Logger {
                sinks: config
                    .sinks
                    .iter()
                    .filter_map(|name| sink_names.iter().position(|s| s == name))
                    .collect(),
                name: config.name,
                level: config.level,
                propagate: config.propagate,
            })
            .collect();

        Ok(LogPipeline { sinks, loggers })
    }
}

#[derive(Debug)]
pub struct LogPipeline {
    sinks: Vec<Sink>,
    loggers: Vec<Logger>,
}

impl LogPipeline {
    pub fn builder() -> LogPipelineBuilder {
        LogPipelineBuilder::new()
    }

    /// The profile-driven pipeline used by the service, console on stdout.
    pub fn standard(settings: &LogSettings) -> Result<Self, ConfigurationError> {
        Self::standard_builder(settings, SinkTargetConfig::Stdout).build()
    }

    /// Standard wiring with a caller-chosen console target.
    pub fn standard_builder(settings: &LogSettings, console: SinkTargetConfig) -> LogPipelineBuilder {
        let env = settings.environment;
        let filters = FilterChain::new(vec![
            RecordFilter::Correlation(CorrelationTagger::new(env.correlation_id_length())),
            RecordFilter::Redaction(RedactionFilter::new(
                "email_obfuscation",
                env.email_reveal_length(),
            )),
        ]);

        let mut builder = Self::builder()
            .sink(
                SinkConfig::new(CONSOLE_SINK, Formatter::Console, console)
                    .threshold(LogLevel::Debug)
                    .filters(filters.clone()),
            )
            .sink(
                SinkConfig::new(
                    FILE_SINK,
                    Formatter::Json,
                    SinkTargetConfig::RotatingFile {
                        path: settings.log_file.clone(),
                        max_bytes: settings.max_bytes,
                        backup_count: settings.backup_count,
                    },
                )
                .threshold(LogLevel::Debug)
                .filters(filters),
            )
            .logger(
                LoggerConfig::new(APP_LOGGER, env.default_log_level())
                    .sink(CONSOLE_SINK)
                    .sink(FILE_SINK)
                    .propagate(false),
            );

        for (name, level) in LIBRARY_LOGGERS {
            builder = builder.logger(LoggerConfig::new(name, level).sink(CONSOLE_SINK));
        }
        builder
    }

    fn resolve(&self, target: &str) -> Option<usize> {
        self.loggers
            .iter()
            .enumerate()
            .filter(|(_, logger)| is_within(&logger.name, target))
            .max_by_key(|(_, logger)| logger.name.len())
            .map(|(i, _)| i)
    }

    fn parent(&self, index: usize) -> Option<usize> {
        let name = &self.loggers[index].name;
        self.loggers
            .iter()
            .enumerate()
            .filter(|(i, logger)| *i != index && is_within(&logger.name, name))
            .max_by_key(|(_, logger)| logger.name.len())
            .map(|(i, _)| i)
    }

    /// Threshold of the logger that would handle `target`, if any.
    pub fn effective_level(&self, target: &str) -> Option<LogLevel> {
        self.resolve(target).map(|i| self.loggers[i].level)
    }

    pub fn enabled(&self, target: &str, level: LogLevel) -> bool {
        self.effective_level(target).is_some_and(|min| level >= min)
    }

    pub fn sink_names(&self) -> impl Iterator<Item = &str> {
        self.sinks.iter().map(Sink::name)
    }

    /// Route one record through its logger's sinks.
    ///
    /// Filter diagnostics are routed afterwards like any other record, so
    /// each one is written once per sink that accepts it.
    pub fn dispatch(&self, record: LogRecord) {
        let diagnostics = self.route(record);
        for diagnostic in diagnostics {
            // Diagnostics carry no email, so routing them raises nothing new.
            self.route(diagnostic);
        }
    }

    fn route(&self, mut record: LogRecord) -> Vec<LogRecord> {
        let mut diagnostics = Vec::new();
        let Some(mut index) = self.resolve(&record.logger_name) else {
            return diagnostics;
        };
        if record.level < self.loggers[index].level {
            return diagnostics;
        }

        loop {
            let logger = &self.loggers[index];
            for &sink in &logger.sinks {
                diagnostics.extend(self.sinks[sink].emit(&mut record));
            }
            if !logger.propagate {
                break;
            }
            match self.parent(index) {
                Some(parent) => index = parent,
                None => break,
            }
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::logging::sink::WriterSlot;
    use crate::test_support::SharedBuffer;
    use serde_json::Value;
    use tempfile::TempDir;

    fn standard(env: Environment, dir: &TempDir, console: &SharedBuffer) -> LogPipeline {
        let settings = LogSettings::new(env, dir.path().join("social_media.log"));
        LogPipeline::standard_builder(
            &settings,
            SinkTargetConfig::Writer(WriterSlot(Box::new(console.clone()))),
        )
        .build()
        .unwrap()
    }

    fn file_lines(dir: &TempDir) -> Vec<Value> {
        std::fs::read_to_string(dir.path().join("social_media.log"))
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("social_media", "social_media"));
        assert!(is_within("social_media", "social_media::handler::post"));
        assert!(is_within("social_media", "social_media.routers.post"));
        assert!(!is_within("social_media", "social_media_extra"));
        assert!(!is_within("hyper", "hyper_util::client"));
    }

    #[test]
    fn test_standard_thresholds_dev() {
        let dir = TempDir::new().unwrap();
        let pipeline = standard(Environment::Dev, &dir, &SharedBuffer::new());

        assert_eq!(pipeline.effective_level("social_media::handler::post"), Some(LogLevel::Debug));
        assert_eq!(pipeline.effective_level("axum::serve"), Some(LogLevel::Info));
        assert_eq!(pipeline.effective_level("hyper::proto"), Some(LogLevel::Warn));
        assert_eq!(pipeline.effective_level("tower"), Some(LogLevel::Warn));
        assert_eq!(pipeline.effective_level("reqwest"), None);
        assert!(pipeline.enabled("social_media", LogLevel::Debug));
        assert!(!pipeline.enabled("hyper", LogLevel::Info));
    }

    #[test]
    fn test_standard_thresholds_prod() {
        let dir = TempDir::new().unwrap();
        let pipeline = standard(Environment::Prod, &dir, &SharedBuffer::new());
        assert_eq!(pipeline.effective_level("social_media"), Some(LogLevel::Info));
        assert!(!pipeline.enabled("social_media::handler::post", LogLevel::Debug));
    }

    #[test]
    fn test_standard_has_both_sinks() {
        let dir = TempDir::new().unwrap();
        let pipeline = standard(Environment::Dev, &dir, &SharedBuffer::new());
        let names: Vec<&str> = pipeline.sink_names().collect();
        assert_eq!(names, vec![CONSOLE_SINK, FILE_SINK]);
    }

    #[test]
    fn test_app_record_reaches_console_and_file_redacted() {
        let dir = TempDir::new().unwrap();
        let console = SharedBuffer::new();
        let pipeline = standard(Environment::Dev, &dir, &console);

        pipeline.dispatch(
            LogRecord::new(LogLevel::Info, "social_media::handler::user", "Registering user")
                .with_line(30)
                .with_extra("email", "john.doe@example.com"),
        );

        assert_eq!(
            console.contents(),
            "(-) social_media::handler::user 30 - Registering user\n"
        );
        let lines = file_lines(&dir);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["email"], "joh*****@example.com");
        assert_eq!(lines[0]["levelname"], "INFO");
        assert_eq!(lines[0]["correlation_token"], "-");
    }

    #[test]
    fn test_prod_fully_redacts() {
        let dir = TempDir::new().unwrap();
        let pipeline = standard(Environment::Prod, &dir, &SharedBuffer::new());

        pipeline.dispatch(
            LogRecord::new(LogLevel::Info, "social_media", "Registering user")
                .with_extra("email", "john.doe@example.com"),
        );

        assert_eq!(file_lines(&dir)[0]["email"], "********@example.com");
    }

    #[test]
    fn test_malformed_email_diagnostic_reaches_each_sink_once() {
        let dir = TempDir::new().unwrap();
        let console = SharedBuffer::new();
        let pipeline = standard(Environment::Dev, &dir, &console);

        pipeline.dispatch(
            LogRecord::new(LogLevel::Info, "social_media::handler::user", "Registering user")
                .with_extra("email", "john.doe"),
        );

        let console_lines = console.lines();
        assert_eq!(console_lines.len(), 2);
        assert!(console_lines[1].contains("social_media::logging"));
        assert!(!console.contents().contains("john.doe"));

        let lines = file_lines(&dir);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].get("email").is_none());
        assert_eq!(lines[1]["levelname"], "WARNING");
        assert_eq!(lines[1]["logger_name"], "social_media::logging");
    }

    #[test]
    fn test_library_records_console_only() {
        let dir = TempDir::new().unwrap();
        let console = SharedBuffer::new();
        let pipeline = standard(Environment::Dev, &dir, &console);

        pipeline.dispatch(LogRecord::new(LogLevel::Info, "axum::serve", "listening"));
        pipeline.dispatch(LogRecord::new(LogLevel::Info, "hyper::proto", "suppressed"));

        assert_eq!(console.lines().len(), 1);
        assert!(file_lines(&dir).is_empty());
    }

    #[test]
    fn test_unconfigured_target_dropped() {
        let dir = TempDir::new().unwrap();
        let console = SharedBuffer::new();
        let pipeline = standard(Environment::Dev, &dir, &console);

        pipeline.dispatch(LogRecord::new(LogLevel::Error, "reqwest::connect", "dropped"));
        assert!(console.contents().is_empty());
    }

    #[test]
    fn test_propagation_to_ancestor() {
        let parent = SharedBuffer::new();
        let child = SharedBuffer::new();
        let pipeline = LogPipeline::builder()
            .sink(SinkConfig::writer("parent", Formatter::Console, parent.clone()))
            .sink(SinkConfig::writer("child", Formatter::Console, child.clone()))
            .logger(LoggerConfig::new("app", LogLevel::Warn).sink("parent"))
            .logger(LoggerConfig::new("app::db", LogLevel::Debug).sink("child"))
            .build()
            .unwrap();

        // Ancestor thresholds do not apply to propagated records.
        pipeline.dispatch(LogRecord::new(LogLevel::Debug, "app::db::pool", "checkout"));

        assert_eq!(child.lines().len(), 1);
        assert_eq!(parent.lines().len(), 1);
    }

    #[test]
    fn test_no_propagation_when_disabled() {
        let parent = SharedBuffer::new();
        let child = SharedBuffer::new();
        let pipeline = LogPipeline::builder()
            .sink(SinkConfig::writer("parent", Formatter::Console, parent.clone()))
            .sink(SinkConfig::writer("child", Formatter::Console, child.clone()))
            .logger(LoggerConfig::new("app", LogLevel::Debug).sink("parent"))
            .logger(LoggerConfig::new("app::db", LogLevel::Debug).sink("child").propagate(false))
            .build()
            .unwrap();

        pipeline.dispatch(LogRecord::new(LogLevel::Info, "app::db", "query"));

        assert_eq!(child.lines().len(), 1);
        assert!(parent.contents().is_empty());
    }

    #[test]
    fn test_unknown_sink_rejected_before_opening_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never.log");
        let err = LogPipeline::builder()
            .sink(SinkConfig::new(
                "file",
                Formatter::Json,
                SinkTargetConfig::RotatingFile {
                    path: path.clone(),
                    max_bytes: 1024,
                    backup_count: 1,
                },
            ))
            .logger(LoggerConfig::new("app", LogLevel::Info).sink("missing"))
            .build()
            .unwrap_err();

        assert!(matches!(err, ConfigurationError::UnknownSink { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = LogPipeline::builder()
            .sink(SinkConfig::new("console", Formatter::Console, SinkTargetConfig::Stderr))
            .sink(SinkConfig::new("console", Formatter::Console, SinkTargetConfig::Stderr))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::Duplicate { kind: "sink", .. }));

        let err = LogPipeline::builder()
            .logger(LoggerConfig::new("app", LogLevel::Info))
            .logger(LoggerConfig::new("app", LogLevel::Debug))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::Duplicate { kind: "logger", .. }));
    }

    #[test]
    fn test_unopenable_file_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let settings = LogSettings::new(Environment::Dev, blocker.join("app.log"));
        let err = LogPipeline::standard(&settings).unwrap_err();
        assert!(matches!(err, ConfigurationError::SinkOpen { .. }));
    }
}
