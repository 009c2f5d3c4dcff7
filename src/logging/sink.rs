use parking_lot::Mutex;
use std::io::{self, Write};

use super::filter::FilterChain;
use super::format::Formatter;
use super::record::{LogLevel, LogRecord};
use super::rotation::RotatingFileWriter;

/// Where formatted lines end up.
pub enum SinkTarget {
    Stdout,
    Stderr,
    File(RotatingFileWriter),
    Writer(Box<dyn Write + Send>),
}

impl SinkTarget {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self {
            SinkTarget::Stdout => writeln!(io::stdout().lock(), "{line}"),
            SinkTarget::Stderr => writeln!(io::stderr().lock(), "{line}"),
            SinkTarget::File(writer) => writer.write_line(line),
            SinkTarget::Writer(writer) => {
                writeln!(writer, "{line}")?;
                writer.flush()
            }
        }
    }
}

impl std::fmt::Debug for SinkTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkTarget::Stdout => f.write_str("Stdout"),
            SinkTarget::Stderr => f.write_str("Stderr"),
            SinkTarget::File(w) => f.debug_tuple("File").field(&w.path()).finish(),
            SinkTarget::Writer(_) => f.write_str("Writer"),
        }
    }
}

/// Description of a sink before its target is opened.
#[derive(Debug)]
pub struct SinkConfig {
    pub name: String,
    pub threshold: LogLevel,
    pub formatter: Formatter,
    pub filters: FilterChain,
    pub target: SinkTargetConfig,
}

#[derive(Debug)]
pub enum SinkTargetConfig {
    Stdout,
    Stderr,
    RotatingFile {
        path: std::path::PathBuf,
        max_bytes: u64,
        backup_count: usize,
    },
    Writer(WriterSlot),
}

/// Pre-built writer handed to the builder.
pub struct WriterSlot(pub Box<dyn Write + Send>);

impl std::fmt::Debug for WriterSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WriterSlot")
    }
}

impl SinkConfig {
    pub fn new(name: impl Into<String>, formatter: Formatter, target: SinkTargetConfig) -> Self {
        Self {
            name: name.into(),
            threshold: LogLevel::Trace,
            formatter,
            filters: FilterChain::default(),
            target,
        }
    }

    #[must_use]
    pub fn threshold(mut self, level: LogLevel) -> Self {
        self.threshold = level;
        self
    }

    #[must_use]
    pub fn filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn writer(name: impl Into<String>, formatter: Formatter, writer: impl Write + Send + 'static) -> Self {
        Self::new(name, formatter, SinkTargetConfig::Writer(WriterSlot(Box::new(writer))))
    }
}

#[derive(Debug)]
pub struct Sink {
    name: String,
    threshold: LogLevel,
    formatter: Formatter,
    filters: FilterChain,
    target: Mutex<SinkTarget>,
}

impl Sink {
    pub fn new(
        name: impl Into<String>,
        threshold: LogLevel,
        formatter: Formatter,
        filters: FilterChain,
        target: SinkTarget,
    ) -> Self {
        Self {
            name: name.into(),
            threshold,
            formatter,
            filters,
            target: Mutex::new(target),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    /// Filter, format and write one record. Returns the diagnostics raised
    /// by the filter chain, for the caller to route.
    ///
    /// I/O failures are reported on stderr and otherwise ignored: a broken
    /// sink never fails the code that logged.
    pub fn emit(&self, record: &mut LogRecord) -> Vec<LogRecord> {
        if record.level < self.threshold {
            return Vec::new();
        }

        let outcome = self.filters.apply(record);
        if outcome.allowed {
            let line = self.formatter.format(record);
            if let Err(e) = self.target.lock().write_line(&line) {
                eprintln!("log sink '{}' write failed: {e}", self.name);
            }
        }
        outcome.diagnostics
    }
}
