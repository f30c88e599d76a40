use flexi_logger::{
    Age, Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
};
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Deserialize, Copy, Clone, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn stringify(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.stringify())
    }
}

#[derive(Deserialize, Copy, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SinkType {
    Console,
    File,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct SinkConfig {
    pub sink_type: SinkType,
    pub file_directory: Option<String>,
    pub file_max_size_bytes: Option<u64>,
    pub file_max_log_history: Option<u32>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct LoggerConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default = "default_sinks")]
    pub sinks: Vec<SinkConfig>,
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![SinkConfig {
        sink_type: SinkType::Console,
        file_directory: None,
        file_max_size_bytes: None,
        file_max_log_history: None,
    }]
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            sinks: default_sinks(),
        }
    }
}

#[derive(Error, Debug)]
pub enum LogError {
    #[error("no logging sink configured")]
    NoSinks,
    #[error("only one file sink is supported")]
    MultipleFileSinks,
    #[error(transparent)]
    FlexiLoggerError(#[from] FlexiLoggerError),
}

/// Installs the global logger. The returned handle must be kept alive for
/// file output to be flushed.
pub fn init(config: &LoggerConfig) -> Result<LoggerHandle, LogError> {
    if config.sinks.is_empty() {
        return Err(LogError::NoSinks);
    }
    let mut files = config.sinks.iter().filter(|s| s.sink_type == SinkType::File);
    let file = files.next();
    if files.next().is_some() {
        return Err(LogError::MultipleFileSinks);
    }
    let console = config.sinks.iter().any(|s| s.sink_type == SinkType::Console);

    let logger = Logger::try_with_str(config.level.stringify())?
        .format_for_stdout(flexi_logger::colored_with_thread)
        .format_for_files(flexi_logger::with_thread);
    let logger = match file {
        Some(sink) => {
            let logger = logger
                .log_to_file(
                    FileSpec::default().basename("replay").directory(
                        sink.file_directory
                            .clone()
                            .unwrap_or_else(|| "logs/".to_string()),
                    ),
                )
                .rotate(
                    Criterion::AgeOrSize(
                        Age::Day,
                        sink.file_max_size_bytes.unwrap_or(5 * 1024 * 1024),
                    ),
                    Naming::Timestamps,
                    Cleanup::KeepLogFiles(sink.file_max_log_history.unwrap_or(10) as usize),
                );
            if console {
                logger.duplicate_to_stdout(Duplicate::All)
            } else {
                logger
            }
        }
        None => logger.log_to_stdout(),
    };
    Ok(logger.start()?)
}
