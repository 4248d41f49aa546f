use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
    Registry,
};

use crate::error::SatPrepResult;

/// Logging configuration for satprep
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: PathBuf,
    pub enable_file_logging: bool,
    pub enable_json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            enable_file_logging: false,
            enable_json_format: false,
        }
    }
}

/// Keeps the non-blocking file writer alive. Dropping it flushes buffered lines.
pub struct LoggingGuard {
    #[cfg(feature = "advanced_logging")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialize the logging system
pub fn init_logging(config: &LoggingConfig) -> SatPrepResult<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            // Keep the HTTP stack quiet unless asked for
            EnvFilter::new(format!(
                "satprep={},reqwest=warn,hyper=warn,{}",
                config.level, config.level
            ))
        });

    let registry = Registry::default().with(env_filter);

    // Console output goes to stderr so the report on stdout stays clean
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .boxed();

    #[cfg(feature = "advanced_logging")]
    {
        if config.enable_file_logging {
            use crate::error::ErrorContext;

            std::fs::create_dir_all(&config.log_dir).with_path(&config.log_dir)?;

            let file_appender = tracing_appender::rolling::daily(&config.log_dir, "satprep.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = if config.enable_json_format {
                fmt::layer()
                    .json()
                    .with_writer(file_writer)
                    .boxed()
            } else {
                fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .boxed()
            };

            registry.with(console_layer).with(file_layer).init();
            info!("File logging enabled: {}", config.log_dir.display());
            return Ok(LoggingGuard { _file_guard: Some(guard) });
        }
    }

    #[cfg(not(feature = "advanced_logging"))]
    {
        if config.enable_file_logging {
            // Warned after init below so the message actually lands somewhere
            registry.with(console_layer).init();
            tracing::warn!(
                "File logging requested but satprep was built without `advanced_logging`"
            );
            return Ok(LoggingGuard {});
        }
    }

    registry.with(console_layer).init();
    info!("Log level: {}", config.level);

    Ok(LoggingGuard {
        #[cfg(feature = "advanced_logging")]
        _file_guard: None,
    })
}

/// Log system information for debugging
pub fn log_system_info() {
    info!("satprep v{}", env!("CARGO_PKG_VERSION"));
    info!("System: {} {}", std::env::consts::OS, std::env::consts::ARCH);

    if let Ok(cwd) = std::env::current_dir() {
        info!("Working directory: {}", cwd.display());
    }
}

/// Performance logging utilities
pub struct PerformanceTimer {
    start: std::time::Instant,
    operation: String,
}

impl PerformanceTimer {
    pub fn start(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        info!("⏱️  Starting: {}", operation);
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    pub fn checkpoint(&self, checkpoint: &str) {
        let elapsed = self.start.elapsed();
        info!("⏱️  {} - {}: {}ms", self.operation, checkpoint, elapsed.as_millis());
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        info!("⏱️  Completed {}: {}ms", self.operation, elapsed.as_millis());
    }
}

/// Macro for logging with context
#[macro_export]
macro_rules! log_error {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            recoverable = $error.is_recoverable(),
            "satprep error occurred"
        );
    };
}

#[macro_export]
macro_rules! log_processing_start {
    ($file:expr, $size:expr) => {
        tracing::info!(
            file = %$file,
            size_bytes = $size,
            "📄 Starting PDF extraction"
        );
    };
}

#[macro_export]
macro_rules! log_chunk_created {
    ($chunk_index:expr, $char_count:expr, $start:expr) => {
        tracing::debug!(
            chunk_index = $chunk_index,
            char_count = $char_count,
            start = $start,
            "Created text chunk"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_logging_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.enable_file_logging);
    }

    #[test]
    fn test_timer_measures_elapsed() {
        let timer = PerformanceTimer::start("unit test");
        std::thread::sleep(std::time::Duration::from_millis(5));
        timer.checkpoint("slept");
        assert!(timer.elapsed_ms() >= 5);
    }
}
