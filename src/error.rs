use thiserror::Error;

/// Main error type for the SAT prep pipeline
#[derive(Error, Debug)]
pub enum SatPrepError {
    #[error("PDF could not be parsed: {message}")]
    DocumentParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid chunk configuration (size={size}, overlap={overlap}): {reason}")]
    InvalidChunkConfig {
        size: usize,
        overlap: usize,
        reason: String,
    },

    #[error("Analysis service failed: {message}")]
    AnalysisService {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid document format: {format}")]
    InvalidFormat { format: String },

    #[error("File I/O error: {path}")]
    FileIO {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl SatPrepError {
    /// Create a PDF parse error with context
    pub fn document_parse(message: impl Into<String>) -> Self {
        Self::DocumentParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a PDF parse error with source
    pub fn document_parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DocumentParse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn invalid_chunk_config(size: usize, overlap: usize, reason: impl Into<String>) -> Self {
        Self::InvalidChunkConfig {
            size,
            overlap,
            reason: reason.into(),
        }
    }

    /// Create an analysis service error without an underlying cause
    pub fn analysis_service(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::AnalysisService {
            message: message.into(),
            status,
            source: None,
        }
    }

    /// Create an analysis service error wrapping a transport or decode failure
    pub fn analysis_service_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::AnalysisService {
            message: message.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a file I/O error
    pub fn file_io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileIO {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the user can fix this and try again (another file, another click).
    /// Chunk misconfiguration is a programming error and never is.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SatPrepError::InvalidChunkConfig { .. } => false,
            SatPrepError::Configuration { .. } => false,
            _ => true,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            SatPrepError::DocumentParse { .. } => {
                "📄 This PDF couldn't be read. It might be encrypted, corrupted or not a PDF at all.".to_string()
            }
            SatPrepError::InvalidChunkConfig { size, overlap, .. } => {
                format!("⚙️  Chunk overlap ({}) must be smaller than chunk size ({}).", overlap, size)
            }
            SatPrepError::AnalysisService { status: Some(401), .. } => {
                "🔑 The analysis service rejected the API key.".to_string()
            }
            SatPrepError::AnalysisService { status: Some(429), .. } => {
                "⏳ The analysis service is rate limiting requests. Try again shortly.".to_string()
            }
            SatPrepError::AnalysisService { .. } => {
                "🤖 The analysis report could not be generated. Check the logs for details.".to_string()
            }
            SatPrepError::InvalidFormat { format } => {
                format!("📄 Unsupported format: {}. Only PDF files are accepted.", format)
            }
            SatPrepError::FileIO { path, .. } => {
                format!("📁 Couldn't access {}. Check the path and permissions.", path)
            }
            SatPrepError::Configuration { message } => format!("⚙️  Bad configuration: {}", message),
        }
    }
}

/// Result type alias for convenience
pub type SatPrepResult<T> = Result<T, SatPrepError>;

/// Error context for attaching a file path to I/O failures
pub trait ErrorContext<T> {
    fn with_path(self, path: &std::path::Path) -> SatPrepResult<T>;
}

impl<T> ErrorContext<T> for Result<T, std::io::Error> {
    fn with_path(self, path: &std::path::Path) -> SatPrepResult<T> {
        self.map_err(|e| SatPrepError::file_io(path.display().to_string(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_config_is_not_recoverable() {
        let err = SatPrepError::invalid_chunk_config(10, 10, "overlap must be smaller than size");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("size=10"));
    }

    #[test]
    fn test_service_errors_are_recoverable() {
        let err = SatPrepError::analysis_service("rate limited", Some(429));
        assert!(err.is_recoverable());
        assert!(err.user_message().contains("rate limiting"));
    }

    #[test]
    fn test_io_context_keeps_path() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let err = result.with_path(std::path::Path::new("answers.pdf")).unwrap_err();
        assert!(matches!(err, SatPrepError::FileIO { ref path, .. } if path == "answers.pdf"));
    }
}
