use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{ErrorContext, SatPrepError, SatPrepResult};

/// The tutor's free-text report plus where and when it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Model output, untouched
    pub content: String,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            generated_at: Utc::now(),
        }
    }

    /// Write the report text exactly as received
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> SatPrepResult<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.content).with_path(path)?;
        info!("📝 Report saved to: {}", path.display());
        Ok(())
    }

    /// Write the full record (text, model, timestamp) as pretty JSON
    pub fn save_json_to<P: AsRef<Path>>(&self, path: P) -> SatPrepResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SatPrepError::configuration(format!("Failed to serialize report: {}", e)))?;
        std::fs::write(path, json).with_path(path)?;
        info!("📝 Report JSON saved to: {}", path.display());
        Ok(())
    }

    /// Wrap the text for a terminal of `width` columns. Blank lines survive.
    pub fn render(&self, width: usize) -> String {
        self.content
            .lines()
            .map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    textwrap::fill(line, width)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
