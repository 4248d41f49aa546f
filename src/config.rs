use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ErrorContext, SatPrepError, SatPrepResult};

pub const DEFAULT_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_REPORT_FILENAME: &str = "sat_report.txt";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SatPrepConfig {
    pub llm: LlmConfig,
    pub chunking: ChunkingConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Root of an OpenAI-compatible API, without the `/v1/...` path
    pub base_url: String,

    /// Model identifier sent with every completion request
    pub model: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Request timeout. Unset means the HTTP client's default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks; must be < chunk_size
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Each of questions/answers/responses is cut to this many characters
    pub max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_filename: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_seconds: None,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { max_length: 4000 }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_filename: DEFAULT_REPORT_FILENAME.to_string(),
        }
    }
}

impl SatPrepConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SatPrepResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_path(path)?;

        let config: SatPrepConfig = toml::from_str(&content)
            .map_err(|e| SatPrepError::configuration(format!("Failed to parse {}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn load_from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `SATPREP_*` overrides from `lookup`. Blank strings and numbers
    /// that don't parse are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let number = |key: &str| lookup(key).and_then(|value| value.trim().parse::<usize>().ok());

        if let Some(model) = text("SATPREP_MODEL") {
            self.llm.model = model;
        }
        if let Some(base_url) = text("SATPREP_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(max_length) = number("SATPREP_MAX_LENGTH") {
            self.analysis.max_length = max_length;
        }
        if let Some(size) = number("SATPREP_CHUNK_SIZE") {
            self.chunking.chunk_size = size;
        }
        if let Some(overlap) = number("SATPREP_CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = overlap;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SatPrepResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| SatPrepError::configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }

    pub fn validate(&self) -> SatPrepResult<()> {
        if self.chunking.chunk_size == 0 {
            return Err(SatPrepError::configuration("chunking.chunk_size must be greater than 0"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(SatPrepError::configuration(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.analysis.max_length == 0 {
            return Err(SatPrepError::configuration("analysis.max_length must be greater than 0"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(SatPrepError::configuration("llm.model must not be empty"));
        }
        Ok(())
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> SatPrepResult<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                SatPrepError::configuration(format!(
                    "API key not found; set the {} environment variable",
                    self.llm.api_key_env
                ))
            })
    }
}
