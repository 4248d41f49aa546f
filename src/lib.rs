// Public module exports for the satprep binary and integration tests
pub mod analyzer;
pub mod chunker;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod report;

pub use analyzer::{AnalysisPrompt, PerformanceAnalyzer};
pub use chunker::{chunk_text, TextChunk, TextChunker};
pub use config::SatPrepConfig;
pub use error::{SatPrepError, SatPrepResult};
pub use extractor::{extract, PdfTextExtractor};
pub use llm::{CompletionService, OpenAiClient};
pub use pipeline::{PrepPipeline, TestData, UploadedDocument};
pub use report::AnalysisReport;
