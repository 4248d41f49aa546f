use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::analyzer::PerformanceAnalyzer;
use crate::chunker::{TextChunk, TextChunker};
use crate::config::SatPrepConfig;
use crate::error::{ErrorContext, SatPrepError, SatPrepResult};
use crate::extractor::PdfTextExtractor;
use crate::llm::CompletionService;
use crate::log_processing_start;
use crate::report::AnalysisReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentFormat {
    Pdf,
}

impl DocumentFormat {
    /// Only `.pdf` (any case) is accepted
    pub fn from_path(path: &Path) -> SatPrepResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => Ok(DocumentFormat::Pdf),
            Some(ext) => Err(SatPrepError::InvalidFormat { format: ext.to_string() }),
            None => Err(SatPrepError::InvalidFormat { format: "(no extension)".to_string() }),
        }
    }
}

/// A file the user handed us, held in memory until it is extracted
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            format: DocumentFormat::Pdf,
            bytes,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> SatPrepResult<Self> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)?;
        let bytes = std::fs::read(path).with_path(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { name, format, bytes })
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Per-document summary kept after extraction
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub characters: usize,
}

/// Study materials after extraction and chunking
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedMaterials {
    pub documents: Vec<DocumentSummary>,
    pub total_characters: usize,
    pub chunks: Vec<TextChunk>,
}

/// Extracted text of the three test artifacts
#[derive(Debug, Clone)]
pub struct TestData {
    pub questions: String,
    pub answers: String,
    pub responses: String,
}

impl TestData {
    /// Extract all three documents; the first failure aborts
    pub fn from_documents(
        extractor: &PdfTextExtractor,
        questions: &UploadedDocument,
        answers: &UploadedDocument,
        responses: &UploadedDocument,
    ) -> SatPrepResult<Self> {
        Ok(Self {
            questions: extract_document(extractor, questions)?,
            answers: extract_document(extractor, answers)?,
            responses: extract_document(extractor, responses)?,
        })
    }
}

fn extract_document(extractor: &PdfTextExtractor, document: &UploadedDocument) -> SatPrepResult<String> {
    log_processing_start!(document.name, document.size_bytes());
    let text = extractor.extract(&document.bytes).map_err(|e| match e {
        SatPrepError::DocumentParse { message, source } => SatPrepError::DocumentParse {
            message: format!("{}: {}", document.name, message),
            source,
        },
        other => other,
    })?;

    if text.trim().is_empty() {
        warn!("⚠️  {} produced no text (scanned or image-only PDF?)", document.name);
    }
    Ok(text)
}

/// Extract every study document in upload order, join the text and chunk it
pub fn process_study_materials(
    extractor: &PdfTextExtractor,
    chunker: &TextChunker,
    materials: &[UploadedDocument],
) -> SatPrepResult<ProcessedMaterials> {
    let mut combined = String::new();
    let mut documents = Vec::with_capacity(materials.len());

    for material in materials {
        let text = extract_document(extractor, material)?;
        documents.push(DocumentSummary {
            name: material.name.clone(),
            characters: text.chars().count(),
        });
        combined.push_str(&text);
    }

    let chunks = chunker.split(&combined);
    let total_characters = combined.chars().count();
    info!(
        "📚 Processed {} study documents: {} chars, {} chunks",
        documents.len(),
        total_characters,
        chunks.len()
    );

    Ok(ProcessedMaterials {
        documents,
        total_characters,
        chunks,
    })
}

/// Drives one session: study materials in, test data in, report out.
/// The completion service is injected; nothing here is global.
pub struct PrepPipeline {
    extractor: PdfTextExtractor,
    chunker: TextChunker,
    analyzer: PerformanceAnalyzer,
}

impl PrepPipeline {
    pub fn new(config: &SatPrepConfig, service: Arc<dyn CompletionService>) -> SatPrepResult<Self> {
        Ok(Self {
            extractor: PdfTextExtractor::new(),
            chunker: TextChunker::from_config(&config.chunking)?,
            analyzer: PerformanceAnalyzer::with_config(service, &config.analysis),
        })
    }

    /// Extract every study document in upload order, join the text and chunk it.
    /// The chunks are returned to the caller only; analysis does not use them.
    pub fn process_study_materials(&self, materials: &[UploadedDocument]) -> SatPrepResult<ProcessedMaterials> {
        process_study_materials(&self.extractor, &self.chunker, materials)
    }

    pub fn load_test_data(
        &self,
        questions: &UploadedDocument,
        answers: &UploadedDocument,
        responses: &UploadedDocument,
    ) -> SatPrepResult<TestData> {
        let data = TestData::from_documents(&self.extractor, questions, answers, responses)?;
        info!("✅ Test data loaded");
        Ok(data)
    }

    pub async fn generate_report(&self, data: &TestData) -> SatPrepResult<AnalysisReport> {
        self.analyzer
            .analyze(&data.questions, &data.answers, &data.responses)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::tests::RecordingService;
    use crate::extractor::tests::build_pdf;
    use tempfile::tempdir;

    fn pipeline_with(service: Arc<RecordingService>) -> PrepPipeline {
        let mut config = SatPrepConfig::default();
        config.chunking.chunk_size = 8;
        config.chunking.chunk_overlap = 2;
        PrepPipeline::new(&config, service).unwrap()
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.PDF")).unwrap(), DocumentFormat::Pdf);
        assert!(matches!(
            DocumentFormat::from_path(Path::new("notes.docx")),
            Err(SatPrepError::InvalidFormat { ref format }) if format == "docx"
        ));
        assert!(DocumentFormat::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn test_upload_from_path_reads_bytes() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("questions.pdf");
        std::fs::write(&path, build_pdf(&["Q1?"])).unwrap();

        let document = UploadedDocument::from_path(&path).unwrap();
        assert_eq!(document.name, "questions.pdf");
        assert_eq!(document.format, DocumentFormat::Pdf);
        assert!(document.size_bytes() > 0);
    }

    #[test]
    fn test_study_materials_are_joined_in_upload_order() {
        let pipeline = pipeline_with(RecordingService::replying("unused"));
        let materials = vec![
            UploadedDocument::from_bytes("first.pdf", build_pdf(&["alpha"])),
            UploadedDocument::from_bytes("second.pdf", build_pdf(&["omega"])),
        ];

        let processed = pipeline.process_study_materials(&materials).unwrap();
        assert_eq!(processed.documents.len(), 2);
        assert_eq!(processed.documents[0].name, "first.pdf");

        // Undo the 2-char overlap to get the combined text back
        let mut rebuilt = processed.chunks[0].text.clone();
        for chunk in &processed.chunks[1..] {
            rebuilt.extend(chunk.text.chars().skip(2));
        }
        assert_eq!(rebuilt.chars().count(), processed.total_characters);

        let alpha = rebuilt.find("alpha").unwrap();
        let omega = rebuilt.find("omega").unwrap();
        assert!(alpha < omega);
        assert!(processed.chunks.iter().all(|c| c.char_count() <= 8));
    }

    #[test]
    fn test_no_study_materials_yield_one_empty_chunk() {
        let pipeline = pipeline_with(RecordingService::replying("unused"));
        let processed = pipeline.process_study_materials(&[]).unwrap();
        assert_eq!(processed.total_characters, 0);
        assert_eq!(processed.chunks.len(), 1);
    }

    #[test]
    fn test_bad_test_document_names_the_file() {
        let pipeline = pipeline_with(RecordingService::replying("unused"));
        let good = UploadedDocument::from_bytes("questions.pdf", build_pdf(&["Q1?"]));
        let bad = UploadedDocument::from_bytes("answers.pdf", b"not a pdf".to_vec());

        let err = pipeline.load_test_data(&good, &bad, &good).unwrap_err();
        assert!(matches!(err, SatPrepError::DocumentParse { ref message, .. } if message.starts_with("answers.pdf")));
    }

    #[tokio::test]
    async fn test_report_comes_from_service() {
        let service = RecordingService::replying("Your plan");
        let pipeline = pipeline_with(service.clone());
        let questions = UploadedDocument::from_bytes("q.pdf", build_pdf(&["Q1?"]));
        let answers = UploadedDocument::from_bytes("a.pdf", build_pdf(&["A1"]));
        let responses = UploadedDocument::from_bytes("r.pdf", build_pdf(&["R1"]));

        let data = pipeline.load_test_data(&questions, &answers, &responses).unwrap();
        let report = pipeline.generate_report(&data).await.unwrap();

        assert_eq!(report.content, "Your plan");
        let calls = service.calls.lock().unwrap();
        assert!(calls[0].1.contains("Q1?"));
        assert!(calls[0].1.contains("A1"));
        assert!(calls[0].1.contains("R1"));
    }
}
