use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::chunker::TextChunker;
use crate::config::SatPrepConfig;
use crate::extractor::PdfTextExtractor;
use crate::llm::{CompletionService, OpenAiClient};
use crate::pipeline::{process_study_materials, PrepPipeline, UploadedDocument};

/// Options for the `analyze` command
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub questions: PathBuf,
    pub answers: PathBuf,
    pub responses: PathBuf,
    pub materials: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub save: bool,
    pub wrap_width: usize,
}

/// Extract PDF text to stdout or a file
pub async fn extract_command(pdf_path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    info!("🔍 Extracting PDF: {:?}", pdf_path);

    let document = UploadedDocument::from_path(&pdf_path)?;
    let text = PdfTextExtractor::new().extract(&document.bytes)?;

    match output {
        Some(output_path) => {
            tokio::fs::write(&output_path, &text)
                .await
                .with_context(|| format!("Failed to write {:?}", output_path))?;
            println!("🎉 Extraction Complete!");
            println!("   Input file: {:?}", pdf_path);
            println!("   Characters: {}", text.chars().count());
            println!("   Output file: {:?}", output_path);
        }
        None => print!("{}", text),
    }

    Ok(())
}

/// Process study materials and summarize (or dump) the chunks
pub async fn chunk_command(
    pdf_paths: Vec<PathBuf>,
    size: Option<usize>,
    overlap: Option<usize>,
    json: bool,
    mut config: SatPrepConfig,
) -> Result<()> {
    if let Some(size) = size {
        config.chunking.chunk_size = size;
    }
    if let Some(overlap) = overlap {
        config.chunking.chunk_overlap = overlap;
    }

    let materials = pdf_paths
        .iter()
        .map(UploadedDocument::from_path)
        .collect::<Result<Vec<_>, _>>()?;

    let chunker = TextChunker::from_config(&config.chunking)?;
    let processed = process_study_materials(&PdfTextExtractor::new(), &chunker, &materials)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&processed)?);
        return Ok(());
    }

    println!("📚 Study materials processed successfully!");
    for document in &processed.documents {
        println!("   • {} ({} chars)", document.name, document.characters);
    }
    println!("   Total characters: {}", processed.total_characters);
    println!(
        "   Chunks: {} (size {}, overlap {})",
        processed.chunks.len(),
        chunker.chunk_size(),
        chunker.chunk_overlap()
    );
    for chunk in &processed.chunks {
        let preview: String = chunk.text.chars().take(60).collect();
        println!(
            "   [{:>3}] {:>6}..{:<6} {:?}",
            chunk.index, chunk.start, chunk.end, preview
        );
    }

    Ok(())
}

/// Full flow: study materials, test data, analysis, report
pub async fn analyze_command(options: AnalyzeOptions, config: SatPrepConfig) -> Result<()> {
    let api_key = config.api_key()?;
    let service: Arc<dyn CompletionService> = Arc::new(OpenAiClient::new(&config.llm, api_key)?);
    let pipeline = PrepPipeline::new(&config, service)?;

    if !options.materials.is_empty() {
        let materials = options
            .materials
            .iter()
            .map(UploadedDocument::from_path)
            .collect::<Result<Vec<_>, _>>()?;
        let processed = pipeline.process_study_materials(&materials)?;
        println!(
            "📚 Study materials processed successfully! ({} documents, {} chunks)",
            processed.documents.len(),
            processed.chunks.len()
        );
    }

    let questions = UploadedDocument::from_path(&options.questions)?;
    let answers = UploadedDocument::from_path(&options.answers)?;
    let responses = UploadedDocument::from_path(&options.responses)?;
    let data = pipeline.load_test_data(&questions, &answers, &responses)?;
    println!("✅ Test data uploaded successfully!");

    let report = pipeline.generate_report(&data).await?;

    println!();
    println!("Your Performance Analysis Report");
    println!("================================");
    println!("{}", report.render(options.wrap_width));
    println!();

    if options.save {
        let output_path = options
            .output
            .unwrap_or_else(|| default_report_path(&config.output.report_filename, options.json));
        if options.json {
            report.save_json_to(&output_path)?;
        } else {
            report.save_to(&output_path)?;
        }
        println!("📝 Report saved to: {:?}", output_path);
    }

    Ok(())
}

/// Configured report file name, with a `.json` extension for JSON output
fn default_report_path(report_filename: &str, json: bool) -> PathBuf {
    let path = PathBuf::from(report_filename);
    if json {
        path.with_extension("json")
    } else {
        path
    }
}

/// Write a default config file
pub async fn config_init_command(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{:?} already exists (use --force to overwrite)", path);
    }
    SatPrepConfig::default().save_to_file(&path)?;
    println!("⚙️  Wrote default config to {:?}", path);
    Ok(())
}

/// Print the effective config as TOML
pub async fn config_show_command(config: &SatPrepConfig) -> Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_report_defaults_to_json_extension() {
        assert_eq!(default_report_path("sat_report.txt", true), PathBuf::from("sat_report.json"));
        assert_eq!(default_report_path("sat_report.txt", false), PathBuf::from("sat_report.txt"));
        assert_eq!(default_report_path("report", true), PathBuf::from("report.json"));
    }

    #[tokio::test]
    async fn test_config_init_refuses_to_overwrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("satprep.toml");

        config_init_command(path.clone(), false).await.unwrap();
        assert!(config_init_command(path.clone(), false).await.is_err());
        config_init_command(path.clone(), true).await.unwrap();

        let loaded = SatPrepConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.chunking.chunk_size, 1000);
    }
}
