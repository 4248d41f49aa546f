use std::sync::Arc;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::error::SatPrepResult;
use crate::llm::CompletionService;
use crate::logging::PerformanceTimer;
use crate::report::AnalysisReport;

pub const DEFAULT_MAX_LENGTH: usize = 4000;

pub const SYSTEM_PROMPT: &str = "You are an AI SAT tutor analyzing student performance.";

/// The two messages sent for one analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub system: String,
    pub user: String,
}

/// Keep at most `max_chars` characters from the start of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Turns test questions, the answer key and the student's responses into a
/// tutor report via a completion service.
pub struct PerformanceAnalyzer {
    service: Arc<dyn CompletionService>,
    max_length: usize,
}

impl PerformanceAnalyzer {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            service,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    pub fn with_config(service: Arc<dyn CompletionService>, config: &AnalysisConfig) -> Self {
        Self {
            service,
            max_length: config.max_length,
        }
    }

    /// Build the prompt. Each input is cut independently to `max_length` chars.
    pub fn build_prompt(&self, questions: &str, answers: &str, responses: &str) -> AnalysisPrompt {
        let questions = truncate_chars(questions, self.max_length);
        let answers = truncate_chars(answers, self.max_length);
        let responses = truncate_chars(responses, self.max_length);

        let user = format!(
            "Analyze the following SAT test performance:\n\
             Questions: {questions}\n\
             Correct Answers: {answers}\n\
             User Responses: {responses}\n\
             Identify weak topics, strong topics, and suggest a 1-week study plan.\n"
        );

        AnalysisPrompt {
            system: SYSTEM_PROMPT.to_string(),
            user,
        }
    }

    /// Run one analysis. Every call goes to the service; nothing is cached
    /// and failures are returned as-is.
    pub async fn analyze(&self, questions: &str, answers: &str, responses: &str) -> SatPrepResult<AnalysisReport> {
        let timer = PerformanceTimer::start("performance analysis");

        let prompt = self.build_prompt(questions, answers, responses);
        timer.checkpoint("prompt built");
        info!(
            "🤖 Requesting analysis from {} ({} prompt chars)",
            self.service.model(),
            prompt.user.chars().count()
        );

        let content = self.service.complete(&prompt).await?;
        info!("✅ Analysis received: {} chars", content.chars().count());

        Ok(AnalysisReport::new(content, self.service.model()))
    }
}
