//! Structured extraction: README text in, validated [`ExtractionResult`] out.
//!
//! The generator is called exactly once per extraction and never retried.
//! Its output is treated as untrusted and must pass [`OutputParser::parse`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::models::summary::ExtractionResult;
use crate::services::generator::{ChatPrompt, GenerationError, TextGenerator};
use crate::services::schema::{OutputParser, SchemaViolation};

const SYSTEM_DIRECTIVE: &str = "You will be given the content of a repository's README.md file. \
Generate a short summary (2-4 sentences) as well as a list of 3-5 interesting or cool facts. \
Respond strictly in the output JSON schema described below.";

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("source text is empty")]
    EmptySource,

    #[error(transparent)]
    SchemaViolation(#[from] SchemaViolation),

    #[error("model call timed out")]
    Timeout,

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub struct StructuredExtractor {
    generator: Arc<dyn TextGenerator>,
    parser: OutputParser<ExtractionResult>,
    /// Directive plus format instructions, built once.
    system_prompt: String,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl StructuredExtractor {
    /// `max_concurrent` caps in-flight generator calls across all requests
    /// sharing this extractor. Waiting for a slot counts against `timeout`.
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration, max_concurrent: usize) -> Self {
        let parser = OutputParser::<ExtractionResult>::new();
        let system_prompt = format!("{SYSTEM_DIRECTIVE}\n\n{}", parser.format_instructions());

        Self {
            generator,
            parser,
            system_prompt,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn build_prompt(&self, source_text: &str) -> ChatPrompt {
        ChatPrompt {
            system: self.system_prompt.clone(),
            user: format!("Here is the README content:\n\n{source_text}"),
        }
    }

    /// Summarize `source_text`.
    ///
    /// # Errors
    ///
    /// - `EmptySource`: blank input; the generator is not called
    /// - `Timeout`: no answer within the configured timeout
    /// - `Generation`: the provider call failed
    /// - `SchemaViolation`: the answer is not exactly the declared shape
    pub async fn extract(&self, source_text: &str) -> Result<ExtractionResult, ExtractionError> {
        if source_text.trim().is_empty() {
            return Err(ExtractionError::EmptySource);
        }

        let prompt = self.build_prompt(source_text);

        let call = async {
            // The semaphore is never closed, so acquire only fails if that changes
            let _permit = match self.permits.acquire().await {
                Ok(permit) => permit,
                Err(e) => return Err(GenerationError::Transport(e.to_string())),
            };
            self.generator.generate(&prompt).await
        };

        let raw = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ExtractionError::Timeout)??;

        self.parser.parse(&raw).map_err(|violation| {
            tracing::warn!(
                "Model output violated the summary schema ({}): {}",
                violation.reason,
                violation.raw_preview()
            );
            ExtractionError::SchemaViolation(violation)
        })
    }
}
