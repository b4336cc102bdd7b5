//! Request and result types for README summarization.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::services::schema::StructuredOutput;

/// Structured result extracted from a README by the language model.
///
/// This is also the exact wire shape the model is instructed to produce:
/// `{"summary": "...", "cool_facts": ["...", ...]}`. Unknown fields are
/// rejected rather than ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionResult {
    /// Two to four sentence overview of the repository.
    pub summary: String,

    /// Three to five notable facts, in the order the model gave them.
    pub cool_facts: Vec<String>,
}

impl StructuredOutput for ExtractionResult {
    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "minLength": 1,
                    "description": "A 2-4 sentence summary of the GitHub repository"
                },
                "cool_facts": {
                    "type": "array",
                    "minItems": 1,
                    "items": { "type": "string", "minLength": 1 },
                    "description": "A list of 3-5 interesting or cool facts about the repository"
                }
            },
            "required": ["summary", "cool_facts"],
            "additionalProperties": false
        })
    }

    fn check(&self) -> Result<(), String> {
        if self.summary.trim().is_empty() {
            return Err("summary is empty".to_string());
        }
        if self.cool_facts.is_empty() {
            return Err("cool_facts has no items".to_string());
        }
        if let Some(index) = self.cool_facts.iter().position(|f| f.trim().is_empty()) {
            return Err(format!("cool_facts[{index}] is empty"));
        }
        Ok(())
    }
}

/// Body of `POST /api/github-summarizer`.
///
/// The locator is optional at the serde level so that a missing one is
/// reported after authentication, as `InvalidLocator`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    #[serde(default, alias = "githubUrl")]
    pub repo_url: Option<String>,
}

impl SummarizeRequest {
    /// Lenient body parsing: an empty or malformed body yields no locator.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

/// Successful summarizer response.
///
/// ```json
/// {
///   "success": true,
///   "summary": "A tool.",
///   "coolFacts": ["fast", "small", "free"]
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeResponse {
    pub success: bool,
    pub summary: String,
    pub cool_facts: Vec<String>,
}

impl From<ExtractionResult> for SummarizeResponse {
    fn from(result: ExtractionResult) -> Self {
        Self {
            success: true,
            summary: result.summary,
            cool_facts: result.cool_facts,
        }
    }
}
