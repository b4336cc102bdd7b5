//! Schema-driven parsing of language model output.
//!
//! A [`StructuredOutput`] type describes itself as a JSON Schema. An
//! [`OutputParser`] turns that schema into format instructions once, at
//! construction, and later validates raw model text against the type. The
//! model is never trusted to follow the instructions: anything that does not
//! deserialize into the exact shape, or fails the type's own checks, is a
//! [`SchemaViolation`].

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// How much of an offending response is kept in logs.
const RAW_PREVIEW_CHARS: usize = 200;

/// A result type the model is asked to produce.
pub trait StructuredOutput: DeserializeOwned {
    /// JSON Schema describing the expected object. Must be a pure function.
    fn json_schema() -> Value;

    /// Checks serde cannot express, such as non-empty strings.
    fn check(&self) -> Result<(), String>;
}

/// Model output that failed to parse into the declared shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct SchemaViolation {
    pub reason: String,
    /// The complete model response, for diagnostics.
    pub raw: String,
}

impl SchemaViolation {
    /// First characters of the raw output, safe to put in a log line.
    pub fn raw_preview(&self) -> String {
        let mut preview: String = self.raw.chars().take(RAW_PREVIEW_CHARS).collect();
        if self.raw.chars().count() > RAW_PREVIEW_CHARS {
            preview.push_str("...");
        }
        preview
    }
}

pub struct OutputParser<T> {
    format_instructions: String,
    _output: PhantomData<fn() -> T>,
}

impl<T: StructuredOutput> OutputParser<T> {
    pub fn new() -> Self {
        Self {
            format_instructions: format_instructions(&T::json_schema()),
            _output: PhantomData,
        }
    }

    /// Instructions to embed in the system prompt. Identical for every call.
    pub fn format_instructions(&self) -> &str {
        &self.format_instructions
    }

    /// Parse raw model text.
    ///
    /// A surrounding markdown code fence is tolerated. Beyond that the text
    /// must be exactly one JSON value of the declared shape: missing fields,
    /// unknown fields, wrong types, or failed checks are all violations.
    pub fn parse(&self, raw: &str) -> Result<T, SchemaViolation> {
        let violation = |reason: String| SchemaViolation {
            reason,
            raw: raw.to_string(),
        };

        let candidate = strip_code_fence(raw);
        let output: T = serde_json::from_str(candidate)
            .map_err(|e| violation(format!("output is not a conforming JSON object: {e}")))?;
        output.check().map_err(violation)?;

        Ok(output)
    }
}

impl<T: StructuredOutput> Default for OutputParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for OutputParser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputParser")
            .field("format_instructions", &self.format_instructions)
            .finish()
    }
}

/// Render schema instructions. Deterministic: `serde_json::Value` objects
/// serialize with sorted keys.
fn format_instructions(schema: &Value) -> String {
    format!(
        "The output must be a single JSON object that conforms to the JSON Schema below.\n\
         Return only that object, optionally inside a ```json code block. Do not add prose, \
         comments or trailing commas. Every required property must be present, no other \
         properties are allowed, and each value must have the declared type.\n\
         \n\
         ```json\n{schema}\n```"
    )
}

/// Remove one surrounding markdown code fence, with or without a language tag.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the rest of the opening line (e.g. "json")
    let Some(newline) = rest.find('\n') else {
        return trimmed;
    };
    let body = &rest[newline + 1..];
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Pair {
        left: String,
        right: Vec<u32>,
    }

    impl StructuredOutput for Pair {
        fn json_schema() -> Value {
            json!({
                "type": "object",
                "properties": {
                    "left": { "type": "string" },
                    "right": { "type": "array", "items": { "type": "integer" } }
                },
                "required": ["left", "right"],
                "additionalProperties": false
            })
        }

        fn check(&self) -> Result<(), String> {
            if self.left.is_empty() {
                return Err("left must not be empty".to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn instructions_are_computed_once_and_stable() {
        let a = OutputParser::<Pair>::new();
        let b = OutputParser::<Pair>::new();

        assert_eq!(a.format_instructions(), b.format_instructions());
        assert!(a.format_instructions().contains(r#""required":["left","right"]"#));
        assert!(a.format_instructions().contains("```json"));
    }

    #[test]
    fn parses_plain_and_fenced_json() {
        let parser = OutputParser::<Pair>::new();
        let expected = Pair {
            left: "x".to_string(),
            right: vec![1, 2],
        };

        assert_eq!(parser.parse(r#"{"left":"x","right":[1,2]}"#).unwrap(), expected);
        assert_eq!(
            parser
                .parse("```json\n{\"left\":\"x\",\"right\":[1,2]}\n```\n")
                .unwrap(),
            expected
        );
        assert_eq!(
            parser.parse("```\n{\"left\":\"x\",\"right\":[1,2]}\n```").unwrap(),
            expected
        );
    }

    #[test]
    fn violations_carry_the_raw_text() {
        let parser = OutputParser::<Pair>::new();
        let raw = "Sure! Here you go.";

        let violation = parser.parse(raw).unwrap_err();
        assert_eq!(violation.raw, raw);
        assert!(violation.reason.contains("not a conforming JSON object"));
    }

    #[test]
    fn rejects_shape_mismatches() {
        let parser = OutputParser::<Pair>::new();
        let cases = [
            r#"{"left":"x"}"#,
            r#"{"right":[1]}"#,
            r#"{"left":1,"right":[1]}"#,
            r#"{"left":"x","right":"1"}"#,
            r#"{"left":"x","right":[1],"extra":true}"#,
            r#"[{"left":"x","right":[1]}]"#,
            r#"{"left":"x","right":[1]} trailing"#,
            "",
        ];
        for raw in cases {
            assert!(parser.parse(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn runs_type_checks_after_deserializing() {
        let parser = OutputParser::<Pair>::new();
        let violation = parser.parse(r#"{"left":"","right":[]}"#).unwrap_err();
        assert_eq!(violation.reason, "left must not be empty");
    }

    #[test]
    fn strip_code_fence_leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fence("  {\"a\":1} \n"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json {\"a\":1}```"), "```json {\"a\":1}```");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn raw_preview_is_truncated() {
        let violation = SchemaViolation {
            reason: "bad".to_string(),
            raw: "y".repeat(500),
        };
        let preview = violation.raw_preview();
        assert_eq!(preview.len(), RAW_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }
}
