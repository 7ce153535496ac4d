//! Output scoring — pluggable, trait-based rubric scorer.
//!
//! Default: `LlmRubricScorer` (asks the completion service for a JSON score).
//! `FixedScorer` returns the default record and is used when scoring is disabled.
//!
//! Scoring never fails a request: any completion or parse problem yields the
//! default record.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{strip_json_fences, ChatCompletion, ChatMessage, CompletionRequest};
use crate::writing::prompts::{SCORING_PROMPT_TEMPLATE, SCORING_SYSTEM_TEMPLATE};
use crate::writing::template::fill_template;

const SCORING_TEMPERATURE: f32 = 0.0;
const SCORING_MAX_TOKENS: u32 = 300;

const DEFAULT_OVERALL: f64 = 80.0;
const DEFAULT_CLARITY: f64 = 0.8;
const DEFAULT_ACCURACY: f64 = 0.75;
const DEFAULT_TONE: f64 = 0.82;
const DEFAULT_STRUCTURE: f64 = 0.8;

/// Rubric score for one output. `overall` is 0–100, the dimensions 0–1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub overall: f64,
    pub clarity: f64,
    pub accuracy: f64,
    pub tone: f64,
    pub structure: f64,
}

impl Default for ScoreRecord {
    fn default() -> Self {
        Self {
            overall: DEFAULT_OVERALL,
            clarity: DEFAULT_CLARITY,
            accuracy: DEFAULT_ACCURACY,
            tone: DEFAULT_TONE,
            structure: DEFAULT_STRUCTURE,
        }
    }
}

/// The per-dimension part of a score, as returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreMetrics {
    pub clarity: f64,
    pub accuracy: f64,
    pub tone: f64,
    pub structure: f64,
}

impl ScoreRecord {
    pub fn metrics(&self) -> ScoreMetrics {
        ScoreMetrics {
            clarity: self.clarity,
            accuracy: self.accuracy,
            tone: self.tone,
            structure: self.structure,
        }
    }
}

/// What the scored text was written for.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext<'a> {
    pub scenario: &'a str,
    pub output_type: &'a str,
}

/// Carried in `AppState` as `Arc<dyn OutputScorer>`.
#[async_trait]
pub trait OutputScorer: Send + Sync {
    async fn score(&self, text: &str, context: &ScoreContext<'_>) -> ScoreRecord;

    /// "llm" | "fixed" — logged at startup.
    fn backend(&self) -> &'static str;
}

/// Returns the default record without calling anything.
pub struct FixedScorer;

#[async_trait]
impl OutputScorer for FixedScorer {
    async fn score(&self, _text: &str, _context: &ScoreContext<'_>) -> ScoreRecord {
        ScoreRecord::default()
    }

    fn backend(&self) -> &'static str {
        "fixed"
    }
}

/// Sends the text to the completion service with the rubric prompt.
pub struct LlmRubricScorer {
    llm: Arc<dyn ChatCompletion>,
    model: String,
}

impl LlmRubricScorer {
    pub fn new(llm: Arc<dyn ChatCompletion>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    fn request(&self, text: &str, context: &ScoreContext<'_>) -> CompletionRequest {
        let system = fill_template(SCORING_SYSTEM_TEMPLATE, &[("jsonOnly", JSON_ONLY_INSTRUCTION)]);
        let user = fill_template(
            SCORING_PROMPT_TEMPLATE,
            &[
                ("scenario", context.scenario),
                ("outputType", context.output_type),
                ("outputText", text),
            ],
        );
        CompletionRequest {
            model: self.model.clone(),
            temperature: SCORING_TEMPERATURE,
            max_tokens: SCORING_MAX_TOKENS,
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        }
    }
}

#[async_trait]
impl OutputScorer for LlmRubricScorer {
    async fn score(&self, text: &str, context: &ScoreContext<'_>) -> ScoreRecord {
        let raw = match self.llm.complete(&self.request(text, context)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Scoring call failed, using default score: {e}");
                return ScoreRecord::default();
            }
        };

        match parse_score_record(&raw) {
            Ok(record) => {
                debug!("Scored {} output: overall={}", context.output_type, record.overall);
                record
            }
            Err(e) => {
                warn!("Scoring response was not JSON, using default score: {e}");
                ScoreRecord::default()
            }
        }
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

/// Parses a rubric response. Tries the raw text first, then with code fences
/// stripped. Missing or non-numeric fields take their defaults; values are
/// clamped into range.
pub fn parse_score_record(raw: &str) -> Result<ScoreRecord, serde_json::Error> {
    let raw = raw.trim();
    let raw = if raw.is_empty() { "{}" } else { raw };

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(&strip_json_fences(raw))?,
    };

    let field = |key: &str, default: f64, max: f64| {
        value
            .get(key)
            .and_then(Value::as_f64)
            .map(|v| v.clamp(0.0, max))
            .unwrap_or(default)
    };

    Ok(ScoreRecord {
        overall: field("overall", DEFAULT_OVERALL, 100.0),
        clarity: field("clarity", DEFAULT_CLARITY, 1.0),
        accuracy: field("accuracy", DEFAULT_ACCURACY, 1.0),
        tone: field("tone", DEFAULT_TONE, 1.0),
        structure: field("structure", DEFAULT_STRUCTURE, 1.0),
    })
}
