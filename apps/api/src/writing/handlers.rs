//! Axum route handlers for the writing API.

use std::time::Instant;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::{ApiJson, AppError};
use crate::llm_client::{normalize_model_id, ChatMessage, CompletionRequest};
use crate::state::AppState;
use crate::writing::post_process::{post_process, PostProcessOptions, WordLimitMode};
use crate::writing::prompt_builder::{
    build_generate_prompt, build_rewrite_prompt, GenerateInput, RewriteInput, SourceDocument,
};
use crate::writing::scoring::{ScoreContext, ScoreMetrics};
use crate::writing::style_guides::WorkspaceMode;

const DEFAULT_SCENARIO: &str = "default";
const DEFAULT_TEMPERATURE: f32 = 0.3;
const GENERATE_MAX_TOKENS: u32 = 1200;
const REWRITE_MAX_TOKENS: u32 = 2048;
const MAX_TOKENS_CEILING: u32 = 16_384;
const MAX_OUTPUT_TYPES: usize = 8;

/// Output type key reported when no output type was selected.
pub const OUTLINE_OUTPUT_TYPE: &str = "outline";
/// Returned in place of text when the model answers with nothing.
pub const NO_CONTENT: &str = "[No content returned]";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceUrl {
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Sources {
    pub files: Vec<SourceFile>,
    pub urls: Vec<SourceUrl>,
}

/// Post-processing and scoring switches shared by generate and rewrite.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputOptions {
    pub word_limit: Option<usize>,
    pub word_limit_mode: Option<String>,
    pub normalize_currency: Option<bool>,
    pub score: Option<bool>,
}

/// Model parameters shared by generate and rewrite.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelOptions {
    pub model_id: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateRequest {
    pub title: Option<String>,
    pub notes: Option<String>,
    /// Free text combined by the frontend from uploads and fetched URLs.
    pub text: Option<String>,
    pub sources: Option<Sources>,
    pub output_types: Option<Vec<String>>,
    /// Older frontends send `selectedTypes`; used when `outputTypes` is empty.
    pub selected_types: Option<Vec<String>>,
    pub scenario: Option<String>,
    pub workspace_mode: Option<String>,
    pub public_search: Option<bool>,
    #[serde(flatten)]
    pub model: ModelOptions,
    #[serde(flatten)]
    pub options: OutputOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewriteRequest {
    /// The draft to improve.
    pub text: Option<String>,
    /// Rewrite instructions.
    pub notes: Option<String>,
    pub output_type: Option<String>,
    pub scenario: Option<String>,
    pub workspace_mode: Option<String>,
    #[serde(flatten)]
    pub model: ModelOptions,
    #[serde(flatten)]
    pub options: OutputOptions,
}

/// One generated (or rewritten) piece of writing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub output_type: String,
    pub text: String,
    pub word_count: usize,
    pub trimmed: bool,
    pub score: Option<f64>,
    pub metrics: Option<ScoreMetrics>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub outputs: Vec<OutputRecord>,
    /// All outputs joined into one text.
    pub output: String,
    pub workspace_mode: WorkspaceMode,
    pub scenario: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteResponse {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub outputs: Vec<OutputRecord>,
    pub workspace_mode: WorkspaceMode,
    pub scenario: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate
///
/// One completion per requested output type (or a single outline when none
/// is selected), each post-processed and scored.
pub async fn handle_generate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let started = Instant::now();

    let sources = collect_sources(&request);
    if is_blank(request.title.as_deref()) && is_blank(request.notes.as_deref()) && sources.is_empty()
    {
        return Err(AppError::Validation(
            "Nothing to write about: provide a title, notes, or source text".to_string(),
        ));
    }

    let output_types = resolve_output_types(&request)?;
    let model = resolve_model(&state, &request.model, GENERATE_MAX_TOKENS)?;
    let options = resolve_options(&request.options)?;
    let scenario = scenario_or_default(request.scenario.as_deref());
    let mode = WorkspaceMode::from_key(request.workspace_mode.as_deref().unwrap_or_default());

    info!(
        "Generate {request_id}: types={:?}, scenario={scenario}, mode={mode:?}, model={}",
        output_types, model.model
    );

    let targets: Vec<Option<&str>> = if output_types.is_empty() {
        vec![None]
    } else {
        output_types.iter().map(|t| Some(t.as_str())).collect()
    };

    let mut outputs = Vec::with_capacity(targets.len());
    for output_type in targets {
        let prompt = build_generate_prompt(&GenerateInput {
            title: request.title.as_deref(),
            notes: request.notes.as_deref(),
            sources: &sources,
            output_type,
            scenario: &scenario,
            mode,
            public_search: request.public_search.unwrap_or(false),
            word_limit: options.post.word_limit.map(|(limit, _)| limit),
        });

        let record = produce_output(
            &state,
            &model,
            prompt.into_messages(),
            output_type.unwrap_or(OUTLINE_OUTPUT_TYPE),
            &scenario,
            &options,
        )
        .await?;
        outputs.push(record);
    }

    info!(
        "Generate {request_id}: {} output(s) in {}ms",
        outputs.len(),
        started.elapsed().as_millis()
    );

    Ok(Json(GenerateResponse {
        request_id,
        generated_at: Utc::now(),
        output: join_outputs(&outputs),
        outputs,
        workspace_mode: mode,
        scenario,
    }))
}

/// POST /api/rewrite
///
/// Improves an existing draft for one output type.
pub async fn handle_rewrite(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RewriteRequest>,
) -> Result<Json<RewriteResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let started = Instant::now();

    let text = request
        .text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing draft text to rewrite".to_string()))?;
    let output_type = request
        .output_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Missing outputType".to_string()))?;

    let model = resolve_model(&state, &request.model, REWRITE_MAX_TOKENS)?;
    let options = resolve_options(&request.options)?;
    let scenario = scenario_or_default(request.scenario.as_deref());
    let mode = WorkspaceMode::from_key(request.workspace_mode.as_deref().unwrap_or_default());

    info!(
        "Rewrite {request_id}: type={output_type}, scenario={scenario}, mode={mode:?}, model={}",
        model.model
    );

    let prompt = build_rewrite_prompt(&RewriteInput {
        text,
        notes: request.notes.as_deref(),
        output_type,
        scenario: &scenario,
        mode,
        word_limit: options.post.word_limit.map(|(limit, _)| limit),
    });

    let record = produce_output(
        &state,
        &model,
        prompt.into_messages(),
        output_type,
        &scenario,
        &options,
    )
    .await?;

    info!(
        "Rewrite {request_id}: done in {}ms",
        started.elapsed().as_millis()
    );

    Ok(Json(RewriteResponse {
        request_id,
        generated_at: Utc::now(),
        outputs: vec![record],
        workspace_mode: mode,
        scenario,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline: completion → post-processing → scoring
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct ModelParams {
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Copy)]
struct ResolvedOptions {
    post: PostProcessOptions,
    score: bool,
}

async fn produce_output(
    state: &AppState,
    model: &ModelParams,
    messages: Vec<ChatMessage>,
    output_type: &str,
    scenario: &str,
    options: &ResolvedOptions,
) -> Result<OutputRecord, AppError> {
    let request = CompletionRequest {
        model: model.model.clone(),
        temperature: model.temperature,
        max_tokens: model.max_tokens,
        messages,
    };

    let raw = state.llm.complete(&request).await?;

    if raw.trim().is_empty() {
        return Ok(OutputRecord {
            output_type: output_type.to_string(),
            text: NO_CONTENT.to_string(),
            word_count: 0,
            trimmed: false,
            score: None,
            metrics: None,
        });
    }

    let processed = post_process(&raw, &options.post);

    let score = if options.score {
        let context = ScoreContext {
            scenario,
            output_type,
        };
        Some(state.scorer.score(&processed.text, &context).await)
    } else {
        None
    };

    Ok(OutputRecord {
        output_type: output_type.to_string(),
        text: processed.text,
        word_count: processed.word_count,
        trimmed: processed.trimmed,
        score: score.map(|s| s.overall),
        metrics: score.map(|s| s.metrics()),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Request resolution and validation
// ────────────────────────────────────────────────────────────────────────────

fn resolve_model(
    state: &AppState,
    options: &ModelOptions,
    default_max_tokens: u32,
) -> Result<ModelParams, AppError> {
    let temperature = options.temperature.unwrap_or(DEFAULT_TEMPERATURE);
    if !(0.0..=2.0).contains(&temperature) {
        return Err(AppError::Validation(format!(
            "temperature must be between 0 and 2, got {temperature}"
        )));
    }

    let max_tokens = options.max_tokens.unwrap_or(default_max_tokens);
    if max_tokens == 0 || max_tokens > MAX_TOKENS_CEILING {
        return Err(AppError::Validation(format!(
            "maxTokens must be between 1 and {MAX_TOKENS_CEILING}, got {max_tokens}"
        )));
    }

    Ok(ModelParams {
        model: normalize_model_id(options.model_id.as_deref(), &state.config.default_model),
        temperature,
        max_tokens,
    })
}

fn resolve_options(options: &OutputOptions) -> Result<ResolvedOptions, AppError> {
    let mode = match options.word_limit_mode.as_deref() {
        None => WordLimitMode::default(),
        Some(key) => WordLimitMode::from_key(key).ok_or_else(|| {
            AppError::Validation(format!(
                "wordLimitMode must be \"soft\" or \"hard\", got \"{key}\""
            ))
        })?,
    };

    let word_limit = match options.word_limit {
        Some(0) => {
            return Err(AppError::Validation(
                "wordLimit must be greater than 0".to_string(),
            ))
        }
        Some(limit) => Some((limit, mode)),
        None => None,
    };

    Ok(ResolvedOptions {
        post: PostProcessOptions {
            normalize_currency: options.normalize_currency.unwrap_or(true),
            word_limit,
        },
        score: options.score.unwrap_or(true),
    })
}

/// `outputTypes` wins when it has entries, otherwise `selectedTypes`.
/// Blank and repeated keys are dropped.
fn resolve_output_types(request: &GenerateRequest) -> Result<Vec<String>, AppError> {
    let chosen = match request.output_types.as_deref() {
        Some(types) if !types.is_empty() => types,
        _ => request.selected_types.as_deref().unwrap_or_default(),
    };

    let mut resolved: Vec<String> = Vec::new();
    for key in chosen.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !resolved.iter().any(|r| r == key) {
            resolved.push(key.to_string());
        }
    }

    if resolved.len() > MAX_OUTPUT_TYPES {
        return Err(AppError::Validation(format!(
            "At most {MAX_OUTPUT_TYPES} output types per request, got {}",
            resolved.len()
        )));
    }
    Ok(resolved)
}

fn collect_sources(request: &GenerateRequest) -> Vec<SourceDocument> {
    let mut sources: Vec<SourceDocument> = request
        .text
        .as_deref()
        .and_then(SourceDocument::combined)
        .into_iter()
        .collect();

    if let Some(extra) = &request.sources {
        sources.extend(extra.files.iter().map(|f| SourceDocument {
            name: f.name.clone(),
            text: f.text.clone(),
        }));
        sources.extend(extra.urls.iter().map(|u| SourceDocument {
            name: u.url.clone(),
            text: u.text.clone(),
        }));
    }

    sources.retain(|s| !s.text.trim().is_empty());
    sources
}

fn scenario_or_default(scenario: Option<&str>) -> String {
    scenario
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SCENARIO)
        .to_string()
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn join_outputs(outputs: &[OutputRecord]) -> String {
    match outputs {
        [single] => single.text.clone(),
        _ => outputs
            .iter()
            .map(|o| format!("### {}\n{}", o.output_type, o.text))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
