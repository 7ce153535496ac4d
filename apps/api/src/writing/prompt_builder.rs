//! Prompt assembly — turns request fields, guidance tables and the style guide
//! into the system + user message pair sent to the completion service.

use crate::llm_client::prompts::SOURCE_GROUNDING_INSTRUCTION;
use crate::llm_client::ChatMessage;
use crate::writing::prompts::{
    GENERATE_PROMPT_TEMPLATE, LENGTH_INSTRUCTION_TEMPLATE, OUTLINE_GUIDE, OUTLINE_LABEL,
    REWRITE_PROMPT_TEMPLATE,
};
use crate::writing::recipes::{output_type_guide, PromptRecipe, Scenario, NO_GUIDE};
use crate::writing::style_guides::WorkspaceMode;
use crate::writing::template::fill_template;

/// Free-text sources are capped here before they become a source document.
pub const MAX_COMBINED_SOURCE_CHARS: usize = 12_000;
/// Each source document is capped here inside the prompt.
pub const MAX_SOURCE_CHARS: usize = 3_000;

pub const COMBINED_SOURCE_NAME: &str = "Combined sources (uploads + URLs)";
const NO_SOURCES: &str = "(no source material provided)";

/// A named piece of source material (an upload, a fetched URL, pasted text).
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub name: String,
    pub text: String,
}

impl SourceDocument {
    /// Wraps the free-text `text` field, capped at `MAX_COMBINED_SOURCE_CHARS`.
    /// Blank text produces no document.
    pub fn combined(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        Some(Self {
            name: COMBINED_SOURCE_NAME.to_string(),
            text: truncate_chars(text, MAX_COMBINED_SOURCE_CHARS).to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

impl PromptPair {
    pub fn into_messages(self) -> Vec<ChatMessage> {
        vec![ChatMessage::system(self.system), ChatMessage::user(self.user)]
    }
}

#[derive(Debug, Clone)]
pub struct GenerateInput<'a> {
    pub title: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub sources: &'a [SourceDocument],
    /// `None` builds the outline prompt used when no output type was selected.
    pub output_type: Option<&'a str>,
    pub scenario: &'a str,
    pub mode: WorkspaceMode,
    pub public_search: bool,
    pub word_limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RewriteInput<'a> {
    pub text: &'a str,
    pub notes: Option<&'a str>,
    pub output_type: &'a str,
    pub scenario: &'a str,
    pub mode: WorkspaceMode,
    pub word_limit: Option<usize>,
}

pub fn build_generate_prompt(input: &GenerateInput<'_>) -> PromptPair {
    let recipe = PromptRecipe::for_mode(input.mode);

    let (label, guide) = match input.output_type {
        Some(output_type) => (
            recipe.output_label(output_type),
            output_type_guide(output_type).unwrap_or(NO_GUIDE),
        ),
        None => (OUTLINE_LABEL.to_string(), OUTLINE_GUIDE),
    };

    let sources = format_sources(input.sources);
    let length = length_instruction(input.word_limit);

    let user = fill_template(
        GENERATE_PROMPT_TEMPLATE,
        &[
            ("outputTypeLabel", label.as_str()),
            ("scenario", input.scenario),
            ("title", non_blank(input.title).unwrap_or("Untitled")),
            (
                "publicSearch",
                if input.public_search { "ON" } else { "OFF" },
            ),
            ("notes", non_blank(input.notes).unwrap_or("(none)")),
            ("sources", sources.as_str()),
            ("guide", guide),
            (
                "scenarioGuidance",
                Scenario::from_key(input.scenario).instructions(),
            ),
            ("lengthInstruction", length.as_str()),
        ],
    );

    let system = format!(
        "{}\n\n{}\n\nSTYLE GUIDE:\n{}",
        recipe.system_prompt,
        SOURCE_GROUNDING_INSTRUCTION,
        input.mode.style_guide()
    );

    PromptPair { system, user }
}

pub fn build_rewrite_prompt(input: &RewriteInput<'_>) -> PromptPair {
    let recipe = PromptRecipe::for_mode(input.mode);
    let label = recipe.output_label(input.output_type);

    let mut user = fill_template(
        REWRITE_PROMPT_TEMPLATE,
        &[
            ("text", input.text),
            ("notes", non_blank(input.notes).unwrap_or_default()),
            ("scenario", input.scenario),
            ("outputTypeLabel", label.as_str()),
        ],
    );

    user.push_str("\n\nScenario-specific guidance:\n");
    user.push_str(Scenario::from_key(input.scenario).instructions());

    if let Some(guide) = output_type_guide(input.output_type) {
        user.push_str("\n\nGuidelines for this output type:\n");
        user.push_str(guide);
    }

    if input.word_limit.is_some() {
        user.push_str("\n\nLength:");
        user.push_str(&length_instruction(input.word_limit));
    }
    user.push('\n');

    let system = format!(
        "{}\n\nSTYLE GUIDE:\n{}",
        recipe.system_prompt,
        input.mode.style_guide()
    );

    PromptPair { system, user }
}

fn format_sources(sources: &[SourceDocument]) -> String {
    let blocks: Vec<String> = sources
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .map(|s| format!("{}:\n{}", s.name, truncate_chars(&s.text, MAX_SOURCE_CHARS)))
        .collect();

    if blocks.is_empty() {
        NO_SOURCES.to_string()
    } else {
        blocks.join("\n\n")
    }
}

fn length_instruction(word_limit: Option<usize>) -> String {
    match word_limit {
        Some(limit) => {
            let limit = limit.to_string();
            fill_template(LENGTH_INSTRUCTION_TEMPLATE, &[("wordLimit", limit.as_str())])
        }
        None => String::new(),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Returns the prefix of `text` holding at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
