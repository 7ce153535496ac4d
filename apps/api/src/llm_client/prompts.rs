// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "You must respond ONLY with valid JSON and nothing else. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every generation system prompt.
pub const SOURCE_GROUNDING_INSTRUCTION: &str = "You are a factual, compliance-safe assistant. \
    You MUST base your writing on the provided sources. \
    If no sources are present, state that clearly.";
