// All LLM prompt templates for the writing module.
// Placeholders use `{{name}}` and are filled by `template::fill_template`.

/// Generation prompt, one per requested output type.
/// Fill: outputTypeLabel, scenario, title, publicSearch, notes, sources,
///       guide, scenarioGuidance, lengthInstruction
pub const GENERATE_PROMPT_TEMPLATE: &str = r#"Write a {{outputTypeLabel}} for the scenario "{{scenario}}".

Title:
{{title}}

Public Domain Search: {{publicSearch}}

Notes from the user (constraints, must-include points):
{{notes}}

Source material to base your writing on:
{{sources}}

Guidelines for this output type:
{{guide}}

Scenario-specific guidance:
{{scenarioGuidance}}

Instructions:
- Follow the style guide carefully.
- Do not invent facts; rely on the source material.
- If no source material is present, state that clearly.
- Use clear structure, headings, and short paragraphs.{{lengthInstruction}}

Draft (from sources):"#;

/// Used as the guide when no output types were selected.
pub const OUTLINE_GUIDE: &str =
    "No output types selected: outline the key facts from the sources as short bullet points.";

pub const OUTLINE_LABEL: &str = "outline of the key facts";

/// Rewrite prompt. Fill: outputTypeLabel, scenario, notes, text
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"You are to improve and refine an existing draft of a {{outputTypeLabel}}.

Scenario: {{scenario}}

Rewrite Requirements:
- Maintain the intent and meaning of the draft.
- Improve clarity, structure, and tone.
- Follow the style guide exactly.
- Respect all user rewrite notes:
  "{{notes}}"

Here is the draft to rewrite:
===================
{{text}}
===================

Produce a refined, professional version of the draft."#;

/// Length instruction appended when a word limit is requested. Fill: wordLimit
pub const LENGTH_INSTRUCTION_TEMPLATE: &str =
    "\n- Keep the piece under {{wordLimit}} words; end on a complete sentence.";

pub const SCORING_SYSTEM_TEMPLATE: &str = r#"You are a strict but fair evaluator of investment-related written content.

{{jsonOnly}}

Use this JSON schema:

{
  "overall": number between 0 and 100,
  "clarity": number between 0 and 1,
  "accuracy": number between 0 and 1,
  "tone": number between 0 and 1,
  "structure": number between 0 and 1
}

Definitions:
- overall: holistic score combining the other dimensions.
- clarity: how clear and easy to follow the writing is.
- accuracy: how well it stays faithful to the apparent facts and avoids exaggeration.
- tone: how professional, appropriate, and aligned with institutional style it feels.
- structure: how well-organised the content is (headings, flow, logical order)."#;

/// Fill: scenario, outputType, outputText
pub const SCORING_PROMPT_TEMPLATE: &str = r#"You are scoring a piece of content generated for the following context:

- Scenario: {{scenario}}
- Output type: {{outputType}}

Here is the content to score:
--------------------
{{outputText}}
--------------------

Return ONLY a JSON object following the schema, with no extra text."#;
