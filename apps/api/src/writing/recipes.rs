//! Static guidance tables: scenario instructions, output-type guides and the
//! per-workspace prompt recipe (system prompt + output-type labels).

use crate::writing::style_guides::WorkspaceMode;

/// Shown in place of a guide when the output type is not in the table.
pub const NO_GUIDE: &str = "(no guide)";

pub const BASE_SYSTEM_PROMPT: &str = "\
You are an expert investment writer producing institutional-grade content.
Follow the provided style guide exactly.
Use a clear, structured format and avoid marketing fluff.";

/// The situation a piece of writing covers. Drives extra guidance in the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scenario {
    NewInvestment,
    ExitRealisation,
    PortfolioUpdate,
    #[default]
    Default,
}

impl Scenario {
    /// Unknown keys resolve to `Default`.
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "new_investment" => Scenario::NewInvestment,
            "exit_realisation" => Scenario::ExitRealisation,
            "portfolio_update" => Scenario::PortfolioUpdate,
            _ => Scenario::Default,
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            Scenario::NewInvestment => "\
- Emphasise what was acquired or invested in, who the counterparties are, and the strategic rationale.
- Include, where appropriate, the strategy, sector, and how this fits into the firm's investment themes.
- If size or financial terms are not disclosed, avoid inventing them; use neutral language like \"undisclosed terms\".",
            Scenario::ExitRealisation => "\
- Emphasise what asset or company is being exited, who the buyer is (if known), and how long the asset was held.
- Focus on value creation, key achievements, and high-level performance, without disclosing confidential numbers unless provided.
- Highlight continuity for management teams and clients where relevant.",
            Scenario::PortfolioUpdate => "\
- Focus on operational progress, milestones, and key developments for existing portfolio companies or assets.
- Group related developments logically (by theme, sector, or geography) to make the update easy to scan.
- Keep the tone balanced: transparent about challenges, clear on positive progress.",
            Scenario::Default => "\
- Provide balanced, factual context for the situation.
- Emphasise what is most relevant for an institutional investor trying to understand \"what happened\" and \"why it matters\".",
        }
    }
}

/// Audience / tone / content guide for an output type key.
///
/// Accepts both the short keys (`investor`, `detailed`, `press`, `linkedin`)
/// and the recipe keys (`press_release`, `investment_note`, `linkedin_post`).
pub fn output_type_guide(key: &str) -> Option<&'static str> {
    let guide = match key.trim() {
        "investor" | "investment_note" => "\
Audience: existing investors (LPs). Tone: concise, factual, professional. Avoid hype.
Include: period performance, drivers, material changes, portfolio actions, risk/mitigants, cautious outlook.",
        "detailed" => "\
Audience: existing investors and internal stakeholders. Tone: thorough, neutral, compliance-safe.
Include: context, factual analysis, key metrics, caveats, assumptions.",
        "press" | "press_release" => "\
Audience: media & public. Tone: clear, objective, third-person. Avoid forward-looking promises.
Include: headline, dateline, who/what/when/where/why, quotes, boilerplate.",
        "linkedin" | "linkedin_post" => "\
Audience: professional network. Tone: crisp, accessible, compliance-aware.
Include: short hook, impact bullets, link, hashtags.",
        _ => return None,
    };
    Some(guide)
}

/// The prompt pack for one workspace mode.
#[derive(Debug, Clone, Copy)]
pub struct PromptRecipe {
    pub mode: WorkspaceMode,
    pub system_prompt: &'static str,
}

impl PromptRecipe {
    pub fn for_mode(mode: WorkspaceMode) -> Self {
        Self {
            mode,
            system_prompt: BASE_SYSTEM_PROMPT,
        }
    }

    /// Human-readable name of the deliverable, e.g. "client-branded LinkedIn post".
    pub fn output_label(&self, output_type: &str) -> String {
        let base = match output_type.trim() {
            "press_release" | "press" => "press release".to_string(),
            "investment_note" | "investor" => "investment note".to_string(),
            "linkedin_post" | "linkedin" => "LinkedIn post".to_string(),
            "detailed" => "detailed investor update".to_string(),
            other => other.replace('_', " "),
        };
        match self.mode {
            WorkspaceMode::Generic => base,
            WorkspaceMode::Client => format!("client-branded {base}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_scenario_is_default() {
        assert_eq!(Scenario::from_key("merger"), Scenario::Default);
        assert_eq!(Scenario::from_key("exit_realisation"), Scenario::ExitRealisation);
    }

    #[test]
    fn test_scenario_instructions_are_bullets() {
        for scenario in [
            Scenario::NewInvestment,
            Scenario::ExitRealisation,
            Scenario::PortfolioUpdate,
            Scenario::Default,
        ] {
            assert!(scenario.instructions().starts_with("- "));
        }
        assert!(Scenario::NewInvestment
            .instructions()
            .contains("undisclosed terms"));
    }

    #[test]
    fn test_output_guide_aliases_match() {
        assert_eq!(output_type_guide("press"), output_type_guide("press_release"));
        assert_eq!(output_type_guide("linkedin"), output_type_guide("linkedin_post"));
        assert_eq!(output_type_guide("investor"), output_type_guide("investment_note"));
        assert!(output_type_guide("detailed").is_some());
        assert!(output_type_guide("podcast").is_none());
    }

    #[test]
    fn test_labels_per_mode() {
        let generic = PromptRecipe::for_mode(WorkspaceMode::Generic);
        let client = PromptRecipe::for_mode(WorkspaceMode::Client);
        assert_eq!(generic.output_label("linkedin_post"), "LinkedIn post");
        assert_eq!(client.output_label("press_release"), "client-branded press release");
        assert_eq!(generic.output_label("quarterly_letter_draft"), "quarterly letter draft");
    }
}
