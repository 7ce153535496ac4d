//! House style guides, selected per workspace mode.

use serde::Serialize;

pub const BASE_STYLE_GUIDE: &str = "\
Tone: professional, concise, investment-oriented.
Avoid hype; prefer clear, evidence-based statements.
Write for institutional investors with a focus on clarity and accuracy.
Use globally understandable English and avoid local idioms.";

pub const DEFAULT_STYLE_GUIDE: &str = BASE_STYLE_GUIDE;

pub const SAMPLE_CLIENT_STYLE_GUIDE: &str = "\
Tone: professional, concise, investment-oriented.
Avoid hype; prefer clear, evidence-based statements.
Write for institutional investors with a focus on clarity and accuracy.
Use globally understandable English and avoid local idioms.

Client house rules:
- Refer to the client as \"the Firm\" after the first full mention.
- Use British spelling (realisation, organisation, programme).
- Write monetary amounts with ISO currency codes, e.g. \"USD 25m\", \"EUR 1.2bn\".
- Headlines in sentence case; no exclamation marks.
- Attribute quotes to named individuals with their full title.";

/// Which prompt pack and style guide a request writes against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceMode {
    #[default]
    Generic,
    Client,
}

impl WorkspaceMode {
    /// Unknown keys fall back to the generic pack.
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "client" => WorkspaceMode::Client,
            _ => WorkspaceMode::Generic,
        }
    }

    pub fn style_guide(self) -> &'static str {
        match self {
            WorkspaceMode::Generic => DEFAULT_STYLE_GUIDE,
            WorkspaceMode::Client => SAMPLE_CLIENT_STYLE_GUIDE,
        }
    }
}
