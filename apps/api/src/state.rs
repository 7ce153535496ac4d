use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ChatCompletion;
use crate::writing::scoring::OutputScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn ChatCompletion>,
    /// Pluggable scorer. Default: LlmRubricScorer. `FixedScorer` when ENABLE_SCORING=false.
    pub scorer: Arc<dyn OutputScorer>,
    pub config: Config,
}
