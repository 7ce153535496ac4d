// Investment writing: prompt assembly, completion, post-processing and scoring.
// All completion calls go through llm_client — no direct HTTP calls here.

pub mod handlers;
pub mod post_process;
pub mod prompt_builder;
pub mod prompts;
pub mod recipes;
pub mod scoring;
pub mod style_guides;
pub mod template;
