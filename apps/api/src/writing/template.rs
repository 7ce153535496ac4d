//! `{{placeholder}}` substitution for prompt templates.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}").expect("placeholder pattern is valid")
});

/// Replaces every `{{key}}` in `template` with the value bound to `key`.
///
/// Substitution is a single pass over the template: values are inserted
/// verbatim and never re-expanded, so user text containing `{{notes}}` stays
/// literal. Placeholders with no binding are left as they are.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
