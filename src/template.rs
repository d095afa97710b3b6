//! Flat `{name}` substitution into command templates.

use crate::collector::CollectedValues;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]+\}").expect("placeholder pattern is valid"));

/// The rendered command still contains placeholders nothing supplied a value for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    pub unresolved: Vec<String>,
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown placeholder(s) in command: {}",
            self.unresolved.join(", ")
        )
    }
}

impl std::error::Error for TemplateError {}

/// Replaces every `{key}` in `template` with its value, verbatim.
///
/// Values are not quoted or escaped; quoting belongs in the template.
pub fn render(template: &str, values: &CollectedValues) -> Result<String, TemplateError> {
    let mut command = template.to_string();
    for (key, value) in values {
        command = command.replace(&format!("{{{key}}}"), value);
    }

    let unresolved: Vec<String> = PLACEHOLDER
        .find_iter(&command)
        .map(|m| m.as_str().to_string())
        .collect();
    if unresolved.is_empty() {
        Ok(command)
    } else {
        Err(TemplateError { unresolved })
    }
}
