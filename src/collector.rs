//! Interactive collection of the values an action's command needs.

use crate::console::Console;
use crate::model::{InputSpec, InputType, IoSpec, PromptSpec};
use crate::words::split_words_lossy;
use crate::NO_HELP;
use anyhow::Result;
use std::collections::BTreeMap;
use std::io::Write;

/// Placeholder key (input id and, if declared, input name) to the value typed for it.
pub type CollectedValues = BTreeMap<String, String>;

/// Verdict on one response to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// One value per declared input, in input order.
    Accepted(Vec<String>),
    /// Messages to show before asking again.
    Rejected(Vec<String>),
}

/// Asks every prompt of `io` in order until each yields an acceptable response.
///
/// Prompts whose inputs are all present in `precollected` are skipped. Returns
/// `None` if input ends before collection is complete.
pub fn collect(
    io: &IoSpec,
    precollected: Option<CollectedValues>,
    console: &mut dyn Console,
) -> Result<Option<CollectedValues>> {
    let mut collected = precollected.unwrap_or_default();

    for prompt in &io.prompts {
        if already_satisfied(prompt, &collected) {
            tracing::debug!(prompt = %prompt.prompt, "prompt satisfied by inline value");
            continue;
        }

        loop {
            let Some(line) = console.read_line(&format!("{}: ", prompt.prompt))? else {
                return Ok(None);
            };
            let line = line.trim();

            if is_help(line) {
                writeln!(console.out(), "{}", io.help.as_deref().unwrap_or(NO_HELP))?;
                continue;
            }
            if prompt.inputs.is_empty() {
                break;
            }

            match check_response(&prompt.inputs, line) {
                Response::Accepted(values) => {
                    record(&mut collected, &prompt.inputs, values);
                    break;
                }
                Response::Rejected(messages) => {
                    for message in messages {
                        writeln!(console.out(), "Error: {message}")?;
                    }
                }
            }
        }
    }

    Ok(Some(collected))
}

/// Checks one response line against a prompt's declared inputs.
pub fn check_response(inputs: &[InputSpec], line: &str) -> Response {
    let values = if line.is_empty() {
        Vec::new()
    } else {
        split_words_lossy(line)
    };

    if values.len() != inputs.len() {
        if !values.is_empty() {
            return Response::Rejected(vec![format!(
                "expected {} input(s), got {}",
                inputs.len(),
                values.len()
            )]);
        }
        if inputs.iter().any(|input| input.required) {
            return Response::Rejected(vec!["input is required".to_string()]);
        }
        return Response::Accepted(vec![String::new(); inputs.len()]);
    }

    let errors: Vec<String> = inputs
        .iter()
        .zip(&values)
        .filter_map(|(input, value)| check_value(input, value))
        .collect();
    if errors.is_empty() {
        Response::Accepted(values)
    } else {
        Response::Rejected(errors)
    }
}

fn check_value(input: &InputSpec, value: &str) -> Option<String> {
    if input.required && value.is_empty() {
        return Some(format!("input {} is required", input.id));
    }
    match input.kind {
        InputType::Int if !is_integer(value) => {
            Some(format!("input {} must be an integer", input.id))
        }
        InputType::Bool if !matches!(value.to_lowercase().as_str(), "true" | "false") => {
            Some(format!("input {} must be true or false", input.id))
        }
        _ => None,
    }
}

/// Base-10 integer of any magnitude: an optional sign followed by digits.
fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn already_satisfied(prompt: &PromptSpec, collected: &CollectedValues) -> bool {
    !prompt.inputs.is_empty()
        && prompt.inputs.iter().all(|input| {
            input.name.as_ref().is_some_and(|n| collected.contains_key(n))
                || collected.contains_key(&input.id)
        })
}

fn record(collected: &mut CollectedValues, inputs: &[InputSpec], values: Vec<String>) {
    for (input, value) in inputs.iter().zip(values) {
        for key in input.keys() {
            collected.insert(key.to_string(), value.clone());
        }
    }
}

fn is_help(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "h" | "help")
}
