//! Structural validation of extension definitions.
//!
//! The validator walks a generic YAML tree and collects every problem it can
//! find instead of stopping at the first one. A definition with any error is
//! rejected as a whole; only a clean tree is turned into an [`Extension`].

use crate::model::{
    Extension, InputSpec, InputType, IoSpec, ItemAction, Label, Menu, MenuItem, Program,
    PromptSpec, compare_input_ids,
};
use serde_yaml::Value;
use std::fmt::Display;

/// Validates a parsed extension definition.
///
/// Every message is prefixed with `source` (usually the file path) and
/// qualified with the path of the offending node, e.g.
/// `demo.yml: program.menu.items[2].help is required`.
pub fn validate(tree: &Value, source: &str) -> Vec<String> {
    let mut validator = Validator {
        source,
        errors: Vec::new(),
    };
    validator.extension(tree);
    validator.errors
}

/// Validates `tree` and, if it is clean, builds the typed extension from it.
pub fn admit(tree: &Value, source: &str) -> Result<Extension, Vec<String>> {
    let errors = validate(tree, source);
    if errors.is_empty() {
        Ok(build_extension(tree))
    } else {
        Err(errors)
    }
}

struct Validator<'a> {
    source: &'a str,
    errors: Vec<String>,
}

impl Validator<'_> {
    fn error(&mut self, msg: impl Display) {
        self.errors.push(format!("{}: {}", self.source, msg));
    }

    /// Checks an optional scalar field; returns its text when present and well-formed.
    fn optional_text(&mut self, node: &Value, key: &str, path: &str) -> Option<String> {
        let value = field(node, key)?;
        let text = scalar_text(value);
        if text.is_none() {
            self.error(format!("{path}.{key} must be a string"));
        }
        text
    }

    /// Like [`Self::optional_text`] but reports a missing field.
    fn required_text(&mut self, node: &Value, key: &str, path: &str) -> Option<String> {
        if field(node, key).is_none() {
            self.error(format!("{path}.{key} is required"));
            return None;
        }
        self.optional_text(node, key, path)
    }

    fn extension(&mut self, tree: &Value) {
        if !tree.is_mapping() {
            self.error("extension must be a mapping");
            return;
        }
        for key in ["name", "description", "program"] {
            if field(tree, key).is_none() {
                self.error(format!("'{key}' is required"));
            }
        }
        if let Some(name) = field(tree, "name") {
            if scalar_text(name).is_none_or(|n| n.trim().is_empty()) {
                self.error("'name' must be a non-empty string");
            }
        }
        for key in ["description", "help", "about"] {
            if field(tree, key).is_some_and(|v| scalar_text(v).is_none()) {
                self.error(format!("'{key}' must be a string"));
            }
        }

        let Some(program) = field(tree, "program") else {
            return;
        };
        if !program.is_mapping() {
            self.error("'program' must be a mapping");
            return;
        }
        self.optional_text(program, "start_msg", "program");
        match field(program, "menu") {
            Some(menu) => self.menu(menu, "program.menu"),
            None => self.error("'program.menu' is required"),
        }
    }

    fn menu(&mut self, menu: &Value, path: &str) {
        if !menu.is_mapping() {
            self.error(format!("{path} must be a mapping"));
            return;
        }
        self.required_text(menu, "prompt", path);
        self.optional_text(menu, "help", path);
        self.optional_text(menu, "about", path);

        let Some(items) = field(menu, "items").and_then(Value::as_sequence) else {
            self.error(format!("{path}.items is required and must be a list"));
            return;
        };
        for (i, item) in items.iter().enumerate() {
            self.item(item, &format!("{path}.items[{i}]"));
        }
    }

    fn item(&mut self, item: &Value, path: &str) {
        if !item.is_mapping() {
            self.error(format!("{path} must be a mapping"));
            return;
        }
        match field(item, "id") {
            None => self.error(format!("{path}.id is required")),
            Some(id) if id.as_i64().is_none() => {
                self.error(format!("{path}.id must be an integer"))
            }
            Some(_) => {}
        }
        let text = self.required_text(item, "text", path).map(|t| Label::parse(&t));
        if text.as_ref().is_some_and(|t| t.raw.trim().is_empty()) {
            self.error(format!("{path}.text must not be empty"));
        }
        self.required_text(item, "help", path);
        self.optional_text(item, "about", path);
        let key = self.optional_text(item, "key", path).map(|k| Label::parse(&k));

        if let Some(key) = key.as_ref().filter(|k| k.is_reserved_key()) {
            self.error(format!("{path}.key '{}' is reserved", key.raw));
        }
        if let Some(text) = text.as_ref().filter(|t| t.is_reserved_text()) {
            self.error(format!("{path}.text '{}' is reserved", text.raw));
        }

        let io = field(item, "io");
        let submenu = field(item, "menu");

        let inline_param = key
            .as_ref()
            .and_then(|k| k.marker.clone())
            .or_else(|| text.as_ref().and_then(|t| t.marker.clone()));
        if let Some(param) = inline_param {
            if submenu.is_some() {
                self.error(format!(
                    "{path} inline parameter '{param}' is only valid with 'io', not 'menu'"
                ));
            }
            if let Some(io) = io {
                let inputs = loose_inputs(io);
                if inputs.len() != 1 {
                    self.error(format!(
                        "{path} inline parameter requires exactly 1 input, found {}",
                        inputs.len()
                    ));
                } else {
                    let name = field(inputs[0], "name")
                        .and_then(scalar_text)
                        .unwrap_or_default();
                    if name != param {
                        self.error(format!(
                            "{path} inline parameter '{param}' does not match input name '{name}'"
                        ));
                    }
                }
            }
        }

        if io.is_some() == submenu.is_some() {
            self.error(format!("{path} must have exactly one of 'io' or 'menu'"));
        }
        if let Some(io) = io {
            self.io(io, path);
        }
        if let Some(submenu) = submenu {
            self.menu(submenu, &format!("{path}.menu"));
        }
    }

    fn io(&mut self, io: &Value, item_path: &str) {
        let path = format!("{item_path}.io");
        let io = match io {
            Value::Sequence(seq) => match seq.first() {
                Some(first) => first,
                None => {
                    self.error(format!("{path} must not be empty"));
                    return;
                }
            },
            other => other,
        };
        if !io.is_mapping() {
            self.error(format!("{path} must be a mapping"));
            return;
        }
        self.required_text(io, "command", &path);
        self.optional_text(io, "help", &path);

        match field(io, "prompts") {
            None => {}
            Some(Value::Sequence(prompts)) => {
                for (j, prompt) in prompts.iter().enumerate() {
                    self.prompt(prompt, &format!("{path}.prompts[{j}]"));
                }
            }
            Some(_) => self.error(format!("{path}.prompts must be a list")),
        }
    }

    fn prompt(&mut self, prompt: &Value, path: &str) {
        if !prompt.is_mapping() {
            self.error(format!("{path} must be a mapping"));
            return;
        }
        self.required_text(prompt, "prompt", path);
        if field(prompt, "id").is_some_and(|id| id.as_f64().is_none()) {
            self.error(format!("{path}.id must be a number"));
        }

        match field(prompt, "inputs") {
            None => {}
            Some(Value::Sequence(inputs)) => {
                for (k, input) in inputs.iter().enumerate() {
                    self.input(input, &format!("{path}.inputs[{k}]"));
                }
            }
            Some(_) => self.error(format!("{path}.inputs must be a list")),
        }
    }

    fn input(&mut self, input: &Value, path: &str) {
        if !input.is_mapping() {
            self.error(format!("{path} must be a mapping"));
            return;
        }
        self.required_text(input, "id", path);
        self.required_text(input, "type", path);
        self.optional_text(input, "name", path);
        if field(input, "required").is_some_and(|r| r.as_bool().is_none()) {
            self.error(format!("{path}.required must be true or false"));
        }
    }
}

/// Looks up a mapping field, treating an explicit `null` as absent.
fn field<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    node.get(key).filter(|v| !v.is_null())
}

/// Text of a scalar node. Numbers and booleans are accepted in their YAML spelling.
fn scalar_text(node: &Value) -> Option<String> {
    match node {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_of(node: &Value, key: &str) -> Option<String> {
    field(node, key).and_then(scalar_text)
}

/// `io` may be written as a one-element list; both forms mean the same spec.
fn single_io(io: &Value) -> Option<&Value> {
    match io {
        Value::Sequence(seq) => seq.first(),
        other => Some(other),
    }
}

/// Every input node under an `io`, tolerating malformed shapes.
fn loose_inputs(io: &Value) -> Vec<&Value> {
    let Some(prompts) = single_io(io)
        .and_then(|io| field(io, "prompts"))
        .and_then(Value::as_sequence)
    else {
        return Vec::new();
    };
    prompts
        .iter()
        .filter_map(|p| field(p, "inputs").and_then(Value::as_sequence))
        .flatten()
        .collect()
}

fn build_extension(tree: &Value) -> Extension {
    let program = field(tree, "program").unwrap_or(&Value::Null);
    Extension {
        name: text_of(tree, "name").unwrap_or_default(),
        description: text_of(tree, "description").unwrap_or_default(),
        help: text_of(tree, "help"),
        about: text_of(tree, "about"),
        program: Program {
            start_msg: text_of(program, "start_msg"),
            menu: build_menu(field(program, "menu").unwrap_or(&Value::Null)),
        },
    }
}

fn build_menu(menu: &Value) -> Menu {
    let mut items: Vec<MenuItem> = field(menu, "items")
        .and_then(Value::as_sequence)
        .map(|items| items.iter().map(build_item).collect())
        .unwrap_or_default();
    items.sort_by_key(|item| item.id);
    Menu {
        prompt: text_of(menu, "prompt").unwrap_or_default(),
        help: text_of(menu, "help"),
        about: text_of(menu, "about"),
        items,
    }
}

fn build_item(item: &Value) -> MenuItem {
    let action = match field(item, "io").and_then(single_io) {
        Some(io) => ItemAction::Action(build_io(io)),
        None => ItemAction::Submenu(build_menu(field(item, "menu").unwrap_or(&Value::Null))),
    };
    MenuItem {
        id: field(item, "id").and_then(Value::as_i64).unwrap_or_default(),
        text: Label::parse(&text_of(item, "text").unwrap_or_default()),
        help: text_of(item, "help").unwrap_or_default(),
        about: text_of(item, "about"),
        key: text_of(item, "key").map(|k| Label::parse(&k)),
        action,
    }
}

fn build_io(io: &Value) -> IoSpec {
    let mut prompts: Vec<PromptSpec> = field(io, "prompts")
        .and_then(Value::as_sequence)
        .map(|prompts| prompts.iter().map(build_prompt).collect())
        .unwrap_or_default();
    prompts.sort_by(|a, b| a.id.total_cmp(&b.id));
    IoSpec {
        command: text_of(io, "command").unwrap_or_default(),
        help: text_of(io, "help"),
        prompts,
    }
}

fn build_prompt(prompt: &Value) -> PromptSpec {
    let mut inputs: Vec<InputSpec> = field(prompt, "inputs")
        .and_then(Value::as_sequence)
        .map(|inputs| inputs.iter().map(build_input).collect())
        .unwrap_or_default();
    inputs.sort_by(|a, b| compare_input_ids(&a.id, &b.id));
    PromptSpec {
        id: field(prompt, "id").and_then(Value::as_f64).unwrap_or(0.0),
        prompt: text_of(prompt, "prompt").unwrap_or_default(),
        inputs,
    }
}

fn build_input(input: &Value) -> InputSpec {
    InputSpec {
        id: text_of(input, "id").unwrap_or_default(),
        name: text_of(input, "name").filter(|n| !n.is_empty()),
        kind: InputType::parse(&text_of(input, "type").unwrap_or_default()),
        required: field(input, "required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}
