//! Typed form of an extension definition.
//!
//! These types are only ever built by [`crate::schema::admit`] from a tree that
//! passed validation, so they carry no "maybe missing" fields for things the
//! validator requires.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Item keys that always mean a built-in verb.
pub const RESERVED_KEYS: [&str; 4] = ["a", "b", "h", "x"];
/// Item texts that always mean a built-in verb.
pub const RESERVED_TEXTS: [&str; 4] = ["about", "back", "help", "exit"];

static INLINE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*\S)\s+\{(\w+)\}$").expect("inline marker pattern is valid")
});

/// A self-contained menu-driven mini-program loaded from one definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub name: String,
    pub description: String,
    pub help: Option<String>,
    pub about: Option<String>,
    pub program: Program,
}

impl Extension {
    /// Registry key: the lower-cased name.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub start_msg: Option<String>,
    pub menu: Menu,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    pub prompt: String,
    pub help: Option<String>,
    pub about: Option<String>,
    /// Sorted by item id; items with equal ids keep their declaration order.
    pub items: Vec<MenuItem>,
}

impl Menu {
    /// Finds an item by its display text (marker stripped, case-insensitive).
    pub fn find_by_text(&self, text: &str) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.text.base_matches(text))
    }

    /// One-line rendering shown before every menu prompt.
    pub fn render(&self) -> String {
        let parts: Vec<String> = self.items.iter().map(MenuItem::display).collect();
        format!("{}: {}", self.prompt, parts.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub id: i64,
    pub text: Label,
    pub help: String,
    pub about: Option<String>,
    pub key: Option<Label>,
    pub action: ItemAction,
}

impl MenuItem {
    /// Name of the inline parameter declared on the key or, failing that, the text.
    pub fn inline_param(&self) -> Option<&str> {
        self.key
            .as_ref()
            .and_then(|key| key.marker.as_deref())
            .or(self.text.marker.as_deref())
    }

    pub fn display(&self) -> String {
        let suffix = match self.inline_param() {
            Some(param) => format!(" ({param})"),
            None => String::new(),
        };
        match &self.key {
            Some(key) => format!("[{}]{}{}", key.base, self.text.base, suffix),
            None => format!("{}{}", self.text.base, suffix),
        }
    }
}

/// What selecting an item does.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemAction {
    Submenu(Menu),
    Action(IoSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IoSpec {
    pub command: String,
    pub help: Option<String>,
    /// Sorted by prompt id.
    pub prompts: Vec<PromptSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub id: f64,
    pub prompt: String,
    /// Sorted by input id.
    pub inputs: Vec<InputSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    /// Stringified id; the primary placeholder key.
    pub id: String,
    /// Optional alias placeholder key.
    pub name: Option<String>,
    pub kind: InputType,
    pub required: bool,
}

impl InputSpec {
    /// Placeholder keys this input's value is recorded under.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id.as_str()).chain(self.name.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    Int,
    Bool,
    /// Any other declared type; accepted as opaque text.
    Text(String),
}

impl InputType {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "int" => InputType::Int,
            "bool" => InputType::Bool,
            _ => InputType::Text(s.to_owned()),
        }
    }
}

/// An item key or text, split into its visible base and optional inline marker.
///
/// `"Search {term}"` has base `"Search"` and marker `"term"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub raw: String,
    pub base: String,
    pub marker: Option<String>,
}

impl Label {
    pub fn parse(raw: &str) -> Self {
        match INLINE_MARKER.captures(raw) {
            Some(caps) => Label {
                raw: raw.to_owned(),
                base: caps[1].trim().to_owned(),
                marker: Some(caps[2].to_owned()),
            },
            None => Label {
                raw: raw.to_owned(),
                base: raw.to_owned(),
                marker: None,
            },
        }
    }

    pub fn base_matches(&self, s: &str) -> bool {
        self.base.to_lowercase() == s.to_lowercase()
    }

    pub fn raw_matches(&self, s: &str) -> bool {
        self.raw.to_lowercase() == s.to_lowercase()
    }

    pub fn is_reserved_key(&self) -> bool {
        RESERVED_KEYS.contains(&self.base.to_lowercase().as_str())
    }

    pub fn is_reserved_text(&self) -> bool {
        RESERVED_TEXTS.contains(&self.base.to_lowercase().as_str())
    }
}

/// Ordering for input ids: numeric ids first in numeric order, then the rest lexically.
pub(crate) fn compare_input_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
