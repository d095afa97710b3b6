//! The interactive session: extension selection and menu navigation.

use crate::collector::{self, CollectedValues};
use crate::console::Console;
use crate::model::{Extension, IoSpec, ItemAction, Menu, MenuItem};
use crate::registry::{Lookup, Registry};
use crate::runner::CommandRunner;
use crate::settings::AppSettings;
use crate::template;
use crate::words::split_words;
use crate::{NO_ABOUT, NO_HELP};
use anyhow::Result;
use std::io::Write;

/// Built-in verbs; always take priority over menu items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    About,
    Back,
    Help,
    Exit,
}

impl Verb {
    /// Parses a verb from its short or long form, ignoring case.
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "a" | "about" => Some(Verb::About),
            "b" | "back" => Some(Verb::Back),
            "h" | "help" => Some(Verb::Help),
            "x" | "exit" => Some(Verb::Exit),
            _ => None,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The user typed `exit`.
    Exited,
    /// Input ran out.
    EndOfInput,
}

/// What the extension loop hands back to the selection level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// `back` at the root menu: return to extension selection.
    Leave,
    Finish(Outcome),
}

/// An item chosen from a menu, with the inline value typed after it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'m> {
    pub item: &'m MenuItem,
    /// `(parameter name, value)`
    pub inline: Option<(String, String)>,
}

/// Matches a line of user input against the items of `menu`.
///
/// The first word is compared with each item's key and text (both without
/// their inline marker). Anything after the first word is the inline value
/// and only selects items that declare an inline parameter: a single shell
/// word is unquoted, otherwise the remainder is used as typed. An empty value
/// such as `s ""` counts as no value. Failing that,
/// the whole line is compared with the raw key and text.
pub fn match_item<'m>(menu: &'m Menu, input: &str) -> Option<Selection<'m>> {
    let (base, rest) = match input.split_once(char::is_whitespace) {
        Some((base, rest)) => (base, Some(rest.trim_start())),
        None => (input, None),
    };
    let inline_value = rest
        .map(|rest| match split_words(rest) {
            Ok(mut words) if words.len() == 1 => words.remove(0),
            _ => rest.to_string(),
        })
        .filter(|value| !value.is_empty());

    for item in &menu.items {
        let by_key = item.key.as_ref().is_some_and(|k| k.base_matches(base));
        if by_key || item.text.base_matches(base) {
            match (&inline_value, item.inline_param()) {
                (None, _) => return Some(Selection { item, inline: None }),
                (Some(value), Some(param)) => {
                    return Some(Selection {
                        item,
                        inline: Some((param.to_string(), value.clone())),
                    });
                }
                (Some(_), None) => {}
            }
        }
        if item.key.as_ref().is_some_and(|k| k.raw_matches(input)) || item.text.raw_matches(input) {
            return Some(Selection { item, inline: None });
        }
    }
    None
}

/// Splits `input` into a verb and its optional argument, e.g. `help search`.
fn parse_verb(input: &str) -> Option<(Verb, Option<&str>)> {
    match input.split_once(char::is_whitespace) {
        Some((word, arg)) => Verb::parse(word).map(|verb| (verb, Some(arg.trim()))),
        None => Verb::parse(input).map(|verb| (verb, None)),
    }
}

/// One interactive session over a fixed set of extensions.
pub struct Session<'a> {
    registry: &'a Registry,
    settings: &'a AppSettings,
    console: &'a mut dyn Console,
    runner: &'a mut dyn CommandRunner,
    title: String,
}

impl<'a> Session<'a> {
    pub fn new(
        registry: &'a Registry,
        settings: &'a AppSettings,
        console: &'a mut dyn Console,
        runner: &'a mut dyn CommandRunner,
    ) -> Self {
        Self {
            registry,
            settings,
            console,
            runner,
            title: "MENU".to_string(),
        }
    }

    /// Sets the heading shown above the extension list.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Runs the extension-selection loop until `exit` or end of input.
    pub fn run(&mut self) -> Result<Outcome> {
        loop {
            let names = self.registry.names().join(", ");
            let out = self.console.out();
            writeln!(out)?;
            writeln!(out, "- {} -", self.title)?;
            writeln!(out, "[A]About [H]Help [B]Back [X]Exit")?;
            writeln!(out)?;
            writeln!(out, "Select Extension: {names}")?;

            let Some(line) = self.console.read_line("> ")? else {
                return Ok(Outcome::EndOfInput);
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match parse_verb(line) {
                Some((Verb::Exit, None)) => return Ok(Outcome::Exited),
                Some((Verb::Help, None)) => {
                    let text = self.settings.help.as_deref().unwrap_or(NO_HELP);
                    writeln!(self.console.out(), "{text}")?;
                    continue;
                }
                Some((Verb::About, None)) => {
                    let text = self.settings.about.as_deref().unwrap_or(NO_ABOUT);
                    writeln!(self.console.out(), "{text}")?;
                    continue;
                }
                Some((verb @ (Verb::Help | Verb::About), Some(name))) => {
                    let text = match self.registry.get(name) {
                        Some(ext) if verb == Verb::Help => ext.help.as_deref().unwrap_or(NO_HELP),
                        Some(ext) => ext.about.as_deref().unwrap_or(NO_ABOUT),
                        None => {
                            writeln!(self.console.out(), "Unknown extension: {}", name.to_lowercase())?;
                            continue;
                        }
                    };
                    writeln!(self.console.out(), "{text}")?;
                    continue;
                }
                _ => {}
            }

            let registry = self.registry;
            match registry.find(line) {
                Lookup::Found(extension) => match self.run_extension(extension)? {
                    Flow::Leave => {}
                    Flow::Finish(outcome) => return Ok(outcome),
                },
                Lookup::Ambiguous(candidates) => {
                    let names: Vec<&str> = candidates.iter().map(|e| e.name.as_str()).collect();
                    writeln!(self.console.out(), "Options: {}", names.join(", "))?;
                }
                Lookup::Missing => {}
            }
        }
    }

    fn run_extension(&mut self, extension: &Extension) -> Result<Flow> {
        tracing::debug!(name = %extension.name, "entering extension");
        if let Some(msg) = extension.program.start_msg.as_deref().filter(|m| !m.is_empty()) {
            writeln!(self.console.out(), "{msg}")?;
        }

        let mut stack: Vec<&Menu> = vec![&extension.program.menu];
        while let Some(&menu) = stack.last() {
            writeln!(self.console.out())?;
            writeln!(self.console.out(), "{}", menu.render())?;

            let Some(line) = self.console.read_line("> ")? else {
                return Ok(Flow::Finish(Outcome::EndOfInput));
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match parse_verb(line) {
                Some((Verb::Exit, None)) => return Ok(Flow::Finish(Outcome::Exited)),
                Some((Verb::Back, None)) => {
                    if stack.len() == 1 {
                        return Ok(Flow::Leave);
                    }
                    stack.pop();
                    continue;
                }
                Some((Verb::Help, None)) => {
                    let text = menu_text(extension, menu, stack.len(), |m| &m.help, |e| &e.help);
                    writeln!(self.console.out(), "{}", text.unwrap_or(NO_HELP))?;
                    continue;
                }
                Some((Verb::About, None)) => {
                    let text = menu_text(extension, menu, stack.len(), |m| &m.about, |e| &e.about);
                    writeln!(self.console.out(), "{}", text.unwrap_or(NO_ABOUT))?;
                    continue;
                }
                Some((verb @ (Verb::Help | Verb::About), Some(name))) => {
                    let text = match menu.find_by_text(name) {
                        Some(item) if verb == Verb::Help => item.help.as_str(),
                        Some(item) => item.about.as_deref().unwrap_or(NO_ABOUT),
                        None => {
                            writeln!(self.console.out(), "Unknown item: {}", name.to_lowercase())?;
                            continue;
                        }
                    };
                    writeln!(self.console.out(), "{text}")?;
                    continue;
                }
                _ => {}
            }

            let Some(selection) = match_item(menu, line) else {
                continue;
            };
            match &selection.item.action {
                ItemAction::Submenu(child) => {
                    tracing::debug!(prompt = %child.prompt, depth = stack.len() + 1, "entering submenu");
                    stack.push(child);
                }
                ItemAction::Action(io) => {
                    let precollected = selection
                        .inline
                        .map(|(param, value)| CollectedValues::from([(param, value)]));
                    if !self.run_action(io, precollected)? {
                        return Ok(Flow::Finish(Outcome::EndOfInput));
                    }
                }
            }
        }
        Ok(Flow::Leave)
    }

    /// Collects inputs, renders and runs one action. Returns `false` if input ended.
    fn run_action(&mut self, io: &IoSpec, precollected: Option<CollectedValues>) -> Result<bool> {
        let Some(values) = collector::collect(io, precollected, &mut *self.console)? else {
            return Ok(false);
        };

        let command = match template::render(&io.command, &values) {
            Ok(command) => command,
            Err(err) => {
                tracing::debug!(template = %io.command, "unresolved placeholders");
                writeln!(self.console.out(), "Error: {err}")?;
                return Ok(true);
            }
        };

        match self.runner.run(&command) {
            Ok(output) => write!(self.console.out(), "{output}")?,
            Err(err) => writeln!(self.console.out(), "Error running command: {err:#}")?,
        }
        Ok(true)
    }
}

/// Help or about text for the current menu: the extension's at the root, the
/// menu's own below it, falling back to the extension's.
fn menu_text<'e>(
    extension: &'e Extension,
    menu: &'e Menu,
    depth: usize,
    of_menu: impl Fn(&'e Menu) -> &'e Option<String>,
    of_extension: impl Fn(&'e Extension) -> &'e Option<String>,
) -> Option<&'e str> {
    let from_extension = of_extension(extension).as_deref();
    if depth == 1 {
        from_extension
    } else {
        of_menu(menu).as_deref().or(from_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemConsole;
    use crate::model::Label;
    use crate::schema;

    const DEMO: &str = r#"
name: Demo
description: demo extension
help: demo help
about: demo about
program:
  start_msg: Welcome to demo
  menu:
    prompt: Demo
    items:
      - id: 1
        key: "s"
        text: "Search {term}"
        help: search notes
        about: searches the notes file
        io:
          command: grep {term} notes.txt
          help: type a search term
          prompts:
            - id: 1
              prompt: Term
              inputs:
                - id: 1
                  name: term
                  type: text
                  required: true
      - id: 2
        key: "t"
        text: Tools
        help: more tools
        menu:
          prompt: Tools
          help: tools help
          items:
            - id: 1
              key: "c"
              text: Count
              help: count things
              io:
                command: seq {n} | wc -l
                prompts:
                  - id: 1
                    prompt: How many
                    inputs:
                      - id: n
                        type: int
            - id: 2
              text: Broken
              help: references a missing input
              io:
                command: echo {nope}
"#;

    #[derive(Default)]
    struct RecordingRunner {
        commands: Vec<String>,
        fail: bool,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&mut self, command: &str) -> Result<String> {
            self.commands.push(command.to_string());
            if self.fail {
                anyhow::bail!("spawn failed");
            }
            Ok(format!("ran: {command}\n"))
        }
    }

    fn demo_registry() -> Registry {
        let tree: serde_yaml::Value = serde_yaml::from_str(DEMO).unwrap();
        let mut registry = Registry::new();
        registry.insert(schema::admit(&tree, "demo.yml").expect("demo is valid"));
        registry
    }

    fn demo_menu() -> Menu {
        demo_registry().get("demo").unwrap().program.menu.clone()
    }

    fn run_session(lines: &[&str]) -> (Outcome, String, Vec<String>) {
        let registry = demo_registry();
        let settings = AppSettings {
            help: Some("app help".to_string()),
            about: None,
        };
        let mut console = MemConsole::new(lines.iter().copied());
        let mut runner = RecordingRunner::default();
        let outcome = Session::new(&registry, &settings, &mut console, &mut runner)
            .run()
            .unwrap();
        assert_eq!(console.remaining(), 0, "unread script lines");
        (outcome, console.transcript(), runner.commands)
    }

    #[test]
    fn test_verb_parse() {
        assert_eq!(Verb::parse("H"), Some(Verb::Help));
        assert_eq!(Verb::parse("exit"), Some(Verb::Exit));
        assert_eq!(Verb::parse("backup"), None);
        assert_eq!(parse_verb("help  Search"), Some((Verb::Help, Some("Search"))));
        assert_eq!(parse_verb("b"), Some((Verb::Back, None)));
    }

    #[test]
    fn test_match_inline_key() {
        let menu = demo_menu();
        let selection = match_item(&menu, "s foo").expect("match");
        assert_eq!(selection.item.id, 1);
        assert_eq!(selection.inline, Some(("term".to_string(), "foo".to_string())));
    }

    #[test]
    fn test_match_without_inline_value() {
        let menu = demo_menu();
        let selection = match_item(&menu, "S").expect("match");
        assert_eq!(selection.item.id, 1);
        assert_eq!(selection.inline, None);
        let selection = match_item(&menu, "search").expect("match by text");
        assert_eq!(selection.inline, None);
    }

    #[test]
    fn test_match_inline_value_quoting() {
        let menu = demo_menu();
        let quoted = match_item(&menu, r#"s "two words""#).expect("match");
        assert_eq!(quoted.inline, Some(("term".to_string(), "two words".to_string())));

        // More than one word: the remainder is used exactly as typed.
        let raw = match_item(&menu, "search two  words").expect("match");
        assert_eq!(raw.inline, Some(("term".to_string(), "two  words".to_string())));

        let unbalanced = match_item(&menu, "s it's").expect("match");
        assert_eq!(unbalanced.inline, Some(("term".to_string(), "it's".to_string())));
    }

    #[test]
    fn test_inline_value_on_item_without_marker_does_not_match() {
        let menu = demo_menu();
        assert!(match_item(&menu, "t extra").is_none());
        assert!(match_item(&menu, "nothing").is_none());
    }

    #[test]
    fn test_match_full_raw_text() {
        let mut menu = demo_menu();
        let mut item = menu.items[1].clone();
        item.id = 3;
        item.key = None;
        item.text = Label::parse("List all");
        menu.items.push(item);

        let selection = match_item(&menu, "list ALL").expect("raw text match");
        assert_eq!(selection.item.id, 3);
        assert_eq!(selection.inline, None);

        // With a marker, the first word wins and the rest is the inline value.
        let marked = match_item(&menu, "search {TERM}").expect("match");
        assert_eq!(marked.inline, Some(("term".to_string(), "{TERM}".to_string())));
    }

    #[test]
    fn test_inline_parameter_skips_prompt() {
        let (outcome, transcript, commands) = run_session(&["demo", "s foo", "x"]);
        assert_eq!(outcome, Outcome::Exited);
        assert_eq!(commands, vec!["grep foo notes.txt"]);
        assert!(!transcript.contains("Term: "), "{transcript}");
        assert!(transcript.contains("ran: grep foo notes.txt\n"));
    }

    #[test]
    fn test_empty_inline_value_still_prompts() {
        let menu = demo_menu();
        let selection = match_item(&menu, r#"s """#).expect("match");
        assert_eq!(selection.item.id, 1);
        assert_eq!(selection.inline, None);

        let (_, transcript, commands) = run_session(&["demo", r#"s """#, "foo", "x"]);
        assert_eq!(commands, vec!["grep foo notes.txt"]);
        assert!(transcript.contains("Term: foo\n"), "{transcript}");
    }

    #[test]
    fn test_selecting_without_inline_prompts() {
        let (_, transcript, commands) = run_session(&["demo", "s", "", "bar baz", "\"bar baz\"", "x"]);
        assert_eq!(commands, vec!["grep bar baz notes.txt"]);
        assert!(transcript.contains("Term: \nError: input is required\n"), "{transcript}");
        assert!(transcript.contains("Term: bar baz\nError: expected 1 input(s), got 2\n"));
    }

    #[test]
    fn test_back_pops_then_leaves_extension() {
        let (outcome, transcript, _) = run_session(&["de", "t", "b", "b", "x"]);
        assert_eq!(outcome, Outcome::Exited);
        let tools = transcript.matches("Tools: [c]Count Broken").count();
        let demo = transcript.matches("Demo: [s]Search (term) [t]Tools").count();
        let selection = transcript.matches("Select Extension: Demo").count();
        assert_eq!((tools, demo, selection), (1, 2, 2), "{transcript}");
    }

    #[test]
    fn test_exit_from_nested_menu() {
        let (outcome, _, commands) = run_session(&["demo", "t", "exit"]);
        assert_eq!(outcome, Outcome::Exited);
        assert!(commands.is_empty());
    }

    #[test]
    fn test_help_and_about() {
        let (_, transcript, _) = run_session(&[
            "h", "a", "h demo", "a nope", "demo", "h", "h search", "about SEARCH", "a tools",
            "h missing", "t", "help", "about", "x",
        ]);
        let expected = [
            "> h\napp help\n",
            "> a\nNo about information available.\n",
            "> h demo\ndemo help\n",
            "> a nope\nUnknown extension: nope\n",
            "> h\ndemo help\n",
            "> h search\nsearch notes\n",
            "> about SEARCH\nsearches the notes file\n",
            "> a tools\nNo about information available.\n",
            "> h missing\nUnknown item: missing\n",
            "> help\ntools help\n",
            "> about\ndemo about\n",
        ];
        for chunk in expected {
            assert!(transcript.contains(chunk), "missing {chunk:?} in {transcript}");
        }
        assert!(transcript.contains("Welcome to demo\n"));
    }

    #[test]
    fn test_unresolved_placeholder_skips_execution() {
        let (_, transcript, commands) = run_session(&["demo", "t", "broken", "x"]);
        assert!(commands.is_empty());
        assert!(transcript.contains("Error: unknown placeholder(s) in command: {nope}\n"));
    }

    #[test]
    fn test_int_input_and_execution_failure() {
        let registry = demo_registry();
        let settings = AppSettings::default();
        let mut console = MemConsole::new(["demo", "t", "c", "many", "3", "x"]);
        let mut runner = RecordingRunner {
            fail: true,
            ..Default::default()
        };
        let outcome = Session::new(&registry, &settings, &mut console, &mut runner)
            .with_title("TEST")
            .run()
            .unwrap();

        let transcript = console.transcript();
        assert_eq!(outcome, Outcome::Exited);
        assert_eq!(runner.commands, vec!["seq 3 | wc -l"]);
        assert!(transcript.contains("- TEST -\n"));
        assert!(transcript.contains("Error: input n must be an integer\n"));
        assert!(transcript.contains("Error running command: spawn failed\n"));
        // The session stays at the same menu after a failure.
        assert!(transcript.ends_with("Tools: [c]Count Broken\n> x\n"), "{transcript}");
    }

    #[test]
    fn test_ambiguous_and_unknown_extension_names() {
        let tree: serde_yaml::Value = serde_yaml::from_str(DEMO).unwrap();
        let mut registry = demo_registry();
        let mut other = schema::admit(&tree, "other.yml").unwrap();
        other.name = "Deploy".to_string();
        registry.insert(other);

        let settings = AppSettings::default();
        let mut console = MemConsole::new(["de", "zzz"]);
        let mut runner = RecordingRunner::default();
        let outcome = Session::new(&registry, &settings, &mut console, &mut runner)
            .run()
            .unwrap();

        let transcript = console.transcript();
        assert_eq!(outcome, Outcome::EndOfInput);
        assert!(transcript.contains("> de\nOptions: Demo, Deploy\n"));
        assert!(transcript.contains("> zzz\n\n- MENU -"));
    }

    #[test]
    fn test_identical_input_gives_identical_output() {
        let lines = ["demo", "s foo", "t", "c", "2", "b", "h", "x"];
        let (_, first, first_commands) = run_session(&lines);
        let (_, second, second_commands) = run_session(&lines);
        assert_eq!(first, second);
        assert_eq!(first_commands, second_commands);
    }

    #[test]
    fn test_end_of_input_mid_prompt() {
        let (outcome, _, commands) = run_session(&["demo", "s"]);
        assert_eq!(outcome, Outcome::EndOfInput);
        assert!(commands.is_empty());
    }
}
