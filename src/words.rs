//! Shell-style word splitting for user responses.
//!
//! Quoted substrings form a single word, so `add "buy milk" 2` splits into
//! `["add", "buy milk", "2"]`. No expansion of any kind is performed.

use std::fmt;

/// Errors that can occur while splitting a line into words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    UnfinishedQuote,
    /// The line ends with a backslash that escapes nothing.
    DanglingEscape,
}

impl fmt::Display for LexingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexingError::UnfinishedQuote => write!(f, "no closing quotation"),
            LexingError::DanglingEscape => write!(f, "no escaped character"),
        }
    }
}

impl std::error::Error for LexingError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
        }
    }

    fn make_words(&mut self) -> Result<Vec<String>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch)?,
                LexingState::ReadingWord => self.handle_word(ch, &mut out)?,
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch)?,
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote | LexingState::ReadingDoubleQuote => {
                return Err(LexingError::UnfinishedQuote);
            }
            LexingState::ReadingWord => out.push(std::mem::take(&mut self.buffer)),
            LexingState::Start => {}
        }

        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn handle_start(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            ' ' | '\t' | '\n' | '\r' => {}
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            '\\' => {
                self.read_escaped()?;
                self.state = LexingState::ReadingWord;
            }
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
        Ok(())
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) -> Result<(), LexingError> {
        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                out.push(std::mem::take(&mut self.buffer));
                self.state = LexingState::Start;
            }
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            '\\' => self.read_escaped()?,
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::ReadingWord,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '\\' => match self.peek_char() {
                Some(next @ ('"' | '\\' | '$' | '`')) => {
                    self.read_char();
                    self.buffer.push(next);
                }
                Some(_) => self.buffer.push('\\'),
                None => return Err(LexingError::UnfinishedQuote),
            },
            c => self.buffer.push(c),
        }
        Ok(())
    }

    /// Consumes the character after a backslash outside of quotes.
    fn read_escaped(&mut self) -> Result<(), LexingError> {
        match self.read_char() {
            Some(c) => {
                self.buffer.push(c);
                Ok(())
            }
            None => Err(LexingError::DanglingEscape),
        }
    }
}

/// Splits `line` into words the way a POSIX shell would, without expansions.
pub fn split_words(line: &str) -> Result<Vec<String>, LexingError> {
    LexingFSM::new(line).make_words()
}

/// Like [`split_words`], but falls back to plain whitespace splitting when the
/// line cannot be lexed (e.g. an unbalanced quote).
pub fn split_words_lossy(line: &str) -> Vec<String> {
    split_words(line)
        .unwrap_or_else(|_| line.split_whitespace().map(str::to_owned).collect())
}
