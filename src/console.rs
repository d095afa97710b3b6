use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;
use std::io::Write;

/// Line-oriented interactive I/O used by the menu session.
pub trait Console {
    /// Shows `prompt` and reads one line of input.
    ///
    /// Returns `None` when input has ended (Ctrl-D, Ctrl-C or an exhausted script).
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Sink for everything the session prints.
    fn out(&mut self) -> &mut dyn Write;
}

/// Terminal console backed by rustyline, with in-memory history.
pub struct LineEditor {
    editor: DefaultEditor,
    stdout: std::io::Stdout,
}

impl LineEditor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            stdout: std::io::stdout(),
        })
    }
}

impl Console for LineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.stdout.flush()?;
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn out(&mut self) -> &mut dyn Write {
        &mut self.stdout
    }
}

/// Memory-backed console: replays scripted input lines and records a transcript.
///
/// Prompts are echoed into the transcript together with the line that answered
/// them, so the transcript reads like a terminal session.
#[derive(Debug, Default)]
pub struct MemConsole {
    input: VecDeque<String>,
    transcript: Vec<u8>,
}

impl MemConsole {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Everything printed so far, lossily decoded.
    pub fn transcript(&self) -> String {
        String::from_utf8_lossy(&self.transcript).into_owned()
    }

    /// Number of scripted lines not consumed yet.
    pub fn remaining(&self) -> usize {
        self.input.len()
    }
}

impl Console for MemConsole {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.transcript.extend_from_slice(prompt.as_bytes());
        let line = self.input.pop_front();
        if let Some(line) = &line {
            self.transcript.extend_from_slice(line.as_bytes());
        }
        self.transcript.push(b'\n');
        Ok(line)
    }

    fn out(&mut self) -> &mut dyn Write {
        &mut self.transcript
    }
}
