//! # Console
//!
//! Line input from a channel, text output to any writer.
//!
//! ```text
//! stdin ──► reader thread (blocking read_line) ──► mpsc<String> ──► Console
//!                                                                     │
//!                                                   stdout ◄── write ─┘
//! ```
//!
//! The reader thread keeps stdin reads off the runtime, so the checkout
//! screen can `select!` between operator input and scan results. Tests feed
//! the channel directly and capture output in a `Vec<u8>`.

use std::fmt::Display;
use std::io::{BufRead, Write};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Lines buffered between the reader thread and the menu.
const INPUT_BUFFER: usize = 32;

/// Why a menu stopped.
#[derive(Debug, Error)]
pub enum MenuError {
    /// Writing to the terminal failed.
    #[error("Console output failed: {0}")]
    Io(#[from] std::io::Error),

    /// Input reached end of file.
    #[error("Input closed")]
    InputClosed,
}

pub type MenuResult<T = ()> = Result<T, MenuError>;

/// Starts a thread that forwards stdin lines into a channel.
///
/// The channel closes at end of input or on a read error.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
        debug!("Stdin reader finished");
    });
    rx
}

/// Operator console.
pub struct Console<W> {
    input: mpsc::Receiver<String>,
    out: W,
    /// Output was written since the last prompt.
    dirty: bool,
}

impl<W: Write> Console<W> {
    pub fn new(input: mpsc::Receiver<String>, out: W) -> Self {
        Console {
            input,
            out,
            dirty: false,
        }
    }

    /// Next raw line, or `None` at end of input.
    pub async fn next_line(&mut self) -> Option<String> {
        let line = self.input.recv().await;
        // The operator's Enter moved the cursor past the prompt.
        self.dirty = true;
        line
    }

    /// Prints one line.
    pub fn say(&mut self, text: impl Display) -> MenuResult {
        writeln!(self.out, "{text}")?;
        self.dirty = true;
        Ok(())
    }

    /// Prints `label` without a newline and clears the dirty flag.
    pub fn prompt(&mut self, label: &str) -> MenuResult {
        write!(self.out, "{label}")?;
        self.out.flush()?;
        self.dirty = false;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Prompts and reads one trimmed line. May be empty.
    pub async fn ask(&mut self, label: &str) -> MenuResult<String> {
        self.prompt(label)?;
        let line = self.next_line().await.ok_or(MenuError::InputClosed)?;
        Ok(line.trim().to_string())
    }

    /// Prompts until a non-empty line is entered.
    pub async fn ask_required(&mut self, label: &str) -> MenuResult<String> {
        loop {
            let value = self.ask(label).await?;
            if !value.is_empty() {
                return Ok(value);
            }
            self.say("Value cannot be empty.")?;
        }
    }

    /// Prompts for a whole number. A blank line reads as 0.
    pub async fn ask_int(&mut self, label: &str) -> MenuResult<i64> {
        loop {
            let value = self.ask(label).await?;
            if value.is_empty() {
                return Ok(0);
            }
            match value.parse() {
                Ok(n) => return Ok(n),
                Err(_) => self.say("Invalid number. Please try again.")?,
            }
        }
    }

    /// Prompts for a whole number, or `None` on a blank line.
    pub async fn ask_optional_int(&mut self, label: &str) -> MenuResult<Option<i64>> {
        loop {
            let value = self.ask(label).await?;
            if value.is_empty() {
                return Ok(None);
            }
            match value.parse() {
                Ok(n) => return Ok(Some(n)),
                Err(_) => self.say("Invalid number. Please try again.")?,
            }
        }
    }

    /// Prompts for y/n. Anything but `y`/`yes` is no.
    pub async fn confirm(&mut self, label: &str) -> MenuResult<bool> {
        let answer = self.ask(label).await?;
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    /// Gives back the writer (tests read what was printed).
    pub fn into_output(self) -> W {
        self.out
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_ask_int_blank_is_zero_and_retries_garbage() {
        let mut console = scripted(&["", "abc", "42"]);

        assert_eq!(console.ask_int("n: ").await.unwrap(), 0);
        assert_eq!(console.ask_int("n: ").await.unwrap(), 42);
        assert!(output(console).contains("Invalid number"));
    }

    #[tokio::test]
    async fn test_ask_required_skips_blank() {
        let mut console = scripted(&["  ", " Ana "]);
        assert_eq!(console.ask_required("Name: ").await.unwrap(), "Ana");
    }

    #[tokio::test]
    async fn test_end_of_input_is_reported() {
        let mut console = scripted(&[]);
        assert!(matches!(
            console.ask("x: ").await,
            Err(MenuError::InputClosed)
        ));
    }

    #[tokio::test]
    async fn test_prompt_clears_dirty() {
        let mut console = scripted(&[]);
        assert!(!console.is_dirty());
        console.say("hello").unwrap();
        assert!(console.is_dirty());
        console.prompt("scan> ").unwrap();
        assert!(!console.is_dirty());
    }
}
