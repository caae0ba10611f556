use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::debug;

use crate::{
    diagnostics::{Result, SayulispError},
    lexer::ParenBalance,
    runtime::Interpreter,
};

/// Line-oriented front-end that buffers input until parentheses balance.
pub struct Repl {
    interpreter: Interpreter,
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

impl Repl {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Self { interpreter }
    }

    pub fn run(&mut self) -> Result<(), SayulispError> {
        let mut editor = DefaultEditor::new()?;
        let mut buffer = String::new();
        let mut balance = ParenBalance::new();
        loop {
            let prompt = if buffer.is_empty() { ">> " } else { ".. " };
            match editor.readline(prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if buffer.is_empty() {
                        if trimmed == ":quit" || trimmed == ":exit" {
                            break;
                        }
                        if trimmed.is_empty() {
                            continue;
                        }
                    }
                    buffer.push_str(&line);
                    buffer.push('\n');
                    let depth = balance.feed(&line);
                    balance.feed("\n");
                    if depth < 0 {
                        eprintln!("Error: @parse-error: Too many closing parentheses.");
                        buffer.clear();
                        balance.reset();
                        continue;
                    }
                    if !balance.is_complete() {
                        continue;
                    }
                    editor.add_history_entry(buffer.trim_end()).ok();
                    match self.interpreter.eval_source(&buffer) {
                        Ok(value) => println!("{value}"),
                        Err(exception) => eprintln!("Error: {exception}"),
                    }
                    buffer.clear();
                    balance.reset();
                }
                Err(ReadlineError::Interrupted) if !buffer.is_empty() => {
                    debug!("discarding unfinished input");
                    buffer.clear();
                    balance.reset();
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}
