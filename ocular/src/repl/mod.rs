//! Interactive calculator

use crate::engine::{Engine, Report};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::io::{self, BufRead};
use std::path::PathBuf;

const HISTORY_FILE: &str = ".ocular_history";

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    engine: Engine,
    history_path: Option<PathBuf>,
}

impl Repl {
    pub fn new(engine: Engine) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            engine,
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run until a quit keyword or end of input
    pub fn run(&mut self) -> RlResult<()> {
        println!("ocular calculator, '?' lists keywords, 'quit' exits.");

        loop {
            let prompt = self.engine.ps1();
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line);
                    if report_faults(&self.engine.interpret(line)) {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    self.engine.cancel_pending();
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }
}

/// Interpret piped lines without an editor
pub fn run_piped(engine: &mut Engine, input: impl BufRead) -> io::Result<()> {
    for line in input.lines() {
        if report_faults(&engine.interpret(&line?)) {
            break;
        }
    }
    Ok(())
}

/// Print each fault to stderr; true when the caller should stop
fn report_faults(report: &Report) -> bool {
    for fault in &report.faults {
        eprintln!("{fault}");
    }
    report.quit
}

fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
