//! The instruction engine
//!
//! Owns the operand stack, the symbol table, the function registry and the
//! diffraction kernel cache. Every top-level instruction runs under a
//! guard: a failure is logged and collected into the returned [`Report`]
//! and interpretation resumes with the next instruction. Nested sequences
//! (groups, calls, loaded programs) guard each token the same way, except
//! that [`EngineError::RecursionLimitExceeded`] unwinds to the top level.

mod continuation;
mod loader;

pub use continuation::{is_incomplete, Continuation};
pub use loader::Loader;

use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::grammar::{self, Instruction};
use crate::numeric::signal::Boundary;
use crate::optics::{Diffractor, HumanEye, KernelSource};
use crate::registry::FunctionRegistry;
use crate::stack::OperandStack;
use crate::symbol::SymbolTable;
use crate::value::Value;
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, error};

/// Stack growth parameters for deeply nested sequences
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Prompt text before any `$` instruction
pub const DEFAULT_PROMPT: &str = "\\";

/// Red wavelength used when `Rw` is not bound
pub const DEFAULT_RED_WAVELENGTH: f64 = 564e-9;

/// One failed instruction
#[derive(Debug, Clone)]
pub struct Fault {
    pub instruction: String,
    pub error: EngineError,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.instruction, self.error)
    }
}

/// Outcome of one top-level call
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub faults: Vec<Fault>,
    /// A quit keyword ran; the caller should stop
    pub quit: bool,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

pub struct Engine {
    stack: OperandStack,
    symbols: SymbolTable,
    registry: FunctionRegistry,
    diffractor: Diffractor,
    continuation: Continuation,
    loader: Loader,
    default_boundary: Boundary,
    max_depth: usize,
    /// Names of the sequences currently executing, innermost last
    call_stack: Vec<String>,
    verbose: bool,
    /// Print instructions fire only while set
    first: bool,
    prompt: String,
    iteration: usize,
    halted: bool,
    faults: Vec<Fault>,
    console: Box<dyn Write>,
}

impl Engine {
    pub fn new(config: &Config) -> Self {
        Self::with_kernel_source(config, Box::new(HumanEye::new()))
    }

    pub fn with_kernel_source(config: &Config, source: Box<dyn KernelSource>) -> Self {
        Engine {
            stack: OperandStack::new(),
            symbols: SymbolTable::new(),
            registry: FunctionRegistry::standard(),
            diffractor: Diffractor::new(source, config.optics.attenuation),
            continuation: Continuation::new(),
            loader: Loader::new(
                config.engine.search_path.clone(),
                config.engine.extension.clone(),
            ),
            default_boundary: config.optics.boundary,
            max_depth: config.engine.max_depth,
            call_stack: Vec::new(),
            verbose: false,
            first: true,
            prompt: DEFAULT_PROMPT.to_string(),
            iteration: 1,
            halted: false,
            faults: Vec::new(),
            console: Box::new(io::stdout()),
        }
    }

    /// Redirect program output (`show`, `.stack`, print, help)
    pub fn with_console(mut self, console: Box<dyn Write>) -> Self {
        self.console = console;
        self
    }

    pub fn with_search_path(mut self, search_path: Vec<PathBuf>) -> Self {
        self.loader = Loader::new(search_path, self.loader.extension().to_string());
        self
    }

    // ------------------------------------------------------------------
    // Top-level entry points
    // ------------------------------------------------------------------

    /// Interpret one or more lines of program text
    pub fn interpret(&mut self, text: &str) -> Report {
        self.halted = false;
        for line in text.lines() {
            if self.halted {
                break;
            }
            if let Some(instruction) = self.continuation.feed(line) {
                self.run_top(&instruction);
            }
        }
        self.finish()
    }

    /// Run a whole program as one top-level call
    pub fn run_source(&mut self, name: &str, text: &str) -> Report {
        self.halted = false;
        if let Err(e) = self.run_program(name, text) {
            self.record(&format!("!{name}"), e);
        }
        self.finish()
    }

    fn run_top(&mut self, instruction: &str) {
        match self.dispatch(instruction) {
            Ok(()) => self.iteration += 1,
            Err(e) => self.record(instruction, e),
        }
    }

    fn finish(&mut self) -> Report {
        Report {
            faults: std::mem::take(&mut self.faults),
            quit: self.halted,
        }
    }

    fn record(&mut self, instruction: &str, err: EngineError) {
        error!(instruction, "{err}");
        self.faults.push(Fault {
            instruction: instruction.to_string(),
            error: err,
        });
    }

    // ------------------------------------------------------------------
    // Dispatch and nesting
    // ------------------------------------------------------------------

    fn dispatch(&mut self, raw: &str) -> Result<()> {
        let Some(instruction) = Instruction::parse(raw) else {
            return Ok(());
        };
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            grammar::dispatch(self, &instruction)
        })
    }

    /// Dispatch one token of a nested sequence, absorbing non-fatal errors
    fn guarded(&mut self, token: &str) -> Result<()> {
        match self.dispatch(token) {
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.record(token, e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    fn enter(&mut self, name: &str) -> Result<()> {
        if self.call_stack.len() >= self.max_depth {
            return Err(EngineError::recursion_limit(name, self.max_depth));
        }
        self.call_stack.push(name.to_string());
        Ok(())
    }

    /// Dispatch `tokens` in order as one nested sequence named `name`
    pub fn run_sequence(&mut self, name: &str, tokens: &[String]) -> Result<()> {
        self.enter(name)?;
        let mut result = Ok(());
        for token in tokens {
            if self.halted {
                break;
            }
            if let Err(e) = self.guarded(token) {
                result = Err(e);
                break;
            }
        }
        self.call_stack.pop();
        result
    }

    /// Interpret program text line by line, with its own continuation state
    pub fn run_program(&mut self, name: &str, text: &str) -> Result<()> {
        self.enter(name)?;
        let mut lines = Continuation::new();
        let mut result = Ok(());
        for line in text.lines() {
            if self.halted {
                break;
            }
            if let Some(instruction) = lines.feed(line) {
                result = self.guarded(&instruction);
                if result.is_err() {
                    break;
                }
            }
        }
        if result.is_ok() && !self.halted {
            if let Some(rest) = lines.take() {
                result = self.guarded(&rest);
            }
        }
        self.call_stack.pop();
        result
    }

    /// Resolve `name` on the search path and interpret it
    pub fn load(&mut self, name: &str) -> Result<()> {
        let (path, text) = self.loader.read(name)?;
        debug!(path = %path.display(), "loading program");
        self.run_program(name, &text)
    }

    /// Invoke a registry entry by name
    pub fn invoke(&mut self, name: &str) -> Result<()> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| EngineError::undefined_symbol(name))?;
        entry.invoke(self)
    }

    /// Trace the rule chosen for an instruction; echoed when verbose
    pub fn announce(&mut self, rule: &str, text: &str) -> Result<()> {
        debug!(rule, instruction = text, "dispatch");
        if self.verbose {
            writeln!(self.console, "{rule:>12}: '{text}'")?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    pub fn emit(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.console, "{}", text.as_ref())?;
        Ok(())
    }

    pub fn help(&mut self) -> Result<()> {
        for line in grammar::help_lines(self) {
            self.emit(line)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Reset stack, symbols and the verbose flag
    pub fn clear(&mut self) {
        self.stack.clear();
        self.symbols.reset();
        self.verbose = false;
    }

    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut OperandStack {
        &mut self.stack
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn diffractor(&self) -> &Diffractor {
        &self.diffractor
    }

    pub fn diffractor_mut(&mut self) -> &mut Diffractor {
        &mut self.diffractor
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Kernel half extents, `(0, 0)` before any diffraction
    pub fn margin(&self) -> (usize, usize) {
        self.diffractor.margin()
    }

    /// `Rw` from the active frame, or 564 nm
    pub fn red_wavelength(&self) -> f64 {
        self.symbols
            .get("Rw")
            .and_then(|v| v.as_scalar())
            .unwrap_or(DEFAULT_RED_WAVELENGTH)
    }

    /// Convolution mode from the `boundary` label, or the configured default
    pub fn boundary(&self) -> Result<Boundary> {
        match self.symbols.get("boundary") {
            None => Ok(self.default_boundary),
            Some(Value::Label(mode)) => mode.parse(),
            Some(other) => Err(EngineError::type_mismatch("label", other.type_name())),
        }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn first(&self) -> bool {
        self.first
    }

    pub fn set_first(&mut self, first: bool) {
        self.first = first;
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    /// Count of top-level instructions completed, starting at 1
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Full REPL prompt, `[n]\ `, with `> ` while a line is pending
    pub fn ps1(&self) -> String {
        let mut ps1 = format!("[{}]{} ", self.iteration, self.prompt);
        if self.continuation.is_pending() {
            ps1.push_str("> ");
        }
        ps1
    }

    pub fn is_pending(&self) -> bool {
        self.continuation.is_pending()
    }

    /// Discard a partially entered instruction, returning it
    pub fn cancel_pending(&mut self) -> Option<String> {
        self.continuation.take()
    }

    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Depth of nested sequences currently executing
    pub fn depth(&self) -> usize {
        self.call_stack.len()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
