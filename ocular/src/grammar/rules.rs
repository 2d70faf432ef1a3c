//! The grammar rules, one unit struct each

use super::split::split_tokens;
use super::{Acceptance, Instruction, Rule};
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::value::Value;
use ndarray::{ArrayD, IxDyn};

/// Keywords that stop interpretation
pub const QUIT_WORDS: &[&str] = &["quit", "done", "exit", "stop", "kill", "die", "."];

/// Special commands, by exact text
pub const SPECIAL_WORDS: &[&str] = &[".stack", ".symbol", ".verbose", ".quiet", "\\", "?"];

/// Arithmetic symbols and the binary registry entry each maps to
const ARITHMETIC: &[(&str, &str)] = &[
    ("+", "add"),
    ("-", "subtract"),
    ("*", "multiply"),
    ("/", "divide"),
    ("^", "power"),
];

const ARITHMETIC_WORDS: &[&str] = &["+", "-", "*", "/", "^"];

pub struct Multipart;

impl Rule for Multipart {
    fn name(&self) -> &'static str {
        "multipart"
    }

    fn describe(&self) -> &'static str {
        "multipart instructions, for instance: (4|sqrt|show)"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Lead("(")
    }

    fn usage(&self) -> String {
        "({multipart})".to_string()
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        let text = instr.text();
        let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) else {
            return Err(EngineError::unterminated_group(text));
        };
        let inner = inner.trim();
        if inner.starts_with(':') {
            return match Instruction::parse(inner) {
                Some(define) => Define.execute(engine, &define),
                None => Ok(()),
            };
        }
        let tokens = split_tokens(inner)?;
        engine.run_sequence("(group)", &tokens)
    }
}

pub struct Comment;

impl Rule for Comment {
    fn name(&self) -> &'static str {
        "comment"
    }

    fn describe(&self) -> &'static str {
        "comment ignores input"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Lead("#")
    }

    fn execute(&self, _engine: &mut Engine, _instr: &Instruction) -> Result<()> {
        Ok(())
    }
}

pub struct Prompt;

impl Rule for Prompt {
    fn name(&self) -> &'static str {
        "prompt"
    }

    fn describe(&self) -> &'static str {
        "prompt changes the prompt to all chars after the key"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Lead("$")
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        engine.set_prompt(instr.rest());
        Ok(())
    }
}

pub struct Number;

impl Rule for Number {
    fn name(&self) -> &'static str {
        "number"
    }

    fn describe(&self) -> &'static str {
        "number pushes a legal float on the stack"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Lead("0123456789")
    }

    fn usage(&self) -> String {
        "{float}".to_string()
    }

    fn accepts(&self, _engine: &Engine, instr: &Instruction) -> bool {
        let lead = instr.lead();
        if lead.is_ascii_digit() {
            return true;
        }
        let next = instr.rest().chars().next();
        matches!(lead, '+' | '-' | '.') && next.is_some_and(|c| c.is_ascii_digit())
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        let value: f64 = instr
            .text()
            .parse()
            .map_err(|_| EngineError::malformed_literal(instr.text()))?;
        engine.stack_mut().push(value);
        Ok(())
    }
}

pub struct Store;

impl Rule for Store {
    fn name(&self) -> &'static str {
        "store"
    }

    fn describe(&self) -> &'static str {
        "pop the stack and store the value as a symbol"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Lead("@")
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        let name = instr.rest();
        if name.is_empty() {
            return Err(EngineError::malformed_literal(instr.text()));
        }
        let value = engine.stack_mut().pop()?;
        engine.symbols_mut().store(name, value);
        Ok(())
    }
}

pub struct ArrayLiteral;

impl Rule for ArrayLiteral {
    fn name(&self) -> &'static str {
        "array"
    }

    fn describe(&self) -> &'static str {
        "convert [] encapsulated data to an array"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Lead("[")
    }

    fn usage(&self) -> String {
        "[{array}]".to_string()
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        let array = parse_array(instr.text())?;
        engine.stack_mut().push(array);
        Ok(())
    }
}

pub struct QuotedLabel;

impl Rule for QuotedLabel {
    fn name(&self) -> &'static str {
        "label"
    }

    fn describe(&self) -> &'static str {
        "push a name onto the stack"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Lead("'")
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        engine.stack_mut().push(Value::Label(instr.rest().to_string()));
        Ok(())
    }
}

pub struct Print;

impl Rule for Print {
    fn name(&self) -> &'static str {
        "print"
    }

    fn describe(&self) -> &'static str {
        "print the message, first pass through a program only"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Lead("\"")
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        if engine.first() {
            engine.emit(instr.rest())?;
        }
        Ok(())
    }
}

pub struct Define;

impl Rule for Define {
    fn name(&self) -> &'static str {
        "define"
    }

    fn describe(&self) -> &'static str {
        "define a function, for instance: :name|tok|tok"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Lead(":")
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        let Some((name, body)) = instr.rest().split_once('|') else {
            return Err(EngineError::malformed_define(instr.text()));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::malformed_define(instr.text()));
        }
        let tokens = split_tokens(body)?;
        engine.symbols_mut().store(name, Value::CodeBlock(tokens));
        Ok(())
    }
}

pub struct Load;

impl Rule for Load {
    fn name(&self) -> &'static str {
        "load"
    }

    fn describe(&self) -> &'static str {
        "load a program by name, or by a name popped from the stack"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Lead("!")
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        if !instr.rest().is_empty() {
            return engine.load(instr.rest());
        }
        let name = engine.stack_mut().pop_label()?;
        let result = engine.load(&name);
        if let Err(EngineError::LoadFailure { .. }) = result {
            engine.stack_mut().push(Value::Label(name));
        }
        result
    }
}

pub struct PopN;

impl Rule for PopN {
    fn name(&self) -> &'static str {
        "pop"
    }

    fn describe(&self) -> &'static str {
        "pop a number of items from the stack: _n, or _ with the count on top"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Lead("_")
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        let count = if instr.rest().is_empty() {
            let n = engine.stack_mut().pop_scalar()?;
            if !n.is_finite() || n < 0.0 || n.fract() != 0.0 {
                return Err(EngineError::malformed_literal(format!("_ count {n}")));
            }
            n as usize
        } else {
            instr
                .rest()
                .parse()
                .map_err(|_| EngineError::malformed_literal(instr.text()))?
        };
        engine.stack_mut().drop_n(count)
    }
}

pub struct Arithmetic;

impl Rule for Arithmetic {
    fn name(&self) -> &'static str {
        "arithmetic"
    }

    fn describe(&self) -> &'static str {
        "convert +-*/^ to add subtract multiply divide power"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Words(ARITHMETIC_WORDS)
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        let Some(&(_, name)) = ARITHMETIC.iter().find(|(sym, _)| *sym == instr.text()) else {
            return Err(EngineError::unrecognized(instr.text()));
        };
        engine.invoke(name)
    }
}

pub struct Call;

impl Rule for Call {
    fn name(&self) -> &'static str {
        "call"
    }

    fn describe(&self) -> &'static str {
        "call a function defined using ':'"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Lead("&")
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        let name = instr.rest();
        let tokens = match engine.symbols().lookup(name)? {
            Value::CodeBlock(tokens) => tokens.clone(),
            other => return Err(EngineError::type_mismatch("code block", other.type_name())),
        };
        engine.run_sequence(name, &tokens)
    }
}

pub struct Quit;

impl Rule for Quit {
    fn name(&self) -> &'static str {
        "quit"
    }

    fn describe(&self) -> &'static str {
        "quit the interpreter"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Words(QUIT_WORDS)
    }

    fn execute(&self, engine: &mut Engine, _instr: &Instruction) -> Result<()> {
        engine.halt();
        Ok(())
    }
}

pub struct Special;

impl Rule for Special {
    fn name(&self) -> &'static str {
        "special"
    }

    fn describe(&self) -> &'static str {
        "special command: .stack .symbol .verbose .quiet \\ (show) ? (help)"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Words(SPECIAL_WORDS)
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        match instr.text() {
            ".stack" => {
                let lines: Vec<String> = engine.stack().iter().map(|v| v.to_string()).collect();
                for line in lines {
                    engine.emit(line)?;
                }
                Ok(())
            }
            ".symbol" => {
                let lines: Vec<String> = engine
                    .symbols()
                    .active()
                    .iter()
                    .map(|(name, value)| format!("{name} = {value}"))
                    .collect();
                for line in lines {
                    engine.emit(line)?;
                }
                Ok(())
            }
            ".verbose" => {
                engine.set_verbose(true);
                Ok(())
            }
            ".quiet" => {
                engine.set_verbose(false);
                Ok(())
            }
            "\\" => engine.invoke("show"),
            "?" => engine.help(),
            other => Err(EngineError::unrecognized(other)),
        }
    }
}

pub struct RegistryLookup;

impl Rule for RegistryLookup {
    fn name(&self) -> &'static str {
        "function"
    }

    fn describe(&self) -> &'static str {
        "execute a built-in or numeric suite function"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Registry
    }

    fn accepts(&self, engine: &Engine, instr: &Instruction) -> bool {
        engine.registry().contains(instr.text())
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        engine.invoke(instr.text())
    }
}

pub struct SymbolLookup;

impl Rule for SymbolLookup {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn describe(&self) -> &'static str {
        "push the value of a symbol onto the stack"
    }

    fn keys(&self) -> Acceptance {
        Acceptance::Symbols
    }

    fn accepts(&self, engine: &Engine, instr: &Instruction) -> bool {
        engine.symbols().contains(instr.text())
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()> {
        let value = engine.symbols().lookup(instr.text())?.clone();
        engine.stack_mut().push(value);
        Ok(())
    }
}

// ============================================================================
// Array literal parsing
// ============================================================================

enum Node {
    Number(f64),
    List(Vec<Node>),
}

struct ArrayParser<'a> {
    source: &'a str,
    rest: &'a str,
}

impl<'a> ArrayParser<'a> {
    fn error(&self) -> EngineError {
        EngineError::malformed_literal(self.source)
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, ch: char) -> bool {
        self.skip_ws();
        match self.rest.strip_prefix(ch) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn node(&mut self) -> Result<Node> {
        if self.eat('[') {
            let mut items = Vec::new();
            if self.eat(']') {
                return Ok(Node::List(items));
            }
            loop {
                items.push(self.node()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat(']') {
                    return Ok(Node::List(items));
                }
                return Err(self.error());
            }
        }
        self.skip_ws();
        let end = self
            .rest
            .find(|c: char| c == ',' || c == ']' || c.is_whitespace())
            .unwrap_or(self.rest.len());
        let (number, rest) = self.rest.split_at(end);
        let value = number.parse::<f64>().map_err(|_| self.error())?;
        self.rest = rest;
        Ok(Node::Number(value))
    }
}

/// Shape of a rectangular nesting; `None` when ragged or mixed
fn shape_of(node: &Node) -> Option<Vec<usize>> {
    match node {
        Node::Number(_) => Some(Vec::new()),
        Node::List(items) => {
            let mut shape = vec![items.len()];
            if let Some((first, others)) = items.split_first() {
                let inner = shape_of(first)?;
                for item in others {
                    if shape_of(item)? != inner {
                        return None;
                    }
                }
                shape.extend(inner);
            }
            Some(shape)
        }
    }
}

fn flatten(node: &Node, out: &mut Vec<f64>) {
    match node {
        Node::Number(x) => out.push(*x),
        Node::List(items) => items.iter().for_each(|item| flatten(item, out)),
    }
}

/// Parse a nested bracketed literal such as `[[1, 2], [3, 4]]`
pub fn parse_array(text: &str) -> Result<ArrayD<f64>> {
    let mut parser = ArrayParser {
        source: text,
        rest: text,
    };
    let node = parser.node()?;
    parser.skip_ws();
    if !parser.rest.is_empty() || !matches!(node, Node::List(_)) {
        return Err(parser.error());
    }
    let shape = shape_of(&node).ok_or_else(|| parser.error())?;
    let mut data = Vec::new();
    flatten(&node, &mut data);
    ArrayD::from_shape_vec(IxDyn(&shape), data).map_err(|_| parser.error())
}
