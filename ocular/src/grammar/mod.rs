//! Grammar dispatcher
//!
//! An instruction is offered to each rule of [`RULES`] in order. The first
//! rule whose acceptance set covers it executes and dispatch stops, whether
//! or not the execution succeeds. When every rule declines the instruction
//! is reported as unrecognized; it is never executed as code.

mod rules;
pub mod split;

pub use rules::{
    ArrayLiteral, Arithmetic, Call, Comment, Define, Load, Multipart, Number, PopN, Print, Prompt,
    Quit, RegistryLookup, Special, Store, SymbolLookup, QuotedLabel,
};

use crate::engine::Engine;
use crate::error::{EngineError, Result};
use split::strip_comment;

/// One instruction: lead character plus remainder, inline comment removed
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    text: String,
    lead: char,
    rest: String,
}

impl Instruction {
    /// `None` for blank input
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut chars = raw.chars();
        let lead = chars.next()?;
        let rest = strip_comment(chars.as_str()).to_string();
        Some(Instruction {
            text: format!("{lead}{rest}"),
            lead,
            rest,
        })
    }

    /// Lead and remainder rejoined
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lead(&self) -> char {
        self.lead
    }

    pub fn rest(&self) -> &str {
        &self.rest
    }
}

/// The keys a rule answers to, for dispatch and the help listing
#[derive(Debug, Clone, Copy)]
pub enum Acceptance {
    /// Any instruction whose lead character is in the set
    Lead(&'static str),
    /// Exact full-text keywords
    Words(&'static [&'static str]),
    /// Names in the function registry
    Registry,
    /// Names in the active symbol frame
    Symbols,
}

impl Acceptance {
    /// Static admission test; dynamic sets are resolved by the rule itself
    pub fn admits(&self, instr: &Instruction) -> bool {
        match self {
            Acceptance::Lead(keys) => keys.contains(instr.lead()),
            Acceptance::Words(words) => words.contains(&instr.text()),
            Acceptance::Registry | Acceptance::Symbols => false,
        }
    }
}

/// Outcome of offering an instruction to a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    Declined,
    Consumed,
}

/// A grammar rule
pub trait Rule: Sync {
    fn name(&self) -> &'static str;

    /// One-line description for the help listing
    fn describe(&self) -> &'static str;

    fn keys(&self) -> Acceptance;

    /// Help-listing label for lead-character rules
    fn usage(&self) -> String {
        match self.keys() {
            Acceptance::Lead(keys) => format!("{keys}{{{}}}", self.name()),
            _ => self.name().to_string(),
        }
    }

    fn accepts(&self, _engine: &Engine, instr: &Instruction) -> bool {
        self.keys().admits(instr)
    }

    fn execute(&self, engine: &mut Engine, instr: &Instruction) -> Result<()>;

    /// Decline, or execute and report the instruction consumed.
    ///
    /// An `Err` means the rule consumed the instruction and failed.
    fn try_match(&self, engine: &mut Engine, instr: &Instruction) -> Result<Match> {
        if !self.accepts(engine, instr) {
            return Ok(Match::Declined);
        }
        engine.announce(self.name(), instr.text())?;
        self.execute(engine, instr)?;
        Ok(Match::Consumed)
    }
}

/// Rules in priority order
pub static RULES: [&dyn Rule; 17] = [
    &Multipart,
    &Comment,
    &Prompt,
    &Number,
    &Store,
    &ArrayLiteral,
    &QuotedLabel,
    &Print,
    &Define,
    &Load,
    &PopN,
    &Arithmetic,
    &Call,
    &Quit,
    &Special,
    &RegistryLookup,
    &SymbolLookup,
];

/// Offer `instr` to every rule in order
pub fn dispatch(engine: &mut Engine, instr: &Instruction) -> Result<()> {
    for rule in RULES {
        if rule.try_match(engine, instr)? == Match::Consumed {
            return Ok(());
        }
    }
    Err(EngineError::unrecognized(instr.text()))
}

/// Lines of the help listing: every rule's keys, then the dynamic sets
pub fn help_lines(engine: &Engine) -> Vec<String> {
    let mut lines = Vec::new();
    for rule in RULES {
        match rule.keys() {
            Acceptance::Lead(_) => {
                lines.push(format!("{:<20} # {}", rule.usage(), rule.describe()));
            }
            Acceptance::Words(words) => {
                for word in words {
                    lines.push(format!("{:<20} # {}", word, rule.describe()));
                }
            }
            Acceptance::Registry => {
                for (name, entry) in engine.registry().iter() {
                    lines.push(format!("{:<20} # {}", name, entry.describe()));
                }
            }
            Acceptance::Symbols => {
                for (name, value) in engine.symbols().active() {
                    lines.push(format!("{:<20} # symbol ({})", name, value.type_name()));
                }
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_parse() {
        let instr = Instruction::parse("  @name # keep it ").unwrap();
        assert_eq!(instr.lead(), '@');
        assert_eq!(instr.rest(), "name");
        assert_eq!(instr.text(), "@name");
        assert!(Instruction::parse("   ").is_none());
    }

    #[test]
    fn test_instruction_single_char() {
        let instr = Instruction::parse("+").unwrap();
        assert_eq!(instr.lead(), '+');
        assert_eq!(instr.rest(), "");
        assert_eq!(instr.text(), "+");
    }

    #[test]
    fn test_acceptance_admits() {
        let instr = Instruction::parse("#note").unwrap();
        assert!(Acceptance::Lead("#").admits(&instr));
        assert!(!Acceptance::Lead("$").admits(&instr));
        let quit = Instruction::parse("exit").unwrap();
        assert!(Acceptance::Words(&["quit", "exit"]).admits(&quit));
        assert!(!Acceptance::Words(&["quit"]).admits(&quit));
        assert!(!Acceptance::Registry.admits(&quit));
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<&str> = RULES.iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                "multipart",
                "comment",
                "prompt",
                "number",
                "store",
                "array",
                "label",
                "print",
                "define",
                "load",
                "pop",
                "arithmetic",
                "call",
                "quit",
                "special",
                "function",
                "dictionary",
            ]
        );
    }

    #[test]
    fn test_unrecognized() {
        let mut engine = Engine::default();
        let instr = Instruction::parse("frobnicate").unwrap();
        let err = dispatch(&mut engine, &instr).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnrecognizedInstruction);
    }

    #[test]
    fn test_help_lists_rules_and_registry() {
        let engine = Engine::default();
        let lines = help_lines(&engine);
        assert!(lines.iter().any(|l| l.starts_with("#{comment}")));
        assert!(lines.iter().any(|l| l.starts_with("{float}")));
        assert!(lines.iter().any(|l| l.starts_with("quit ")));
        assert!(lines.iter().any(|l| l.starts_with("sqrt ") && l.contains("1 arg")));
        assert!(lines.iter().any(|l| l.starts_with("diffract ")));
    }
}
