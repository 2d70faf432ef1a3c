//! Multi-line statement assembly

use crate::grammar::split::{strip_comment, SEPARATORS};

/// Buffers an instruction whose remainder ends in a separator until the
/// line that completes it arrives.
#[derive(Debug, Default, Clone)]
pub struct Continuation {
    pending: Option<String>,
}

impl Continuation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Drop any partial instruction, returning it
    pub fn take(&mut self) -> Option<String> {
        self.pending.take()
    }

    /// Feed one line. Returns a complete instruction ready for dispatch, or
    /// `None` when the line was absorbed (blank, comment, or still partial).
    pub fn feed(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line.starts_with('#') {
            // comments never touch a pending instruction
            return if self.is_pending() { None } else { Some(line.to_string()) };
        }

        let combined = match self.pending.take() {
            Some(head) => format!("{head} {line}"),
            None => line.to_string(),
        };
        if is_incomplete(&combined) {
            self.pending = Some(without_comment(&combined));
            None
        } else {
            Some(combined)
        }
    }
}

/// True when the remainder, comment removed, ends in `|` or `,`
pub fn is_incomplete(text: &str) -> bool {
    let mut chars = text.trim().chars();
    if chars.next().is_none() {
        return false;
    }
    strip_comment(chars.as_str())
        .chars()
        .last()
        .is_some_and(|c| SEPARATORS.contains(&c))
}

/// Lead character followed by the remainder with its comment removed
fn without_comment(text: &str) -> String {
    let text = text.trim();
    let mut chars = text.chars();
    match chars.next() {
        Some(lead) => format!("{lead}{}", strip_comment(chars.as_str())),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_line_passes_through() {
        let mut c = Continuation::new();
        assert_eq!(c.feed("  4 ").as_deref(), Some("4"));
        assert!(!c.is_pending());
    }

    #[test]
    fn test_two_part_group() {
        let mut c = Continuation::new();
        assert_eq!(c.feed("(4,"), None);
        assert!(c.is_pending());
        assert_eq!(c.feed("sqrt,show)").as_deref(), Some("(4, sqrt,show)"));
        assert!(!c.is_pending());
    }

    #[test]
    fn test_comment_keeps_pending() {
        let mut c = Continuation::new();
        assert_eq!(c.feed(":f|sqrt|"), None);
        assert_eq!(c.feed("# interlude"), None);
        assert_eq!(c.feed(""), None);
        assert_eq!(c.pending(), Some(":f|sqrt|"));
        assert_eq!(c.feed("show").as_deref(), Some(":f|sqrt| show"));
    }

    #[test]
    fn test_comment_without_pending_is_dispatched() {
        let mut c = Continuation::new();
        assert_eq!(c.feed("# note").as_deref(), Some("# note"));
    }

    #[test]
    fn test_inline_comment_dropped_from_pending() {
        let mut c = Continuation::new();
        assert_eq!(c.feed("(4, # more follows"), None);
        assert_eq!(c.pending(), Some("(4,"));
        assert_eq!(c.feed("sqrt)").as_deref(), Some("(4, sqrt)"));
        assert!(!c.is_pending());
    }

    #[test]
    fn test_inline_comment_hides_separator() {
        assert!(is_incomplete("(4, # more follows"));
        assert!(!is_incomplete("(4 # trailing, comma"));
        assert!(!is_incomplete(","));
        assert!(is_incomplete("(1|"));
    }
}
