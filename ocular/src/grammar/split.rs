//! Bracket-aware token splitting for groups and definitions

use crate::error::{EngineError, Result};

/// Token separators inside groups and definitions
pub const SEPARATORS: [char; 2] = ['|', ','];

/// Split `text` on `|` and `,` that sit outside `(...)` and `[...]`.
///
/// Tokens are trimmed; empty tokens are dropped. An opener without a
/// matching closer is an `UnterminatedGroup` error.
pub fn split_tokens(text: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut closers: Vec<char> = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        match ch {
            '(' => closers.push(')'),
            '[' => closers.push(']'),
            ')' | ']' => {
                if closers.last() == Some(&ch) {
                    closers.pop();
                } else {
                    return Err(EngineError::unterminated_group(text));
                }
            }
            _ if closers.is_empty() && SEPARATORS.contains(&ch) => {
                push_token(&mut tokens, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    if !closers.is_empty() {
        return Err(EngineError::unterminated_group(text));
    }
    push_token(&mut tokens, &current);
    Ok(tokens)
}

fn push_token(tokens: &mut Vec<String>, raw: &str) {
    let token = raw.trim();
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
}

/// Remove an inline `#` comment and surrounding whitespace
pub fn strip_comment(text: &str) -> &str {
    match text.find('#') {
        Some(i) => text[..i].trim(),
        None => text.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_both_separators() {
        assert_eq!(split_tokens("4|sqrt,show").unwrap(), vec!["4", "sqrt", "show"]);
    }

    #[test]
    fn test_split_trims_and_drops_empty() {
        assert_eq!(split_tokens(" 4 , , sqrt| ").unwrap(), vec!["4", "sqrt"]);
        assert!(split_tokens("").unwrap().is_empty());
    }

    #[test]
    fn test_split_keeps_nested_groups() {
        assert_eq!(
            split_tokens("(4,sqrt)|[1,2],show").unwrap(),
            vec!["(4,sqrt)", "[1,2]", "show"]
        );
        assert_eq!(split_tokens("[[1,2],[3,4]]").unwrap(), vec!["[[1,2],[3,4]]"]);
    }

    #[test]
    fn test_split_unbalanced() {
        assert!(split_tokens("(4,sqrt").is_err());
        assert!(split_tokens("[1,2").is_err());
        assert!(split_tokens("4)").is_err());
        assert!(split_tokens("(1]").is_err());
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("sqrt # root"), "sqrt");
        assert_eq!(strip_comment("  show "), "show");
        assert_eq!(strip_comment("# all comment"), "");
    }
}
