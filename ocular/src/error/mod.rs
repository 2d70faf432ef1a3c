//! Error types and reporting

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error raised while executing one instruction
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("stack underflow: {message}")]
    StackUnderflow { message: String },

    #[error("undefined symbol: {name}")]
    UndefinedSymbol { name: String },

    #[error("failed to load: {name}")]
    LoadFailure { name: String },

    #[error("malformed define: {text}")]
    MalformedDefine { text: String },

    #[error("unrecognized instruction: {text}")]
    UnrecognizedInstruction { text: String },

    #[error("recursion limit of {limit} exceeded in {name}")]
    RecursionLimitExceeded { name: String, limit: usize },

    #[error("malformed literal: {text}")]
    MalformedLiteral { text: String },

    #[error("unterminated group: {text}")]
    UnterminatedGroup { text: String },

    #[error("type error: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("shape mismatch: {left:?} and {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("numeric error: {message}")]
    Numeric { message: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

/// Copyable discriminant of [`EngineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    StackUnderflow,
    UndefinedSymbol,
    LoadFailure,
    MalformedDefine,
    UnrecognizedInstruction,
    RecursionLimitExceeded,
    MalformedLiteral,
    UnterminatedGroup,
    TypeMismatch,
    ShapeMismatch,
    Numeric,
    Io,
}

impl EngineError {
    pub fn stack_underflow(message: impl Into<String>) -> Self {
        Self::StackUnderflow {
            message: message.into(),
        }
    }

    pub fn undefined_symbol(name: impl Into<String>) -> Self {
        Self::UndefinedSymbol { name: name.into() }
    }

    pub fn load_failure(name: impl Into<String>) -> Self {
        Self::LoadFailure { name: name.into() }
    }

    pub fn malformed_define(text: impl Into<String>) -> Self {
        Self::MalformedDefine { text: text.into() }
    }

    pub fn unrecognized(text: impl Into<String>) -> Self {
        Self::UnrecognizedInstruction { text: text.into() }
    }

    pub fn recursion_limit(name: impl Into<String>, limit: usize) -> Self {
        Self::RecursionLimitExceeded {
            name: name.into(),
            limit,
        }
    }

    pub fn malformed_literal(text: impl Into<String>) -> Self {
        Self::MalformedLiteral { text: text.into() }
    }

    pub fn unterminated_group(text: impl Into<String>) -> Self {
        Self::UnterminatedGroup { text: text.into() }
    }

    pub fn type_mismatch(expected: &str, got: &str) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    pub fn shape_mismatch(left: &[usize], right: &[usize]) -> Self {
        Self::ShapeMismatch {
            left: left.to_vec(),
            right: right.to_vec(),
        }
    }

    pub fn numeric(message: impl Into<String>) -> Self {
        Self::Numeric {
            message: message.into(),
        }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StackUnderflow { .. } => ErrorKind::StackUnderflow,
            Self::UndefinedSymbol { .. } => ErrorKind::UndefinedSymbol,
            Self::LoadFailure { .. } => ErrorKind::LoadFailure,
            Self::MalformedDefine { .. } => ErrorKind::MalformedDefine,
            Self::UnrecognizedInstruction { .. } => ErrorKind::UnrecognizedInstruction,
            Self::RecursionLimitExceeded { .. } => ErrorKind::RecursionLimitExceeded,
            Self::MalformedLiteral { .. } => ErrorKind::MalformedLiteral,
            Self::UnterminatedGroup { .. } => ErrorKind::UnterminatedGroup,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            Self::Numeric { .. } => ErrorKind::Numeric,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Errors that unwind through nested sequences instead of being absorbed
    /// by the per-token guard.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RecursionLimitExceeded { .. })
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::io_error(err.to_string())
    }
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_constructor() {
        assert_eq!(EngineError::stack_underflow("pop").kind(), ErrorKind::StackUnderflow);
        assert_eq!(EngineError::undefined_symbol("a").kind(), ErrorKind::UndefinedSymbol);
        assert_eq!(EngineError::load_failure("x.rpn").kind(), ErrorKind::LoadFailure);
        assert_eq!(EngineError::malformed_define("f").kind(), ErrorKind::MalformedDefine);
        assert_eq!(EngineError::unrecognized("zz").kind(), ErrorKind::UnrecognizedInstruction);
        assert_eq!(
            EngineError::recursion_limit("f", 8).kind(),
            ErrorKind::RecursionLimitExceeded
        );
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            EngineError::undefined_symbol("foo").to_string(),
            "undefined symbol: foo"
        );
        assert_eq!(
            EngineError::load_failure("nope.rpn").to_string(),
            "failed to load: nope.rpn"
        );
        assert_eq!(
            EngineError::type_mismatch("array", "label").to_string(),
            "type error: expected array, got label"
        );
        assert_eq!(
            EngineError::recursion_limit("loop", 64).to_string(),
            "recursion limit of 64 exceeded in loop"
        );
    }

    #[test]
    fn test_only_recursion_is_fatal() {
        assert!(EngineError::recursion_limit("f", 1).is_fatal());
        assert!(!EngineError::stack_underflow("pop").is_fatal());
        assert!(!EngineError::unrecognized("x").is_fatal());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EngineError = io.into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("gone"));
    }
}
