use std::io;
use thiserror::Error;

/// Error types for the grammar model, parser and generator
#[derive(Error, Debug)]
pub enum TutorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid grammar: {0}")]
    InvalidGrammar(String),

    #[error("Unknown non-terminal: {0}")]
    UnknownSymbol(String),

    #[error("Empty production for {0} (write ε for the empty string)")]
    EmptyProduction(String),

    #[error("Conflicting table entries for {nonterminal} on '{lookahead}'")]
    ConflictingEntry { nonterminal: String, lookahead: char },

    #[error("Table entry {nonterminal} → {production} is not a production of the grammar")]
    TableMismatch {
        nonterminal: String,
        production: String,
    },

    #[error("The sentence cannot be empty")]
    EmptyInput,

    #[error("Invalid input symbol '{symbol}' at position {position}")]
    InvalidInputSymbol { symbol: char, position: usize },

    #[error("Expected '{expected}', found '{found}'")]
    ParseMismatch { expected: char, found: char },

    #[error("No production for {nonterminal} with input '{lookahead}'")]
    NoTableEntry { nonterminal: String, lookahead: char },

    #[error("No derivation within {max_length} characters was found")]
    GeneratorExhausted { max_length: usize },

    #[error("{nonterminal} has no production number {index}")]
    InvalidChoice { nonterminal: String, index: usize },

    #[error("The derivation is already complete")]
    DerivationComplete,
}

/// Result type for tutor operations
pub type Result<T> = std::result::Result<T, TutorError>;

/// Trait extension for Option<T> to convert to TutorError
pub trait OptionExt<T> {
    fn ok_or_grammar_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_grammar_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.ok_or_else(|| TutorError::InvalidGrammar(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TutorError::ParseMismatch {
            expected: 'b',
            found: '$',
        };
        assert_eq!(err.to_string(), "Expected 'b', found '$'");

        let err = TutorError::NoTableEntry {
            nonterminal: "B".to_string(),
            lookahead: '$',
        };
        assert_eq!(err.to_string(), "No production for B with input '$'");

        let err = TutorError::InvalidInputSymbol {
            symbol: 'x',
            position: 0,
        };
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<u8> = None;
        let err = missing.ok_or_grammar_err(|| "nothing here".to_string());
        assert!(matches!(err, Err(TutorError::InvalidGrammar(msg)) if msg == "nothing here"));
        assert_eq!(Some(3).ok_or_grammar_err(String::new).unwrap(), 3);
    }
}
