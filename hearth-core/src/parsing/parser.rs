//! Core parser trait and error types

use thiserror::Error;

/// Error type for parsing operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input was empty after trimming
    #[error("Empty input")]
    EmptyInput,

    /// No `{ ... }` span in the input
    #[error("No JSON object found")]
    NoJsonObject,

    /// The object span did not decode
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Trait for output parsers
pub trait OutputParser: Send + Sync {
    /// The output type produced by this parser
    type Output;

    /// Parse the raw output string
    fn parse(&self, raw: &str) -> ParseResult<Self::Output>;

    /// Check if this parser can handle the input
    fn can_parse(&self, raw: &str) -> bool;

    /// Get the parser name for debugging
    fn name(&self) -> &'static str;
}

/// Configuration for parser behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Rewrite legacy `+N` sentiment integers before decoding
    pub attempt_repair: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            attempt_repair: true,
        }
    }
}

impl ParserConfig {
    /// Only well-formed JSON is accepted
    pub fn strict() -> Self {
        Self {
            attempt_repair: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_config_default() {
        let config = ParserConfig::default();
        assert!(config.attempt_repair);
    }

    #[test]
    fn test_parser_config_strict() {
        let config = ParserConfig::strict();
        assert!(!config.attempt_repair);
    }
}
