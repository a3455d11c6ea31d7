//! Single-term query strings
//!
//! Accepts exactly one value, optionally qualified by a field:
//!
//! ```text
//! term_query := (WORD COLON)? (WORD | QUOTED) EOF
//! ```
//!
//! Anything else (boolean operators, grouping, ranges, wildcards, fuzzy or
//! boost modifiers, several values) cannot name a single term.

use super::lexer::{has_wildcard, Lexer, Token};
use crate::error::{LexdumpError, Result};

/// A query string that names one value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermQueryString {
    /// Explicit field qualifier, if any
    pub field: Option<String>,
    /// Unanalyzed value text
    pub text: String,
}

fn reject(input: &str) -> LexdumpError {
    LexdumpError::AmbiguousOrEmptyTerm(input.to_string())
}

/// Parse a query string that must name exactly one value
pub fn parse_term_query(input: &str) -> Result<TermQueryString> {
    let tokens = Lexer::new(input).tokenize().map_err(|e| {
        tracing::debug!(input, error = %e, "Query string does not lex");
        reject(input)
    })?;

    let (field, value) = match tokens.as_slice() {
        [value, Token::Eof] => (None, value),
        [Token::Word(field), Token::Colon, value, Token::Eof] => (Some(field.clone()), value),
        _ => return Err(reject(input)),
    };

    let text = match value {
        Token::Word(word) if !has_wildcard(word) => word.clone(),
        Token::Quoted(text) => text.clone(),
        _ => return Err(reject(input)),
    };

    Ok(TermQueryString { field, text })
}
