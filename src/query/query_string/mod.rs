//! Lucene-style query string handling
//!
//! Only single-term query strings are interpreted; the lexer understands the
//! full syntax so that compound queries are recognised and rejected instead
//! of being misread as a term.
//!
//! # Example
//!
//! ```rust
//! use lexdump::query::query_string::parse_term_query;
//!
//! let parsed = parse_term_query("contents:rust").unwrap();
//! assert_eq!(parsed.field.as_deref(), Some("contents"));
//! assert!(parse_term_query("rust AND search").is_err());
//! ```

pub mod lexer;
pub mod term;

pub use lexer::{Lexer, Token};
pub use term::{parse_term_query, TermQueryString};
