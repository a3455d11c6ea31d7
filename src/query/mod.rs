//! Query-side helpers: single-term query strings and document ordering

pub mod order;
pub mod query_string;

pub use order::{DocOrder, SortDirection};
pub use query_string::{parse_term_query, TermQueryString};
