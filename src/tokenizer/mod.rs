//! Text analysis shared by index construction and term lookup

#[allow(clippy::module_inception)]
mod tokenizer;

pub use tokenizer::Analyzer;
