//! Testing infrastructure: fixture indexes and invariant checks
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lexdump::config::FieldNames;
//! use lexdump::inspect::IndexHandle;
//! use lexdump::testing::prelude::*;
//!
//! let dir = std::path::Path::new("/tmp/fixture-index");
//! build_fixture_index(dir, &[FixtureDoc::new("d1").contents("hello world")]).unwrap();
//!
//! let handle = IndexHandle::open(dir).unwrap();
//! let violations = check_all_invariants(&handle, &FieldNames::default(), &default_invariants());
//! assert!(violations.is_empty());
//! ```
//!
//! # Invariants
//!
//! - **DocidRoundTrip**: docno -> docid -> docno is the identity on live docs
//! - **UniqueLiveDocids**: no docid is shared by two live documents
//! - **DeletedDocsUnreachable**: deleted documents never resolve
//! - **PostingsMatchTermStats**: postings agree with df and cf
//! - **EnumerationCoversLiveDocs**: docid ordering lists every live document once

pub mod fixtures;
pub mod invariants;

pub use fixtures::{build_fixture_index, build_fixture_index_with, synthetic_corpus, FixtureDoc};
pub use invariants::{
    check_all_invariants, default_invariants, DeletedDocsUnreachable, DocidRoundTrip,
    EnumerationCoversLiveDocs, Invariant, PostingsMatchTermStats, UniqueLiveDocids, Violation,
};

/// Prelude for easy imports
pub mod prelude {
    pub use super::fixtures::{build_fixture_index, FixtureDoc};
    pub use super::invariants::{check_all_invariants, default_invariants, Invariant, Violation};
}
