//! Invariant checking for opened indexes
//!
//! Each invariant inspects an `IndexHandle` and reports the first violation
//! it finds. Tests run them over every fixture index they build.

use crate::config::FieldNames;
use crate::inspect::{DocidResolver, IndexHandle};
use crate::query::DocOrder;
use crate::segment::DocNo;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A violation of an invariant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub invariant: String,
    pub description: String,
    pub docnos: Vec<u32>,
    pub context: HashMap<String, String>,
}

impl Violation {
    fn new(invariant: &dyn Invariant, description: impl Into<String>) -> Self {
        Self {
            invariant: invariant.name().to_string(),
            description: description.into(),
            docnos: Vec::new(),
            context: HashMap::new(),
        }
    }

    fn at(mut self, docno: DocNo) -> Self {
        self.docnos.push(docno.as_u32());
        self
    }

    fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "INVARIANT VIOLATION: {}", self.invariant)?;
        writeln!(f, "  Description: {}", self.description)?;
        writeln!(f, "  Docnos: {:?}", self.docnos)?;
        if !self.context.is_empty() {
            writeln!(f, "  Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "    {}: {}", key, value)?;
            }
        }
        Ok(())
    }
}

/// Trait for invariant checkers
pub trait Invariant: Send + Sync {
    /// Name of the invariant
    fn name(&self) -> &str;

    /// Check the invariant against an open index
    fn check(&self, handle: &IndexHandle, fields: &FieldNames) -> Result<(), Violation>;

    /// Human-readable description
    fn description(&self) -> &str {
        "No description provided"
    }
}

/// All invariants defined here
pub fn default_invariants() -> Vec<Box<dyn Invariant>> {
    vec![
        Box::new(DocidRoundTrip),
        Box::new(UniqueLiveDocids),
        Box::new(DeletedDocsUnreachable),
        Box::new(PostingsMatchTermStats),
        Box::new(EnumerationCoversLiveDocs),
    ]
}

/// Check all invariants and return violations
pub fn check_all_invariants(
    handle: &IndexHandle,
    fields: &FieldNames,
    invariants: &[Box<dyn Invariant>],
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for invariant in invariants {
        if let Err(violation) = invariant.check(handle, fields) {
            violations.push(violation);
        }
    }

    violations
}

fn live_docnos(handle: &IndexHandle) -> impl Iterator<Item = DocNo> + '_ {
    (0..handle.max_doc()).map(DocNo).filter(|d| handle.is_live(*d))
}

/// Invariant: resolving a live docno to its docid and back yields the docno
pub struct DocidRoundTrip;

impl Invariant for DocidRoundTrip {
    fn name(&self) -> &str {
        "DocidRoundTrip"
    }

    fn description(&self) -> &str {
        "resolve_internal(resolve_external(d)) == d for every live docno"
    }

    fn check(&self, handle: &IndexHandle, fields: &FieldNames) -> Result<(), Violation> {
        let resolver = DocidResolver::new(handle, fields);

        for docno in live_docnos(handle) {
            let docid = resolver.resolve_external(docno).map_err(|e| {
                Violation::new(self, "Live docno has no docid")
                    .at(docno)
                    .with("error", e)
            })?;

            match resolver.resolve_internal(&docid) {
                Ok(back) if back == docno => {}
                Ok(back) => {
                    return Err(Violation::new(self, format!("Docid {} resolved to another docno", docid))
                        .at(docno)
                        .at(back))
                }
                Err(e) => {
                    return Err(Violation::new(self, format!("Docid {} did not resolve", docid))
                        .at(docno)
                        .with("error", e))
                }
            }
        }

        Ok(())
    }
}

/// Invariant: no two live documents share a docid
pub struct UniqueLiveDocids;

impl Invariant for UniqueLiveDocids {
    fn name(&self) -> &str {
        "UniqueLiveDocids"
    }

    fn description(&self) -> &str {
        "Each docid belongs to at most one live document"
    }

    fn check(&self, handle: &IndexHandle, fields: &FieldNames) -> Result<(), Violation> {
        let mut seen: HashMap<String, DocNo> = HashMap::new();

        for docno in live_docnos(handle) {
            let Ok(Some(docid)) = handle.stored_field(docno, &fields.id) else {
                continue;
            };
            if let Some(first) = seen.insert(docid.clone(), docno) {
                return Err(Violation::new(self, format!("Docid {} is used twice", docid))
                    .at(first)
                    .at(docno));
            }
        }

        Ok(())
    }
}

/// Invariant: a deleted document is never returned for its docid
pub struct DeletedDocsUnreachable;

impl Invariant for DeletedDocsUnreachable {
    fn name(&self) -> &str {
        "DeletedDocsUnreachable"
    }

    fn description(&self) -> &str {
        "Resolving the docid of a deleted document never yields that document"
    }

    fn check(&self, handle: &IndexHandle, fields: &FieldNames) -> Result<(), Violation> {
        let resolver = DocidResolver::new(handle, fields);

        for docno in (0..handle.max_doc()).map(DocNo).filter(|d| !handle.is_live(*d)) {
            if resolver.resolve_external(docno).is_ok() {
                return Err(Violation::new(self, "Deleted docno resolved to a docid").at(docno));
            }
            let Ok(Some(docid)) = handle.stored_field(docno, &fields.id) else {
                continue;
            };
            if resolver.resolve_internal(&docid).ok() == Some(docno) {
                return Err(Violation::new(self, format!("Docid {} resolved to a deleted docno", docid))
                    .at(docno));
            }
        }

        Ok(())
    }
}

/// Invariant: postings agree with the term dictionary
///
/// For every body term the postings are strictly ascending, only reference
/// live docnos, and sum to the recorded document and collection frequency.
pub struct PostingsMatchTermStats;

impl Invariant for PostingsMatchTermStats {
    fn name(&self) -> &str {
        "PostingsMatchTermStats"
    }

    fn description(&self) -> &str {
        "Postings are ascending, live, and consistent with df and cf"
    }

    fn check(&self, handle: &IndexHandle, fields: &FieldNames) -> Result<(), Violation> {
        let Some(field) = handle.reader().field_index(&fields.body) else {
            return Ok(());
        };

        for (term, meta) in field.terms().iter_terms() {
            let postings = handle.postings(&fields.body, &term).map_err(|e| {
                Violation::new(self, "Postings unreadable")
                    .with("term", &term)
                    .with("error", e)
            })?;

            let mut previous: Option<DocNo> = None;
            let mut df = 0u32;
            let mut cf = 0u64;
            for (docno, tf) in postings {
                if previous.map_or(false, |p| p >= docno) || !handle.is_live(docno) {
                    return Err(Violation::new(self, "Posting out of order or not live")
                        .at(docno)
                        .with("term", &term));
                }
                previous = Some(docno);
                df += 1;
                cf += u64::from(tf);
            }

            if df != meta.doc_frequency || cf != meta.total_term_frequency {
                return Err(Violation::new(self, "Term statistics disagree with postings")
                    .with("term", &term)
                    .with("df", format!("{} != {}", df, meta.doc_frequency))
                    .with("cf", format!("{} != {}", cf, meta.total_term_frequency)));
            }
        }

        Ok(())
    }
}

/// Invariant: ordering by docid covers every live document exactly once
pub struct EnumerationCoversLiveDocs;

impl Invariant for EnumerationCoversLiveDocs {
    fn name(&self) -> &str {
        "EnumerationCoversLiveDocs"
    }

    fn description(&self) -> &str {
        "Docid ordering lists each live document with a docid once, in ascending docid order"
    }

    fn check(&self, handle: &IndexHandle, fields: &FieldNames) -> Result<(), Violation> {
        let order = DocOrder::by_docid(fields);
        let sorted = handle
            .sorted_docs(&order, None)
            .map_err(|e| Violation::new(self, "Could not order documents").with("error", e))?;

        let listed: HashSet<DocNo> = sorted.iter().copied().collect();
        if listed.len() != sorted.len() {
            return Err(Violation::new(self, "A document was listed twice"));
        }

        let expected = live_docnos(handle).filter(|d| matches!(handle.stored_field(*d, &fields.id), Ok(Some(_))));
        for docno in expected {
            if !listed.contains(&docno) {
                return Err(Violation::new(self, "Live document missing from enumeration").at(docno));
            }
        }
        if listed.iter().any(|d| !handle.is_live(*d)) {
            return Err(Violation::new(self, "Deleted document listed"));
        }

        let ids: Vec<Option<String>> = sorted
            .iter()
            .map(|d| handle.stored_field(*d, &fields.id).ok().flatten())
            .collect();
        if ids.windows(2).any(|w| w[0] > w[1]) {
            return Err(Violation::new(self, "Docids not in ascending order"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{build_fixture_index, FixtureDoc};
    use tempfile::TempDir;

    #[test]
    fn test_invariants_hold_on_fixture() {
        let dir = TempDir::new().unwrap();
        build_fixture_index(
            dir.path(),
            &[
                FixtureDoc::new("b").contents("city lights"),
                FixtureDoc::new("a").contents("city city"),
                FixtureDoc::new("c").contents("village").deleted(),
                FixtureDoc::new("c").contents("quiet village"),
            ],
        )
        .unwrap();
        let handle = IndexHandle::open(dir.path()).unwrap();

        let violations = check_all_invariants(&handle, &FieldNames::default(), &default_invariants());
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn test_duplicate_live_docids_detected() {
        let dir = TempDir::new().unwrap();
        build_fixture_index(
            dir.path(),
            &[FixtureDoc::new("dup").contents("one"), FixtureDoc::new("dup").contents("two")],
        )
        .unwrap();
        let handle = IndexHandle::open(dir.path()).unwrap();

        let violation = UniqueLiveDocids
            .check(&handle, &FieldNames::default())
            .unwrap_err();
        assert_eq!(violation.invariant, "UniqueLiveDocids");
        assert_eq!(violation.docnos, vec![0, 1]);

        // the second copy can never be resolved by its docid
        assert!(DocidRoundTrip.check(&handle, &FieldNames::default()).is_err());
    }

    #[test]
    fn test_violation_display() {
        let violation = Violation::new(&DocidRoundTrip, "broken").at(DocNo(3)).with("k", "v");
        let text = violation.to_string();
        assert!(text.contains("INVARIANT VIOLATION: DocidRoundTrip"));
        assert!(text.contains("Docnos: [3]"));
        assert!(text.contains("k: v"));
    }
}
