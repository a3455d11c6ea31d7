//! Failure isolation for a batch of operations
//!
//! One invocation of the tool runs several independent operations against the
//! same index. A failed operation is logged and counted, and the next one
//! still runs. Errors that mean the index cannot be trusted end the batch.

use tracing::error;

use crate::error::Result;

/// Runs operations in order, recording the ones that failed
#[derive(Debug, Default)]
pub struct OperationRunner {
    failed: Vec<String>,
}

impl OperationRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one operation.
    ///
    /// Returns `Err` only for fatal errors; any other failure is logged and
    /// counted, and `Ok(())` is returned so the caller moves on.
    pub fn run(&mut self, operation: &str, f: impl FnOnce() -> Result<()>) -> Result<()> {
        match f() {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                error!(operation, error = %e, "Operation failed");
                self.failed.push(operation.to_string());
                Ok(())
            }
        }
    }

    /// Number of operations that failed
    pub fn failed(&self) -> usize {
        self.failed.len()
    }

    pub fn failed_operations(&self) -> &[String] {
        &self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LexdumpError;

    #[test]
    fn test_recoverable_failures_are_counted() {
        let mut runner = OperationRunner::new();
        let mut ran = Vec::new();

        runner
            .run("first", || Err(LexdumpError::IdentifierNotFound("x".to_string())))
            .unwrap();
        runner
            .run("second", || {
                ran.push("second");
                Ok(())
            })
            .unwrap();
        runner
            .run("third", || Err(LexdumpError::not_stored("d1", "Raw document")))
            .unwrap();

        assert_eq!(ran, vec!["second"]);
        assert_eq!(runner.failed(), 2);
        assert_eq!(runner.failed_operations(), &["first".to_string(), "third".to_string()]);
    }

    #[test]
    fn test_fatal_error_is_returned() {
        let mut runner = OperationRunner::new();
        let err = runner
            .run("stats", || Err(LexdumpError::CorruptIndex("bad postings".to_string())))
            .unwrap_err();

        assert!(matches!(err, LexdumpError::CorruptIndex(_)));
        assert_eq!(runner.failed(), 0);
    }

    #[test]
    fn test_clean_run_has_no_failures() {
        let mut runner = OperationRunner::new();
        runner.run("stats", || Ok(())).unwrap();
        runner.run("dump-raw-doc", || Ok(())).unwrap();
        assert_eq!(runner.failed(), 0);
        assert!(runner.failed_operations().is_empty());
    }
}
