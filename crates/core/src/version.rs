//! Optimistic concurrency for stored documents.

use crate::error::{DomainError, DomainResult};

/// Version a writer expects a stored document to be at when it commits.
///
/// Every committed write bumps a document's version by one. A writer that read
/// version `n` commits with `Exact(n)`; if someone else committed in between the
/// write is rejected instead of silently overwriting their change.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (blind overwrite).
    Any,
    /// Require the document to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "stale write (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
