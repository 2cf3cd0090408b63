use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// One failed target of a fan-out operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    /// Backend that failed.
    pub backend_id: String,
    /// Failure reason, captured verbatim.
    pub reason: String,
}

/// Per-target outcome table of one fan-out operation.
///
/// Fan-outs always wait for every target and collect outcomes instead of
/// short-circuiting; the any-success vs all-success reduction is decided by
/// the caller, not here.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FanoutReport {
    /// Backends on which the operation succeeded.
    pub succeeded: Vec<String>,
    /// Backends on which the operation failed, with reasons.
    pub failures: Vec<TargetFailure>,
}

impl FanoutReport {
    /// Empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful target.
    pub fn record_ok(&mut self, backend_id: impl Into<String>) {
        self.succeeded.push(backend_id.into());
    }

    /// Record one failed target.
    pub fn record_err(&mut self, backend_id: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(TargetFailure {
            backend_id: backend_id.into(),
            reason: reason.into(),
        });
    }

    /// Total number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }

    /// Whether no targets were attempted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// At least one target succeeded.
    #[must_use]
    pub fn any_succeeded(&self) -> bool {
        !self.succeeded.is_empty()
    }

    /// Every target succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Enforce an all-success policy on this report.
    ///
    /// Returns [`CoreError::PartialFailure`] when a strict subset of targets
    /// failed, [`CoreError::AllTargetsFailed`] when all of them did.
    pub fn require_all(self) -> CoreResult<Self> {
        if self.all_succeeded() {
            Ok(self)
        } else if self.any_succeeded() {
            Err(CoreError::PartialFailure {
                failures: self.failures,
            })
        } else {
            Err(CoreError::AllTargetsFailed {
                failures: self.failures,
            })
        }
    }
}
