//! Request lifecycle of a store's remote operations.

use crate::error::RemoteError;
use std::fmt;

/// Where a store's most recent remote operation stands.
///
/// `Op` is the store's own closed set of operations, so a status can only
/// ever name something that store actually does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus<Op> {
    /// Nothing in flight and nothing failed since the last success.
    Idle,
    /// An operation has been issued and not yet completed.
    InFlight(Op),
    /// The last operation failed.
    Failed { op: Op, error: RemoteError },
}

impl<Op> Default for RemoteStatus<Op> {
    fn default() -> Self {
        RemoteStatus::Idle
    }
}

impl<Op: Copy + fmt::Debug> RemoteStatus<Op> {
    /// Mark an operation as issued.
    pub fn begin(&mut self, op: Op) {
        *self = RemoteStatus::InFlight(op);
    }

    /// Mark the in-flight operation as done.
    pub fn succeed(&mut self) {
        *self = RemoteStatus::Idle;
    }

    /// Record a failure.
    pub fn fail(&mut self, op: Op, error: RemoteError) {
        tracing::warn!(?op, kind = error.kind.as_str(), error = %error, "remote operation failed");
        *self = RemoteStatus::Failed { op, error };
    }

    /// Check if an operation is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, RemoteStatus::InFlight(_))
    }

    /// The recorded error, if the last operation failed.
    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            RemoteStatus::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Hand the recorded error to the UI once, returning to idle.
    pub fn take_error(&mut self) -> Option<RemoteError> {
        match std::mem::take(self) {
            RemoteStatus::Failed { error, .. } => Some(error),
            other => {
                *self = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Fetch,
    }

    #[test]
    fn test_lifecycle() {
        let mut status = RemoteStatus::default();
        status.begin(Op::Fetch);
        assert!(status.is_loading());

        status.fail(Op::Fetch, RemoteError::network("offline"));
        assert!(!status.is_loading());
        assert_eq!(status.error().map(|e| e.message.as_str()), Some("offline"));

        assert!(status.take_error().is_some());
        assert_eq!(status, RemoteStatus::Idle);
        assert!(status.take_error().is_none());
    }

    #[test]
    fn test_take_error_keeps_in_flight() {
        let mut status = RemoteStatus::InFlight(Op::Fetch);
        assert!(status.take_error().is_none());
        assert_eq!(status, RemoteStatus::InFlight(Op::Fetch));
    }
}
