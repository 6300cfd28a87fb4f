//! Call context
//!
//! Every entry point takes a [`CallContext`]: a cancellation scope plus a
//! request id used to correlate log records.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Cancellation-bearing context for one logical call.
///
/// Cloning shares the same cancellation scope.
#[derive(Clone, Debug)]
pub struct CallContext {
    token: CancellationToken,
    request_id: String,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CallContext {
    /// Create a fresh context with its own cancellation scope.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Create a context observing an existing token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Derive a child scope: cancelled when this context is, but cancelling
    /// the child leaves the parent untouched.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            request_id: self.request_id.clone(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
