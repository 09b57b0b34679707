//! Cancellable operation context.
//!
//! # Responsibility
//! - Carry caller-owned cancellation and deadline state down to store I/O.
//!
//! # Invariants
//! - Core code only observes a context; it never cancels one.
//! - A cancelled context stays cancelled.

use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Per-request context handed to every service and repository call.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl OpContext {
    /// Context without deadline that is never cancelled unless its token is.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Context driven by a token the transport layer already owns.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Token shared by this context and its clones. Cancelling it cancels them all.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// True once cancelled or past the deadline.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled()
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }
}
