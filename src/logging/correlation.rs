//! Per-request correlation tokens.
//!
//! The token lives in a task-local slot for the duration of [`scope`] (or
//! [`sync_scope`]) and disappears when the scope ends, so nothing leaks
//! from one request into the next. Work spawned onto other tasks does not
//! inherit the token unless it is re-scoped explicitly.

use std::fmt;
use std::future::Future;
use uuid::Uuid;

/// Placeholder written for records emitted outside any request scope.
pub const DEFAULT_CORRELATION_ID: &str = "-";

const MAX_LENGTH: usize = 32;

tokio::task_local! {
    static CORRELATION_ID: CorrelationId;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Random hex token, truncated to `length` characters (1..=32).
    pub fn generate(length: usize) -> Self {
        let length = length.clamp(1, MAX_LENGTH);
        let mut hex = Uuid::new_v4().simple().to_string();
        hex.truncate(length);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an inbound header value can be reused as a token: any UUID
/// form, or a bare hex string of at most 32 characters.
pub fn is_valid(value: &str) -> bool {
    if Uuid::parse_str(value).is_ok() {
        return true;
    }
    !value.is_empty() && value.len() <= MAX_LENGTH && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Run `future` with `id` as the ambient correlation token.
pub async fn scope<F>(id: CorrelationId, future: F) -> F::Output
where
    F: Future,
{
    CORRELATION_ID.scope(id, future).await
}

/// Synchronous counterpart of [`scope`].
pub fn sync_scope<F, R>(id: CorrelationId, f: F) -> R
where
    F: FnOnce() -> R,
{
    CORRELATION_ID.sync_scope(id, f)
}

/// The token of the enclosing scope, if any.
pub fn current() -> Option<CorrelationId> {
    CORRELATION_ID.try_with(Clone::clone).ok()
}
