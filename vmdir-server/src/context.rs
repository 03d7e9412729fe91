//! Per-request context, passed explicitly down the call chain.

use tracing::Span;
use uuid::Uuid;

/// Identifies one request in logs. Work done inside
/// [`in_scope`](Self::in_scope) is attributed to the request's span.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    operation: &'static str,
    span: Span,
}

impl RequestContext {
    /// Starts a context for `operation` with a fresh time-ordered id.
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        let request_id = Uuid::now_v7();
        let span = tracing::info_span!("request", %request_id, operation);
        Self {
            request_id,
            operation,
            span,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        self.span.in_scope(f)
    }
}
