//! Context propagation helpers for process and operation spans.
//!
//! # Design
//! - Keeps the operation identifier in task-local storage so every stage of a
//!   multi-step workflow logs under the same id.
//! - Provides a process-level span guard so top-level spans carry build info.

use std::future::Future;
use std::sync::Arc;

use tracing::{Instrument, Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    #[must_use]
    /// Enter the application-level tracing span for the lifetime of the guard.
    pub fn new(component: impl Into<String>) -> Self {
        let component = component.into();
        let span: &'static Span = Box::leak(Box::new(tracing::info_span!(
            "app",
            component = %component,
            build_sha = %build_sha()
        )));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Retrieve the identifier of the operation currently executing, if any.
#[must_use]
pub fn current_operation_id() -> Option<String> {
    ACTIVE_OPERATION
        .try_with(|ctx| ctx.operation_id.as_ref().to_string())
        .ok()
}

/// Execute `fut` inside an `operation` span with the identifier available to nested code.
pub async fn with_operation_context<Fut, T>(
    operation_id: impl Into<String>,
    operation: &'static str,
    fut: Fut,
) -> T
where
    Fut: Future<Output = T>,
{
    let context = OperationContext {
        operation_id: Arc::from(operation_id.into()),
    };
    let span = tracing::info_span!(
        "operation",
        operation,
        operation_id = %context.operation_id
    );
    ACTIVE_OPERATION.scope(context, fut.instrument(span)).await
}

#[derive(Clone)]
struct OperationContext {
    operation_id: Arc<str>,
}

tokio::task_local! {
    static ACTIVE_OPERATION: OperationContext;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_context_guard_can_be_dropped() {
        let guard = GlobalContextGuard::new("test");
        drop(guard);
    }

    #[tokio::test]
    async fn operation_context_exposes_identifier() {
        let output = with_operation_context("op-42", "move", async {
            assert_eq!(current_operation_id().as_deref(), Some("op-42"));
            "done"
        })
        .await;
        assert_eq!(output, "done");
        assert!(current_operation_id().is_none());
    }
}
