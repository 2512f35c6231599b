// Best-effort teardown steps
//
// Every teardown step runs through `best_effort` so one failure never blocks
// the steps after it.

use crate::error::CleanupError;
use std::future::Future;

/// Runs a teardown step, logging and discarding its error.
///
/// Returns `Some(value)` on success and `None` when the step failed.
pub async fn best_effort<T, F>(step: &str, fut: F) -> Option<T>
where
    F: Future<Output = Result<T, CleanupError>>,
{
    match fut.await {
        Ok(value) => {
            tracing::debug!(step, "cleanup step done");
            Some(value)
        }
        Err(e) => {
            tracing::warn!(step, error = %e, "cleanup step failed, continuing");
            None
        }
    }
}
