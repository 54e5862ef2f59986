//! Join-all and race over spawned operations.
//!
//! Every future is spawned onto the tokio runtime before any is awaited, so
//! all requests are in flight at once. Dropping a `JoinHandle` leaves its
//! task running; only `CancelPolicy::Abort` stops siblings whose results are
//! no longer needed.

use std::future::Future;

use futures::future::try_join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

use crate::config::CancelPolicy;
use crate::error::{ClientError, OperationResult};

fn spawn_all<I, F, T>(operations: I) -> Vec<JoinHandle<OperationResult<T>>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = OperationResult<T>> + Send + 'static,
    T: Send + 'static,
{
    operations.into_iter().map(tokio::spawn).collect()
}

fn abort_all(handles: &[AbortHandle], reason: &str) {
    let mut aborted = 0;
    for handle in handles.iter().filter(|h| !h.is_finished()) {
        handle.abort();
        aborted += 1;
    }
    if aborted > 0 {
        debug!(aborted, reason, "aborted sibling requests");
    }
}

/// Run all operations concurrently and collect their values in input order.
///
/// Resolves with the first failure to occur (in completion order); no
/// partial list is ever returned.
pub async fn join_ordered<I, F, T>(operations: I, policy: CancelPolicy) -> OperationResult<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = OperationResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let handles = spawn_all(operations);
    let aborts: Vec<AbortHandle> = handles.iter().map(JoinHandle::abort_handle).collect();

    let joined = try_join_all(
        handles
            .into_iter()
            .map(|handle| async move { handle.await.unwrap_or_else(|e| Err(e.into())) }),
    )
    .await;

    if joined.is_err() && policy == CancelPolicy::Abort {
        abort_all(&aborts, "batch failed");
    }
    joined
}

/// Run all operations concurrently and resolve with the first success.
///
/// If every operation fails, resolves with the earliest failure. An empty
/// input is an `InvalidRequest`.
pub async fn first_success<I, F, T>(operations: I, policy: CancelPolicy) -> OperationResult<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = OperationResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let handles = spawn_all(operations);
    if handles.is_empty() {
        return Err(ClientError::InvalidRequest(
            "race needs at least one candidate".to_string(),
        ));
    }
    let aborts: Vec<AbortHandle> = handles.iter().map(JoinHandle::abort_handle).collect();
    let mut pending: FuturesUnordered<_> = handles.into_iter().collect();

    let mut first_error = None;
    while let Some(joined) = pending.next().await {
        match joined.unwrap_or_else(|e| Err(e.into())) {
            Ok(value) => {
                if policy == CancelPolicy::Abort {
                    abort_all(&aborts, "race decided");
                }
                return Ok(value);
            }
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    Err(first_error.unwrap_or_else(|| ClientError::Network("all candidates vanished".to_string())))
}
