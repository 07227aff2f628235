//! Bounded waits on collaborators.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{RendezvousError, Stage};

/// Wait for `fut` at `stage`, giving up after `limit` (if any) or when
/// `cancel` fires. A `None` output means the other end went away.
pub(crate) async fn bounded<T, F>(
    stage: Stage,
    fut: F,
    limit: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<T, RendezvousError>
where
    F: Future<Output = Option<T>>,
{
    let wait = async {
        match limit {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| RendezvousError::TimedOut(stage)),
            None => Ok(fut.await),
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RendezvousError::Cancelled(stage)),
        outcome = wait => outcome?.ok_or(RendezvousError::Closed(stage)),
    }
}
