//! Derived views over watch channels
//!
//! A view is a value recomputed from its sources whenever one of its triggers
//! fires. The receiver handed out already holds a computed value; the
//! background task ends once every receiver is dropped or every trigger's
//! sender is gone.

use std::sync::Arc;

use futures_util::future::{select_all, BoxFuture};
use tokio::sync::watch;

use super::{RepositoryError, Result};

/// Something that signals "recompute"
pub(crate) trait Trigger: Send + 'static {
    /// Resolves on the next change; `false` when the source has closed
    fn changed(&mut self) -> BoxFuture<'_, bool>;

    /// Consume any pending change
    fn mark_seen(&mut self);
}

impl<T: Send + Sync + 'static> Trigger for watch::Receiver<T> {
    fn changed(&mut self) -> BoxFuture<'_, bool> {
        Box::pin(async move { watch::Receiver::changed(self).await.is_ok() })
    }

    fn mark_seen(&mut self) {
        self.borrow_and_update();
    }
}

pub(crate) fn trigger<T: Send + Sync + 'static>(rx: watch::Receiver<T>) -> Box<dyn Trigger> {
    Box::new(rx)
}

async fn compute_blocking<T, F>(compute: Arc<F>) -> Result<T>
where
    T: Send + 'static,
    F: Fn() -> Result<T> + Send + Sync + 'static,
{
    tokio::task::spawn_blocking(move || compute())
        .await
        .map_err(|e| RepositoryError::Task(e.to_string()))?
}

/// Compute a value now and keep it current as triggers fire.
///
/// A failed recompute is logged and the previous value stays published.
/// Receivers are only woken when the value actually changes.
pub(crate) async fn derive<T, F>(
    name: String,
    mut triggers: Vec<Box<dyn Trigger>>,
    compute: F,
) -> Result<watch::Receiver<T>>
where
    T: PartialEq + Send + Sync + 'static,
    F: Fn() -> Result<T> + Send + Sync + 'static,
{
    let compute = Arc::new(compute);

    for trigger in triggers.iter_mut() {
        trigger.mark_seen();
    }
    let initial = compute_blocking(Arc::clone(&compute)).await?;
    let (tx, rx) = watch::channel(initial);

    tokio::spawn(async move {
        log::debug!("view {}: started", name);
        while !triggers.is_empty() {
            let (alive, idx) = {
                let pending = triggers.iter_mut().map(|t| t.changed());
                tokio::select! {
                    _ = tx.closed() => break,
                    (alive, idx, _) = select_all(pending) => (alive, idx),
                }
            };

            if !alive {
                triggers.swap_remove(idx);
                continue;
            }
            for trigger in triggers.iter_mut() {
                trigger.mark_seen();
            }

            match compute_blocking(Arc::clone(&compute)).await {
                Ok(value) => {
                    tx.send_if_modified(|current| {
                        if *current == value {
                            false
                        } else {
                            *current = value;
                            true
                        }
                    });
                }
                Err(e) => log::warn!("view {}: recompute failed, keeping last value: {}", name, e),
            }
        }
        log::debug!("view {}: stopped", name);
    });

    Ok(rx)
}
