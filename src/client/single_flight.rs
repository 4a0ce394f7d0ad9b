//! Single-flight execution: the first caller starts the operation, everyone who
//! arrives while it runs awaits the same result.
//!
//! The slot is checked and filled under a mutex that is never held across an
//! await, so the decision to start is exclusive while the work itself runs
//! unlocked. The work runs on its own task: it finishes even when every waiter
//! is dropped, and the slot is emptied before any waiter observes the result, so
//! the next caller after completion starts a fresh cycle.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, error};

type Pending<T> = Shared<BoxFuture<'static, Option<T>>>;
type Slot<T> = Arc<Mutex<Option<Pending<T>>>>;

pub struct SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    slot: Slot<T>,
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T> fmt::Debug for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// Empties the slot when the task ends, also on panic or abort.
struct ClearOnDrop<T>(Slot<T>)
where
    T: Clone + Send + Sync + 'static;

impl<T> Drop for ClearOnDrop<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        lock(&self.0).take();
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an operation started through [`SingleFlight::run`] is unresolved.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// Runs `start()` unless an operation is already in flight, in which case the
    /// existing result is awaited and `start` is never called.
    ///
    /// Returns `None` if the operation panicked or its task was aborted.
    pub async fn run<F, Fut>(&self, start: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let pending = {
            let mut slot = lock(&self.slot);
            if let Some(pending) = slot.as_ref() {
                debug!("joining in-flight operation");
                pending.clone()
            } else {
                debug!("starting new operation");
                let work = start();
                let clear = ClearOnDrop(Arc::clone(&self.slot));
                let handle = tokio::spawn(async move {
                    let _clear = clear;
                    work.await
                });
                let pending = async move {
                    match handle.await {
                        Ok(value) => Some(value),
                        Err(err) => {
                            error!("single-flight task failed: {err}");
                            None
                        }
                    }
                }
                .boxed()
                .shared();
                *slot = Some(pending.clone());
                pending
            }
        };

        pending.await
    }
}
