//! Collapse overlapping async operations into one in-flight future.
//!
//! While an operation is running, further callers of [`SingleFlight::run`]
//! await the same shared future instead of starting their own. Once it
//! completes, the next call starts a fresh operation.

use std::future::Future;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

type InFlight<T> = Shared<BoxFuture<'static, T>>;

pub struct SingleFlight<T: Clone> {
    current: Mutex<Option<InFlight<T>>>,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// Join the in-flight operation, or start one with `make`.
    ///
    /// `make` is only called when nothing is in flight.
    pub async fn run<F, Fut>(&self, make: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let shared = {
            let mut current = self.current.lock().await;
            match current.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let fresh = make().boxed().shared();
                    *current = Some(fresh.clone());
                    fresh
                }
            }
        };

        let output = shared.clone().await;

        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|c| c.ptr_eq(&shared)) {
            *current = None;
        }
        output
    }

    /// Whether an operation is currently in flight.
    pub async fn is_running(&self) -> bool {
        self.current.lock().await.is_some()
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
