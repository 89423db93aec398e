use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use rand::seq::SliceRandom;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Registry of per-attempt countdown tasks.
///
/// Each in-progress attempt owns at most one scheduled auto-submit task.
/// `start` is re-entrant (arming an attempt that already has a live timer
/// is a no-op) and `stop` is idempotent, so the delivery handlers can call
/// both without coordinating. A fired task removes its own entry.
#[derive(Clone, Default)]
pub(crate) struct AttemptTimers {
    inner: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl AttemptTimers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start<F, Fut>(&self, attempt_id: &str, fire_in: Duration, on_expire: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let mut timers = self.lock();
        if timers.get(attempt_id).map(|handle| !handle.is_finished()).unwrap_or(false) {
            return false;
        }

        let registry = self.clone();
        let owner = attempt_id.to_string();
        let handle = tokio::spawn(async move {
            sleep(fire_in).await;
            on_expire().await;
            registry.lock().remove(&owner);
        });

        timers.insert(attempt_id.to_string(), handle);
        true
    }

    pub(crate) fn stop(&self, attempt_id: &str) -> bool {
        let handle = self.lock().remove(attempt_id);
        match handle {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_armed(&self, attempt_id: &str) -> bool {
        self.lock().get(attempt_id).map(|handle| !handle.is_finished()).unwrap_or(false)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Uniform Fisher-Yates permutation of the paper. Fresh per page load:
/// the ordering is never persisted and grading does not depend on it.
pub(crate) fn shuffle_paper<T, R: Rng>(questions: &mut [T], rng: &mut R) {
    questions.shuffle(rng);
}
