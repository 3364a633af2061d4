//! Delayed callbacks grouped by submission.
//!
//! Post-upload stages have no backend signal of their own, so the controller
//! paces them with synthetic delays. Every scheduled callback belongs to the
//! group of its submission id; cancelling the group drops all of them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::state::SubmissionId;

/// Schedules delayed callbacks on the Tokio runtime, cancellable per id.
#[derive(Clone, Default)]
pub struct StageTimer {
    groups: Arc<Mutex<Groups>>,
}

#[derive(Default)]
struct Groups {
    live: HashMap<SubmissionId, CancellationToken>,
    /// Highest id passed to `cancel_all`. Ids only grow, so nothing at or
    /// below it can be scheduled again.
    retired_through: Option<SubmissionId>,
}

impl StageTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` after `delay` unless `cancel_all(id)` happens first.
    /// Ids that were already cancelled are ignored.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, delay: Duration, id: SubmissionId, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let token = {
            let mut groups = self.lock();
            if groups.retired_through.is_some_and(|retired| id <= retired) {
                log::trace!("timer for retired submission {id} ignored");
                return;
            }
            groups.live.entry(id).or_default().clone()
        };

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    log::trace!("timer for submission {id} cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    // A cancel racing the sleep still wins.
                    if !token.is_cancelled() {
                        callback();
                    }
                }
            }
        });
    }

    /// Cancel every pending callback of `id`. Unknown ids are ignored.
    pub fn cancel_all(&self, id: SubmissionId) {
        let mut groups = self.lock();
        groups.retired_through = groups.retired_through.max(Some(id));
        if let Some(token) = groups.live.remove(&id) {
            token.cancel();
        }
    }

    /// Number of submission ids that still have a live callback group.
    pub fn pending_groups(&self) -> usize {
        self.lock().live.len()
    }

    fn lock(&self) -> MutexGuard<'_, Groups> {
        self.groups.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for StageTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageTimer")
            .field("pending_groups", &self.pending_groups())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> usize) {
        let count = Arc::new(AtomicUsize::new(0));
        let read = {
            let count = count.clone();
            move || count.load(Ordering::SeqCst)
        };
        (count, read)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let timer = StageTimer::new();
        let id = SubmissionId::default().next();
        let (count, fired) = counter();

        timer.schedule(Duration::from_millis(500), id, move || {
            count.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(fired(), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_drops_only_that_group() {
        let timer = StageTimer::new();
        let first = SubmissionId::default().next();
        let second = first.next();
        let (count, fired) = counter();

        for id in [first, first, second] {
            let count = count.clone();
            timer.schedule(Duration::from_secs(1), id, move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(timer.pending_groups(), 2);

        timer.cancel_all(first);
        assert_eq!(timer.pending_groups(), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_unknown_or_twice_is_silent() {
        let timer = StageTimer::new();
        let id = SubmissionId::default().next();
        timer.cancel_all(id);
        timer.cancel_all(id);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(timer.pending_groups(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduling_after_cancel_never_fires() {
        let timer = StageTimer::new();
        let first = SubmissionId::default().next();
        let second = first.next();
        let (count, fired) = counter();

        timer.cancel_all(second);
        for id in [first, second] {
            let count = count.clone();
            timer.schedule(Duration::from_millis(10), id, move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(timer.pending_groups(), 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired(), 0);

        let third = second.next();
        timer.schedule(Duration::from_millis(10), third, move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired(), 1);
    }
}
