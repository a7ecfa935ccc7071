//! Owned timer tasks.
//!
//! A [`TimerHandle`] aborts its task when dropped, so whoever holds the
//! handle decides how long the timer may live. Replacing a handle stops the
//! old timer.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub(crate) struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Count down from `secs`, calling `on_tick` with the seconds left after
    /// every full second and `on_done` when the count reaches zero.
    pub(crate) fn countdown<T, D>(secs: u32, on_tick: T, on_done: D) -> Self
    where
        T: Fn(u32) + Send + 'static,
        D: FnOnce() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
            for remaining in (1..secs).rev() {
                ticker.tick().await;
                on_tick(remaining);
            }
            if secs > 0 {
                ticker.tick().await;
            }
            on_done();
        });

        Self { task }
    }

    /// Call `on_done` once after `delay`.
    pub(crate) fn delay<D>(delay: Duration, on_done: D) -> Self
    where
        D: FnOnce() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            time::sleep(delay).await;
            on_done();
        });

        Self { task }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
