//! Background driver for the snapshotter
//!
//! A thread calls `ScheduledSnapshotter::tick` at a fixed tick rate until
//! the timer is stopped. Stopping cancels the loop, joins the thread, and
//! fires the teardown snapshot. At most one timer drives a snapshotter.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::record::FullSnapshot;
use super::snapshotter::{LifecycleEvent, ScheduledSnapshotter};

/// Running tick thread for a snapshotter
pub struct SnapshotTimer {
    snapshotter: Arc<ScheduledSnapshotter>,
    /// Dropping or sending on this ends the loop
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SnapshotTimer {
    /// Initialize the snapshotter and start ticking it every `tick_rate`
    ///
    /// Returns `None` if another timer is already driving `snapshotter`.
    pub fn start(snapshotter: Arc<ScheduledSnapshotter>, tick_rate: Duration) -> Option<Self> {
        if !snapshotter.attach_timer() {
            tracing::warn!("snapshot timer already running");
            return None;
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = {
            let snapshotter = Arc::clone(&snapshotter);
            thread::spawn(move || loop {
                match stop_rx.recv_timeout(tick_rate) {
                    Err(RecvTimeoutError::Timeout) => {
                        snapshotter.tick();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }
            })
        };

        tracing::debug!(?tick_rate, "snapshot timer started");
        Some(Self {
            snapshotter,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop ticking and take the teardown snapshot
    pub fn stop(mut self) -> Option<FullSnapshot> {
        self.shutdown();
        self.snapshotter.handle_lifecycle(LifecycleEvent::Teardown)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("snapshot timer thread panicked");
            }
            self.snapshotter.detach_timer();
            tracing::debug!("snapshot timer stopped");
        }
    }
}

impl Drop for SnapshotTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::snapshotter::SnapshotPolicy;
    use crate::clock::SystemClock;
    use crate::storage::{MemoryStore, SlotStore};

    fn fast_policy() -> SnapshotPolicy {
        SnapshotPolicy {
            debounce: Duration::from_millis(5),
            cooldown: Duration::from_millis(0),
            interval: Duration::from_millis(20),
            ..SnapshotPolicy::default()
        }
    }

    #[test]
    fn test_timer_runs_interval_and_teardown() {
        let store = Arc::new(MemoryStore::new());
        store.set("tradingJournalData_t", "[1]").unwrap();
        let snapshotter = Arc::new(ScheduledSnapshotter::new(
            store.clone(),
            Arc::new(SystemClock),
            fast_policy(),
        ));

        let timer = SnapshotTimer::start(snapshotter.clone(), Duration::from_millis(2)).unwrap();
        assert!(snapshotter.is_initialized());
        assert!(timer.is_running());

        thread::sleep(Duration::from_millis(150));

        let teardown = timer.stop().unwrap();
        assert_eq!(teardown.slot_count(), 1);
        // At least one interval snapshot plus the teardown one
        let after_stop = snapshotter.executions();
        assert!(after_stop >= 2);

        // Nothing ticks after stop
        thread::sleep(Duration::from_millis(60));
        assert_eq!(snapshotter.executions(), after_stop);
    }

    #[test]
    fn test_drop_stops_thread() {
        let store = Arc::new(MemoryStore::new());
        let snapshotter = Arc::new(ScheduledSnapshotter::new(
            store,
            Arc::new(SystemClock),
            fast_policy(),
        ));

        {
            let _timer = SnapshotTimer::start(snapshotter.clone(), Duration::from_millis(2)).unwrap();
        }
        let after_drop = snapshotter.executions();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(snapshotter.executions(), after_drop);
    }

    #[test]
    fn test_second_timer_is_refused() {
        let store = Arc::new(MemoryStore::new());
        let snapshotter = Arc::new(ScheduledSnapshotter::new(
            store,
            Arc::new(SystemClock),
            fast_policy(),
        ));
        // An earlier initialize does not block the first timer
        snapshotter.initialize();

        let first = SnapshotTimer::start(snapshotter.clone(), Duration::from_millis(2)).unwrap();
        assert!(SnapshotTimer::start(snapshotter.clone(), Duration::from_millis(2)).is_none());

        first.stop();
        let again = SnapshotTimer::start(snapshotter.clone(), Duration::from_millis(2));
        assert!(again.is_some());
    }
}
