//! Full cross-key snapshots on a schedule
//!
//! Two independent triggers share one execution routine:
//!
//! - write-triggered: `request_snapshot` schedules a snapshot `debounce`
//!   ahead, unless one is already scheduled or the last executed snapshot
//!   is younger than `cooldown` (the request is then dropped, not deferred)
//! - interval: once initialized, a snapshot runs every `interval`
//!   regardless of the write-triggered state
//!
//! Lifecycle events (`Hidden`, `Teardown`) snapshot immediately, ignoring
//! the cooldown. Nothing here owns a thread; `tick` is driven by
//! `SnapshotTimer` or by tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::record::{FullSnapshot, FULL_SNAPSHOT_SLOT};
use crate::clock::Clock;
use crate::config::settings::{BackupSettings, SnapshotSettings};
use crate::error::{JournalResult, LogFailure};
use crate::storage::SlotStore;

/// Timing and scope of full snapshots
#[derive(Debug, Clone)]
pub struct SnapshotPolicy {
    pub debounce: Duration,
    pub cooldown: Duration,
    pub interval: Duration,
    pub tracked_prefixes: Vec<String>,
}

impl SnapshotPolicy {
    pub fn from_settings(backup: &BackupSettings, snapshot: &SnapshotSettings) -> Self {
        Self {
            debounce: snapshot.debounce(),
            cooldown: snapshot.cooldown(),
            interval: snapshot.interval(),
            tracked_prefixes: backup.tracked_prefixes.clone(),
        }
    }
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        Self::from_settings(&BackupSettings::default(), &SnapshotSettings::default())
    }
}

/// Result of a write-triggered request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotRequest {
    /// A snapshot will run once the debounce delay has passed
    Scheduled,
    /// A snapshot was already pending; nothing changed
    AlreadyScheduled,
    /// The last snapshot is too recent; the request was dropped
    Suppressed,
}

/// Host lifecycle events that force a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The application lost visibility
    Hidden,
    /// The process is shutting down
    Teardown,
}

/// State of the write-triggered path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotPhase {
    Idle,
    Scheduled,
}

/// What a single `tick` did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// The pending write-triggered snapshot was due
    pub debounced: bool,
    /// The interval deadline had passed
    pub interval: bool,
    /// A snapshot was executed and written
    pub executed: bool,
}

/// Point-in-time view of the snapshotter
#[derive(Debug, Clone)]
pub struct SnapshotterStatus {
    pub phase: SnapshotPhase,
    pub initialized: bool,
    pub last_executed: Option<DateTime<Utc>>,
    pub next_interval: Option<DateTime<Utc>>,
    pub executions: u64,
}

#[derive(Debug, Default)]
struct SnapshotterState {
    /// Interval timer and lifecycle listeners are installed
    initialized: bool,
    /// Due time of the scheduled write-triggered snapshot
    pending_due: Option<DateTime<Utc>>,
    last_executed: Option<DateTime<Utc>>,
    next_interval: Option<DateTime<Utc>>,
    executions: u64,
    /// A `SnapshotTimer` thread is driving `tick`
    timer_attached: bool,
}

pub struct ScheduledSnapshotter {
    store: Arc<dyn SlotStore>,
    clock: Arc<dyn Clock>,
    policy: SnapshotPolicy,
    state: Mutex<SnapshotterState>,
}

impl ScheduledSnapshotter {
    pub fn new(store: Arc<dyn SlotStore>, clock: Arc<dyn Clock>, policy: SnapshotPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
            state: Mutex::new(SnapshotterState::default()),
        }
    }

    pub fn policy(&self) -> &SnapshotPolicy {
        &self.policy
    }

    /// Install the interval timer and lifecycle listeners
    ///
    /// Only the first call has an effect; returns whether it was this one.
    pub fn initialize(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.lock();
        if state.initialized {
            return false;
        }

        state.initialized = true;
        state.next_interval = Some(now + to_chrono(self.policy.interval));
        tracing::debug!(interval = ?self.policy.interval, "snapshot schedule installed");
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Claim the single timer slot, initializing first if needed
    ///
    /// Returns false while another timer holds it.
    pub(crate) fn attach_timer(&self) -> bool {
        self.initialize();
        let mut state = self.lock();
        if state.timer_attached {
            return false;
        }
        state.timer_attached = true;
        true
    }

    pub(crate) fn detach_timer(&self) {
        self.lock().timer_attached = false;
    }

    /// Write-triggered snapshot request
    pub fn request_snapshot(&self) -> SnapshotRequest {
        let now = self.clock.now();
        let mut state = self.lock();

        if state.pending_due.is_some() {
            return SnapshotRequest::AlreadyScheduled;
        }

        if let Some(last) = state.last_executed {
            if now - last < to_chrono(self.policy.cooldown) {
                tracing::trace!("snapshot request suppressed by cooldown");
                return SnapshotRequest::Suppressed;
            }
        }

        state.pending_due = Some(now + to_chrono(self.policy.debounce));
        SnapshotRequest::Scheduled
    }

    /// Run whatever is due
    pub fn tick(&self) -> TickOutcome {
        let now = self.clock.now();
        let mut outcome = TickOutcome::default();

        {
            let mut state = self.lock();

            if matches!(state.pending_due, Some(due) if now >= due) {
                state.pending_due = None;
                outcome.debounced = true;
            }

            if state.initialized {
                if let Some(next) = state.next_interval {
                    if now >= next {
                        state.next_interval = Some(advance_deadline(next, now, self.policy.interval));
                        outcome.interval = true;
                    }
                }
            }
        }

        // One execution serves both triggers
        if outcome.debounced || outcome.interval {
            outcome.executed = self.execute_snapshot().is_some();
        }

        outcome
    }

    /// Snapshot immediately for a lifecycle event, ignoring the cooldown
    ///
    /// Does nothing until `initialize` has installed the listeners.
    pub fn handle_lifecycle(&self, event: LifecycleEvent) -> Option<FullSnapshot> {
        if !self.is_initialized() {
            tracing::debug!(?event, "lifecycle event before initialization ignored");
            return None;
        }

        tracing::info!(?event, "lifecycle snapshot");
        self.execute_snapshot()
    }

    /// Capture every tracked slot and overwrite `latestFullBackup`
    ///
    /// Failures are logged; `None` means nothing was written.
    pub fn execute_snapshot(&self) -> Option<FullSnapshot> {
        let now = self.clock.now();
        let result = self.capture(now).and_then(|snapshot| {
            self.store.set(FULL_SNAPSHOT_SLOT, &snapshot.to_json()?)?;
            Ok(snapshot)
        });

        {
            let mut state = self.lock();
            state.last_executed = Some(now);
            state.executions += 1;
        }

        let snapshot = result.log_failure("write full snapshot")?;
        tracing::info!(slots = snapshot.slot_count(), "full snapshot written");
        Some(snapshot)
    }

    /// The stored full snapshot, if any
    pub fn latest_snapshot(&self) -> JournalResult<Option<FullSnapshot>> {
        match self.store.get(FULL_SNAPSHOT_SLOT)? {
            Some(raw) => Ok(Some(FullSnapshot::from_json(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn status(&self) -> SnapshotterStatus {
        let state = self.lock();
        SnapshotterStatus {
            phase: if state.pending_due.is_some() {
                SnapshotPhase::Scheduled
            } else {
                SnapshotPhase::Idle
            },
            initialized: state.initialized,
            last_executed: state.last_executed,
            next_interval: state.next_interval,
            executions: state.executions,
        }
    }

    /// Number of snapshot executions so far
    pub fn executions(&self) -> u64 {
        self.lock().executions
    }

    fn capture(&self, now: DateTime<Utc>) -> JournalResult<FullSnapshot> {
        let mut data = BTreeMap::new();

        for prefix in &self.policy.tracked_prefixes {
            for slot in self.store.keys_with_prefix(prefix)? {
                if slot == FULL_SNAPSHOT_SLOT || data.contains_key(&slot) {
                    continue;
                }
                // Slots can vanish between listing and reading
                if let Some(Some(raw)) = self
                    .store
                    .get(&slot)
                    .log_failure(&format!("read '{}' for snapshot", slot))
                {
                    data.insert(slot, raw);
                }
            }
        }

        Ok(FullSnapshot::capture(data, now))
    }

    fn lock(&self) -> MutexGuard<'_, SnapshotterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero())
}

/// First deadline strictly after `now`, in whole intervals from `next`
fn advance_deadline(next: DateTime<Utc>, now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    let step = to_chrono(interval).num_milliseconds().max(1);
    let behind = (now - next).num_milliseconds().max(0);
    next + chrono::Duration::milliseconds((behind / step + 1) * step)
}
