//! Timer-driven sync scheduling.
//!
//! Cooperative and deadline-based: nothing here spawns threads or sleeps.
//! The embedder calls [`Scheduler::tick`] with the current time (using
//! [`Scheduler::next_deadline`] to sleep precisely between calls); tests
//! drive ticks with a manual clock. At most one cycle is ever in flight;
//! a trigger landing while one runs is dropped, not queued, and the
//! pending-changes flag carries the work to the next deadline.

use crate::engine::SyncStats;
use crate::error::SyncResult;
use crate::events::{EventSink, SyncEvent};
use parking_lot::Mutex;
use snipsync_store::{settings, Store};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Millisecond clock source.
pub trait Clock: Send + Sync {
    /// Current time, milliseconds since epoch.
    fn now_ms(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Runs one sync cycle.
///
/// The scheduler never talks to a transport directly; it fires whatever
/// runner it was given, so tests schedule against a fake and production
/// uses [`crate::engine::HttpRunner`].
pub trait CycleRunner: Send + Sync {
    /// Executes one push-then-pull cycle.
    fn run_cycle(&self) -> SyncResult<SyncStats>;
}

#[derive(Debug, Default)]
struct SchedulerState {
    running: bool,
    has_pending_changes: bool,
    debounce_delay_ms: i64,
    idle_interval_ms: i64,
    debounce_deadline: Option<i64>,
    idle_deadline: Option<i64>,
}

/// The auto-sync scheduler.
///
/// States are `idle` and `syncing`. Local edits call
/// [`Scheduler::notify_change`], which arms a debounce deadline; an
/// independent idle deadline sweeps up changes whose debounce was starved
/// or that happened while sync was unconfigured.
pub struct Scheduler<R: CycleRunner, S: EventSink, C: Clock> {
    store: Store,
    runner: R,
    sink: S,
    clock: C,
    state: Mutex<SchedulerState>,
    syncing: AtomicBool,
}

impl<R: CycleRunner, S: EventSink, C: Clock> Scheduler<R, S, C> {
    /// Creates a stopped scheduler; call [`Scheduler::start`] to arm it.
    pub fn new(store: Store, runner: R, sink: S, clock: C) -> Self {
        Self {
            store,
            runner,
            sink,
            clock,
            state: Mutex::new(SchedulerState::default()),
            syncing: AtomicBool::new(false),
        }
    }

    /// Arms the scheduler from the current settings.
    ///
    /// A no-op unless sync is fully configured (server URL, credential and
    /// auto-sync all present). With `sync_on_startup` set, the first cycle
    /// is due immediately on the next tick.
    pub fn start(&self) -> SyncResult<()> {
        let snapshot = self.store.with_conn(settings::load)?;
        let mut state = self.state.lock();

        if !snapshot.is_configured() {
            debug!("sync not configured, scheduler stays stopped");
            state.running = false;
            state.debounce_deadline = None;
            state.idle_deadline = None;
            return Ok(());
        }

        let now = self.clock.now_ms();
        state.running = true;
        state.debounce_delay_ms = snapshot.debounce_delay_ms;
        state.idle_interval_ms = snapshot.idle_interval_ms;
        state.idle_deadline = Some(now + snapshot.idle_interval_ms);
        state.debounce_deadline = None;
        if snapshot.sync_on_startup {
            state.has_pending_changes = true;
            state.debounce_deadline = Some(now);
        }
        debug!(
            debounce_ms = snapshot.debounce_delay_ms,
            idle_ms = snapshot.idle_interval_ms,
            "scheduler started"
        );
        Ok(())
    }

    /// Disarms all deadlines. Pending changes survive a stop.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.running = false;
        state.debounce_deadline = None;
        state.idle_deadline = None;
        debug!("scheduler stopped");
    }

    /// Stop, then start again if still configured. Called after every
    /// settings mutation.
    pub fn restart(&self) -> SyncResult<()> {
        self.stop();
        self.start()
    }

    /// Records a local edit and (re)arms the debounce deadline.
    ///
    /// Rapid successive calls keep pushing the deadline out, so a burst of
    /// edits coalesces into one cycle.
    pub fn notify_change(&self) {
        let mut state = self.state.lock();
        state.has_pending_changes = true;
        if state.running {
            state.debounce_deadline = Some(self.clock.now_ms() + state.debounce_delay_ms);
        }
    }

    /// Cancels the debounce and syncs now if changes are pending.
    ///
    /// Called on window blur or application quit so buffered edits are not
    /// lost with the process.
    pub fn flush_sync(&self) {
        let should_run = {
            let mut state = self.state.lock();
            state.debounce_deadline = None;
            state.running && state.has_pending_changes
        };
        if should_run {
            self.run_cycle_now();
        }
    }

    /// The next instant at which [`Scheduler::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<i64> {
        let state = self.state.lock();
        if !state.running {
            return None;
        }
        match (state.debounce_deadline, state.idle_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Evaluates deadlines against `now`, running a cycle when one is due.
    pub fn tick(&self, now: i64) {
        let should_run = {
            let mut state = self.state.lock();
            if !state.running {
                return;
            }

            let mut due = false;
            if state.debounce_deadline.is_some_and(|deadline| now >= deadline) {
                state.debounce_deadline = None;
                due = true;
            }
            if state.idle_deadline.is_some_and(|deadline| now >= deadline) {
                state.idle_deadline = Some(now + state.idle_interval_ms);
                if state.has_pending_changes {
                    due = true;
                }
            }
            due
        };

        if should_run {
            self.run_cycle_now();
        }
    }

    /// Runs a cycle unless one is already in flight.
    ///
    /// The state lock is not held across the runner call; only the
    /// single-flight flag guards re-entry.
    fn run_cycle_now(&self) {
        if self.syncing.swap(true, Ordering::SeqCst) {
            debug!("cycle already in flight, trigger dropped");
            return;
        }

        self.sink.status_changed(SyncEvent::Syncing);
        let result = self.runner.run_cycle();

        {
            let mut state = self.state.lock();
            if state.running {
                state.idle_deadline = Some(self.clock.now_ms() + state.idle_interval_ms);
            }
            match result {
                Ok(stats) => {
                    state.has_pending_changes = false;
                    drop(state);
                    self.sink.status_changed(SyncEvent::Success { stats });
                }
                Err(err) => {
                    // Pending changes stay set; the idle deadline retries.
                    drop(state);
                    warn!(error = %err, "sync cycle failed");
                    self.sink
                        .status_changed(SyncEvent::Error {
                            message: err.to_string(),
                        });
                }
            }
        }

        self.syncing.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use std::sync::atomic::{AtomicI64, AtomicU32};
    use std::sync::{mpsc, Arc};

    #[derive(Clone, Default)]
    struct ManualClock(Arc<AtomicI64>);

    impl ManualClock {
        fn set(&self, now: i64) {
            self.0.store(now, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Clone, Default)]
    struct FakeRunner {
        calls: Arc<AtomicU32>,
        fail: Arc<AtomicBool>,
    }

    impl FakeRunner {
        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CycleRunner for FakeRunner {
        fn run_cycle(&self) -> SyncResult<SyncStats> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(SyncError::transport("connection refused"))
            } else {
                Ok(SyncStats {
                    last_sync_at: 1000,
                    ..Default::default()
                })
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<SyncEvent>>>);

    impl RecordingSink {
        fn events(&self) -> Vec<SyncEvent> {
            self.0.lock().clone()
        }
    }

    impl EventSink for RecordingSink {
        fn status_changed(&self, event: SyncEvent) {
            self.0.lock().push(event);
        }
    }

    fn configured_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                let mut snapshot = settings::load(conn)?;
                snapshot.server_url = Some("https://sync.example.com".into());
                snapshot.api_key = Some("sk-abc".into());
                snapshot.auto_sync = true;
                snapshot.sync_on_startup = false;
                snapshot.debounce_delay_ms = 3000;
                snapshot.idle_interval_ms = 60000;
                settings::save(conn, &snapshot)
            })
            .unwrap();
        store
    }

    fn scheduler(
        store: Store,
    ) -> (
        Scheduler<FakeRunner, RecordingSink, ManualClock>,
        FakeRunner,
        RecordingSink,
        ManualClock,
    ) {
        let runner = FakeRunner::default();
        let sink = RecordingSink::default();
        let clock = ManualClock::default();
        let scheduler = Scheduler::new(store, runner.clone(), sink.clone(), clock.clone());
        (scheduler, runner, sink, clock)
    }

    #[test]
    fn start_is_a_no_op_without_configuration() {
        let store = Store::open_in_memory().unwrap();
        let (scheduler, runner, _sink, _clock) = scheduler(store);

        scheduler.start().unwrap();
        assert_eq!(scheduler.next_deadline(), None);

        scheduler.notify_change();
        scheduler.tick(i64::MAX);
        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn burst_of_changes_coalesces_into_one_cycle() {
        let (scheduler, runner, _sink, clock) = scheduler(configured_store());
        scheduler.start().unwrap();

        clock.set(0);
        scheduler.notify_change();
        clock.set(1000);
        scheduler.notify_change();
        clock.set(2000);
        scheduler.notify_change();

        // Deadline was pushed out to 2000 + 3000.
        scheduler.tick(4999);
        assert_eq!(runner.calls(), 0);

        scheduler.tick(5000);
        assert_eq!(runner.calls(), 1);

        // The debounce is spent; ticking again runs nothing.
        scheduler.tick(5001);
        assert_eq!(runner.calls(), 1);
    }

    #[test]
    fn success_clears_pending_and_emits_event_pair() {
        let (scheduler, _runner, sink, clock) = scheduler(configured_store());
        scheduler.start().unwrap();

        clock.set(0);
        scheduler.notify_change();
        scheduler.tick(3000);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], SyncEvent::Syncing);
        assert!(matches!(&events[1], SyncEvent::Success { stats } if stats.last_sync_at == 1000));

        // Nothing pending anymore: the idle sweep finds no work.
        scheduler.tick(70000);
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn failure_keeps_pending_and_idle_deadline_retries() {
        let (scheduler, runner, sink, clock) = scheduler(configured_store());
        scheduler.start().unwrap();

        runner.fail.store(true, Ordering::SeqCst);
        clock.set(0);
        scheduler.notify_change();
        clock.set(3000);
        scheduler.tick(3000);
        assert_eq!(runner.calls(), 1);
        assert!(matches!(sink.events()[1], SyncEvent::Error { .. }));

        // Server recovers; the idle deadline re-armed at 3000 + 60000
        // picks the pending changes back up without a new notify.
        runner.fail.store(false, Ordering::SeqCst);
        clock.set(63000);
        scheduler.tick(63000);
        assert_eq!(runner.calls(), 2);
        assert!(matches!(sink.events()[3], SyncEvent::Success { .. }));
    }

    #[test]
    fn idle_deadline_rearms_without_pending_changes() {
        let (scheduler, runner, _sink, _clock) = scheduler(configured_store());
        scheduler.start().unwrap();

        assert_eq!(scheduler.next_deadline(), Some(60000));
        scheduler.tick(60000);
        assert_eq!(runner.calls(), 0);
        assert_eq!(scheduler.next_deadline(), Some(120000));
    }

    #[test]
    fn flush_cancels_debounce_and_runs_immediately() {
        let (scheduler, runner, _sink, clock) = scheduler(configured_store());
        scheduler.start().unwrap();

        clock.set(0);
        scheduler.notify_change();
        scheduler.flush_sync();
        assert_eq!(runner.calls(), 1);

        // The debounce deadline is gone.
        scheduler.tick(10000);
        assert_eq!(runner.calls(), 1);
    }

    #[test]
    fn flush_without_pending_changes_is_a_no_op() {
        let (scheduler, runner, _sink, _clock) = scheduler(configured_store());
        scheduler.start().unwrap();

        scheduler.flush_sync();
        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn sync_on_startup_schedules_an_immediate_cycle() {
        let store = configured_store();
        store
            .with_conn(|conn| {
                let mut snapshot = settings::load(conn)?;
                snapshot.sync_on_startup = true;
                settings::save(conn, &snapshot)
            })
            .unwrap();

        let (scheduler, runner, _sink, clock) = scheduler(store);
        clock.set(500);
        scheduler.start().unwrap();
        assert_eq!(scheduler.next_deadline(), Some(500));

        scheduler.tick(500);
        assert_eq!(runner.calls(), 1);
    }

    #[test]
    fn stop_disarms_but_keeps_pending_changes() {
        let (scheduler, runner, _sink, clock) = scheduler(configured_store());
        scheduler.start().unwrap();

        clock.set(0);
        scheduler.notify_change();
        scheduler.stop();
        assert_eq!(scheduler.next_deadline(), None);
        scheduler.tick(i64::MAX);
        assert_eq!(runner.calls(), 0);

        // Restart re-arms; the idle sweep finds the surviving changes.
        clock.set(10000);
        scheduler.restart().unwrap();
        scheduler.tick(70000);
        assert_eq!(runner.calls(), 1);
    }

    #[test]
    fn second_trigger_while_syncing_is_dropped() {
        struct BlockingRunner {
            started: mpsc::Sender<()>,
            release: Mutex<mpsc::Receiver<()>>,
            calls: AtomicU32,
        }

        impl CycleRunner for BlockingRunner {
            fn run_cycle(&self) -> SyncResult<SyncStats> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.started.send(()).ok();
                self.release.lock().recv().ok();
                Ok(SyncStats::default())
            }
        }

        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let runner = Arc::new(BlockingRunner {
            started: started_tx,
            release: Mutex::new(release_rx),
            calls: AtomicU32::new(0),
        });

        struct SharedRunner(Arc<BlockingRunner>);
        impl CycleRunner for SharedRunner {
            fn run_cycle(&self) -> SyncResult<SyncStats> {
                self.0.run_cycle()
            }
        }

        let scheduler = Arc::new(Scheduler::new(
            configured_store(),
            SharedRunner(Arc::clone(&runner)),
            RecordingSink::default(),
            ManualClock::default(),
        ));
        scheduler.start().unwrap();
        scheduler.notify_change();

        let background = {
            let scheduler = Arc::clone(&scheduler);
            std::thread::spawn(move || scheduler.flush_sync())
        };
        started_rx.recv().unwrap();

        // A trigger landing mid-cycle is dropped, not queued.
        scheduler.notify_change();
        scheduler.flush_sync();
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);

        release_tx.send(()).unwrap();
        background.join().unwrap();
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    }
}
