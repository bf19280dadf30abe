//! Shared context handed to every concurrent activity.
//!
//! One lock per logical group (world, target histories, engagement status)
//! instead of a single global lock. Nothing ever holds two of them at once.
//! Signals that only need to be noticed (shutdown, hit, kill) are atomics.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tankstrike_core::constants::WAIT_SLICE_MS;
use tankstrike_core::state::{EngagementState, OwnState};

use crate::tracker::TargetTracker;
use crate::world::WorldState;

/// Why a shutdown-aware wait returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Elapsed,
    Hit,
    Shutdown,
}

/// Process-wide tactical state.
pub struct TacticalContext {
    epoch: Instant,
    world: Mutex<WorldState>,
    /// Signalled whenever own state appears or shutdown is requested.
    own_known: Condvar,
    tracker: Mutex<TargetTracker>,
    engagement: Mutex<EngagementState>,
    shutdown: AtomicBool,
    hit_pending: AtomicBool,
    kill_pending: AtomicBool,
    malformed: AtomicU64,
}

impl Default for TacticalContext {
    fn default() -> Self {
        Self {
            epoch: Instant::now(),
            world: Mutex::new(WorldState::new()),
            own_known: Condvar::new(),
            tracker: Mutex::new(TargetTracker::new()),
            engagement: Mutex::new(EngagementState::default()),
            shutdown: AtomicBool::new(false),
            hit_pending: AtomicBool::new(false),
            kill_pending: AtomicBool::new(false),
            malformed: AtomicU64::new(0),
        }
    }
}

impl TacticalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the context was created (monotonic).
    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    // --- World ---

    pub fn world(&self) -> MutexGuard<'_, WorldState> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consistent copy of own state, taken under one lock.
    pub fn own_snapshot(&self) -> Option<OwnState> {
        self.world().own().cloned()
    }

    pub fn set_own(&self, own: OwnState) {
        self.world().set_own(own);
        self.own_known.notify_all();
    }

    pub fn clear_own(&self) {
        self.world().clear_own();
    }

    /// Park until own state is known, shutdown is requested, or `timeout`
    /// passes.
    pub fn wait_for_own(&self, timeout: Duration) -> Option<OwnState> {
        let guard = self.world();
        let (guard, _) = self
            .own_known
            .wait_timeout_while(guard, timeout, |w| {
                w.own().is_none() && !self.shutdown.load(Ordering::SeqCst)
            })
            .unwrap_or_else(PoisonError::into_inner);
        guard.own().cloned()
    }

    // --- Tracker ---

    pub fn tracker(&self) -> MutexGuard<'_, TargetTracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Engagement ---

    pub fn engagement_snapshot(&self) -> EngagementState {
        self.engagement
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn publish_engagement(&self, state: EngagementState) {
        *self.engagement.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    // --- Signals ---

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Take the lock so a waiter cannot miss the wakeup between its
        // predicate check and parking.
        let _world = self.world();
        self.own_known.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn raise_hit(&self) {
        self.hit_pending.store(true, Ordering::SeqCst);
    }

    pub fn hit_pending(&self) -> bool {
        self.hit_pending.load(Ordering::SeqCst)
    }

    /// Consume a pending hit notification.
    pub fn take_hit(&self) -> bool {
        self.hit_pending.swap(false, Ordering::SeqCst)
    }

    pub fn raise_kill(&self) {
        self.kill_pending.store(true, Ordering::SeqCst);
    }

    pub fn take_kill(&self) -> bool {
        self.kill_pending.swap(false, Ordering::SeqCst)
    }

    /// Count a dropped malformed message; returns the new total.
    pub fn note_malformed(&self) -> u64 {
        self.malformed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn malformed_count(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    // --- Waiting ---

    /// Sleep for `duration` in short slices; returns early on shutdown.
    pub fn pause(&self, duration: Duration) -> Wake {
        self.sliced_wait(duration, false)
    }

    /// Like [`pause`](Self::pause) but also returns early on a pending hit.
    /// The hit is left pending for the caller to consume.
    pub fn pause_unless_hit(&self, duration: Duration) -> Wake {
        self.sliced_wait(duration, true)
    }

    fn sliced_wait(&self, duration: Duration, wake_on_hit: bool) -> Wake {
        let deadline = Instant::now() + duration;
        let slice = Duration::from_millis(WAIT_SLICE_MS);
        loop {
            if self.is_shutdown() {
                return Wake::Shutdown;
            }
            if wake_on_hit && self.hit_pending() {
                return Wake::Hit;
            }
            let now = Instant::now();
            if now >= deadline {
                return Wake::Elapsed;
            }
            std::thread::sleep(slice.min(deadline - now));
        }
    }
}
