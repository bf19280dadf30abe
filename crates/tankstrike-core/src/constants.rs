//! Agent constants and tuning parameters.

// --- Protocol ---

/// Default game server port.
pub const DEFAULT_PORT: u16 = 8052;

/// Largest payload a frame can carry (the length field is one byte).
pub const MAX_PAYLOAD_LEN: usize = 255;

// --- Tracking ---

/// Samples older than this (relative to the newest) are useless for velocity.
pub const PREDICTION_HORIZON_SECS: f64 = 0.6;

/// Sample pairs closer together than this are duplicates, not motion.
pub const MIN_SAMPLE_DELTA_SECS: f64 = 0.01;

/// Hard cap on retained samples per target.
pub const MAX_TRACK_SAMPLES: usize = 32;

/// A target unseen for this long is evicted from the tracker.
pub const TRACK_EVICT_SECS: f64 = 5.0;

// --- Scanning ---

/// Enemy closer than this during any scan is an emergency.
pub const EMERGENCY_DISTANCE: f64 = 15.0;

/// Range within which a target is considered viable to fire upon.
pub const ENGAGEMENT_DISTANCE: f64 = 30.0;

/// Fast scans stop on a tank at or below this health.
pub const LOW_HEALTH_TARGET: i32 = 2;

/// Turret increment per full-scan step (degrees).
pub const FULL_SCAN_INCREMENT: f64 = 20.0;

/// Full-scan step count (18 * 20 = 360).
pub const FULL_SCAN_STEPS: usize = 18;

/// Wait after each full-scan step (milliseconds).
pub const FULL_SCAN_STEP_MS: u64 = 200;

/// Oscillation increment for fast scans (degrees).
pub const FAST_SCAN_INCREMENT: f64 = 15.0;

/// Fast-scan step count (reaches +/-60 degrees).
pub const FAST_SCAN_STEPS: usize = 8;

/// Wait after each fast-scan step (milliseconds).
pub const FAST_SCAN_STEP_MS: u64 = 100;

/// Steps spent holding on the remembered heading before widening.
pub const DIRECTED_HOLD_STEPS: usize = 4;

/// Oscillation increment for the directed-scan fallback sweep (degrees).
pub const DIRECTED_WIDE_INCREMENT: f64 = 45.0;

/// Fallback sweep step count (reaches 180 degrees).
pub const DIRECTED_WIDE_STEPS: usize = 7;

/// Wait after each directed-scan step (milliseconds).
pub const DIRECTED_SCAN_STEP_MS: u64 = 150;

/// A full scan runs on every Nth scanning cycle, fast scans in between.
pub const FULL_SCAN_EVERY: u64 = 3;

// --- Intercept ---

/// Effective projectile speed (units/s).
pub const PROJECTILE_SPEED: f64 = 20.0;

/// Predicted miss below which an aim point is accepted (units).
pub const ACCEPTABLE_MISS: f64 = 1.0;

/// Iteration cap for the lead solver.
pub const MAX_INTERCEPT_ITERATIONS: u32 = 10;

/// Consecutive growing-miss iterations that mark a solve as divergent.
pub const DIVERGENCE_STREAK: u32 = 3;

// --- Engagement ---

/// Fire when the turret is within this many degrees of the aim heading.
pub const FIRE_TOLERANCE_DEG: f64 = 10.0;

/// Fraction of the remaining distance covered per chase cycle.
pub const CHASE_FRACTION: f64 = 0.3;

/// Distance kept from the target while chasing.
pub const CHASE_STANDOFF: f64 = 8.0;

/// Chase moves shorter than this are not worth a command.
pub const MIN_MOVE_DISTANCE: f64 = 0.5;

/// Consecutive empty sweeps before a target counts as lost.
pub const TARGET_LOST_SWEEPS: u32 = 3;

/// Own health below this triggers a health pickup run.
pub const LOW_OWN_HEALTH: i32 = 3;

/// Health pickups farther than this are ignored.
pub const HEALTH_PICKUP_RANGE: f64 = 60.0;

/// Evasion turns to own heading plus a value in this range (degrees).
pub const EVADE_TURN_MIN: f64 = 210.0;
pub const EVADE_TURN_MAX: f64 = 330.0;

/// Evasion move distance range.
pub const EVADE_DISTANCE_MIN: f64 = 80.0;
pub const EVADE_DISTANCE_MAX: f64 = 120.0;

/// Pause after an evasive manoeuvre before scanning resumes (milliseconds).
pub const EVADE_PAUSE_MS: u64 = 1500;

/// Engagement cycle cadence (milliseconds).
pub const ENGAGEMENT_CYCLE_MS: u64 = 1000;

// --- Reposition ---

/// Reposition loop cadence (milliseconds).
pub const REPOSITION_INTERVAL_MS: u64 = 2000;

/// Waypoints closer than this count as reached.
pub const WAYPOINT_ARRIVAL_DISTANCE: f64 = 5.0;

/// Default waypoints (the classic camp points).
pub const DEFAULT_WAYPOINTS: [(f64, f64); 2] = [(0.0, 100.0), (0.0, -100.0)];

// --- Threads ---

/// Slice used by shutdown-aware waits (milliseconds).
pub const WAIT_SLICE_MS: u64 = 25;

/// Socket read timeout so the reader can observe shutdown (milliseconds).
pub const READ_TIMEOUT_MS: u64 = 200;
