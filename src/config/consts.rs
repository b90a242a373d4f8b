/// Events in flight per worker; the reorder window is workers times this factor
pub const DEFAULT_WINDOW_FACTOR: usize = 4;
/// Frames each ring buffer holds before producers block
pub const DEFAULT_RING_CAPACITY: usize = 64;
/// How often blocked ring-buffer operations re-check the abort signal
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
/// A second interrupt within this window forces the shutdown
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 2000;
/// Maximum nesting of conditional sub-paths
pub const DEFAULT_MAX_BRANCH_DEPTH: usize = 16;
/// Upper bound for the worker count - sanity limit
pub const MAX_PROCESSES: usize = 1024;
