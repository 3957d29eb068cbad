//! Validation bounds and operational caps.

/// Attendee count accepted for a booking.
pub const MIN_ATTENDEES: u32 = 1;
pub const MAX_ATTENDEES: u32 = 20;

/// Bookings may be placed at most this many days ahead.
pub const MAX_ADVANCE_DAYS: i64 = 30;

/// Same-day bookings must start at least this far in the future.
pub const SAME_DAY_LEAD_MINUTES: i64 = 15;

/// Booking duration accepted, in hours.
pub const MIN_DURATION_HOURS: f64 = 0.5;
pub const MAX_DURATION_HOURS: f64 = 4.0;

/// Occupancy simulator tick cadence.
pub const REFRESH_INTERVAL_SECS: u64 = 60;

/// Fraction of the gap to the time-of-day target closed per simulated minute.
pub const DRIFT_RATE_PER_MINUTE: f64 = 0.1;

/// Bound on the per-tick random jitter added to a location's head count.
pub const COUNT_JITTER: i64 = 5;

/// Relative jitter baked into the weekly pattern matrix at startup.
pub const PATTERN_JITTER: f64 = 0.1;

/// Ambient insights fire only between these hours (inclusive).
pub const INSIGHT_HOUR_START: u32 = 8;
pub const INSIGHT_HOUR_END: u32 = 22;

/// Chance that an eligible call produces an insight.
pub const INSIGHT_CHANCE: f64 = 0.15;

/// Per-session minimum interval between insights.
pub const INSIGHT_COOLDOWN_SECS: u64 = 5 * 60;

/// Throttle map is pruned once it grows past this many sessions.
pub const INSIGHT_MAP_PRUNE_THRESHOLD: usize = 100;

/// Throttle entries older than this are dropped during a prune.
pub const INSIGHT_PRUNE_AGE_SECS: u64 = 30 * 60;

/// Conversations idle longer than this are discarded.
pub const SESSION_IDLE_TIMEOUT_SECS: u64 = 30 * 60;

/// `recommended_time` scans this many hours ahead of the current hour.
pub const TIME_SCAN_HOURS: u32 = 12;

/// Longest accepted wire frame.
pub const MAX_LINE_LEN: usize = 64 * 1024;
