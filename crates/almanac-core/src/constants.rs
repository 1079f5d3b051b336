/// Length of the eager generation window applied when a specification is created.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Duration of an occurrence when the specification does not say otherwise.
pub const DEFAULT_DURATION_HOURS: i64 = 1;

/// Upper bound on instants produced by one expansion that has no other bound.
pub const DEFAULT_MAX_INSTANCES: u16 = 1000;

/// Zone context used when none is configured.
pub const DEFAULT_TIME_ZONE: &str = "UTC";
