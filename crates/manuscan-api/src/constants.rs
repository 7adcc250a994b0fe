//! API constants

/// Versioned prefix for every API route
pub const API_PREFIX: &str = "/api/v0";

/// Callable email functions
pub const CALLABLE_PREFIX: &str = "/api/v0/callable";

/// Storage platform notifications
pub const EVENTS_PREFIX: &str = "/api/v0/events";
