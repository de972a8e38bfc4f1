//! Process exit codes.

pub const SUCCESS: i32 = 0;
/// Notification rejected for a client-class reason (missing id, bad signature).
pub const CLIENT_ERROR: i32 = 1;
/// Certificate unavailable, configuration error, or any other internal failure.
pub const SERVER_ERROR: i32 = 2;
