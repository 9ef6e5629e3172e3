//! Numeric error codes
//!
//! Codes are grouped by the part of ocdc that failed:
//! - 1xxx: configuration
//! - 3xxx: persisted state and locking
//! - 4xxx: external processes (docker, git, tmux, gh)
//! - 8xxx: port allocation

pub struct ErrorCode;

impl ErrorCode {
    pub const CONFIG_INVALID: u16 = 1001;
    pub const CONFIG_NOT_FOUND: u16 = 1002;

    pub const STATE_IO: u16 = 3001;
    pub const STATE_SERIALIZATION: u16 = 3002;
    pub const LOCK_FAILED: u16 = 3010;
    pub const LOCK_TIMEOUT: u16 = 3011;

    pub const PROCESS_NOT_FOUND: u16 = 4001;
    pub const PROCESS_TIMEOUT: u16 = 4002;
    pub const PROCESS_SPAWN: u16 = 4003;
    pub const PROCESS_UNSCRIPTED: u16 = 4099;

    pub const PORT_RANGE_EXHAUSTED: u16 = 8001;
}

/// One-line description of a code, for `--help`-style listings and logs
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::CONFIG_INVALID => "Invalid configuration value",
        ErrorCode::CONFIG_NOT_FOUND => "Configuration file not found",
        ErrorCode::STATE_IO => "Could not read or write a state file",
        ErrorCode::STATE_SERIALIZATION => "Could not encode state as JSON",
        ErrorCode::LOCK_FAILED => "Could not create a lock directory",
        ErrorCode::LOCK_TIMEOUT => "Timed out waiting for a state lock",
        ErrorCode::PROCESS_NOT_FOUND => "External command not installed",
        ErrorCode::PROCESS_TIMEOUT => "External command timed out",
        ErrorCode::PROCESS_SPAWN => "External command could not be run",
        ErrorCode::PROCESS_UNSCRIPTED => "Unexpected command in a scripted run",
        ErrorCode::PORT_RANGE_EXHAUSTED => "No free port left in the configured range",
        _ => "Unknown error code",
    }
}
