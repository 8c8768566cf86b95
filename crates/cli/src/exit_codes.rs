//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, bad format)   |
//! | 3-9     | update           | Input, file and settings failures        |
//! | 40-49   | publish          | GitHub publish codes                     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use seriesmaster_io::IoError;
use seriesmaster_publish::PublishError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unsupported file extension.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Update (3-9)
// =============================================================================

/// Input batch rejected: required columns missing. The audit log was still
/// written and the master left untouched.
pub const EXIT_INPUT_REJECTED: u8 = 3;

/// Input, master or settings-referenced file could not be read.
pub const EXIT_READ: u8 = 4;

/// Master or audit file could not be written.
pub const EXIT_WRITE: u8 = 5;

/// Settings file or column schema invalid.
pub const EXIT_CONFIG: u8 = 6;

// =============================================================================
// Publish (40-49)
// =============================================================================

/// No GitHub token (flag, GITHUB_TOKEN, or saved login) or token refused.
pub const EXIT_PUBLISH_NOT_AUTH: u8 = 40;

/// GitHub answered with an error status or an unreadable body.
pub const EXIT_PUBLISH_HTTP: u8 = 41;

/// GitHub could not be reached.
pub const EXIT_PUBLISH_NETWORK: u8 = 42;

// =============================================================================
// Error mapping
// =============================================================================

/// Map a file I/O error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. } | IoError::SheetNotFound { .. } => EXIT_READ,
        IoError::Write { .. } => EXIT_WRITE,
        IoError::UnsupportedFormat(_) => EXIT_USAGE,
    }
}

/// Map a publish error to its exit code.
pub fn publish_exit_code(err: &PublishError) -> u8 {
    match err {
        PublishError::NotAuthenticated => EXIT_PUBLISH_NOT_AUTH,
        PublishError::Network(_) => EXIT_PUBLISH_NETWORK,
        PublishError::Http(..) | PublishError::Parse(_) | PublishError::Validation(_) => EXIT_PUBLISH_HTTP,
    }
}
