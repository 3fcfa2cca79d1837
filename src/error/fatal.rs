// Fatal error types: failures with no degraded mode

use crate::error::ErrorCode;
use crate::handle::HandleKind;
use log::error;
use std::fmt;

/// Fatal error code constants shared with host shells
///
/// Error code range: 2001-2002
pub struct FatalErrorCodes {}

impl FatalErrorCodes {
    /// Engine or app handle could not be created
    pub const ALLOCATION_FAILED: i32 = 2001;

    /// The native runtime reported a signal below the high-water mark
    pub const SIGNAL_REGRESSION: i32 = 2002;

    /// Process exit status for allocation failures
    pub const ALLOCATION_FAILED_EXIT: i32 = 2;

    /// Process exit status for signal regressions
    pub const SIGNAL_REGRESSION_EXIT: i32 = 3;
}

/// Log a fatal error with structured context
pub fn log_fatal_error(err: &FatalError, context: &str) {
    error!(
        "Fatal error in {}: code={}, component={}, exit_status={}, message={}",
        context,
        err.code(),
        err.component(),
        err.exit_status(),
        err.message()
    );
}

/// Report a fatal error and terminate the process
///
/// Host adapters call this once a `FatalError` has propagated out of the
/// bridge. Library code never exits on its own.
pub fn fail_fast(err: &FatalError) -> ! {
    log_fatal_error(err, "fail_fast");
    std::process::exit(err.exit_status())
}

/// Errors that end the session
///
/// A half-initialized native runtime has no safe degraded mode, and a
/// regressing signal means the runtime broke its contract. Neither is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum FatalError {
    /// Engine or app handle allocation failed
    AllocationFailed { handle: HandleKind, reason: String },

    /// Signal value fell below the accepted maximum
    SignalRegression { value: f32, high_water_mark: f32 },
}

impl FatalError {
    /// Exit status the host process terminates with
    pub fn exit_status(&self) -> i32 {
        match self {
            FatalError::AllocationFailed { .. } => FatalErrorCodes::ALLOCATION_FAILED_EXIT,
            FatalError::SignalRegression { .. } => FatalErrorCodes::SIGNAL_REGRESSION_EXIT,
        }
    }

    fn component(&self) -> &'static str {
        match self {
            FatalError::AllocationFailed { .. } => "Lifecycle",
            FatalError::SignalRegression { .. } => "SignalValidator",
        }
    }
}

impl ErrorCode for FatalError {
    fn code(&self) -> i32 {
        match self {
            FatalError::AllocationFailed { .. } => FatalErrorCodes::ALLOCATION_FAILED,
            FatalError::SignalRegression { .. } => FatalErrorCodes::SIGNAL_REGRESSION,
        }
    }

    fn message(&self) -> String {
        match self {
            FatalError::AllocationFailed { handle, reason } => {
                format!("Failed to allocate {} handle: {}", handle, reason)
            }
            FatalError::SignalRegression {
                value,
                high_water_mark,
            } => format!(
                "Signal regressed: received {} below high-water mark {}",
                value, high_water_mark
            ),
        }
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FatalError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for FatalError {}
