// Native runtime error types and constants

use crate::error::ErrorCode;
use crate::handle::HandleKind;
use log::error;
use std::fmt;

/// Runtime error code constants shared with host shells
///
/// Error code range: 1001-1004
pub struct RuntimeErrorCodes {}

impl RuntimeErrorCodes {
    /// The runtime handed back a null token
    pub const NULL_HANDLE: i32 = 1001;

    /// The runtime refused to allocate the resource
    pub const ALLOCATION_REJECTED: i32 = 1002;

    /// Mutex guarding runtime state was poisoned
    pub const LOCK_POISONED: i32 = 1003;

    /// A call through JNI failed
    pub const JNI: i32 = 1004;
}

/// Log a runtime error with structured context
///
/// Emits the numeric code, the component and the message so the record can be
/// matched on the host side without string parsing.
pub fn log_runtime_error(err: &RuntimeError, context: &str) {
    error!(
        "Runtime error in {}: code={}, component=NativeRuntime, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors reported by a `NativeRuntime` implementation
///
/// These are not fatal on their own; the lifecycle decides whether a failure
/// during handle creation ends the session.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// The runtime returned a zero token
    NullHandle { handle: HandleKind },

    /// The runtime declined to create the resource
    AllocationRejected { handle: HandleKind, reason: String },

    /// Mutex was poisoned
    LockPoisoned { component: String },

    /// JNI call failed
    Jni { details: String },
}

impl ErrorCode for RuntimeError {
    fn code(&self) -> i32 {
        match self {
            RuntimeError::NullHandle { .. } => RuntimeErrorCodes::NULL_HANDLE,
            RuntimeError::AllocationRejected { .. } => RuntimeErrorCodes::ALLOCATION_REJECTED,
            RuntimeError::LockPoisoned { .. } => RuntimeErrorCodes::LOCK_POISONED,
            RuntimeError::Jni { .. } => RuntimeErrorCodes::JNI,
        }
    }

    fn message(&self) -> String {
        match self {
            RuntimeError::NullHandle { handle } => {
                format!("Runtime returned a null {} handle", handle)
            }
            RuntimeError::AllocationRejected { handle, reason } => {
                format!("Runtime rejected {} allocation: {}", handle, reason)
            }
            RuntimeError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            RuntimeError::Jni { details } => format!("JNI call failed: {}", details),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuntimeError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(target_os = "android")]
impl From<jni::errors::Error> for RuntimeError {
    fn from(err: jni::errors::Error) -> Self {
        RuntimeError::Jni {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_codes() {
        assert_eq!(
            RuntimeError::NullHandle {
                handle: HandleKind::App
            }
            .code(),
            1001
        );
        assert_eq!(
            RuntimeError::AllocationRejected {
                handle: HandleKind::Engine,
                reason: "test".to_string()
            }
            .code(),
            1002
        );
        assert_eq!(
            RuntimeError::LockPoisoned {
                component: "test".to_string()
            }
            .code(),
            1003
        );
        assert_eq!(
            RuntimeError::Jni {
                details: "test".to_string()
            }
            .code(),
            1004
        );
    }

    #[test]
    fn test_runtime_error_messages() {
        let err = RuntimeError::NullHandle {
            handle: HandleKind::Engine,
        };
        assert_eq!(err.message(), "Runtime returned a null engine handle");

        let err = RuntimeError::AllocationRejected {
            handle: HandleKind::App,
            reason: "budget exhausted".to_string(),
        };
        assert!(err.message().contains("app allocation"));
        assert!(err.message().contains("budget exhausted"));
    }

    #[test]
    fn test_runtime_error_display() {
        let err = RuntimeError::Jni {
            details: "no env".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("RuntimeError"));
        assert!(display.contains("1004"));
    }
}
