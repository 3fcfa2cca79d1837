// Error types for the surface bridge
//
// Two families cross the native boundary: recoverable `RuntimeError`s reported
// by a `NativeRuntime`, and `FatalError`s that end the session. Both carry
// numeric codes so host shells can report them without parsing strings.

mod fatal;
mod runtime;

pub use fatal::{fail_fast, log_fatal_error, FatalError, FatalErrorCodes};
pub use runtime::{log_runtime_error, RuntimeError, RuntimeErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the FFI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleKind;

    #[test]
    fn test_error_code_trait_objects() {
        let runtime_err: &dyn ErrorCode = &RuntimeError::NullHandle {
            handle: HandleKind::Engine,
        };
        assert_eq!(runtime_err.code(), RuntimeErrorCodes::NULL_HANDLE);

        let fatal_err: &dyn ErrorCode = &FatalError::SignalRegression {
            value: 0.9,
            high_water_mark: 1.0,
        };
        assert_eq!(fatal_err.code(), FatalErrorCodes::SIGNAL_REGRESSION);
    }

    #[test]
    fn test_code_ranges_do_not_overlap() {
        let runtime_codes = [
            RuntimeErrorCodes::NULL_HANDLE,
            RuntimeErrorCodes::ALLOCATION_REJECTED,
            RuntimeErrorCodes::LOCK_POISONED,
            RuntimeErrorCodes::JNI,
        ];
        let fatal_codes = [
            FatalErrorCodes::ALLOCATION_FAILED,
            FatalErrorCodes::SIGNAL_REGRESSION,
        ];

        for code in runtime_codes {
            assert!((1001..=1004).contains(&code));
            assert!(!fatal_codes.contains(&code));
        }
        for code in fatal_codes {
            assert!((2001..=2002).contains(&code));
        }
    }
}
