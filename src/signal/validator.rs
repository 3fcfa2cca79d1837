use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{log_fatal_error, FatalError};
use crate::telemetry::TelemetryHub;

struct ValidatorState {
    high_water_mark: f32,
    accepted: u64,
    tripped: Option<FatalError>,
}

/// Monotonic validator for values reported by the native runtime.
///
/// A value is accepted when it is greater than or equal to the high-water
/// mark. Anything else (NaN included) trips the validator for the rest of
/// the session: the regression is reported once and every later value is
/// answered with the same error without being examined.
pub struct SignalValidator {
    state: Mutex<ValidatorState>,
    telemetry: Arc<TelemetryHub>,
}

impl SignalValidator {
    pub fn new(initial_high_water_mark: f32, telemetry: Arc<TelemetryHub>) -> Self {
        Self {
            state: Mutex::new(ValidatorState {
                high_water_mark: initial_high_water_mark,
                accepted: 0,
                tripped: None,
            }),
            telemetry,
        }
    }

    /// Check one value and advance the high-water mark.
    ///
    /// The comparison and the update happen under a single lock so concurrent
    /// callers observe a total order.
    pub fn validate(&self, value: f32) -> Result<(), FatalError> {
        let mut state = self.lock_state();

        if let Some(err) = &state.tripped {
            tracing::debug!(value, "signal ignored, validator already tripped");
            return Err(err.clone());
        }

        if value >= state.high_water_mark {
            state.high_water_mark = value;
            state.accepted += 1;
            tracing::info!(value, "signal accepted");
            self.telemetry.record_signal_accepted(value, value);
            return Ok(());
        }

        let high_water_mark = state.high_water_mark;
        let err = FatalError::SignalRegression {
            value,
            high_water_mark,
        };
        tracing::error!(value, high_water_mark, "signal regressed below high-water mark");
        log_fatal_error(&err, "signal_validator");
        self.telemetry.record_signal_rejected(value, high_water_mark);
        state.tripped = Some(err.clone());
        Err(err)
    }

    pub fn high_water_mark(&self) -> f32 {
        self.lock_state().high_water_mark
    }

    /// Number of values accepted so far.
    pub fn accepted_count(&self) -> u64 {
        self.lock_state().accepted
    }

    pub fn is_tripped(&self) -> bool {
        self.lock_state().tripped.is_some()
    }

    // A panic while holding the lock cannot leave the fields half-written.
    fn lock_state(&self) -> MutexGuard<'_, ValidatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
