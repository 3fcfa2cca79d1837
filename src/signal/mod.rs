//! Native-to-host callback channel.
//!
//! The native runtime receives a [`SignalListener`] when an engine is created
//! and may call it from any thread. Every value goes through the
//! [`SignalValidator`], which enforces that accepted values never decrease.
//! A regression trips the validator and parks a [`FatalError`] in the
//! [`FatalLatch`], where the render context picks it up on its next entry.

mod validator;

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::FatalError;

pub use validator::SignalValidator;

/// Sticky slot for the first fatal error raised outside the render context.
#[derive(Clone, Default)]
pub struct FatalLatch {
    slot: Arc<Mutex<Option<FatalError>>>,
}

impl FatalLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `err` unless an earlier fatal error is already latched.
    pub fn raise(&self, err: FatalError) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    /// `Err` with the latched error, if any. The latch stays set.
    pub fn check(&self) -> Result<(), FatalError> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn is_raised(&self) -> bool {
        self.check().is_err()
    }
}

/// The registration target handed to `NativeRuntime::create_engine`.
///
/// Cheap to clone and safe to call from foreign threads.
#[derive(Clone)]
pub struct SignalListener {
    validator: Arc<SignalValidator>,
    latch: FatalLatch,
}

impl SignalListener {
    pub fn new(validator: Arc<SignalValidator>, latch: FatalLatch) -> Self {
        Self { validator, latch }
    }

    /// Deliver one signal value.
    ///
    /// Returns `Err` when the value regresses or the validator has already
    /// tripped. The runtime may ignore the result; the error is latched for
    /// the host either way.
    pub fn on_signal(&self, value: f32) -> Result<(), FatalError> {
        self.validator.validate(value).inspect_err(|err| {
            self.latch.raise(err.clone());
        })
    }

    pub fn high_water_mark(&self) -> f32 {
        self.validator.high_water_mark()
    }
}

impl std::fmt::Debug for SignalListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalListener")
            .field("high_water_mark", &self.validator.high_water_mark())
            .field("tripped", &self.validator.is_tripped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetryHub;

    fn listener() -> (SignalListener, FatalLatch) {
        let latch = FatalLatch::new();
        let validator = Arc::new(SignalValidator::new(0.0, Arc::new(TelemetryHub::default())));
        (SignalListener::new(validator, latch.clone()), latch)
    }

    #[test]
    fn test_regression_is_latched() {
        let (listener, latch) = listener();
        listener.on_signal(1.0).unwrap();
        assert!(latch.check().is_ok());

        let err = listener.on_signal(0.9).unwrap_err();
        assert_eq!(latch.check().unwrap_err(), err);
    }

    #[test]
    fn test_latch_keeps_first_error() {
        let latch = FatalLatch::new();
        latch.raise(FatalError::SignalRegression {
            value: 0.1,
            high_water_mark: 0.2,
        });
        latch.raise(FatalError::SignalRegression {
            value: 5.0,
            high_water_mark: 6.0,
        });

        assert_eq!(
            latch.check().unwrap_err(),
            FatalError::SignalRegression {
                value: 0.1,
                high_water_mark: 0.2,
            }
        );
    }

    #[test]
    fn test_clones_share_state() {
        let (listener, latch) = listener();
        let other = listener.clone();

        listener.on_signal(2.0).unwrap();
        assert_eq!(other.high_water_mark(), 2.0);

        assert!(other.on_signal(1.0).is_err());
        assert!(latch.is_raised());
    }

    #[test]
    fn test_listener_is_usable_from_other_threads() {
        let (listener, latch) = listener();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let listener = listener.clone();
                std::thread::spawn(move || {
                    for value in [0.5_f32, 1.0, 1.5] {
                        let _ = listener.on_signal(value);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Interleavings may regress; either way the mark only ever moved up.
        assert!(listener.high_water_mark() >= 0.5);
        if !latch.is_raised() {
            assert_eq!(listener.high_water_mark(), 1.5);
        }
    }
}
