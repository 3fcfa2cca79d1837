//! Render-context facade tying the lifecycle, render driver and callback
//! channel together for one session.
//!
//! A host adapter builds one `SurfaceBridge` per process, keeps it on the
//! render thread, and hands [`LifecycleController`]s to whichever thread
//! delivers foreground/background signals. Every fatal error surfaces as an
//! `Err` from a bridge method; the adapter decides how to terminate.

use std::sync::Arc;

use crate::config::BridgeConfig;
use crate::error::FatalError;
use crate::lifecycle::{Lifecycle, LifecycleController, LifecycleState};
use crate::render::{ClearColor, FrameOutcome, FrameTarget, RenderDriver};
use crate::runtime::NativeRuntime;
use crate::signal::{FatalLatch, SignalListener, SignalValidator};
use crate::telemetry::TelemetryHub;

pub struct SurfaceBridge<R: NativeRuntime> {
    lifecycle: Lifecycle<R>,
    driver: RenderDriver,
    validator: Arc<SignalValidator>,
    latch: FatalLatch,
    telemetry: Arc<TelemetryHub>,
}

impl<R: NativeRuntime> SurfaceBridge<R> {
    pub fn new(runtime: R, config: &BridgeConfig) -> Self {
        let telemetry = Arc::new(TelemetryHub::from_config(&config.telemetry));
        let latch = FatalLatch::new();
        let validator = Arc::new(SignalValidator::new(
            config.signal.initial_high_water_mark,
            Arc::clone(&telemetry),
        ));
        let listener = SignalListener::new(Arc::clone(&validator), latch.clone());

        Self {
            lifecycle: Lifecycle::new(runtime, listener, Arc::clone(&telemetry)),
            driver: RenderDriver::new(
                ClearColor::from(config.render.clear_color),
                config.telemetry.frame_report_interval,
                latch.clone(),
                Arc::clone(&telemetry),
            ),
            validator,
            latch,
            telemetry,
        }
    }

    /// Surface created (or re-created) by the platform.
    pub fn surface_created(&mut self) -> Result<(), FatalError> {
        self.latch.check().map_err(|err| self.report(err))?;
        self.lifecycle
            .surface_created()
            .map_err(|err| self.report(err))
    }

    /// Per-frame callback from the platform.
    pub fn draw_frame(&mut self, target: &mut dyn FrameTarget) -> Result<FrameOutcome, FatalError> {
        match self.driver.draw_frame(&self.lifecycle, target) {
            Ok(outcome) => Ok(outcome),
            Err(err) => Err(self.report(err)),
        }
    }

    pub fn resume(&self) -> LifecycleState {
        self.lifecycle.resume()
    }

    pub fn pause(&self) -> LifecycleState {
        self.lifecycle.pause()
    }

    /// Release the handles and refuse further lifecycle work. Idempotent.
    ///
    /// # Errors
    /// The latched fatal error, if the callback channel tripped at any point
    /// in the session. Handles are released either way.
    pub fn terminate(&mut self) -> Result<(), FatalError> {
        self.lifecycle.terminate();
        self.latch.check().map_err(|err| self.report(err))
    }

    pub fn controller(&self) -> LifecycleController {
        self.lifecycle.controller()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &Lifecycle<R> {
        &self.lifecycle
    }

    pub fn runtime(&self) -> &R {
        self.lifecycle.runtime()
    }

    pub fn high_water_mark(&self) -> f32 {
        self.validator.high_water_mark()
    }

    pub fn validator(&self) -> &SignalValidator {
        &self.validator
    }

    /// `Err` once the callback channel has tripped.
    pub fn check_fatal(&self) -> Result<(), FatalError> {
        self.latch.check()
    }

    pub fn telemetry(&self) -> &Arc<TelemetryHub> {
        &self.telemetry
    }

    pub fn frames_drawn(&self) -> u64 {
        self.driver.frames_drawn()
    }

    pub fn updates_issued(&self) -> u64 {
        self.driver.updates_issued()
    }

    fn report(&self, err: FatalError) -> FatalError {
        self.telemetry.record_fatal(&err);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleKind;
    use crate::telemetry::MetricEvent;
    use crate::testing::{RecordingRuntime, RecordingTarget};

    #[test]
    fn test_bridge_runs_a_session() {
        let mut bridge = SurfaceBridge::new(RecordingRuntime::new(), &BridgeConfig::default());
        let mut target = RecordingTarget::new();

        bridge.surface_created().unwrap();
        bridge.resume();
        for _ in 0..3 {
            bridge.draw_frame(&mut target).unwrap();
        }
        bridge.terminate().unwrap();

        assert_eq!(bridge.state(), LifecycleState::Terminated);
        assert_eq!(bridge.updates_issued(), 3);
        assert_eq!(bridge.runtime().calls().len(), 7);
    }

    #[test]
    fn test_regression_while_paused_fails_terminate() {
        let mut bridge = SurfaceBridge::new(RecordingRuntime::new(), &BridgeConfig::default());
        bridge.surface_created().unwrap();
        bridge.resume();
        bridge.pause();
        bridge.runtime().emit(1.0).unwrap().unwrap();
        assert!(bridge.runtime().emit(0.5).unwrap().is_err());

        let err = bridge.terminate().unwrap_err();
        assert_eq!(err.exit_status(), 3);
        assert_eq!(bridge.state(), LifecycleState::Terminated);
        assert_eq!(bridge.runtime().calls().len(), 4);
        assert!(bridge.terminate().is_err());
    }

    #[test]
    fn test_high_water_mark_survives_recreation() {
        let mut bridge = SurfaceBridge::new(RecordingRuntime::new(), &BridgeConfig::default());
        bridge.surface_created().unwrap();
        bridge.runtime().emit(2.0);

        bridge.surface_created().unwrap();
        assert_eq!(bridge.high_water_mark(), 2.0);

        // The new engine got the same channel.
        let result = bridge.runtime().emit(1.0).unwrap();
        assert!(result.is_err());
        assert!(bridge.check_fatal().is_err());
    }

    #[test]
    fn test_fatal_after_latch_blocks_surface_creation() {
        let mut bridge = SurfaceBridge::new(RecordingRuntime::new(), &BridgeConfig::default());
        bridge.surface_created().unwrap();
        bridge.runtime().emit(1.0);
        bridge.runtime().emit(0.0);

        assert!(bridge.surface_created().is_err());
        assert_eq!(bridge.runtime().calls().len(), 2);
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let mut bridge = SurfaceBridge::new(RecordingRuntime::new(), &BridgeConfig::default());
        bridge.runtime().fail_next_engine();

        let err = bridge.surface_created().unwrap_err();
        assert_eq!(err.exit_status(), 2);
        assert!(matches!(
            err,
            FatalError::AllocationFailed {
                handle: HandleKind::Engine,
                ..
            }
        ));
        assert!(bridge
            .telemetry()
            .snapshot()
            .recent
            .iter()
            .any(|event| matches!(event, MetricEvent::Fatal { .. })));
    }

    #[test]
    fn test_initial_high_water_mark_comes_from_config() {
        let mut config = BridgeConfig::default();
        config.signal.initial_high_water_mark = 5.0;
        let mut bridge = SurfaceBridge::new(RecordingRuntime::new(), &config);
        bridge.surface_created().unwrap();

        assert_eq!(bridge.high_water_mark(), 5.0);
        assert!(bridge.runtime().emit(4.0).unwrap().is_err());
    }
}
