use std::sync::Arc;

use crate::lifecycle::state::StateCell;
use crate::lifecycle::{LifecycleSignal, LifecycleState};
use crate::telemetry::TelemetryHub;

/// Control-context handle for foreground/background signals.
///
/// `resume` and `pause` never touch the handles; each is a single
/// compare-and-swap on the shared state that the render context sees on its
/// next frame. Signals without a transition from the current state are
/// no-ops.
#[derive(Clone)]
pub struct LifecycleController {
    state: Arc<StateCell>,
    telemetry: Arc<TelemetryHub>,
}

impl LifecycleController {
    pub(crate) fn new(state: Arc<StateCell>, telemetry: Arc<TelemetryHub>) -> Self {
        Self { state, telemetry }
    }

    /// `SurfaceReady | Paused -> Running`. Returns the resulting state.
    pub fn resume(&self) -> LifecycleState {
        for from in [LifecycleState::SurfaceReady, LifecycleState::Paused] {
            if self.state.transition(from, LifecycleState::Running) {
                tracing::info!(%from, "lifecycle resumed");
                self.telemetry
                    .record_lifecycle(LifecycleSignal::Resume, from, LifecycleState::Running);
                return LifecycleState::Running;
            }
        }
        self.ignore(LifecycleSignal::Resume)
    }

    /// `Running -> Paused`. Returns the resulting state.
    pub fn pause(&self) -> LifecycleState {
        if self
            .state
            .transition(LifecycleState::Running, LifecycleState::Paused)
        {
            tracing::info!("lifecycle paused");
            self.telemetry.record_lifecycle(
                LifecycleSignal::Pause,
                LifecycleState::Running,
                LifecycleState::Paused,
            );
            return LifecycleState::Paused;
        }
        self.ignore(LifecycleSignal::Pause)
    }

    pub fn state(&self) -> LifecycleState {
        self.state.load()
    }

    fn ignore(&self, signal: LifecycleSignal) -> LifecycleState {
        let current = self.state.load();
        tracing::debug!(?signal, state = %current, "lifecycle signal ignored");
        self.telemetry.record_lifecycle(signal, current, current);
        current
    }
}
