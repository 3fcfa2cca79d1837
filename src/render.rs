//! Per-frame driver: clears the surface and advances the app while running.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FatalError;
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::runtime::NativeRuntime;
use crate::signal::FatalLatch;
use crate::telemetry::TelemetryHub;

/// RGBA clear color, components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl From<[f32; 4]> for ClearColor {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// The drawable the platform hands the bridge each frame.
pub trait FrameTarget {
    fn clear(&mut self, color: ClearColor);
}

/// What a frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum FrameOutcome {
    /// The app was updated once.
    Updated,
    /// Only the clear happened.
    Idle { state: LifecycleState },
}

/// Drives the per-frame update for the lifecycle it is given.
pub struct RenderDriver {
    clear_color: ClearColor,
    latch: FatalLatch,
    telemetry: Arc<TelemetryHub>,
    report_interval: u64,
    frames_drawn: u64,
    updates_issued: u64,
}

impl RenderDriver {
    pub fn new(
        clear_color: ClearColor,
        report_interval: u64,
        latch: FatalLatch,
        telemetry: Arc<TelemetryHub>,
    ) -> Self {
        Self {
            clear_color,
            latch,
            telemetry,
            report_interval,
            frames_drawn: 0,
            updates_issued: 0,
        }
    }

    /// Draw one frame.
    ///
    /// The target is always cleared so the surface is never left undefined.
    /// The app is updated only when the lifecycle is `Running` and an app
    /// handle is live.
    ///
    /// # Errors
    /// Returns the latched fatal error if the callback channel tripped during
    /// or before this frame.
    pub fn draw_frame<R: NativeRuntime>(
        &mut self,
        lifecycle: &Lifecycle<R>,
        target: &mut dyn FrameTarget,
    ) -> Result<FrameOutcome, FatalError> {
        self.latch.check()?;

        target.clear(self.clear_color);
        self.frames_drawn += 1;

        let state = lifecycle.state();
        let outcome = match (state, lifecycle.app()) {
            (LifecycleState::Running, Some(app)) => {
                lifecycle.runtime().update_app(app);
                self.updates_issued += 1;
                FrameOutcome::Updated
            }
            (LifecycleState::Running, None) => {
                tracing::warn!("running without an app handle, skipping update");
                FrameOutcome::Idle { state }
            }
            _ => FrameOutcome::Idle { state },
        };

        if self.report_interval > 0 && self.frames_drawn % self.report_interval == 0 {
            self.telemetry
                .record_frames(self.frames_drawn, self.updates_issued);
        }

        self.latch.check()?;
        Ok(outcome)
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn updates_issued(&self) -> u64 {
        self.updates_issued
    }

    pub fn clear_color(&self) -> ClearColor {
        self.clear_color
    }
}
