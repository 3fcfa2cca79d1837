//! Headless desktop host.
//!
//! Replays a scripted event sequence against a bridge. There is no window:
//! the frame target only remembers what it was cleared to. Resume and pause
//! go through a [`LifecycleController`] the same way a UI thread would
//! deliver them.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::bridge::SurfaceBridge;
use crate::error::FatalError;
use crate::lifecycle::{LifecycleController, LifecycleState};
use crate::render::{ClearColor, FrameTarget};
use crate::runtime::NativeRuntime;
use crate::telemetry::TelemetrySnapshot;

/// Frame target without a surface behind it.
#[derive(Debug, Default)]
pub struct HeadlessTarget {
    clears: u64,
    last: Option<ClearColor>,
}

impl HeadlessTarget {
    pub fn clears(&self) -> u64 {
        self.clears
    }

    pub fn last_color(&self) -> Option<ClearColor> {
        self.last
    }
}

impl FrameTarget for HeadlessTarget {
    fn clear(&mut self, color: ClearColor) {
        self.clears += 1;
        self.last = Some(color);
    }
}

/// One step of a host script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    SurfaceCreated,
    Resume,
    Pause,
    /// Draw this many frames.
    Frames(u32),
    Terminate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    UnknownEvent(String),
    BadFrameCount(String),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::UnknownEvent(token) => write!(f, "unknown host event '{}'", token),
            ScriptError::BadFrameCount(token) => write!(f, "invalid frame count in '{}'", token),
        }
    }
}

impl std::error::Error for ScriptError {}

impl FromStr for HostEvent {
    type Err = ScriptError;

    /// Accepts `created`, `resume`, `pause`, `terminate`, `frame` and `frame*N`.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "created" | "surface_created" => Ok(HostEvent::SurfaceCreated),
            "resume" => Ok(HostEvent::Resume),
            "pause" => Ok(HostEvent::Pause),
            "terminate" => Ok(HostEvent::Terminate),
            "frame" => Ok(HostEvent::Frames(1)),
            _ => match token.strip_prefix("frame*") {
                Some(count) => count
                    .parse()
                    .map(HostEvent::Frames)
                    .map_err(|_| ScriptError::BadFrameCount(token.to_string())),
                None => Err(ScriptError::UnknownEvent(token.to_string())),
            },
        }
    }
}

/// Parse a comma-separated script such as `created,resume,frame*3,terminate`.
pub fn parse_script(script: &str) -> Result<Vec<HostEvent>, ScriptError> {
    script
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(HostEvent::from_str)
        .collect()
}

/// Outcome of a scripted run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub events_applied: usize,
    pub frames_drawn: u64,
    pub updates_issued: u64,
    pub clears: u64,
    pub final_state: LifecycleState,
    pub high_water_mark: f32,
    pub signals_accepted: u64,
    pub fatal: Option<String>,
    pub exit_status: i32,
    pub telemetry: TelemetrySnapshot,
}

/// Drives a bridge from a script on the current thread.
pub struct DesktopHost<R: NativeRuntime> {
    bridge: SurfaceBridge<R>,
    controller: LifecycleController,
    target: HeadlessTarget,
    events_applied: usize,
}

impl<R: NativeRuntime> DesktopHost<R> {
    pub fn new(bridge: SurfaceBridge<R>) -> Self {
        let controller = bridge.controller();
        Self {
            bridge,
            controller,
            target: HeadlessTarget::default(),
            events_applied: 0,
        }
    }

    pub fn apply(&mut self, event: HostEvent) -> Result<(), FatalError> {
        tracing::debug!(?event, "host event");
        match event {
            HostEvent::SurfaceCreated => self.bridge.surface_created()?,
            HostEvent::Resume => {
                self.controller.resume();
            }
            HostEvent::Pause => {
                self.controller.pause();
            }
            HostEvent::Frames(count) => {
                for _ in 0..count {
                    self.bridge.draw_frame(&mut self.target)?;
                }
            }
            HostEvent::Terminate => self.bridge.terminate()?,
        }
        self.events_applied += 1;
        Ok(())
    }

    /// Apply events in order, stopping at the first fatal error.
    ///
    /// A regression latched after the last frame still fails the run.
    pub fn run(&mut self, events: &[HostEvent]) -> RunSummary {
        let fatal = events
            .iter()
            .try_for_each(|event| self.apply(*event))
            .and_then(|()| self.bridge.check_fatal())
            .err();
        if let Some(err) = &fatal {
            tracing::error!(%err, "scripted run stopped");
        }
        self.summary(fatal.as_ref())
    }

    pub fn summary(&self, fatal: Option<&FatalError>) -> RunSummary {
        RunSummary {
            events_applied: self.events_applied,
            frames_drawn: self.bridge.frames_drawn(),
            updates_issued: self.bridge.updates_issued(),
            clears: self.target.clears(),
            final_state: self.bridge.state(),
            high_water_mark: self.bridge.high_water_mark(),
            signals_accepted: self.bridge.validator().accepted_count(),
            fatal: fatal.map(ToString::to_string),
            exit_status: fatal.map(FatalError::exit_status).unwrap_or(0),
            telemetry: self.bridge.telemetry().snapshot(),
        }
    }

    pub fn bridge(&self) -> &SurfaceBridge<R> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut SurfaceBridge<R> {
        &mut self.bridge
    }
}
