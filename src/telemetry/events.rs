//! Telemetry event types describing bridge activity for logs, the CLI
//! summary and host-side diagnostics.

use serde::{Deserialize, Serialize};

use crate::handle::HandleKind;
use crate::lifecycle::{LifecycleSignal, LifecycleState};

/// What happened to an opaque handle at the boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HandleOp {
    Created,
    Destroyed,
}

/// Events covering lifecycle transitions, handle calls, signals and frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    /// A lifecycle input was applied. `from == to` means it was a no-op.
    Lifecycle {
        signal: LifecycleSignal,
        from: LifecycleState,
        to: LifecycleState,
        timestamp_ms: u64,
    },
    Handle {
        op: HandleOp,
        kind: HandleKind,
        raw: u64,
    },
    SignalAccepted {
        value: f32,
        high_water_mark: f32,
    },
    SignalRejected {
        value: f32,
        high_water_mark: f32,
    },
    /// Periodic frame counters, emitted every `frame_report_interval` frames.
    Frames {
        drawn: u64,
        updates: u64,
    },
    Fatal {
        code: i32,
        exit_status: i32,
    },
}
