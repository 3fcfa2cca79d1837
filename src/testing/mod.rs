//! Test doubles for the native boundary and the frame target.
//!
//! `RecordingRuntime` logs every boundary call in order and can be told to
//! fail allocations or to emit scripted signal values, which is what the
//! ordering and gating tests assert against.

mod recording;

pub use recording::{BoundaryCall, CallLog, RecordingRuntime, RecordingTarget};
