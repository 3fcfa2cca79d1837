use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::error::{FatalError, RuntimeError};
use crate::handle::{AppHandle, EngineHandle, HandleKind};
use crate::render::{ClearColor, FrameTarget};
use crate::runtime::NativeRuntime;
use crate::signal::SignalListener;

/// One call across the native boundary, with the tokens involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum BoundaryCall {
    CreateEngine { engine: u64 },
    CreateApp { app: u64, engine: u64 },
    UpdateApp { app: u64 },
    DestroyApp { app: u64 },
    DestroyEngine { engine: u64 },
}

/// Shared, ordered log of boundary calls. Outlives the runtime it came from.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<BoundaryCall>>>,
}

impl CallLog {
    fn push(&self, call: BoundaryCall) {
        self.lock().push(call);
    }

    pub fn snapshot(&self) -> Vec<BoundaryCall> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<BoundaryCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runtime double that records calls instead of running anything.
///
/// Only successful calls are logged, so a failed `create_app` shows up as a
/// `CreateEngine` followed directly by the compensating `DestroyEngine`.
pub struct RecordingRuntime {
    log: CallLog,
    next_token: AtomicU64,
    fail_engine: AtomicBool,
    fail_app: AtomicBool,
    signals: Mutex<VecDeque<f32>>,
    listener: Mutex<Option<SignalListener>>,
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
            next_token: AtomicU64::new(1),
            fail_engine: AtomicBool::new(false),
            fail_app: AtomicBool::new(false),
            signals: Mutex::new(VecDeque::new()),
            listener: Mutex::new(None),
        }
    }

    /// Make the next `create_engine` fail.
    pub fn fail_next_engine(&self) {
        self.fail_engine.store(true, Ordering::SeqCst);
    }

    /// Make the next `create_app` fail.
    pub fn fail_next_app(&self) {
        self.fail_app.store(true, Ordering::SeqCst);
    }

    /// Queue values; each `update_app` reports the next one.
    pub fn script_signals(&self, values: impl IntoIterator<Item = f32>) {
        lock(&self.signals).extend(values);
    }

    /// Report a value the way an engine thread would, outside any update.
    ///
    /// Returns `None` when no engine has been created yet.
    pub fn emit(&self, value: f32) -> Option<Result<(), FatalError>> {
        let listener = lock(&self.listener).clone();
        listener.map(|listener| listener.on_signal(value))
    }

    /// Listener registered by the most recent `create_engine`.
    pub fn listener(&self) -> Option<SignalListener> {
        lock(&self.listener).clone()
    }

    pub fn calls(&self) -> Vec<BoundaryCall> {
        self.log.snapshot()
    }

    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn updates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, BoundaryCall::UpdateApp { .. }))
            .count()
    }

    fn issue_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for RecordingRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeRuntime for RecordingRuntime {
    fn create_engine(&self, listener: SignalListener) -> Result<EngineHandle, RuntimeError> {
        if self.fail_engine.swap(false, Ordering::SeqCst) {
            return Err(RuntimeError::AllocationRejected {
                handle: HandleKind::Engine,
                reason: "injected failure".to_string(),
            });
        }

        let raw = self.issue_token();
        *lock(&self.listener) = Some(listener);
        self.log.push(BoundaryCall::CreateEngine { engine: raw });
        EngineHandle::from_raw(raw).ok_or(RuntimeError::NullHandle {
            handle: HandleKind::Engine,
        })
    }

    fn create_app(&self, engine: &EngineHandle) -> Result<AppHandle, RuntimeError> {
        if self.fail_app.swap(false, Ordering::SeqCst) {
            return Err(RuntimeError::AllocationRejected {
                handle: HandleKind::App,
                reason: "injected failure".to_string(),
            });
        }

        let raw = self.issue_token();
        self.log.push(BoundaryCall::CreateApp {
            app: raw,
            engine: engine.raw(),
        });
        AppHandle::from_raw(raw, engine).ok_or(RuntimeError::NullHandle {
            handle: HandleKind::App,
        })
    }

    fn update_app(&self, app: &AppHandle) {
        self.log.push(BoundaryCall::UpdateApp { app: app.raw() });

        let next = lock(&self.signals).pop_front();
        if let Some(value) = next {
            let _ = self.emit(value);
        }
    }

    fn destroy_app(&self, app: AppHandle) {
        self.log.push(BoundaryCall::DestroyApp {
            app: app.into_raw(),
        });
    }

    fn destroy_engine(&self, engine: EngineHandle) {
        self.log.push(BoundaryCall::DestroyEngine {
            engine: engine.into_raw(),
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Frame target that remembers what it was cleared to.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    colors: Vec<ClearColor>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clears(&self) -> usize {
        self.colors.len()
    }

    pub fn last_color(&self) -> Option<ClearColor> {
        self.colors.last().copied()
    }
}

impl FrameTarget for RecordingTarget {
    fn clear(&mut self, color: ClearColor) {
        self.colors.push(color);
    }
}
