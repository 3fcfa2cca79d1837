//! Lifecycle state machine owning the engine and app handles.
//!
//! ```text
//! Uninitialized --surface_created--> SurfaceReady --resume--> Running
//!                                         ^                   |    ^
//!                                         |                 pause  resume
//!                      surface_created    |                   v    |
//!       (SurfaceReady|Running|Paused) ----+                  Paused
//!
//! any --terminate--> Terminated
//! ```
//!
//! Surface creation and termination run on the render context through
//! `&mut Lifecycle`, so a terminate can never overtake an in-flight creation.
//! Resume and pause come from the control context through a
//! [`LifecycleController`] and only flip the shared state.

mod controller;
mod foreground;
mod state;

use std::sync::Arc;

pub use controller::LifecycleController;
pub use foreground::ForegroundGate;
pub use state::{LifecycleSignal, LifecycleState};

use state::StateCell;

use crate::error::{log_runtime_error, ErrorCode, FatalError};
use crate::handle::{AppHandle, EngineHandle, HandleKind, HandlePair};
use crate::runtime::NativeRuntime;
use crate::signal::SignalListener;
use crate::telemetry::{HandleOp, TelemetryHub};

/// Owner of the handle pair and the state they are gated on.
pub struct Lifecycle<R: NativeRuntime> {
    runtime: R,
    handles: Option<HandlePair>,
    state: Arc<StateCell>,
    listener: SignalListener,
    telemetry: Arc<TelemetryHub>,
}

impl<R: NativeRuntime> Lifecycle<R> {
    pub fn new(runtime: R, listener: SignalListener, telemetry: Arc<TelemetryHub>) -> Self {
        Self {
            runtime,
            handles: None,
            state: Arc::new(StateCell::new(LifecycleState::Uninitialized)),
            listener,
            telemetry,
        }
    }

    /// Handle a surface-created event.
    ///
    /// Creates the engine and then the app. When handles are already live
    /// they are destroyed first (app, then engine), since a new surface
    /// invalidates them. Ignored after termination.
    ///
    /// # Errors
    /// `FatalError::AllocationFailed` when either creation fails. Whatever
    /// was created is destroyed again and the state falls back to
    /// `Uninitialized`.
    pub fn surface_created(&mut self) -> Result<(), FatalError> {
        let from = self.state.load();
        if from == LifecycleState::Terminated {
            self.ignore(LifecycleSignal::SurfaceCreated, from);
            return Ok(());
        }

        if let Some(previous) = self.handles.take() {
            tracing::info!(state = %from, "surface recreated, releasing previous handles");
            self.release(previous);
        }

        match self.create_pair() {
            Ok(pair) => {
                tracing::info!(
                    engine = pair.engine().raw(),
                    app = pair.app().raw(),
                    "handles created"
                );
                self.handles = Some(pair);
                self.state.store(LifecycleState::SurfaceReady);
                self.telemetry.record_lifecycle(
                    LifecycleSignal::SurfaceCreated,
                    from,
                    LifecycleState::SurfaceReady,
                );
                Ok(())
            }
            Err(err) => {
                self.state.store(LifecycleState::Uninitialized);
                self.telemetry.record_lifecycle(
                    LifecycleSignal::SurfaceCreated,
                    from,
                    LifecycleState::Uninitialized,
                );
                Err(err)
            }
        }
    }

    /// Tear down for good. Idempotent.
    pub fn terminate(&mut self) {
        let from = self.state.swap(LifecycleState::Terminated);
        if from == LifecycleState::Terminated {
            self.ignore(LifecycleSignal::Terminate, from);
            return;
        }

        if let Some(pair) = self.handles.take() {
            self.release(pair);
        }
        tracing::info!(%from, "lifecycle terminated");
        self.telemetry
            .record_lifecycle(LifecycleSignal::Terminate, from, LifecycleState::Terminated);
    }

    /// Render-context shorthand for [`LifecycleController::resume`].
    pub fn resume(&self) -> LifecycleState {
        self.controller().resume()
    }

    /// Render-context shorthand for [`LifecycleController::pause`].
    pub fn pause(&self) -> LifecycleState {
        self.controller().pause()
    }

    /// A handle for delivering resume/pause from another thread.
    pub fn controller(&self) -> LifecycleController {
        LifecycleController::new(Arc::clone(&self.state), Arc::clone(&self.telemetry))
    }

    pub fn state(&self) -> LifecycleState {
        self.state.load()
    }

    pub fn handles(&self) -> Option<&HandlePair> {
        self.handles.as_ref()
    }

    pub fn app(&self) -> Option<&AppHandle> {
        self.handles.as_ref().map(HandlePair::app)
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    fn create_pair(&self) -> Result<HandlePair, FatalError> {
        let engine = self
            .runtime
            .create_engine(self.listener.clone())
            .map_err(|err| {
                log_runtime_error(&err, "create_engine");
                FatalError::AllocationFailed {
                    handle: HandleKind::Engine,
                    reason: err.message(),
                }
            })?;
        self.telemetry
            .record_handle(HandleOp::Created, HandleKind::Engine, engine.raw());

        let app = match self.runtime.create_app(&engine) {
            Ok(app) => app,
            Err(err) => {
                log_runtime_error(&err, "create_app");
                self.destroy_engine(engine);
                return Err(FatalError::AllocationFailed {
                    handle: HandleKind::App,
                    reason: err.message(),
                });
            }
        };
        self.telemetry
            .record_handle(HandleOp::Created, HandleKind::App, app.raw());

        HandlePair::new(engine, app).map_err(|(engine, app)| {
            let reason = format!(
                "app {} was created on engine {}, expected engine {}",
                app.raw(),
                app.engine_raw(),
                engine.raw()
            );
            self.destroy_app(app);
            self.destroy_engine(engine);
            FatalError::AllocationFailed {
                handle: HandleKind::App,
                reason,
            }
        })
    }

    fn release(&self, pair: HandlePair) {
        let (engine_raw, app_raw) = (pair.engine().raw(), pair.app().raw());
        pair.release(&self.runtime);
        self.telemetry
            .record_handle(HandleOp::Destroyed, HandleKind::App, app_raw);
        self.telemetry
            .record_handle(HandleOp::Destroyed, HandleKind::Engine, engine_raw);
        tracing::info!(engine = engine_raw, app = app_raw, "handles released");
    }

    fn destroy_app(&self, app: AppHandle) {
        let raw = app.raw();
        self.runtime.destroy_app(app);
        self.telemetry
            .record_handle(HandleOp::Destroyed, HandleKind::App, raw);
    }

    fn destroy_engine(&self, engine: EngineHandle) {
        let raw = engine.raw();
        self.runtime.destroy_engine(engine);
        self.telemetry
            .record_handle(HandleOp::Destroyed, HandleKind::Engine, raw);
    }

    fn ignore(&self, signal: LifecycleSignal, state: LifecycleState) {
        tracing::debug!(?signal, %state, "lifecycle signal ignored");
        self.telemetry.record_lifecycle(signal, state, state);
    }
}

impl<R: NativeRuntime> Drop for Lifecycle<R> {
    fn drop(&mut self) {
        if self.handles.is_some() {
            self.terminate();
        }
    }
}
