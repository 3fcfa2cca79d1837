//! Boundary contract with the native engine/application runtime.

use crate::error::RuntimeError;
use crate::handle::{AppHandle, EngineHandle};
use crate::signal::SignalListener;

mod demo;

pub use demo::DemoRuntime;

/// Trait implemented by native runtimes the bridge drives.
///
/// Every call is synchronous. The bridge guarantees the ordering: an app is
/// created only on a live engine, updated only while the lifecycle is
/// running, and destroyed before its engine. Destroy calls take the handle by
/// value; the runtime owns the token again once they return.
pub trait NativeRuntime: Send + Sync {
    /// Create the engine. `listener` is the engine's only way to report
    /// signals back to the host; it may be called from any thread.
    fn create_engine(&self, listener: SignalListener) -> Result<EngineHandle, RuntimeError>;

    fn create_app(&self, engine: &EngineHandle) -> Result<AppHandle, RuntimeError>;

    /// Advance the app by one frame.
    fn update_app(&self, app: &AppHandle);

    fn destroy_app(&self, app: AppHandle);

    fn destroy_engine(&self, engine: EngineHandle);
}
