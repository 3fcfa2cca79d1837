// Omni Bridge - surface lifecycle bridge to an opaque native runtime
// Owns the engine/app handle pair, drives per-frame updates and validates
// the signal channel the runtime reports back on

// Module declarations
pub mod bridge;
pub mod config;
pub mod error;
pub mod handle;
pub mod lifecycle;
pub mod logging;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod signal;
pub mod telemetry;
pub mod testing;

// Re-exports for convenience
pub use bridge::SurfaceBridge;
pub use config::BridgeConfig;
pub use error::{ErrorCode, FatalError, RuntimeError};
pub use handle::{AppHandle, EngineHandle, HandleKind, HandlePair};
pub use lifecycle::{
    ForegroundGate, Lifecycle, LifecycleController, LifecycleSignal, LifecycleState,
};
pub use render::{ClearColor, FrameOutcome, FrameTarget, RenderDriver};
pub use runtime::{DemoRuntime, NativeRuntime};
pub use signal::{FatalLatch, SignalListener, SignalValidator};

/// JNI_OnLoad is called when the native library is loaded by Android
/// This function installs the logcat subscriber before any bridge exists
#[cfg(target_os = "android")]
#[no_mangle]
pub extern "system" fn JNI_OnLoad(
    _vm: jni::JavaVM,
    _reserved: *mut std::ffi::c_void,
) -> jni::sys::jint {
    logging::init_logging(tracing::Level::DEBUG);

    tracing::info!("JNI_OnLoad called - omni bridge library loaded");

    // Return JNI version
    jni::sys::JNI_VERSION_1_6
}
