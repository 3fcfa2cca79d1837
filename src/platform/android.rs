//! JNI entry points for the Android shell.
//!
//! The Java side is a `GLSurfaceView.Renderer` plus its activity, declared on
//! `dev.omni.bridge.NativeBridge`:
//!
//! ```text
//! static native long nativeCreate();
//! static native long nativeController(long host);
//! static native void nativeSurfaceCreated(long host);   // GL thread
//! static native void nativeDrawFrame(long host);        // GL thread
//! static native void nativeDestroy(long host);          // GL thread
//! static native void nativeResume(long controller);     // UI thread
//! static native void nativePause(long controller);      // UI thread
//! static native void nativeReleaseController(long controller);
//! ```
//!
//! The host pointer is only ever dereferenced on the GL thread. The UI thread
//! gets its own controller pointer, which only touches atomics.
//!
//! Android calls `onResume` before the first `onSurfaceCreated`, when the
//! lifecycle still ignores resume. A [`ForegroundGate`] remembers whether the
//! activity is in the foreground, and the GL thread replays the resume once
//! the handles exist.

#![allow(non_snake_case)]

use std::sync::Arc;

use jni::objects::{JClass, JValue};
use jni::sys::jlong;
use jni::JNIEnv;

use crate::bridge::SurfaceBridge;
use crate::config::BridgeConfig;
use crate::error::{fail_fast, log_runtime_error, RuntimeError};
use crate::lifecycle::ForegroundGate;
use crate::render::{ClearColor, FrameTarget};
use crate::runtime::DemoRuntime;

const GLES20: &str = "android/opengl/GLES20";
const GL_COLOR_BUFFER_BIT: i32 = 0x0000_4000;

/// Frame target that clears through `android.opengl.GLES20` on the GL thread.
pub struct GlesTarget<'a, 'local> {
    env: &'a mut JNIEnv<'local>,
}

impl<'a, 'local> GlesTarget<'a, 'local> {
    pub fn new(env: &'a mut JNIEnv<'local>) -> Self {
        Self { env }
    }

    fn try_clear(&mut self, color: ClearColor) -> Result<(), RuntimeError> {
        self.env.call_static_method(
            GLES20,
            "glClearColor",
            "(FFFF)V",
            &[
                JValue::Float(color.r),
                JValue::Float(color.g),
                JValue::Float(color.b),
                JValue::Float(color.a),
            ],
        )?;
        self.env.call_static_method(
            GLES20,
            "glClear",
            "(I)V",
            &[JValue::Int(GL_COLOR_BUFFER_BIT)],
        )?;
        Ok(())
    }
}

impl FrameTarget for GlesTarget<'_, '_> {
    fn clear(&mut self, color: ClearColor) {
        if let Err(err) = self.try_clear(color) {
            log_runtime_error(&err, "gles_clear");
        }
    }
}

struct AndroidHost {
    bridge: SurfaceBridge<DemoRuntime>,
    gate: Arc<ForegroundGate>,
}

/// # Safety
/// `host` must come from `nativeCreate` and not have been destroyed.
unsafe fn host_mut<'a>(host: jlong) -> Option<&'a mut AndroidHost> {
    (host as *mut AndroidHost).as_mut()
}

/// # Safety
/// `control` must come from `nativeController` and not have been released.
unsafe fn gate_ref<'a>(control: jlong) -> Option<&'a ForegroundGate> {
    (control as *const Arc<ForegroundGate>)
        .as_ref()
        .map(|gate| gate.as_ref())
}

#[no_mangle]
pub extern "system" fn Java_dev_omni_bridge_NativeBridge_nativeCreate(
    _env: JNIEnv,
    _class: JClass,
) -> jlong {
    let config = BridgeConfig::load_android();
    let bridge = SurfaceBridge::new(DemoRuntime::new(config.demo.clone()), &config);
    let gate = Arc::new(ForegroundGate::new(bridge.controller()));
    tracing::info!("bridge created");

    Box::into_raw(Box::new(AndroidHost { bridge, gate })) as jlong
}

/// # Safety
/// Must be called before the GL thread starts using `host`.
#[no_mangle]
pub unsafe extern "system" fn Java_dev_omni_bridge_NativeBridge_nativeController(
    _env: JNIEnv,
    _class: JClass,
    host: jlong,
) -> jlong {
    match host_mut(host) {
        Some(host) => Box::into_raw(Box::new(Arc::clone(&host.gate))) as jlong,
        None => 0,
    }
}

/// # Safety
/// GL thread only; `host` from `nativeCreate`.
#[no_mangle]
pub unsafe extern "system" fn Java_dev_omni_bridge_NativeBridge_nativeSurfaceCreated(
    _env: JNIEnv,
    _class: JClass,
    host: jlong,
) {
    let Some(host) = host_mut(host) else {
        tracing::warn!("surface created without a host");
        return;
    };

    if let Err(err) = host.bridge.surface_created() {
        fail_fast(&err);
    }
    host.gate.surface_ready();
}

/// # Safety
/// GL thread only; `host` from `nativeCreate`.
#[no_mangle]
pub unsafe extern "system" fn Java_dev_omni_bridge_NativeBridge_nativeDrawFrame(
    mut env: JNIEnv,
    _class: JClass,
    host: jlong,
) {
    let Some(host) = host_mut(host) else {
        return;
    };

    let mut target = GlesTarget::new(&mut env);
    if let Err(err) = host.bridge.draw_frame(&mut target) {
        fail_fast(&err);
    }
}

/// # Safety
/// GL thread only; `host` from `nativeCreate`, unusable afterwards.
#[no_mangle]
pub unsafe extern "system" fn Java_dev_omni_bridge_NativeBridge_nativeDestroy(
    _env: JNIEnv,
    _class: JClass,
    host: jlong,
) {
    if host == 0 {
        return;
    }
    let mut host = Box::from_raw(host as *mut AndroidHost);
    if let Err(err) = host.bridge.terminate() {
        fail_fast(&err);
    }
    tracing::info!("bridge destroyed");
}

/// # Safety
/// `control` from `nativeController`.
#[no_mangle]
pub unsafe extern "system" fn Java_dev_omni_bridge_NativeBridge_nativeResume(
    _env: JNIEnv,
    _class: JClass,
    control: jlong,
) {
    if let Some(gate) = gate_ref(control) {
        gate.enter_foreground();
    }
}

/// # Safety
/// `control` from `nativeController`.
#[no_mangle]
pub unsafe extern "system" fn Java_dev_omni_bridge_NativeBridge_nativePause(
    _env: JNIEnv,
    _class: JClass,
    control: jlong,
) {
    if let Some(gate) = gate_ref(control) {
        gate.enter_background();
    }
}

/// # Safety
/// `control` from `nativeController`, unusable afterwards.
#[no_mangle]
pub unsafe extern "system" fn Java_dev_omni_bridge_NativeBridge_nativeReleaseController(
    _env: JNIEnv,
    _class: JClass,
    control: jlong,
) {
    if control != 0 {
        drop(Box::from_raw(control as *mut Arc<ForegroundGate>));
    }
}
