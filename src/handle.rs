//! Owned wrappers around the opaque tokens issued by a native runtime.
//!
//! The bridge never interprets a token. It stores it, lends it to boundary
//! calls by reference and hands it back by value when the resource is
//! destroyed. Neither handle is `Copy` or `Clone`, so releasing one consumes
//! it and a double destroy does not compile.

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::runtime::NativeRuntime;

/// Which of the two chained resources a handle or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    Engine,
    App,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleKind::Engine => f.write_str("engine"),
            HandleKind::App => f.write_str("app"),
        }
    }
}

/// Token for a live native runtime instance.
#[derive(Debug, PartialEq, Eq)]
pub struct EngineHandle {
    raw: NonZeroU64,
}

impl EngineHandle {
    /// Wrap a token returned by the runtime. Zero is the null token.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(|raw| Self { raw })
    }

    /// Token value to pass across the boundary.
    pub fn raw(&self) -> u64 {
        self.raw.get()
    }

    /// Give up ownership of the token. Only destroy calls should use this.
    pub fn into_raw(self) -> u64 {
        let raw = self.raw.get();
        std::mem::forget(self);
        raw
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        tracing::warn!(raw = self.raw.get(), "engine handle dropped without release");
    }
}

/// Token for an application instance running on one engine.
///
/// Carries the token of the engine it was created on so the pair can be
/// checked before it is stored.
#[derive(Debug, PartialEq, Eq)]
pub struct AppHandle {
    raw: NonZeroU64,
    engine: NonZeroU64,
}

impl AppHandle {
    /// Wrap a token created on `engine`. Zero is the null token.
    pub fn from_raw(raw: u64, engine: &EngineHandle) -> Option<Self> {
        NonZeroU64::new(raw).map(|raw| Self {
            raw,
            engine: engine.raw,
        })
    }

    pub fn raw(&self) -> u64 {
        self.raw.get()
    }

    /// Token of the parent engine.
    pub fn engine_raw(&self) -> u64 {
        self.engine.get()
    }

    pub fn belongs_to(&self, engine: &EngineHandle) -> bool {
        self.engine == engine.raw
    }

    pub fn into_raw(self) -> u64 {
        let raw = self.raw.get();
        std::mem::forget(self);
        raw
    }
}

impl Drop for AppHandle {
    fn drop(&mut self) {
        tracing::warn!(raw = self.raw.get(), "app handle dropped without release");
    }
}

/// The engine and app created for one surface.
///
/// Holding the app only inside a pair keeps it from outliving its engine.
#[derive(Debug)]
pub struct HandlePair {
    engine: EngineHandle,
    app: AppHandle,
}

impl HandlePair {
    /// Pair an app with the engine it was created on.
    ///
    /// Returns both handles back when the app belongs to a different engine.
    pub fn new(
        engine: EngineHandle,
        app: AppHandle,
    ) -> Result<Self, (EngineHandle, AppHandle)> {
        if app.belongs_to(&engine) {
            Ok(Self { engine, app })
        } else {
            Err((engine, app))
        }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn app(&self) -> &AppHandle {
        &self.app
    }

    /// Destroy the app, then the engine.
    pub fn release(self, runtime: &dyn NativeRuntime) {
        let HandlePair { engine, app } = self;
        runtime.destroy_app(app);
        runtime.destroy_engine(engine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_null() {
        assert!(EngineHandle::from_raw(0).is_none());

        let engine = EngineHandle::from_raw(7).unwrap();
        assert!(AppHandle::from_raw(0, &engine).is_none());
        engine.into_raw();
    }

    #[test]
    fn test_app_records_parent_engine() {
        let engine = EngineHandle::from_raw(3).unwrap();
        let app = AppHandle::from_raw(9, &engine).unwrap();

        assert_eq!(app.raw(), 9);
        assert_eq!(app.engine_raw(), 3);
        assert!(app.belongs_to(&engine));

        app.into_raw();
        engine.into_raw();
    }

    #[test]
    fn test_pair_rejects_foreign_app() {
        let first = EngineHandle::from_raw(1).unwrap();
        let second = EngineHandle::from_raw(2).unwrap();
        let app = AppHandle::from_raw(10, &first).unwrap();

        let (engine, app) = HandlePair::new(second, app).unwrap_err();
        assert_eq!(engine.raw(), 2);
        assert_eq!(app.engine_raw(), 1);

        app.into_raw();
        engine.into_raw();
        first.into_raw();
    }

    #[test]
    fn test_into_raw_returns_token() {
        let engine = EngineHandle::from_raw(u64::MAX).unwrap();
        assert_eq!(engine.into_raw(), u64::MAX);
    }

    #[test]
    fn test_handle_kind_display() {
        assert_eq!(HandleKind::Engine.to_string(), "engine");
        assert_eq!(HandleKind::App.to_string(), "app");
    }
}
