use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::DemoConfig;
use crate::error::RuntimeError;
use crate::handle::{AppHandle, EngineHandle, HandleKind};
use crate::runtime::NativeRuntime;
use crate::signal::SignalListener;

struct DemoEngine {
    listener: SignalListener,
}

struct DemoApp {
    engine: u64,
    value: f32,
}

/// In-process engine/app pair used by the desktop host and the Android shell.
///
/// Each engine keeps the listener it was created with. Each app advances a
/// counter by `signal_step` per update and reports the new value through its
/// engine's listener. Tokens come from a counter and are looked up in
/// registries, so a stale token is rejected instead of dereferenced.
pub struct DemoRuntime {
    config: DemoConfig,
    next_token: AtomicU64,
    engines_created: AtomicU64,
    engines: Mutex<HashMap<u64, DemoEngine>>,
    apps: Mutex<HashMap<u64, DemoApp>>,
}

impl DemoRuntime {
    pub fn new(config: DemoConfig) -> Self {
        Self {
            config,
            next_token: AtomicU64::new(1),
            engines_created: AtomicU64::new(0),
            engines: Mutex::new(HashMap::new()),
            apps: Mutex::new(HashMap::new()),
        }
    }

    pub fn live_engines(&self) -> usize {
        read_registry(&self.engines).len()
    }

    pub fn live_apps(&self) -> usize {
        read_registry(&self.apps).len()
    }

    /// Current counter of the app behind `raw`, if it is live.
    pub fn app_value(&self, raw: u64) -> Option<f32> {
        self.lock_apps()
            .ok()
            .and_then(|apps| apps.get(&raw).map(|app| app.value))
    }

    fn issue_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed)
    }

    fn lock_engines(&self) -> Result<MutexGuard<'_, HashMap<u64, DemoEngine>>, RuntimeError> {
        self.engines.lock().map_err(|_| RuntimeError::LockPoisoned {
            component: "demo_engines".to_string(),
        })
    }

    fn lock_apps(&self) -> Result<MutexGuard<'_, HashMap<u64, DemoApp>>, RuntimeError> {
        self.apps.lock().map_err(|_| RuntimeError::LockPoisoned {
            component: "demo_apps".to_string(),
        })
    }

    /// Step the app and return its engine's listener with the new value.
    fn step(&self, app: u64) -> Result<Option<(SignalListener, f32)>, RuntimeError> {
        let (engine, value) = {
            let mut apps = self.lock_apps()?;
            let Some(state) = apps.get_mut(&app) else {
                return Ok(None);
            };
            state.value += self.config.signal_step;
            (state.engine, state.value)
        };

        let engines = self.lock_engines()?;
        Ok(engines
            .get(&engine)
            .map(|engine| (engine.listener.clone(), value)))
    }
}

impl Default for DemoRuntime {
    fn default() -> Self {
        Self::new(DemoConfig::default())
    }
}

impl NativeRuntime for DemoRuntime {
    fn create_engine(&self, listener: SignalListener) -> Result<EngineHandle, RuntimeError> {
        if let Some(budget) = self.config.engine_budget {
            if self.engines_created.load(Ordering::Relaxed) >= u64::from(budget) {
                return Err(RuntimeError::AllocationRejected {
                    handle: HandleKind::Engine,
                    reason: format!("engine budget of {} exhausted", budget),
                });
            }
        }

        let raw = self.issue_token();
        self.lock_engines()?.insert(raw, DemoEngine { listener });
        self.engines_created.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(engine = raw, "demo engine created");

        EngineHandle::from_raw(raw).ok_or(RuntimeError::NullHandle {
            handle: HandleKind::Engine,
        })
    }

    fn create_app(&self, engine: &EngineHandle) -> Result<AppHandle, RuntimeError> {
        if !self.lock_engines()?.contains_key(&engine.raw()) {
            return Err(RuntimeError::AllocationRejected {
                handle: HandleKind::App,
                reason: format!("engine {} is not live", engine.raw()),
            });
        }

        let raw = self.issue_token();
        self.lock_apps()?.insert(
            raw,
            DemoApp {
                engine: engine.raw(),
                value: 0.0,
            },
        );
        tracing::debug!(app = raw, engine = engine.raw(), "demo app created");

        AppHandle::from_raw(raw, engine).ok_or(RuntimeError::NullHandle {
            handle: HandleKind::App,
        })
    }

    fn update_app(&self, app: &AppHandle) {
        match self.step(app.raw()) {
            Ok(Some((listener, value))) => {
                // The listener latches regressions for the host; nothing to do here.
                if listener.on_signal(value).is_err() {
                    tracing::debug!(app = app.raw(), value, "demo signal rejected");
                }
            }
            Ok(None) => tracing::warn!(app = app.raw(), "update for unknown app"),
            Err(err) => tracing::error!(%err, "demo update failed"),
        }
    }

    fn destroy_app(&self, app: AppHandle) {
        let raw = app.into_raw();
        match self.lock_apps() {
            Ok(mut apps) => {
                if apps.remove(&raw).is_none() {
                    tracing::warn!(app = raw, "destroy for unknown app");
                }
            }
            Err(err) => tracing::error!(%err, "demo destroy_app failed"),
        }
    }

    fn destroy_engine(&self, engine: EngineHandle) {
        let raw = engine.into_raw();
        let orphans = read_registry(&self.apps)
            .values()
            .filter(|app| app.engine == raw)
            .count();
        if orphans > 0 {
            tracing::error!(engine = raw, orphans, "engine destroyed with live apps");
        }

        match self.lock_engines() {
            Ok(mut engines) => {
                if engines.remove(&raw).is_none() {
                    tracing::warn!(engine = raw, "destroy for unknown engine");
                }
            }
            Err(err) => tracing::error!(%err, "demo destroy_engine failed"),
        }
    }
}

/// Registry view for counting. A poisoned lock still holds the last
/// consistent map, so it is read rather than reported as empty.
fn read_registry<T>(registry: &Mutex<HashMap<u64, T>>) -> MutexGuard<'_, HashMap<u64, T>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::signal::{FatalLatch, SignalValidator};
    use crate::telemetry::TelemetryHub;

    fn listener() -> (SignalListener, Arc<SignalValidator>) {
        let validator = Arc::new(SignalValidator::new(0.0, Arc::new(TelemetryHub::default())));
        (
            SignalListener::new(Arc::clone(&validator), FatalLatch::new()),
            validator,
        )
    }

    #[test]
    fn test_update_reports_counter_through_listener() {
        let runtime = DemoRuntime::default();
        let (listener, validator) = listener();

        let engine = runtime.create_engine(listener).unwrap();
        let app = runtime.create_app(&engine).unwrap();
        for _ in 0..3 {
            runtime.update_app(&app);
        }

        assert!((validator.high_water_mark() - 0.3).abs() < 1e-6);
        assert_eq!(validator.accepted_count(), 3);
        assert!((runtime.app_value(app.raw()).unwrap() - 0.3).abs() < 1e-6);

        runtime.destroy_app(app);
        runtime.destroy_engine(engine);
        assert_eq!(runtime.live_apps(), 0);
        assert_eq!(runtime.live_engines(), 0);
    }

    #[test]
    fn test_negative_step_trips_validator() {
        let runtime = DemoRuntime::new(DemoConfig {
            signal_step: -0.1,
            ..DemoConfig::default()
        });
        let (listener, validator) = listener();

        let engine = runtime.create_engine(listener).unwrap();
        let app = runtime.create_app(&engine).unwrap();
        runtime.update_app(&app);

        assert!(validator.is_tripped());
        runtime.destroy_app(app);
        runtime.destroy_engine(engine);
    }

    #[test]
    fn test_engine_budget_rejects_extra_engines() {
        let runtime = DemoRuntime::new(DemoConfig {
            engine_budget: Some(1),
            ..DemoConfig::default()
        });
        let (listener, _) = listener();

        let engine = runtime.create_engine(listener.clone()).unwrap();
        let err = runtime.create_engine(listener).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::AllocationRejected {
                handle: HandleKind::Engine,
                ..
            }
        ));
        runtime.destroy_engine(engine);
    }

    #[test]
    fn test_app_requires_live_engine() {
        let runtime = DemoRuntime::default();
        let stale = EngineHandle::from_raw(999).unwrap();

        let err = runtime.create_app(&stale).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::AllocationRejected {
                handle: HandleKind::App,
                ..
            }
        ));
        stale.into_raw();
    }

    #[test]
    fn test_tokens_are_unique() {
        let runtime = DemoRuntime::default();
        let (listener, _) = listener();

        let first = runtime.create_engine(listener.clone()).unwrap();
        let second = runtime.create_engine(listener).unwrap();
        assert_ne!(first.raw(), second.raw());

        runtime.destroy_engine(first);
        runtime.destroy_engine(second);
    }

    #[test]
    fn test_live_counts_survive_poisoned_registries() {
        let runtime = Arc::new(DemoRuntime::default());
        let (listener, _) = listener();
        let engine = runtime.create_engine(listener).unwrap();
        let app = runtime.create_app(&engine).unwrap();

        let poisoner = Arc::clone(&runtime);
        let _ = std::thread::spawn(move || {
            let _engines = poisoner.engines.lock().unwrap();
            let _apps = poisoner.apps.lock().unwrap();
            panic!("poison the registries");
        })
        .join();

        assert!(runtime.engines.is_poisoned());
        assert_eq!(runtime.live_engines(), 1);
        assert_eq!(runtime.live_apps(), 1);

        app.into_raw();
        engine.into_raw();
    }
}
