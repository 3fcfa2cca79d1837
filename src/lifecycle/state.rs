use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Lifecycle of one bridge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LifecycleState {
    Uninitialized = 0,
    SurfaceReady = 1,
    Running = 2,
    Paused = 3,
    Terminated = 4,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Uninitialized,
            1 => LifecycleState::SurfaceReady,
            2 => LifecycleState::Running,
            3 => LifecycleState::Paused,
            _ => LifecycleState::Terminated,
        }
    }

    /// States in which the engine and app handles are live.
    pub fn has_surface(self) -> bool {
        matches!(
            self,
            LifecycleState::SurfaceReady | LifecycleState::Running | LifecycleState::Paused
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::SurfaceReady => "surface_ready",
            LifecycleState::Running => "running",
            LifecycleState::Paused => "paused",
            LifecycleState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Inputs delivered by the platform surface host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleSignal {
    SurfaceCreated,
    Resume,
    Pause,
    Terminate,
}

/// Atomic home of the current state, shared by the render and control
/// contexts.
///
/// All accesses are `SeqCst`: the foreground handoff pairs a store here with
/// a load of another atomic, which acquire/release alone does not order.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: LifecycleState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn store(&self, state: LifecycleState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    pub(crate) fn swap(&self, state: LifecycleState) -> LifecycleState {
        LifecycleState::from_u8(self.0.swap(state as u8, Ordering::SeqCst))
    }

    /// Move `from -> to` only if the cell still holds `from`.
    pub(crate) fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8_roundtrip_for_every_state() {
        for state in [
            LifecycleState::Uninitialized,
            LifecycleState::SurfaceReady,
            LifecycleState::Running,
            LifecycleState::Paused,
            LifecycleState::Terminated,
        ] {
            let cell = StateCell::new(state);
            assert_eq!(cell.load(), state);
        }
    }

    #[test]
    fn test_transition_requires_expected_state() {
        let cell = StateCell::new(LifecycleState::SurfaceReady);
        assert!(!cell.transition(LifecycleState::Paused, LifecycleState::Running));
        assert_eq!(cell.load(), LifecycleState::SurfaceReady);

        assert!(cell.transition(LifecycleState::SurfaceReady, LifecycleState::Running));
        assert_eq!(cell.load(), LifecycleState::Running);
    }

    #[test]
    fn test_swap_returns_previous() {
        let cell = StateCell::new(LifecycleState::Paused);
        assert_eq!(cell.swap(LifecycleState::Terminated), LifecycleState::Paused);
        assert_eq!(cell.load(), LifecycleState::Terminated);
    }

    #[test]
    fn test_has_surface() {
        assert!(!LifecycleState::Uninitialized.has_surface());
        assert!(LifecycleState::SurfaceReady.has_surface());
        assert!(LifecycleState::Running.has_surface());
        assert!(LifecycleState::Paused.has_surface());
        assert!(!LifecycleState::Terminated.has_surface());
    }
}
