use std::sync::atomic::{AtomicBool, Ordering};

use crate::lifecycle::{LifecycleController, LifecycleState};

/// Remembers whether the host activity is in the foreground so a resume that
/// arrives before the surface exists is not lost.
///
/// The control thread writes the flag and then tries the transition; the
/// render thread publishes `SurfaceReady` and then reads the flag. Both sides
/// use `SeqCst` so at least one of them sees the other's write.
pub struct ForegroundGate {
    controller: LifecycleController,
    foreground: AtomicBool,
}

impl ForegroundGate {
    pub fn new(controller: LifecycleController) -> Self {
        Self {
            controller,
            foreground: AtomicBool::new(false),
        }
    }

    /// Control thread: the activity resumed.
    pub fn enter_foreground(&self) -> LifecycleState {
        self.foreground.store(true, Ordering::SeqCst);
        self.controller.resume()
    }

    /// Control thread: the activity paused.
    pub fn enter_background(&self) -> LifecycleState {
        self.foreground.store(false, Ordering::SeqCst);
        self.controller.pause()
    }

    /// Render thread, after a successful `surface_created`: replay the
    /// resume if the activity is already in the foreground.
    pub fn surface_ready(&self) -> LifecycleState {
        if self.foreground.load(Ordering::SeqCst) {
            self.controller.resume()
        } else {
            self.controller.state()
        }
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};

    use super::*;
    use crate::config::BridgeConfig;
    use crate::testing::RecordingRuntime;
    use crate::SurfaceBridge;

    #[test]
    fn test_early_resume_is_replayed() {
        let mut bridge = SurfaceBridge::new(RecordingRuntime::new(), &BridgeConfig::default());
        let gate = ForegroundGate::new(bridge.controller());

        assert_eq!(gate.enter_foreground(), LifecycleState::Uninitialized);
        bridge.surface_created().unwrap();
        assert_eq!(gate.surface_ready(), LifecycleState::Running);
    }

    #[test]
    fn test_background_surface_stays_ready() {
        let mut bridge = SurfaceBridge::new(RecordingRuntime::new(), &BridgeConfig::default());
        let gate = ForegroundGate::new(bridge.controller());

        gate.enter_foreground();
        gate.enter_background();
        bridge.surface_created().unwrap();
        assert_eq!(gate.surface_ready(), LifecycleState::SurfaceReady);
        assert!(!gate.is_foreground());
    }

    #[test]
    fn test_racing_resume_and_surface_never_lose_the_resume() {
        for _ in 0..500 {
            let mut bridge =
                SurfaceBridge::new(RecordingRuntime::new(), &BridgeConfig::default());
            let gate = Arc::new(ForegroundGate::new(bridge.controller()));
            let start = Arc::new(Barrier::new(2));

            let ui = {
                let gate = Arc::clone(&gate);
                let start = Arc::clone(&start);
                std::thread::spawn(move || {
                    start.wait();
                    gate.enter_foreground();
                })
            };

            start.wait();
            bridge.surface_created().unwrap();
            gate.surface_ready();
            ui.join().unwrap();

            assert_eq!(bridge.state(), LifecycleState::Running);
        }
    }
}
