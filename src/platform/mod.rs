//! Host adapters that feed platform events into a [`crate::SurfaceBridge`].

cfg_if::cfg_if! {
    if #[cfg(target_os = "android")] {
        mod android;
        pub use android::GlesTarget;
    } else {
        mod desktop;
        pub use desktop::{parse_script, DesktopHost, HeadlessTarget, HostEvent, RunSummary, ScriptError};
    }
}
