//! Subscriber setup for the host process.

use once_cell::sync::OnceCell;

static INIT: OnceCell<()> = OnceCell::new();

/// Install the platform subscriber once. Later calls are no-ops, as are calls
/// made after another subscriber was installed.
#[cfg(not(target_os = "android"))]
pub fn init_logging(level: tracing::Level) {
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Install the logcat subscriber once, tagged `OmniBridge`.
///
/// Without a logcat layer there is nowhere to report to, so the process runs
/// unlogged.
#[cfg(target_os = "android")]
pub fn init_logging(level: tracing::Level) {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;

    INIT.get_or_init(|| {
        if let Ok(layer) = tracing_android::layer("OmniBridge") {
            let _ = tracing_subscriber::registry()
                .with(layer.with_filter(LevelFilter::from_level(level)))
                .try_init();
        }
    });
}
