//! Configuration for a bridge session
//!
//! Loaded from a JSON file at startup so clear color, telemetry buffers and
//! the demo runtime can be adjusted without recompiling. Every section and
//! field has a default, so partial files are fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable naming a config file for desktop runs
pub const CONFIG_PATH_ENV: &str = "OMNI_BRIDGE_CONFIG";

/// Config file used on desktop when the environment variable is unset
pub const DEFAULT_CONFIG_PATH: &str = "assets/bridge_config.json";

/// Complete bridge configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub render: RenderConfig,
    pub signal: SignalConfig,
    pub telemetry: TelemetryConfig,
    pub demo: DemoConfig,
}

/// Render loop parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// RGBA color the target is cleared to every frame, components in [0, 1]
    pub clear_color: [f32; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [1.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Callback channel parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Starting high-water mark; the first signal must not be below it
    pub initial_high_water_mark: f32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            initial_high_water_mark: 0.0,
        }
    }
}

/// Telemetry buffer sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Broadcast channel capacity for live subscribers
    pub channel_capacity: usize,
    /// Number of recent events kept for snapshots
    pub history_capacity: usize,
    /// Emit a frame counter event every N frames (0 disables)
    pub frame_report_interval: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            history_capacity: 64,
            frame_report_interval: 600,
        }
    }
}

/// Demo runtime parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Amount each app adds to its counter per update
    pub signal_step: f32,
    /// Maximum number of engines the runtime will ever create (None = no limit)
    pub engine_budget: Option<u32>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            signal_step: 0.1,
            engine_budget: None,
        }
    }
}

impl BridgeConfig {
    /// Check value ranges
    ///
    /// # Returns
    /// * `Ok(())` - Configuration is usable
    /// * `Err(String)` - Description of the first invalid field
    pub fn validate(&self) -> Result<(), String> {
        if let Some(component) = self
            .render
            .clear_color
            .iter()
            .find(|c| !(0.0..=1.0).contains(*c))
        {
            return Err(format!(
                "render.clear_color components must be in [0, 1] (got {})",
                component
            ));
        }
        if self.signal.initial_high_water_mark.is_nan() {
            return Err("signal.initial_high_water_mark must not be NaN".to_string());
        }
        if self.telemetry.channel_capacity == 0 {
            return Err("telemetry.channel_capacity must be greater than 0".to_string());
        }
        if !self.demo.signal_step.is_finite() {
            return Err(format!(
                "demo.signal_step must be finite (got {})",
                self.demo.signal_step
            ));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(contents).map_err(|err| err.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or defaults if the file is missing, not
    /// valid JSON, or fails validation.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Invalid configuration in {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration on Android
    ///
    /// The shell does not ship a config asset; defaults apply.
    #[cfg(target_os = "android")]
    pub fn load_android() -> Self {
        log::info!("[Config] Using default configuration on Android");
        Self::default()
    }

    /// Load configuration for non-Android platforms
    ///
    /// Reads the file named by `OMNI_BRIDGE_CONFIG`, falling back to
    /// `assets/bridge_config.json`.
    #[cfg(not(target_os = "android"))]
    pub fn load() -> Self {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_file(path)
    }
}
