//! Settings file.
//!
//! Every table and field is optional; anything left out keeps its default.
//!
//! ```toml
//! [window]
//! title = "triangle"
//! width = 800
//! height = 600
//!
//! [render]
//! clear_color = [0.0, 0.0, 0.0, 1.0]
//! target_fps = 60.0
//! backend = "auto"        # "auto" | "primary" | "legacy"
//! prefer_srgb = true
//! vsync = true
//!
//! [shaders]
//! directory = "shaders"   # <id>.wgsl files here replace the embedded ones
//!
//! [logging]
//! filter = "info,lumen_engine=debug"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use winit::dpi::LogicalSize;

use crate::coords::Color;
use crate::device::{BackendPreference, GpuInit};
use crate::logging::LoggingConfig;
use crate::time::FrameSchedule;
use crate::window::RuntimeConfig;

/// Root of the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LumenConfig {
    pub window: WindowConfig,
    pub render: RenderConfig,
    pub shaders: ShaderConfig,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    /// Falls back to the program's own title.
    pub title: Option<String>,
    /// Logical pixels.
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: None,
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Overrides the program's own clear color.
    pub clear_color: Option<Color>,
    pub target_fps: f64,
    pub backend: BackendPreference,
    pub prefer_srgb: bool,
    pub vsync: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: None,
            target_fps: FrameSchedule::DEFAULT_FPS,
            backend: BackendPreference::Auto,
            prefer_srgb: true,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShaderConfig {
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// `env_logger` filter; `RUST_LOG` is used when absent.
    pub filter: Option<String>,
}

impl LumenConfig {
    /// Parses a settings document.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid lumen configuration")
    }

    /// Loads `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml(&text).with_context(|| format!("in {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Like [`load`](Self::load), but falls back to the defaults on any error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("{e:#}; using default configuration");
            Self::default()
        })
    }

    pub fn runtime_config(&self, default_title: &str) -> RuntimeConfig {
        RuntimeConfig {
            title: self.window.title.as_deref().unwrap_or(default_title).to_owned(),
            initial_size: LogicalSize::new(self.window.width as f64, self.window.height as f64),
            backend: self.render.backend,
        }
    }

    pub fn gpu_init(&self) -> GpuInit {
        GpuInit {
            prefer_srgb: self.render.prefer_srgb,
            vsync: self.render.vsync,
            ..GpuInit::default()
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.logging.filter.clone(),
            ..LoggingConfig::default()
        }
    }

    /// Configured clear color, or `default` when the file sets none.
    ///
    /// Channels are clamped to `[0, 1]`.
    pub fn clear_color_or(&self, default: Color) -> Color {
        self.render.clear_color.unwrap_or(default).clamped()
    }

    pub fn schedule(&self) -> FrameSchedule {
        FrameSchedule::from_fps(self.render.target_fps)
    }
}
