//! The two example programs and their shared startup.
//!
//! - `clear-screen`: clears the window to blue on every tick.
//! - `triangle`: clears to black and draws a red triangle on every tick.
//!
//! Both read `lumen.toml` from the working directory, or the file named by
//! `LUMEN_CONFIG`. Setting `LUMEN_HEADLESS=<ticks>` runs the program against
//! the off-screen backend for that many ticks instead of opening a window.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};

use lumen_engine::config::LumenConfig;
use lumen_engine::coords::Color;
use lumen_engine::core::{App, AppControl, FrameDriver, bootstrap, reshape};
use lumen_engine::device::{Call, GraphicsApi, HeadlessApi, HeadlessSurface, Surface};
use lumen_engine::error::InitError;
use lumen_engine::logging::init_logging;
use lumen_engine::render::triangle;
use lumen_engine::shader::{Overlay, ShaderDir};
use lumen_engine::window::Runtime;

pub const CONFIG_ENV: &str = "LUMEN_CONFIG";
pub const HEADLESS_ENV: &str = "LUMEN_HEADLESS";
const DEFAULT_CONFIG_FILE: &str = "lumen.toml";

/// An example program runnable through [`run`].
pub trait Demo: App + Sized + 'static {
    const TITLE: &'static str;

    /// Used unless the config file sets `render.clear_color`.
    const CLEAR_COLOR: Color;

    fn from_config(config: &LumenConfig) -> Self;
}

/// Clears the surface every tick. Nothing else is set up.
#[derive(Debug, Default)]
pub struct ClearScreen;

impl App for ClearScreen {
    fn init(
        &mut self,
        _api: &mut dyn GraphicsApi,
        _driver: &mut FrameDriver,
    ) -> Result<(), InitError> {
        Ok(())
    }
}

impl Demo for ClearScreen {
    const TITLE: &'static str = "clear screen";
    const CLEAR_COLOR: Color = Color::blue();

    fn from_config(_config: &LumenConfig) -> Self {
        ClearScreen
    }
}

/// Draws the red triangle every tick.
#[derive(Debug, Default)]
pub struct Triangle {
    /// `<id>.wgsl` files here take precedence over the built-in shaders.
    pub shader_dir: Option<PathBuf>,
}

impl App for Triangle {
    fn init(
        &mut self,
        api: &mut dyn GraphicsApi,
        driver: &mut FrameDriver,
    ) -> Result<(), InitError> {
        let resources = match &self.shader_dir {
            Some(dir) => {
                log::info!("shader overrides from {}", dir.display());
                let sources = Overlay {
                    primary: ShaderDir::new(dir),
                    fallback: triangle::builtin_shaders(),
                };
                triangle::init(&mut *api, &sources)?
            }
            None => triangle::init(&mut *api, &triangle::builtin_shaders())?,
        };
        driver.install(api, resources);
        Ok(())
    }
}

impl Demo for Triangle {
    const TITLE: &'static str = "triangle";
    const CLEAR_COLOR: Color = Color::black();

    fn from_config(config: &LumenConfig) -> Self {
        Triangle {
            shader_dir: config.shaders.directory.clone(),
        }
    }
}

/// Loads the configuration, sets up logging and runs `D` until its window
/// closes (or for `LUMEN_HEADLESS` ticks off-screen).
pub fn run<D: Demo>() -> Result<()> {
    let path = std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    // Logging depends on the config, so a load failure is reported after
    // the logger exists.
    let loaded = LumenConfig::load(&path);
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(config.logging_config());
    if let Err(e) = &loaded {
        log::warn!("{e:#}; using default configuration");
    }

    let result = match headless_ticks()? {
        Some(ticks) => dry_run::<D>(&config, ticks).map(|api| summarize(&api)),
        None => {
            let driver = FrameDriver::new(config.clear_color_or(D::CLEAR_COLOR), config.schedule());
            Runtime::run(
                config.runtime_config(D::TITLE),
                config.gpu_init(),
                driver,
                D::from_config(&config),
            )
        }
    };

    if let Err(e) = &result {
        log::error!("{} failed: {e:#}", D::TITLE);
    }
    result
}

fn headless_ticks() -> Result<Option<u64>> {
    match std::env::var(HEADLESS_ENV) {
        Ok(v) => v
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{HEADLESS_ENV} must be a tick count, got '{v}'")),
        Err(_) => Ok(None),
    }
}

/// Runs `D` for `ticks` ticks against the off-screen backend, sized like the
/// configured window, and returns the backend for inspection.
///
/// Time is simulated: each tick happens exactly at its deadline.
pub fn dry_run<D: Demo>(config: &LumenConfig, ticks: u64) -> Result<HeadlessApi> {
    let surface = HeadlessSurface::new(config.window.width, config.window.height);
    let mut app = D::from_config(config);
    let mut driver = FrameDriver::new(config.clear_color_or(D::CLEAR_COLOR), config.schedule());

    let mut api = bootstrap(&surface, config.render.backend, &mut app, &mut driver)
        .with_context(|| format!("failed to start {}", D::TITLE))?;
    reshape(&mut api, surface.drawing_buffer_size());

    let mut now = Instant::now();
    for _ in 0..ticks {
        let Some(deadline) = driver.next_deadline() else {
            break;
        };
        now = now.max(deadline);
        if driver.tick(&mut api, now) == AppControl::Exit {
            break;
        }
    }

    driver.shutdown(&mut api);
    Ok(api)
}

fn summarize(api: &HeadlessApi) {
    let draws = api.count_calls(|c| matches!(c, Call::DrawArrays { .. }));
    log::info!(
        "{} backend: {} frame(s) presented, {} draw call(s), {} call(s) total",
        api.backend(),
        api.frames_presented(),
        draws,
        api.calls().len()
    );
}
