use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameDriver, bootstrap, reshape};
use crate::device::{BackendPreference, GpuInit, WgpuApi, WindowSurface};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Backend requests tried when acquiring the context.
    pub backend: BackendPreference,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
            backend: BackendPreference::Auto,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window, runs `app` in it until the window closes, then tears
    /// everything down.
    ///
    /// Context acquisition and app initialization failures end the loop and
    /// are returned here.
    pub fn run<A>(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        driver: FrameDriver,
        app: A,
    ) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, driver, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    api: WgpuApi<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    driver: FrameDriver,

    entry: Option<WindowEntry>,
    started: bool,
    exit_requested: bool,
    failure: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, driver: FrameDriver, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            driver,
            entry: None,
            started: false,
            exit_requested: false,
            failure: None,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.failure.get_or_insert(error);
        self.request_exit(event_loop);
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let preference = self.config.backend;
        let (app, driver) = (&mut self.app, &mut self.driver);

        let entry = WindowEntryTryBuilder {
            window,
            api_builder: |w| bootstrap(&WindowSurface::new(w, gpu_init), preference, app, driver),
        }
        .try_build()
        .context("failed to start")?;

        entry.with_api(|api| {
            let info = api.gpu().adapter_info();
            log::info!(
                "running on {} ({:?}, {} request)",
                info.name,
                info.backend,
                api.backend()
            );
        });

        self.entry = Some(entry);
        Ok(())
    }

    /// Stops the driver, releases its resources, then drops the context and
    /// the window in that order.
    fn teardown(&mut self) {
        let Some(mut entry) = self.entry.take() else {
            return;
        };

        let driver = &mut self.driver;
        entry.with_api_mut(|api| driver.shutdown(api));
        drop(entry);
        log::info!("graphics context released");
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // One-shot: the driver cannot be restarted once stopped.
        if self.started {
            return;
        }
        self.started = true;

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = &self.entry else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };

        match self.driver.next_deadline() {
            Some(deadline) if Instant::now() >= deadline => {
                entry.with_window(|w| w.request_redraw());
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.teardown();
            self.request_exit(event_loop);
            return;
        }

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (driver, entry) = (&mut self.driver, self.entry.as_mut());
        let Some(entry) = entry else {
            return;
        };

        let mut control = AppControl::Continue;

        match &event {
            WindowEvent::CloseRequested => control = AppControl::Exit,

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                entry.with_mut(|fields| {
                    // The event payload may already be stale; ask the window.
                    let size = fields.window.inner_size();
                    fields.api.resize(size);
                    reshape(fields.api, (size.width, size.height));
                });
            }

            WindowEvent::RedrawRequested => {
                entry.with_api_mut(|api| control = driver.tick(api, Instant::now()));
            }

            _ => {}
        }

        if control == AppControl::Exit {
            self.teardown();
            self.request_exit(event_loop);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}
