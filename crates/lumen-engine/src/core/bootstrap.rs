use std::time::Instant;

use crate::device::{BackendPreference, GraphicsApi, Surface, acquire_context_with};
use crate::error::LumenError;

use super::{App, FrameDriver};

/// Acquires a context for `surface`, lets `app` initialize against it and
/// starts `driver`.
///
/// If no context can be acquired the app is never initialized and nothing is
/// issued to any backend. If initialization fails, whatever the app already
/// handed to the driver is released and the driver is stopped.
pub fn bootstrap<S, A>(
    surface: &S,
    preference: BackendPreference,
    app: &mut A,
    driver: &mut FrameDriver,
) -> Result<S::Context, LumenError>
where
    S: Surface,
    S::Context: GraphicsApi,
    A: App + ?Sized,
{
    let mut api = acquire_context_with(surface, preference)?;

    if let Err(e) = app.init(&mut api, driver) {
        log::error!("initialization failed: {e}");
        driver.shutdown(&mut api);
        return Err(e.into());
    }

    driver.start(&mut api, Instant::now());
    Ok(api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Color;
    use crate::device::{BackendRequest, Call, HeadlessSurface};
    use crate::error::{ContextError, InitError};
    use crate::render::triangle;
    use crate::shader::EmbeddedShaders;
    use crate::core::DriverState;

    #[derive(Default)]
    struct Recorder {
        inits: usize,
        shaders: Option<EmbeddedShaders>,
    }

    impl App for Recorder {
        fn init(
            &mut self,
            api: &mut dyn GraphicsApi,
            driver: &mut FrameDriver,
        ) -> Result<(), InitError> {
            self.inits += 1;
            driver.set_clear_color(Color::black());
            if let Some(shaders) = &self.shaders {
                let resources = triangle::init(&mut *api, shaders)?;
                driver.install(api, resources);
            }
            Ok(())
        }
    }

    #[test]
    fn runs_init_then_starts_driver() {
        let surface = HeadlessSurface::new(640, 480);
        let mut app = Recorder {
            shaders: Some(triangle::builtin_shaders()),
            ..Recorder::default()
        };
        let mut driver = FrameDriver::new(Color::blue(), Default::default());

        let api = bootstrap(&surface, BackendPreference::Auto, &mut app, &mut driver).unwrap();

        assert_eq!(app.inits, 1);
        assert_eq!(driver.state(), DriverState::Running);
        assert!(driver.resources().is_some());
        assert_eq!(api.backend(), BackendRequest::Primary);
        assert_eq!(api.calls().last(), Some(&Call::ClearColor(Color::black())));
    }

    #[test]
    fn falls_back_to_legacy_backend() {
        let surface = HeadlessSurface::new(640, 480).without(BackendRequest::Primary);
        let mut app = Recorder::default();
        let mut driver = FrameDriver::default();

        let api = bootstrap(&surface, BackendPreference::Auto, &mut app, &mut driver).unwrap();
        assert_eq!(api.backend(), BackendRequest::Legacy);
        assert_eq!(surface.requests(), vec![BackendRequest::Primary, BackendRequest::Legacy]);
    }

    #[test]
    fn no_context_means_no_init() {
        let surface = HeadlessSurface::new(640, 480)
            .without(BackendRequest::Primary)
            .without(BackendRequest::Legacy);
        let mut app = Recorder::default();
        let mut driver = FrameDriver::default();

        let err = bootstrap(&surface, BackendPreference::Auto, &mut app, &mut driver).unwrap_err();

        assert!(matches!(
            err,
            LumenError::Context(ContextError::NoBackendAvailable { ref attempts }) if attempts.len() == 2
        ));
        assert_eq!(app.inits, 0);
        assert_eq!(driver.state(), DriverState::Uninitialized);
    }

    #[test]
    fn init_failure_stops_driver() {
        let surface = HeadlessSurface::new(640, 480);
        let mut app = Recorder {
            shaders: Some(EmbeddedShaders::new().with(triangle::VERTEX_SHADER_ID, "not wgsl")),
            ..Recorder::default()
        };
        let mut driver = FrameDriver::default();

        let err = bootstrap(&surface, BackendPreference::Auto, &mut app, &mut driver).unwrap_err();
        assert!(matches!(err, LumenError::Init(InitError::ShaderCompileError { .. })));
        assert_eq!(driver.state(), DriverState::Stopped);
    }
}
