use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::device::GraphicsApi;
use crate::error::InitError;

use super::FrameDriver;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the programs.
pub trait App {
    /// Called once, right after a context was acquired and before the first
    /// tick.
    ///
    /// This is where the app configures `driver` (clear color, resources to
    /// draw). Returning an error stops the program before anything is drawn.
    fn init(
        &mut self,
        api: &mut dyn GraphicsApi,
        driver: &mut FrameDriver,
    ) -> Result<(), InitError>;

    /// Called for window events.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }
}
