use crate::coords::Viewport;
use crate::device::GraphicsApi;

/// Points the viewport at the whole drawing buffer.
///
/// `size` should be queried when the resize notification is handled, not
/// taken from the notification itself. Zero sizes are passed through.
pub fn reshape<A: GraphicsApi + ?Sized>(api: &mut A, size: (u32, u32)) {
    let (width, height) = size;
    log::debug!("reshape to {width}x{height}");
    api.viewport(Viewport::full(width, height));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BackendRequest, Call, HeadlessApi};

    #[test]
    fn viewport_follows_drawing_buffer() {
        let mut api = HeadlessApi::new(BackendRequest::Primary, 800, 600);
        api.resize_drawing_buffer(1024, 768);

        let size = api.drawing_buffer_size();
        reshape(&mut api, size);
        assert_eq!(api.current_viewport(), Viewport::new(0, 0, 1024, 768));
    }

    #[test]
    fn same_size_twice_gives_same_viewport() {
        let mut api = HeadlessApi::new(BackendRequest::Primary, 800, 600);
        reshape(&mut api, (1024, 768));
        let first = api.current_viewport();
        reshape(&mut api, (1024, 768));

        assert_eq!(api.current_viewport(), first);
        assert_eq!(
            api.calls(),
            &[
                Call::Viewport(Viewport::full(1024, 768)),
                Call::Viewport(Viewport::full(1024, 768)),
            ]
        );
    }

    #[test]
    fn zero_size_is_forwarded() {
        let mut api = HeadlessApi::new(BackendRequest::Primary, 800, 600);
        reshape(&mut api, (0, 600));
        assert_eq!(api.current_viewport(), Viewport::full(0, 600));
        assert!(api.current_viewport().is_degenerate());
    }
}
