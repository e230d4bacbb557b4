/// Viewport rectangle in drawing-buffer pixels.
///
/// Mirrors GL `viewport(x, y, width, height)`: `(x, y)` is the lower-left
/// corner. Any size is representable, including zero; consumers decide what a
/// degenerate viewport means for them.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport covering a whole `width` x `height` drawing buffer.
    #[inline]
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersects the viewport with a `target_w` x `target_h` buffer and
    /// converts to a top-left origin.
    ///
    /// Returns `(x, y, w, h)` in floating point pixels, or `None` when nothing
    /// of the viewport lands on the buffer.
    pub fn to_top_left_within(self, target_w: u32, target_h: u32) -> Option<(f32, f32, f32, f32)> {
        if self.is_degenerate() || target_w == 0 || target_h == 0 {
            return None;
        }

        let x0 = (self.x as i64).max(0);
        let y0 = (self.y as i64).max(0);
        let x1 = (self.x as i64 + self.width as i64).min(target_w as i64);
        let y1 = (self.y as i64 + self.height as i64).min(target_h as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        // GL y grows upwards from the bottom edge.
        let top = target_h as i64 - y1;
        Some((x0 as f32, top as f32, (x1 - x0) as f32, (y1 - y0) as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_viewport_maps_to_whole_target() {
        let v = Viewport::full(800, 600);
        assert_eq!(v.to_top_left_within(800, 600), Some((0.0, 0.0, 800.0, 600.0)));
    }

    #[test]
    fn oversized_viewport_is_clamped() {
        let v = Viewport::full(1024, 1024);
        assert_eq!(v.to_top_left_within(800, 600), Some((0.0, 0.0, 800.0, 600.0)));
    }

    #[test]
    fn bottom_left_origin_is_flipped() {
        let v = Viewport::new(10, 20, 100, 50);
        // Bottom edge at y=20 from the bottom of a 200px buffer -> top at 130.
        assert_eq!(v.to_top_left_within(400, 200), Some((10.0, 130.0, 100.0, 50.0)));
    }

    #[test]
    fn degenerate_viewport_yields_none() {
        assert!(Viewport::full(0, 600).is_degenerate());
        assert_eq!(Viewport::full(0, 600).to_top_left_within(800, 600), None);
        assert_eq!(Viewport::full(800, 600).to_top_left_within(0, 0), None);
    }

    #[test]
    fn off_target_viewport_yields_none() {
        let v = Viewport::new(900, 0, 100, 100);
        assert_eq!(v.to_top_left_within(800, 600), None);
    }
}
