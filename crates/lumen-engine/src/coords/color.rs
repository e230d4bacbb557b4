use serde::Deserialize;

/// Linear RGBA color.
///
/// Values are expected in linear space. sRGB conversion is handled by the
/// surface format selected at context creation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "[f32; 4]")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn blue() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Clamps all channels to `[0, 1]`; non-finite channels become 0.
    #[inline]
    pub fn clamped(self) -> Self {
        let c = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self::new(c(self.r), c(self.g), c(self.b), c(self.a))
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_limits_channels() {
        let c = Color::new(-1.0, 0.5, 2.0, f32::NAN).clamped();
        assert_eq!(c, Color::new(0.0, 0.5, 1.0, 0.0));
    }

    #[test]
    fn from_array_keeps_channel_order() {
        assert_eq!(Color::from([0.1, 0.2, 0.3, 0.4]), Color::new(0.1, 0.2, 0.3, 0.4));
    }
}
