use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const ORANGE: Color = Color::rgb(255, 165, 0);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn blend(&self, to: &Color, t: f64) -> Color {
        let ch = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8;
        Color::rgb(ch(self.r, to.r), ch(self.g, to.g), ch(self.b, to.b))
    }
}

/// Cyclical cubehelix rainbow, `t` in `[0, 1)`.
pub fn rainbow(t: f64) -> Color {
    let t = if t.is_finite() { t - t.floor() } else { 0.0 };
    let ts = (t - 0.5).abs();
    let h = 360.0 * t - 100.0;
    let s = 1.5 - 1.5 * ts;
    let l = 0.8 - 0.9 * ts;
    cubehelix(h, s, l)
}

fn cubehelix(h: f64, s: f64, l: f64) -> Color {
    let h = (h + 120.0).to_radians();
    let a = s * l * (1.0 - l);
    let (sinh, cosh) = h.sin_cos();
    let ch = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    Color::rgb(
        ch(l + a * (-0.14861 * cosh + 1.78277 * sinh)),
        ch(l + a * (-0.29227 * cosh - 0.90649 * sinh)),
        ch(l + a * (1.97294 * cosh)),
    )
}

/// Colour of the category at `position` among `count` categories.
pub fn category_color(position: Option<usize>, count: usize) -> Color {
    match position {
        Some(i) if count > 0 => rainbow(i as f64 / count as f64),
        _ => Color::BLACK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rainbow_start_is_purple() {
        // (110, 64, 170) is the well-known first stop of this ramp.
        let c = rainbow(0.0);
        assert!((c.r as i32 - 110).abs() <= 1, "{c:?}");
        assert!((c.g as i32 - 64).abs() <= 1, "{c:?}");
        assert!((c.b as i32 - 170).abs() <= 1, "{c:?}");
    }

    #[test]
    fn unknown_category_is_black() {
        assert_eq!(category_color(None, 3), Color::BLACK);
        assert_eq!(category_color(Some(0), 0), Color::BLACK);
    }

    #[test]
    fn blend_hits_endpoints() {
        assert_eq!(Color::BLACK.blend(&Color::WHITE, 0.0), Color::BLACK);
        assert_eq!(Color::BLACK.blend(&Color::WHITE, 1.0), Color::WHITE);
        assert_eq!(Color::BLACK.blend(&Color::WHITE, 0.5), Color::rgb(128, 128, 128));
    }
}
