//! Linear RGBA colours and the HSL round trip used for particle tints.

/// RGBA colour with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Hue (turns, `0.0..1.0`), saturation and lightness
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Saturation below which a colour is treated as grey and has no usable hue
const ACHROMATIC_EPSILON: f32 = 1e-4;

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_hsl(self) -> Hsl {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let l = (max + min) / 2.0;

        if max - min < f32::EPSILON {
            return Hsl { h: 0.0, s: 0.0, l };
        }

        let delta = max - min;
        let s = if l <= 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };

        let h = if max == self.r {
            (self.g - self.b) / delta + if self.g < self.b { 6.0 } else { 0.0 }
        } else if max == self.g {
            (self.b - self.r) / delta + 2.0
        } else {
            (self.r - self.g) / delta + 4.0
        };

        Hsl { h: h / 6.0, s, l }
    }

    pub fn from_hsl(hsl: Hsl, a: f32) -> Self {
        let Hsl { h, s, l } = hsl;
        if s <= 0.0 {
            return Self::rgba(l, l, l, a);
        }

        let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        Self::rgba(
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
            a,
        )
    }

    /// Interpolate through HSL space without passing through muddy greys.
    ///
    /// A grey endpoint (white, black, neutral tones) has no hue of its own, so
    /// it borrows the hue of the other endpoint; otherwise the hue travels the
    /// shorter way round the colour wheel. `t = 0` and `t = 1` return the
    /// endpoints unchanged.
    pub fn lerp_hsl(from: Color, to: Color, t: f32) -> Color {
        if t <= 0.0 {
            return from;
        }
        if t >= 1.0 {
            return to;
        }

        let mut a = from.to_hsl();
        let mut b = to.to_hsl();

        let a_grey = a.s < ACHROMATIC_EPSILON;
        let b_grey = b.s < ACHROMATIC_EPSILON;
        if a_grey && !b_grey {
            a.h = b.h;
        } else if b_grey && !a_grey {
            b.h = a.h;
        }

        let mut dh = b.h - a.h;
        if dh > 0.5 {
            dh -= 1.0;
        } else if dh < -0.5 {
            dh += 1.0;
        }

        let hsl = Hsl {
            h: (a.h + dh * t).rem_euclid(1.0),
            s: a.s + (b.s - a.s) * t,
            l: a.l + (b.l - a.l) * t,
        };
        Color::from_hsl(hsl, from.a + (to.a - from.a) * t)
    }
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Color, b: Color) -> bool {
        (a.r - b.r).abs() < 1e-4 && (a.g - b.g).abs() < 1e-4 && (a.b - b.b).abs() < 1e-4
    }

    #[test]
    fn test_from_hex() {
        let c = Color::from_hex(0xFF0038);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 56.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_hsl_round_trip_for_accents() {
        for hex in [0xFF0038, 0x3C414A, 0x19A974, 0x2040FF] {
            let c = Color::from_hex(hex);
            let back = Color::from_hsl(c.to_hsl(), 1.0);
            assert!(close(c, back), "{:06x} -> {:?}", hex, back);
        }
    }

    #[test]
    fn test_lerp_endpoints_exact() {
        let from = Color::WHITE;
        let to = Color::from_hex(0xFF0038);
        assert_eq!(Color::lerp_hsl(from, to, 0.0), from);
        assert_eq!(Color::lerp_hsl(from, to, 1.0), to);
    }

    #[test]
    fn test_lerp_from_white_keeps_target_hue() {
        let accent = Color::from_hex(0xFF0038);
        let mid = Color::lerp_hsl(Color::WHITE, accent, 0.5);
        let mid_hsl = mid.to_hsl();
        let accent_hsl = accent.to_hsl();
        assert!((mid_hsl.h - accent_hsl.h).abs() < 1e-3);
        // Pink, not grey: red channel dominates
        assert!(mid.r > mid.g && mid.r > mid.b);
    }

    #[test]
    fn test_lerp_takes_short_hue_path() {
        // Hue 0.95 to hue 0.05 should pass through red (0.0), not green
        let from = Color::from_hsl(Hsl { h: 0.95, s: 1.0, l: 0.5 }, 1.0);
        let to = Color::from_hsl(Hsl { h: 0.05, s: 1.0, l: 0.5 }, 1.0);
        let mid = Color::lerp_hsl(from, to, 0.5).to_hsl();
        assert!(mid.h < 0.01 || mid.h > 0.99, "hue was {}", mid.h);
    }
}
