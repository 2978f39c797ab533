use glam::Vec3;

use crate::color::Color;

/// Trait for types that can be animated by interpolating between values
pub trait Animatable: Clone + PartialEq + Send + Sync + 'static {
    /// Interpolation between two values
    /// t = 0.0 returns `from`, t = 1.0 returns `to`
    fn lerp(from: &Self, to: &Self, t: f32) -> Self;
}

impl Animatable for f32 {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        from + (to - from) * t
    }
}

impl Animatable for Vec3 {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        *from + (*to - *from) * t
    }
}

/// Colours interpolate in HSL so accent tints stay vivid mid-flight
impl Animatable for Color {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Color::lerp_hsl(*from, *to, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_lerp() {
        assert_eq!(f32::lerp(&0.0, &10.0, 0.0), 0.0);
        assert_eq!(f32::lerp(&0.0, &10.0, 0.5), 5.0);
        assert_eq!(f32::lerp(&0.0, &10.0, 1.0), 10.0);
    }

    #[test]
    fn test_vec3_lerp() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(2.0, -4.0, 8.0);
        assert_eq!(
            <Vec3 as Animatable>::lerp(&a, &b, 0.25),
            Vec3::new(0.5, -1.0, 2.0)
        );
    }

    #[test]
    fn test_color_lerp_uses_hsl() {
        let accent = Color::from_hex(0xFF0038);
        let mid = <Color as Animatable>::lerp(&Color::WHITE, &accent, 0.5);
        assert_eq!(mid, Color::lerp_hsl(Color::WHITE, accent, 0.5));
    }
}
