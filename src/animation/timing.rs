//! Timing functions (easing curves) for particle and camera animations.
//!
//! Every animation in the scene is driven from absolute timestamps, so a
//! timing function only ever sees a normalized progress value `t` in `[0, 1]`
//! and maps it to an interpolation factor.
//!
//! ## Built-in Easing Functions
//!
//! - [`TimingFunction::Linear`] - Constant speed (intro morph)
//! - [`TimingFunction::EaseInCubic`] - Orbit spin-up and colour ramp
//! - [`TimingFunction::EaseOutCubic`] - Detach and reattach flights
//! - [`TimingFunction::EaseInOutCubic`] - Camera dolly
//!
//! [`TimingFunction::custom`] covers any other curve.

use std::sync::Arc;

/// Timing function that controls the animation curve
#[derive(Clone)]
pub enum TimingFunction {
    /// Linear interpolation (constant speed)
    Linear,
    /// Cubic acceleration from rest
    EaseInCubic,
    /// Cubic deceleration into the target
    EaseOutCubic,
    /// Cubic acceleration then deceleration
    EaseInOutCubic,
    /// Custom timing function
    Custom(Arc<dyn Fn(f32) -> f32 + Send + Sync>),
}

impl TimingFunction {
    /// Evaluate the timing function at time t (0.0 to 1.0).
    /// Input outside that range is clamped first.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            TimingFunction::Linear => t,
            TimingFunction::EaseInCubic => ease_in_cubic(t),
            TimingFunction::EaseOutCubic => ease_out_cubic(t),
            TimingFunction::EaseInOutCubic => ease_in_out_cubic(t),
            TimingFunction::Custom(f) => f(t),
        }
    }

    /// Create a custom timing function from a closure
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f32) -> f32 + Send + Sync + 'static,
    {
        TimingFunction::Custom(Arc::new(f))
    }
}

impl std::fmt::Debug for TimingFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimingFunction::Linear => write!(f, "Linear"),
            TimingFunction::EaseInCubic => write!(f, "EaseInCubic"),
            TimingFunction::EaseOutCubic => write!(f, "EaseOutCubic"),
            TimingFunction::EaseInOutCubic => write!(f, "EaseInOutCubic"),
            TimingFunction::Custom(_) => write!(f, "Custom"),
        }
    }
}

// Easing functions

fn ease_in_cubic(t: f32) -> f32 {
    t * t * t
}

fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        assert_eq!(TimingFunction::Linear.evaluate(0.0), 0.0);
        assert_eq!(TimingFunction::Linear.evaluate(0.5), 0.5);
        assert_eq!(TimingFunction::Linear.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_cubic_endpoints_are_exact() {
        for timing in [
            TimingFunction::EaseInCubic,
            TimingFunction::EaseOutCubic,
            TimingFunction::EaseInOutCubic,
        ] {
            assert_eq!(timing.evaluate(0.0), 0.0, "{:?}", timing);
            assert_eq!(timing.evaluate(1.0), 1.0, "{:?}", timing);
        }
    }

    #[test]
    fn test_ease_out_cubic_front_loaded() {
        // Half the time covers 7/8 of the distance
        let result = TimingFunction::EaseOutCubic.evaluate(0.5);
        assert!((result - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_ease_in_cubic_slow_start() {
        let result = TimingFunction::EaseInCubic.evaluate(0.5);
        assert!((result - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_ease_in_out_cubic_symmetric() {
        let a = TimingFunction::EaseInOutCubic.evaluate(0.25);
        let b = TimingFunction::EaseInOutCubic.evaluate(0.75);
        assert!((a + b - 1.0).abs() < 1e-6);
        assert_eq!(TimingFunction::EaseInOutCubic.evaluate(0.5), 0.5);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(TimingFunction::EaseOutCubic.evaluate(1.7), 1.0);
        assert_eq!(TimingFunction::EaseInCubic.evaluate(-0.3), 0.0);
    }

    #[test]
    fn test_custom() {
        let step = TimingFunction::custom(|t| if t < 0.5 { 0.0 } else { 1.0 });
        assert_eq!(step.evaluate(0.4), 0.0);
        assert_eq!(step.evaluate(0.6), 1.0);
    }
}
