use glam::Vec3;

use crate::color::Color;
use crate::detachment::DetachmentPolicy;

/// Particle count used when the timeline carries no quantities at all
pub const FALLBACK_PARTICLE_COUNT: usize = 1500;

/// Timing, colour and layout constants for a session.
///
/// Everything here is read-only once the session is built; use the chained
/// setters to override individual values.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Seed for the detachment permutation, shell targets and rest rotations
    pub seed: u64,
    pub policy: DetachmentPolicy,
    /// Overrides the particle count derived from the timeline
    pub particle_count: Option<usize>,

    pub detach_duration_ms: f32,
    pub reattach_duration_ms: f32,
    pub camera_duration_ms: f32,
    /// Orbit spin-up and colour ramp window
    pub spin_ease_ms: f32,
    pub intro_morph_ms: f32,
    pub step_overlay_fade_ms: f32,
    pub intro_fade_ms: f32,
    pub outro_fade_ms: f32,

    /// Shared orbit speed in radians per second
    pub orbit_rate: f32,
    /// Shell radius at the first step
    pub shell_base_radius: f32,
    /// Cap on the per-level shell radius multiplier
    pub shell_scale_max: f32,
    /// Relative radius jitter applied per shell point (0.1 = ±10%)
    pub shell_jitter: f32,

    pub base_color: Color,
    pub detached_color: Color,
    pub highlight_color: Color,

    pub camera_base: Vec3,
    /// Offset added to `camera_base` when the timeline is fully consumed
    pub camera_travel: Vec3,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            policy: DetachmentPolicy::Group,
            particle_count: None,
            detach_duration_ms: 1200.0,
            reattach_duration_ms: 1200.0,
            camera_duration_ms: 900.0,
            spin_ease_ms: 900.0,
            intro_morph_ms: 1200.0,
            step_overlay_fade_ms: 320.0,
            intro_fade_ms: 700.0,
            outro_fade_ms: 800.0,
            // 0.004 rad per frame at 60 fps
            orbit_rate: 0.24,
            shell_base_radius: 1.0,
            shell_scale_max: 3.0,
            shell_jitter: 0.1,
            base_color: Color::WHITE,
            detached_color: Color::from_hex(0x3C414A),
            highlight_color: Color::from_hex(0xFF0038),
            camera_base: Vec3::splat(1.25),
            camera_travel: Vec3::splat(1.75),
        }
    }
}

impl SceneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn policy(mut self, policy: DetachmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn particle_count(mut self, count: usize) -> Self {
        self.particle_count = Some(count);
        self
    }

    pub fn detach_duration(mut self, ms: f32) -> Self {
        self.detach_duration_ms = ms;
        self
    }

    pub fn reattach_duration(mut self, ms: f32) -> Self {
        self.reattach_duration_ms = ms;
        self
    }

    pub fn camera_duration(mut self, ms: f32) -> Self {
        self.camera_duration_ms = ms;
        self
    }

    pub fn orbit_rate(mut self, radians_per_sec: f32) -> Self {
        self.orbit_rate = radians_per_sec;
        self
    }

    pub fn colors(mut self, base: Color, detached: Color, highlight: Color) -> Self {
        self.base_color = base;
        self.detached_color = detached;
        self.highlight_color = highlight;
        self
    }

    /// Longest time a single particle animation can take
    pub fn settle_bound_ms(&self) -> f32 {
        self.detach_duration_ms.max(self.reattach_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = SceneConfig::new()
            .seed(7)
            .policy(DetachmentPolicy::Quantile)
            .particle_count(42)
            .reattach_duration(1500.0);
        assert_eq!(config.seed, 7);
        assert_eq!(config.policy, DetachmentPolicy::Quantile);
        assert_eq!(config.particle_count, Some(42));
        assert_eq!(config.settle_bound_ms(), 1500.0);
    }
}
