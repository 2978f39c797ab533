//! Camera dolly between timeline positions.
//!
//! The camera always looks at the origin. A single interpolation is active at
//! a time; [`CameraMotion::set`] replaces it outright.

use std::time::Instant;

use glam::{Mat4, Vec3};

use crate::animation::{TimingFunction, Transition, Tween};
use crate::config::SceneConfig;

pub struct CameraMotion {
    base: Vec3,
    travel: Vec3,
    position: Vec3,
    active: Option<Tween<Vec3>>,
}

impl CameraMotion {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            base: config.camera_base,
            travel: config.camera_travel,
            position: config.camera_base,
            active: None,
        }
    }

    /// Resting camera position for a consumed fraction
    pub fn position_for_percent(&self, percent: f32) -> Vec3 {
        self.base + self.travel * percent
    }

    /// Start a new dolly, superseding any running one
    pub fn set(&mut self, from: Vec3, to: Vec3, now: Instant, duration_ms: f32) {
        if self.active.is_some() {
            log::debug!("Camera animation superseded");
        }
        self.position = from;
        self.active = Some(Tween::new(
            from,
            to,
            now,
            Transition::new(duration_ms, TimingFunction::EaseInOutCubic),
        ));
    }

    pub fn tick(&mut self, now: Instant) {
        let Some(tween) = &self.active else {
            return;
        };
        self.position = tween.sample(now);
        if tween.is_finished(now) {
            self.active = None;
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn target(&self) -> Vec3 {
        self.active.as_ref().map_or(self.position, |t| t.to)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
    }
}
