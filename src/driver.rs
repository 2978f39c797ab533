//! Per-frame particle animation.
//!
//! The driver is the only writer of interpolated positions and colours. It
//! reads each particle's lifecycle record, samples it at the frame timestamp
//! and performs the automatic transitions (`Detaching -> Orbiting` and
//! `Reattaching -> Attached`). The transitions that depend on the timeline
//! level are written by the controller through [`AnimationDriver::detach`],
//! [`AnimationDriver::reattach`] and [`AnimationDriver::retint`].

use std::f32::consts::TAU;
use std::time::Instant;

use glam::Vec3;

use crate::animation::{elapsed_ms, Animatable, TimingFunction, Transition, Tween};
use crate::color::Color;
use crate::config::SceneConfig;
use crate::particles::{Lifecycle, Orbit, Particle, ParticleStore};

/// Whole-set morph back to the silhouette, bypassing per-particle records
#[derive(Debug, Clone)]
struct IntroMorph {
    started: Instant,
    from: Vec<(Vec3, Color)>,
}

pub struct AnimationDriver {
    detach: Transition,
    reattach: Transition,
    spin: Transition,
    intro: Transition,
    /// Shared by every orbiting particle, radians per second
    orbit_rate: f32,
    base_color: Color,
    last_tick: Option<Instant>,
    intro_morph: Option<IntroMorph>,
}

impl AnimationDriver {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            detach: Transition::new(config.detach_duration_ms, TimingFunction::EaseOutCubic),
            reattach: Transition::new(config.reattach_duration_ms, TimingFunction::EaseOutCubic),
            spin: Transition::new(config.spin_ease_ms, TimingFunction::EaseInCubic),
            intro: Transition::new(config.intro_morph_ms, TimingFunction::Linear),
            orbit_rate: config.orbit_rate,
            base_color: config.base_color,
            last_tick: None,
            intro_morph: None,
        }
    }

    pub fn base_color(&self) -> Color {
        self.base_color
    }

    /// Start a detach episode from wherever the particle currently is.
    ///
    /// Any previous record is discarded, so a particle flipped mid-flight
    /// turns around without jumping.
    pub fn detach(&self, particle: &mut Particle, target: Vec3, accent: Color, now: Instant) {
        particle.lifecycle = Lifecycle::Detaching {
            flight: Tween::new(particle.position, target, now, self.detach.clone()),
            accent,
        };
    }

    /// Send the particle home from its current position and colour
    pub fn reattach(&self, particle: &mut Particle, now: Instant) {
        let Some(target) = particle.lifecycle.detach_target() else {
            return;
        };
        particle.lifecycle = Lifecycle::Reattaching {
            flight: Tween::new(
                particle.position,
                particle.rest_position,
                now,
                self.reattach.clone(),
            ),
            tint: Tween::new(particle.color, self.base_color, now, self.reattach.clone()),
            target,
        };
    }

    /// Point a detached particle's colour at a new accent
    pub fn retint(&self, particle: &mut Particle, accent: Color, now: Instant) {
        let current = particle.color;
        match &mut particle.lifecycle {
            Lifecycle::Detaching { accent: a, .. } => *a = accent,
            Lifecycle::Orbiting(orbit) if orbit.tint.to != accent => {
                orbit.tint = Tween::new(current, accent, now, self.spin.clone());
            }
            _ => {}
        }
    }

    /// Capture what is on screen and morph every particle straight back to
    /// its rest position and the base colour. All lifecycle records are
    /// cleared immediately.
    pub fn begin_intro_morph(&mut self, store: &mut ParticleStore, now: Instant) {
        let from = store
            .all()
            .iter()
            .map(|p| (p.position, p.color))
            .collect();
        for particle in store.all_mut() {
            particle.lifecycle = Lifecycle::Attached;
        }
        self.intro_morph = Some(IntroMorph { started: now, from });
        log::debug!("Intro morph started");
    }

    pub fn is_morphing(&self) -> bool {
        self.intro_morph.is_some()
    }

    /// Advance every particle to `now`
    pub fn tick(&mut self, store: &mut ParticleStore, now: Instant) {
        let dt_secs = self
            .last_tick
            .map_or(0.0, |last| elapsed_ms(last, now) / 1000.0);
        self.last_tick = Some(now);

        if let Some(morph) = &self.intro_morph {
            let t = self.intro.eased(morph.started, now);
            let finished = self.intro.is_finished(morph.started, now);
            for (particle, (from_pos, from_color)) in store.all_mut().iter_mut().zip(&morph.from) {
                if finished {
                    particle.position = particle.rest_position;
                    particle.color = self.base_color;
                } else {
                    particle.position = <Vec3 as Animatable>::lerp(from_pos, &particle.rest_position, t);
                    particle.color = Color::lerp_hsl(*from_color, self.base_color, t);
                }
            }
            if finished {
                self.intro_morph = None;
                log::debug!("Intro morph finished");
            }
            return;
        }

        for particle in store.all_mut() {
            self.advance(particle, dt_secs, now);
        }
    }

    fn advance(&self, particle: &mut Particle, dt_secs: f32, now: Instant) {
        match &mut particle.lifecycle {
            Lifecycle::Attached => {
                particle.position = particle.rest_position;
                particle.color = self.base_color;
            }
            Lifecycle::Detaching { flight, accent } => {
                if flight.is_finished(now) {
                    let arrival = flight.to;
                    let tint = Tween::new(particle.color, *accent, now, self.spin.clone());
                    particle.position = arrival;
                    particle.lifecycle = Lifecycle::Orbiting(Orbit::entered_at(arrival, now, tint));
                } else {
                    particle.position = flight.sample(now);
                }
            }
            Lifecycle::Orbiting(orbit) => {
                let ramp = self.spin.eased(orbit.started, now);
                orbit.phase = (orbit.phase + self.orbit_rate * ramp * dt_secs).rem_euclid(TAU);
                particle.position = orbit.position();
                particle.color = orbit.tint.sample(now);
            }
            Lifecycle::Reattaching { flight, tint, .. } => {
                if flight.is_finished(now) && tint.is_finished(now) {
                    particle.lifecycle = Lifecycle::Attached;
                    particle.position = particle.rest_position;
                    particle.color = self.base_color;
                } else {
                    particle.position = flight.sample(now);
                    particle.color = tint.sample(now);
                }
            }
        }
    }
}
