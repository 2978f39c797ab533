//! Canonical storage for the silhouette's particles.
//!
//! The store is created once per session and never grows or shrinks; the
//! controller rewrites lifecycle records and the driver writes interpolated
//! position and colour.

pub mod instances;

use std::f32::consts::TAU;
use std::time::Instant;

use glam::{EulerRot, Quat, Vec3};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::animation::Tween;
use crate::color::Color;

/// Stream offset so rotations do not share a sequence with the permutation
const ROTATION_STREAM: u64 = 0x5EED_0F0F_0A11_CE55;

/// Stable index of a particle, assigned at creation and never reused
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ParticleId(pub u32);

impl ParticleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the store's group key table
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct GroupId(pub u16);

impl GroupId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Coarse lifecycle phase, without the animation record
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LifecycleState {
    Attached,
    Detaching,
    Orbiting,
    Reattaching,
}

/// Orbit around the vertical axis at a fixed radius and height
#[derive(Clone, Debug)]
pub struct Orbit {
    /// Shell point the particle detached to
    pub target: Vec3,
    pub radius: f32,
    pub height: f32,
    /// Angle in the XZ plane, measured from +X toward +Z
    pub phase: f32,
    pub started: Instant,
    /// Colour ramp toward the accent; restarted when the accent changes
    pub tint: Tween<Color>,
}

impl Orbit {
    /// Orbit that starts exactly at `arrival`
    pub fn entered_at(arrival: Vec3, started: Instant, tint: Tween<Color>) -> Self {
        Self {
            target: arrival,
            radius: (arrival.x * arrival.x + arrival.z * arrival.z).sqrt(),
            height: arrival.y,
            phase: arrival.z.atan2(arrival.x),
            started,
            tint,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(
            self.radius * self.phase.cos(),
            self.height,
            self.radius * self.phase.sin(),
        )
    }
}

/// Per-particle animation record. Exactly one record exists at a time.
#[derive(Clone, Debug)]
pub enum Lifecycle {
    Attached,
    Detaching {
        /// `flight.to` is the detach target for this episode
        flight: Tween<Vec3>,
        accent: Color,
    },
    Orbiting(Orbit),
    Reattaching {
        flight: Tween<Vec3>,
        tint: Tween<Color>,
        /// Kept until the particle is attached again
        target: Vec3,
    },
}

impl Lifecycle {
    pub fn state(&self) -> LifecycleState {
        match self {
            Lifecycle::Attached => LifecycleState::Attached,
            Lifecycle::Detaching { .. } => LifecycleState::Detaching,
            Lifecycle::Orbiting(_) => LifecycleState::Orbiting,
            Lifecycle::Reattaching { .. } => LifecycleState::Reattaching,
        }
    }

    /// Shell point of the current detach episode
    pub fn detach_target(&self) -> Option<Vec3> {
        match self {
            Lifecycle::Attached => None,
            Lifecycle::Detaching { flight, .. } => Some(flight.to),
            Lifecycle::Orbiting(orbit) => Some(orbit.target),
            Lifecycle::Reattaching { target, .. } => Some(*target),
        }
    }

    /// True while a timed flight is running
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Lifecycle::Detaching { .. } | Lifecycle::Reattaching { .. }
        )
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub id: ParticleId,
    pub group: GroupId,
    pub rest_position: Vec3,
    pub rest_rotation: Quat,
    pub lifecycle: Lifecycle,
    /// Interpolated position, written by the driver
    pub position: Vec3,
    /// Interpolated colour, written by the driver
    pub color: Color,
}

impl Particle {
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn orbit_phase(&self) -> Option<f32> {
        match &self.lifecycle {
            Lifecycle::Orbiting(orbit) => Some(orbit.phase),
            _ => None,
        }
    }
}

pub struct ParticleStore {
    particles: Vec<Particle>,
    group_keys: Vec<String>,
}

impl ParticleStore {
    /// Build the store.
    ///
    /// `groups[i]` is the group of particle `i`; the rest position of particle
    /// `i` is silhouette vertex `i mod len`. An empty silhouette collapses the
    /// figure to the origin instead of failing.
    pub fn new(
        group_keys: Vec<String>,
        groups: &[GroupId],
        silhouette: &[Vec3],
        seed: u64,
        base_color: Color,
    ) -> Self {
        if silhouette.is_empty() {
            log::warn!("Silhouette is empty, particles rest at the origin");
        }

        let mut rng = StdRng::seed_from_u64(seed ^ ROTATION_STREAM);
        let particles = groups
            .iter()
            .enumerate()
            .map(|(i, &group)| {
                let rest_position = if silhouette.is_empty() {
                    Vec3::ZERO
                } else {
                    silhouette[i % silhouette.len()]
                };
                let rest_rotation = Quat::from_euler(
                    EulerRot::XYZ,
                    rng.random::<f32>() * TAU,
                    rng.random::<f32>() * TAU,
                    rng.random::<f32>() * TAU,
                );
                Particle {
                    id: ParticleId(i as u32),
                    group,
                    rest_position,
                    rest_rotation,
                    lifecycle: Lifecycle::Attached,
                    position: rest_position,
                    color: base_color,
                }
            })
            .collect();

        Self {
            particles,
            group_keys,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn all(&self) -> &[Particle] {
        &self.particles
    }

    pub fn all_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id.index())
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id.index())
    }

    pub fn group_keys(&self) -> &[String] {
        &self.group_keys
    }

    pub fn group_key(&self, group: GroupId) -> Option<&str> {
        self.group_keys.get(group.index()).map(String::as_str)
    }

    pub fn group_id(&self, key: &str) -> Option<GroupId> {
        self.group_keys
            .iter()
            .position(|k| k == key)
            .map(|i| GroupId(i as u16))
    }

    pub fn particles_in_group<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a Particle> + 'a {
        let group = self.group_id(key);
        self.particles
            .iter()
            .filter(move |p| Some(p.group) == group)
    }

    /// Particles currently flying between the figure and the shell
    pub fn in_flight(&self) -> usize {
        self.particles
            .iter()
            .filter(|p| p.lifecycle.is_in_flight())
            .count()
    }

    pub fn count_in(&self, state: LifecycleState) -> usize {
        self.particles.iter().filter(|p| p.state() == state).count()
    }
}
