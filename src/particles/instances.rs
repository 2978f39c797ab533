//! GPU-facing instance data for drawing the particles.
//!
//! Particles are drawn as one instanced mesh per garment group. Each batch
//! holds tightly packed [`ParticleInstance`] records that a renderer can upload
//! with `bytemuck::cast_slice`, plus [`ChangeFlags`] telling it which
//! attributes changed since the last upload.

use bitflags::bitflags;
use glam::Mat4;

use super::{ParticleId, ParticleStore};

bitflags! {
    /// Which instance attributes need re-uploading
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ChangeFlags: u8 {
        /// Model matrices changed
        const TRANSFORMS = 0b01;
        /// Instance colours changed
        const COLORS     = 0b10;
    }
}

/// Per-instance data for one particle.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    /// Column-major model matrix (rest rotation, animated translation)
    pub model: [[f32; 4]; 4],
    /// Linear RGBA
    pub color: [f32; 4],
}

/// All instances of one garment group
#[derive(Debug, Clone)]
pub struct InstanceBatch {
    /// Index into the store's group key table
    pub group: usize,
    /// Particle drawn by each instance slot
    pub particles: Vec<ParticleId>,
    pub instances: Vec<ParticleInstance>,
    pub changes: ChangeFlags,
}

impl InstanceBatch {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    /// Return and clear the pending change flags
    pub fn take_changes(&mut self) -> ChangeFlags {
        std::mem::replace(&mut self.changes, ChangeFlags::empty())
    }
}

/// Instance batches for every group, in group table order
#[derive(Debug, Clone)]
pub struct InstanceSet {
    batches: Vec<InstanceBatch>,
    /// Particle index -> (batch, slot)
    slots: Vec<(usize, usize)>,
}

impl InstanceSet {
    pub fn new(store: &ParticleStore) -> Self {
        let mut batches: Vec<InstanceBatch> = (0..store.group_keys().len().max(1))
            .map(|group| InstanceBatch {
                group,
                particles: Vec::new(),
                instances: Vec::new(),
                changes: ChangeFlags::all(),
            })
            .collect();
        let mut slots = Vec::with_capacity(store.len());

        for particle in store.all() {
            let batch_index = particle.group.index().min(batches.len() - 1);
            let batch = &mut batches[batch_index];
            slots.push((batch_index, batch.particles.len()));
            batch.particles.push(particle.id);
            batch.instances.push(instance_for(particle));
        }

        log::debug!(
            "Instance batches: {:?}",
            batches.iter().map(|b| b.instances.len()).collect::<Vec<_>>()
        );

        Self { batches, slots }
    }

    /// Copy the driver's interpolated values into the instance records
    pub fn sync(&mut self, store: &ParticleStore) {
        for particle in store.all() {
            let Some(&(batch_index, slot)) = self.slots.get(particle.id.index()) else {
                continue;
            };
            let batch = &mut self.batches[batch_index];
            let next = instance_for(particle);
            let current = &mut batch.instances[slot];
            if current.model != next.model {
                current.model = next.model;
                batch.changes |= ChangeFlags::TRANSFORMS;
            }
            if current.color != next.color {
                current.color = next.color;
                batch.changes |= ChangeFlags::COLORS;
            }
        }
    }

    pub fn batches(&self) -> &[InstanceBatch] {
        &self.batches
    }

    pub fn batches_mut(&mut self) -> &mut [InstanceBatch] {
        &mut self.batches
    }

    /// Batch and slot drawing `id`
    pub fn slot_of(&self, id: ParticleId) -> Option<(usize, usize)> {
        self.slots.get(id.index()).copied()
    }
}

fn instance_for(particle: &super::Particle) -> ParticleInstance {
    let model = Mat4::from_rotation_translation(particle.rest_rotation, particle.position);
    ParticleInstance {
        model: model.to_cols_array_2d(),
        color: particle.color.to_array(),
    }
}
