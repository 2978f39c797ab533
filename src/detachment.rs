//! Which particles leave the silhouette at a given timeline level, and where
//! they go.
//!
//! A permutation of particle indices is shuffled once from the session seed.
//! Walking it in rank order, each timeline step claims the slice of ranks its
//! cumulative quantity covers; that slice determines the step a particle is
//! first consumed at and the garment group it belongs to. The selected
//! [`DetachmentPolicy`] turns this into a single "introduced at step" value per
//! particle, so both detachment membership and highlighting are plain
//! comparisons against the level.

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec3;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::SceneConfig;
use crate::particles::{GroupId, ParticleId};
use crate::timeline::{Timeline, DEFAULT_GROUP};

/// How detached particles are selected for a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetachmentPolicy {
    /// The first `floor(count × percent)` particles of the permutation
    Quantile,
    /// Every particle whose garment group was introduced at or before the level
    #[default]
    Group,
}

/// A particle that must be off the silhouette at some level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detached {
    pub id: ParticleId,
    /// Shell point for this (level, particle) pair
    pub target: Vec3,
    /// Introduced at exactly this level
    pub highlighted: bool,
}

/// Result of assigning a level
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub level: i32,
    /// Sorted by particle id
    pub detached: Vec<Detached>,
}

impl Assignment {
    pub fn contains(&self, id: ParticleId) -> bool {
        self.detached
            .binary_search_by_key(&id, |d| d.id)
            .is_ok()
    }

    pub fn get(&self, id: ParticleId) -> Option<&Detached> {
        self.detached
            .binary_search_by_key(&id, |d| d.id)
            .ok()
            .map(|i| &self.detached[i])
    }

    pub fn len(&self) -> usize {
        self.detached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detached.is_empty()
    }
}

/// Write-once cache of shell points, generated a level at a time
#[derive(Debug, Clone)]
pub struct ShellTargets {
    seed: u64,
    count: usize,
    base_radius: f32,
    scale_max: f32,
    jitter: f32,
    by_level: HashMap<usize, Vec<Vec3>>,
}

impl ShellTargets {
    pub fn new(config: &SceneConfig, count: usize) -> Self {
        Self {
            seed: config.seed,
            count,
            base_radius: config.shell_base_radius,
            scale_max: config.shell_scale_max,
            jitter: config.shell_jitter,
            by_level: HashMap::new(),
        }
    }

    /// Shell radius multiplier; grows one unit per level up to the cap
    pub fn scale(&self, level: usize) -> f32 {
        ((level + 1) as f32).min(self.scale_max)
    }

    /// Nominal shell radius at `level`, before jitter
    pub fn radius(&self, level: usize) -> f32 {
        self.base_radius * self.scale(level)
    }

    pub fn target(&mut self, level: usize, id: ParticleId) -> Vec3 {
        if !self.by_level.contains_key(&level) {
            let points = self.generate(level);
            log::debug!("Generated {} shell targets for level {}", points.len(), level);
            self.by_level.insert(level, points);
        }
        self.by_level
            .get(&level)
            .and_then(|points| points.get(id.index()))
            .copied()
            .unwrap_or(Vec3::ZERO)
    }

    pub fn is_cached(&self, level: usize) -> bool {
        self.by_level.contains_key(&level)
    }

    fn generate(&self, level: usize) -> Vec<Vec3> {
        let stream = (level as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut rng = StdRng::seed_from_u64(self.seed ^ stream);
        let radius = self.radius(level);

        (0..self.count)
            .map(|_| {
                let factor = 1.0 + (rng.random::<f32>() - 0.5) * 2.0 * self.jitter;
                let r = radius * factor;
                let u: f32 = rng.random();
                let v: f32 = rng.random();
                let theta = TAU * u;
                let phi = (2.0 * v - 1.0).clamp(-1.0, 1.0).acos();
                Vec3::new(
                    r * phi.sin() * theta.cos(),
                    r * phi.sin() * theta.sin(),
                    r * phi.cos(),
                )
            })
            .collect()
    }
}

pub struct DetachmentAssignment {
    policy: DetachmentPolicy,
    permutation: Vec<ParticleId>,
    /// Step at which each particle first detaches, by particle index
    introduced_at: Vec<Option<u32>>,
    groups: Vec<GroupId>,
    group_keys: Vec<String>,
    shells: ShellTargets,
}

impl DetachmentAssignment {
    pub fn new(timeline: &Timeline, count: usize, config: &SceneConfig) -> Self {
        let mut permutation: Vec<ParticleId> = (0..count as u32).map(ParticleId).collect();
        let mut rng = StdRng::seed_from_u64(config.seed);
        permutation.shuffle(&mut rng);

        let mut group_keys: Vec<String> =
            timeline.group_keys().into_iter().map(str::to_string).collect();
        if group_keys.is_empty() {
            group_keys.push(DEFAULT_GROUP.to_string());
        }
        let step_group: Vec<GroupId> = timeline
            .steps()
            .iter()
            .map(|step| {
                let index = group_keys
                    .iter()
                    .position(|k| *k == step.group_key)
                    .unwrap_or(0);
                GroupId(index as u16)
            })
            .collect();
        let fallback_group = step_group.last().copied().unwrap_or(GroupId(0));

        // Step whose quantile slice contains each rank
        let cutoffs: Vec<usize> = (0..timeline.len() as i32)
            .map(|level| timeline.cutoff(level, count))
            .collect();
        let mut consumed_at: Vec<Option<u32>> = vec![None; count];
        let mut step = 0;
        for (rank, id) in permutation.iter().enumerate() {
            while step < cutoffs.len() && cutoffs[step] <= rank {
                step += 1;
            }
            if step < cutoffs.len() {
                consumed_at[id.index()] = Some(step as u32);
            }
        }

        let groups: Vec<GroupId> = consumed_at
            .iter()
            .map(|at| match at {
                Some(step) => step_group[*step as usize],
                None => fallback_group,
            })
            .collect();

        let introduced_at = match config.policy {
            DetachmentPolicy::Quantile => consumed_at,
            DetachmentPolicy::Group => {
                let first_step: Vec<Option<u32>> = group_keys
                    .iter()
                    .map(|key| timeline.first_step_of(key).map(|s| s as u32))
                    .collect();
                consumed_at
                    .iter()
                    .zip(&groups)
                    .map(|(at, group)| at.and(first_step[group.index()]))
                    .collect()
            }
        };

        log::info!(
            "Detachment assignment: {} particles, {} groups, {:?} policy",
            count,
            group_keys.len(),
            config.policy
        );

        Self {
            policy: config.policy,
            permutation,
            introduced_at,
            groups,
            group_keys,
            shells: ShellTargets::new(config, count),
        }
    }

    pub fn policy(&self) -> DetachmentPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.permutation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permutation.is_empty()
    }

    /// Particle indices in detachment order
    pub fn permutation(&self) -> &[ParticleId] {
        &self.permutation
    }

    /// Group of every particle, by particle index
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    pub fn group_keys(&self) -> &[String] {
        &self.group_keys
    }

    /// Step at which `id` first leaves the silhouette
    pub fn introduced_at(&self, id: ParticleId) -> Option<u32> {
        self.introduced_at.get(id.index()).copied().flatten()
    }

    pub fn is_detached(&self, id: ParticleId, level: i32) -> bool {
        match (self.introduced_at(id), u32::try_from(level)) {
            (Some(at), Ok(level)) => at <= level,
            _ => false,
        }
    }

    pub fn is_highlighted(&self, id: ParticleId, level: i32) -> bool {
        match (self.introduced_at(id), u32::try_from(level)) {
            (Some(at), Ok(level)) => at == level,
            _ => false,
        }
    }

    pub fn detach_count(&self, level: i32) -> usize {
        (0..self.len() as u32)
            .filter(|&i| self.is_detached(ParticleId(i), level))
            .count()
    }

    pub fn shells(&self) -> &ShellTargets {
        &self.shells
    }

    /// Shell point for `id` at `level`, cached on first use
    pub fn shell_target(&mut self, level: usize, id: ParticleId) -> Vec3 {
        self.shells.target(level, id)
    }

    /// Everything that must be detached at `level`, with shell points.
    /// Negative levels detach nothing.
    pub fn assign(&mut self, level: i32) -> Assignment {
        let Ok(shell_level) = usize::try_from(level) else {
            return Assignment {
                level,
                detached: Vec::new(),
            };
        };

        let mut detached = Vec::new();
        for i in 0..self.len() as u32 {
            let id = ParticleId(i);
            if self.is_detached(id, level) {
                detached.push(Detached {
                    id,
                    target: self.shells.target(shell_level, id),
                    highlighted: self.is_highlighted(id, level),
                });
            }
        }

        Assignment { level, detached }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::TimelineStep;

    fn timeline() -> Timeline {
        Timeline::new(vec![
            TimelineStep::new(10.0, "tee"),
            TimelineStep::new(30.0, "pants"),
            TimelineStep::new(100.0, "sneaks"),
        ])
        .unwrap()
    }

    fn config(policy: DetachmentPolicy) -> SceneConfig {
        SceneConfig::new().seed(42).policy(policy)
    }

    #[test]
    fn test_permutation_is_a_shuffle() {
        let assignment = DetachmentAssignment::new(&timeline(), 100, &config(DetachmentPolicy::Quantile));
        let mut sorted: Vec<u32> = assignment.permutation().iter().map(|id| id.0).collect();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
        let identity = assignment
            .permutation()
            .iter()
            .enumerate()
            .all(|(i, id)| id.index() == i);
        assert!(!identity);
    }

    #[test]
    fn test_quantile_counts() {
        let mut assignment =
            DetachmentAssignment::new(&timeline(), 100, &config(DetachmentPolicy::Quantile));
        assert_eq!(assignment.assign(-1).len(), 0);
        assert_eq!(assignment.assign(0).len(), 10);
        assert_eq!(assignment.assign(1).len(), 30);
        assert_eq!(assignment.assign(2).len(), 100);
    }

    #[test]
    fn test_quantile_follows_permutation_prefix() {
        let mut assignment =
            DetachmentAssignment::new(&timeline(), 100, &config(DetachmentPolicy::Quantile));
        let prefix: Vec<ParticleId> = assignment.permutation()[..30].to_vec();
        let assigned = assignment.assign(1);
        for id in prefix {
            assert!(assigned.contains(id));
        }
    }

    #[test]
    fn test_highlight_marks_current_slice() {
        let mut assignment =
            DetachmentAssignment::new(&timeline(), 100, &config(DetachmentPolicy::Quantile));
        let assigned = assignment.assign(1);
        let highlighted = assigned.detached.iter().filter(|d| d.highlighted).count();
        assert_eq!(highlighted, 20);
    }

    #[test]
    fn test_group_policy_with_distinct_keys_matches_quantile() {
        let mut groups = DetachmentAssignment::new(&timeline(), 100, &config(DetachmentPolicy::Group));
        let mut quantile =
            DetachmentAssignment::new(&timeline(), 100, &config(DetachmentPolicy::Quantile));
        for level in -1..3 {
            assert_eq!(groups.assign(level), quantile.assign(level));
        }
    }

    #[test]
    fn test_group_policy_detaches_whole_group_on_first_introduction() {
        let timeline = Timeline::new(vec![
            TimelineStep::new(10.0, "tee"),
            TimelineStep::new(30.0, "pants"),
            TimelineStep::new(100.0, "tee"),
        ])
        .unwrap();
        let mut assignment = DetachmentAssignment::new(&timeline, 100, &config(DetachmentPolicy::Group));
        // Step 0 introduces "tee": its slices from steps 0 and 2 (10 + 70)
        assert_eq!(assignment.assign(0).len(), 80);
        assert_eq!(assignment.assign(1).len(), 100);

        let tee = GroupId(0);
        let at_zero = assignment.assign(0);
        assert!(at_zero
            .detached
            .iter()
            .all(|d| assignment.groups()[d.id.index()] == tee && d.highlighted));
        let at_one = assignment.assign(1);
        let highlighted = at_one.detached.iter().filter(|d| d.highlighted).count();
        assert_eq!(highlighted, 20);
    }

    #[test]
    fn test_groups_follow_quantile_slices() {
        let assignment = DetachmentAssignment::new(&timeline(), 100, &config(DetachmentPolicy::Group));
        let mut per_group = [0usize; 3];
        for group in assignment.groups() {
            per_group[group.index()] += 1;
        }
        assert_eq!(per_group, [10, 20, 70]);
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let mut assignment =
            DetachmentAssignment::new(&timeline(), 100, &config(DetachmentPolicy::Quantile));
        let first = assignment.assign(1);
        let second = assignment.assign(1);
        assert_eq!(first, second);

        let mut fresh = DetachmentAssignment::new(&timeline(), 100, &config(DetachmentPolicy::Quantile));
        assert_eq!(fresh.assign(1), first);
    }

    #[test]
    fn test_shell_targets_respect_radius_and_jitter() {
        let mut assignment =
            DetachmentAssignment::new(&timeline(), 100, &config(DetachmentPolicy::Quantile));
        for level in 0..3usize {
            let radius = assignment.shells().radius(level);
            for i in 0..100 {
                let r = assignment.shell_target(level, ParticleId(i)).length();
                assert!(r >= radius * 0.9 - 1e-4 && r <= radius * 1.1 + 1e-4, "r = {}", r);
            }
        }
        assert_eq!(assignment.shells().scale(0), 1.0);
        assert_eq!(assignment.shells().scale(5), 3.0);
    }

    #[test]
    fn test_shell_targets_cached_per_level() {
        let mut shells = ShellTargets::new(&SceneConfig::new(), 10);
        assert!(!shells.is_cached(2));
        let a = shells.target(2, ParticleId(3));
        assert!(shells.is_cached(2));
        let b = shells.target(2, ParticleId(3));
        assert_eq!(a, b);
        assert_ne!(a, shells.target(1, ParticleId(3)));
    }

    #[test]
    fn test_empty_timeline_detaches_nothing() {
        let mut assignment =
            DetachmentAssignment::new(&Timeline::empty(), 50, &config(DetachmentPolicy::Group));
        assert_eq!(assignment.group_keys(), &[DEFAULT_GROUP.to_string()]);
        assert!(assignment.assign(0).is_empty());
        assert_eq!(assignment.detach_count(3), 0);
    }
}
