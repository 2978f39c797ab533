//! The session object: owns every piece of scene state and runs transitions
//! between timeline levels.
//!
//! Only one transition runs at a time. While it runs, step requests are
//! answered with [`StepRequest::Busy`] and dropped.

mod sequence;

pub use sequence::{Action, Sequence, Step, Wait};

use std::time::Instant;

use glam::Vec3;

use crate::camera::CameraMotion;
use crate::config::{SceneConfig, FALLBACK_PARTICLE_COUNT};
use crate::detachment::{Assignment, DetachmentAssignment};
use crate::driver::AnimationDriver;
use crate::particles::instances::InstanceSet;
use crate::particles::{LifecycleState, ParticleStore};
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before the first step, everything attached
    AtIntro,
    /// Settled on a timeline step
    Idle,
    /// Past the last step
    AtOutro,
    Transitioning(Direction),
}

/// Outcome of a step request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRequest {
    /// A transition started
    Accepted,
    /// A transition is already running; the request was dropped
    Busy,
    /// The request resolves to the level already shown
    Unchanged,
    /// The timeline has no steps
    Disabled,
}

/// What the per-step overlay shows for a level
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayContent {
    pub level: i32,
    pub label: String,
    pub quantity: f64,
    /// One-based position in the timeline
    pub step_index: usize,
    pub total_steps: usize,
    pub era: Option<String>,
    pub reference_url: Option<String>,
}

/// Callback receiving the overlay content for a newly settled step
pub type OverlayCallback = Box<dyn FnMut(&OverlayContent)>;
/// Callback without arguments, used for show/hide signals
pub type SignalCallback = Box<dyn FnMut()>;
/// Callback receiving the level a transition settled on
pub type SettledCallback = Box<dyn FnMut(i32)>;

/// Optional hooks into the page around the scene. Missing hooks are no-ops.
#[derive(Default)]
pub struct OverlayHooks {
    update_overlay: Option<OverlayCallback>,
    hide_overlay: Option<SignalCallback>,
    show_intro: Option<SignalCallback>,
    hide_intro: Option<SignalCallback>,
    show_outro: Option<SignalCallback>,
    hide_outro: Option<SignalCallback>,
    on_step_settled: Option<SettledCallback>,
}

impl OverlayHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_overlay<F: FnMut(&OverlayContent) + 'static>(mut self, callback: F) -> Self {
        self.update_overlay = Some(Box::new(callback));
        self
    }

    pub fn hide_overlay<F: FnMut() + 'static>(mut self, callback: F) -> Self {
        self.hide_overlay = Some(Box::new(callback));
        self
    }

    pub fn show_intro<F: FnMut() + 'static>(mut self, callback: F) -> Self {
        self.show_intro = Some(Box::new(callback));
        self
    }

    pub fn hide_intro<F: FnMut() + 'static>(mut self, callback: F) -> Self {
        self.hide_intro = Some(Box::new(callback));
        self
    }

    pub fn show_outro<F: FnMut() + 'static>(mut self, callback: F) -> Self {
        self.show_outro = Some(Box::new(callback));
        self
    }

    pub fn hide_outro<F: FnMut() + 'static>(mut self, callback: F) -> Self {
        self.hide_outro = Some(Box::new(callback));
        self
    }

    pub fn on_step_settled<F: FnMut(i32) + 'static>(mut self, callback: F) -> Self {
        self.on_step_settled = Some(Box::new(callback));
        self
    }
}

fn signal(callback: &mut Option<SignalCallback>) {
    if let Some(callback) = callback {
        callback();
    }
}

pub struct StepController {
    config: SceneConfig,
    timeline: Timeline,
    store: ParticleStore,
    detachment: DetachmentAssignment,
    assignment: Assignment,
    driver: AnimationDriver,
    camera: CameraMotion,
    instances: InstanceSet,
    hooks: OverlayHooks,
    current_level: i32,
    phase: Phase,
    /// The running transition; `Some` exactly while locked
    sequence: Option<Sequence>,
}

impl StepController {
    pub fn new(
        config: SceneConfig,
        timeline: Timeline,
        silhouette: &[Vec3],
        mut hooks: OverlayHooks,
        now: Instant,
    ) -> Self {
        let count = particle_count(&config, &timeline);
        let mut detachment = DetachmentAssignment::new(&timeline, count, &config);
        let mut store = ParticleStore::new(
            detachment.group_keys().to_vec(),
            detachment.groups(),
            silhouette,
            config.seed,
            config.base_color,
        );
        let assignment = detachment.assign(-1);
        let mut driver = AnimationDriver::new(&config);
        driver.tick(&mut store, now);
        let instances = InstanceSet::new(&store);
        let camera = CameraMotion::new(&config);

        if timeline.is_empty() {
            log::warn!("Timeline has no steps, step navigation is disabled");
        }
        log::info!(
            "Session ready: {} particles, {} steps",
            store.len(),
            timeline.len()
        );

        signal(&mut hooks.show_intro);

        Self {
            config,
            timeline,
            store,
            detachment,
            assignment,
            driver,
            camera,
            instances,
            hooks,
            current_level: -1,
            phase: Phase::AtIntro,
            sequence: None,
        }
    }

    /// Move `delta` steps from the current level
    pub fn request_step_delta(&mut self, delta: i32, now: Instant) -> StepRequest {
        self.goto_step(self.current_level.saturating_add(delta), now)
    }

    /// Jump straight to `level`
    pub fn request_step_absolute(&mut self, level: i32, now: Instant) -> StepRequest {
        self.goto_step(level, now)
    }

    /// Start a transition to `target`, clamped to `[-1, len]`.
    ///
    /// `-1` is the intro and `len` the outro; anything between is a timeline
    /// step.
    pub fn goto_step(&mut self, target: i32, now: Instant) -> StepRequest {
        if self.timeline.is_empty() {
            return StepRequest::Disabled;
        }
        if self.is_animating() {
            log::trace!("Step request to {} dropped, transition running", target);
            return StepRequest::Busy;
        }

        let len = self.len();
        let target = target.clamp(-1, len);
        if target == self.current_level {
            return StepRequest::Unchanged;
        }

        let direction = if target > self.current_level {
            Direction::Forward
        } else {
            Direction::Backward
        };
        let sequence = if target == len {
            self.outro_sequence()
        } else if target == -1 {
            self.intro_sequence()
        } else {
            self.step_sequence(target)
        };

        log::debug!(
            "Transition {} -> {} ({:?})",
            self.current_level,
            target,
            direction
        );
        self.phase = Phase::Transitioning(direction);
        self.sequence = Some(sequence);
        self.advance(now);
        StepRequest::Accepted
    }

    /// Advance every animation to `now` and run whatever the current
    /// transition has due
    pub fn tick(&mut self, now: Instant) {
        self.driver.tick(&mut self.store, now);
        self.camera.tick(now);
        self.advance(now);
        self.instances.sync(&self.store);
    }

    pub fn is_animating(&self) -> bool {
        self.sequence.is_some()
    }

    pub fn current_level(&self) -> i32 {
        self.current_level
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn detachment(&self) -> &DetachmentAssignment {
        &self.detachment
    }

    /// Detachment currently applied to the particles
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn camera(&self) -> &CameraMotion {
        &self.camera
    }

    pub fn instances(&self) -> &InstanceSet {
        &self.instances
    }

    pub fn instances_mut(&mut self) -> &mut InstanceSet {
        &mut self.instances
    }

    /// Overlay content for `level`, if it is a timeline step
    pub fn overlay_content(&self, level: i32) -> Option<OverlayContent> {
        let step = self.timeline.get(level)?;
        Some(OverlayContent {
            level,
            label: step.display_label().to_string(),
            quantity: step.cumulative_quantity,
            step_index: level as usize + 1,
            total_steps: self.timeline.len(),
            era: step.era.as_ref().map(ToString::to_string),
            reference_url: step.reference_url.clone(),
        })
    }

    fn len(&self) -> i32 {
        i32::try_from(self.timeline.len()).unwrap_or(i32::MAX)
    }

    /// Fade out whatever overlay the current level shows
    fn hide_current(&self, sequence: Sequence) -> Sequence {
        if self.current_level == -1 {
            sequence
                .then(Action::HideIntro)
                .wait(Wait::For(self.config.intro_fade_ms))
        } else if self.current_level == self.len() {
            sequence
                .then(Action::HideOutro)
                .wait(Wait::For(self.config.intro_fade_ms))
        } else {
            sequence
                .then(Action::HideOverlay)
                .wait(Wait::For(self.config.step_overlay_fade_ms))
        }
    }

    fn step_sequence(&self, target: i32) -> Sequence {
        self.hide_current(Sequence::new())
            .then(Action::MoveCamera { level: target })
            .then(Action::Assign { level: target })
            .wait(Wait::Particles {
                max_ms: self.config.settle_bound_ms(),
            })
            .then(Action::Commit { level: target })
            .then(Action::PushOverlay)
            .then(Action::Settle(Phase::Idle))
    }

    fn intro_sequence(&self) -> Sequence {
        self.hide_current(Sequence::new())
            .then(Action::BeginIntroMorph)
            .then(Action::CameraHome)
            .wait(Wait::IntroMorph)
            .then(Action::Commit { level: -1 })
            .then(Action::ShowIntro)
            .then(Action::Settle(Phase::AtIntro))
    }

    fn outro_sequence(&self) -> Sequence {
        let last = self.len() - 1;
        let hide = match self.current_level {
            -1 => Action::HideIntro,
            _ => Action::HideOverlay,
        };
        let mut sequence = Sequence::new().then(hide).then(Action::ShowOutro);
        if self.current_level != last {
            sequence = sequence
                .then(Action::MoveCamera { level: last })
                .then(Action::Assign { level: last })
                .wait(Wait::Particles {
                    max_ms: self.config.settle_bound_ms(),
                });
        }
        sequence
            .wait(Wait::For(self.config.outro_fade_ms))
            .then(Action::Commit { level: last + 1 })
            .then(Action::Settle(Phase::AtOutro))
    }

    /// Run every action of the current transition that is due at `now`
    fn advance(&mut self, now: Instant) {
        loop {
            let settled = self.store.in_flight() == 0;
            let morphing = self.driver.is_morphing();
            let Some(sequence) = self.sequence.as_mut() else {
                return;
            };
            let next = sequence.next_action(now, |wait| match wait {
                Wait::IntroMorph => !morphing,
                _ => settled,
            });
            match next {
                Some(action) => self.run(action, now),
                None => {
                    if sequence.is_done() {
                        log::warn!("Transition ended without settling");
                        self.sequence = None;
                    }
                    return;
                }
            }
        }
    }

    fn run(&mut self, action: Action, now: Instant) {
        log::trace!("Running {:?}", action);
        match action {
            Action::HideOverlay => signal(&mut self.hooks.hide_overlay),
            Action::ShowIntro => signal(&mut self.hooks.show_intro),
            Action::HideIntro => signal(&mut self.hooks.hide_intro),
            Action::ShowOutro => signal(&mut self.hooks.show_outro),
            Action::HideOutro => signal(&mut self.hooks.hide_outro),
            Action::MoveCamera { level } => {
                let from = self
                    .camera
                    .position_for_percent(self.timeline.percent(self.current_level));
                let to = self
                    .camera
                    .position_for_percent(self.timeline.percent(level));
                self.camera
                    .set(from, to, now, self.config.camera_duration_ms);
            }
            Action::CameraHome => {
                let from = self.camera.position();
                let to = self.camera.position_for_percent(0.0);
                self.camera
                    .set(from, to, now, self.config.camera_duration_ms);
            }
            Action::Assign { level } => self.apply_assignment(level, now),
            Action::BeginIntroMorph => {
                self.assignment = self.detachment.assign(-1);
                self.driver.begin_intro_morph(&mut self.store, now);
            }
            Action::Commit { level } => self.current_level = level,
            Action::PushOverlay => {
                if let Some(content) = self.overlay_content(self.current_level) {
                    if let Some(callback) = &mut self.hooks.update_overlay {
                        callback(&content);
                    }
                }
            }
            Action::Settle(phase) => {
                self.phase = phase;
                self.sequence = None;
                if phase == Phase::Idle {
                    if let Some(callback) = &mut self.hooks.on_step_settled {
                        callback(self.current_level);
                    }
                }
                log::debug!("Settled at level {} ({:?})", self.current_level, phase);
            }
        }
    }

    /// Flip particles so the store matches the assignment for `level`.
    /// Levels past the last step keep the last step's assignment.
    fn apply_assignment(&mut self, level: i32, now: Instant) {
        let next = self.detachment.assign(level.min(self.len() - 1));
        let mut detaching = 0;
        let mut reattaching = 0;

        for particle in self.store.all_mut() {
            match next.get(particle.id) {
                Some(detached) => {
                    let accent = if detached.highlighted {
                        self.config.highlight_color
                    } else {
                        self.config.detached_color
                    };
                    match particle.state() {
                        LifecycleState::Attached | LifecycleState::Reattaching => {
                            self.driver.detach(particle, detached.target, accent, now);
                            detaching += 1;
                        }
                        LifecycleState::Detaching | LifecycleState::Orbiting => {
                            self.driver.retint(particle, accent, now);
                        }
                    }
                }
                None => {
                    if matches!(
                        particle.state(),
                        LifecycleState::Detaching | LifecycleState::Orbiting
                    ) {
                        self.driver.reattach(particle, now);
                        reattaching += 1;
                    }
                }
            }
        }

        log::debug!(
            "Assignment for level {}: {} detached, {} detaching, {} reattaching",
            level,
            next.len(),
            detaching,
            reattaching
        );
        self.assignment = next;
    }
}

/// The timeline's total quantity, unless overridden; the fallback count when
/// the timeline has nothing to count
fn particle_count(config: &SceneConfig, timeline: &Timeline) -> usize {
    if let Some(count) = config.particle_count {
        return count;
    }
    let total = timeline.total_quantity().round();
    if total >= 1.0 {
        total as usize
    } else {
        FALLBACK_PARTICLE_COUNT
    }
}
