//! Staged choreography for a single transition.
//!
//! A [`Sequence`] is a queue of actions separated by waits. The controller
//! pulls actions one at a time with [`Sequence::next_action`] and runs each
//! before asking for the next, so a wait always observes the effect of the
//! actions queued ahead of it.

use std::collections::VecDeque;
use std::time::Instant;

use crate::animation::elapsed_ms;

use super::Phase;

/// Something the controller does at a point in a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Fade the per-step overlay out
    HideOverlay,
    ShowIntro,
    HideIntro,
    ShowOutro,
    HideOutro,
    /// Dolly from the current level's camera position to `level`'s
    MoveCamera { level: i32 },
    /// Dolly back to the camera base from wherever the camera is
    CameraHome,
    /// Recompute the detachment assignment and flip particles
    Assign { level: i32 },
    BeginIntroMorph,
    /// Write the new current level
    Commit { level: i32 },
    /// Push overlay content for the current level
    PushOverlay,
    /// Release the lock and enter `phase`
    Settle(Phase),
}

/// Condition a sequence blocks on
#[derive(Debug, Clone, PartialEq)]
pub enum Wait {
    /// A fixed delay in milliseconds
    For(f32),
    /// Until no particle is detaching or reattaching, or `max_ms` passed
    Particles { max_ms: f32 },
    /// Until the whole-set morph back to the silhouette finished
    IntroMorph,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Do(Action),
    Wait(Wait),
}

#[derive(Debug, Default)]
pub struct Sequence {
    steps: VecDeque<Step>,
    waiting_since: Option<Instant>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, action: Action) -> Self {
        self.steps.push_back(Step::Do(action));
        self
    }

    pub fn wait(mut self, wait: Wait) -> Self {
        self.steps.push_back(Step::Wait(wait));
        self
    }

    pub fn is_done(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Next action that is due at `now`, or `None` while blocked on a wait.
    ///
    /// `ready` answers the state-dependent waits ([`Wait::Particles`] and
    /// [`Wait::IntroMorph`]). A wait's clock starts the first time it is
    /// reached.
    pub fn next_action(
        &mut self,
        now: Instant,
        mut ready: impl FnMut(&Wait) -> bool,
    ) -> Option<Action> {
        loop {
            let done = match self.steps.front()? {
                Step::Do(_) => true,
                Step::Wait(wait) => {
                    let since = *self.waiting_since.get_or_insert(now);
                    let waited = elapsed_ms(since, now);
                    match wait {
                        Wait::For(ms) => waited >= *ms,
                        Wait::Particles { max_ms } => {
                            if ready(wait) {
                                true
                            } else if waited >= *max_ms {
                                log::warn!("Particles did not settle within {}ms", max_ms);
                                true
                            } else {
                                false
                            }
                        }
                        Wait::IntroMorph => ready(wait),
                    }
                }
            };
            if !done {
                return None;
            }

            self.waiting_since = None;
            if let Some(Step::Do(action)) = self.steps.pop_front() {
                return Some(action);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_actions_run_until_a_wait() {
        let t0 = Instant::now();
        let mut sequence = Sequence::new()
            .then(Action::HideOverlay)
            .wait(Wait::For(320.0))
            .then(Action::Assign { level: 0 });

        assert_eq!(sequence.next_action(t0, |_| true), Some(Action::HideOverlay));
        assert_eq!(sequence.next_action(t0, |_| true), None);
        assert_eq!(sequence.next_action(t0 + ms(319), |_| true), None);
        assert_eq!(
            sequence.next_action(t0 + ms(320), |_| true),
            Some(Action::Assign { level: 0 })
        );
        assert!(sequence.is_done());
        assert_eq!(sequence.next_action(t0 + ms(400), |_| true), None);
    }

    #[test]
    fn test_wait_clock_starts_when_reached() {
        let t0 = Instant::now();
        let mut sequence = Sequence::new()
            .wait(Wait::IntroMorph)
            .wait(Wait::For(100.0))
            .then(Action::ShowIntro);

        assert_eq!(sequence.next_action(t0, |_| false), None);
        assert_eq!(sequence.next_action(t0 + ms(500), |_| true), None);
        assert_eq!(sequence.next_action(t0 + ms(599), |_| true), None);
        assert_eq!(
            sequence.next_action(t0 + ms(600), |_| true),
            Some(Action::ShowIntro)
        );
    }

    #[test]
    fn test_particle_wait_is_bounded() {
        let t0 = Instant::now();
        let mut sequence = Sequence::new()
            .wait(Wait::Particles { max_ms: 1200.0 })
            .then(Action::PushOverlay);

        assert_eq!(sequence.next_action(t0, |_| false), None);
        assert_eq!(sequence.next_action(t0 + ms(1199), |_| false), None);
        assert_eq!(
            sequence.next_action(t0 + ms(1200), |_| false),
            Some(Action::PushOverlay)
        );
    }

    #[test]
    fn test_particle_wait_ends_when_settled() {
        let t0 = Instant::now();
        let mut sequence = Sequence::new()
            .wait(Wait::Particles { max_ms: 1200.0 })
            .then(Action::Settle(Phase::Idle));
        let mut settled = false;
        assert_eq!(sequence.next_action(t0, |_| settled), None);
        settled = true;
        assert_eq!(
            sequence.next_action(t0 + ms(10), |_| settled),
            Some(Action::Settle(Phase::Idle))
        );
    }
}
