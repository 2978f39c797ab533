mod animatable;
mod timing;

use std::time::Instant;

pub use animatable::Animatable;
pub use timing::TimingFunction;

/// Milliseconds elapsed from `since` to `now`, zero if `now` is earlier
pub fn elapsed_ms(since: Instant, now: Instant) -> f32 {
    now.saturating_duration_since(since).as_micros() as f32 / 1000.0
}

/// Configuration for how a value should animate when it changes
#[derive(Clone, Debug)]
pub struct Transition {
    /// Duration of the animation in milliseconds
    pub duration_ms: f32,
    /// Timing function controlling the animation curve
    pub timing: TimingFunction,
    /// Delay before animation starts in milliseconds
    pub delay_ms: f32,
}

impl Transition {
    /// Create a new transition with the given duration and timing function
    pub fn new(duration_ms: f32, timing: TimingFunction) -> Self {
        Self {
            duration_ms,
            timing,
            delay_ms: 0.0,
        }
    }

    /// Set the delay before the animation starts
    pub fn delay(mut self, delay_ms: f32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Raw progress in `[0, 1]` for an animation started at `started`.
    /// A zero duration completes immediately.
    pub fn progress(&self, started: Instant, now: Instant) -> f32 {
        let elapsed = (elapsed_ms(started, now) - self.delay_ms).max(0.0);
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (elapsed / self.duration_ms).min(1.0)
    }

    /// Eased progress for an animation started at `started`
    pub fn eased(&self, started: Instant, now: Instant) -> f32 {
        self.timing.evaluate(self.progress(started, now))
    }

    pub fn is_finished(&self, started: Instant, now: Instant) -> bool {
        self.progress(started, now) >= 1.0
    }
}

/// A single timed interpolation between two values
#[derive(Clone, Debug)]
pub struct Tween<T: Animatable> {
    pub from: T,
    pub to: T,
    pub started: Instant,
    pub transition: Transition,
}

impl<T: Animatable> Tween<T> {
    pub fn new(from: T, to: T, started: Instant, transition: Transition) -> Self {
        Self {
            from,
            to,
            started,
            transition,
        }
    }

    /// Value at `now`; returns `to` exactly once the tween has finished
    pub fn sample(&self, now: Instant) -> T {
        if self.is_finished(now) {
            return self.to.clone();
        }
        T::lerp(&self.from, &self.to, self.transition.eased(self.started, now))
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.transition.is_finished(self.started, now)
    }
}
