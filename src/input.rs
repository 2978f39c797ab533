//! Folding raw pointer and keyboard input into step intents.

/// Distance in pixels a wheel or swipe must travel before it counts as a step
pub const SWIPE_THRESHOLD: f32 = 60.0;

/// Navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Other,
}

/// Raw input as delivered by the windowing layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Wheel or touchpad scroll, positive `delta_y` = down
    Scroll { delta_x: f32, delta_y: f32 },
    TouchStart { y: f32 },
    TouchMove { y: f32 },
    TouchEnd,
    KeyDown(Key),
}

/// Turns a stream of [`InputEvent`]s into `+1` / `-1` step intents.
///
/// Input that arrives while the scene is locked is discarded outright and
/// never contributes to a later intent.
#[derive(Debug, Clone)]
pub struct ScrollAccumulator {
    threshold: f32,
    accumulated: f32,
    touch_start: Option<f32>,
}

impl Default for ScrollAccumulator {
    fn default() -> Self {
        Self::new(SWIPE_THRESHOLD)
    }
}

impl ScrollAccumulator {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            accumulated: 0.0,
            touch_start: None,
        }
    }

    /// Feed one event; returns a step delta once enough movement piled up
    pub fn feed(&mut self, event: InputEvent, locked: bool) -> Option<i32> {
        if locked {
            return None;
        }
        match event {
            InputEvent::Scroll { delta_x, delta_y } => {
                // Horizontal gestures are ignored
                if delta_y.abs() < delta_x.abs() {
                    return None;
                }
                self.accumulated += delta_y;
                if self.accumulated > self.threshold {
                    self.accumulated = 0.0;
                    Some(1)
                } else if self.accumulated < -self.threshold {
                    self.accumulated = 0.0;
                    Some(-1)
                } else {
                    None
                }
            }
            InputEvent::TouchStart { y } => {
                self.touch_start = Some(y);
                None
            }
            InputEvent::TouchMove { y } => {
                let start = self.touch_start?;
                let delta = y - start;
                if delta.abs() <= self.threshold {
                    return None;
                }
                self.touch_start = None;
                // Swiping up moves forward
                Some(if delta < 0.0 { 1 } else { -1 })
            }
            InputEvent::TouchEnd => {
                self.touch_start = None;
                None
            }
            InputEvent::KeyDown(Key::ArrowDown | Key::PageDown) => Some(1),
            InputEvent::KeyDown(Key::ArrowUp | Key::PageUp) => Some(-1),
            InputEvent::KeyDown(Key::Other) => None,
        }
    }

    /// Forget any partial wheel travel or open swipe
    pub fn reset(&mut self) {
        self.accumulated = 0.0;
        self.touch_start = None;
    }
}
