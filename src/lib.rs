pub mod animation;
pub mod camera;
pub mod color;
pub mod config;
pub mod controller;
pub mod detachment;
pub mod driver;
pub mod error;
pub mod input;
pub mod particles;
pub mod shapes;
pub mod timeline;

pub mod prelude {
    pub use crate::animation::{Animatable, TimingFunction, Transition, Tween};
    pub use crate::camera::CameraMotion;
    pub use crate::color::Color;
    pub use crate::config::SceneConfig;
    pub use crate::controller::{
        Direction, OverlayContent, OverlayHooks, Phase, StepController, StepRequest,
    };
    pub use crate::detachment::{Assignment, DetachmentAssignment, DetachmentPolicy};
    pub use crate::error::{AssetError, Result};
    pub use crate::input::{InputEvent, Key, ScrollAccumulator};
    pub use crate::particles::instances::{ChangeFlags, InstanceBatch, ParticleInstance};
    pub use crate::particles::{LifecycleState, Particle, ParticleId, ParticleStore};
    pub use crate::shapes::{ParticleShape, Primitive};
    pub use crate::timeline::{Era, Timeline, TimelineStep};
}

pub use controller::{OverlayHooks, StepController, StepRequest};
pub use config::SceneConfig;
