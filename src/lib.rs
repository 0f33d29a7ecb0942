//! Nebula-to-star collapse visual: procedural nebula fields, a timeline-driven stage
//! sequencer and a per-frame animator, plus a Bevy plugin that hosts them.

pub mod animator;
pub mod config;
pub mod constants;
pub mod layout;
pub mod nebula_field;
pub mod plugin;
pub mod pulses;
pub mod rng;
pub mod scene_node;
pub mod sequencer;
pub mod stage;
pub mod swirl;
pub mod swirl_stars;
pub mod tween;

pub use animator::{SignatureAnimator, SignatureProperty, SignatureState};
pub use config::SignatureConfig;
pub use plugin::SignaturePlugin;
pub use scene_node::{HeadlessScene, NodeId, NodeState, SceneGraph, SceneNode, Uniform};
pub use stage::{ParseStageError, Stage, StageProfile};
pub use tween::{Ease, Scheduler, Timeline, TweenEngine};
