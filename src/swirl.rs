//! Swirl / collapse coordinate transform for the gas cloud planes
//!
//! A cloud's pose when the collapse begins is captured in polar form around the Z axis.
//! As progress p runs 0 -> 1 the cloud spirals inward: the angle advances by
//! `p * SWIRL_TURNS`, the radius shrinks linearly to zero, the plane shrinks to 22% and
//! picks up `p * SWIRL_EXTRA_ROLL` of in-plane roll. Depth is left alone.
//!
//! The origins stay with the state through the whole lifecycle: a return to nebula
//! unwinds along the same spiral the collapse took, and a collapse restarted mid-unwind
//! picks that spiral back up.

use bevy::prelude::*;

use crate::constants::*;
use crate::scene_node::SceneNode;

/// Polar origin of one gas cloud
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolarPose {
    pub radius: f32,
    pub angle: f32,
    pub depth: f32,
    pub scale: Vec3,
    pub roll: f32,
}

impl PolarPose {
    pub fn from_parts(position: Vec3, scale: Vec3, roll: f32) -> Self {
        Self {
            radius: position.x.hypot(position.y),
            angle: position.y.atan2(position.x),
            depth: position.z,
            scale,
            roll,
        }
    }

    /// Uses the node's current transform as the origin
    pub fn capture(node: &dyn SceneNode) -> Self {
        Self::from_parts(node.position(), node.scale(), node.rotation().z)
    }

    /// The captured position itself, without the spiral's vertical squash
    pub fn origin_position(&self) -> Vec3 {
        Vec3::new(self.radius * self.angle.cos(), self.radius * self.angle.sin(), self.depth)
    }

    pub fn position_at(&self, p: f32) -> Vec3 {
        let angle = self.angle + p * SWIRL_TURNS;
        let radius = self.radius * (1.0 - p);
        Vec3::new(radius * angle.cos(), radius * angle.sin() * Y_FLATTEN, self.depth)
    }

    pub fn scale_at(&self, p: f32) -> Vec3 {
        let k = 1.0 - p * SWIRL_SCALE_SHRINK;
        Vec3::new(self.scale.x * k, self.scale.y * k, self.scale.z)
    }

    pub fn roll_at(&self, p: f32) -> f32 {
        self.roll + p * SWIRL_EXTRA_ROLL
    }

    /// Writes the pose at progress `p` (clamped to [0, 1]) into the node
    pub fn apply(&self, p: f32, node: &mut dyn SceneNode) {
        let p = p.clamp(0.0, 1.0);
        node.set_position(self.position_at(p));
        node.set_scale(self.scale_at(p));
        let mut rotation = node.rotation();
        rotation.z = self.roll_at(p);
        node.set_rotation(rotation);
    }

    /// Puts the node back exactly where it was captured
    pub fn restore(&self, node: &mut dyn SceneNode) {
        node.set_position(self.origin_position());
        node.set_scale(self.scale);
        let mut rotation = node.rotation();
        rotation.z = self.roll;
        node.set_rotation(rotation);
    }
}

/// One slot per gas cloud; `None` until that cloud is available to capture
pub type GasSnapshot = [Option<PolarPose>; GAS_CLOUD_COUNT];

pub const EMPTY_SNAPSHOT: GasSnapshot = [None; GAS_CLOUD_COUNT];

/// Where the gas clouds are in the collapse lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum CollapseState {
    /// At rest; clouds drift slowly about Z
    #[default]
    Idle,
    /// Spiralling in from the captured origins
    Collapsing(GasSnapshot),
    /// Fully collapsed; clouds hold their final pose
    Collapsed(GasSnapshot),
    /// Spiralling back out along the collapse origins
    Unwinding(GasSnapshot),
}

impl CollapseState {
    /// Origins still being captured by a running collapse
    pub fn snapshot(&self) -> Option<&GasSnapshot> {
        match self {
            CollapseState::Collapsing(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// Origins of the last collapse, kept until the clouds are back at rest
    pub fn origins(&self) -> Option<&GasSnapshot> {
        match self {
            CollapseState::Idle => None,
            CollapseState::Collapsing(origins)
            | CollapseState::Collapsed(origins)
            | CollapseState::Unwinding(origins) => Some(origins),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, CollapseState::Idle)
    }
}
