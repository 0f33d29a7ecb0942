//! Node handles the animator writes into
//!
//! The animator never touches Bevy types directly: it reaches nodes through `SceneGraph`,
//! which the Bevy plugin backs with ECS components and tests back with `HeadlessScene`.
//! Rotation is stored as XYZ Euler angles (radians) so per-axis spin accumulates exactly.

use bevy::prelude::*;
use std::collections::HashMap;

/// Every renderable primitive the visual is built from
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum NodeId {
    Core,
    Disk,
    Highlight,
    Gas(usize),
    NebulaLayer(usize),
    /// Shared material of the swirl-star instances
    SwirlStars,
    SwirlStar(usize),
    Shockwave,
    Burst,
    MicroFlash,
}

/// Named shader-style uniforms on gas cloud materials
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Uniform {
    /// uOpacity
    Opacity,
    /// uTime
    Time,
}

pub trait SceneNode {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);

    /// XYZ Euler angles in radians
    fn rotation(&self) -> Vec3;
    fn set_rotation(&mut self, rotation: Vec3);

    fn scale(&self) -> Vec3;
    fn set_scale(&mut self, scale: Vec3);

    fn opacity(&self) -> f32;
    fn set_opacity(&mut self, opacity: f32);

    fn emissive_intensity(&self) -> f32;
    fn set_emissive_intensity(&mut self, intensity: f32);

    fn uniform(&self, uniform: Uniform) -> f32;
    fn set_uniform(&mut self, uniform: Uniform, value: f32);
}

/// Lookup of node handles; `None` means the node is not mounted (yet)
pub trait SceneGraph {
    fn node_mut(&mut self, id: NodeId) -> Option<&mut dyn SceneNode>;
}

/// Plain-data node: transform plus the material channels the animator drives
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeState {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub opacity: f32,
    pub emissive_intensity: f32,
    pub u_opacity: f32,
    pub u_time: f32,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            opacity: 1.0,
            emissive_intensity: 0.0,
            u_opacity: 0.0,
            u_time: 0.0,
        }
    }
}

impl NodeState {
    pub fn at(position: Vec3) -> Self {
        Self { position, ..default() }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_emissive(mut self, intensity: f32) -> Self {
        self.emissive_intensity = intensity;
        self
    }

    pub fn transform(&self) -> Transform {
        Transform {
            translation: self.position,
            rotation: Quat::from_euler(
                EulerRot::XYZ,
                self.rotation.x,
                self.rotation.y,
                self.rotation.z,
            ),
            scale: self.scale,
        }
    }
}

impl SceneNode for NodeState {
    fn position(&self) -> Vec3 {
        self.position
    }
    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn rotation(&self) -> Vec3 {
        self.rotation
    }
    fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    fn scale(&self) -> Vec3 {
        self.scale
    }
    fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    fn opacity(&self) -> f32 {
        self.opacity
    }
    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity;
    }

    fn emissive_intensity(&self) -> f32 {
        self.emissive_intensity
    }
    fn set_emissive_intensity(&mut self, intensity: f32) {
        self.emissive_intensity = intensity;
    }

    fn uniform(&self, uniform: Uniform) -> f32 {
        match uniform {
            Uniform::Opacity => self.u_opacity,
            Uniform::Time => self.u_time,
        }
    }
    fn set_uniform(&mut self, uniform: Uniform, value: f32) {
        match uniform {
            Uniform::Opacity => self.u_opacity = value,
            Uniform::Time => self.u_time = value,
        }
    }
}

/// In-memory scene for running the animator without a renderer
#[derive(Clone, Debug, Default)]
pub struct HeadlessScene {
    nodes: HashMap<NodeId, NodeState>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a scene from a mount layout
    pub fn mounted(layout: impl IntoIterator<Item = (NodeId, NodeState)>) -> Self {
        Self { nodes: layout.into_iter().collect() }
    }

    pub fn insert(&mut self, id: NodeId, state: NodeState) {
        self.nodes.insert(id, state);
    }

    pub fn remove(&mut self, id: NodeId) -> Option<NodeState> {
        self.nodes.remove(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeState> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl SceneGraph for HeadlessScene {
    fn node_mut(&mut self, id: NodeId) -> Option<&mut dyn SceneNode> {
        self.nodes.get_mut(&id).map(|node| node as &mut dyn SceneNode)
    }
}
