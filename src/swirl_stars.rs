// Central swirl-star cluster: small sprites orbiting the core that fall inward
// and fade as the collapse progresses. Poses are pure functions of (t, p, descriptor).

use bevy::prelude::*;
use std::f32::consts::TAU;

use crate::constants::*;
use crate::rng::SeededRng;
use crate::scene_node::{NodeId, SceneGraph};

/// Per-instance constants, drawn once at mount
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwirlStarDescriptor {
    pub radius: f32,
    pub angle: f32,
    pub height: f32,
    pub depth: f32,
    pub size: f32,
    pub phase: f32,
    pub weight: f32, // Angular-speed multiplier
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwirlStarPose {
    pub position: Vec3,
    pub roll: f32,
    pub scale: Vec3,
}

impl SwirlStarDescriptor {
    fn draw(rng: &mut SeededRng) -> Self {
        Self {
            radius: SWIRL_STAR_RADIUS_MIN + rng.next_f32() * SWIRL_STAR_RADIUS_SPAN,
            angle: rng.next_f32() * TAU,
            height: (rng.next_f32() * 2.0 - 1.0) * SWIRL_STAR_Y_JITTER,
            depth: (rng.next_f32() * 2.0 - 1.0) * SWIRL_STAR_Z_JITTER,
            size: SWIRL_STAR_SIZE_MIN + rng.next_f32() * SWIRL_STAR_SIZE_SPAN,
            phase: rng.next_f32() * TAU,
            weight: SWIRL_STAR_WEIGHT_MIN + rng.next_f32() * SWIRL_STAR_WEIGHT_SPAN,
        }
    }

    pub fn pose(&self, t: f32, p: f32) -> SwirlStarPose {
        let orbit = t * SWIRL_STAR_ORBIT_RATE * self.weight;
        let angle = self.angle + orbit + p * SWIRL_STAR_EXTRA_SPIN;
        let radius = self.radius * (1.0 - p);
        let wobble =
            SWIRL_STAR_WOBBLE * (t * SWIRL_STAR_WOBBLE_RATE * self.weight + self.phase).sin();
        let size = self.size * (1.0 - p * SWIRL_STAR_SIZE_SHRINK);

        SwirlStarPose {
            position: Vec3::new(
                angle.cos() * radius + wobble,
                self.height * (1.0 - p) + wobble * SWIRL_STAR_WOBBLE_Y,
                self.depth * (1.0 - p),
            ),
            roll: angle * SWIRL_STAR_ROLL,
            scale: Vec3::new(size, size, 1.0),
        }
    }
}

/// Shared opacity of the cluster for progress `p` and fade factor `fade`
pub fn swirl_star_opacity(fade: f32, p: f32) -> f32 {
    SWIRL_STAR_OPACITY * fade * (1.0 - p * SWIRL_STAR_FADE)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwirlStars {
    descriptors: Vec<SwirlStarDescriptor>,
}

impl SwirlStars {
    pub fn new(count: usize, seed: u32) -> Self {
        let mut rng = SeededRng::new(seed);
        let descriptors = (0..count).map(|_| SwirlStarDescriptor::draw(&mut rng)).collect();
        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[SwirlStarDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Writes every instance pose plus the shared opacity; missing nodes are skipped
    pub fn update(&self, t: f32, p: f32, fade: f32, scene: &mut impl SceneGraph) {
        for (i, descriptor) in self.descriptors.iter().enumerate() {
            let Some(node) = scene.node_mut(NodeId::SwirlStar(i)) else {
                continue;
            };
            let pose = descriptor.pose(t, p);
            node.set_position(pose.position);
            node.set_rotation(Vec3::new(0.0, 0.0, pose.roll));
            node.set_scale(pose.scale);
        }

        if let Some(node) = scene.node_mut(NodeId::SwirlStars) {
            node.set_opacity(swirl_star_opacity(fade, p));
        }
    }
}
