// Mount-time pose of every node in the visual.
// The animator takes over from these values on the first frame; gas clouds also
// return to their rest pose when a collapse unwinds.

use bevy::prelude::*;

use crate::constants::*;
use crate::pulses::{Pulse, PulseKind};
use crate::scene_node::{NodeId, NodeState};
use crate::stage::NEBULA_PROFILE;

/// Rest pose of one gas cloud plane
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GasCloudRest {
    pub position: Vec3,
    pub scale: Vec3,
    pub roll: f32,
}

pub const GAS_CLOUD_LAYOUT: [GasCloudRest; GAS_CLOUD_COUNT] = [
    GasCloudRest {
        position: Vec3::new(0.0, 0.0, -0.35),
        scale: Vec3::new(9.6, 5.4, 1.0),
        roll: 0.10,
    },
    GasCloudRest {
        position: Vec3::new(0.6, -0.2, -0.28),
        scale: Vec3::new(7.8, 4.3, 1.0),
        roll: -0.22,
    },
    GasCloudRest {
        position: Vec3::new(-0.7, 0.25, -0.25),
        scale: Vec3::new(6.3, 3.7, 1.0),
        roll: 0.32,
    },
    GasCloudRest {
        position: Vec3::new(1.05, 0.15, -0.22),
        scale: Vec3::new(5.6, 3.2, 1.0),
        roll: -0.55,
    },
    GasCloudRest {
        position: Vec3::new(-1.05, -0.15, -0.20),
        scale: Vec3::new(5.2, 3.0, 1.0),
        roll: 0.62,
    },
];

impl GasCloudRest {
    pub fn node_state(&self, base_opacity: f32) -> NodeState {
        let mut state = NodeState::at(self.position)
            .with_rotation(Vec3::new(0.0, 0.0, self.roll))
            .with_scale(self.scale);
        state.u_opacity = base_opacity;
        state
    }
}

fn pulse_rest_state(kind: PulseKind, depth: f32, tilted: bool) -> NodeState {
    let pulse = Pulse::at_rest(kind);
    let rotation = if tilted { Vec3::new(DISK_TILT, 0.0, 0.0) } else { Vec3::ZERO };
    NodeState::at(Vec3::new(0.0, 0.0, depth))
        .with_rotation(rotation)
        .with_scale(Vec3::new(pulse.scale, pulse.scale, 1.0))
        .with_opacity(pulse.alpha)
}

/// Every node with its starting state, in spawn order
pub fn mount_layout(
    layer_base_opacities: &[f32],
    swirl_star_count: usize,
) -> Vec<(NodeId, NodeState)> {
    let mut nodes =
        Vec::with_capacity(9 + GAS_CLOUD_COUNT + layer_base_opacities.len() + swirl_star_count);
    let profile = NEBULA_PROFILE;

    nodes.push((
        NodeId::Core,
        NodeState::default()
            .with_scale(Vec3::splat(profile.core_scale))
            .with_opacity(profile.core_opacity)
            .with_emissive(profile.core_glow),
    ));
    nodes.push((
        NodeId::Disk,
        NodeState::default()
            .with_rotation(Vec3::new(DISK_TILT, 0.0, 0.0))
            .with_scale(Vec3::new(profile.disk_scale, profile.disk_scale, 1.0))
            .with_opacity(profile.disk_opacity)
            .with_emissive(DISK_EMISSIVE),
    ));
    nodes.push((
        NodeId::Highlight,
        NodeState::at(Vec3::new(HIGHLIGHT_OFFSET_X, 0.0, 0.0))
            .with_rotation(Vec3::new(DISK_TILT, 0.0, 0.0))
            .with_scale(Vec3::new(HIGHLIGHT_SCALE, HIGHLIGHT_SCALE, 1.0))
            .with_opacity(profile.highlight_opacity)
            .with_emissive(HIGHLIGHT_EMISSIVE),
    ));

    for (i, rest) in GAS_CLOUD_LAYOUT.iter().enumerate() {
        nodes.push((NodeId::Gas(i), rest.node_state(GAS_BASE_OPACITY[i] * profile.nebula_opacity)));
    }

    for (i, base) in layer_base_opacities.iter().enumerate() {
        nodes.push((
            NodeId::NebulaLayer(i),
            NodeState::default().with_opacity(base * profile.nebula_opacity),
        ));
    }

    nodes.push((NodeId::SwirlStars, NodeState::default().with_opacity(SWIRL_STAR_OPACITY)));
    for i in 0..swirl_star_count {
        nodes.push((NodeId::SwirlStar(i), NodeState::default()));
    }

    nodes.push((NodeId::Shockwave, pulse_rest_state(PulseKind::Shock, SHOCK_DEPTH, true)));
    nodes.push((NodeId::Burst, pulse_rest_state(PulseKind::Burst, BURST_DEPTH, false)));
    nodes.push((
        NodeId::MicroFlash,
        pulse_rest_state(PulseKind::MicroFlash, MICRO_FLASH_DEPTH, false),
    ));

    nodes
}
