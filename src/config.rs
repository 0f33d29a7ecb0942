// Mount-time configuration for the signature visual
use bevy::prelude::*;

use crate::constants::*;
use crate::nebula_field::{NebulaLayerSpec, NEBULA_LAYERS};
use crate::stage::Stage;

/// Read once at mount; the nebula layers are regenerated if their specs change later
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct SignatureConfig {
    pub initial_stage: Stage,
    pub swirl_star_count: usize,
    pub swirl_star_seed: u32,
    pub layers: Vec<NebulaLayerSpec>,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            initial_stage: Stage::Nebula,
            swirl_star_count: SWIRL_STAR_COUNT,
            swirl_star_seed: SWIRL_STAR_SEED,
            layers: NEBULA_LAYERS.to_vec(),
        }
    }
}

impl SignatureConfig {
    pub fn with_initial_stage(mut self, stage: Stage) -> Self {
        self.initial_stage = stage;
        self
    }

    pub fn layer_base_opacities(&self) -> Vec<f32> {
        self.layers.iter().map(|layer| layer.base_opacity).collect()
    }
}
