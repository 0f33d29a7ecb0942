//! Procedural nebula point clouds
//!
//! Each layer is a clumped spherical sample: most points are pulled toward one of four
//! fixed clump centres, the rest form a diffuse halo. Output is a pure function of
//! (count, radius, seed) so layers are regenerated rather than cached across remounts.

use bevy::prelude::*;
use rayon::prelude::*;
use std::f64::consts::PI;

use crate::constants::*;
use crate::rng::SeededRng;

/// Parameters of one nebula point layer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NebulaLayerSpec {
    pub name: &'static str,
    pub count: usize,
    pub radius: f32,
    pub seed: u32,
    pub color: [u8; 3],
    pub point_size: f32,
    pub rotation_rate: f32,  // Yaw speed (rad/s); pitch runs at LAYER_PITCH_FACTOR of this
    pub base_opacity: f32,   // Multiplied by the animated nebula opacity every frame
}

impl NebulaLayerSpec {
    /// The generation inputs; presentation fields do not affect the points
    pub fn key(&self) -> (usize, u32, u32) {
        (self.count, self.radius.to_bits(), self.seed)
    }
}

pub const OUTER_LAYER: NebulaLayerSpec = NebulaLayerSpec {
    name: "outer",
    count: 1000,
    radius: 6.6,
    seed: 1337,
    color: [0x6a, 0x4c, 0xff],
    point_size: 0.12,
    rotation_rate: 0.02,
    base_opacity: 1.6,
};

pub const MID_LAYER: NebulaLayerSpec = NebulaLayerSpec {
    name: "mid",
    count: 820,
    radius: 5.0,
    seed: 2024,
    color: [0xff, 0x4f, 0xbf],
    point_size: 0.095,
    rotation_rate: 0.035,
    base_opacity: 1.35,
};

pub const CORE_LAYER: NebulaLayerSpec = NebulaLayerSpec {
    name: "core",
    count: 600,
    radius: 3.6,
    seed: 777,
    color: [0x8f, 0xd3, 0xff],
    point_size: 0.07,
    rotation_rate: 0.05,
    base_opacity: 1.1,
};

pub const NEBULA_LAYERS: [NebulaLayerSpec; 3] = [OUTER_LAYER, MID_LAYER, CORE_LAYER];

/// One drawn point plus the intermediate values the bounds checks need
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NebulaSample {
    pub point: Vec3,
    /// Flattened position before any clump pull
    pub pre_pull: Vec3,
    /// Y before the flatten factor was applied
    pub unflattened_y: f32,
    pub radial_distance: f32,
    pub clumped: bool,
}

/// Iterator over the points of one layer, in generation order
pub struct NebulaSampler {
    rng: SeededRng,
    radius: f64,
    remaining: usize,
}

impl NebulaSampler {
    pub fn new(count: usize, radius: f32, seed: u32) -> Self {
        Self {
            rng: SeededRng::new(seed),
            radius: radius as f64,
            remaining: count,
        }
    }

    fn draw(&mut self) -> NebulaSample {
        let rng = &mut self.rng;

        // Draw order matters for reproducibility: the clump index is drawn even for diffuse points
        let clumped = rng.next_f64() < CLUMP_PROBABILITY;
        let clump_index = (rng.next_f64() * CLUMP_CENTERS.len() as f64) as usize;
        let center = CLUMP_CENTERS[clump_index.min(CLUMP_CENTERS.len() - 1)];

        let exponent = if clumped { CLUMP_RADIAL_EXPONENT } else { DIFFUSE_RADIAL_EXPONENT };
        let r = self.radius * rng.next_f64().powf(exponent);
        let theta = rng.next_f64() * PI * 2.0;
        let u = rng.next_f64() * 2.0 - 1.0;
        let phi = u.acos();

        let x = r * phi.sin() * theta.cos();
        let unflattened_y = r * phi.sin() * theta.sin();
        let z = r * phi.cos();
        let y = unflattened_y * Y_FLATTEN as f64;

        let pre_pull = Vec3::new(x as f32, y as f32, z as f32);

        let point = if clumped {
            let tight = CLUMP_PULL_MIN + rng.next_f64() * CLUMP_PULL_SPAN;
            Vec3::new(
                (x * tight + center[0]) as f32,
                (y * tight + center[1]) as f32,
                (z * tight + center[2]) as f32,
            )
        } else {
            pre_pull
        };

        NebulaSample {
            point,
            pre_pull,
            unflattened_y: unflattened_y as f32,
            radial_distance: r as f32,
            clumped,
        }
    }
}

impl Iterator for NebulaSampler {
    type Item = NebulaSample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.draw())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for NebulaSampler {}

/// Generates `count` nebula points. `count == 0` yields an empty vector.
pub fn generate_nebula_positions(count: usize, radius: f32, seed: u32) -> Vec<Vec3> {
    NebulaSampler::new(count, radius, seed).map(|s| s.point).collect()
}

/// A generated layer, immutable until its generation inputs change
#[derive(Clone, Debug)]
pub struct NebulaField {
    pub spec: NebulaLayerSpec,
    points: Vec<Vec3>,
}

impl NebulaField {
    pub fn new(spec: NebulaLayerSpec) -> Self {
        let points = generate_nebula_positions(spec.count, spec.radius, spec.seed);
        Self { spec, points }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Adopts `spec`, regenerating only if count, radius or seed changed.
    /// Returns true when the points were rebuilt.
    pub fn regenerate(&mut self, spec: NebulaLayerSpec) -> bool {
        let rebuild = spec.key() != self.spec.key();
        if rebuild {
            debug!(
                "Regenerating nebula layer '{}' ({} points, r={}, seed={})",
                spec.name, spec.count, spec.radius, spec.seed
            );
            self.points = generate_nebula_positions(spec.count, spec.radius, spec.seed);
        }
        self.spec = spec;
        rebuild
    }

    /// Positions in the layout mesh attributes expect
    pub fn to_mesh_positions(&self) -> Vec<[f32; 3]> {
        self.points.iter().map(|p| p.to_array()).collect()
    }
}

/// Builds several independent layers in parallel; each owns its own stream
pub fn generate_layers(specs: &[NebulaLayerSpec]) -> Vec<NebulaField> {
    specs.par_iter().map(|spec| NebulaField::new(*spec)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_points_for_outer_seed() {
        let points = generate_nebula_positions(3, 6.6, 1337);
        let expected = [
            Vec3::new(-2.386_570_2, -0.687_122_17, -0.185_678_09),
            Vec3::new(-0.628_531_16, 0.429_604_56, 0.174_188_36),
            Vec3::new(0.685_507_06, -0.312_587_6, -0.334_317_45),
        ];
        for (got, want) in points.iter().zip(expected.iter()) {
            assert!((*got - *want).length() < 1e-5, "{got:?} != {want:?}");
        }
    }

    #[test]
    fn count_is_exact() {
        for count in [0, 1, 1000] {
            assert_eq!(generate_nebula_positions(count, 5.0, 99).len(), count);
        }
    }

    #[test]
    fn zero_count_is_empty() {
        let field = NebulaField::new(NebulaLayerSpec { count: 0, ..CORE_LAYER });
        assert!(field.is_empty());
        assert!(field.to_mesh_positions().is_empty());
    }

    #[test]
    fn identical_inputs_give_identical_bits() {
        let a = generate_nebula_positions(500, 6.6, 1337);
        let b = generate_nebula_positions(500, 6.6, 1337);
        let bits = |v: &[Vec3]| {
            v.iter().flat_map(|p| p.to_array().map(f32::to_bits)).collect::<Vec<_>>()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn pre_pull_points_stay_inside_radius() {
        for sample in NebulaSampler::new(2000, 5.0, 2024) {
            assert!(sample.radial_distance <= 5.0);
            assert!(sample.pre_pull.y.abs() <= sample.unflattened_y.abs());
        }
    }

    #[test]
    fn diffuse_points_are_not_pulled() {
        for sample in NebulaSampler::new(500, 3.6, 777).filter(|s| !s.clumped) {
            assert_eq!(sample.point, sample.pre_pull);
        }
    }

    #[test]
    fn most_points_are_clumped() {
        let clumped = NebulaSampler::new(5000, 6.6, 1).filter(|s| s.clumped).count();
        let share = clumped as f32 / 5000.0;
        assert!((share - 0.72).abs() < 0.03, "clumped share {share}");
    }

    #[test]
    fn regenerate_only_on_input_change() {
        let mut field = NebulaField::new(MID_LAYER);
        let before = field.points().to_vec();

        // Presentation-only changes keep the points
        assert!(!field.regenerate(NebulaLayerSpec {
            point_size: 0.5,
            base_opacity: 0.2,
            ..MID_LAYER
        }));
        assert_eq!(field.points(), before.as_slice());

        assert!(field.regenerate(NebulaLayerSpec { seed: 31, ..MID_LAYER }));
        assert_ne!(field.points(), before.as_slice());
    }

    #[test]
    fn parallel_layers_match_sequential_generation() {
        let layers = generate_layers(&NEBULA_LAYERS);
        assert_eq!(layers.len(), 3);
        for (layer, spec) in layers.iter().zip(NEBULA_LAYERS.iter()) {
            let expected = generate_nebula_positions(spec.count, spec.radius, spec.seed);
            assert_eq!(layer.points(), expected.as_slice());
        }
    }
}
