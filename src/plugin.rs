// Bevy host for the signature visual.
// Spawns one entity per scene node, then each frame:
// stage input -> animator (writes SignatureNode state) -> sync into Transform / material.

use bevy::asset::RenderAssetUsages;
use bevy::color::Alpha;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use std::collections::HashMap;
use std::f32::consts::TAU;

use crate::animator::SignatureAnimator;
use crate::config::SignatureConfig;
use crate::constants::*;
use crate::layout::mount_layout;
use crate::nebula_field::{generate_layers, NebulaField};
use crate::scene_node::{NodeId, NodeState, SceneGraph, SceneNode};
use crate::stage::Stage;

pub struct SignaturePlugin;

impl Plugin for SignaturePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SignatureConfig>();
        let initial = app.world().resource::<SignatureConfig>().initial_stage;

        app.insert_resource(StageSelection::new(initial))
            .add_systems(Startup, spawn_signature_scene)
            .add_systems(
                Update,
                (
                    stage_input_system,
                    drive_signature_system,
                    sync_scene_nodes_system,
                    refresh_nebula_layers_system,
                )
                    .chain(),
            );
    }
}

// ===== COMPONENTS & RESOURCES =====

/// Animator-owned state of one scene entity
#[derive(Component, Debug)]
pub struct SignatureNode {
    pub id: NodeId,
    pub state: NodeState,
    /// Material this node drives; instances sharing a material leave this empty
    pub material: Option<Handle<StandardMaterial>>,
    pub glow: LinearRgba,
}

/// Generated point layer behind a nebula mesh entity
#[derive(Component)]
pub struct NebulaLayerMesh {
    pub field: NebulaField,
}

/// Stage name requested by whatever controls the visual (keyboard, CLI)
#[derive(Resource, Clone, Debug, PartialEq, Eq)]
pub struct StageSelection(pub String);

impl StageSelection {
    pub fn new(stage: Stage) -> Self {
        Self(stage.name().to_string())
    }
}

#[derive(Resource)]
pub struct SignatureAnimatorResource(pub SignatureAnimator);

/// Scene graph view over the node components for one frame
struct QueryGraph<'w> {
    nodes: HashMap<NodeId, Mut<'w, SignatureNode>>,
}

impl SceneGraph for QueryGraph<'_> {
    fn node_mut(&mut self, id: NodeId) -> Option<&mut dyn SceneNode> {
        self.nodes.get_mut(&id).map(|node| &mut node.state as &mut dyn SceneNode)
    }
}

// ===== SYSTEMS =====

pub fn stage_input_system(keys: Res<ButtonInput<KeyCode>>, mut selection: ResMut<StageSelection>) {
    let requested = if keys.just_pressed(KeyCode::Digit1) {
        Some(Stage::Nebula)
    } else if keys.just_pressed(KeyCode::Digit2) {
        Some(Stage::Star)
    } else if keys.just_pressed(KeyCode::Digit3) {
        Some(Stage::Supergiant)
    } else {
        None
    };

    if let Some(stage) = requested {
        if selection.0 != stage.name() {
            info!("Stage requested: {}", stage);
            selection.0 = stage.name().to_string();
        }
    }
}

pub fn drive_signature_system(
    time: Res<Time>,
    selection: Res<StageSelection>,
    mut animator: ResMut<SignatureAnimatorResource>,
    mut nodes: Query<&mut SignatureNode>,
) {
    if selection.is_changed() {
        animator.0.request_stage(&selection.0);
    }

    let mut graph = QueryGraph {
        nodes: nodes.iter_mut().map(|node| (node.id, node)).collect(),
    };
    animator.0.update(time.elapsed_secs(), time.delta_secs(), &mut graph);
}

pub fn sync_scene_nodes_system(
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut nodes: Query<(&SignatureNode, &mut Transform), Changed<SignatureNode>>,
) {
    for (node, mut transform) in nodes.iter_mut() {
        *transform = node.state.transform();

        let Some(handle) = &node.material else {
            continue;
        };
        let Some(material) = materials.get_mut(handle) else {
            continue;
        };

        // Gas clouds fade through their uOpacity channel
        let alpha = match node.id {
            NodeId::Gas(_) => node.state.u_opacity,
            _ => node.state.opacity,
        };
        material.base_color.set_alpha(alpha.clamp(0.0, 1.0));
        material.emissive = node.glow * node.state.emissive_intensity;
    }
}

/// Rebuilds point meshes when a layer's count, radius or seed changes in the config
pub fn refresh_nebula_layers_system(
    config: Res<SignatureConfig>,
    mut animator: ResMut<SignatureAnimatorResource>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut layers: Query<(&mut NebulaLayerMesh, &Mesh3d)>,
) {
    if !config.is_changed() || config.is_added() {
        return;
    }
    animator.0.set_layers(config.layers.clone());

    for (mut layer, mesh) in layers.iter_mut() {
        let index = config.layers.iter().position(|spec| spec.name == layer.field.spec.name);
        let Some(spec) = index.map(|i| config.layers[i]) else {
            continue;
        };
        if layer.field.regenerate(spec) {
            if let Some(target) = meshes.get_mut(&mesh.0) {
                *target = nebula_point_mesh(&layer.field);
            }
        }
    }
}

// ===== SPAWNING =====

fn blended_material(color: Color, alpha: f32, glow: LinearRgba, unlit: bool) -> StandardMaterial {
    StandardMaterial {
        base_color: color.with_alpha(alpha),
        emissive: glow,
        alpha_mode: if unlit { AlphaMode::Add } else { AlphaMode::Blend },
        unlit,
        double_sided: true,
        cull_mode: None,
        ..default()
    }
}

pub fn spawn_signature_scene(
    mut commands: Commands,
    config: Res<SignatureConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(SignatureAnimatorResource(SignatureAnimator::new(&config)));

    commands.spawn((
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: CAMERA_FOV_DEGREES.to_radians(),
            ..default()
        }),
        Transform::from_xyz(0.0, 0.0, CAMERA_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.insert_resource(AmbientLight {
        brightness: AMBIENT_BRIGHTNESS,
        ..default()
    });
    commands.spawn((
        DirectionalLight {
            illuminance: KEY_LIGHT_ILLUMINANCE,
            ..default()
        },
        Transform::from_translation(KEY_LIGHT_POSITION).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let fields = generate_layers(&config.layers);
    info!(
        "🌌 Generated {} nebula layers ({} points)",
        fields.len(),
        fields.iter().map(NebulaField::len).sum::<usize>()
    );
    let mut fields: Vec<Option<NebulaField>> = fields.into_iter().map(Some).collect();

    let gas_palette = [
        Color::srgb_u8(0x6a, 0x4c, 0xff),
        Color::srgb_u8(0xff, 0x4f, 0xbf),
        Color::srgb_u8(0x8f, 0xd3, 0xff),
    ];
    let gas_cloud = meshes.add(soft_cloud_mesh(GAS_CLOUD_RINGS, GAS_CLOUD_SEGMENTS));
    let star_sprite = meshes.add(Circle::new(0.5));
    let swirl_material = materials.add(blended_material(
        Color::WHITE,
        SWIRL_STAR_OPACITY,
        LinearRgba::BLACK,
        true,
    ));

    let layout = mount_layout(&config.layer_base_opacities(), config.swirl_star_count);
    let node_count = layout.len();

    for (id, state) in layout {
        let (mesh, material, glow) = match id {
            NodeId::Core => (
                meshes.add(Sphere::new(CORE_RADIUS).mesh().uv(64, 64)),
                Some(blended_material(
                    Color::srgb_u8(0x08, 0x08, 0x08),
                    state.opacity,
                    LinearRgba::WHITE,
                    false,
                )),
                LinearRgba::WHITE,
            ),
            NodeId::Disk => (
                meshes.add(Annulus::new(DISK_INNER_RADIUS, DISK_OUTER_RADIUS)),
                Some(blended_material(
                    Color::srgb_u8(0x22, 0x22, 0x22),
                    state.opacity,
                    LinearRgba::WHITE,
                    false,
                )),
                LinearRgba::WHITE,
            ),
            NodeId::Highlight => (
                meshes.add(Annulus::new(HIGHLIGHT_INNER_RADIUS, HIGHLIGHT_OUTER_RADIUS)),
                Some(blended_material(
                    Color::srgb_u8(0x66, 0x66, 0x66),
                    state.opacity,
                    LinearRgba::WHITE,
                    false,
                )),
                LinearRgba::WHITE,
            ),
            NodeId::Gas(i) => (
                gas_cloud.clone(),
                Some(blended_material(
                    gas_palette[i % gas_palette.len()],
                    state.u_opacity,
                    LinearRgba::BLACK,
                    true,
                )),
                LinearRgba::BLACK,
            ),
            NodeId::NebulaLayer(i) => {
                let Some(field) = fields.get_mut(i).and_then(Option::take) else {
                    continue;
                };
                let [r, g, b] = field.spec.color;
                let mesh = meshes.add(nebula_point_mesh(&field));
                let material = materials.add(blended_material(
                    Color::srgb_u8(r, g, b),
                    state.opacity,
                    LinearRgba::BLACK,
                    true,
                ));
                commands.spawn((
                    Mesh3d(mesh),
                    MeshMaterial3d(material.clone()),
                    state.transform(),
                    SignatureNode { id, state, material: Some(material), glow: LinearRgba::BLACK },
                    NebulaLayerMesh { field },
                ));
                continue;
            }
            NodeId::SwirlStars => {
                commands.spawn((
                    state.transform(),
                    SignatureNode {
                        id,
                        state,
                        material: Some(swirl_material.clone()),
                        glow: LinearRgba::BLACK,
                    },
                ));
                continue;
            }
            NodeId::SwirlStar(_) => {
                commands.spawn((
                    Mesh3d(star_sprite.clone()),
                    MeshMaterial3d(swirl_material.clone()),
                    state.transform(),
                    SignatureNode { id, state, material: None, glow: LinearRgba::BLACK },
                ));
                continue;
            }
            NodeId::Shockwave => (
                meshes.add(Annulus::new(SHOCK_INNER_RADIUS, SHOCK_OUTER_RADIUS)),
                Some(blended_material(Color::WHITE, state.opacity, LinearRgba::BLACK, true)),
                LinearRgba::BLACK,
            ),
            NodeId::Burst | NodeId::MicroFlash => (
                meshes.add(Circle::new(0.5)),
                Some(blended_material(Color::WHITE, state.opacity, LinearRgba::BLACK, true)),
                LinearRgba::BLACK,
            ),
        };

        let material = material.map(|m| materials.add(m));
        let mut entity = commands.spawn((
            Mesh3d(mesh),
            state.transform(),
            SignatureNode { id, state, material: material.clone(), glow },
        ));
        if let Some(material) = material {
            entity.insert(MeshMaterial3d(material));
        }
    }

    info!("✨ Signature scene mounted: {} nodes, stage '{}'", node_count, config.initial_stage);
}

// ===== MESHES =====

/// One small camera-facing quad per nebula point, merged into a single mesh
pub fn nebula_point_mesh(field: &NebulaField) -> Mesh {
    let half = field.spec.point_size / 2.0;
    let corners = [[-half, -half], [half, -half], [half, half], [-half, half]];

    let mut positions = Vec::with_capacity(field.len() * 4);
    let mut normals = Vec::with_capacity(field.len() * 4);
    let mut uvs = Vec::with_capacity(field.len() * 4);
    let mut indices = Vec::with_capacity(field.len() * 6);

    for (i, point) in field.points().iter().enumerate() {
        let base = (i * 4) as u32;
        for (corner, uv) in corners.iter().zip([[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]) {
            positions.push([point.x + corner[0], point.y + corner[1], point.z]);
            normals.push([0.0, 0.0, 1.0]);
            uvs.push(uv);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::RENDER_WORLD)
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}

/// Unit-diameter disc whose vertex alpha falls off smoothly from the centre to zero at the rim.
/// The material's base alpha is multiplied by it, so the scaled cloud has no hard edge.
pub fn soft_cloud_mesh(rings: usize, segments: usize) -> Mesh {
    let rings = rings.max(1);
    let segments = segments.max(3);

    let mut positions = vec![[0.0, 0.0, 0.0]];
    let mut uvs = vec![[0.5, 0.5]];
    let mut colors = vec![[1.0, 1.0, 1.0, 1.0]];

    for ring in 1..=rings {
        let t = ring as f32 / rings as f32;
        let radius = 0.5 * t;
        let falloff = (1.0 - t * t).powi(2);
        for segment in 0..segments {
            let angle = segment as f32 / segments as f32 * TAU;
            let (x, y) = (angle.cos() * radius, angle.sin() * radius);
            positions.push([x, y, 0.0]);
            uvs.push([0.5 + x, 0.5 - y]);
            colors.push([1.0, 1.0, 1.0, falloff]);
        }
    }

    let ring_start = |ring: usize| (1 + (ring - 1) * segments) as u32;
    let mut indices = Vec::with_capacity(segments * 3 * (2 * rings - 1));
    for segment in 0..segments {
        let next = (segment + 1) % segments;
        let (a, b) = (ring_start(1) + segment as u32, ring_start(1) + next as u32);
        indices.extend_from_slice(&[0, a, b]);
    }
    for ring in 2..=rings {
        let (inner, outer) = (ring_start(ring - 1), ring_start(ring));
        for segment in 0..segments {
            let (a, b) = (segment as u32, ((segment + 1) % segments) as u32);
            indices.extend_from_slice(&[
                inner + a,
                outer + a,
                outer + b,
                inner + a,
                outer + b,
                inner + b,
            ]);
        }
    }

    let normals = vec![[0.0, 0.0, 1.0]; positions.len()];
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::RENDER_WORLD)
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors)
        .with_inserted_indices(Indices::U32(indices))
}
