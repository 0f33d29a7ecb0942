// Tuning constants for the nebula collapse visual.
// Grouped by the subsystem that reads them; all distances are scene units, all times seconds.

use bevy::math::Vec3;

// ===== PROCEDURAL NEBULA FIELD =====

pub const CLUMP_PROBABILITY: f64 = 0.72;        // Share of points placed around a clump centre
pub const CLUMP_RADIAL_EXPONENT: f64 = 2.35;    // Power bias for clumped radii (packs points inward)
pub const DIFFUSE_RADIAL_EXPONENT: f64 = 1.35;  // Power bias for diffuse radii
pub const CLUMP_PULL_MIN: f64 = 0.48;           // Lower bound of the per-point compression toward a clump
pub const CLUMP_PULL_SPAN: f64 = 0.32;          // Pull factor is MIN + u * SPAN, i.e. [0.48, 0.80)
pub const Y_FLATTEN: f32 = 0.55;                // Vertical squash shared by field points and the swirl spiral

/// Fixed offsets that bias clumped points into visible density concentrations
pub const CLUMP_CENTERS: [[f64; 3]; 4] = [
    [-0.9, 0.35, 0.15],
    [0.65, -0.25, -0.35],
    [0.15, 0.55, -0.1],
    [-0.35, -0.15, 0.25],
];

// ===== CONTINUOUS ANIMATION =====

pub const CORE_SPIN_RATE: f32 = 0.12;           // Core sphere yaw speed (rad/s), independent of stage
pub const SWIRL_SMOOTHING_BASE: f32 = 0.0008;   // progress += (target - progress) * (1 - BASE^delta)
pub const SWIRL_ACTIVE_THRESHOLD: f32 = 1e-4;   // Below this the gas clouds drift instead of spiralling
pub const SWIRL_SETTLE_EPSILON: f32 = 1e-4;     // Distance from 1.0 at which a collapse counts as finished
pub const LAYER_PITCH_FACTOR: f32 = 0.25;       // Particle layers pitch at a quarter of their yaw rate

// ===== GAS CLOUDS =====

pub const GAS_CLOUD_COUNT: usize = 5;
pub const GAS_DRIFT_SPEEDS: [f32; GAS_CLOUD_COUNT] = [0.010, 0.012, 0.009, 0.008, 0.007];
pub const GAS_BASE_OPACITY: [f32; GAS_CLOUD_COUNT] = [0.45, 0.30, 0.18, 0.16, 0.14];

// ===== SWIRL / COLLAPSE TRANSFORM =====

pub const SWIRL_TURNS: f32 = 6.0;               // Extra angle added over a full collapse (applied as radians)
pub const SWIRL_SCALE_SHRINK: f32 = 0.78;       // Clouds keep 22% of their size at p = 1
pub const SWIRL_EXTRA_ROLL: f32 = 1.25;         // In-plane rotation added over a full collapse (rad)

// ===== SWIRL STARS =====

pub const SWIRL_STAR_COUNT: usize = 180;
pub const SWIRL_STAR_SEED: u32 = 4242;
pub const SWIRL_STAR_RADIUS_MIN: f32 = 0.35;
pub const SWIRL_STAR_RADIUS_SPAN: f32 = 1.35;   // Radius uniform in [0.35, 1.70)
pub const SWIRL_STAR_Y_JITTER: f32 = 0.35;
pub const SWIRL_STAR_Z_JITTER: f32 = 0.25;
pub const SWIRL_STAR_SIZE_MIN: f32 = 0.04;
pub const SWIRL_STAR_SIZE_SPAN: f32 = 0.08;
pub const SWIRL_STAR_WEIGHT_MIN: f32 = 0.6;
pub const SWIRL_STAR_WEIGHT_SPAN: f32 = 1.2;
pub const SWIRL_STAR_ORBIT_RATE: f32 = 0.35;    // Base angular speed, scaled by each star's weight
pub const SWIRL_STAR_EXTRA_SPIN: f32 = 6.2;     // Angle added at full collapse
pub const SWIRL_STAR_WOBBLE: f32 = 0.08;
pub const SWIRL_STAR_WOBBLE_RATE: f32 = 1.2;
pub const SWIRL_STAR_WOBBLE_Y: f32 = 0.4;
pub const SWIRL_STAR_ROLL: f32 = 0.15;
pub const SWIRL_STAR_SIZE_SHRINK: f32 = 0.6;
pub const SWIRL_STAR_OPACITY: f32 = 0.95;
pub const SWIRL_STAR_FADE: f32 = 0.85;          // Opacity lost at full collapse

// ===== EFFECT PULSES =====

pub const SHOCK_DECAY: f32 = 1.8;
pub const SHOCK_GROWTH: f32 = 6.0;
pub const SHOCK_MAX_SCALE: f32 = 20.0;
pub const SHOCK_TRIGGER: (f32, f32) = (0.9, 0.15);      // (alpha, scale)
pub const SHOCK_REST_SCALE: f32 = 0.15;

pub const BURST_DECAY: f32 = 3.2;
pub const BURST_SHRINK: f32 = 0.35;
pub const BURST_TRIGGER: (f32, f32) = (1.0, 3.4);
pub const BURST_REST_SCALE: f32 = 2.8;

pub const MICRO_FLASH_DECAY: f32 = 2.8;
pub const MICRO_FLASH_SHRINK: f32 = 0.2;
pub const MICRO_FLASH_TRIGGER: (f32, f32) = (0.9, 1.2);
pub const MICRO_FLASH_REST_SCALE: f32 = 1.0;

// ===== NEBULA -> STAR CHOREOGRAPHY (timeline offsets) =====

pub const COLLAPSE_DURATION: f32 = 1.6;
pub const NEBULA_FADE_AT: f32 = 0.1;
pub const NEBULA_FADE_DURATION: f32 = 1.2;
pub const IGNITION_AT: f32 = 1.42;              // ~89% into the collapse tween: shock + burst + flash
pub const CORE_IGNITE_AT: f32 = 1.48;
pub const CORE_SCALE_DURATION: f32 = 0.45;
pub const CORE_LIGHT_DURATION: f32 = 0.55;
pub const DISK_EMERGE_AT: f32 = 1.58;
pub const DISK_SCALE_DURATION: f32 = 0.9;
pub const DISK_FADE_DURATION: f32 = 0.7;
pub const SPIN_UP_DURATION: f32 = 0.9;
pub const SWIRL_STARS_FADE_DURATION: f32 = 0.35;

// ===== OTHER EDGES =====

pub const HIGHLIGHT_FADE_TO_NEBULA: f32 = 0.25;
pub const HIGHLIGHT_FADE: f32 = 0.6;
pub const PROFILE_TWEEN_DURATION: f32 = 0.9;    // Un-choreographed edges (e.g. star -> supergiant)
pub const PROFILE_STARS_FADE_AT: f32 = 1.2;
pub const NEBULA_RESTORE_DURATION: f32 = 0.6;   // Core and nebula glide back when the nebula returns

// ===== MOUNT LAYOUT =====

pub const DISK_TILT: f32 = std::f32::consts::PI / 2.2;  // Disk, highlight and shock ring share this tilt
pub const HIGHLIGHT_OFFSET_X: f32 = 0.25;
pub const HIGHLIGHT_SCALE: f32 = 2.1;
pub const HIGHLIGHT_EMISSIVE: f32 = 0.9;
pub const DISK_EMISSIVE: f32 = 0.6;
pub const BURST_DEPTH: f32 = 0.05;
pub const SHOCK_DEPTH: f32 = 0.06;
pub const MICRO_FLASH_DEPTH: f32 = 0.02;

// ===== CAMERA =====

pub const CAMERA_DISTANCE: f32 = 7.0;
pub const CAMERA_FOV_DEGREES: f32 = 45.0;
pub const AMBIENT_BRIGHTNESS: f32 = 280.0;
pub const KEY_LIGHT_ILLUMINANCE: f32 = 4_000.0;
pub const KEY_LIGHT_POSITION: Vec3 = Vec3::new(5.0, 5.0, 5.0);

// ===== HOST MESHES =====

pub const CORE_RADIUS: f32 = 1.0;
pub const DISK_INNER_RADIUS: f32 = 1.3;
pub const DISK_OUTER_RADIUS: f32 = 2.2;
pub const HIGHLIGHT_INNER_RADIUS: f32 = 1.75;
pub const HIGHLIGHT_OUTER_RADIUS: f32 = 1.9;
pub const SHOCK_INNER_RADIUS: f32 = 1.25;
pub const SHOCK_OUTER_RADIUS: f32 = 1.75;
pub const GAS_CLOUD_RINGS: usize = 6;           // Falloff rings from the cloud centre to its edge
pub const GAS_CLOUD_SEGMENTS: usize = 48;       // Vertices around each ring
