//! Per-frame animator for the nebula collapse visual
//!
//! `SignatureAnimator::update` is the single writer of every scene node. Each frame it:
//! 1. advances the injected scheduler so timeline cues land first
//! 2. spins the core and disk and copies the commanded core/disk values into them
//! 3. smooths the swirl progress toward its target (frame-rate independent)
//! 4. derives layer and gas opacities from the nebula opacity
//! 5. drifts or spirals the gas clouds depending on the collapse state
//! 6. poses the swirl stars, then writes and decays the effect pulses
//!
//! Missing nodes are skipped for the frame; nothing here can fail.

use bevy::prelude::*;

use crate::config::SignatureConfig;
use crate::constants::*;
use crate::nebula_field::NebulaLayerSpec;
use crate::pulses::{Pulse, Pulses};
use crate::scene_node::{NodeId, SceneGraph, SceneNode, Uniform};
use crate::sequencer::{StageSequencer, Transition};
use crate::stage::{Stage, NEBULA_PROFILE};
use crate::swirl::{CollapseState, GasSnapshot, PolarPose, EMPTY_SNAPSHOT};
use crate::swirl_stars::SwirlStars;
use crate::tween::{Animatable, Scheduler, TweenEngine};

/// Scalars the scheduler can drive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignatureProperty {
    Spin,
    NebulaOpacity,
    HighlightOpacity,
    SwirlTarget,
    SwirlStarsOpacity,
    CoreScale,
    CoreOpacity,
    CoreGlow,
    DiskScale,
    DiskOpacity,
}

/// Everything the visual remembers between frames
#[derive(Clone, Debug, PartialEq)]
pub struct SignatureState {
    pub spin: f32,
    pub nebula_opacity: f32,
    pub highlight_opacity: f32,
    pub swirl_progress: f32,
    pub swirl_target: f32,
    pub swirl_stars_opacity: f32,
    pub core_scale: f32,
    pub core_opacity: f32,
    pub core_glow: f32,
    pub disk_scale: f32,
    pub disk_opacity: f32,
    pub collapse: CollapseState,
    pub pulses: Pulses,
}

impl Default for SignatureState {
    fn default() -> Self {
        let profile = NEBULA_PROFILE;
        Self {
            spin: profile.spin,
            nebula_opacity: profile.nebula_opacity,
            highlight_opacity: profile.highlight_opacity,
            swirl_progress: 0.0,
            swirl_target: 0.0,
            swirl_stars_opacity: 1.0,
            core_scale: profile.core_scale,
            core_opacity: profile.core_opacity,
            core_glow: profile.core_glow,
            disk_scale: profile.disk_scale,
            disk_opacity: profile.disk_opacity,
            collapse: CollapseState::Idle,
            pulses: Pulses::default(),
        }
    }
}

impl Animatable for SignatureState {
    type Property = SignatureProperty;

    fn get(&self, property: SignatureProperty) -> f32 {
        use SignatureProperty::*;
        match property {
            Spin => self.spin,
            NebulaOpacity => self.nebula_opacity,
            HighlightOpacity => self.highlight_opacity,
            SwirlTarget => self.swirl_target,
            SwirlStarsOpacity => self.swirl_stars_opacity,
            CoreScale => self.core_scale,
            CoreOpacity => self.core_opacity,
            CoreGlow => self.core_glow,
            DiskScale => self.disk_scale,
            DiskOpacity => self.disk_opacity,
        }
    }

    fn set(&mut self, property: SignatureProperty, value: f32) {
        use SignatureProperty::*;
        let slot = match property {
            Spin => &mut self.spin,
            NebulaOpacity => &mut self.nebula_opacity,
            HighlightOpacity => &mut self.highlight_opacity,
            SwirlTarget => &mut self.swirl_target,
            SwirlStarsOpacity => &mut self.swirl_stars_opacity,
            CoreScale => &mut self.core_scale,
            CoreOpacity => &mut self.core_opacity,
            CoreGlow => &mut self.core_glow,
            DiskScale => &mut self.disk_scale,
            DiskOpacity => &mut self.disk_opacity,
        };
        *slot = value;
    }
}

/// Frame-rate independent approach: `progress += (target - progress) * (1 - BASE^delta)`
pub fn smooth_toward(progress: f32, target: f32, delta: f32) -> f32 {
    if delta <= 0.0 {
        return progress;
    }
    let blend = 1.0 - SWIRL_SMOOTHING_BASE.powf(delta);
    (progress + (target - progress) * blend).clamp(0.0, 1.0)
}

fn sanitize_delta(delta: f32) -> f32 {
    if delta.is_finite() {
        delta.max(0.0)
    } else {
        0.0
    }
}

fn spin_y(node: &mut dyn SceneNode, amount: f32) {
    let mut rotation = node.rotation();
    rotation.y += amount;
    node.set_rotation(rotation);
}

fn write_pulse(node: &mut dyn SceneNode, pulse: &Pulse) {
    node.set_opacity(pulse.alpha);
    node.set_scale(Vec3::new(pulse.scale, pulse.scale, 1.0));
}

pub struct SignatureAnimator<S: Scheduler<SignatureState> = TweenEngine<SignatureState>> {
    state: SignatureState,
    scheduler: S,
    sequencer: StageSequencer,
    layers: Vec<NebulaLayerSpec>,
    swirl_stars: SwirlStars,
}

impl SignatureAnimator {
    pub fn new(config: &SignatureConfig) -> Self {
        Self::with_scheduler(config, TweenEngine::new())
    }
}

impl<S: Scheduler<SignatureState>> SignatureAnimator<S> {
    /// Starts in the nebula form; a different initial stage plays its transition from there
    pub fn with_scheduler(config: &SignatureConfig, scheduler: S) -> Self {
        let mut animator = Self {
            state: SignatureState::default(),
            scheduler,
            sequencer: StageSequencer::new(Some(Stage::Nebula)),
            layers: config.layers.clone(),
            swirl_stars: SwirlStars::new(config.swirl_star_count, config.swirl_star_seed),
        };
        animator.set_stage(config.initial_stage);
        animator
    }

    pub fn state(&self) -> &SignatureState {
        &self.state
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn stage(&self) -> Option<Stage> {
        self.sequencer.last_stage()
    }

    pub fn swirl_stars(&self) -> &SwirlStars {
        &self.swirl_stars
    }

    pub fn layers(&self) -> &[NebulaLayerSpec] {
        &self.layers
    }

    /// Swaps in new layer specs (rotation rates, base opacities)
    pub fn set_layers(&mut self, layers: Vec<NebulaLayerSpec>) {
        self.layers = layers;
    }

    /// The captured collapse origins, while a collapse is in progress
    pub fn collapse_snapshot(&self) -> Option<&GasSnapshot> {
        self.state.collapse.snapshot()
    }

    pub fn set_stage(&mut self, stage: Stage) -> Transition {
        self.apply_stage(Some(stage))
    }

    /// Stage input by name; unknown names count as "no stage"
    pub fn request_stage(&mut self, name: &str) -> Transition {
        match name.parse::<Stage>() {
            Ok(stage) => self.apply_stage(Some(stage)),
            Err(err) => {
                warn!("{err}; fading highlight only");
                self.apply_stage(None)
            }
        }
    }

    pub fn apply_stage(&mut self, stage: Option<Stage>) -> Transition {
        self.sequencer.request(stage, &mut self.state, &mut self.scheduler)
    }

    /// Drops every pending transition and standalone tween, e.g. when the visual is unmounted
    pub fn cancel_transitions(&mut self) {
        self.sequencer.cancel(&mut self.scheduler);
        self.scheduler.cancel_all();
    }

    /// One frame. `elapsed` is the host clock (drives the swirl star orbits), `delta` the frame
    /// time.
    pub fn update(&mut self, elapsed: f32, delta: f32, scene: &mut impl SceneGraph) {
        let delta = sanitize_delta(delta);
        self.scheduler.advance(delta, &mut self.state);

        let state = &mut self.state;

        if let Some(core) = scene.node_mut(NodeId::Core) {
            spin_y(core, delta * CORE_SPIN_RATE);
            core.set_scale(Vec3::splat(state.core_scale));
            core.set_opacity(state.core_opacity);
            core.set_emissive_intensity(state.core_glow);
        }

        if let Some(disk) = scene.node_mut(NodeId::Disk) {
            spin_y(disk, delta * state.spin);
            disk.set_scale(Vec3::new(state.disk_scale, state.disk_scale, 1.0));
            disk.set_opacity(state.disk_opacity);
        }

        if let Some(highlight) = scene.node_mut(NodeId::Highlight) {
            highlight.set_opacity(state.highlight_opacity);
        }

        state.swirl_progress = smooth_toward(state.swirl_progress, state.swirl_target, delta);

        for (i, layer) in self.layers.iter().enumerate() {
            let Some(node) = scene.node_mut(NodeId::NebulaLayer(i)) else {
                continue;
            };
            let mut rotation = node.rotation();
            rotation.y += delta * layer.rotation_rate;
            rotation.x += delta * layer.rotation_rate * LAYER_PITCH_FACTOR;
            node.set_rotation(rotation);
            node.set_opacity(layer.base_opacity * state.nebula_opacity);
        }

        for (i, base) in GAS_BASE_OPACITY.iter().enumerate() {
            let Some(node) = scene.node_mut(NodeId::Gas(i)) else {
                continue;
            };
            let time = node.uniform(Uniform::Time);
            node.set_uniform(Uniform::Time, time + delta);
            node.set_uniform(Uniform::Opacity, base * state.nebula_opacity);
        }

        if let Some(next) = update_gas_clouds(state, delta, scene) {
            debug!("Gas collapse {:?} -> {:?}", variant_name(&state.collapse), variant_name(&next));
            state.collapse = next;
        }

        self.swirl_stars
            .update(elapsed, state.swirl_progress, state.swirl_stars_opacity, scene);

        for (id, pulse) in [
            (NodeId::Shockwave, &state.pulses.shock),
            (NodeId::Burst, &state.pulses.burst),
            (NodeId::MicroFlash, &state.pulses.micro_flash),
        ] {
            if let Some(node) = scene.node_mut(id) {
                write_pulse(node, pulse);
            }
        }
        state.pulses.advance(delta);
    }
}

fn variant_name(collapse: &CollapseState) -> &'static str {
    match collapse {
        CollapseState::Idle => "idle",
        CollapseState::Collapsing(_) => "collapsing",
        CollapseState::Collapsed(_) => "collapsed",
        CollapseState::Unwinding(_) => "unwinding",
    }
}

fn drift(index: usize, delta: f32, node: &mut dyn SceneNode) {
    let mut rotation = node.rotation();
    rotation.z += delta * GAS_DRIFT_SPEEDS[index];
    node.set_rotation(rotation);
}

/// Positions the gas clouds for this frame. Returns the next collapse state when it changes.
fn update_gas_clouds(
    state: &mut SignatureState,
    delta: f32,
    scene: &mut impl SceneGraph,
) -> Option<CollapseState> {
    let p = state.swirl_progress;
    let active = p > SWIRL_ACTIVE_THRESHOLD;
    let settled = state.swirl_target >= 1.0 && p >= 1.0 - SWIRL_SETTLE_EPSILON;

    // Progress moved without a transition having started one: collapse from the live pose
    if active && state.collapse.is_idle() {
        state.collapse = CollapseState::Collapsing(EMPTY_SNAPSHOT);
    }

    match &mut state.collapse {
        CollapseState::Idle => {
            for i in 0..GAS_CLOUD_COUNT {
                if let Some(node) = scene.node_mut(NodeId::Gas(i)) {
                    drift(i, delta, node);
                }
            }
            None
        }
        CollapseState::Collapsing(snapshot) => {
            for (i, slot) in snapshot.iter_mut().enumerate() {
                let Some(node) = scene.node_mut(NodeId::Gas(i)) else {
                    continue;
                };
                if !active {
                    drift(i, delta, node);
                    continue;
                }
                let origin = *slot.get_or_insert_with(|| {
                    debug!("Captured collapse origin for gas cloud {i}");
                    PolarPose::capture(&*node)
                });
                origin.apply(if settled { 1.0 } else { p }, node);
            }
            settled.then_some(CollapseState::Collapsed(*snapshot))
        }
        CollapseState::Collapsed(_) => None,
        CollapseState::Unwinding(origins) => {
            for (i, slot) in origins.iter().enumerate() {
                let Some(node) = scene.node_mut(NodeId::Gas(i)) else {
                    continue;
                };
                // Never captured, so never moved off its drift
                let Some(origin) = slot else {
                    drift(i, delta, node);
                    continue;
                };
                if active {
                    origin.apply(p, node);
                } else {
                    origin.restore(node);
                }
            }
            (!active).then_some(CollapseState::Idle)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::mount_layout;
    use crate::scene_node::HeadlessScene;
    use crate::stage::STAR_PROFILE;

    const FRAME: f32 = 1.0 / 60.0;

    fn mounted() -> (SignatureAnimator, HeadlessScene) {
        let config = SignatureConfig::default();
        let scene = HeadlessScene::mounted(mount_layout(
            &config.layer_base_opacities(),
            config.swirl_star_count,
        ));
        (SignatureAnimator::new(&config), scene)
    }

    fn run(
        animator: &mut SignatureAnimator,
        scene: &mut HeadlessScene,
        clock: &mut f32,
        seconds: f32,
    ) {
        let steps = (seconds / FRAME).ceil() as usize;
        for _ in 0..steps {
            *clock += FRAME;
            animator.update(*clock, FRAME, scene);
        }
    }

    #[test]
    fn smoothing_is_frame_rate_independent() {
        let mut coarse = 0.0;
        coarse = smooth_toward(coarse, 1.0, 0.5);
        let mut fine = 0.0;
        for _ in 0..50 {
            fine = smooth_toward(fine, 1.0, 0.01);
        }
        assert!((coarse - fine).abs() < 1e-4, "{coarse} vs {fine}");
        assert_eq!(smooth_toward(0.3, 1.0, 0.0), 0.3);
    }

    #[test]
    fn smoothing_converges_monotonically() {
        let mut p = 0.0f32;
        let mut steps = 0;
        while (1.0 - p) > 1e-6 {
            let next = smooth_toward(p, 1.0, FRAME);
            assert!(next >= p);
            p = next;
            steps += 1;
            assert!(steps < 300, "did not converge");
        }
    }

    #[test]
    fn state_round_trips_through_properties() {
        let mut state = SignatureState::default();
        state.set(SignatureProperty::DiskScale, 2.0);
        assert_eq!(state.get(SignatureProperty::DiskScale), 2.0);
        assert_eq!(state.disk_scale, 2.0);
    }

    #[test]
    fn nebula_drifts_at_rest() {
        let (mut animator, mut scene) = mounted();
        let before = scene.node(NodeId::Gas(1)).copied().unwrap();
        let mut clock = 0.0;
        run(&mut animator, &mut scene, &mut clock, 1.0);

        let after = scene.node(NodeId::Gas(1)).copied().unwrap();
        assert_eq!(after.position, before.position);
        assert!((after.rotation.z - (before.rotation.z + 0.012)).abs() < 1e-4);
        assert!((after.u_time - 1.0).abs() < 1e-3);
        assert!((after.u_opacity - 0.30).abs() < 1e-6);
    }

    #[test]
    fn core_and_disk_spin_independently() {
        let (mut animator, mut scene) = mounted();
        animator.update(0.5, 0.5, &mut scene);
        let core = scene.node(NodeId::Core).copied().unwrap();
        let disk = scene.node(NodeId::Disk).copied().unwrap();
        assert!((core.rotation.y - 0.06).abs() < 1e-6);
        assert!((disk.rotation.y - 0.025).abs() < 1e-6);
        assert!((disk.rotation.x - DISK_TILT).abs() < 1e-6);
    }

    #[test]
    fn layer_opacity_follows_nebula_opacity() {
        let (mut animator, mut scene) = mounted();
        animator.state.nebula_opacity = 0.5;
        animator.update(0.0, 0.0, &mut scene);
        assert!((scene.node(NodeId::NebulaLayer(0)).unwrap().opacity - 0.8).abs() < 1e-6);
        assert!((scene.node(NodeId::NebulaLayer(2)).unwrap().opacity - 0.55).abs() < 1e-6);
        assert!((scene.node(NodeId::Gas(0)).unwrap().u_opacity - 0.225).abs() < 1e-6);
    }

    #[test]
    fn collapse_settles_and_drops_the_snapshot() {
        let (mut animator, mut scene) = mounted();
        animator.set_stage(Stage::Star);
        assert!(animator.collapse_snapshot().is_some());

        let mut clock = 0.0;
        run(&mut animator, &mut scene, &mut clock, 0.8);
        let snapshot = animator.collapse_snapshot().copied().unwrap();
        assert!(snapshot.iter().all(Option::is_some));

        run(&mut animator, &mut scene, &mut clock, 4.0);
        assert!(matches!(animator.state().collapse, CollapseState::Collapsed(_)));
        assert!(animator.collapse_snapshot().is_none());

        let gas = scene.node(NodeId::Gas(0)).copied().unwrap();
        assert!(gas.position.x.abs() < 1e-5 && gas.position.y.abs() < 1e-5);
        assert_eq!(gas.position.z, -0.35);

        let core = scene.node(NodeId::Core).copied().unwrap();
        assert_eq!(core.opacity, STAR_PROFILE.core_opacity);
        assert_eq!(core.scale, Vec3::splat(STAR_PROFILE.core_scale));
    }

    #[test]
    fn missing_gas_cloud_is_captured_when_it_appears() {
        let (mut animator, mut scene) = mounted();
        let gas_two = scene.remove(NodeId::Gas(2)).unwrap();
        animator.set_stage(Stage::Star);

        let mut clock = 0.0;
        run(&mut animator, &mut scene, &mut clock, 0.6);
        assert!(animator.collapse_snapshot().is_some_and(|s| s[2].is_none() && s[0].is_some()));

        scene.insert(NodeId::Gas(2), gas_two);
        run(&mut animator, &mut scene, &mut clock, FRAME);
        assert!(animator.collapse_snapshot().is_some_and(|s| s[2].is_some()));
    }

    #[test]
    fn unwinding_returns_clouds_to_their_collapse_origin() {
        let (mut animator, mut scene) = mounted();
        let mut clock = 0.0;
        run(&mut animator, &mut scene, &mut clock, 10.0);
        let before: Vec<_> = (0..GAS_CLOUD_COUNT)
            .map(|i| scene.node(NodeId::Gas(i)).copied().unwrap())
            .collect();

        animator.set_stage(Stage::Star);
        run(&mut animator, &mut scene, &mut clock, 4.0);
        animator.set_stage(Stage::Nebula);
        assert!(matches!(animator.state().collapse, CollapseState::Unwinding(_)));

        run(&mut animator, &mut scene, &mut clock, 6.0);
        assert_eq!(animator.state().collapse, CollapseState::Idle);
        for (i, origin) in before.iter().enumerate() {
            let node = scene.node(NodeId::Gas(i)).copied().unwrap();
            assert!((node.position - origin.position).length() < 1e-5, "gas {i} position");
            assert!((node.scale - origin.scale).length() < 1e-5, "gas {i} scale");
        }
    }

    #[test]
    fn return_to_nebula_keeps_the_drifted_roll_continuous() {
        let (mut animator, mut scene) = mounted();
        let mut clock = 0.0;
        // Long enough for the drift to carry the roll well away from the mount layout
        run(&mut animator, &mut scene, &mut clock, 120.0);
        animator.set_stage(Stage::Star);
        run(&mut animator, &mut scene, &mut clock, 5.0);

        let before = scene.node(NodeId::Gas(1)).copied().unwrap();
        animator.set_stage(Stage::Nebula);
        animator.update(clock + 0.001, 0.001, &mut scene);
        let after = scene.node(NodeId::Gas(1)).copied().unwrap();

        assert!(
            (after.rotation.z - before.rotation.z).abs() < 0.05,
            "{} -> {}",
            before.rotation.z,
            after.rotation.z
        );
        assert!((after.position - before.position).length() < 0.05);
    }

    #[test]
    fn early_toggle_back_to_nebula_does_not_snap() {
        let (mut animator, mut scene) = mounted();
        let mut clock = 0.0;
        run(&mut animator, &mut scene, &mut clock, 30.0);
        animator.set_stage(Stage::Star);
        animator.set_stage(Stage::Nebula);

        let before = scene.node(NodeId::Gas(1)).copied().unwrap();
        run(&mut animator, &mut scene, &mut clock, FRAME);
        let after = scene.node(NodeId::Gas(1)).copied().unwrap();

        assert!((after.rotation.z - before.rotation.z).abs() < 1e-3);
        assert_eq!(after.position, before.position);
        assert_eq!(animator.state().collapse, CollapseState::Idle);
    }

    #[test]
    fn cancel_stops_standalone_tweens_too() {
        let (mut animator, mut scene) = mounted();
        let mut clock = 0.0;
        animator.set_stage(Stage::Star);
        run(&mut animator, &mut scene, &mut clock, 6.0 * FRAME);
        let at_cancel = animator.state().highlight_opacity;

        animator.cancel_transitions();
        assert!(animator.scheduler().is_idle());

        run(&mut animator, &mut scene, &mut clock, 2.0);
        assert_eq!(animator.state().highlight_opacity, at_cancel);
        assert_eq!(animator.state().disk_scale, NEBULA_PROFILE.disk_scale);
        assert_eq!(animator.scheduler().writers_of(SignatureProperty::HighlightOpacity), 0);
    }

    #[test]
    fn pulses_are_written_before_they_decay() {
        let (mut animator, mut scene) = mounted();
        animator.state.pulses.trigger_all();
        animator.update(0.0, 0.1, &mut scene);
        let burst = scene.node(NodeId::Burst).copied().unwrap();
        assert_eq!(burst.opacity, 1.0);
        assert_eq!(burst.scale, Vec3::new(3.4, 3.4, 1.0));
        assert!(animator.state().pulses.burst.alpha < 1.0);
    }

    #[test]
    fn bad_deltas_freeze_the_frame() {
        let (mut animator, mut scene) = mounted();
        animator.set_stage(Stage::Star);
        let before = animator.state().clone();
        animator.update(1.0, f32::NAN, &mut scene);
        animator.update(1.0, -0.5, &mut scene);
        animator.update(1.0, f32::INFINITY, &mut scene);
        assert_eq!(animator.state().swirl_target, before.swirl_target);
        assert_eq!(animator.state().swirl_progress, 0.0);
    }

    #[test]
    fn unknown_stage_names_are_tolerated() {
        let (mut animator, _) = mounted();
        assert_eq!(animator.request_stage("quasar"), Transition::Unknown);
        assert_eq!(animator.stage(), None);
        assert_eq!(animator.request_stage("star"), Transition::Profile);
    }

    #[test]
    fn initial_stage_plays_from_the_nebula() {
        let config = SignatureConfig::default().with_initial_stage(Stage::Star);
        let animator = SignatureAnimator::new(&config);
        assert_eq!(animator.stage(), Some(Stage::Star));
        assert!(animator.collapse_snapshot().is_some());
    }
}
