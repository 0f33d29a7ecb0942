//! Stage transition sequencer
//!
//! Turns discrete stage changes into scheduled work on the animation state. Only the
//! nebula -> star edge has a full choreography (collapse, ignition boom, core and disk
//! emergence). Other edges glide toward the new profile, and entering nebula resets
//! the visual instantly. Each transition owns one timeline and cancels its predecessor
//! before scheduling anything, so two transitions never drive the same property.

use bevy::prelude::*;

use crate::animator::{SignatureProperty as Prop, SignatureState};
use crate::constants::*;
use crate::stage::{Stage, StageProfile, NEBULA_PROFILE};
use crate::swirl::{CollapseState, EMPTY_SNAPSHOT};
use crate::tween::{Ease, Scheduler, Timeline, TimelineId};

/// Which choreography a transition ran
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Same stage as last time; nothing scheduled
    Unchanged,
    /// Unrecognised input; only the highlight fades
    Unknown,
    EnterNebula,
    Collapse,
    Profile,
}

#[derive(Debug, Default)]
pub struct StageSequencer {
    last: Option<Stage>,
    active: Option<TimelineId>,
}

impl StageSequencer {
    pub fn new(initial: Option<Stage>) -> Self {
        Self { last: initial, active: None }
    }

    pub fn last_stage(&self) -> Option<Stage> {
        self.last
    }

    pub fn active_timeline(&self) -> Option<TimelineId> {
        self.active
    }

    /// Feeds the next stage input. Edge-triggered: repeating the last input does nothing.
    pub fn request<S: Scheduler<SignatureState>>(
        &mut self,
        next: Option<Stage>,
        state: &mut SignatureState,
        scheduler: &mut S,
    ) -> Transition {
        if next == self.last {
            return Transition::Unchanged;
        }
        let prev = std::mem::replace(&mut self.last, next);

        let highlight_duration = if next == Some(Stage::Nebula) {
            HIGHLIGHT_FADE_TO_NEBULA
        } else {
            HIGHLIGHT_FADE
        };
        scheduler.tween(
            Prop::HighlightOpacity,
            StageProfile::for_stage(next).highlight_opacity,
            highlight_duration,
            Ease::QuadOut,
        );

        let Some(stage) = next else {
            return Transition::Unknown;
        };

        self.cancel(scheduler);

        let (transition, timeline) = match (prev, stage) {
            (_, Stage::Nebula) => (Transition::EnterNebula, enter_nebula(state)),
            (Some(Stage::Nebula), Stage::Star) => {
                (Transition::Collapse, collapse_to(stage.profile(), state))
            }
            (_, _) => (Transition::Profile, glide_to(stage.profile(), state)),
        };

        info!(
            "Stage {} -> {} ({:?}, {:.2}s)",
            prev.map_or("none", Stage::name),
            stage,
            transition,
            timeline.duration()
        );
        self.active = Some(scheduler.play(timeline));
        transition
    }

    /// Stops whatever the last transition still had pending
    pub fn cancel<S: Scheduler<SignatureState>>(&mut self, scheduler: &mut S) {
        if let Some(id) = self.active.take() {
            if scheduler.cancel(id) {
                debug!("Cancelled in-flight transition {:?}", id);
            }
        }
    }
}

/// Starts (or restarts) the gas collapse from wherever the swirl currently is
fn begin_collapse(state: &mut SignatureState) {
    state.collapse = match state.collapse {
        // Clouds are on their live pose; capture it when the transform first runs
        CollapseState::Idle => CollapseState::Collapsing(EMPTY_SNAPSHOT),
        // Clouds are somewhere on the last spiral; turn back along it
        CollapseState::Unwinding(origins) => CollapseState::Collapsing(origins),
        other => other,
    };
    state.swirl_target = state.swirl_progress;
    state.swirl_stars_opacity = 1.0;
}

/// Full nebula -> star choreography
fn collapse_to(star: &StageProfile, state: &mut SignatureState) -> Timeline<SignatureState> {
    begin_collapse(state);

    let (fade, ignite, emerge) = (NEBULA_FADE_AT, CORE_IGNITE_AT, DISK_EMERGE_AT);
    let mut timeline = Timeline::new("collapse");
    timeline
        .tween(0.0, Prop::SwirlTarget, 1.0, COLLAPSE_DURATION, Ease::CubicInOut)
        .tween(fade, Prop::NebulaOpacity, star.nebula_opacity, NEBULA_FADE_DURATION, Ease::QuadOut)
        .call(IGNITION_AT, |state: &mut SignatureState| state.pulses.trigger_all())
        .tween(ignite, Prop::CoreScale, star.core_scale, CORE_SCALE_DURATION, Ease::CubicOut)
        .tween(ignite, Prop::CoreOpacity, star.core_opacity, CORE_LIGHT_DURATION, Ease::CubicOut)
        .tween(ignite, Prop::CoreGlow, star.core_glow, CORE_LIGHT_DURATION, Ease::CubicOut)
        .tween(ignite, Prop::SwirlStarsOpacity, 0.0, SWIRL_STARS_FADE_DURATION, Ease::QuadOut)
        .tween(emerge, Prop::DiskScale, star.disk_scale, DISK_SCALE_DURATION, Ease::CubicOut)
        .tween(emerge, Prop::DiskOpacity, star.disk_opacity, DISK_FADE_DURATION, Ease::QuadOut)
        .tween(emerge, Prop::Spin, star.spin, SPIN_UP_DURATION, Ease::QuadOut);
    timeline
}

/// Plain profile glide for edges without a choreography; no pulses
fn glide_to(target: &StageProfile, state: &mut SignatureState) -> Timeline<SignatureState> {
    let mut timeline = Timeline::new("profile");
    for (prop, to) in [
        (Prop::CoreScale, target.core_scale),
        (Prop::CoreOpacity, target.core_opacity),
        (Prop::CoreGlow, target.core_glow),
        (Prop::DiskScale, target.disk_scale),
        (Prop::DiskOpacity, target.disk_opacity),
        (Prop::Spin, target.spin),
        (Prop::NebulaOpacity, target.nebula_opacity),
    ] {
        timeline.tween(0.0, prop, to, PROFILE_TWEEN_DURATION, Ease::QuadOut);
    }

    // Leaving the nebula form, or a collapse cut short: finish the swirl
    if !matches!(state.collapse, CollapseState::Collapsed(_)) {
        if matches!(state.collapse, CollapseState::Idle | CollapseState::Unwinding(_)) {
            begin_collapse(state);
        }
        timeline
            .tween(0.0, Prop::SwirlTarget, 1.0, COLLAPSE_DURATION, Ease::CubicInOut)
            .tween(
                PROFILE_STARS_FADE_AT,
                Prop::SwirlStarsOpacity,
                0.0,
                SWIRL_STARS_FADE_DURATION,
                Ease::QuadOut,
            );
    }
    timeline
}

/// Instant reset to the nebula form plus a short glide of the core back to it
fn enter_nebula(state: &mut SignatureState) -> Timeline<SignatureState> {
    let profile = NEBULA_PROFILE;

    state.swirl_target = 0.0;
    state.collapse = match state.collapse {
        CollapseState::Idle => CollapseState::Idle,
        CollapseState::Collapsing(origins)
        | CollapseState::Collapsed(origins)
        | CollapseState::Unwinding(origins) => CollapseState::Unwinding(origins),
    };
    state.disk_scale = profile.disk_scale;
    state.disk_opacity = profile.disk_opacity;
    state.spin = profile.spin;
    state.pulses.reset_all();
    state.swirl_stars_opacity = 1.0;

    let mut timeline = Timeline::new("nebula-restore");
    for (prop, to) in [
        (Prop::CoreScale, profile.core_scale),
        (Prop::CoreOpacity, profile.core_opacity),
        (Prop::CoreGlow, profile.core_glow),
        (Prop::NebulaOpacity, profile.nebula_opacity),
    ] {
        timeline.tween(0.0, prop, to, NEBULA_RESTORE_DURATION, Ease::QuadOut);
    }
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::STAR_PROFILE;
    use crate::swirl::PolarPose;
    use crate::tween::TweenEngine;

    fn setup() -> (StageSequencer, SignatureState, TweenEngine<SignatureState>) {
        (StageSequencer::new(Some(Stage::Nebula)), SignatureState::default(), TweenEngine::new())
    }

    fn run(engine: &mut TweenEngine<SignatureState>, state: &mut SignatureState, seconds: f32) {
        let steps = (seconds * 60.0).ceil() as usize;
        for _ in 0..steps {
            engine.advance(1.0 / 60.0, state);
        }
    }

    #[test]
    fn repeated_input_is_ignored() {
        let (mut seq, mut state, mut engine) = setup();
        let transition = seq.request(Some(Stage::Nebula), &mut state, &mut engine);
        assert_eq!(transition, Transition::Unchanged);
        assert!(engine.is_idle());
    }

    #[test]
    fn nebula_to_star_runs_the_collapse() {
        let (mut seq, mut state, mut engine) = setup();
        assert_eq!(seq.request(Some(Stage::Star), &mut state, &mut engine), Transition::Collapse);
        assert!(state.collapse.snapshot().is_some());

        run(&mut engine, &mut state, 1.40);
        assert_eq!(state.pulses.burst.alpha, 0.0);
        assert_eq!(state.disk_scale, 0.0);

        run(&mut engine, &mut state, 0.05);
        assert_eq!(state.pulses.burst.alpha, 1.0);

        run(&mut engine, &mut state, 1.2);
        assert_eq!(state.swirl_target, 1.0);
        assert_eq!(state.core_opacity, STAR_PROFILE.core_opacity);
        assert_eq!(state.disk_scale, STAR_PROFILE.disk_scale);
        assert_eq!(state.spin, STAR_PROFILE.spin);
        assert_eq!(state.swirl_stars_opacity, 0.0);
        assert_eq!(state.highlight_opacity, STAR_PROFILE.highlight_opacity);
        assert!(engine.is_idle());
    }

    #[test]
    fn ignition_waits_for_the_boom() {
        let (mut seq, mut state, mut engine) = setup();
        seq.request(Some(Stage::Star), &mut state, &mut engine);
        run(&mut engine, &mut state, 1.45);
        // Boom has fired but the core has not started to light
        assert_eq!(state.core_opacity, NEBULA_PROFILE.core_opacity);
        assert_eq!(engine.writers_of(Prop::CoreOpacity), 0);
    }

    #[test]
    fn entering_nebula_resets_instantly() {
        let (mut seq, mut state, mut engine) = setup();
        seq.request(Some(Stage::Star), &mut state, &mut engine);
        run(&mut engine, &mut state, 3.0);

        let transition = seq.request(Some(Stage::Nebula), &mut state, &mut engine);
        assert_eq!(transition, Transition::EnterNebula);
        assert_eq!(state.disk_scale, 0.0);
        assert_eq!(state.spin, NEBULA_PROFILE.spin);
        assert_eq!(state.swirl_target, 0.0);
        assert_eq!(state.swirl_stars_opacity, 1.0);
        assert!(state.pulses.iter_mut().all(|p| p.alpha == 0.0));
        assert!(matches!(state.collapse, CollapseState::Unwinding(_)));

        run(&mut engine, &mut state, 1.0);
        assert_eq!(state.core_opacity, NEBULA_PROFILE.core_opacity);
        assert_eq!(state.nebula_opacity, 1.0);
    }

    #[test]
    fn new_transition_cancels_the_previous_one() {
        let (mut seq, mut state, mut engine) = setup();
        seq.request(Some(Stage::Star), &mut state, &mut engine);
        let first = seq.active_timeline();
        run(&mut engine, &mut state, 0.5);

        seq.request(Some(Stage::Nebula), &mut state, &mut engine);
        assert!(first.is_some_and(|id| !engine.is_playing(id)));
        assert_eq!(engine.playing_timelines(), 1);

        // The cancelled boom never fires
        run(&mut engine, &mut state, 2.0);
        assert_eq!(state.pulses.shock.alpha, 0.0);
    }

    #[test]
    fn star_to_supergiant_glides_without_pulses() {
        let (mut seq, mut state, mut engine) = setup();
        seq.request(Some(Stage::Star), &mut state, &mut engine);
        run(&mut engine, &mut state, 3.0);
        state.collapse = CollapseState::Collapsed(EMPTY_SNAPSHOT);
        state.pulses.reset_all();

        let transition = seq.request(Some(Stage::Supergiant), &mut state, &mut engine);
        assert_eq!(transition, Transition::Profile);
        run(&mut engine, &mut state, 1.0);
        let target = Stage::Supergiant.profile();
        assert_eq!(state.disk_scale, target.disk_scale);
        assert_eq!(state.core_glow, target.core_glow);
        assert_eq!(state.nebula_opacity, target.nebula_opacity);
        assert_eq!(state.pulses.shock.alpha, 0.0);
        assert!(matches!(state.collapse, CollapseState::Collapsed(_)));
    }

    #[test]
    fn nebula_to_supergiant_still_collapses_the_swirl() {
        let (mut seq, mut state, mut engine) = setup();
        seq.request(Some(Stage::Supergiant), &mut state, &mut engine);
        assert!(state.collapse.snapshot().is_some());
        run(&mut engine, &mut state, 2.0);
        assert_eq!(state.swirl_target, 1.0);
        assert_eq!(state.swirl_stars_opacity, 0.0);
    }

    #[test]
    fn recollapse_mid_unwind_reuses_the_origins() {
        let (mut seq, mut state, mut engine) = setup();
        let mut origins = EMPTY_SNAPSHOT;
        let pose = PolarPose::from_parts(Vec3::new(1.0, 0.5, -0.3), Vec3::ONE, 0.4);
        origins[0] = Some(pose);
        state.collapse = CollapseState::Collapsed(origins);
        state.swirl_progress = 1.0;

        seq.request(Some(Stage::Nebula), &mut state, &mut engine);
        assert_eq!(state.collapse, CollapseState::Unwinding(origins));

        state.swirl_progress = 0.6;
        seq.request(Some(Stage::Star), &mut state, &mut engine);
        assert_eq!(state.collapse, CollapseState::Collapsing(origins));
        assert_eq!(state.swirl_target, 0.6);
    }

    #[test]
    fn unknown_stage_only_touches_the_highlight() {
        let (mut seq, mut state, mut engine) = setup();
        seq.request(Some(Stage::Star), &mut state, &mut engine);
        run(&mut engine, &mut state, 3.0);
        let before = state.clone();

        assert_eq!(seq.request(None, &mut state, &mut engine), Transition::Unknown);
        run(&mut engine, &mut state, 1.0);
        assert_eq!(state.highlight_opacity, 0.0);
        assert_eq!(state.disk_scale, before.disk_scale);
        assert_eq!(state.core_glow, before.core_glow);
    }
}
