//! Tweens, timelines and the scheduler that drives them
//!
//! A `Timeline` holds cues (tweens or one-shot callbacks) at absolute offsets from its
//! start. The `Scheduler` advances every playing timeline on a shared virtual clock and
//! can cancel a timeline as a unit: cancelled cues never run. Targets are plain structs
//! implementing `Animatable`, addressed by a property enum instead of field references.

use std::fmt;

/// Easing curves used by the choreography
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Ease {
    #[default]
    Linear,
    /// 1 - (1-t)^2
    QuadOut,
    /// 1 - (1-t)^3
    CubicOut,
    /// Cubic in the first half, mirrored in the second
    CubicInOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::QuadOut => 1.0 - (1.0 - t).powi(2),
            Ease::CubicOut => 1.0 - (1.0 - t).powi(3),
            Ease::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Something whose numeric properties a tween can drive
pub trait Animatable {
    type Property: Copy + Eq + fmt::Debug + Send + Sync + 'static;

    fn get(&self, property: Self::Property) -> f32;
    fn set(&mut self, property: Self::Property, value: f32);
}

/// Interpolates one property from its value at start time to `to`
#[derive(Clone, Debug, PartialEq)]
pub struct Tween<P> {
    pub property: P,
    pub to: f32,
    pub duration: f32,
    pub ease: Ease,
    elapsed: f32,
    from: Option<f32>,
}

impl<P: Copy> Tween<P> {
    pub fn new(property: P, to: f32, duration: f32, ease: Ease) -> Self {
        Self {
            property,
            to,
            duration: duration.max(0.0),
            ease,
            elapsed: 0.0,
            from: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.from.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.is_started() && self.elapsed >= self.duration
    }

    /// Moves to `local_time` seconds after the tween's start and writes the value.
    /// The start value is captured on the first seek.
    pub fn seek<A: Animatable<Property = P>>(&mut self, local_time: f32, target: &mut A) {
        let from = *self.from.get_or_insert_with(|| target.get(self.property));
        self.elapsed = local_time.clamp(0.0, self.duration);
        let t = if self.duration <= 0.0 { 1.0 } else { self.elapsed / self.duration };
        let value = if t >= 1.0 { self.to } else { from + (self.to - from) * self.ease.apply(t) };
        target.set(self.property, value);
    }

    fn step<A: Animatable<Property = P>>(&mut self, delta: f32, target: &mut A) {
        let local = if self.is_started() { self.elapsed + delta } else { delta };
        self.seek(local, target);
    }
}

pub type Callback<A> = Box<dyn FnOnce(&mut A) + Send + Sync>;

enum CueAction<A: Animatable> {
    Tween(Tween<A::Property>),
    Call(Option<Callback<A>>),
}

struct Cue<A: Animatable> {
    at: f32,
    action: CueAction<A>,
}

impl<A: Animatable> Cue<A> {
    fn is_done(&self) -> bool {
        match &self.action {
            CueAction::Tween(tween) => tween.is_finished(),
            CueAction::Call(callback) => callback.is_none(),
        }
    }

    fn end(&self) -> f32 {
        match &self.action {
            CueAction::Tween(tween) => self.at + tween.duration,
            CueAction::Call(_) => self.at,
        }
    }
}

/// Ordered cues at fixed offsets from the timeline start
pub struct Timeline<A: Animatable> {
    label: &'static str,
    clock: f32,
    cues: Vec<Cue<A>>,
}

impl<A: Animatable> Timeline<A> {
    pub fn new(label: &'static str) -> Self {
        Self { label, clock: 0.0, cues: Vec::new() }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Schedules a tween of `property` toward `to`, starting `at` seconds in
    pub fn tween(
        &mut self,
        at: f32,
        property: A::Property,
        to: f32,
        duration: f32,
        ease: Ease,
    ) -> &mut Self {
        self.insert(at, CueAction::Tween(Tween::new(property, to, duration, ease)))
    }

    /// Schedules a one-shot callback `at` seconds in
    pub fn call(
        &mut self,
        at: f32,
        callback: impl FnOnce(&mut A) + Send + Sync + 'static,
    ) -> &mut Self {
        self.insert(at, CueAction::Call(Some(Box::new(callback))))
    }

    fn insert(&mut self, at: f32, action: CueAction<A>) -> &mut Self {
        let at = at.max(0.0);
        // Keep cues sorted by offset; equal offsets keep insertion order
        let index = self.cues.partition_point(|cue| cue.at <= at);
        self.cues.insert(index, Cue { at, action });
        self
    }

    pub fn elapsed(&self) -> f32 {
        self.clock
    }

    /// Offset at which the last cue completes
    pub fn duration(&self) -> f32 {
        self.cues.iter().map(Cue::end).fold(0.0, f32::max)
    }

    pub fn is_finished(&self) -> bool {
        self.cues.iter().all(Cue::is_done)
    }

    /// True while a started, unfinished tween of `property` belongs to this timeline
    pub fn is_writing(&self, property: A::Property) -> bool {
        self.cues.iter().any(|cue| match &cue.action {
            CueAction::Tween(tween) => {
                tween.property == property && tween.is_started() && !tween.is_finished()
            }
            CueAction::Call(_) => false,
        })
    }

    /// Moves the timeline clock forward, firing cues in offset order.
    /// Cues whose offset falls inside this step all run, earliest first.
    pub fn advance(&mut self, delta: f32, target: &mut A) {
        self.clock += delta.max(0.0);
        let now = self.clock;

        for cue in self.cues.iter_mut() {
            if cue.at > now {
                break;
            }
            match &mut cue.action {
                CueAction::Tween(tween) => {
                    if !tween.is_finished() {
                        tween.seek(now - cue.at, target);
                    }
                }
                CueAction::Call(callback) => {
                    if let Some(callback) = callback.take() {
                        callback(target);
                    }
                }
            }
        }
    }
}

impl<A: Animatable> fmt::Debug for Timeline<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("label", &self.label)
            .field("clock", &self.clock)
            .field("cues", &self.cues.len())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimelineId(u64);

/// Tween/timeline host the sequencer depends on; swap in a fake for tests
pub trait Scheduler<A: Animatable>: Send + Sync {
    /// Standalone tween; replaces any standalone tween already driving `property`
    fn tween(&mut self, property: A::Property, to: f32, duration: f32, ease: Ease);

    fn play(&mut self, timeline: Timeline<A>) -> TimelineId;

    /// Drops the timeline and everything still pending in it. Returns false if it was already gone.
    fn cancel(&mut self, id: TimelineId) -> bool;

    fn cancel_all(&mut self);

    fn is_playing(&self, id: TimelineId) -> bool;

    fn advance(&mut self, delta: f32, target: &mut A);
}

/// Stock scheduler: a list of playing timelines plus overwrite-by-property standalone tweens
pub struct TweenEngine<A: Animatable> {
    next_id: u64,
    timelines: Vec<(TimelineId, Timeline<A>)>,
    tweens: Vec<Tween<A::Property>>,
}

impl<A: Animatable> Default for TweenEngine<A> {
    fn default() -> Self {
        Self {
            next_id: 0,
            timelines: Vec::new(),
            tweens: Vec::new(),
        }
    }
}

impl<A: Animatable> TweenEngine<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playing_timelines(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_idle(&self) -> bool {
        self.timelines.is_empty() && self.tweens.is_empty()
    }

    /// Number of sources currently driving `property` (timelines and standalone tweens)
    pub fn writers_of(&self, property: A::Property) -> usize {
        let from_timelines =
            self.timelines.iter().filter(|(_, tl)| tl.is_writing(property)).count();
        let standalone = self
            .tweens
            .iter()
            .filter(|t| t.property == property && !t.is_finished())
            .count();
        from_timelines + standalone
    }
}

impl<A: Animatable> Scheduler<A> for TweenEngine<A> {
    fn tween(&mut self, property: A::Property, to: f32, duration: f32, ease: Ease) {
        self.tweens.retain(|t| t.property != property);
        self.tweens.push(Tween::new(property, to, duration, ease));
    }

    fn play(&mut self, timeline: Timeline<A>) -> TimelineId {
        let id = TimelineId(self.next_id);
        self.next_id += 1;
        self.timelines.push((id, timeline));
        id
    }

    fn cancel(&mut self, id: TimelineId) -> bool {
        let before = self.timelines.len();
        self.timelines.retain(|(tid, _)| *tid != id);
        self.timelines.len() != before
    }

    fn cancel_all(&mut self) {
        self.timelines.clear();
        self.tweens.clear();
    }

    fn is_playing(&self, id: TimelineId) -> bool {
        self.timelines.iter().any(|(tid, _)| *tid == id)
    }

    fn advance(&mut self, delta: f32, target: &mut A) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };

        for (_, timeline) in self.timelines.iter_mut() {
            timeline.advance(delta, target);
        }
        self.timelines.retain(|(_, tl)| !tl.is_finished());

        for tween in self.tweens.iter_mut() {
            tween.step(delta, target);
        }
        self.tweens.retain(|t| !t.is_finished());
    }
}
