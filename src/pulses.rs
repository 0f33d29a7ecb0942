// One-shot effect pulses: shockwave ring, ignition burst, micro flash.
// Each is an (alpha, scale) pair that fades on its own once triggered.

use crate::constants::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PulseKind {
    Shock,
    Burst,
    MicroFlash,
}

/// How the scale channel evolves after a trigger
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScaleMotion {
    Grow { rate: f32, max: f32 },
    Shrink { rate: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseProfile {
    pub decay: f32,
    pub motion: ScaleMotion,
    pub trigger: (f32, f32),
    pub rest_scale: f32,
}

impl PulseKind {
    pub const ALL: [PulseKind; 3] = [PulseKind::Shock, PulseKind::Burst, PulseKind::MicroFlash];

    pub fn profile(self) -> PulseProfile {
        match self {
            PulseKind::Shock => PulseProfile {
                decay: SHOCK_DECAY,
                motion: ScaleMotion::Grow { rate: SHOCK_GROWTH, max: SHOCK_MAX_SCALE },
                trigger: SHOCK_TRIGGER,
                rest_scale: SHOCK_REST_SCALE,
            },
            PulseKind::Burst => PulseProfile {
                decay: BURST_DECAY,
                motion: ScaleMotion::Shrink { rate: BURST_SHRINK },
                trigger: BURST_TRIGGER,
                rest_scale: BURST_REST_SCALE,
            },
            PulseKind::MicroFlash => PulseProfile {
                decay: MICRO_FLASH_DECAY,
                motion: ScaleMotion::Shrink { rate: MICRO_FLASH_SHRINK },
                trigger: MICRO_FLASH_TRIGGER,
                rest_scale: MICRO_FLASH_REST_SCALE,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pulse {
    pub kind: PulseKind,
    pub alpha: f32,
    pub scale: f32,
}

impl Pulse {
    pub fn at_rest(kind: PulseKind) -> Self {
        Self { kind, alpha: 0.0, scale: kind.profile().rest_scale }
    }

    pub fn trigger(&mut self) {
        let (alpha, scale) = self.kind.profile().trigger;
        self.alpha = alpha;
        self.scale = scale;
    }

    pub fn reset(&mut self) {
        *self = Self::at_rest(self.kind);
    }

    pub fn is_visible(&self) -> bool {
        self.alpha > 0.0
    }

    /// One frame of decay. Alpha and scale are floored at zero; shock scale is capped.
    pub fn advance(&mut self, delta: f32) {
        if delta <= 0.0 {
            return;
        }
        let profile = self.kind.profile();
        self.alpha = (self.alpha - delta * profile.decay).max(0.0);
        self.scale = match profile.motion {
            ScaleMotion::Grow { rate, max } => (self.scale + delta * rate).min(max),
            ScaleMotion::Shrink { rate } => self.scale - delta * rate,
        }
        .max(0.0);
    }
}

/// The three pulses the ignition fires together
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pulses {
    pub shock: Pulse,
    pub burst: Pulse,
    pub micro_flash: Pulse,
}

impl Default for Pulses {
    fn default() -> Self {
        Self {
            shock: Pulse::at_rest(PulseKind::Shock),
            burst: Pulse::at_rest(PulseKind::Burst),
            micro_flash: Pulse::at_rest(PulseKind::MicroFlash),
        }
    }
}

impl Pulses {
    pub fn get(&self, kind: PulseKind) -> &Pulse {
        match kind {
            PulseKind::Shock => &self.shock,
            PulseKind::Burst => &self.burst,
            PulseKind::MicroFlash => &self.micro_flash,
        }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pulse> {
        [&mut self.shock, &mut self.burst, &mut self.micro_flash].into_iter()
    }

    pub fn trigger_all(&mut self) {
        self.iter_mut().for_each(Pulse::trigger);
    }

    pub fn reset_all(&mut self) {
        self.iter_mut().for_each(Pulse::reset);
    }

    pub fn advance(&mut self, delta: f32) {
        self.iter_mut().for_each(|p| p.advance(delta));
    }
}
