// Lifecycle stages and their target profiles
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Stage {
    #[default]
    Nebula,
    Star,
    Supergiant,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Nebula, Stage::Star, Stage::Supergiant];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Nebula => "nebula",
            Stage::Star => "star",
            Stage::Supergiant => "supergiant",
        }
    }

    pub fn profile(self) -> &'static StageProfile {
        match self {
            Stage::Nebula => &NEBULA_PROFILE,
            Stage::Star => &STAR_PROFILE,
            Stage::Supergiant => &SUPERGIANT_PROFILE,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseStageError {
    #[error("unknown stage '{0}' (expected nebula, star or supergiant)")]
    Unknown(String),
}

impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| ParseStageError::Unknown(s.to_string()))
    }
}

/// Target values a stage settles into
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageProfile {
    pub core_glow: f32,
    pub core_opacity: f32,
    pub core_scale: f32,
    pub disk_scale: f32,
    pub spin: f32,
    pub nebula_opacity: f32,
    pub disk_opacity: f32,
    pub highlight_opacity: f32,
}

impl StageProfile {
    /// Fallback for unrecognised stage input: no target anywhere
    pub const ZERO: StageProfile = StageProfile {
        core_glow: 0.0,
        core_opacity: 0.0,
        core_scale: 0.0,
        disk_scale: 0.0,
        spin: 0.0,
        nebula_opacity: 0.0,
        disk_opacity: 0.0,
        highlight_opacity: 0.0,
    };

    pub fn for_stage(stage: Option<Stage>) -> &'static StageProfile {
        match stage {
            Some(stage) => stage.profile(),
            None => &StageProfile::ZERO,
        }
    }
}

pub const NEBULA_PROFILE: StageProfile = StageProfile {
    core_glow: 0.05,
    core_opacity: 0.08,
    core_scale: 0.65,
    disk_scale: 0.0,
    spin: 0.05,
    nebula_opacity: 1.0,
    disk_opacity: 0.0,
    highlight_opacity: 0.0,
};

pub const STAR_PROFILE: StageProfile = StageProfile {
    core_glow: 1.35,
    core_opacity: 1.0,
    core_scale: 1.05,
    disk_scale: 1.6,
    spin: 0.5,
    nebula_opacity: 0.45,
    disk_opacity: 0.5,
    highlight_opacity: 0.25,
};

pub const SUPERGIANT_PROFILE: StageProfile = StageProfile {
    core_glow: 2.2,
    core_opacity: 1.0,
    core_scale: 1.25,
    disk_scale: 2.6,
    spin: 0.9,
    nebula_opacity: 0.25,
    disk_opacity: 0.65,
    highlight_opacity: 0.35,
};
