//! Declarative experiment configuration.
//!
//! The original study ran as a family of near-identical scripts that
//! differed only in disparity formula, geometry flavour and response
//! keys.  Here one [`ExperimentConfig`] drives a single trial
//! controller; the variants are tagged enums selectable from the CLI.

use clap::ValueEnum;
use glam::{Vec3, vec3};

use crate::scene::{BrightnessPolicy, ColumnParams, FloorStyle, SplitRows};
use crate::stereo::DisparityModel;

/// Column geometry flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum GeometryVariant {
    /// Uniform brightness with small jitter (the standard stimulus).
    Uniform,
    /// Brightness falls with brick index, adding a pictorial depth cue.
    DepthCue,
    /// Uniform brightness plus occasional split rows.
    SplitRows,
}

impl GeometryVariant {
    pub fn column_params(self) -> ColumnParams {
        let base = ColumnParams::default();
        match self {
            GeometryVariant::Uniform => base,
            GeometryVariant::DepthCue => ColumnParams {
                brightness: BrightnessPolicy::DepthGradient { top: 1.0, drop: 0.3 },
                min_brightness: 0.4,
                max_brightness: 1.0,
                ..base
            },
            GeometryVariant::SplitRows => ColumnParams {
                split_rows: Some(SplitRows {
                    probability: 0.25,
                    gap: 0.3,
                }),
                ..base
            },
        }
    }
}

/// Ground-plane flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FloorVariant {
    /// Checkerboard reference plane with the column corridor cut out.
    Checkerboard,
    /// Solid matte sheet with jittered vertex normals.
    Solid,
}

impl FloorVariant {
    pub fn floor_style(self) -> FloorStyle {
        match self {
            FloorVariant::Checkerboard => FloorStyle::Checkerboard,
            FloorVariant::Solid => FloorStyle::Solid {
                divisions: 20,
                normal_jitter: 0.05,
            },
        }
    }
}

/// CLI-facing twin of [`DisparityModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DisparityGranularity {
    PerVertex,
    WholeObject,
}

impl From<DisparityGranularity> for DisparityModel {
    fn from(g: DisparityGranularity) -> Self {
        match g {
            DisparityGranularity::PerVertex => DisparityModel::PerVertex,
            DisparityGranularity::WholeObject => DisparityModel::WholeObject,
        }
    }
}

/// Which keys answer the depth judgement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResponseKeySet {
    /// W = above, S = below, Space = on plane.
    PlaneJudgement,
    /// Up/Down arrows (two-alternative forced choice, no on-plane
    /// option).
    Arrows,
}

impl ResponseKeySet {
    /// Whether this key set can express an on-plane judgement.  On-plane
    /// catch trials are unanswerable under a two-alternative set, so
    /// runs must reject that combination before the first trial.
    pub fn supports_onplane(self) -> bool {
        matches!(self, ResponseKeySet::PlaneJudgement)
    }
}

/// Everything one run needs, camera geometry included.  Immutable once
/// built; both binaries construct it from their CLI args.
#[derive(Clone, Debug)]
pub struct ExperimentConfig {
    pub camera_pos: Vec3,
    pub look_at: Vec3,
    pub eye_separation: f32,
    pub reference_distance: f32,
    pub distances: Vec<f32>,
    pub disparities: Vec<f32>,
    pub repetitions: usize,
    pub presentation_time: f32,
    pub geometry: GeometryVariant,
    pub floor: FloorVariant,
    pub disparity_model: DisparityModel,
    pub response_keys: ResponseKeySet,
    pub floor_brightness: f32,
    pub floor_extent: f32,
    pub fov_degrees: f32,
    /// Seed for column jitter and trial shuffling; always explicit so a
    /// run can be reproduced from its log line.
    pub seed: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            camera_pos: vec3(0.0, 3.0, 0.0),
            look_at: vec3(0.0, 0.0, -15.0),
            eye_separation: 0.1,
            reference_distance: 15.0,
            distances: vec![3.0, 25.0],
            disparities: vec![0.3],
            repetitions: 2,
            presentation_time: 3.0,
            geometry: GeometryVariant::Uniform,
            floor: FloorVariant::Checkerboard,
            disparity_model: DisparityModel::PerVertex,
            response_keys: ResponseKeySet::PlaneJudgement,
            floor_brightness: 0.9,
            floor_extent: 60.0,
            fov_degrees: 45.0,
            seed: 42,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_plane_judgement_keys_answer_onplane_trials() {
        assert!(ResponseKeySet::PlaneJudgement.supports_onplane());
        assert!(!ResponseKeySet::Arrows.supports_onplane());
    }

    #[test]
    fn depth_cue_variant_selects_the_gradient_policy() {
        let p = GeometryVariant::DepthCue.column_params();
        assert!(matches!(
            p.brightness,
            BrightnessPolicy::DepthGradient { .. }
        ));
        assert!(GeometryVariant::Uniform.column_params().split_rows.is_none());
        assert!(GeometryVariant::SplitRows.column_params().split_rows.is_some());
    }
}
