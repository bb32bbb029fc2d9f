use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::constellation::ProgressionCurve;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub repulsion: f32,
    pub repulsion_softening: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub center_strength: f32,
    pub collision_radius: f32,
    pub collision_strength: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub theta: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            repulsion: 9_000.0,
            repulsion_softening: 400.0,
            link_distance: 90.0,
            link_strength: 0.12,
            center_strength: 0.02,
            collision_radius: 18.0,
            collision_strength: 0.7,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            alpha_decay: 0.0228,
            theta: 0.8,
        }
    }
}

impl PhysicsConfig {
    fn clamped(self) -> Self {
        Self {
            repulsion: self.repulsion.clamp(0.0, 200_000.0),
            repulsion_softening: self.repulsion_softening.clamp(1.0, 10_000.0),
            link_distance: self.link_distance.clamp(10.0, 600.0),
            link_strength: self.link_strength.clamp(0.0, 1.0),
            center_strength: self.center_strength.clamp(0.0, 0.5),
            collision_radius: self.collision_radius.clamp(0.0, 200.0),
            collision_strength: self.collision_strength.clamp(0.0, 1.0),
            velocity_decay: self.velocity_decay.clamp(0.05, 0.95),
            alpha_min: self.alpha_min.clamp(0.000_01, 0.5),
            alpha_decay: self.alpha_decay.clamp(0.001, 0.5),
            theta: self.theta.clamp(0.0, 1.5),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub frame_padding: f32,
    pub frame_min_scale: f32,
    pub frame_max_scale: f32,
    pub frame_transition_secs: f32,
    pub star_label_min_scale: f32,
    pub label_min_scale: f32,
    pub label_base_size: f32,
    pub star_label_floor: f32,
    pub planet_label_floor: f32,
    pub moon_label_floor: f32,
    pub satellite_label_floor: f32,
    pub hover_delay_secs: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 8.0,
            frame_padding: 60.0,
            frame_min_scale: 0.2,
            frame_max_scale: 2.0,
            frame_transition_secs: 0.75,
            star_label_min_scale: 0.3,
            label_min_scale: 0.9,
            label_base_size: 14.0,
            star_label_floor: 9.0,
            planet_label_floor: 7.0,
            moon_label_floor: 6.0,
            satellite_label_floor: 5.0,
            hover_delay_secs: 0.08,
        }
    }
}

impl ViewConfig {
    fn clamped(self) -> Self {
        let min_zoom = self.min_zoom.clamp(0.01, 1.0);
        let max_zoom = self.max_zoom.clamp(1.0, 50.0);
        let frame_min_scale = self.frame_min_scale.clamp(min_zoom, max_zoom);
        Self {
            min_zoom,
            max_zoom,
            frame_padding: self.frame_padding.clamp(0.0, 400.0),
            frame_min_scale,
            frame_max_scale: self.frame_max_scale.clamp(frame_min_scale, max_zoom),
            frame_transition_secs: self.frame_transition_secs.clamp(0.0, 5.0),
            star_label_min_scale: self.star_label_min_scale.max(0.0),
            label_min_scale: self.label_min_scale.max(self.star_label_min_scale.max(0.0)),
            label_base_size: self.label_base_size.clamp(4.0, 64.0),
            star_label_floor: self.star_label_floor.max(1.0),
            planet_label_floor: self.planet_label_floor.max(1.0),
            moon_label_floor: self.moon_label_floor.max(1.0),
            satellite_label_floor: self.satellite_label_floor.max(1.0),
            hover_delay_secs: self.hover_delay_secs.clamp(0.0, 2.0),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub physics: PhysicsConfig,
    pub view: ViewConfig,
    pub progression: ProgressionCurve,
    pub pin_tolerance: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            view: ViewConfig::default(),
            progression: ProgressionCurve::default(),
            pin_tolerance: 0.5,
        }
    }
}

impl EngineConfig {
    pub fn from_toml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let parsed: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(parsed.clamped())
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw, path)
    }

    pub fn clamped(self) -> Self {
        Self {
            physics: self.physics.clamped(),
            view: self.view.clamped(),
            progression: self.progression,
            pin_tolerance: self.pin_tolerance.clamp(0.0, 50.0),
        }
    }
}
