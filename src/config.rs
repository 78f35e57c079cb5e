use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    pub scale: f32,
    pub rotation_offset_x: f32,
    pub rotation_offset_y: f32,
    pub rotation_offset_z: f32,
    pub position_offset_y: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            path: "/assets/models/grey_voxel_car.glb".to_string(),
            scale: 0.5,
            rotation_offset_x: 0.0,
            rotation_offset_y: 0.0,
            rotation_offset_z: 0.0,
            position_offset_y: 0.0,
        }
    }
}

/// Procedural generation and movement parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LevelConfig {
    /// Fixed world seed; `None` picks a fresh one per session.
    pub seed: Option<u64>,
    pub obstacle_frequency: f32,
    pub vehicle_frequency: f32,
    pub log_frequency: f32,
    pub collectible_frequency: f32,
    /// Lanes span `-lane_width..lane_width` and moving entities wrap at `±lane_width`.
    pub lane_width: i32,
    pub lanes_ahead: i32,
    pub lanes_behind: i32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Extra speed per lane index, so lanes further out scroll faster.
    pub speed_step: f32,
    /// How far left/right of the start column the player may hop.
    pub player_bounds: i32,
    pub log_length_min: i32,
    pub log_length_max: i32,
    /// Empty slots kept after a log on top of its own length.
    pub log_gap: i32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            seed: None,
            obstacle_frequency: 0.2,
            vehicle_frequency: 0.2,
            log_frequency: 0.2,
            collectible_frequency: 0.1,
            lane_width: 10,
            lanes_ahead: 20,
            lanes_behind: 10,
            min_speed: 0.7,
            max_speed: 2.0,
            speed_step: 0.01,
            player_bounds: 5,
            log_length_min: 2,
            log_length_max: 3,
            log_gap: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera position relative to the player at session start.
    pub offset: [f32; 3],
    /// 0 = snappy, 1 = sluggish.
    pub smoothing: f32,
    pub ortho_size: f32,
    pub vignette: f32,
    /// Per-frame easing factor of the game-over zoom.
    pub zoom_rate: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            offset: [3.0, 10.0, -6.0],
            smoothing: 0.5,
            ortho_size: 6.0,
            vignette: 0.35,
            zoom_rate: 0.02,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TreeStyle {
    pub height: f32,
    pub color: [f32; 3],
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VehicleStyle {
    pub length: f32,
    pub color: [f32; 3],
}

/// The spawnable props. Trees block movement, vehicles kill on contact.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Catalogue {
    pub trees: Vec<TreeStyle>,
    pub vehicles: Vec<VehicleStyle>,
}

impl Default for Catalogue {
    fn default() -> Self {
        Catalogue {
            trees: vec![
                TreeStyle { height: 1.0, color: [0.18, 0.55, 0.2] },
                TreeStyle { height: 1.6, color: [0.15, 0.45, 0.18] },
                TreeStyle { height: 2.2, color: [0.22, 0.6, 0.25] },
                TreeStyle { height: 0.6, color: [0.5, 0.5, 0.48] },
            ],
            vehicles: vec![
                VehicleStyle { length: 1.2, color: [0.9, 0.2, 0.2] },
                VehicleStyle { length: 1.2, color: [0.2, 0.5, 0.9] },
                VehicleStyle { length: 1.4, color: [0.2, 0.8, 0.3] },
                VehicleStyle { length: 1.4, color: [0.95, 0.8, 0.2] },
                VehicleStyle { length: 2.0, color: [0.9, 0.4, 0.1] },
                VehicleStyle { length: 2.6, color: [0.95, 0.95, 0.95] },
            ],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub car_model: ModelConfig,
    pub level: LevelConfig,
    pub camera: CameraConfig,
    pub catalogue: Catalogue,
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = &self.level;
        for (name, value) in [
            ("obstacle_frequency", level.obstacle_frequency),
            ("vehicle_frequency", level.vehicle_frequency),
            ("log_frequency", level.log_frequency),
            ("collectible_frequency", level.collectible_frequency),
            ("camera.smoothing", self.camera.smoothing),
            ("camera.zoom_rate", self.camera.zoom_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Frequency { name, value });
            }
        }
        if self.catalogue.trees.is_empty() {
            return Err(ConfigError::EmptyCatalogue("tree"));
        }
        if self.catalogue.vehicles.is_empty() {
            return Err(ConfigError::EmptyCatalogue("vehicle"));
        }
        if level.min_speed > level.max_speed || level.min_speed < 0.0 {
            return Err(ConfigError::SpeedRange { min: level.min_speed, max: level.max_speed });
        }
        if level.lane_width <= 0 {
            return Err(ConfigError::LaneWidth(level.lane_width));
        }
        if level.player_bounds < 1 || level.player_bounds > level.lane_width {
            return Err(ConfigError::PlayerBounds {
                bounds: level.player_bounds,
                lane_width: level.lane_width,
            });
        }
        if level.log_length_min < 1 || level.log_length_min > level.log_length_max {
            return Err(ConfigError::LogLength {
                min: level.log_length_min,
                max: level.log_length_max,
            });
        }
        if level.lanes_ahead < 1 || level.lanes_behind < 1 {
            return Err(ConfigError::LaneWindow {
                ahead: level.lanes_ahead,
                behind: level.lanes_behind,
            });
        }
        Ok(())
    }
}
