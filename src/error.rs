use thiserror::Error;
use wasm_bindgen::JsValue;

/// Problems found while loading or validating `AppConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    Frequency { name: &'static str, value: f32 },
    #[error("catalogue has no {0} styles")]
    EmptyCatalogue(&'static str),
    #[error("speed range is invalid: min {min} > max {max}")]
    SpeedRange { min: f32, max: f32 },
    #[error("lane_width must be positive, got {0}")]
    LaneWidth(i32),
    #[error("player_bounds {bounds} must be within 1..={lane_width}")]
    PlayerBounds { bounds: i32, lane_width: i32 },
    #[error("log length range {min}..={max} is invalid")]
    LogLength { min: i32, max: i32 },
    #[error("lane window needs at least one lane ahead and behind (ahead {ahead}, behind {behind})")]
    LaneWindow { ahead: i32, behind: i32 },
}

/// Failures while turning downloaded bytes into meshes.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to import glTF: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("mesh primitive has no positions")]
    MissingPositions,
    #[error("mesh has {0} vertices, more than a u16 index buffer can address")]
    TooManyVertices(usize),
}

impl From<ConfigError> for JsValue {
    fn from(err: ConfigError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<AssetError> for JsValue {
    fn from(err: AssetError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
