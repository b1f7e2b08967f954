use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::labels::{DEFAULT_CELL_SIZE_DEG, DEFAULT_MAX_NUDGES, LabelStyle};
use crate::viewport::Breakpoint;

/// Full engine configuration.
///
/// Sections are flattened, so a config file is a single flat JSON object:
///
/// ```json
/// { "intervalMs": 5000, "resumeDelayMs": 60000, "flightTimeMs": 2000,
///   "dashLength": 0.6, "dashGap": 2, "labelCellSizeDeg": 5 }
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TourConfig {
    #[serde(flatten)]
    pub autoplay: AutoplayConfig,
    #[serde(flatten)]
    pub choreography: ChoreographyConfig,
    #[serde(flatten)]
    pub labels: LabelConfig,
    #[serde(flatten)]
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoplayConfig {
    #[serde(rename = "autoplay")]
    pub enabled: bool,
    pub interval_ms: u64,
    pub pause_on_interaction: bool,
    pub resume_delay_ms: Option<u64>,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 5000,
            pause_on_interaction: true,
            resume_delay_ms: Some(60_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChoreographyConfig {
    pub flight_time_ms: f64,
    /// Fraction of the arc covered by the moving dash.
    pub dash_length: f64,
    /// Fraction of the arc covered by the gap after the dash.
    pub dash_gap: f64,
    /// Fraction of the flight after which the dash reaches a location.
    pub relative_length: f64,
    pub num_rings: u32,
    pub ring_max_radius_deg: f64,
    pub ring_rgb: [u8; 3],
    pub arc_color: String,
    pub arc_altitude_scale: f64,
}

impl Default for ChoreographyConfig {
    fn default() -> Self {
        Self {
            flight_time_ms: 2000.0,
            dash_length: 0.6,
            dash_gap: 2.0,
            relative_length: 0.4,
            num_rings: 3,
            ring_max_radius_deg: 5.0,
            ring_rgb: [255, 100, 50],
            arc_color: "rgba(255,100,50,0.9)".to_string(),
            arc_altitude_scale: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelConfig {
    #[serde(rename = "labelCellSizeDeg")]
    pub cell_size_deg: f64,
    #[serde(rename = "maxLabelNudges")]
    pub max_nudges: u32,
    pub label_size: f64,
    pub label_dot_radius: f64,
    pub mobile_label_size: f64,
    pub mobile_label_dot_radius: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            cell_size_deg: DEFAULT_CELL_SIZE_DEG,
            max_nudges: DEFAULT_MAX_NUDGES,
            label_size: 1.0,
            label_dot_radius: 0.4,
            mobile_label_size: 1.6,
            mobile_label_dot_radius: 0.6,
        }
    }
}

impl LabelConfig {
    pub fn style(&self, breakpoint: Breakpoint) -> LabelStyle {
        match breakpoint {
            Breakpoint::Desktop => LabelStyle {
                size: self.label_size,
                dot_radius: self.label_dot_radius,
            },
            Breakpoint::Mobile => LabelStyle {
                size: self.mobile_label_size,
                dot_radius: self.mobile_label_dot_radius,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraConfig {
    pub camera_altitude: f64,
    pub mobile_camera_altitude: f64,
    pub camera_transition_ms: f64,
    /// Viewport width below which the mobile breakpoint applies.
    pub breakpoint_px: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            camera_altitude: 1.8,
            mobile_camera_altitude: 2.6,
            camera_transition_ms: 1000.0,
            breakpoint_px: 768.0,
        }
    }
}

impl CameraConfig {
    pub fn altitude(&self, breakpoint: Breakpoint) -> f64 {
        match breakpoint {
            Breakpoint::Desktop => self.camera_altitude,
            Breakpoint::Mobile => self.mobile_camera_altitude,
        }
    }
}

impl TourConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: TourConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&payload)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.autoplay.interval_ms == 0 {
            return invalid("intervalMs must be > 0");
        }

        let c = &self.choreography;
        if !(c.flight_time_ms.is_finite() && c.flight_time_ms > 0.0) {
            return invalid("flightTimeMs must be a positive number");
        }
        if !(c.dash_length.is_finite() && c.dash_length >= 0.0)
            || !(c.dash_gap.is_finite() && c.dash_gap >= 0.0)
        {
            return invalid("dashLength and dashGap must be non-negative numbers");
        }
        if c.dash_length + c.dash_gap <= 0.0 {
            return invalid("dashLength + dashGap must be > 0");
        }
        if !(c.relative_length > 0.0 && c.relative_length <= 1.0) {
            return invalid("relativeLength must be in (0, 1]");
        }
        if c.num_rings == 0 {
            return invalid("numRings must be > 0");
        }

        if !(self.labels.cell_size_deg.is_finite() && self.labels.cell_size_deg > 0.0) {
            return invalid("labelCellSizeDeg must be a positive number");
        }
        if !(self.camera.camera_transition_ms.is_finite() && self.camera.camera_transition_ms >= 0.0)
        {
            return invalid("cameraTransitionMs must be a non-negative number");
        }
        Ok(())
    }
}
