//! Run configuration.
//!
//! Built once from defaults, an optional JSON file and command line flags,
//! then handed by reference to every stage of the pipeline.

use serde::{Deserialize, Serialize};

/// Accepted forecast file versions.
pub const FORECAST_MIN_VERSION: &str = "1.1";
pub const FORECAST_MAX_VERSION: &str = "1.1";

/// Accepted observation file versions.
pub const OBSERVATION_MIN_VERSION: &str = "1.0";
pub const OBSERVATION_MAX_VERSION: &str = "1.0";

/// Accepted station file versions.
pub const STATION_MIN_VERSION: &str = "1.0";
pub const STATION_MAX_VERSION: &str = "1.0";

/// Version written in roadcast files.
pub const ROADCAST_VERSION: &str = "1.6";

/// Default number of decimal digits for real output fields.
pub const DEFAULT_PRECISION: u32 = 2;

/// Correction of the solar flux while the sun is behind the visible horizon.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SunShadowMethod {
    /// No direct or diffuse radiation
    #[default]
    Basic,
    /// Only the diffuse part of the global radiation remains
    Enhanced,
}

impl SunShadowMethod {
    /// Numeric method code, 1 or 2.
    pub fn from_code(code: u32) -> Option<SunShadowMethod> {
        match code {
            1 => Some(SunShadowMethod::Basic),
            2 => Some(SunShadowMethod::Enhanced),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// ISO 8601 date of the first roadcast, derived from the last observation when absent
    pub roadcast_start_date: Option<String>,
    /// Take SF from the forecast instead of computing it
    pub use_solar_flux_forecast: bool,
    /// Take IR from the forecast instead of computing it
    pub use_infrared_forecast: bool,
    /// Take FA from the forecast instead of the default value
    pub use_anthropogenic_flux: bool,
    /// Use the station's SST sensor depth
    pub use_sst_sensor_depth: bool,
    /// Shade the solar flux with the station's visible horizon
    pub use_sunshadow: bool,
    pub sunshadow_method: SunShadowMethod,
    /// Temperature of the bottom road layer, °C
    pub deep_soil_temperature: Option<f64>,
    /// Write the temperature profile of every depth level
    pub output_levels: bool,
    /// Skip the physics engine
    pub bypass_core: bool,
    /// Decimal digits for real output fields without their own precision
    pub default_precision: u32,
    /// External physics engine executable
    pub engine_command: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            roadcast_start_date: None,
            use_solar_flux_forecast: false,
            use_infrared_forecast: false,
            use_anthropogenic_flux: false,
            use_sst_sensor_depth: false,
            use_sunshadow: false,
            sunshadow_method: SunShadowMethod::Basic,
            deep_soil_temperature: None,
            output_levels: false,
            bypass_core: false,
            default_precision: DEFAULT_PRECISION,
            engine_command: None,
        }
    }
}

impl RunConfig {
    /// Parse a JSON configuration document. Missing keys keep their defaults.
    pub fn from_json(text: &str) -> serde_json::Result<RunConfig> {
        serde_json::from_str(text)
    }

    /// Both fluxes come from the forecast, cloud cover is then unused.
    pub fn fluxes_from_forecast(&self) -> bool {
        self.use_solar_flux_forecast && self.use_infrared_forecast
    }
}
