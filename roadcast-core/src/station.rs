use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};

/// Material of one road layer.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum LayerType {
    Asphalt,
    CrushedRock,
    Cement,
    Sand,
}

/// Accepted layer names, English and French.
pub const VALID_LAYER_TYPES: [&str; 8] = [
    "ASPHALT",
    "ASPHALTE",
    "CRUSHED ROCK",
    "GRAVIER",
    "CEMENT",
    "BETON",
    "SAND",
    "SABLE",
];

impl LayerType {
    /// Case-insensitive lookup of a layer name.
    pub fn from_name(name: &str) -> Result<LayerType> {
        match name.trim().to_uppercase().as_str() {
            "ASPHALT" | "ASPHALTE" => Ok(LayerType::Asphalt),
            "CRUSHED ROCK" | "GRAVIER" => Ok(LayerType::CrushedRock),
            "CEMENT" | "BETON" => Ok(LayerType::Cement),
            "SAND" | "SABLE" => Ok(LayerType::Sand),
            _ => Err(DataError::InvalidLayerType {
                found: name.to_uppercase(),
                valid: VALID_LAYER_TYPES.to_vec(),
            }),
        }
    }

    /// Code understood by the physics engine.
    pub fn code(&self) -> i32 {
        match self {
            LayerType::Asphalt => 1,
            LayerType::CrushedRock => 2,
            LayerType::Cement => 3,
            LayerType::Sand => 4,
        }
    }
}

/// Road or bridge. A bridge has air underneath instead of soil.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum StationType {
    Road,
    Bridge,
}

impl StationType {
    /// Returns `None` for an unknown name.
    pub fn from_name(name: &str) -> Option<StationType> {
        match name.trim().to_lowercase().as_str() {
            "road" | "route" => Some(StationType::Road),
            "bridge" | "pont" => Some(StationType::Bridge),
            _ => None,
        }
    }

    pub fn is_bridge(&self) -> bool {
        *self == StationType::Bridge
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// One layer of the road structure, from the surface down.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RoadLayer {
    pub position: i32,
    #[serde(rename = "type")]
    pub layer_type: String,
    /// Thickness in meters
    pub thickness: f64,
}

/// One point of the visible horizon, degrees.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct HorizonPoint {
    /// Clockwise from north
    pub azimuth: f64,
    /// Above the horizontal plane
    pub elevation: f64,
}

/// Road weather information station configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Station {
    pub version: Option<String>,
    pub road_station: String,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub production_date: Option<String>,
    pub coordinate: Coordinate,
    pub station_type: String,
    /// Depth of the sub-surface sensor in meters
    #[serde(default)]
    pub sst_depth: Option<f64>,
    pub roadlayers: Vec<RoadLayer>,
    /// Visible horizon around the station, used for the sun shadow
    #[serde(default)]
    pub horizon: Option<Vec<HorizonPoint>>,
    /// Forecast point identifier copied to the roadcast header
    #[serde(default)]
    pub scribe_point: Option<String>,
}

impl Station {
    pub fn from_json(text: &str) -> serde_json::Result<Station> {
        serde_json::from_str(text)
    }

    pub fn latitude(&self) -> f64 {
        self.coordinate.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.coordinate.longitude
    }

    /// Road layers sorted by position.
    pub fn sorted_layers(&self) -> Vec<&RoadLayer> {
        let mut layers: Vec<&RoadLayer> = self.roadlayers.iter().collect();
        layers.sort_by_key(|l| l.position);
        layers
    }

    /// Layer codes ordered by position.
    pub fn layer_codes(&self) -> Result<Vec<i32>> {
        self.sorted_layers()
            .into_iter()
            .map(|l| LayerType::from_name(&l.layer_type).map(|t| t.code()))
            .collect()
    }

    /// Layer thicknesses ordered by position.
    pub fn layer_thicknesses(&self) -> Vec<f64> {
        self.sorted_layers().into_iter().map(|l| l.thickness).collect()
    }
}
