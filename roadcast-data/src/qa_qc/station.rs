//! Station checks and the profile handed to the engine.

use crate::error::{ProcessError, Result};
use crate::sunshadow::Horizon;
use roadcast_core::config::RunConfig;
use roadcast_core::constants::{
    DEFAULT_SST_DEPTH, ROAD_TEMPERATURE_MAX, ROAD_TEMPERATURE_MIN, SST_DEPTH_MAX, SST_DEPTH_MIN,
};
use roadcast_core::station::{Station, StationType};

/// Station facts after validation, in the form the engine consumes.
#[derive(Debug, PartialEq, Clone)]
pub struct StationProfile {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub station_type: StationType,
    /// Depth of the sub-surface sensor in meters
    pub sst_depth: f64,
    pub deep_soil_temperature: Option<f64>,
    pub layer_types: Vec<i32>,
    /// Meters, surface first
    pub layer_thicknesses: Vec<f64>,
    /// Present when the solar flux is shaded by the visible horizon
    pub horizon: Option<Horizon>,
    pub scribe_point: Option<String>,
}

pub fn check_station(station: &Station, config: &RunConfig) -> Result<StationProfile> {
    let station_type = StationType::from_name(&station.station_type).unwrap_or_else(|| {
        log::error!(
            "Invalid station type '{}', valid types are 'road' and 'bridge'. Using 'road'",
            station.station_type
        );
        StationType::Road
    });

    let sst_depth = if config.use_sst_sensor_depth {
        let depth = station.sst_depth.ok_or_else(|| {
            ProcessError::Station("the sensor depth option is used but SST_DEPTH is missing".to_string())
        })?;
        if !(SST_DEPTH_MIN..=SST_DEPTH_MAX).contains(&depth) {
            return Err(ProcessError::Station(format!(
                "sub-surface sensor depth {} m is outside [{}, {}]",
                depth, SST_DEPTH_MIN, SST_DEPTH_MAX
            )));
        }
        depth
    } else {
        DEFAULT_SST_DEPTH
    };

    let deep_soil_temperature = match config.deep_soil_temperature {
        Some(_) if station_type.is_bridge() => {
            log::warn!(
                "A deep soil temperature is given while the station is a bridge, it will not be used"
            );
            None
        }
        Some(t) if !(ROAD_TEMPERATURE_MIN..=ROAD_TEMPERATURE_MAX).contains(&t) => {
            return Err(ProcessError::Station(format!(
                "deep soil temperature must be between [{},{}], '{}' is not in those boundaries",
                ROAD_TEMPERATURE_MIN, ROAD_TEMPERATURE_MAX, t
            )));
        }
        other => other,
    };

    if station.roadlayers.is_empty() {
        return Err(ProcessError::Station(format!(
            "station '{}' has no road layer",
            station.road_station
        )));
    }

    let horizon = if config.use_sunshadow {
        match station.horizon.as_deref() {
            Some(points) if !points.is_empty() => Some(Horizon::new(points)?),
            _ => {
                return Err(ProcessError::Station(format!(
                    "the sun shadow option is used but station '{}' has no visible horizon",
                    station.road_station
                )))
            }
        }
    } else {
        None
    };

    Ok(StationProfile {
        name: station.road_station.clone(),
        latitude: station.latitude(),
        longitude: station.longitude(),
        station_type,
        sst_depth,
        deep_soil_temperature,
        layer_types: station.layer_codes()?,
        layer_thicknesses: station.layer_thicknesses(),
        horizon,
        scribe_point: station.scribe_point.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadcast_core::station::{Coordinate, HorizonPoint, RoadLayer};

    fn station(kind: &str) -> Station {
        Station {
            version: Some("1.0".to_string()),
            road_station: "oregon".to_string(),
            time_zone: None,
            production_date: None,
            coordinate: Coordinate {
                latitude: 45.0,
                longitude: -73.0,
            },
            station_type: kind.to_string(),
            sst_depth: Some(0.3),
            roadlayers: vec![RoadLayer {
                position: 1,
                layer_type: "asphalt".to_string(),
                thickness: 0.1,
            }],
            horizon: None,
            scribe_point: None,
        }
    }

    #[test]
    fn test_defaults() {
        let profile = check_station(&station("road"), &RunConfig::default()).unwrap();
        assert_eq!(profile.station_type, StationType::Road);
        assert_eq!(profile.sst_depth, DEFAULT_SST_DEPTH);
        assert_eq!(profile.layer_types, vec![1]);
    }

    #[test]
    fn test_unknown_type_defaults_to_road() {
        let profile = check_station(&station("tunnel"), &RunConfig::default()).unwrap();
        assert_eq!(profile.station_type, StationType::Road);
    }

    #[test]
    fn test_sensor_depth() {
        let config = RunConfig {
            use_sst_sensor_depth: true,
            ..RunConfig::default()
        };
        assert_eq!(check_station(&station("road"), &config).unwrap().sst_depth, 0.3);
        let mut deep = station("road");
        deep.sst_depth = Some(2.0);
        assert!(check_station(&deep, &config).is_err());
    }

    #[test]
    fn test_deep_soil_temperature() {
        let config = RunConfig {
            deep_soil_temperature: Some(5.0),
            ..RunConfig::default()
        };
        let bridge = check_station(&station("pont"), &config).unwrap();
        assert_eq!(bridge.deep_soil_temperature, None);
        let road = check_station(&station("road"), &config).unwrap();
        assert_eq!(road.deep_soil_temperature, Some(5.0));

        let config = RunConfig {
            deep_soil_temperature: Some(90.0),
            ..RunConfig::default()
        };
        assert!(check_station(&station("road"), &config).is_err());
    }

    #[test]
    fn test_visible_horizon() {
        let config = RunConfig {
            use_sunshadow: true,
            ..RunConfig::default()
        };
        let err = check_station(&station("road"), &config).unwrap_err();
        assert!(matches!(err, ProcessError::Station(_)));

        let mut shaded = station("road");
        shaded.horizon = Some(vec![
            HorizonPoint {
                azimuth: 0.0,
                elevation: 4.0,
            },
            HorizonPoint {
                azimuth: 180.0,
                elevation: 8.0,
            },
        ]);
        let horizon = check_station(&shaded, &config).unwrap().horizon.unwrap();
        assert_eq!(horizon.elevation_at(90.0), 6.0);
        assert!(check_station(&shaded, &RunConfig::default())
            .unwrap()
            .horizon
            .is_none());
    }
}
