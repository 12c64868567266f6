//! Typed field descriptions for every table the pipeline reads or writes.
//!
//! A source file is described by a list of [`FieldDescriptor`]s. Each
//! descriptor carries a [`FieldKind`] which knows how to turn cell text into
//! the numeric value stored in a [`TimeSeriesTable`](crate::table::TimeSeriesTable)
//! and back.

use crate::config::RunConfig;
use crate::error::{DataError, Result};
use crate::station::LayerType;
use roadcast_utils::arrays::round_to;
use roadcast_utils::dates::{format_iso8601, parse_iso8601};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field names used across the pipeline
pub mod field {
    pub const FORECAST_TIME: &str = "FORECAST_TIME";
    pub const OBSERVATION_TIME: &str = "OBSERVATION_TIME";
    pub const ROADCAST_TIME: &str = "ROADCAST_TIME";
    /// Derived elapsed time column
    pub const TIME: &str = "Time";
    /// Derived hour of day column
    pub const HOUR: &str = "Hour";
    pub const HH: &str = "HH";
    pub const AT: &str = "AT";
    pub const TD: &str = "TD";
    pub const RA: &str = "RA";
    pub const SN: &str = "SN";
    pub const QP: &str = "QP";
    pub const WS: &str = "WS";
    pub const AP: &str = "AP";
    pub const CC: &str = "CC";
    pub const SF: &str = "SF";
    pub const IR: &str = "IR";
    pub const FA: &str = "FA";
    pub const PI: &str = "PI";
    pub const SC: &str = "SC";
    pub const ST: &str = "ST";
    pub const SST: &str = "SST";
    pub const AH: &str = "AH";
    pub const RC: &str = "RC";
    pub const FV: &str = "FV";
    pub const FC: &str = "FC";
    pub const FG: &str = "FG";
    pub const BB: &str = "BB";
    pub const FP: &str = "FP";
    pub const QP_SN: &str = "QP-SN";
    pub const QP_RA: &str = "QP-RA";
    pub const TL: &str = "TL";
    pub const POSITION: &str = "POSITION";
    pub const TYPE: &str = "TYPE";
    pub const THICKNESS: &str = "THICKNESS";
}

/// Header keys used across the pipeline
pub mod header {
    pub const VERSION: &str = "VERSION";
    pub const STATION_ID: &str = "STATION_ID";
    pub const ROAD_STATION: &str = "ROAD_STATION";
    pub const PRODUCTION_DATE: &str = "PRODUCTION_DATE";
    pub const FILETYPE: &str = "FILETYPE";
    pub const TIME_ZONE: &str = "TIME_ZONE";
    pub const COORDINATE: &str = "COORDINATE";
    pub const STATION_TYPE: &str = "STATION_TYPE";
    pub const SST_DEPTH: &str = "SST_DEPTH";
    pub const LATITUDE: &str = "LATITUDE";
    pub const LONGITUDE: &str = "LONGITUDE";
    pub const FIRST_ROADCAST: &str = "FIRST_ROADCAST";
    pub const VERTICAL_LEVELS: &str = "VERTICAL_LEVELS";
    pub const SCRIBE_POINT: &str = "SCRIBE_POINT";
}

/// Physical type of a field.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Integer,
    Real,
    /// ISO 8601 text, stored as epoch seconds
    Date,
    /// Header only
    Text,
    /// Header only, latitude and longitude
    Coordinate,
    /// Layer name, stored as its numeric code
    RoadlayerType,
    /// Composite of reals, one physical column per element
    RealList,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Integer => "INTEGER",
            FieldKind::Real => "REAL",
            FieldKind::Date => "DATE",
            FieldKind::Text => "STRING",
            FieldKind::Coordinate => "COORDINATE",
            FieldKind::RoadlayerType => "ROADLAYER_TYPE",
            FieldKind::RealList => "LIST_REAL",
        }
    }

    /// Parse one cell into its stored numeric form. Empty cells become NaN.
    pub fn parse_cell(&self, field: &str, text: &str) -> Result<f64> {
        let text = text.trim();
        let parse_error = || DataError::FieldParse {
            field: field.to_string(),
            kind: self.label(),
            value: text.to_string(),
        };
        match self {
            FieldKind::Integer | FieldKind::Real | FieldKind::RealList => {
                if text.is_empty() {
                    return Ok(f64::NAN);
                }
                text.parse::<f64>().map_err(|_| parse_error())
            }
            FieldKind::Date => {
                if text.is_empty() {
                    return Ok(f64::NAN);
                }
                parse_iso8601(text).map_err(|_| parse_error())
            }
            FieldKind::RoadlayerType => Ok(LayerType::from_name(text)?.code() as f64),
            FieldKind::Text | FieldKind::Coordinate => Err(parse_error()),
        }
    }

    /// Render a stored value. NaN renders as an empty cell.
    pub fn format_cell(&self, value: f64, precision: u32) -> String {
        if value.is_nan() {
            return String::new();
        }
        match self {
            FieldKind::Integer | FieldKind::RoadlayerType => format!("{}", value.round() as i64),
            FieldKind::Date => format_iso8601(value).unwrap_or_default(),
            _ => format!("{:.*}", precision as usize, round_to(value, precision)),
        }
    }

    /// Parse header text into a typed header value.
    pub fn parse_header(&self, key: &str, text: &str) -> Result<HeaderValue> {
        let text = text.trim();
        let parse_error = || DataError::FieldParse {
            field: key.to_string(),
            kind: self.label(),
            value: text.to_string(),
        };
        let reals = || -> Result<Vec<f64>> {
            text.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<f64>().map_err(|_| parse_error()))
                .collect()
        };
        match self {
            FieldKind::Text | FieldKind::RoadlayerType => Ok(HeaderValue::Text(text.to_string())),
            FieldKind::Integer => text
                .parse::<i64>()
                .map(HeaderValue::Integer)
                .map_err(|_| parse_error()),
            FieldKind::Real => text
                .parse::<f64>()
                .map(HeaderValue::Real)
                .map_err(|_| parse_error()),
            FieldKind::Date => parse_iso8601(text)
                .map(HeaderValue::Date)
                .map_err(|_| parse_error()),
            FieldKind::Coordinate => match reals()?.as_slice() {
                [latitude, longitude] => Ok(HeaderValue::Coordinate {
                    latitude: *latitude,
                    longitude: *longitude,
                }),
                _ => Err(parse_error()),
            },
            FieldKind::RealList => reals().map(HeaderValue::RealList),
        }
    }
}

/// A typed header entry.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Integer(i64),
    Real(f64),
    Text(String),
    /// Epoch seconds
    Date(f64),
    Coordinate { latitude: f64, longitude: f64 },
    RealList(Vec<f64>),
}

impl HeaderValue {
    /// Render for output files, using `precision` for reals.
    pub fn format(&self, precision: u32) -> String {
        match self {
            HeaderValue::Integer(i) => i.to_string(),
            HeaderValue::Real(r) => format!("{:.*}", precision as usize, round_to(*r, precision)),
            HeaderValue::Text(s) => s.clone(),
            HeaderValue::Date(d) => format_iso8601(*d).unwrap_or_default(),
            HeaderValue::Coordinate {
                latitude,
                longitude,
            } => format!("{},{}", latitude, longitude),
            HeaderValue::RealList(values) => values
                .iter()
                .map(|v| format!("{:.*}", precision as usize, round_to(*v, precision)))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Description of one column (or composite of columns) of a source.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    /// Number of physical columns
    pub width: usize,
    /// Decimal digits kept on output, default precision when absent
    pub precision: Option<u32>,
}

impl FieldDescriptor {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        FieldDescriptor {
            name: name.to_string(),
            kind,
            width: 1,
            precision: None,
        }
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn precision_or(&self, default: u32) -> u32 {
        self.precision.unwrap_or(default)
    }
}

/// Header and data layout of one kind of file.
#[derive(Debug, PartialEq, Clone)]
pub struct SourceSchema {
    pub header: Vec<FieldDescriptor>,
    pub data: Vec<FieldDescriptor>,
}

impl SourceSchema {
    pub fn header_field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.header.iter().find(|d| d.name == key)
    }

    pub fn data_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.data.iter().find(|d| d.name == name)
    }

    pub fn data_names(&self) -> Vec<String> {
        self.data.iter().map(|d| d.name.clone()).collect()
    }

    /// Atmospheric forecast file.
    pub fn forecast(config: &RunConfig) -> Self {
        use FieldKind::*;
        let header = vec![
            FieldDescriptor::new(header::VERSION, Text),
            FieldDescriptor::new(header::STATION_ID, Text),
            FieldDescriptor::new(header::PRODUCTION_DATE, Date),
            FieldDescriptor::new(header::FILETYPE, Text),
        ];
        let mut data = vec![
            FieldDescriptor::new(field::FORECAST_TIME, Date),
            FieldDescriptor::new(field::WS, Real),
            FieldDescriptor::new(field::AP, Real),
            FieldDescriptor::new(field::AT, Real),
            FieldDescriptor::new(field::TD, Real),
            FieldDescriptor::new(field::CC, Integer),
            FieldDescriptor::new(field::SN, Real),
            FieldDescriptor::new(field::RA, Real),
        ];
        if config.use_solar_flux_forecast {
            data.push(FieldDescriptor::new(field::SF, Real));
        }
        if config.use_infrared_forecast {
            data.push(FieldDescriptor::new(field::IR, Real));
        }
        if config.use_anthropogenic_flux {
            data.push(FieldDescriptor::new(field::FA, Real));
        }
        SourceSchema { header, data }
    }

    /// Road station observation file.
    pub fn observation() -> Self {
        use FieldKind::*;
        SourceSchema {
            header: vec![
                FieldDescriptor::new(header::VERSION, Text),
                FieldDescriptor::new(header::ROAD_STATION, Text),
                FieldDescriptor::new(header::FILETYPE, Text),
            ],
            data: vec![
                FieldDescriptor::new(field::OBSERVATION_TIME, Date),
                FieldDescriptor::new(field::AT, Real),
                FieldDescriptor::new(field::TD, Real),
                FieldDescriptor::new(field::PI, Integer),
                FieldDescriptor::new(field::WS, Real),
                FieldDescriptor::new(field::SC, Integer),
                FieldDescriptor::new(field::ST, Real),
                FieldDescriptor::new(field::SST, Real),
            ],
        }
    }

    /// Station configuration: header plus one row per road layer.
    pub fn station(config: &RunConfig) -> Self {
        use FieldKind::*;
        let mut header = vec![
            FieldDescriptor::new(header::VERSION, Text),
            FieldDescriptor::new(header::ROAD_STATION, Text),
            FieldDescriptor::new(header::TIME_ZONE, Text),
            FieldDescriptor::new(header::PRODUCTION_DATE, Date),
            FieldDescriptor::new(header::COORDINATE, Coordinate),
            FieldDescriptor::new(header::STATION_TYPE, Text),
        ];
        if config.use_sst_sensor_depth {
            header.push(FieldDescriptor::new(header::SST_DEPTH, Real));
        }
        SourceSchema {
            header,
            data: vec![
                FieldDescriptor::new(field::POSITION, Integer),
                FieldDescriptor::new(field::TYPE, RoadlayerType),
                FieldDescriptor::new(field::THICKNESS, Real),
            ],
        }
    }

    /// Roadcast output. `levels` is the number of depth levels of the
    /// temperature profile, zero when the profile is not written.
    pub fn roadcast(levels: usize) -> Self {
        use FieldKind::*;
        let mut header = vec![
            FieldDescriptor::new(header::VERSION, Text),
            FieldDescriptor::new(header::PRODUCTION_DATE, Date),
            FieldDescriptor::new(header::ROAD_STATION, Text),
            FieldDescriptor::new(header::LATITUDE, Real),
            FieldDescriptor::new(header::LONGITUDE, Real),
            FieldDescriptor::new(header::FILETYPE, Text),
            FieldDescriptor::new(header::FIRST_ROADCAST, Text),
            FieldDescriptor::new(header::SCRIBE_POINT, Text),
        ];
        let mut data = vec![
            FieldDescriptor::new(field::ROADCAST_TIME, Date),
            FieldDescriptor::new(field::HH, Real).with_precision(2),
            FieldDescriptor::new(field::AT, Real).with_precision(2),
            FieldDescriptor::new(field::TD, Real).with_precision(2),
            FieldDescriptor::new(field::WS, Real).with_precision(2),
            FieldDescriptor::new(field::SN, Real).with_precision(2),
            FieldDescriptor::new(field::RA, Real).with_precision(2),
            FieldDescriptor::new(field::QP_SN, Real),
            FieldDescriptor::new(field::QP_RA, Real),
            FieldDescriptor::new(field::CC, Integer),
            FieldDescriptor::new(field::SF, Real),
            FieldDescriptor::new(field::IR, Real),
            FieldDescriptor::new(field::FV, Real),
            FieldDescriptor::new(field::FC, Real),
            FieldDescriptor::new(field::FA, Real),
            FieldDescriptor::new(field::FG, Real),
            FieldDescriptor::new(field::BB, Real),
            FieldDescriptor::new(field::FP, Real),
            FieldDescriptor::new(field::RC, Integer),
            FieldDescriptor::new(field::ST, Real).with_precision(2),
            FieldDescriptor::new(field::SST, Real).with_precision(2),
        ];
        if levels > 0 {
            header.push(FieldDescriptor::new(header::VERTICAL_LEVELS, RealList).with_precision(3));
            data.push(
                FieldDescriptor::new(field::TL, RealList)
                    .with_width(levels)
                    .with_precision(2),
            );
        }
        SourceSchema { header, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cells() {
        assert_eq!(FieldKind::Real.parse_cell("AT", " 3.5 ").unwrap(), 3.5);
        assert!(FieldKind::Real.parse_cell("AT", "").unwrap().is_nan());
        assert_eq!(FieldKind::Integer.parse_cell("CC", "8").unwrap(), 8.0);
        assert_eq!(FieldKind::RoadlayerType.parse_cell("TYPE", "asphalt").unwrap(), 1.0);
        assert!(FieldKind::Real.parse_cell("AT", "warm").is_err());
        assert!(FieldKind::Text.parse_cell("VERSION", "1.1").is_err());
    }

    #[test]
    fn test_date_cell_round_trip() {
        let t = FieldKind::Date.parse_cell("FORECAST_TIME", "2004-01-30T00:00Z").unwrap();
        assert_eq!(FieldKind::Date.format_cell(t, 2), "2004-01-30T00:00Z");
    }

    #[test]
    fn test_format_cells() {
        assert_eq!(FieldKind::Real.format_cell(3.14159, 2), "3.14");
        assert_eq!(FieldKind::Integer.format_cell(2.6, 2), "3");
        assert_eq!(FieldKind::Real.format_cell(f64::NAN, 2), "");
    }

    #[test]
    fn test_parse_header_values() {
        let coord = FieldKind::Coordinate.parse_header("COORDINATE", "45.5, -73.6").unwrap();
        assert_eq!(
            coord,
            HeaderValue::Coordinate {
                latitude: 45.5,
                longitude: -73.6
            }
        );
        assert!(FieldKind::Coordinate.parse_header("COORDINATE", "45.5").is_err());
        let levels = FieldKind::RealList.parse_header("VERTICAL_LEVELS", "0.01 0.05 0.1").unwrap();
        assert_eq!(levels, HeaderValue::RealList(vec![0.01, 0.05, 0.1]));
    }

    #[test]
    fn test_forecast_schema_optional_fluxes() {
        let plain = SourceSchema::forecast(&RunConfig::default());
        assert!(plain.data_field(field::SF).is_none());
        let config = RunConfig {
            use_solar_flux_forecast: true,
            use_anthropogenic_flux: true,
            ..RunConfig::default()
        };
        let with_flux = SourceSchema::forecast(&config);
        assert!(with_flux.data_field(field::SF).is_some());
        assert!(with_flux.data_field(field::FA).is_some());
        assert!(with_flux.data_field(field::IR).is_none());
    }

    #[test]
    fn test_roadcast_schema_levels() {
        assert!(SourceSchema::roadcast(0).data_field(field::TL).is_none());
        let schema = SourceSchema::roadcast(5);
        assert_eq!(schema.data_field(field::TL).unwrap().width, 5);
        assert!(schema.header_field(header::VERTICAL_LEVELS).is_some());
    }
}
