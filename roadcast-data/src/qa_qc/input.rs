//! Checks that involve more than one input.

use super::delete_observation_rows;
use crate::error::{DateContext, ProcessError, Result};
use roadcast_core::config::{
    RunConfig, FORECAST_MAX_VERSION, FORECAST_MIN_VERSION, OBSERVATION_MAX_VERSION,
    OBSERVATION_MIN_VERSION, STATION_MAX_VERSION, STATION_MIN_VERSION,
};
use roadcast_core::constants::{ENGINE_CAPACITY, TIME_STEP};
use roadcast_core::schema::{field, header};
use roadcast_core::station::Station;
use roadcast_core::table::TimeSeriesTable;
use roadcast_utils::dates;
use roadcast_utils::version::validate_version;

/// File versions of the three inputs.
pub fn check_versions(
    forecast: &TimeSeriesTable,
    observation: &TimeSeriesTable,
    station: &Station,
) -> Result<()> {
    validate_version(
        forecast.header_text(header::VERSION).as_deref(),
        FORECAST_MIN_VERSION,
        FORECAST_MAX_VERSION,
    )?;
    validate_version(
        observation.header_text(header::VERSION).as_deref(),
        OBSERVATION_MIN_VERSION,
        OBSERVATION_MAX_VERSION,
    )?;
    validate_version(
        station.version.as_deref(),
        STATION_MIN_VERSION,
        STATION_MAX_VERSION,
    )?;
    Ok(())
}

/// Validate the forecast and observation against each other.
///
/// Observations spanning more than the engine can hold are cut from the
/// front.
pub fn validate_input(
    forecast: &TimeSeriesTable,
    observation: &mut TimeSeriesTable,
    config: &RunConfig,
) -> Result<()> {
    truncate_observation(observation)?;
    check_forecast_length(forecast)?;
    check_optional_columns(forecast, config)?;

    let observation_time = observation.column(field::OBSERVATION_TIME)?;
    let Some(&last_observation) = observation_time.last() else {
        return Err(ProcessError::NoObservation);
    };
    log::info!(
        "Last observation date is: '{}'",
        dates::format_iso8601(last_observation).date()?
    );

    let forecast_start = forecast.value(field::FORECAST_TIME, 0)?;
    if forecast_start > last_observation {
        return Err(ProcessError::Input(format!(
            "Forecast and observation don't overlap. The date of the first forecast must be before the last date of observation. First Forecast='{}' Last Observation='{}'",
            dates::format_iso8601(forecast_start).date()?,
            dates::format_iso8601(last_observation).date()?
        )));
    }
    Ok(())
}

fn truncate_observation(observation: &mut TimeSeriesTable) -> Result<()> {
    let observation_time = observation.column(field::OBSERVATION_TIME)?;
    let (first, last) = match (observation_time.first(), observation_time.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(ProcessError::NoObservation),
    };
    let steps = (last - first) / TIME_STEP;
    let capacity = ENGINE_CAPACITY as f64;
    if steps <= capacity {
        return Ok(());
    }
    let removed_seconds = (steps - capacity) * TIME_STEP;
    let new_start = first + removed_seconds;
    let rows: Vec<usize> = observation_time
        .iter()
        .enumerate()
        .filter(|&(_, &t)| t < new_start)
        .map(|(i, _)| i)
        .collect();
    log::warn!(
        "Too many observations. Removing {} seconds, i.e. {} hour(s). Old start time is {}, new start time is {}",
        removed_seconds,
        removed_seconds / 3600.0,
        dates::format_iso8601(first).date()?,
        dates::format_iso8601(new_start).date()?
    );
    delete_observation_rows(observation, &rows)
}

fn check_forecast_length(forecast: &TimeSeriesTable) -> Result<()> {
    let forecast_time = forecast.column(field::FORECAST_TIME)?;
    if forecast_time.len() < 2 {
        return Err(ProcessError::Input(
            "more than one forecast date is needed".to_string(),
        ));
    }
    let start = forecast_time[0];
    for (i, &t) in forecast_time.iter().enumerate() {
        if dates::elapsed_hours(t, start).date()? != i as f64 {
            return Err(ProcessError::Input(format!(
                "Atmospheric forecast must be at every hour. Check file from {} hours after the start time",
                i
            )));
        }
    }
    Ok(())
}

fn check_optional_columns(forecast: &TimeSeriesTable, config: &RunConfig) -> Result<()> {
    let requested = [
        (config.use_solar_flux_forecast, field::SF, "--use-solarflux-forecast"),
        (config.use_infrared_forecast, field::IR, "--use-infrared-forecast"),
        (config.use_anthropogenic_flux, field::FA, "--use-anthropogenic-flux"),
    ];
    for (enabled, name, option) in requested {
        if enabled && !forecast.has_column(name) {
            return Err(ProcessError::Input(format!(
                "The option '{}' was used but the forecast has no <{}> values",
                option,
                name.to_lowercase()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadcast_core::schema::HeaderValue;

    fn series(name: &str, start: &str, step: f64, count: usize) -> TimeSeriesTable {
        let mut table = TimeSeriesTable::with_columns(&[name]);
        let start = dates::parse_iso8601(start).unwrap();
        for i in 0..count {
            table.append_row(&[Some(start + step * i as f64)]).unwrap();
        }
        table
    }

    #[test]
    fn test_overlapping_inputs_pass() {
        let forecast = series(field::FORECAST_TIME, "2004-01-30T00:00Z", 3600.0, 24);
        let mut observation = series(field::OBSERVATION_TIME, "2004-01-29T20:00Z", 600.0, 30);
        validate_input(&forecast, &mut observation, &RunConfig::default()).unwrap();
        assert_eq!(observation.row_count(), 30);
    }

    #[test]
    fn test_no_overlap_is_fatal() {
        let forecast = series(field::FORECAST_TIME, "2004-01-30T00:00Z", 3600.0, 24);
        let mut observation = series(field::OBSERVATION_TIME, "2004-01-29T12:00Z", 600.0, 6);
        let err = validate_input(&forecast, &mut observation, &RunConfig::default()).unwrap_err();
        assert!(err.to_string().contains("don't overlap"));
    }

    #[test]
    fn test_forecast_must_be_hourly() {
        let mut observation = series(field::OBSERVATION_TIME, "2004-01-30T00:00Z", 600.0, 6);
        let forecast = series(field::FORECAST_TIME, "2004-01-30T00:00Z", 1800.0, 4);
        assert!(validate_input(&forecast, &mut observation, &RunConfig::default()).is_err());
        let forecast = series(field::FORECAST_TIME, "2004-01-30T00:00Z", 3600.0, 1);
        assert!(validate_input(&forecast, &mut observation, &RunConfig::default()).is_err());
    }

    #[test]
    fn test_long_observation_truncated() {
        let forecast = series(field::FORECAST_TIME, "2004-01-30T00:00Z", 3600.0, 24);
        // 100 hours every hour, the engine holds 96
        let mut observation = series(field::OBSERVATION_TIME, "2004-01-26T00:00Z", 3600.0, 101);
        validate_input(&forecast, &mut observation, &RunConfig::default()).unwrap();
        assert_eq!(observation.row_count(), 97);
        let first = observation.value(field::OBSERVATION_TIME, 0).unwrap();
        assert_eq!(dates::format_iso8601(first).unwrap(), "2004-01-26T04:00Z");
    }

    #[test]
    fn test_requested_column_missing() {
        let forecast = series(field::FORECAST_TIME, "2004-01-30T00:00Z", 3600.0, 24);
        let mut observation = series(field::OBSERVATION_TIME, "2004-01-30T00:00Z", 600.0, 6);
        let config = RunConfig {
            use_solar_flux_forecast: true,
            ..RunConfig::default()
        };
        let err = validate_input(&forecast, &mut observation, &config).unwrap_err();
        assert!(err.to_string().contains("<sf>"));
    }

    #[test]
    fn test_versions() {
        let mut forecast = series(field::FORECAST_TIME, "2004-01-30T00:00Z", 3600.0, 2);
        let mut observation = series(field::OBSERVATION_TIME, "2004-01-30T00:00Z", 600.0, 2);
        let station = roadcast_core::station::Station::from_json(
            r#"{"version": "1.0", "road_station": "x", "station_type": "road",
                "coordinate": {"latitude": 45.0, "longitude": -73.0}, "roadlayers": []}"#,
        )
        .unwrap();
        forecast
            .set_header_value(header::VERSION, HeaderValue::Text("1.1".to_string()))
            .unwrap();
        observation
            .set_header_value(header::VERSION, HeaderValue::Text("1.0".to_string()))
            .unwrap();
        check_versions(&forecast, &observation, &station).unwrap();

        forecast
            .set_header_value(header::VERSION, HeaderValue::Text("1.0".to_string()))
            .unwrap();
        let err = check_versions(&forecast, &observation, &station).unwrap_err();
        assert!(matches!(err, ProcessError::Version(_)));
    }
}
