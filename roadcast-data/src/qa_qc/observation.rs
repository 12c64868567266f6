//! Cleaning of the road station observations.
//!
//! The controlled table loses the rows that cannot be used, gains a
//! `Time` column (seconds of day anchored on the first observation) and
//! the collection receives validity masks, the forecast/observation time
//! shift and the coupling flags.

use super::delete_observation_rows;
use crate::error::{DateContext, ProcessError, Result};
use roadcast_core::attribute::{
    AttributeBag, AttributeValue, NoObservation, AT_VALID, DELTA_T, LAST_OBSERVATION, SST_VALID,
    TD_VALID, WS_VALID,
};
use roadcast_core::collection::SourceCollection;
use roadcast_core::config::RunConfig;
use roadcast_core::constants::{
    AIR_TEMPERATURE_MAX, AIR_TEMPERATURE_MIN, COUPLING_MIN_HOURS, OBSERVATION_EXPIRATION_HOURS,
    OBSERVATION_GAP_MINUTES, ROAD_TEMPERATURE_MAX, ROAD_TEMPERATURE_MIN, SST_MAX, SST_MIN,
    STEPS_PER_HOUR, TIME_STEP, WIND_SPEED_MAX, WIND_SPEED_MIN,
};
use roadcast_core::schema::field;
use roadcast_core::table::TimeSeriesTable;
use roadcast_utils::dates;

/// Run every observation check, in order.
pub fn check_observation(
    observation: &mut SourceCollection,
    forecast: &TimeSeriesTable,
    config: &RunConfig,
) -> Result<()> {
    let forecast_start = forecast
        .column(field::FORECAST_TIME)?
        .first()
        .copied()
        .ok_or_else(|| ProcessError::Input("the forecast has no row".to_string()))?;

    let (controlled, attributes) = observation.controlled_and_attributes();
    remove_missing_values(controlled)?;
    remove_bad_road_temperature(controlled)?;
    set_time(controlled)?;
    check_time_order(controlled)?;
    remove_expired(controlled, forecast_start, config)?;
    clamp_dew_point(controlled)?;
    validate(controlled, attributes)?;

    let observation_time = controlled.column(field::OBSERVATION_TIME)?;
    let (first, last) = match (observation_time.first(), observation_time.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(ProcessError::NoObservation),
    };
    let delta_t = dates::elapsed_hours(forecast_start, first).date()?;
    log::info!(
        "First atmospheric forecast: {}",
        dates::format_iso8601(forecast_start).date()?
    );
    log::info!(
        "First valid observation   : {}",
        dates::format_iso8601(first).date()?
    );
    attributes.set(DELTA_T, AttributeValue::Real(delta_t))?;

    let time = controlled.column(field::TIME)?;
    let steps = (time[time.len() - 1] - time[0]) / TIME_STEP;
    let per_hour = STEPS_PER_HOUR as f64;
    attributes.set_no_observation(NoObservation::coupling(
        delta_t <= 0.0,
        steps - delta_t * per_hour < COUPLING_MIN_HOURS * per_hour,
    ))?;
    attributes.set(LAST_OBSERVATION, AttributeValue::Real(last))?;
    Ok(())
}

fn remove_missing_values(table: &mut TimeSeriesTable) -> Result<()> {
    let bad: Vec<usize> = table
        .matrix()
        .iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|v| v.is_nan()))
        .map(|(i, _)| i)
        .collect();
    if !bad.is_empty() {
        log::warn!("Removing {} observation(s) with a missing value", bad.len());
        log::debug!("Rows with a missing value: {:?}", bad);
    }
    delete_observation_rows(table, &bad)
}

fn remove_bad_road_temperature(table: &mut TimeSeriesTable) -> Result<()> {
    let road = table.column(field::ST)?;
    let bad: Vec<usize> = road
        .iter()
        .enumerate()
        .filter(|&(_, &st)| !(ROAD_TEMPERATURE_MIN..=ROAD_TEMPERATURE_MAX).contains(&st))
        .map(|(i, _)| i)
        .collect();
    for &i in &bad {
        log::warn!("Invalid road temperature, {}th temperature is {:.2}", i, road[i]);
    }
    delete_observation_rows(table, &bad)
}

/// Seconds of day of the first observation plus the elapsed seconds.
fn set_time(table: &mut TimeSeriesTable) -> Result<()> {
    let observation_time = table.column(field::OBSERVATION_TIME)?;
    let Some(&first) = observation_time.first() else {
        return Err(ProcessError::NoObservation);
    };
    let origin = dates::seconds_of_day(first).date()?;
    let time = observation_time
        .iter()
        .map(|t| origin + (t - first))
        .collect();
    table.append_column(field::TIME, time)?;
    Ok(())
}

fn differences(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Cut everything up to the last gap, reject decreasing times and drop
/// the earlier of two identical times.
fn check_time_order(table: &mut TimeSeriesTable) -> Result<()> {
    let gap = OBSERVATION_GAP_MINUTES * 60.0;
    let time = table.column(field::TIME)?;
    if let Some(last_gap) = differences(&time).iter().rposition(|d| *d > gap) {
        log::warn!(
            "More than {} minutes between 2 measures, dropping the first {} observation(s)",
            OBSERVATION_GAP_MINUTES,
            last_gap + 1
        );
        let cutoff = table.value(field::OBSERVATION_TIME, last_gap)?;
        log::debug!("Cutoff time: {}", dates::format_iso8601(cutoff).date()?);
        let rows: Vec<usize> = (0..=last_gap).collect();
        delete_observation_rows(table, &rows)?;
    }

    let diffs = differences(&table.column(field::TIME)?);
    if let Some(bad) = diffs.iter().position(|d| *d < 0.0) {
        return Err(ProcessError::Observation(format!(
            "Time of observation are not in order. Check the {}th value",
            bad + 1
        )));
    }
    let duplicates: Vec<usize> = diffs
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0.0)
        .map(|(i, _)| i)
        .collect();
    if !duplicates.is_empty() {
        log::warn!("Removing {} duplicated observation time(s)", duplicates.len());
    }
    delete_observation_rows(table, &duplicates)
}

/// Drop what is older than the expiration delay before the forecast start
/// and before the requested roadcast start.
fn remove_expired(table: &mut TimeSeriesTable, forecast_start: f64, config: &RunConfig) -> Result<()> {
    let expiration = OBSERVATION_EXPIRATION_HOURS * 3600.0;
    let mut limit = forecast_start - expiration;
    if let Some(start) = &config.roadcast_start_date {
        let start = dates::parse_iso8601(start).date()?;
        limit = limit.max(start - expiration);
    }
    let expired: Vec<usize> = table
        .column(field::OBSERVATION_TIME)?
        .iter()
        .enumerate()
        .filter(|&(_, &t)| t < limit)
        .map(|(i, _)| i)
        .collect();
    if !expired.is_empty() {
        log::warn!(
            "{} observation(s) more than {} hours before the first roadcast",
            expired.len(),
            OBSERVATION_EXPIRATION_HOURS
        );
    }
    delete_observation_rows(table, &expired)
}

fn clamp_dew_point(table: &mut TimeSeriesTable) -> Result<()> {
    let air = table.column(field::AT)?;
    let dew: Vec<f64> = table
        .column(field::TD)?
        .iter()
        .zip(&air)
        .map(|(&td, &at)| td.min(at))
        .collect();
    table.set_column(field::TD, &dew)?;
    Ok(())
}

fn mask(values: &[f64], valid: impl Fn(usize, f64) -> bool) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| if valid(i, v) { 1.0 } else { 0.0 })
        .collect()
}

/// Validity masks; invalid sub-surface temperatures are replaced by the
/// closest preceding valid one.
fn validate(table: &mut TimeSeriesTable, attributes: &mut AttributeBag) -> Result<()> {
    let mut sub_surface = table.column(field::SST)?;
    let in_range = |v: &f64| (SST_MIN..=SST_MAX).contains(v);
    let Some(mut current) = sub_surface.iter().copied().find(in_range) else {
        return Err(ProcessError::Observation(
            "No valid sub-surface temperature (element <sst>) in observation".to_string(),
        ));
    };
    for value in sub_surface.iter_mut() {
        if in_range(&*value) {
            current = *value;
        } else {
            *value = current;
        }
    }
    table.set_column(field::SST, &sub_surface)?;
    attributes.set(SST_VALID, AttributeValue::Mask(vec![1.0; sub_surface.len()]))?;

    let air = table.column(field::AT)?;
    let dew = table.column(field::TD)?;
    let wind = table.column(field::WS)?;
    let air_range = AIR_TEMPERATURE_MIN..=AIR_TEMPERATURE_MAX;
    attributes.set(
        AT_VALID,
        AttributeValue::Mask(mask(&air, |_, at| air_range.contains(&at))),
    )?;
    attributes.set(
        TD_VALID,
        AttributeValue::Mask(mask(&dew, |i, td| air_range.contains(&td) && td <= air[i])),
    )?;
    attributes.set(
        WS_VALID,
        AttributeValue::Mask(mask(&wind, |_, ws| {
            (WIND_SPEED_MIN..=WIND_SPEED_MAX).contains(&ws)
        })),
    )?;
    Ok(())
}
