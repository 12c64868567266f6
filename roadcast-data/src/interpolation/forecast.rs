//! Forecast series onto the engine grid.

use super::{interpolate, interpolate_rounded};
use crate::error::{DateContext, Result};
use roadcast_core::collection::SourceCollection;
use roadcast_core::config::RunConfig;
use roadcast_core::constants::{
    DEFAULT_ANTHROPOGENIC_FLUX, KMH_TO_MS, PRESSURE_MAX, PRESSURE_MIN, PRESSURE_NORMAL,
    SNOW_WATER_RATIO, TIME_STEP,
};
use roadcast_core::schema::field;
use roadcast_core::table::TimeSeriesTable;
use roadcast_utils::arrays::{self, backward_difference, shift_left};
use roadcast_utils::dates;

/// Fill the interpolated forecast table from the controlled one.
///
/// Adds `Hour` and `Time` to the controlled table. Solar and infrared
/// fluxes are left to [`crate::flux`].
pub fn interpolate_forecast(forecast: &mut SourceCollection, config: &RunConfig) -> Result<()> {
    let controlled = forecast.controlled_mut();
    let forecast_time = controlled.column(field::FORECAST_TIME)?;
    let Some(&start) = forecast_time.first() else {
        return Err(crate::error::ProcessError::Input(
            "the forecast has no row".to_string(),
        ));
    };
    let first_hour = dates::hour_of(start).date()? as f64;
    let hours: Vec<f64> = (0..forecast_time.len()).map(|i| first_hour + i as f64).collect();
    let time: Vec<f64> = forecast_time.iter().map(|t| t - start).collect();
    controlled.append_column(field::HOUR, hours)?;
    controlled.append_column(field::TIME, time.clone())?;

    let (controlled, interpolated) = forecast.controlled_and_interpolated();

    interpolated.append_column(field::FORECAST_TIME, interpolate(&time, &forecast_time)?)?;
    let hours_grid = interpolate(&time, &time)?
        .into_iter()
        .map(|t| (t + TIME_STEP) / 3600.0 + first_hour)
        .collect();
    interpolated.append_column(field::TIME, hours_grid)?;

    interpolated.append_column(field::AT, interpolate(&time, &controlled.column(field::AT)?)?)?;
    append_precipitation(&time, controlled, interpolated)?;

    let wind: Vec<f64> = controlled
        .column(field::WS)?
        .iter()
        .map(|ws| ws * KMH_TO_MS)
        .collect();
    interpolated.append_column(field::WS, interpolate(&time, &wind)?)?;
    interpolated.append_column(field::TD, interpolate(&time, &controlled.column(field::TD)?)?)?;

    let pressure: Vec<f64> = controlled
        .column(field::AP)?
        .iter()
        .map(|&ap| {
            if (PRESSURE_MIN..=PRESSURE_MAX).contains(&ap) {
                ap * 100.0
            } else {
                PRESSURE_NORMAL * 100.0
            }
        })
        .collect();
    interpolated.append_column(field::AP, interpolate(&time, &pressure)?)?;

    let precipitation_type = precipitation_type(controlled)?;
    interpolated.append_column(field::PI, interpolate_rounded(&time, &precipitation_type)?)?;
    interpolated.append_column(
        field::CC,
        interpolate_rounded(&time, &controlled.column(field::CC)?)?,
    )?;

    let anthropogenic = if config.use_anthropogenic_flux {
        interpolate(&time, &controlled.column(field::FA)?)?
    } else {
        vec![DEFAULT_ANTHROPOGENIC_FLUX; interpolated.row_count()]
    };
    interpolated.append_column(field::FA, anthropogenic)?;

    log::info!(
        "Forecast interpolated on {} steps of {} s",
        interpolated.row_count(),
        TIME_STEP
    );
    Ok(())
}

/// Precipitation accumulations become per-step amounts; `QP` is the total
/// water-equivalent rate in m/s.
fn append_precipitation(
    time: &[f64],
    controlled: &TimeSeriesTable,
    interpolated: &mut TimeSeriesTable,
) -> Result<()> {
    let rain = controlled.column(field::RA)?;
    let snow = controlled.column(field::SN)?;
    let mut total: Vec<f64> = snow
        .iter()
        .zip(&rain)
        .map(|(sn, ra)| sn / SNOW_WATER_RATIO * 10.0 + ra)
        .collect();
    let highest = arrays::max(&total).unwrap_or(0.0);
    for value in total.iter_mut().filter(|v| **v < 0.0) {
        *value = highest;
    }

    let per_step = |values: &[f64]| -> Result<Vec<f64>> {
        Ok(shift_left(&interpolate(time, &backward_difference(values))?, 0.0))
    };
    let rate: Vec<f64> = per_step(&total)?
        .into_iter()
        .map(|qp| (qp * 1e-3 / 3600.0).max(0.0))
        .collect();
    interpolated.append_column(field::QP, rate)?;
    interpolated.append_column(field::SN, per_step(&snow)?)?;
    interpolated.append_column(field::RA, per_step(&rain)?)?;
    Ok(())
}

/// 1 for rain, 2 for snow, from the accumulation increments or the air
/// temperature when nothing falls.
fn precipitation_type(controlled: &TimeSeriesTable) -> Result<Vec<f64>> {
    let patch_last = |mut values: Vec<f64>| {
        if let Some(&last) = values.last() {
            if last < 0.0 {
                let highest = arrays::max(&values).unwrap_or(0.0);
                if let Some(v) = values.last_mut() {
                    *v = highest;
                }
            }
        }
        values
    };
    let rain = backward_difference(&patch_last(controlled.column(field::RA)?));
    let snow = backward_difference(&patch_last(controlled.column(field::SN)?));
    let air = controlled.column(field::AT)?;

    Ok(rain
        .iter()
        .zip(&snow)
        .zip(&air)
        .map(|((&ra, &sn), &at)| {
            if ra > 0.0 {
                1.0
            } else if sn > 0.0 {
                2.0
            } else if at > 0.0 {
                1.0
            } else {
                2.0
            }
        })
        .collect())
}
