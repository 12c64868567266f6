use crate::error::{ProcessError, Result};
use roadcast_core::config::RunConfig;
use roadcast_core::constants::{CLOUD_OCTAL_MAX, CLOUD_OCTAL_MIN};
use roadcast_core::schema::field;
use roadcast_core::table::TimeSeriesTable;
use roadcast_utils::arrays::backward_difference;

/// Check the controlled forecast: finite values, cloud octals and
/// precipitation accumulations.
pub fn check_forecast(forecast: &TimeSeriesTable, config: &RunConfig) -> Result<()> {
    check_finite(forecast, config)?;
    check_cloud_octal(forecast)?;
    for name in [field::RA, field::SN] {
        check_accumulation(forecast, name)?;
    }
    Ok(())
}

fn check_finite(forecast: &TimeSeriesTable, config: &RunConfig) -> Result<()> {
    for name in forecast.column_names() {
        if name.contains("TIME") {
            continue;
        }
        if name == field::CC && config.fluxes_from_forecast() {
            continue;
        }
        let has_invalid = forecast
            .multi_column(name)?
            .iter()
            .flatten()
            .any(|v| !v.is_finite());
        if !has_invalid {
            continue;
        }
        if forecast.is_standard_column(name) {
            return Err(ProcessError::Forecast {
                field: name.to_lowercase(),
                reason: "every value must be valid".to_string(),
            });
        }
        log::warn!(
            "A value for the extended element <{}> is invalid",
            name.to_lowercase()
        );
    }
    Ok(())
}

fn check_cloud_octal(forecast: &TimeSeriesTable) -> Result<()> {
    let clouds = forecast.column(field::CC)?;
    if let Some(bad) = clouds
        .iter()
        .position(|&cc| cc < CLOUD_OCTAL_MIN || cc > CLOUD_OCTAL_MAX)
    {
        return Err(ProcessError::Forecast {
            field: field::CC.to_lowercase(),
            reason: format!(
                "cloud cover must be an octal in 0-8, found {} at row {}",
                clouds[bad], bad
            ),
        });
    }
    Ok(())
}

/// Accumulations never decrease, the last sample excepted.
fn check_accumulation(forecast: &TimeSeriesTable, name: &str) -> Result<()> {
    let increments = backward_difference(&forecast.column(name)?);
    let checked = &increments[..increments.len().saturating_sub(1)];
    if let Some(bad) = checked.iter().position(|d| *d < 0.0) {
        return Err(ProcessError::Forecast {
            field: name.to_lowercase(),
            reason: format!(
                "precipitation is the total amount since the start of the period, it decreases at row {}",
                bad
            ),
        });
    }
    Ok(())
}
