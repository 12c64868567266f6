//! Incoming solar and infrared fluxes of the forecast.
//!
//! Both are read from the forecast when configured, otherwise derived
//! from the cloud cover, the sun position and the air temperature.

use crate::error::{DateContext, Result};
use crate::interpolation::interpolate;
use crate::physics::{infrared_flux, solar_flux, SolarTerms};
use crate::qa_qc::station::StationProfile;
use crate::sunshadow::shade_solar_flux;
use roadcast_core::collection::SourceCollection;
use roadcast_core::config::RunConfig;
use roadcast_core::schema::field;
use roadcast_utils::dates;

/// Append `SF` and `IR` to the interpolated forecast (and to the controlled
/// one when derived). Cloud cover becomes -1 when both fluxes are given.
/// With a visible horizon the interpolated `SF` is shaded.
pub fn set_fluxes(
    forecast: &mut SourceCollection,
    station: &StationProfile,
    config: &RunConfig,
) -> Result<()> {
    let controlled = forecast.controlled();
    let time = controlled.column(field::TIME)?;
    let forecast_time = controlled.column(field::FORECAST_TIME)?;
    let clouds = controlled.column(field::CC)?;
    let given_sf = if config.use_solar_flux_forecast {
        Some(controlled.column(field::SF)?)
    } else {
        None
    };
    let given_ir = if config.use_infrared_forecast {
        Some(controlled.column(field::IR)?)
    } else {
        None
    };
    let air_temperature = controlled.column(field::AT)?;

    let mut interpolated_sf = match given_sf {
        Some(sf) => interpolate(&time, &sf)?,
        None => {
            let daylight = daylight(forecast_time[0], station)?;
            let sf = solar_flux(
                &clouds,
                &forecast_time,
                daylight,
                station.latitude,
                station.longitude,
            )?;
            let interpolated = interpolate(&time, &sf)?;
            forecast.controlled_mut().append_column(field::SF, sf)?;
            interpolated
        }
    };
    if let Some(horizon) = &station.horizon {
        let steps = forecast.interpolated().column(field::FORECAST_TIME)?;
        interpolated_sf = shade_solar_flux(
            &steps,
            &interpolated_sf,
            station.latitude,
            station.longitude,
            horizon,
            config.sunshadow_method,
        );
    }
    forecast
        .interpolated_mut()
        .append_column(field::SF, interpolated_sf)?;

    match given_ir {
        Some(ir) => {
            let interpolated = interpolate(&time, &ir)?;
            forecast.interpolated_mut().append_column(field::IR, interpolated)?;
        }
        None => {
            let ir = infrared_flux(&clouds, &air_temperature);
            let interpolated = interpolate(&time, &ir)?;
            forecast.controlled_mut().append_column(field::IR, ir)?;
            forecast.interpolated_mut().append_column(field::IR, interpolated)?;
        }
    }

    if config.fluxes_from_forecast() {
        let unknown = vec![-1.0; clouds.len()];
        let interpolated = interpolate(&time, &unknown)?;
        forecast.controlled_mut().set_column(field::CC, &unknown)?;
        forecast.interpolated_mut().set_column(field::CC, &interpolated)?;
    }
    Ok(())
}

/// Sunrise and sunset of the first forecast day.
fn daylight(first_forecast: f64, station: &StationProfile) -> Result<Option<(f64, f64)>> {
    let noon = dates::to_datetime(first_forecast)
        .date()?
        .date_naive()
        .and_hms_opt(12, 0, 0)
        .map(|t| t.and_utc().timestamp() as f64)
        .unwrap_or(first_forecast);
    let terms = SolarTerms::at(noon, station.latitude)?;
    let daylight = terms.sunrise_sunset(station.longitude);
    match daylight {
        Some((rise, set)) => {
            let (rh, rm, rs) = dates::decimal_hour_to_hms(rise);
            let (sh, sm, ss) = dates::decimal_hour_to_hms(set);
            log::info!(
                "For the date {}, at the latitude {:.2} {} and longitude {:.2} {}, sunrise is at {}:{:02}:{:02} UTC, sunset is at {}:{:02}:{:02} UTC",
                dates::format_iso8601(noon).date()?,
                station.latitude.abs(),
                if station.latitude > 0.0 { 'N' } else { 'S' },
                station.longitude.abs(),
                if station.longitude < 0.0 { 'W' } else { 'E' },
                rh, rm, rs, sh, sm, ss
            );
        }
        None => log::info!("The sun does not cross the horizon on the first forecast day"),
    }
    Ok(daylight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::forecast::interpolate_forecast;
    use roadcast_core::schema::SourceSchema;
    use roadcast_core::station::StationType;
    use roadcast_core::table::TimeSeriesTable;

    fn station() -> StationProfile {
        StationProfile {
            name: "oregon".to_string(),
            latitude: 45.5,
            longitude: -73.6,
            station_type: StationType::Road,
            sst_depth: 0.4,
            deep_soil_temperature: None,
            layer_types: vec![1],
            layer_thicknesses: vec![0.1],
            horizon: None,
            scribe_point: None,
        }
    }

    fn forecast(config: &RunConfig) -> SourceCollection {
        let mut table = TimeSeriesTable::from_schema(&SourceSchema::forecast(config).data);
        let start = dates::parse_iso8601("2004-01-30T00:00Z").unwrap();
        let width = table.physical_width();
        for i in 0..24 {
            // FORECAST_TIME, WS, AP, AT, TD, CC, SN, RA, then SF / IR
            let mut row = vec![
                Some(start + 3600.0 * i as f64),
                Some(10.0),
                Some(1013.0),
                Some(2.0),
                Some(-1.0),
                Some(4.0),
                Some(0.0),
                Some(0.0),
            ];
            row.resize(width, Some(100.0));
            table.append_row(&row).unwrap();
        }
        let mut collection = SourceCollection::new(table, &[]).unwrap();
        interpolate_forecast(&mut collection, config).unwrap();
        collection
    }

    #[test]
    fn test_derived_fluxes() {
        let config = RunConfig::default();
        let mut collection = forecast(&config);
        set_fluxes(&mut collection, &station(), &config).unwrap();
        let sf = collection.controlled().column(field::SF).unwrap();
        assert_eq!(sf[3], 0.0);
        assert!(sf[17] > 0.0);
        let ir = collection.interpolated().column(field::IR).unwrap();
        assert_eq!(ir.len(), collection.interpolated().row_count());
        assert!((ir[0] - (4.38 * 2.0 + 250.7)).abs() < 1e-9);
        assert!(collection.interpolated().column(field::CC).unwrap()[0] == 4.0);
    }

    #[test]
    fn test_fluxes_from_forecast() {
        let config = RunConfig {
            use_solar_flux_forecast: true,
            use_infrared_forecast: true,
            ..RunConfig::default()
        };
        let mut collection = forecast(&config);
        set_fluxes(&mut collection, &station(), &config).unwrap();
        let interpolated = collection.interpolated();
        assert!(interpolated.column(field::SF).unwrap().iter().all(|v| *v == 100.0));
        assert!(interpolated.column(field::CC).unwrap().iter().all(|v| *v == -1.0));
        assert!(collection.controlled().column(field::CC).unwrap().iter().all(|v| *v == -1.0));
    }

    #[test]
    fn test_solar_flux_behind_horizon() {
        use crate::sunshadow::Horizon;
        use roadcast_core::station::HorizonPoint;

        let config = RunConfig {
            use_solar_flux_forecast: true,
            use_sunshadow: true,
            ..RunConfig::default()
        };
        let mut collection = forecast(&config);
        let wall = [0.0, 180.0].map(|azimuth| HorizonPoint {
            azimuth,
            elevation: 90.0,
        });
        let profile = StationProfile {
            horizon: Some(Horizon::new(&wall).unwrap()),
            ..station()
        };
        set_fluxes(&mut collection, &profile, &config).unwrap();
        let sf = collection.interpolated().column(field::SF).unwrap();
        assert!(!sf.is_empty());
        assert!(sf.iter().all(|v| *v == 0.0));
        assert!(collection.controlled().column(field::SF).unwrap().iter().all(|v| *v == 100.0));
    }
}
