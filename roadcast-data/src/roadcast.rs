//! Assembly of the roadcast from the model output and the forecast.

use crate::engine::EngineOutput;
use crate::error::{ProcessError, Result};
use crate::qa_qc::station::StationProfile;
use roadcast_core::attribute::{
    AttributeValue, DELTA_T, FORECAST_NB_TIMESTEPS, OBSERVATION_DELTA_T, OBSERVATION_LENGTH,
};
use roadcast_core::collection::{RoadcastCollection, SourceCollection};
use roadcast_core::config::{RunConfig, ROADCAST_VERSION};
use roadcast_core::constants::{MS_TO_KMH, TIME_STEP};
use roadcast_core::schema::{field, header, HeaderValue, SourceSchema};
use roadcast_core::table::TimeSeriesTable;

/// First `timesteps` values of a model series.
fn truncated<'a>(name: &str, values: &'a [f64], timesteps: usize) -> Result<&'a [f64]> {
    values.get(..timesteps).ok_or_else(|| {
        ProcessError::Engine(format!(
            "{} has {} values, {} expected",
            name,
            values.len(),
            timesteps
        ))
    })
}

/// Build the roadcast collection at engine resolution.
///
/// `production_date` is written in the header, in epoch seconds.
pub fn build_roadcast(
    forecast: &SourceCollection,
    observation: &SourceCollection,
    station: &StationProfile,
    output: &EngineOutput,
    config: &RunConfig,
    production_date: f64,
) -> Result<RoadcastCollection> {
    let fc = forecast.interpolated();
    let timesteps = fc.row_count();
    let levels = if config.output_levels {
        output.depths.len()
    } else {
        0
    };
    let schema = SourceSchema::roadcast(levels);
    let mut table = TimeSeriesTable::from_schema(&schema.data);
    table.init_matrix(timesteps, table.physical_width(), f64::NAN)?;

    let roadcast_time: Vec<f64> = fc
        .column(field::FORECAST_TIME)?
        .iter()
        .map(|t| t + TIME_STEP)
        .collect();
    let wind: Vec<f64> = fc.column(field::WS)?.iter().map(|ws| ws * MS_TO_KMH).collect();
    table.set_column(field::ROADCAST_TIME, &roadcast_time)?;
    table.set_column(field::HH, &fc.column(field::TIME)?)?;
    table.set_column(field::WS, &wind)?;
    for (target, source) in [
        (field::AT, field::AT),
        (field::TD, field::TD),
        (field::QP_SN, field::SN),
        (field::QP_RA, field::RA),
        (field::CC, field::CC),
        (field::FA, field::FA),
    ] {
        table.set_column(target, &fc.column(source)?)?;
    }

    for (name, values) in [
        (field::RA, &output.ra),
        (field::SN, &output.sn),
        (field::RC, &output.rc),
        (field::ST, &output.st),
        (field::FV, &output.fv),
        (field::SF, &output.sf),
        (field::IR, &output.ir),
        (field::FC, &output.fc),
        (field::FG, &output.fg),
        (field::BB, &output.bb),
        (field::FP, &output.fp),
        (field::SST, &output.sst),
    ] {
        table.set_column(name, truncated(name, values, timesteps)?)?;
    }
    if levels > 0 {
        table.set_multi_column(field::TL, &output.profile(timesteps)?)?;
        table.set_header_value(
            header::VERTICAL_LEVELS,
            HeaderValue::RealList(output.depths.clone()),
        )?;
    }

    table.set_header_value(header::VERSION, HeaderValue::Text(ROADCAST_VERSION.to_string()))?;
    table.set_header_value(header::ROAD_STATION, HeaderValue::Text(station.name.clone()))?;
    table.set_header_value(header::PRODUCTION_DATE, HeaderValue::Date(production_date))?;
    table.set_header_value(header::LATITUDE, HeaderValue::Real(station.latitude))?;
    table.set_header_value(header::LONGITUDE, HeaderValue::Real(station.longitude))?;
    table.set_header_value(header::FILETYPE, HeaderValue::Text("roadcast".to_string()))?;
    if let Some(point) = &station.scribe_point {
        table.set_header_value(header::SCRIBE_POINT, HeaderValue::Text(point.clone()))?;
    }

    let observation_length = observation.interpolated().row_count();
    let delta_t = if observation_length > 0 {
        observation.attributes().real(DELTA_T)?
    } else {
        0.0
    };
    let mut roadcast = RoadcastCollection::new(table)?;
    let attributes = roadcast.attributes_mut();
    attributes.set(OBSERVATION_LENGTH, AttributeValue::Count(observation_length))?;
    attributes.set(OBSERVATION_DELTA_T, AttributeValue::Real(delta_t))?;
    attributes.set(FORECAST_NB_TIMESTEPS, AttributeValue::Count(timesteps))?;
    log::debug!("Roadcast built on {} steps", timesteps);
    Ok(roadcast)
}
