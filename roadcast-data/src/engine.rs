//! Boundary with the road surface heat balance model.
//!
//! The model itself is external. [`EngineInput`] gathers the flat arrays and
//! scalars it consumes from the preprocessed collections; [`EngineOutput`]
//! holds what it returns at the same 30 second cadence.

use crate::error::{ProcessError, Result};
use crate::qa_qc::station::StationProfile;
use roadcast_core::attribute::{
    AttributeBag, AT_VALID_INTERPOLATED, DELTA_T, SST_VALID_INTERPOLATED, TD_VALID_INTERPOLATED,
    WS_VALID_INTERPOLATED,
};
use roadcast_core::collection::SourceCollection;
use roadcast_core::constants::ENGINE_CAPACITY;
use roadcast_core::schema::field;
use roadcast_core::table::TimeSeriesTable;
use serde::{Deserialize, Serialize};

/// Everything the model consumes for one run.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct EngineInput {
    // Station
    pub is_bridge: bool,
    pub latitude: f64,
    pub longitude: f64,
    /// Layer codes, surface first, followed by an empty slot
    pub layer_types: Vec<i32>,
    /// Layer thicknesses in meters, followed by an empty slot
    pub layer_thicknesses: Vec<f64>,
    pub layer_count: usize,
    pub sst_depth: f64,
    pub deep_soil_temperature: Option<f64>,

    // Interpolated forecast
    pub air_temperature: Vec<f64>,
    pub precipitation_rate: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub pressure: Vec<f64>,
    pub solar_flux: Vec<f64>,
    pub infrared_flux: Vec<f64>,
    pub anthropogenic_flux: Vec<f64>,
    pub precipitation_type: Vec<i32>,
    pub surface_condition: Vec<i32>,
    pub absolute_humidity: Vec<f64>,
    pub timesteps: usize,

    // Interpolated observation
    pub observed_air_temperature: Vec<f64>,
    pub observed_road_temperature: Vec<f64>,
    pub observed_subsurface_temperature: Vec<f64>,
    pub observation_time: Vec<f64>,
    /// SST, AT, TD and WS validity interleaved per step, `4 * ENGINE_CAPACITY` long
    pub validity: Vec<i32>,
    pub no_observation: Vec<bool>,
    pub delta_t: f64,
    pub observation_length: usize,
}

/// Series computed by the model.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOutput {
    pub ra: Vec<f64>,
    pub sn: Vec<f64>,
    pub rc: Vec<f64>,
    pub st: Vec<f64>,
    pub fv: Vec<f64>,
    pub sf: Vec<f64>,
    pub ir: Vec<f64>,
    pub fc: Vec<f64>,
    pub fg: Vec<f64>,
    pub bb: Vec<f64>,
    pub fp: Vec<f64>,
    pub sst: Vec<f64>,
    /// Depth of each level of the temperature profile, meters
    pub depths: Vec<f64>,
    /// Temperature profile, all levels of step 0 then all levels of step 1 and so on
    pub levels: Vec<f64>,
    pub failed: bool,
}

impl EngineOutput {
    /// Temperature profile as one series per level over the first `timesteps` steps.
    pub fn profile(&self, timesteps: usize) -> Result<Vec<Vec<f64>>> {
        let count = self.depths.len();
        if count == 0 {
            return Ok(Vec::new());
        }
        if self.levels.len() < count * timesteps {
            return Err(ProcessError::Engine(format!(
                "temperature profile has {} values, {} levels over {} steps expected",
                self.levels.len(),
                count,
                timesteps
            )));
        }
        Ok((0..count)
            .map(|level| {
                (0..timesteps)
                    .map(|step| self.levels[step * count + level])
                    .collect()
            })
            .collect())
    }
}

/// A road surface model run.
pub trait PhysicsEngine {
    fn run(&mut self, input: &EngineInput) -> Result<EngineOutput>;
}

/// Column of a table, empty when the table has no row.
fn column_or_empty(table: &TimeSeriesTable, name: &str) -> Result<Vec<f64>> {
    if table.row_count() == 0 {
        return Ok(Vec::new());
    }
    Ok(table.column(name)?)
}

fn codes(values: Vec<f64>) -> Vec<i32> {
    values.into_iter().map(|v| v as i32).collect()
}

fn interleaved_validity(attributes: &AttributeBag) -> Result<Vec<i32>> {
    let mut validity = vec![0; 4 * ENGINE_CAPACITY];
    for (offset, name) in [
        SST_VALID_INTERPOLATED,
        AT_VALID_INTERPOLATED,
        TD_VALID_INTERPOLATED,
        WS_VALID_INTERPOLATED,
    ]
    .into_iter()
    .enumerate()
    {
        if attributes.get(name)?.is_none() {
            continue;
        }
        for (i, v) in attributes.mask(name)?.iter().take(ENGINE_CAPACITY).enumerate() {
            validity[4 * i + offset] = *v as i32;
        }
    }
    Ok(validity)
}

impl EngineInput {
    pub fn build(
        forecast: &SourceCollection,
        observation: &SourceCollection,
        station: &StationProfile,
    ) -> Result<EngineInput> {
        let fc = forecast.interpolated();
        let obs = observation.interpolated();
        let attributes = observation.attributes();

        let mut layer_types = station.layer_types.clone();
        let mut layer_thicknesses = station.layer_thicknesses.clone();
        let layer_count = layer_types.len();
        layer_types.push(0);
        layer_thicknesses.push(0.0);

        let observation_length = obs.row_count();
        let delta_t = if observation_length > 0 {
            attributes.real(DELTA_T)?
        } else {
            0.0
        };

        log::debug!(
            "Engine input: {} forecast steps, {} observation steps, {} road layers",
            fc.row_count(),
            observation_length,
            layer_count
        );

        Ok(EngineInput {
            is_bridge: station.station_type.is_bridge(),
            latitude: station.latitude,
            longitude: station.longitude,
            layer_types,
            layer_thicknesses,
            layer_count,
            sst_depth: station.sst_depth,
            deep_soil_temperature: station.deep_soil_temperature,
            air_temperature: fc.column(field::AT)?,
            precipitation_rate: fc.column(field::QP)?,
            wind_speed: fc.column(field::WS)?,
            pressure: fc.column(field::AP)?,
            solar_flux: fc.column(field::SF)?,
            infrared_flux: fc.column(field::IR)?,
            anthropogenic_flux: fc.column(field::FA)?,
            precipitation_type: codes(fc.column(field::PI)?),
            surface_condition: codes(fc.column(field::SC)?),
            absolute_humidity: fc.column(field::AH)?,
            timesteps: fc.row_count(),
            observed_air_temperature: column_or_empty(obs, field::AT)?,
            observed_road_temperature: column_or_empty(obs, field::ST)?,
            observed_subsurface_temperature: column_or_empty(obs, field::SST)?,
            observation_time: column_or_empty(obs, field::TIME)?,
            validity: interleaved_validity(attributes)?,
            no_observation: attributes.no_observation()?.to_vec(),
            delta_t,
            observation_length,
        })
    }
}

/// Run the model and reject a reported failure.
pub fn run_engine(engine: &mut dyn PhysicsEngine, input: &EngineInput) -> Result<EngineOutput> {
    log::info!("Start sending data to the road surface model");
    let output = engine.run(input)?;
    if output.failed {
        return Err(ProcessError::Engine(
            "the model reported a failure".to_string(),
        ));
    }
    log::info!("End of the road surface model");
    Ok(output)
}
