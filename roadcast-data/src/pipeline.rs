//! One roadcast run from the parsed inputs to the rounded output table.
//!
//! Stages run strictly in sequence; each one owns the collection it works
//! on until it returns.

use crate::combine::combine;
use crate::engine::{run_engine, EngineInput, PhysicsEngine};
use crate::error::Result;
use crate::flux::set_fluxes;
use crate::interpolation::forecast::interpolate_forecast;
use crate::interpolation::observation::interpolate_observation;
use crate::qa_qc::forecast::check_forecast;
use crate::qa_qc::input::{check_versions, validate_input};
use crate::qa_qc::observation::check_observation;
use crate::qa_qc::station::{check_station, StationProfile};
use crate::roadcast::build_roadcast;
use crate::round::round_roadcast;
use crate::subsample::subsample;
use roadcast_core::attribute::{LAST_OBSERVATION, OBSERVATION_ATTRIBUTES};
use roadcast_core::collection::{RoadcastCollection, SourceCollection};
use roadcast_core::config::RunConfig;
use roadcast_core::station::Station;
use roadcast_core::table::TimeSeriesTable;

/// Parsed input files.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub forecast: TimeSeriesTable,
    pub observation: TimeSeriesTable,
    pub station: Station,
}

/// Collections after quality control, interpolation and combination.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub forecast: SourceCollection,
    pub observation: SourceCollection,
    pub station: StationProfile,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub preprocessed: Preprocessed,
    /// `None` when the model is bypassed
    pub roadcast: Option<RoadcastCollection>,
}

/// Validate, interpolate and combine the inputs.
pub fn preprocess(input: PipelineInput, config: &RunConfig) -> Result<Preprocessed> {
    let PipelineInput {
        forecast,
        mut observation,
        station,
    } = input;

    check_versions(&forecast, &observation, &station)?;
    validate_input(&forecast, &mut observation, config)?;

    let mut forecast = SourceCollection::new(forecast, &[])?;
    let mut observation = SourceCollection::new(observation, &OBSERVATION_ATTRIBUTES)?;
    check_forecast(forecast.controlled(), config)?;
    check_observation(&mut observation, forecast.controlled(), config)?;
    let station = check_station(&station, config)?;
    log::info!("Quality control done for station '{}'", station.name);

    interpolate_forecast(&mut forecast, config)?;
    interpolate_observation(&mut observation)?;
    set_fluxes(&mut forecast, &station, config)?;
    combine(&mut forecast, &observation)?;
    log::info!(
        "Preprocessing done, {} forecast steps",
        forecast.interpolated().row_count()
    );

    Ok(Preprocessed {
        forecast,
        observation,
        station,
    })
}

/// Run the model on preprocessed collections and postprocess its output.
pub fn postprocess(
    preprocessed: &Preprocessed,
    engine: &mut dyn PhysicsEngine,
    config: &RunConfig,
    production_date: f64,
) -> Result<RoadcastCollection> {
    let input = EngineInput::build(
        &preprocessed.forecast,
        &preprocessed.observation,
        &preprocessed.station,
    )?;
    let output = run_engine(engine, &input)?;
    let mut roadcast = build_roadcast(
        &preprocessed.forecast,
        &preprocessed.observation,
        &preprocessed.station,
        &output,
        config,
        production_date,
    )?;

    let last_observation = preprocessed
        .observation
        .attributes()
        .real(LAST_OBSERVATION)?;
    subsample(&mut roadcast, last_observation, config)?;
    round_roadcast(roadcast.subsampled_mut(), config.default_precision)?;
    log::info!(
        "Roadcast ready, {} rows",
        roadcast.subsampled().row_count()
    );
    Ok(roadcast)
}

/// Full run. The model step is skipped when `bypass_core` is set.
pub fn run(
    input: PipelineInput,
    config: &RunConfig,
    engine: &mut dyn PhysicsEngine,
    production_date: f64,
) -> Result<RunOutput> {
    let preprocessed = preprocess(input, config)?;
    if config.bypass_core {
        log::info!("Bypassing the road surface model, roadcast not created");
        return Ok(RunOutput {
            preprocessed,
            roadcast: None,
        });
    }
    let roadcast = postprocess(&preprocessed, engine, config, production_date)?;
    Ok(RunOutput {
        preprocessed,
        roadcast: Some(roadcast),
    })
}
