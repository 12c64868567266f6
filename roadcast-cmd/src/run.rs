use crate::egress::{interpolated_forecast_schema, write_table};
use crate::engine::ExternalEngine;
use crate::ingest::read_table;
use crate::settings::{load_config, load_station, ModelArgs};
use anyhow::{anyhow, Context};
use log::info;
use roadcast_core::config::RunConfig;
use roadcast_core::schema::{field, SourceSchema};
use roadcast_data::pipeline::{self, PipelineInput};

fn read_inputs(
    forecast: &str,
    observation: &str,
    station: &str,
    config: &RunConfig,
) -> anyhow::Result<PipelineInput> {
    Ok(PipelineInput {
        forecast: read_table(forecast, &SourceSchema::forecast(config))?,
        observation: read_table(observation, &SourceSchema::observation())?,
        station: load_station(station)?,
    })
}

/// Produce a roadcast file from forecast, observation and station files.
pub fn run_roadcast(
    forecast: &str,
    observation: &str,
    station: &str,
    roadcast: &str,
    args: &ModelArgs,
) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let mut engine = config
        .engine_command
        .as_deref()
        .and_then(ExternalEngine::new)
        .ok_or_else(|| {
            anyhow!("No physics engine configured, use --engine or set engine_command")
        })?;
    let input = read_inputs(forecast, observation, station, &config)?;

    let production_date = chrono::Utc::now().timestamp() as f64;
    let output = pipeline::run(input, &config, &mut engine, production_date)
        .context("Roadcast run failed")?;
    let roadcast_collection = output
        .roadcast
        .ok_or_else(|| anyhow!("The model was bypassed, no roadcast produced"))?;

    let table = roadcast_collection.subsampled();
    let levels = if table.has_column(field::TL) {
        table.column_index_group(field::TL)?.len()
    } else {
        0
    };
    write_table(
        roadcast,
        table,
        &SourceSchema::roadcast(levels),
        config.default_precision,
    )?;
    info!("Roadcast written to {}", roadcast);
    Ok(())
}

/// Run quality control, interpolation and combination only, and write the
/// interpolated forecast.
pub fn run_preprocess(
    forecast: &str,
    observation: &str,
    station: &str,
    output_forecast: &str,
    args: &ModelArgs,
) -> anyhow::Result<()> {
    let config = RunConfig {
        bypass_core: true,
        ..load_config(args)?
    };
    let input = read_inputs(forecast, observation, station, &config)?;
    let preprocessed = pipeline::preprocess(input, &config).context("Preprocessing failed")?;
    write_table(
        output_forecast,
        preprocessed.forecast.interpolated(),
        &interpolated_forecast_schema(),
        config.default_precision,
    )?;
    Ok(())
}
