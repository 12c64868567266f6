//! Command implementations for the roadcast CLI.
//!
//! Reads the forecast, observation and station files, runs the pipeline
//! and writes the roadcast or the interpolated forecast.

use clap::{Args, Subcommand};
use settings::ModelArgs;

pub mod egress;
pub mod engine;
pub mod ingest;
pub mod run;
pub mod settings;

/// Input files of a run.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Atmospheric forecast CSV
    #[arg(short, long)]
    pub forecast: String,

    /// Road weather station observation CSV
    #[arg(short, long)]
    pub observation: String,

    /// Station configuration JSON
    #[arg(short, long)]
    pub station: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Produce a roadcast with the physics engine
    Run {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output path for the roadcast CSV
        #[arg(short, long)]
        roadcast: String,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Check, interpolate and combine the inputs without running the engine
    Preprocess {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output path for the interpolated forecast CSV
        #[arg(long)]
        output_forecast: String,

        #[command(flatten)]
        model: ModelArgs,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Run {
            inputs,
            roadcast,
            model,
        } => run::run_roadcast(
            &inputs.forecast,
            &inputs.observation,
            &inputs.station,
            &roadcast,
            &model,
        ),
        Command::Preprocess {
            inputs,
            output_forecast,
            model,
        } => run::run_preprocess(
            &inputs.forecast,
            &inputs.observation,
            &inputs.station,
            &output_forecast,
            &model,
        ),
    }
}
