//! Run configuration and station loading.

use anyhow::{bail, Context};
use clap::Args;
use roadcast_core::config::{RunConfig, SunShadowMethod};
use roadcast_core::station::Station;
use roadcast_utils::dates;

/// Options shared by every subcommand that runs the pipeline.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// JSON configuration file, overridden by the flags below
    #[arg(long)]
    pub config: Option<String>,

    /// Date of the first roadcast (YYYY-MM-DDTHH:MM)
    #[arg(long)]
    pub roadcast_start_date: Option<String>,

    /// Use the solar flux of the forecast instead of computing it
    #[arg(long)]
    pub use_solarflux_forecast: bool,

    /// Use the infrared flux of the forecast instead of computing it
    #[arg(long)]
    pub use_infrared_forecast: bool,

    /// Use the anthropogenic flux of the forecast
    #[arg(long)]
    pub use_anthropogenic_flux: bool,

    /// Use the sub-surface sensor depth of the station file
    #[arg(long)]
    pub use_sst_sensor_depth: bool,

    /// Shade the solar flux with the visible horizon of the station file
    #[arg(long)]
    pub enable_sunshadow: bool,

    /// Sun shadow method, 1 (basic) or 2 (enhanced)
    #[arg(long)]
    pub sunshadow_method: Option<u32>,

    /// Temperature of the bottom road layer, in °C
    #[arg(long, allow_hyphen_values = true)]
    pub fix_deep_soil_temperature: Option<f64>,

    /// Write the temperature of every depth level
    #[arg(long)]
    pub output_subsurface_levels: bool,

    /// Decimal digits for real output fields without their own precision
    #[arg(long)]
    pub precision: Option<u32>,

    /// Command line of the physics engine
    #[arg(long)]
    pub engine: Option<String>,
}

/// Defaults, then the configuration file, then the command line.
pub fn load_config(args: &ModelArgs) -> anyhow::Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read configuration '{}'", path))?;
            RunConfig::from_json(&text)
                .with_context(|| format!("Invalid configuration '{}'", path))?
        }
        None => RunConfig::default(),
    };
    apply_flags(&mut config, args);
    validate(&config)?;
    Ok(config)
}

fn apply_flags(config: &mut RunConfig, args: &ModelArgs) {
    if let Some(date) = &args.roadcast_start_date {
        config.roadcast_start_date = Some(date.clone());
    }
    config.use_solar_flux_forecast |= args.use_solarflux_forecast;
    config.use_infrared_forecast |= args.use_infrared_forecast;
    config.use_anthropogenic_flux |= args.use_anthropogenic_flux;
    config.use_sst_sensor_depth |= args.use_sst_sensor_depth;
    config.output_levels |= args.output_subsurface_levels;
    config.use_sunshadow |= args.enable_sunshadow;
    if let Some(code) = args.sunshadow_method {
        config.sunshadow_method = SunShadowMethod::from_code(code).unwrap_or_else(|| {
            log::warn!("Unknown sun shadow method {}, using the basic method", code);
            SunShadowMethod::Basic
        });
    }
    if let Some(t) = args.fix_deep_soil_temperature {
        config.deep_soil_temperature = Some(t);
    }
    if let Some(p) = args.precision {
        config.default_precision = p;
    }
    if let Some(engine) = &args.engine {
        config.engine_command = Some(engine.clone());
    }
}

fn validate(config: &RunConfig) -> anyhow::Result<()> {
    if let Some(date) = &config.roadcast_start_date {
        if dates::parse_iso8601(date).is_err() {
            bail!(
                "Invalid roadcast start date '{}', expected YYYY-MM-DDTHH:MM",
                date
            );
        }
    }
    Ok(())
}

/// Read a station JSON file.
pub fn load_station(path: &str) -> anyhow::Result<Station> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read station '{}'", path))?;
    let station =
        Station::from_json(&text).with_context(|| format!("Invalid station file '{}'", path))?;
    log::info!(
        "Station '{}' with {} road layers",
        station.road_station,
        station.roadlayers.len()
    );
    Ok(station)
}
