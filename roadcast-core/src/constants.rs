//! Physical and numerical constants shared by the processing stages.

/// Step of the fine time grid, in seconds.
pub const TIME_STEP: f64 = 30.0;

/// Number of fine steps per hour.
pub const STEPS_PER_HOUR: usize = 120;

/// Reporting interval of the subsampled roadcast, in minutes.
pub const MINUTES_FOR_OUTPUT: u32 = 20;

/// Half width of the road condition vote window, in seconds.
pub const ROAD_CONDITION_WINDOW_SECONDS: f64 = 600.0;

/// Relaxation rate, inverse of the 4 hour time constant (1/s).
pub const RELAXATION_RATE: f64 = 1.0 / (4.0 * 3600.0);

/// Number of fine steps in the wind speed relaxation window (4 hours).
pub const WIND_RELAXATION_STEPS: usize = 480;

/// Capacity of the physics engine arrays, in fine steps.
pub const ENGINE_CAPACITY: usize = 11520;

/// Observations older than this, relative to the forecast start, are dropped (hours).
pub const OBSERVATION_EXPIRATION_HOURS: f64 = 48.0;

/// Largest accepted gap between two observations, in minutes.
pub const OBSERVATION_GAP_MINUTES: f64 = 240.0;

/// Minimum coupling length after the forecast start, in hours.
pub const COUPLING_MIN_HOURS: f64 = 3.0;

/// Snow to water ratio used when summing precipitation.
pub const SNOW_WATER_RATIO: f64 = 10.0;

/// km/h to m/s.
pub const KMH_TO_MS: f64 = 0.2777777;

/// m/s to km/h.
pub const MS_TO_KMH: f64 = 3.6;

// Valid ranges, degrees Celsius unless stated
pub const ROAD_TEMPERATURE_MIN: f64 = -40.0;
pub const ROAD_TEMPERATURE_MAX: f64 = 80.0;
pub const SST_MIN: f64 = -40.0;
pub const SST_MAX: f64 = 80.0;
pub const AIR_TEMPERATURE_MIN: f64 = -60.0;
pub const AIR_TEMPERATURE_MAX: f64 = 50.0;
pub const WIND_SPEED_MIN: f64 = 0.0;
/// km/h
pub const WIND_SPEED_MAX: f64 = 90.0;
pub const CLOUD_OCTAL_MIN: f64 = 0.0;
pub const CLOUD_OCTAL_MAX: f64 = 8.0;

/// Surface pressure bounds and replacement value, hPa.
pub const PRESSURE_MIN: f64 = 700.0;
pub const PRESSURE_MAX: f64 = 1100.0;
pub const PRESSURE_NORMAL: f64 = 1013.25;

/// Default anthropogenic flux, W/m².
pub const DEFAULT_ANTHROPOGENIC_FLUX: f64 = 10.0;

/// Default depth of the sub-surface sensor, in meters.
pub const DEFAULT_SST_DEPTH: f64 = 0.4;
pub const SST_DEPTH_MIN: f64 = 0.01;
pub const SST_DEPTH_MAX: f64 = 1.4;

/// Solar constant, W/m².
pub const SOLAR_CONSTANT: f64 = 0.1367e4;

/// Solar constant of the diffuse radiation model, W/m².
pub const DIFFUSE_SOLAR_CONSTANT: f64 = 1366.0;

/// Earth mean radius and astronomical unit, km.
pub const EARTH_MEAN_RADIUS: f64 = 6371.01;
pub const ASTRONOMICAL_UNIT: f64 = 149_597_890.0;

/// Daytime cloud attenuation per octal (0 = clear, 8 = overcast).
pub const CLOUDS_DAY: [f64; 9] = [1.0, 0.97, 0.94, 0.89, 0.85, 0.80, 0.71, 0.65, 0.33];

/// Infrared flux slope per octal.
pub const CLOUDS_NIGHT_COEFF1: [f64; 9] = [3.79, 4.13, 4.13, 4.26, 4.38, 4.19, 4.395, 4.34, 4.51];

/// Infrared flux intercept per octal.
pub const CLOUDS_NIGHT_COEFF2: [f64; 9] = [
    214.7, 226.2, 234.8, 243.4, 250.7, 259.2, 270.9, 280.9, 298.4,
];

// Thermodynamics
pub const EPS1: f64 = 0.62194800221014;
pub const EPS2: f64 = 0.3780199778986;
/// Triple point of water, K.
pub const TRPL: f64 = 273.16;
/// 0 °C in K.
pub const TCDK: f64 = 273.15;
