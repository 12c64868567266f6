/// Error types for the processing stages
use roadcast_core::error::DataError;
use roadcast_utils::error::VersionError;
use thiserror::Error;

/// Main error type for the preprocessing, engine and postprocessing stages
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Table, attribute or station access failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// A series cannot be resampled
    #[error("Interpolation error: {0}")]
    Interpolation(String),

    /// Forecast value outside what the model accepts
    #[error("Forecast error on '{field}': {reason}")]
    Forecast { field: String, reason: String },

    /// Observation series unusable
    #[error("Observation error: {0}")]
    Observation(String),

    /// Station configuration unusable
    #[error("Station error: {0}")]
    Station(String),

    /// Forecast and observation do not fit together
    #[error("Input error: {0}")]
    Input(String),

    /// Every observation was rejected
    #[error("No valid observation. Aborting")]
    NoObservation,

    /// Unsupported file version
    #[error(transparent)]
    Version(#[from] VersionError),

    /// The physics engine reported a failure or could not be run
    #[error("Fatal error in the physical model: {0}")]
    Engine(String),

    /// No output interval boundary inside the forecast
    #[error("Unable to determine the first time of roadcast!")]
    NoRoadcastStart,

    /// Date conversion failed
    #[error("Date error: {0}")]
    Date(String),
}

/// Type alias for Results using ProcessError
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Map date helper failures into [`ProcessError::Date`].
pub(crate) trait DateContext<T> {
    fn date(self) -> Result<T>;
}

impl<T> DateContext<T> for anyhow::Result<T> {
    fn date(self) -> Result<T> {
        self.map_err(|e| ProcessError::Date(e.to_string()))
    }
}
