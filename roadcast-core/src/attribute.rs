//! Named values attached to a collection of related tables.

use crate::error::{DataError, Result};
use serde::Serialize;

pub const SST_VALID: &str = "SST_VALID";
pub const AT_VALID: &str = "AT_VALID";
pub const TD_VALID: &str = "TD_VALID";
pub const WS_VALID: &str = "WS_VALID";
pub const SST_VALID_INTERPOLATED: &str = "SST_VALID_INTERPOLATED";
pub const AT_VALID_INTERPOLATED: &str = "AT_VALID_INTERPOLATED";
pub const TD_VALID_INTERPOLATED: &str = "TD_VALID_INTERPOLATED";
pub const WS_VALID_INTERPOLATED: &str = "WS_VALID_INTERPOLATED";
/// Hours from the first valid observation to the forecast start
pub const DELTA_T: &str = "DELTA_T";
/// Coupling flags, see [`NoObservation`]
pub const NO_OBS: &str = "NO_OBS";
/// Epoch seconds of the last controlled observation
pub const LAST_OBSERVATION: &str = "LAST_OBSERVATION";
pub const OBSERVATION_LENGTH: &str = "OBSERVATION_LENGTH";
pub const OBSERVATION_DELTA_T: &str = "OBSERVATION_DELTA_T";
pub const FORECAST_NB_TIMESTEPS: &str = "FORECAST_NB_TIMESTEPS";

/// Attributes declared on an observation collection.
pub const OBSERVATION_ATTRIBUTES: [&str; 11] = [
    SST_VALID,
    AT_VALID,
    TD_VALID,
    WS_VALID,
    SST_VALID_INTERPOLATED,
    AT_VALID_INTERPOLATED,
    TD_VALID_INTERPOLATED,
    WS_VALID_INTERPOLATED,
    DELTA_T,
    NO_OBS,
    LAST_OBSERVATION,
];

/// Attributes declared on a roadcast collection.
pub const ROADCAST_ATTRIBUTES: [&str; 3] =
    [OBSERVATION_LENGTH, OBSERVATION_DELTA_T, FORECAST_NB_TIMESTEPS];

/// A value held by an [`AttributeBag`].
#[derive(Debug, PartialEq, Clone, Serialize)]
pub enum AttributeValue {
    Real(f64),
    Count(usize),
    /// Per-row validity, 1.0 valid and 0.0 invalid
    Mask(Vec<f64>),
    Flags(Vec<bool>),
}

/// Observation coupling flags.
///
/// Index 0: no observation before the forecast start.
/// Index 1: less than the minimal coupling length after the forecast start.
/// Index 3: a single interpolated observation sample.
/// All set: no valid observation at all.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize)]
pub struct NoObservation(pub [bool; 4]);

impl NoObservation {
    pub const NONE: NoObservation = NoObservation([true, true, true, true]);
    pub const SINGLE: NoObservation = NoObservation([false, false, false, true]);

    pub fn coupling(no_cold_start: bool, short_coupling: bool) -> Self {
        NoObservation([no_cold_start, short_coupling, false, false])
    }

    pub fn to_vec(self) -> Vec<bool> {
        self.0.to_vec()
    }
}

/// Ordered store of declared attribute names and their values.
#[derive(Debug, PartialEq, Clone, Default, Serialize)]
pub struct AttributeBag {
    names: Vec<String>,
    values: Vec<Option<AttributeValue>>,
}

impl AttributeBag {
    /// A bag where the given names are declared but unset.
    pub fn new(names: &[&str]) -> Self {
        AttributeBag {
            names: names.iter().map(|n| n.to_string()).collect(),
            values: vec![None; names.len()],
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| DataError::InvalidAttribute {
                name: name.to_string(),
                valid: self.names.clone(),
            })
    }

    /// Value of a declared attribute, `None` while unset.
    pub fn get(&self, name: &str) -> Result<Option<&AttributeValue>> {
        let position = self.position(name)?;
        Ok(self.values[position].as_ref())
    }

    /// Set a declared attribute.
    pub fn set(&mut self, name: &str, value: AttributeValue) -> Result<()> {
        let position = self.position(name)?;
        self.values[position] = Some(value);
        Ok(())
    }

    /// Declare and set a new attribute.
    pub fn append(&mut self, name: &str, value: AttributeValue) -> Result<()> {
        if self.names.iter().any(|n| n == name) {
            return Err(DataError::DuplicateAttribute(name.to_string()));
        }
        self.names.push(name.to_string());
        self.values.push(Some(value));
        Ok(())
    }

    fn require(&self, name: &str, expected: &'static str) -> Result<&AttributeValue> {
        self.get(name)?.ok_or_else(|| DataError::AttributeType {
            name: name.to_string(),
            expected,
        })
    }

    pub fn real(&self, name: &str) -> Result<f64> {
        match self.require(name, "REAL")? {
            AttributeValue::Real(r) => Ok(*r),
            AttributeValue::Count(c) => Ok(*c as f64),
            _ => Err(DataError::AttributeType {
                name: name.to_string(),
                expected: "REAL",
            }),
        }
    }

    pub fn count(&self, name: &str) -> Result<usize> {
        match self.require(name, "COUNT")? {
            AttributeValue::Count(c) => Ok(*c),
            _ => Err(DataError::AttributeType {
                name: name.to_string(),
                expected: "COUNT",
            }),
        }
    }

    pub fn mask(&self, name: &str) -> Result<&[f64]> {
        match self.require(name, "MASK")? {
            AttributeValue::Mask(m) => Ok(m),
            _ => Err(DataError::AttributeType {
                name: name.to_string(),
                expected: "MASK",
            }),
        }
    }

    pub fn flags(&self, name: &str) -> Result<&[bool]> {
        match self.require(name, "FLAGS")? {
            AttributeValue::Flags(f) => Ok(f),
            _ => Err(DataError::AttributeType {
                name: name.to_string(),
                expected: "FLAGS",
            }),
        }
    }

    /// Coupling flags, all set when never computed.
    pub fn no_observation(&self) -> Result<NoObservation> {
        match self.get(NO_OBS)? {
            Some(AttributeValue::Flags(flags)) if flags.len() == 4 => {
                Ok(NoObservation([flags[0], flags[1], flags[2], flags[3]]))
            }
            Some(_) => Err(DataError::AttributeType {
                name: NO_OBS.to_string(),
                expected: "FLAGS",
            }),
            None => Ok(NoObservation::NONE),
        }
    }

    pub fn set_no_observation(&mut self, flags: NoObservation) -> Result<()> {
        self.set(NO_OBS, AttributeValue::Flags(flags.to_vec()))
    }
}
