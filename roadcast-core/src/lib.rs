//! Core types for road weather forecast processing.
//!
//! Tables, their groupings per source, typed field schemas, station
//! metadata and the run configuration shared by every stage.

pub mod attribute;
pub mod collection;
pub mod config;
pub mod constants;
pub mod error;
pub mod schema;
pub mod station;
pub mod table;
