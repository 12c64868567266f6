//! Processing stages of a roadcast run.
//!
//! Quality control and interpolation of the atmospheric forecast and the
//! road station observations, their combination, the boundary with the
//! road surface model and the postprocessing of its output. [`pipeline`]
//! chains the stages.

pub mod combine;
pub mod engine;
pub mod error;
pub mod flux;
pub mod interpolation;
pub mod physics;
pub mod pipeline;
pub mod qa_qc;
pub mod roadcast;
pub mod round;
pub mod subsample;
pub mod sunshadow;
