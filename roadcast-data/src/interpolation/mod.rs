//! Resampling of irregular series onto the fixed engine time grid.
//!
//! The generic routine is piecewise linear; callers layer field-specific
//! conversions on top of it (see [`forecast`] and [`observation`]).

pub mod forecast;
pub mod observation;

use crate::error::{ProcessError, Result};
use roadcast_core::constants::TIME_STEP;
use roadcast_utils::arrays;

/// Interpolate `values` sampled at `time` on the [`TIME_STEP`] grid.
pub fn interpolate(time: &[f64], values: &[f64]) -> Result<Vec<f64>> {
    interpolate_with_step(time, values, TIME_STEP)
}

/// Interpolate onto `[time[0], time[last])` with the given step.
///
/// A value series shorter than `time` is padded with its own mean. A
/// longer one is rejected, as are fewer than two points and a step
/// larger than the first source spacing.
pub fn interpolate_with_step(time: &[f64], values: &[f64], step: f64) -> Result<Vec<f64>> {
    if values.len() > time.len() {
        return Err(ProcessError::Interpolation(format!(
            "{} values for {} time points",
            values.len(),
            time.len()
        )));
    }
    let mut y = values.to_vec();
    if y.len() < time.len() {
        let fill = arrays::mean(values);
        log::warn!(
            "Value series has {} entries for {} time points, padding with its mean {}",
            values.len(),
            time.len(),
            fill
        );
        y.resize(time.len(), fill);
    }
    if time.len() < 2 {
        return Err(ProcessError::Interpolation(
            "at least 2 time points are needed".to_string(),
        ));
    }
    let spacing = time[1] - time[0];
    if step > spacing {
        return Err(ProcessError::Interpolation(format!(
            "step {} is larger than the source spacing {}",
            step, spacing
        )));
    }

    let grid = arrays::arange(time[0], time[time.len() - 1], step);
    Ok(grid.iter().map(|&t| linear_at(time, &y, t)).collect())
}

/// Interpolate then round to the nearest integer, for categorical fields.
pub fn interpolate_rounded(time: &[f64], values: &[f64]) -> Result<Vec<f64>> {
    Ok(interpolate(time, values)?
        .into_iter()
        .map(f64::round)
        .collect())
}

/// Interpolate then floor, for validity masks.
pub fn interpolate_floored(time: &[f64], values: &[f64]) -> Result<Vec<f64>> {
    Ok(interpolate(time, values)?
        .into_iter()
        .map(f64::floor)
        .collect())
}

fn linear_at(x: &[f64], y: &[f64], t: f64) -> f64 {
    let hi = x.partition_point(|&v| v <= t).clamp(1, x.len() - 1);
    let lo = hi - 1;
    let dx = x[hi] - x[lo];
    if dx == 0.0 {
        return y[lo];
    }
    y[lo] + (y[hi] - y[lo]) / dx * (t - x[lo])
}
