//! Shading of the solar flux by the visible horizon around the station.
//!
//! While the sun sits at or below the horizon in its direction, the basic
//! method drops the solar flux to zero and the enhanced method keeps its
//! diffuse part only.

use crate::error::{ProcessError, Result};
use crate::physics::{diffuse_component, sun_position};
use roadcast_core::config::SunShadowMethod;
use roadcast_core::station::HorizonPoint;
use roadcast_utils::arrays;

/// Horizon sampled at a uniform azimuth step over the full circle.
#[derive(Debug, PartialEq, Clone)]
pub struct Horizon {
    /// `(azimuth, elevation)` by increasing azimuth, from 0 to 360 degrees
    points: Vec<(f64, f64)>,
    step: f64,
}

fn horizon_error(reason: &str) -> ProcessError {
    ProcessError::Station(format!("invalid visible horizon, {}", reason))
}

impl Horizon {
    /// A horizon given at only one of 0 or 360 degrees is closed with the
    /// same elevation at the other end.
    pub fn new(points: &[HorizonPoint]) -> Result<Horizon> {
        if points.len() < 2 {
            return Err(horizon_error("at least two points are needed"));
        }
        if points.iter().any(|p| {
            !p.azimuth.is_finite()
                || !p.elevation.is_finite()
                || !(0.0..=360.0).contains(&p.azimuth)
        }) {
            return Err(horizon_error("azimuths must lie in [0, 360] degrees"));
        }
        let mut sorted: Vec<(f64, f64)> = points.iter().map(|p| (p.azimuth, p.elevation)).collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (first, last) = (sorted[0], sorted[sorted.len() - 1]);
        match (first.0 == 0.0, last.0 == 360.0) {
            (true, true) => {}
            (true, false) => sorted.push((360.0, first.1)),
            (false, true) => sorted.insert(0, (0.0, last.1)),
            (false, false) => return Err(horizon_error("no value at 0 and/or 360 degrees")),
        }

        let step = sorted[1].0 - sorted[0].0;
        let azimuths: Vec<f64> = sorted.iter().map(|p| p.0).collect();
        if step <= 0.0 || !arrays::is_uniform(&azimuths) {
            return Err(horizon_error("the azimuth step must be uniform"));
        }
        Ok(Horizon {
            points: sorted,
            step,
        })
    }

    /// Elevation of the horizon toward `azimuth`, linearly interpolated.
    pub fn elevation_at(&self, azimuth: f64) -> f64 {
        let normalized = (azimuth.rem_euclid(360.0) - self.points[0].0) / self.step;
        let i = (normalized.floor().max(0.0) as usize).min(self.points.len() - 2);
        let z = normalized - i as f64;
        let (below, above) = (self.points[i].1, self.points[i + 1].1);
        below + z * (above - below)
    }
}

/// Solar flux at each of `times` corrected for the horizon.
pub fn shade_solar_flux(
    times: &[f64],
    flux: &[f64],
    latitude: f64,
    longitude: f64,
    horizon: &Horizon,
    method: SunShadowMethod,
) -> Vec<f64> {
    let mut shaded = 0;
    let corrected = times
        .iter()
        .zip(flux)
        .map(|(&time, &global)| {
            let (azimuth, elevation) = sun_position(time, latitude, longitude);
            if elevation > horizon.elevation_at(azimuth) {
                return global;
            }
            shaded += 1;
            match method {
                SunShadowMethod::Basic => 0.0,
                SunShadowMethod::Enhanced => diffuse_component(global, elevation),
            }
        })
        .collect();
    log::debug!("Sun behind the horizon for {} of {} steps", shaded, times.len());
    corrected
}
