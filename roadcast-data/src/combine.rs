//! Blending of the interpolated observations into the interpolated forecast.
//!
//! Over the period both cover, the forecast takes the observed values.
//! After the last observation the forecast relaxes back from the last
//! observed value to its own values with a four hour time constant.

use crate::error::Result;
use crate::physics::absolute_humidity;
use roadcast_core::attribute::{
    AT_VALID_INTERPOLATED, DELTA_T, TD_VALID_INTERPOLATED, WS_VALID_INTERPOLATED,
};
use roadcast_core::collection::SourceCollection;
use roadcast_core::constants::{RELAXATION_RATE, TIME_STEP, WIND_RELAXATION_STEPS};
use roadcast_core::schema::field;
use std::ops::Range;

/// Index mapping between the forecast and observation grids.
///
/// Forecast step `k` lines up with observation step `k + delta`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Alignment {
    delta: i64,
    observed: usize,
    length: usize,
}

impl Alignment {
    /// `delta_t` is the number of hours the observation starts before the forecast.
    pub fn new(delta_t: f64, observed: usize, length: usize) -> Self {
        Alignment {
            delta: (delta_t * 3600.0 / TIME_STEP).floor() as i64,
            observed,
            length,
        }
    }

    pub fn delta(&self) -> i64 {
        self.delta
    }

    /// Forecast indices that have an observation.
    pub fn window(&self) -> Range<usize> {
        let start = (-self.delta).max(0);
        let end = (self.observed as i64 - self.delta).clamp(0, self.length as i64);
        if end <= start {
            return 0..0;
        }
        start as usize..end as usize
    }

    /// First forecast index after the last observation, if inside the forecast.
    pub fn boundary(&self) -> Option<usize> {
        let boundary = self.observed as i64 - self.delta;
        (boundary >= 0 && boundary < self.length as i64).then_some(boundary as usize)
    }

    /// Observation index for a forecast index of the window.
    pub fn observation_index(&self, k: usize) -> usize {
        (k as i64 + self.delta) as usize
    }

    /// Observation indices covered by the window.
    pub fn observation_window(&self) -> Range<usize> {
        let window = self.window();
        if window.is_empty() {
            return 0..0;
        }
        self.observation_index(window.start)..self.observation_index(window.end - 1) + 1
    }
}

fn decay(steps: usize) -> f64 {
    (-(steps as f64) * TIME_STEP * RELAXATION_RATE).exp()
}

/// Overwrite the window with observed values.
fn overwrite(forecast: &mut [f64], observed: &[f64], alignment: &Alignment) {
    for k in alignment.window() {
        forecast[k] = observed[alignment.observation_index(k)];
    }
}

/// Exponential return from `last` at the boundary to the forecast, over `range`.
fn relax(forecast: &mut [f64], last: f64, boundary: usize, range: Range<usize>) {
    let correction = forecast[boundary] - last;
    if correction == 0.0 {
        return;
    }
    for k in range {
        forecast[k] -= decay(k - boundary) * correction;
    }
}

fn observations_valid(mask: &[f64], alignment: &Alignment) -> bool {
    mask.get(alignment.observation_window())
        .map_or(false, |window| window.iter().all(|v| *v != 0.0))
}

/// Air temperature, then dew point which stays below it.
fn combine_temperatures(
    forecast: &mut SourceCollection,
    observation: &SourceCollection,
    alignment: &Alignment,
) -> Result<()> {
    let observed = observation.interpolated();
    let attributes = observation.attributes();
    let table = forecast.interpolated_mut();
    let mut air = table.column(field::AT)?;

    if observations_valid(attributes.mask(AT_VALID_INTERPOLATED)?, alignment) {
        let observed_air = observed.column(field::AT)?;
        overwrite(&mut air, &observed_air, alignment);
        if let (Some(boundary), Some(&last)) = (alignment.boundary(), observed_air.last()) {
            let end = air.len();
            relax(&mut air, last, boundary, boundary..end);
        }
        table.set_column(field::AT, &air)?;
    } else {
        log::info!("Invalid air temperature observation, no coupling for AT");
    }

    if observations_valid(attributes.mask(TD_VALID_INTERPOLATED)?, alignment) {
        let mut dew = table.column(field::TD)?;
        let observed_dew = observed.column(field::TD)?;
        overwrite(&mut dew, &observed_dew, alignment);
        if let (Some(boundary), Some(&last)) = (alignment.boundary(), observed_dew.last()) {
            let end = dew.len();
            relax(&mut dew, last, boundary, boundary..end);
            for k in boundary..end {
                dew[k] = dew[k].min(air[k]);
            }
        }
        table.set_column(field::TD, &dew)?;
    } else {
        log::info!("Invalid dew point observation, no coupling for TD");
    }
    Ok(())
}

/// Wind speed relaxes over a fixed window; linearly in ratio when the
/// observation is below the forecast.
fn combine_wind(
    forecast: &mut SourceCollection,
    observation: &SourceCollection,
    alignment: &Alignment,
) -> Result<()> {
    if !observations_valid(observation.attributes().mask(WS_VALID_INTERPOLATED)?, alignment) {
        log::info!("Invalid wind speed observation, no coupling for WS");
        return Ok(());
    }
    let observed = observation.interpolated().column(field::WS)?;
    let table = forecast.interpolated_mut();
    let mut wind = table.column(field::WS)?;
    overwrite(&mut wind, &observed, alignment);

    if let (Some(boundary), Some(&last)) = (alignment.boundary(), observed.last()) {
        let end = (boundary + WIND_RELAXATION_STEPS).min(wind.len());
        let current = wind[boundary];
        if last < current {
            let reference = if current < 0.01 { 1.0 } else { current };
            let observed_value = if last == 0.0 { 1.0 } else { last };
            let ratio = observed_value / reference;
            let slope = (1.0 - ratio) * RELAXATION_RATE * TIME_STEP;
            for k in boundary..end {
                wind[k] *= slope * (k - boundary) as f64 + ratio;
            }
        } else if current < last {
            relax(&mut wind, last, boundary, boundary..end);
        }
    }
    table.set_column(field::WS, &wind)?;
    Ok(())
}

/// Precipitation rate scaled by the observed precipitation indicator and
/// road condition copied from the observation, over the window only.
fn combine_precipitation(
    forecast: &mut SourceCollection,
    observation: &SourceCollection,
    alignment: &Alignment,
) -> Result<()> {
    let table = forecast.interpolated_mut();
    let mut rate = table.column(field::QP)?;
    let mut condition = vec![1.0; rate.len()];
    let observed = observation.interpolated();
    if !alignment.window().is_empty() {
        let indicator = observed.column(field::PI)?;
        let observed_condition = observed.column(field::SC)?;
        for k in alignment.window() {
            let j = alignment.observation_index(k);
            rate[k] *= indicator[j];
            condition[k] = observed_condition[j];
        }
    }
    table.set_column(field::QP, &rate)?;
    table.append_column(field::SC, condition)?;
    Ok(())
}

fn append_absolute_humidity(forecast: &mut SourceCollection) -> Result<()> {
    let table = forecast.interpolated_mut();
    let dew = table.column(field::TD)?;
    let pressure = table.column(field::AP)?;
    let humidity = dew
        .iter()
        .zip(&pressure)
        .map(|(&td, &ap)| absolute_humidity(td, ap))
        .collect();
    table.append_column(field::AH, humidity)?;
    Ok(())
}

/// Couple the interpolated observation to the interpolated forecast.
///
/// Without an interpolated observation only the derived columns are added.
pub fn combine(forecast: &mut SourceCollection, observation: &SourceCollection) -> Result<()> {
    let observed = observation.interpolated().row_count();
    let length = forecast.interpolated().row_count();
    let delta_t = if observed > 0 {
        observation.attributes().real(DELTA_T)?
    } else {
        0.0
    };
    let alignment = Alignment::new(delta_t, observed, length);
    log::debug!(
        "Coupling {} observation steps with a shift of {} steps",
        observed,
        alignment.delta()
    );

    if alignment.window().is_empty() {
        log::info!("No observation overlaps the forecast, the forecast is not coupled");
    } else {
        combine_temperatures(forecast, observation, &alignment)?;
        combine_wind(forecast, observation, &alignment)?;
    }
    combine_precipitation(forecast, observation, &alignment)?;
    append_absolute_humidity(forecast)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadcast_core::attribute::{AttributeValue, OBSERVATION_ATTRIBUTES};
    use roadcast_core::table::TimeSeriesTable;

    fn forecast(length: usize, at: f64, td: f64, ws: f64) -> SourceCollection {
        let mut collection = SourceCollection::new(TimeSeriesTable::new(), &[]).unwrap();
        let table = collection.interpolated_mut();
        table.append_column(field::AT, vec![at; length]).unwrap();
        table.append_column(field::TD, vec![td; length]).unwrap();
        table.append_column(field::WS, vec![ws; length]).unwrap();
        table.append_column(field::QP, vec![2.0; length]).unwrap();
        table.append_column(field::AP, vec![101325.0; length]).unwrap();
        collection
    }

    fn observation(length: usize, at: f64, td: f64, ws: f64, delta_t: f64) -> SourceCollection {
        let mut collection =
            SourceCollection::new(TimeSeriesTable::new(), &OBSERVATION_ATTRIBUTES).unwrap();
        let table = collection.interpolated_mut();
        table.append_column(field::AT, vec![at; length]).unwrap();
        table.append_column(field::TD, vec![td; length]).unwrap();
        table.append_column(field::WS, vec![ws; length]).unwrap();
        table.append_column(field::PI, vec![0.0; length]).unwrap();
        table.append_column(field::SC, vec![0.0; length]).unwrap();
        let attributes = collection.attributes_mut();
        for name in [AT_VALID_INTERPOLATED, TD_VALID_INTERPOLATED, WS_VALID_INTERPOLATED] {
            attributes
                .set(name, AttributeValue::Mask(vec![1.0; length]))
                .unwrap();
        }
        attributes.set(DELTA_T, AttributeValue::Real(delta_t)).unwrap();
        collection
    }

    #[test]
    fn test_alignment() {
        let before = Alignment::new(2.0, 480, 1000);
        assert_eq!(before.delta(), 240);
        assert_eq!(before.window(), 0..240);
        assert_eq!(before.boundary(), Some(240));
        assert_eq!(before.observation_index(0), 240);
        assert_eq!(before.observation_window(), 240..480);

        let after = Alignment::new(-1.0, 240, 1000);
        assert_eq!(after.window(), 120..360);
        assert_eq!(after.observation_window(), 0..240);
        assert_eq!(after.boundary(), Some(360));

        let past = Alignment::new(10.0, 240, 1000);
        assert!(past.window().is_empty());
        assert_eq!(past.boundary(), None);
    }

    #[test]
    fn test_relaxation_boundary_and_time_constant() {
        // 24 h of forecast, observation from 2 h before to 2 h after the start
        let mut fc = forecast(2880, 5.0, 0.0, 5.0);
        let obs = observation(480, 3.0, -2.0, 5.0, 2.0);
        combine(&mut fc, &obs).unwrap();
        let at = fc.interpolated().column(field::AT).unwrap();
        assert_eq!(at[0], 3.0);
        assert_eq!(at[239], 3.0);
        assert!((at[240] - 3.0).abs() < 1e-12);
        let expected = 5.0 - 2.0 * (-1.0f64).exp();
        assert!((at[240 + 480] - expected).abs() < 1e-9);
        assert!((at[2879] - 5.0).abs() < 0.01);
        for pair in at[240..].windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_dew_point_stays_below_air() {
        let mut fc = forecast(2880, 5.0, 4.9, 5.0);
        let obs = observation(480, 3.0, 3.0, 5.0, 2.0);
        combine(&mut fc, &obs).unwrap();
        let table = fc.interpolated();
        let at = table.column(field::AT).unwrap();
        let td = table.column(field::TD).unwrap();
        assert!(td.iter().zip(&at).all(|(td, at)| td <= at));
        assert_eq!(td[0], 3.0);
    }

    #[test]
    fn test_invalid_mask_skips_field() {
        let mut fc = forecast(2880, 5.0, 0.0, 5.0);
        let mut obs = observation(480, 3.0, -2.0, 5.0, 2.0);
        let mut mask = vec![1.0; 480];
        mask[300] = 0.0;
        obs.attributes_mut()
            .set(AT_VALID_INTERPOLATED, AttributeValue::Mask(mask))
            .unwrap();
        combine(&mut fc, &obs).unwrap();
        let table = fc.interpolated();
        assert!(table.column(field::AT).unwrap().iter().all(|v| *v == 5.0));
        assert_eq!(table.column(field::TD).unwrap()[0], -2.0);
    }

    #[test]
    fn test_mask_outside_window_ignored() {
        let mut fc = forecast(2880, 5.0, 0.0, 5.0);
        let mut obs = observation(480, 3.0, -2.0, 5.0, 2.0);
        let mut mask = vec![1.0; 480];
        mask[10] = 0.0;
        obs.attributes_mut()
            .set(AT_VALID_INTERPOLATED, AttributeValue::Mask(mask))
            .unwrap();
        combine(&mut fc, &obs).unwrap();
        assert_eq!(fc.interpolated().column(field::AT).unwrap()[0], 3.0);
    }

    #[test]
    fn test_wind_relaxation() {
        let mut fc = forecast(2880, 5.0, 0.0, 4.0);
        let obs = observation(480, 5.0, 0.0, 2.0, 2.0);
        combine(&mut fc, &obs).unwrap();
        let ws = fc.interpolated().column(field::WS).unwrap();
        assert!((ws[240] - 2.0).abs() < 1e-12);
        assert!((ws[480] - 3.0).abs() < 1e-9);
        assert!((ws[719] - 4.0).abs() < 0.01);
        assert_eq!(ws[720], 4.0);

        let mut fc = forecast(2880, 5.0, 0.0, 2.0);
        let obs = observation(480, 5.0, 0.0, 4.0, 2.0);
        combine(&mut fc, &obs).unwrap();
        let ws = fc.interpolated().column(field::WS).unwrap();
        assert!((ws[240] - 4.0).abs() < 1e-12);
        assert!((ws[720] - 2.0).abs() < 1e-12);
        assert!(ws[719] > 2.0);
    }

    #[test]
    fn test_precipitation_and_condition() {
        let mut fc = forecast(1000, 5.0, 0.0, 5.0);
        let obs = observation(480, 5.0, 0.0, 5.0, 2.0);
        combine(&mut fc, &obs).unwrap();
        let table = fc.interpolated();
        let qp = table.column(field::QP).unwrap();
        let sc = table.column(field::SC).unwrap();
        assert_eq!(qp[0], 0.0);
        assert_eq!(qp[240], 2.0);
        assert_eq!(sc[239], 0.0);
        assert_eq!(sc[240], 1.0);
        assert_eq!(table.column(field::AH).unwrap().len(), 1000);
    }

    #[test]
    fn test_without_observation() {
        let mut fc = forecast(100, 5.0, 0.0, 5.0);
        let obs = SourceCollection::new(TimeSeriesTable::new(), &OBSERVATION_ATTRIBUTES).unwrap();
        combine(&mut fc, &obs).unwrap();
        let table = fc.interpolated();
        assert!(table.column(field::AT).unwrap().iter().all(|v| *v == 5.0));
        assert_eq!(table.column(field::SC).unwrap(), vec![1.0; 100]);
    }
}
