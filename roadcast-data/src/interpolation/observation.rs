//! Observation series onto the engine grid.

use super::{interpolate, interpolate_floored, interpolate_rounded};
use crate::error::{ProcessError, Result};
use roadcast_core::attribute::{
    AttributeValue, NoObservation, AT_VALID, AT_VALID_INTERPOLATED, SST_VALID,
    SST_VALID_INTERPOLATED, TD_VALID, TD_VALID_INTERPOLATED, WS_VALID, WS_VALID_INTERPOLATED,
};
use roadcast_core::collection::SourceCollection;
use roadcast_core::constants::{KMH_TO_MS, TIME_STEP};
use roadcast_core::schema::field;
use roadcast_utils::arrays;

/// Road condition code reported for a dry road.
const DRY_ROAD_CODE: f64 = 33.0;

/// Fill the interpolated observation table and the interpolated masks.
///
/// A grid of a single sample only sets the coupling flags; no sample at
/// all is fatal.
pub fn interpolate_observation(observation: &mut SourceCollection) -> Result<()> {
    let time = observation.controlled().column(field::TIME)?;
    let grid = match (time.first(), time.last()) {
        (Some(&first), Some(&last)) => arrays::arange(first, last, TIME_STEP),
        _ => Vec::new(),
    };

    match grid.len() {
        0 => {
            observation
                .attributes_mut()
                .set_no_observation(NoObservation::NONE)?;
            return Err(ProcessError::NoObservation);
        }
        1 => {
            observation
                .attributes_mut()
                .set_no_observation(NoObservation::SINGLE)?;
            log::info!("Only one observation is usable, the forecast is not coupled");
            return Ok(());
        }
        _ => {}
    }

    let hours: Vec<f64> = grid
        .iter()
        .map(|t| t / 3600.0 - 24.0 * (t * 1.1574e-5).trunc())
        .collect();

    let (controlled, interpolated) = observation.controlled_and_interpolated();
    let wind: Vec<f64> = controlled
        .column(field::WS)?
        .iter()
        .map(|ws| ws * KMH_TO_MS)
        .collect();
    let precipitation: Vec<f64> = controlled
        .column(field::PI)?
        .iter()
        .map(|&pi| if pi == 1.0 { 1.0 } else { 0.0 })
        .collect();
    let wet: Vec<f64> = controlled
        .column(field::SC)?
        .iter()
        .map(|&sc| if sc == DRY_ROAD_CODE { 0.0 } else { 1.0 })
        .collect();

    interpolated.append_column(field::TIME, hours)?;
    interpolated.append_column(field::AT, interpolate(&time, &controlled.column(field::AT)?)?)?;
    interpolated.append_column(field::TD, interpolate(&time, &controlled.column(field::TD)?)?)?;
    interpolated.append_column(field::WS, interpolate(&time, &wind)?)?;
    interpolated.append_column(field::ST, interpolate(&time, &controlled.column(field::ST)?)?)?;
    interpolated.append_column(field::SST, interpolate(&time, &controlled.column(field::SST)?)?)?;
    interpolated.append_column(field::PI, interpolate_rounded(&time, &precipitation)?)?;
    interpolated.append_column(field::SC, interpolate_rounded(&time, &wet)?)?;

    let attributes = observation.attributes_mut();
    for (mask, target) in [
        (SST_VALID, SST_VALID_INTERPOLATED),
        (AT_VALID, AT_VALID_INTERPOLATED),
        (TD_VALID, TD_VALID_INTERPOLATED),
        (WS_VALID, WS_VALID_INTERPOLATED),
    ] {
        let values = interpolate_floored(&time, attributes.mask(mask)?)?;
        attributes.set(target, AttributeValue::Mask(values))?;
    }
    log::debug!("Observation interpolated on {} steps", grid.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadcast_core::attribute::{NO_OBS, OBSERVATION_ATTRIBUTES};
    use roadcast_core::table::TimeSeriesTable;

    fn observation(times: &[f64]) -> SourceCollection {
        let mut table = TimeSeriesTable::with_columns(&[
            field::TIME,
            field::AT,
            field::TD,
            field::PI,
            field::WS,
            field::SC,
            field::ST,
            field::SST,
        ]);
        for (i, t) in times.iter().enumerate() {
            let sc = if i == 0 { 33.0 } else { 34.0 };
            table
                .append_row(&[
                    Some(*t),
                    Some(i as f64),
                    Some(-1.0),
                    Some(2.0),
                    Some(18.0),
                    Some(sc),
                    Some(1.0),
                    Some(4.0),
                ])
                .unwrap();
        }
        let mut collection = SourceCollection::new(table, &OBSERVATION_ATTRIBUTES).unwrap();
        let ones = AttributeValue::Mask(vec![1.0; times.len()]);
        for name in [SST_VALID, AT_VALID, WS_VALID] {
            collection.attributes_mut().set(name, ones.clone()).unwrap();
        }
        let mut td = vec![1.0; times.len()];
        td[times.len() - 1] = 0.0;
        collection
            .attributes_mut()
            .set(TD_VALID, AttributeValue::Mask(td))
            .unwrap();
        collection
    }

    #[test]
    fn test_observation_interpolation() {
        let mut collection = observation(&[72000.0, 72600.0, 73200.0]);
        interpolate_observation(&mut collection).unwrap();
        let table = collection.interpolated();
        assert_eq!(table.row_count(), 40);
        assert!((table.column(field::TIME).unwrap()[0] - 20.0).abs() < 1e-9);
        assert!((table.column(field::AT).unwrap()[10] - 0.5).abs() < 1e-9);
        assert!((table.column(field::WS).unwrap()[0] - 5.0).abs() < 1e-4);
        assert!(table.column(field::PI).unwrap().iter().all(|v| *v == 0.0));
        // dry at the first sample only
        let sc = table.column(field::SC).unwrap();
        assert_eq!(sc[0], 0.0);
        assert_eq!(sc[39], 1.0);

        let td = collection.attributes().mask(TD_VALID_INTERPOLATED).unwrap();
        assert_eq!(td[20], 1.0);
        assert_eq!(td[21], 0.0);
        assert_eq!(
            collection.attributes().mask(AT_VALID_INTERPOLATED).unwrap(),
            vec![1.0; 40].as_slice()
        );
    }

    #[test]
    fn test_time_of_day_wraps() {
        let mut collection = observation(&[90000.0, 90030.0, 90060.0]);
        interpolate_observation(&mut collection).unwrap();
        let time = collection.interpolated().column(field::TIME).unwrap();
        assert!((time[0] - 1.0).abs() < 1e-9);
        assert!((time[1] - (1.0 + 30.0 / 3600.0)).abs() < 1e-9);
    }

    #[test]
    fn test_single_sample_is_not_fatal() {
        let mut collection = observation(&[0.0, 20.0]);
        interpolate_observation(&mut collection).unwrap();
        assert_eq!(
            collection.attributes().no_observation().unwrap(),
            NoObservation::SINGLE
        );
        assert_eq!(collection.interpolated().row_count(), 0);
    }

    #[test]
    fn test_no_sample_is_fatal() {
        let mut collection = observation(&[0.0]);
        let err = interpolate_observation(&mut collection).unwrap_err();
        assert!(matches!(err, ProcessError::NoObservation));
        assert_eq!(
            collection.attributes().get(NO_OBS).unwrap(),
            Some(&AttributeValue::Flags(vec![true; 4]))
        );
    }
}
