//! Reduction of the roadcast to one row every 20 minutes.

use crate::error::{DateContext, ProcessError, Result};
use roadcast_core::attribute::FORECAST_NB_TIMESTEPS;
use roadcast_core::collection::RoadcastCollection;
use roadcast_core::config::RunConfig;
use roadcast_core::constants::{MINUTES_FOR_OUTPUT, ROAD_CONDITION_WINDOW_SECONDS, TIME_STEP};
use roadcast_core::schema::{field, header, HeaderValue};
use roadcast_utils::dates;
use std::collections::BTreeMap;

const SECONDS_FOR_OUTPUT: i64 = MINUTES_FOR_OUTPUT as i64 * 60;

fn on_output_interval(hour: f64) -> bool {
    (hour * 3600.0).round() as i64 % SECONDS_FOR_OUTPUT == 0
}

/// Most frequent positive road condition code.
///
/// Codes are rounded to the nearest integer. Ties go to the lowest code.
/// Codes that are not finite or beyond the `i32` range are ignored, and a
/// window without any valid code gives 1.
pub fn majority_code(codes: &[f64]) -> f64 {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &code in codes {
        let code = code.round();
        if !code.is_finite() || !(1.0..=i32::MAX as f64).contains(&code) {
            continue;
        }
        *counts.entry(code as i64).or_insert(0) += 1;
    }
    let mut best: Option<(i64, usize)> = None;
    for (&code, &count) in &counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((code, count));
        }
    }
    best.map_or(1.0, |(code, _)| code as f64)
}

/// First roadcast time and the index where the scan for output rows starts.
///
/// An explicit start date is used as is. Otherwise the first output
/// interval boundary after the last observation is taken.
pub fn first_roadcast(
    roadcast: &RoadcastCollection,
    last_observation: f64,
    config: &RunConfig,
) -> Result<(f64, usize)> {
    if let Some(start) = &config.roadcast_start_date {
        return Ok((dates::parse_iso8601(start).date()?, 0));
    }
    let table = roadcast.controlled();
    let timesteps = roadcast.attributes().count(FORECAST_NB_TIMESTEPS)?;
    let hours = table.column(field::HH)?;
    let times = table.column(field::ROADCAST_TIME)?;
    let found = (0..timesteps.min(times.len()))
        .find(|&i| times[i] > last_observation && on_output_interval(hours[i]));
    match found {
        Some(i) => {
            log::info!(
                "Roadcast start date set to: '{}'",
                dates::format_iso8601(times[i]).date()?
            );
            Ok((times[i], i))
        }
        None => Err(ProcessError::NoRoadcastStart),
    }
}

/// Fill the subsampled table and set its `FIRST_ROADCAST` header.
pub fn subsample(
    roadcast: &mut RoadcastCollection,
    last_observation: f64,
    config: &RunConfig,
) -> Result<()> {
    let (start, first_index) = first_roadcast(roadcast, last_observation, config)?;
    let start_text = dates::format_iso8601(start).date()?;
    log::info!("Output file roadcast start date: '{}'", start_text);

    let controlled = roadcast.controlled();
    let timesteps = roadcast
        .attributes()
        .count(FORECAST_NB_TIMESTEPS)?
        .min(controlled.row_count());
    let hours = controlled.column(field::HH)?;
    let times = controlled.column(field::ROADCAST_TIME)?;
    let conditions = controlled.column(field::RC)?;
    let rc_index = controlled.column_index_group(field::RC)?[0];
    let half_window = (ROAD_CONDITION_WINDOW_SECONDS / TIME_STEP) as usize;

    let mut rows = Vec::new();
    for i in first_index..timesteps {
        if !on_output_interval(hours[i]) || times[i] < start {
            continue;
        }
        let window = i.saturating_sub(half_window)..(i + half_window).min(timesteps);
        let mut row = controlled.matrix()[i].clone();
        row[rc_index] = majority_code(&conditions[window]);
        rows.push(row);
    }
    log::debug!("{} roadcast rows kept out of {}", rows.len(), timesteps);

    let subsampled = roadcast.subsampled_mut();
    subsampled.set_matrix(rows)?;
    subsampled.set_header_value(header::FIRST_ROADCAST, HeaderValue::Text(start_text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadcast_core::attribute::AttributeValue;
    use roadcast_core::table::TimeSeriesTable;

    /// 2004-01-30T00:00Z
    const START: f64 = 1_075_420_800.0;

    fn roadcast(length: usize, conditions: Vec<f64>) -> RoadcastCollection {
        let mut table = TimeSeriesTable::with_columns(&[field::ROADCAST_TIME, field::HH]);
        for i in 0..length {
            table
                .append_row(&[Some(START + 30.0 * i as f64), Some(30.0 * i as f64 / 3600.0)])
                .unwrap();
        }
        table.append_column(field::RC, conditions).unwrap();
        table.append_column(field::AT, vec![1.5; length]).unwrap();
        let mut collection = RoadcastCollection::new(table).unwrap();
        collection
            .attributes_mut()
            .set(FORECAST_NB_TIMESTEPS, AttributeValue::Count(length))
            .unwrap();
        collection
    }

    #[test]
    fn test_majority_code() {
        assert_eq!(majority_code(&[1.0, 1.0, 2.0, 3.0, 3.0, 3.0]), 3.0);
        assert_eq!(majority_code(&[1.0, 1.0, 2.0, 2.0]), 1.0);
        assert_eq!(majority_code(&[0.0, 0.0, 4.0]), 4.0);
        assert_eq!(majority_code(&[0.0, f64::NAN]), 1.0);
        assert_eq!(majority_code(&[]), 1.0);
    }

    #[test]
    fn test_majority_code_ignores_out_of_range() {
        assert_eq!(majority_code(&[1.0, f64::INFINITY]), 1.0);
        assert_eq!(majority_code(&[1e300, 1e300, 2.0]), 2.0);
        assert_eq!(majority_code(&[1e12, 1e12, f64::NEG_INFINITY]), 1.0);
        assert_eq!(majority_code(&[-5.0, -5.0, 6.0]), 6.0);
    }

    #[test]
    fn test_majority_code_rounds() {
        assert_eq!(majority_code(&[2.4, 2.6, 3.2]), 3.0);
        assert_eq!(majority_code(&[0.6, 1.4, 4.5]), 1.0);
    }

    #[test]
    fn test_start_after_last_observation() {
        let collection = roadcast(480, vec![1.0; 480]);
        // last observation at 00:05, next 20 minute boundary is 00:20
        let (start, index) =
            first_roadcast(&collection, START + 300.0, &RunConfig::default()).unwrap();
        assert_eq!(start, START + 1200.0);
        assert_eq!(index, 40);
    }

    #[test]
    fn test_explicit_start_date() {
        let collection = roadcast(480, vec![1.0; 480]);
        let config = RunConfig {
            roadcast_start_date: Some("2004-01-30T01:00Z".to_string()),
            ..RunConfig::default()
        };
        let (start, index) = first_roadcast(&collection, START, &config).unwrap();
        assert_eq!(start, START + 3600.0);
        assert_eq!(index, 0);
    }

    #[test]
    fn test_no_start_in_horizon() {
        let collection = roadcast(30, vec![1.0; 30]);
        let err = first_roadcast(&collection, START + 60.0, &RunConfig::default()).unwrap_err();
        assert!(matches!(err, ProcessError::NoRoadcastStart));
    }

    #[test]
    fn test_subsample_rows_and_vote() {
        // two hours, wet (2) around 01:00
        let mut conditions = vec![1.0; 240];
        for rc in conditions.iter_mut().take(130).skip(100) {
            *rc = 2.0;
        }
        let mut collection = roadcast(240, conditions);
        subsample(&mut collection, START - 60.0, &RunConfig::default()).unwrap();
        let table = collection.subsampled();
        assert_eq!(table.row_count(), 6);
        let times = table.column(field::ROADCAST_TIME).unwrap();
        assert_eq!(times[0], START);
        assert_eq!(times[5], START + 6000.0);
        let rc = table.column(field::RC).unwrap();
        // window [100, 140) of the 01:00 row holds 30 wet values
        assert_eq!(rc, vec![1.0, 1.0, 1.0, 2.0, 1.0, 1.0]);
        assert_eq!(table.column(field::AT).unwrap(), vec![1.5; 6]);
        assert_eq!(
            table.header_text(header::FIRST_ROADCAST).as_deref(),
            Some("2004-01-30T00:00Z")
        );
    }

    #[test]
    fn test_subsample_window_at_end() {
        // dry surface, then snow over the last ten minutes
        let mut conditions = vec![1.0; 210];
        for rc in conditions.iter_mut().skip(190) {
            *rc = 3.0;
        }
        let mut collection = roadcast(210, conditions);
        subsample(&mut collection, START - 60.0, &RunConfig::default()).unwrap();
        let table = collection.subsampled();
        assert_eq!(table.row_count(), 6);
        let times = table.column(field::ROADCAST_TIME).unwrap();
        assert_eq!(times[5], START + 6000.0);
        // the last window is cut to [180, 210) and holds 20 snow codes
        let rc = table.column(field::RC).unwrap();
        assert_eq!(rc, vec![1.0, 1.0, 1.0, 1.0, 1.0, 3.0]);
    }
}
