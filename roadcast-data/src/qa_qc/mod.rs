//! Quality checks applied to the inputs before interpolation.
//!
//! Each check either removes rows from a controlled table, records
//! validity masks as attributes, or fails the run.

pub mod forecast;
pub mod input;
pub mod observation;
pub mod station;

use crate::error::{ProcessError, Result};
use roadcast_core::error::DataError;
use roadcast_core::table::TimeSeriesTable;

/// Delete rows, reporting an emptied table as a missing observation.
pub(crate) fn delete_observation_rows(table: &mut TimeSeriesTable, rows: &[usize]) -> Result<()> {
    match table.delete_rows(rows) {
        Err(DataError::EmptyMatrix) => Err(ProcessError::NoObservation),
        other => Ok(other?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emptied_observation_is_reported() {
        let mut table = TimeSeriesTable::with_columns(&["AT"]);
        table.append_row(&[Some(1.0)]).unwrap();
        table.append_row(&[Some(2.0)]).unwrap();
        delete_observation_rows(&mut table, &[0]).unwrap();
        assert!(matches!(
            delete_observation_rows(&mut table, &[0]),
            Err(ProcessError::NoObservation)
        ));
    }
}
