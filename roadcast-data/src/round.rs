//! Rounding of the roadcast to the precision of each field.

use crate::error::Result;
use roadcast_core::schema::{field, header, FieldKind, HeaderValue, SourceSchema};
use roadcast_core::table::TimeSeriesTable;
use roadcast_utils::arrays::round_to;

fn rounded(values: &[f64], precision: u32) -> Vec<f64> {
    values.iter().map(|v| round_to(*v, precision)).collect()
}

/// Round the real fields of a roadcast table to their declared precision.
pub fn round_roadcast(table: &mut TimeSeriesTable, default_precision: u32) -> Result<()> {
    let levels = if table.has_column(field::TL) {
        table.column_index_group(field::TL)?.len()
    } else {
        0
    };
    let schema = SourceSchema::roadcast(levels);

    for descriptor in &schema.data {
        if !table.has_column(&descriptor.name) {
            continue;
        }
        let precision = descriptor.precision_or(default_precision);
        match descriptor.kind {
            FieldKind::Real => {
                let values = rounded(&table.column(&descriptor.name)?, precision);
                table.set_column(&descriptor.name, &values)?;
            }
            FieldKind::RealList => {
                let columns: Vec<Vec<f64>> = table
                    .multi_column(&descriptor.name)?
                    .iter()
                    .map(|c| rounded(c, precision))
                    .collect();
                table.set_multi_column(&descriptor.name, &columns)?;
            }
            _ => {}
        }
    }

    let depths = match table.header().get(header::VERTICAL_LEVELS) {
        Some(HeaderValue::RealList(depths)) => Some(depths.clone()),
        _ => None,
    };
    if let Some(depths) = depths {
        let precision = schema
            .header_field(header::VERTICAL_LEVELS)
            .map_or(default_precision, |d| d.precision_or(default_precision));
        table.set_header_value(
            header::VERTICAL_LEVELS,
            HeaderValue::RealList(rounded(&depths, precision)),
        )?;
    }
    Ok(())
}
