//! Writing tables as CSV, in the layout read by [`crate::ingest`].

use anyhow::Context;
use log::info;
use roadcast_core::schema::{field, FieldDescriptor, FieldKind, SourceSchema};
use roadcast_core::table::TimeSeriesTable;

/// Layout of the interpolated forecast written by `preprocess`.
pub fn interpolated_forecast_schema() -> SourceSchema {
    use FieldKind::*;
    SourceSchema {
        header: Vec::new(),
        data: vec![
            FieldDescriptor::new(field::FORECAST_TIME, Date),
            FieldDescriptor::new(field::TIME, Real).with_precision(4),
            FieldDescriptor::new(field::QP, Real).with_precision(10),
            FieldDescriptor::new(field::AH, Real).with_precision(6),
        ],
    }
}

/// Render `table` as CSV.
///
/// Columns absent from `schema` are written as reals with the default
/// precision. A composite column `TL` of `n` sub-columns is written as
/// `TL1` to `TLn`.
pub fn format_table(
    table: &TimeSeriesTable,
    schema: &SourceSchema,
    default_precision: u32,
) -> anyhow::Result<String> {
    let mut out = String::new();
    for (key, value) in table.header() {
        let precision = schema
            .header_field(key)
            .map_or(default_precision, |d| d.precision_or(default_precision));
        out.push_str(&format!("# {},{}\n", key, value.format(precision)));
    }

    let mut columns = Vec::new();
    let mut names = Vec::new();
    for name in table.column_names() {
        let (kind, precision) = schema
            .data_field(name)
            .map_or((FieldKind::Real, default_precision), |d| {
                (d.kind, d.precision_or(default_precision))
            });
        let group = table.column_index_group(name)?;
        if group.len() == 1 {
            names.push(name.clone());
        } else {
            names.extend((1..=group.len()).map(|i| format!("{}{}", name, i)));
        }
        columns.extend(group.iter().map(|&index| (index, kind, precision)));
    }

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&names)?;
    for row in table.matrix() {
        wtr.write_record(
            columns
                .iter()
                .map(|&(index, kind, precision)| kind.format_cell(row[index], precision)),
        )?;
    }
    let body = wtr.into_inner().context("Failed to flush CSV writer")?;
    out.push_str(&String::from_utf8(body)?);
    Ok(out)
}

/// Write `table` to `path` as CSV.
pub fn write_table(
    path: &str,
    table: &TimeSeriesTable,
    schema: &SourceSchema,
    default_precision: u32,
) -> anyhow::Result<()> {
    let text = format_table(table, schema, default_precision)?;
    std::fs::write(path, text).with_context(|| format!("Failed to write '{}'", path))?;
    info!("Wrote {} rows to {}", table.row_count(), path);
    Ok(())
}
