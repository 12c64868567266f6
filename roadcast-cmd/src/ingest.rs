//! Reading forecast and observation CSV files into tables.
//!
//! A file starts with optional `# KEY,VALUE` lines carrying the header,
//! followed by a row of field names and the data rows.

use anyhow::{anyhow, Context};
use log::{info, warn};
use roadcast_core::schema::{HeaderValue, SourceSchema};
use roadcast_core::table::TimeSeriesTable;
use std::collections::BTreeMap;

/// Split the `#` preamble from the CSV body.
fn split_preamble(text: &str) -> (Vec<(&str, &str)>, String) {
    let mut entries = Vec::new();
    let mut body = String::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(entry) = trimmed.strip_prefix('#') {
            if let Some((key, value)) = entry.split_once(',') {
                entries.push((key.trim(), value.trim()));
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }
    (entries, body)
}

fn parse_header(
    entries: &[(&str, &str)],
    schema: &SourceSchema,
) -> anyhow::Result<BTreeMap<String, HeaderValue>> {
    let mut header = BTreeMap::new();
    for &(key, value) in entries {
        let parsed = match schema.header_field(key) {
            Some(descriptor) => descriptor.kind.parse_header(key, value)?,
            None => HeaderValue::Text(value.to_string()),
        };
        header.insert(key.to_string(), parsed);
    }
    Ok(header)
}

/// Parse CSV text laid out by `schema`.
///
/// Every schema field must have a column; other columns are ignored.
pub fn parse_table(text: &str, schema: &SourceSchema) -> anyhow::Result<TimeSeriesTable> {
    let (entries, body) = split_preamble(text);
    let mut table = TimeSeriesTable::from_schema(&schema.data);
    table.set_header(parse_header(&entries, schema)?)?;

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let names: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();

    let mut positions = Vec::with_capacity(schema.data.len());
    for descriptor in &schema.data {
        let position = names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(&descriptor.name))
            .ok_or_else(|| anyhow!("Missing column '{}' in the input file", descriptor.name))?;
        positions.push((descriptor, position));
    }
    for name in &names {
        if schema.data_field(name).is_none() && schema.data_field(&name.to_uppercase()).is_none() {
            warn!("Column '{}' is not used", name);
        }
    }

    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Cannot read data row {}", line + 1))?;
        let mut row = Vec::with_capacity(table.physical_width());
        for &(descriptor, position) in &positions {
            let cell = record.get(position).unwrap_or("");
            let value = descriptor
                .kind
                .parse_cell(&descriptor.name, cell)
                .with_context(|| format!("Data row {}", line + 1))?;
            row.push(Some(value));
        }
        table.append_row(&row)?;
    }
    Ok(table)
}

/// Read a CSV file laid out by `schema`.
pub fn read_table(path: &str, schema: &SourceSchema) -> anyhow::Result<TimeSeriesTable> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path))?;
    let table = parse_table(&text, schema).with_context(|| format!("Invalid file '{}'", path))?;
    info!("Read {} rows from {}", table.row_count(), path);
    Ok(table)
}
