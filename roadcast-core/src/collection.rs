//! Groups of tables describing one source at successive stages.

use crate::attribute::{AttributeBag, ROADCAST_ATTRIBUTES};
use crate::error::Result;
use crate::table::TimeSeriesTable;

/// Original, controlled and interpolated tables of one input source.
///
/// The original table is locked on construction; the controlled table
/// starts as an unlocked copy of it and the interpolated one starts empty.
#[derive(Debug, Clone)]
pub struct SourceCollection {
    original: TimeSeriesTable,
    controlled: TimeSeriesTable,
    interpolated: TimeSeriesTable,
    attributes: AttributeBag,
}

impl SourceCollection {
    pub fn new(mut original: TimeSeriesTable, attribute_names: &[&str]) -> Result<Self> {
        let controlled = original.working_copy();
        original.set_readonly(true)?;
        let mut interpolated = TimeSeriesTable::new();
        interpolated.set_header(original.header().clone())?;
        Ok(SourceCollection {
            original,
            controlled,
            interpolated,
            attributes: AttributeBag::new(attribute_names),
        })
    }

    pub fn original(&self) -> &TimeSeriesTable {
        &self.original
    }

    pub fn controlled(&self) -> &TimeSeriesTable {
        &self.controlled
    }

    pub fn controlled_mut(&mut self) -> &mut TimeSeriesTable {
        &mut self.controlled
    }

    pub fn set_controlled(&mut self, table: TimeSeriesTable) {
        self.controlled = table;
    }

    pub fn interpolated(&self) -> &TimeSeriesTable {
        &self.interpolated
    }

    pub fn interpolated_mut(&mut self) -> &mut TimeSeriesTable {
        &mut self.interpolated
    }

    pub fn set_interpolated(&mut self, table: TimeSeriesTable) {
        self.interpolated = table;
    }

    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeBag {
        &mut self.attributes
    }

    /// Mutable access to the controlled table and the attributes at once.
    pub fn controlled_and_attributes(&mut self) -> (&mut TimeSeriesTable, &mut AttributeBag) {
        (&mut self.controlled, &mut self.attributes)
    }

    /// Read the controlled table while filling the interpolated one.
    pub fn controlled_and_interpolated(&mut self) -> (&TimeSeriesTable, &mut TimeSeriesTable) {
        (&self.controlled, &mut self.interpolated)
    }
}

/// Roadcast at engine resolution and after subsampling.
#[derive(Debug, Clone)]
pub struct RoadcastCollection {
    raw: TimeSeriesTable,
    controlled: TimeSeriesTable,
    subsampled: TimeSeriesTable,
    attributes: AttributeBag,
}

impl RoadcastCollection {
    /// Lock `raw`, keep a working copy and an empty table with the same layout.
    pub fn new(mut raw: TimeSeriesTable) -> Result<Self> {
        let controlled = raw.working_copy();
        let subsampled = raw.empty_like();
        raw.set_readonly(true)?;
        Ok(RoadcastCollection {
            raw,
            controlled,
            subsampled,
            attributes: AttributeBag::new(&ROADCAST_ATTRIBUTES),
        })
    }

    pub fn raw(&self) -> &TimeSeriesTable {
        &self.raw
    }

    pub fn controlled(&self) -> &TimeSeriesTable {
        &self.controlled
    }

    pub fn controlled_mut(&mut self) -> &mut TimeSeriesTable {
        &mut self.controlled
    }

    pub fn subsampled(&self) -> &TimeSeriesTable {
        &self.subsampled
    }

    pub fn subsampled_mut(&mut self) -> &mut TimeSeriesTable {
        &mut self.subsampled
    }

    pub fn set_subsampled(&mut self, table: TimeSeriesTable) {
        self.subsampled = table;
    }

    pub fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeBag {
        &mut self.attributes
    }
}
