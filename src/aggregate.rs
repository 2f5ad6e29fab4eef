//! Group-by-count aggregation.
//!
//! An [`AggregationSpec`] names one or more grouping columns; running it over
//! a [`Dataset`] yields an [`AggregatedTable`] with one row per observed key
//! combination and the number of rows sharing it, ordered by ascending key.

use crate::data::{Dataset, Datum};
use crate::error::Result;
use std::collections::BTreeMap;
use tracing::debug;

/// Name of the derived column holding group sizes.
pub const COUNT_COLUMN: &str = "Count";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupByOptions {
    /// Discard rows whose key contains a missing value instead of giving
    /// them their own group.
    pub dropna: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationSpec {
    pub group_by: Vec<String>,
    pub options: GroupByOptions,
}

impl AggregationSpec {
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            group_by: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            options: GroupByOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GroupByOptions) -> Self {
        self.options = options;
        self
    }

    /// Human-readable name, e.g. `Survived×Sex`.
    pub fn name(&self) -> String {
        self.group_by.join("×")
    }

    /// Partition `data` by the grouping columns and count each partition.
    pub fn apply(&self, data: &Dataset) -> Result<AggregatedTable> {
        let indices = self
            .group_by
            .iter()
            .map(|c| data.column_index(c))
            .collect::<Result<Vec<_>>>()?;

        let mut counts: BTreeMap<Vec<Datum>, usize> = BTreeMap::new();
        for row in &data.rows {
            let key: Vec<Datum> = indices.iter().map(|&i| row[i].clone()).collect();
            if self.options.dropna && key.iter().any(Datum::is_missing) {
                continue;
            }
            *counts.entry(key).or_default() += 1;
        }

        let rows: Vec<GroupRow> = counts
            .into_iter()
            .map(|(key, count)| GroupRow { key, count })
            .collect();

        debug!(spec = %self.name(), groups = rows.len(), "aggregated");

        Ok(AggregatedTable {
            group_by: self.group_by.clone(),
            rows,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    pub key: Vec<Datum>,
    pub count: usize,
}

/// Result of a group-by-count: unique keys in ascending order with sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedTable {
    pub group_by: Vec<String>,
    pub rows: Vec<GroupRow>,
}

impl AggregatedTable {
    /// Sum of all group sizes.
    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    /// View as a plain table: the grouping columns followed by `Count`.
    pub fn to_dataset(&self) -> Dataset {
        let mut headers = self.group_by.clone();
        headers.push(COUNT_COLUMN.to_string());

        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut row = r.key.clone();
                row.push(Datum::Number(r.count as f64));
                row
            })
            .collect();

        Dataset::new(headers, rows)
    }
}

/// Run every spec over the same dataset, failing on the first schema error.
pub fn aggregate_all(data: &Dataset, specs: &[AggregationSpec]) -> Result<Vec<AggregatedTable>> {
    specs.iter().map(|spec| spec.apply(data)).collect()
}
