// src/process/mod.rs

pub mod export;
pub mod types;

pub use export::write_series_parquet;
pub use types::{Metric, SeriesRow, SeriesTable};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

use crate::feed::DailyEntry;

/// The sorted set of distinct state codes seen across the whole feed,
/// regardless of any date filter.
pub type RegionSet = BTreeSet<String>;

/// Reshape the flat feed into a per-state time series.
///
/// Every entry contributes its state code to the region set; only entries
/// dated on or after `start_date` contribute rows. Rows are sorted by date
/// (state as tie-break), then each state's own subsequence gets the derived
/// `new_cases` column: `Some(0.0)` for the state's first date, afterwards
/// the pairwise difference of `cum_positive`, with `None` propagated when
/// either endpoint is unreported.
#[instrument(level = "info", skip(entries), fields(records = entries.len()))]
pub fn reshape(entries: &[DailyEntry], start_date: NaiveDate) -> Result<(SeriesTable, RegionSet)> {
    let mut regions = RegionSet::new();
    let mut rows = Vec::new();

    for entry in entries {
        let date = entry
            .day()
            .with_context(|| format!("record for {}", entry.state))?;
        regions.insert(entry.state.clone());

        if date >= start_date {
            rows.push(SeriesRow::from_entry(entry, date)?);
        }
    }

    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.state.cmp(&b.state)));

    // group row indices per state; the groups inherit the date order
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        groups.entry(row.state.clone()).or_default().push(i);
    }

    for indices in groups.values() {
        let mut prev: Option<f64> = None;
        for (pos, &i) in indices.iter().enumerate() {
            let cum = rows[i].value(Metric::CumPositive);
            rows[i].new_cases = if pos == 0 {
                Some(0.0)
            } else {
                match (cum, prev) {
                    (Some(today), Some(yesterday)) => Some(today - yesterday),
                    _ => None,
                }
            };
            prev = cum;
        }
    }

    debug!(rows = rows.len(), regions = regions.len(), "reshaped feed");
    Ok((SeriesTable { rows }, regions))
}
