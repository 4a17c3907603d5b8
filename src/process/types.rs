// src/process/types.rs

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::feed::DailyEntry;

/// The canonical output columns and the feed field each one is read from.
///
/// This table is part of the output contract: column order here is column
/// order everywhere downstream (the parquet snapshot included).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    CumPositive,
    CumTotal,
    CurrHosp,
    CumHosp,
    CurrIcu,
    CumIcu,
    CurrVent,
    CumVent,
    CumDeath,
    NewDeath,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::CumPositive,
        Metric::CumTotal,
        Metric::CurrHosp,
        Metric::CumHosp,
        Metric::CurrIcu,
        Metric::CumIcu,
        Metric::CurrVent,
        Metric::CumVent,
        Metric::CumDeath,
        Metric::NewDeath,
    ];

    /// Output column name.
    pub fn column(self) -> &'static str {
        match self {
            Metric::CumPositive => "cum_positive",
            Metric::CumTotal => "cum_total",
            Metric::CurrHosp => "curr_hosp",
            Metric::CumHosp => "cum_hosp",
            Metric::CurrIcu => "curr_icu",
            Metric::CumIcu => "cum_icu",
            Metric::CurrVent => "curr_vent",
            Metric::CumVent => "cum_vent",
            Metric::CumDeath => "cum_death",
            Metric::NewDeath => "new_death",
        }
    }

    /// Field name in the source feed.
    pub fn source_field(self) -> &'static str {
        match self {
            Metric::CumPositive => "positive",
            Metric::CumTotal => "total",
            Metric::CurrHosp => "hospitalizedCurrently",
            Metric::CumHosp => "hospitalizedCumulative",
            Metric::CurrIcu => "inIcuCurrently",
            Metric::CumIcu => "inIcuCumulative",
            Metric::CurrVent => "onVentilatorCurrently",
            Metric::CumVent => "onVentilatorCumulative",
            Metric::CumDeath => "death",
            Metric::NewDeath => "deathIncrease",
        }
    }
}

/// One (state, date) row of the reshaped table. `None` cells are unreported
/// readings, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub state: String,
    pub date: NaiveDate,
    values: [Option<f64>; Metric::ALL.len()],
    /// Derived per-day case count; filled by the reshape pass.
    pub new_cases: Option<f64>,
}

impl SeriesRow {
    /// Extract the canonical metrics of one qualifying feed entry.
    pub(crate) fn from_entry(entry: &DailyEntry, date: NaiveDate) -> Result<Self> {
        let mut values = [None; Metric::ALL.len()];
        for metric in Metric::ALL {
            values[metric as usize] = entry
                .metric(metric.source_field())
                .with_context(|| format!("extracting {}", metric.column()))?;
        }
        Ok(SeriesRow {
            state: entry.state.clone(),
            date,
            values,
            new_cases: None,
        })
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values[metric as usize]
    }
}

/// The reshaped per-state time series, ordered primarily by date with the
/// state code as tie-break. For a fixed state, rows are strictly ascending
/// by date.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    pub(crate) rows: Vec<SeriesRow>,
}

impl SeriesTable {
    pub fn rows(&self) -> &[SeriesRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One state's rows, in ascending date order.
    pub fn region<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a SeriesRow> {
        self.rows.iter().filter(move |row| row.state == state)
    }
}
