// src/plot/mod.rs

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};
use plotters::element::DashedPathElement;
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

use crate::process::SeriesTable;

const CHART_SIZE: (u32, u32) = (1000, 500);

/// Render one state's derived new-cases series as a PNG scatter chart.
///
/// Dashed vertical guides mark the first of each month inside the window,
/// with tick labels on the 1st and the 15th. Rows with an unreported
/// `new_cases` value are skipped, not drawn as zero.
pub fn render_new_cases(
    table: &SeriesTable,
    state: &str,
    window: (NaiveDate, NaiveDate),
    out_path: impl AsRef<Path>,
) -> Result<()> {
    let out_path = out_path.as_ref();
    let (start, mut end) = window;
    if end <= start {
        end = start + Duration::days(1);
    }

    let points = series_points(table, state, start, end);

    let mut y_min = 0.0f64;
    let mut y_max = 1.0f64;
    for &(_, v) in &points {
        y_min = y_min.min(v);
        y_max = y_max.max(v);
    }
    y_min *= 1.05;
    y_max *= 1.05;

    let root = BitMapBackend::new(out_path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("New Cases Reported in {}", state), ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(46)
        .y_label_area_size(64)
        .build_cartesian_2d(start..end, y_min..y_max)?;

    // month ticks are drawn by hand below, so the mesh keeps only the y side
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(0)
        .x_desc("Date")
        .y_desc("New Cases")
        .axis_desc_style(("sans-serif", 18))
        .label_style(("sans-serif", 14))
        .draw()?;

    chart.draw_series(month_starts(start, end).into_iter().map(|d| {
        DashedPathElement::new(vec![(d, y_min), (d, y_max)], 6, 4, BLACK.stroke_width(1))
    }))?;

    chart.draw_series(
        points
            .iter()
            .map(|&(d, v)| Circle::new((d, v), 3, BLUE.filled())),
    )?;

    let tick_font = ("sans-serif", 14).into_font();
    for day in tick_days(start, end) {
        let (x, y) = chart.backend_coord(&(day, y_min));
        root.draw(&Text::new(
            day.format("%b %d").to_string(),
            (x - 18, y + 8),
            tick_font.clone(),
        ))?;
    }

    root.present()
        .with_context(|| format!("writing {}", out_path.display()))?;
    info!(points = points.len(), path = %out_path.display(), "rendered chart");
    Ok(())
}

/// The state's plottable (date, new_cases) pairs inside the window.
fn series_points(
    table: &SeriesTable,
    state: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<(NaiveDate, f64)> {
    table
        .region(state)
        .filter(|row| row.date >= start && row.date <= end)
        .filter_map(|row| row.new_cases.map(|v| (row.date, v)))
        .collect()
}

/// First day of every month that falls inside `[start, end]`.
fn month_starts(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut cur = NaiveDate::from_ymd_opt(start.year(), start.month(), 1).unwrap();
    if cur < start {
        cur = next_month(cur);
    }
    while cur <= end {
        out.push(cur);
        cur = next_month(cur);
    }
    out
}

/// Tick label days: the 1st and the 15th of every month inside `[start, end]`.
fn tick_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut cur = NaiveDate::from_ymd_opt(start.year(), start.month(), 1).unwrap();
    while cur <= end {
        for day in [1, 15] {
            if let Some(d) = NaiveDate::from_ymd_opt(cur.year(), cur.month(), day) {
                if d >= start && d <= end {
                    out.push(d);
                }
            }
        }
        cur = next_month(cur);
    }
    out
}

fn next_month(d: NaiveDate) -> NaiveDate {
    let (year, month) = if d.month() == 12 {
        (d.year() + 1, 1)
    } else {
        (d.year(), d.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::reshape;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_starts_clip_to_the_window() {
        assert_eq!(
            month_starts(day(2020, 3, 5), day(2020, 6, 20)),
            vec![day(2020, 4, 1), day(2020, 5, 1), day(2020, 6, 1)]
        );
        assert_eq!(
            month_starts(day(2020, 3, 1), day(2020, 3, 31)),
            vec![day(2020, 3, 1)]
        );
        assert_eq!(month_starts(day(2020, 3, 2), day(2020, 3, 31)), vec![]);
    }

    #[test]
    fn month_starts_cross_year_boundaries() {
        assert_eq!(
            month_starts(day(2020, 11, 30), day(2021, 1, 15)),
            vec![day(2020, 12, 1), day(2021, 1, 1)]
        );
    }

    #[test]
    fn tick_days_hit_firsts_and_fifteenths() {
        assert_eq!(
            tick_days(day(2020, 3, 1), day(2020, 4, 20)),
            vec![
                day(2020, 3, 1),
                day(2020, 3, 15),
                day(2020, 4, 1),
                day(2020, 4, 15)
            ]
        );
        assert_eq!(
            tick_days(day(2020, 3, 10), day(2020, 4, 10)),
            vec![day(2020, 3, 15), day(2020, 4, 1)]
        );
    }

    #[test]
    fn points_skip_unreported_values_and_out_of_window_rows() -> Result<()> {
        let entries: Vec<crate::feed::DailyEntry> = serde_json::from_value(json!([
            {"state": "AZ", "date": 20200301, "positive": 10},
            {"state": "AZ", "date": 20200302, "positive": null},
            {"state": "AZ", "date": 20200303, "positive": 20},
            {"state": "AZ", "date": 20200501, "positive": 40},
            {"state": "WA", "date": 20200302, "positive": 7}
        ]))?;
        let (table, _) = reshape(&entries, day(2020, 3, 1))?;

        let points = series_points(&table, "AZ", day(2020, 3, 1), day(2020, 3, 31));
        // the null reading on 03-02 poisons both adjacent diffs, and 05-01
        // falls outside the window
        assert_eq!(points, vec![(day(2020, 3, 1), 0.0)]);
        Ok(())
    }
}
