// src/feed/mod.rs

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};

/// One state's one day of reporting, exactly as it appears in the
/// covidtracking.com daily feed.
///
/// The feed carries dozens of fields per record and grows new ones over
/// time, so everything beyond the row key is kept as an open map and read
/// through [`DailyEntry::metric`].
#[derive(Debug, Clone, Deserialize)]
pub struct DailyEntry {
    pub state: String,
    /// Integer day stamp, `YYYYMMDD`.
    pub date: u32,
    #[serde(flatten)]
    pub metrics: Map<String, Value>,
}

impl DailyEntry {
    /// Reporting date of this entry. Fails on a malformed day stamp.
    pub fn day(&self) -> Result<NaiveDate> {
        parse_day_stamp(self.date)
    }

    /// Read one feed field as a numeric reading.
    ///
    /// Absent or JSON-null fields are `Ok(None)` — absence is data here,
    /// not an error. Any other non-numeric value in a mapped field is a
    /// malformed record.
    pub fn metric(&self, field: &str) -> Result<Option<f64>> {
        match self.metrics.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) => Ok(Some(v)),
                None => bail!("{}/{}: {} out of f64 range", self.state, self.date, field),
            },
            Some(other) => bail!(
                "{}/{}: expected number for {}, got {}",
                self.state,
                self.date,
                field,
                other
            ),
        }
    }
}

/// Parse of `YYYYMMDD` → calendar date. The year must be four digits.
pub fn parse_day_stamp(stamp: u32) -> Result<NaiveDate> {
    if stamp < 10_000_000 {
        bail!("invalid day stamp {}", stamp);
    }
    let year = (stamp / 10_000) as i32;
    let month = (stamp / 100) % 100;
    let day = stamp % 100;
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(d) => Ok(d),
        None => bail!("invalid day stamp {}", stamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_day_stamps() -> Result<()> {
        assert_eq!(
            parse_day_stamp(20200201)?,
            NaiveDate::from_ymd_opt(2020, 2, 1).unwrap()
        );
        assert_eq!(
            parse_day_stamp(20201231)?,
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap()
        );
        assert!(parse_day_stamp(20201301).is_err());
        assert!(parse_day_stamp(20200230).is_err());
        assert!(parse_day_stamp(123).is_err());
        Ok(())
    }

    #[test]
    fn flattens_feed_fields() -> Result<()> {
        let entry: DailyEntry = serde_json::from_value(json!({
            "state": "AZ",
            "date": 20200415,
            "positive": 3806,
            "hospitalizedCurrently": null,
            "dataQualityGrade": "A+"
        }))?;

        assert_eq!(entry.state, "AZ");
        assert_eq!(entry.day()?, NaiveDate::from_ymd_opt(2020, 4, 15).unwrap());
        assert_eq!(entry.metric("positive")?, Some(3806.0));
        assert_eq!(entry.metric("hospitalizedCurrently")?, None);
        assert_eq!(entry.metric("death")?, None);
        Ok(())
    }

    #[test]
    fn rejects_non_numeric_metric() {
        let entry: DailyEntry = serde_json::from_value(json!({
            "state": "AZ",
            "date": 20200415,
            "positive": "thirty"
        }))
        .unwrap();
        assert!(entry.metric("positive").is_err());
    }
}
