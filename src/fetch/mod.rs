// src/fetch/mod.rs

use anyhow::{Context, Result};
use chrono::NaiveDate;
use glob::glob;
use reqwest::Client;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::fs as tokio_fs;
use tracing::{debug, info};
use url::Url;

use crate::feed::DailyEntry;

static FEED_URL: &str = "https://covidtracking.com/api/v1/states/daily.json";

/// Path of the cache artifact holding the feed snapshot taken on `as_of`.
pub fn cache_path(cache_dir: impl AsRef<Path>, as_of: NaiveDate) -> PathBuf {
    cache_dir
        .as_ref()
        .join(format!("covidtracking_data_{}.json", as_of.format("%Y_%m_%d")))
}

/// Return the day's feed snapshot.
///
/// If the cache artifact for `as_of` exists it is read and parsed as-is;
/// otherwise the feed is fetched once, the raw body written to the artifact,
/// and the body parsed. An existing artifact is never overwritten or
/// revalidated against the live feed.
pub async fn fetch_daily(
    client: &Client,
    cache_dir: impl AsRef<Path>,
    as_of: NaiveDate,
) -> Result<Vec<DailyEntry>> {
    let cache_dir = cache_dir.as_ref();
    fs::create_dir_all(cache_dir).with_context(|| format!("creating {:?}", cache_dir))?;

    let path = cache_path(cache_dir, as_of);
    let body = if path.exists() {
        debug!(path = %path.display(), "reading cached snapshot");
        tokio_fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    } else {
        let url = Url::parse(FEED_URL)?;
        info!(%url, "downloading daily feed");
        let body = client
            .get(url.as_str())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("non-success status from {}", url))?
            .text()
            .await
            .with_context(|| format!("reading body from {}", url))?;
        tokio_fs::write(&path, &body)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "cached snapshot");
        body
    };

    let entries: Vec<DailyEntry> =
        serde_json::from_str(&body).with_context(|| format!("parsing {}", path.display()))?;
    Ok(entries)
}

/// List existing snapshot artifacts under `cache_dir`, sorted by date.
/// Files that do not match the `covidtracking_data_<YYYY_MM_DD>.json`
/// pattern are skipped.
pub fn cached_snapshots(cache_dir: impl AsRef<Path>) -> Result<Vec<(NaiveDate, PathBuf)>> {
    let pattern = format!(
        "{}/covidtracking_data_*.json",
        cache_dir.as_ref().display()
    );
    let mut snapshots = Vec::new();
    for entry in glob(&pattern)? {
        let path = entry?;
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            let tag = &stem["covidtracking_data_".len()..];
            if let Ok(date) = NaiveDate::parse_from_str(tag, "%Y_%m_%d") {
                snapshots.push((date, path));
            }
        }
    }
    snapshots.sort_by_key(|(date, _)| *date);
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cache_path_is_date_stamped() {
        let date = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        let path = cache_path("cache", date);
        assert_eq!(
            path,
            PathBuf::from("cache/covidtracking_data_2020_05_01.json")
        );
    }

    #[tokio::test]
    async fn cache_hit_skips_the_network() -> Result<()> {
        let dir = tempdir()?;
        let as_of = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let body = r#"[
            {"state": "AZ", "date": 20200201, "positive": 10},
            {"state": "WA", "date": 20200201, "positive": 25, "death": null}
        ]"#;
        fs::write(cache_path(dir.path(), as_of), body)?;

        let client = Client::new();
        let entries = fetch_daily(&client, dir.path(), as_of).await?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].state, "AZ");
        assert_eq!(entries[1].metric("positive")?, Some(25.0));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_cache_is_a_hard_failure() -> Result<()> {
        let dir = tempdir()?;
        let as_of = NaiveDate::from_ymd_opt(2020, 6, 2).unwrap();
        fs::write(cache_path(dir.path(), as_of), "not json")?;

        let client = Client::new();
        assert!(fetch_daily(&client, dir.path(), as_of).await.is_err());
        Ok(())
    }

    #[test]
    fn snapshot_scan_skips_foreign_files() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("covidtracking_data_2020_06_02.json"), "[]")?;
        fs::write(dir.path().join("covidtracking_data_2020_06_01.json"), "[]")?;
        fs::write(dir.path().join("notes.txt"), "x")?;
        fs::write(dir.path().join("covidtracking_data_junk.json"), "[]")?;

        let snapshots = cached_snapshots(dir.path())?;
        let dates: Vec<_> = snapshots.iter().map(|(d, _)| *d).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 6, 2).unwrap()
            ]
        );
        Ok(())
    }
}
