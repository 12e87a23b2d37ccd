//! Persisted per-source watermarks.
//!
//! The watermark file is a YAML mapping from source name to the timestamp
//! (`YYYY-MM-DD HH:MM:SS`) of the last completed sweep for that source:
//!
//! ```yaml
//! Blog A: 2024-03-20 08:15:00
//! Vendor changelog: 2024-03-20 08:15:00
//! ```
//!
//! A file holding a single bare timestamp is also accepted and applies to
//! every source. Loading never fails: a missing or unreadable file puts
//! every source at [`NaiveDateTime::MIN`].

use crate::config::TIMESTAMP_FORMAT;
use crate::error::Result;
use chrono::NaiveDateTime;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Cutoff timestamps keyed by source name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermarks {
    by_source: BTreeMap<String, NaiveDateTime>,
    fallback: Option<NaiveDateTime>,
}

impl Watermarks {
    /// Watermark for `source`, or the minimum timestamp when none is known.
    pub fn get(&self, source: &str) -> NaiveDateTime {
        self.by_source
            .get(source)
            .copied()
            .or(self.fallback)
            .unwrap_or(NaiveDateTime::MIN)
    }

    /// Move `source` forward to `ts`. Never moves backwards.
    pub fn advance(&mut self, source: &str, ts: NaiveDateTime) {
        let current = self.get(source);
        self.by_source.insert(source.to_string(), current.max(ts));
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    fn to_yaml(&self) -> Result<String> {
        let map: BTreeMap<&str, String> = self
            .by_source
            .iter()
            .map(|(name, ts)| (name.as_str(), ts.format(TIMESTAMP_FORMAT).to_string()))
            .collect();
        Ok(serde_yaml::to_string(&map)?)
    }

    fn from_yaml(text: &str) -> Self {
        let value: Value = match serde_yaml::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Watermark file is not valid YAML; using minimum timestamp");
                return Self::default();
            }
        };

        match value {
            Value::Null => Self::default(),
            Value::String(s) => match parse_timestamp(&s) {
                Some(ts) => Self {
                    by_source: BTreeMap::new(),
                    fallback: Some(ts),
                },
                None => {
                    warn!(value = %s, "Invalid date format in watermark file; using minimum timestamp");
                    Self::default()
                }
            },
            Value::Mapping(map) => {
                let mut by_source = BTreeMap::new();
                for (key, val) in map {
                    let (Some(name), Some(raw)) = (key.as_str(), val.as_str()) else {
                        warn!(?key, "Skipping non-string watermark entry");
                        continue;
                    };
                    match parse_timestamp(raw) {
                        Some(ts) => {
                            by_source.insert(name.to_string(), ts);
                        }
                        None => {
                            warn!(source = %name, value = %raw, "Invalid watermark for source; using minimum timestamp");
                        }
                    }
                }
                Self {
                    by_source,
                    fallback: None,
                }
            }
            other => {
                warn!(?other, "Unexpected watermark file shape; using minimum timestamp");
                Self::default()
            }
        }
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}

/// File-backed watermark persistence. Single writer per file.
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted watermarks.
    ///
    /// # Returns
    ///
    /// The per-source watermarks. A missing, unreadable or malformed file
    /// yields an empty set (every source at the minimum timestamp) and a
    /// logged warning instead of an error, so the floor date alone governs
    /// admission. A bare single timestamp applies to every source.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Watermarks {
        match fs::read_to_string(&self.path).await {
            Ok(text) => {
                let marks = Watermarks::from_yaml(&text);
                debug!(sources = marks.len(), "Loaded watermarks");
                marks
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No watermark file; starting from minimum timestamp");
                Watermarks::default()
            }
            Err(e) => {
                warn!(error = %e, "Could not read watermark file; using minimum timestamp");
                Watermarks::default()
            }
        }
    }

    /// Overwrite the watermark file via write-to-temp then rename.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn save(&self, marks: &Watermarks) -> Result<()> {
        let yaml = marks.to_yaml()?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, yaml).await?;
        fs::rename(&tmp, &self.path).await?;
        info!(sources = marks.len(), "Updated watermarks");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_is_minimum() {
        let tmp = tempfile::tempdir().unwrap();
        let store = WatermarkStore::new(tmp.path().join("last_date.yaml"));
        let marks = store.load().await;
        assert_eq!(marks.get("Blog A"), NaiveDateTime::MIN);
    }

    #[tokio::test]
    async fn test_malformed_file_is_minimum() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("last_date.yaml");
        std::fs::write(&path, "not-a-date").unwrap();

        let marks = WatermarkStore::new(&path).load().await;
        assert_eq!(marks.get("Blog A"), NaiveDateTime::MIN);
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_minimum() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("last_date.yaml");
        std::fs::write(&path, "a: [unclosed").unwrap();

        let marks = WatermarkStore::new(&path).load().await;
        assert_eq!(marks, Watermarks::default());
    }

    #[tokio::test]
    async fn test_bare_timestamp_applies_to_all_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("last_date.txt");
        std::fs::write(&path, "2024-01-01 00:00:00\n").unwrap();

        let marks = WatermarkStore::new(&path).load().await;
        assert_eq!(marks.get("Blog A"), ts(2024, 1, 1));
        assert_eq!(marks.get("Anything"), ts(2024, 1, 1));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = WatermarkStore::new(tmp.path().join("last_date.yaml"));

        let mut marks = Watermarks::default();
        marks.advance("Blog A", ts(2024, 3, 20));
        marks.advance("Vendor: changelog", ts(2024, 3, 21));
        store.save(&marks).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.get("Blog A"), ts(2024, 3, 20));
        assert_eq!(loaded.get("Vendor: changelog"), ts(2024, 3, 21));
        assert_eq!(loaded.get("Unknown"), NaiveDateTime::MIN);
        assert!(!tmp.path().join("last_date.yaml.tmp").exists());
    }

    #[tokio::test]
    async fn test_bad_entry_does_not_poison_others() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("last_date.yaml");
        std::fs::write(&path, "Blog A: 2024-03-20 00:00:00\nBlog B: yesterday\n").unwrap();

        let marks = WatermarkStore::new(&path).load().await;
        assert_eq!(marks.get("Blog A"), ts(2024, 3, 20));
        assert_eq!(marks.get("Blog B"), NaiveDateTime::MIN);
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut marks = Watermarks::default();
        marks.advance("Blog A", ts(2024, 3, 20));
        marks.advance("Blog A", ts(2024, 3, 1));
        assert_eq!(marks.get("Blog A"), ts(2024, 3, 20));
    }

    #[test]
    fn test_advance_respects_fallback() {
        let mut marks = Watermarks::from_yaml("2024-03-20 00:00:00");
        marks.advance("Blog A", ts(2024, 1, 1));
        assert_eq!(marks.get("Blog A"), ts(2024, 3, 20));
    }
}
