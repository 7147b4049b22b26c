//! Employee feed — the static, read-only input dataset.
//!
//! The feed is re-read on every request. Only raw records are held; metrics
//! are never cached.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::models::employee::EmployeeRecord;

const EMBEDDED_FEED: &str = include_str!("../../data/employees.json");

#[derive(Debug, Clone)]
pub enum EmployeeFeed {
    /// Records parsed once at startup from a bundled or in-memory source.
    Static(Arc<Vec<EmployeeRecord>>),
    /// A JSON file read from disk on every `load`.
    File(PathBuf),
}

impl EmployeeFeed {
    /// The sample dataset shipped with the binary.
    pub fn embedded() -> Result<Self> {
        let records = parse_feed(EMBEDDED_FEED).context("Embedded employee feed is invalid")?;
        Ok(EmployeeFeed::Static(Arc::new(records)))
    }

    #[cfg(test)]
    pub fn from_records(records: Vec<EmployeeRecord>) -> Self {
        EmployeeFeed::Static(Arc::new(records))
    }

    /// Picks the file feed when a path is configured, the embedded one otherwise.
    /// A configured file is parsed once here so a bad path fails startup.
    pub async fn from_config(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                let feed = EmployeeFeed::File(PathBuf::from(path));
                let records = feed.load().await?;
                info!("Employee feed: {path} ({} records)", records.len());
                Ok(feed)
            }
            None => {
                let feed = Self::embedded()?;
                info!("Employee feed: embedded sample");
                Ok(feed)
            }
        }
    }

    /// Returns the records in feed declaration order.
    pub async fn load(&self) -> Result<Vec<EmployeeRecord>> {
        match self {
            EmployeeFeed::Static(records) => Ok(records.as_ref().clone()),
            EmployeeFeed::File(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read employee feed {}", path.display()))?;
                let records = parse_feed(&raw)
                    .with_context(|| format!("Employee feed {} is invalid", path.display()))?;
                debug!("Read {} records from {}", records.len(), path.display());
                Ok(records)
            }
        }
    }
}

fn parse_feed(raw: &str) -> Result<Vec<EmployeeRecord>> {
    Ok(serde_json::from_str(raw)?)
}
