// src/data/dataset.rs

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::models::record::Record;

/// The full crash dataset, loaded once and read-only afterwards.
/// Shared across analyses as `Arc<Dataset>`.
#[derive(Debug)]
pub struct Dataset {
    records: Vec<Record>,
    /// region code -> positions in `records`, in file order
    region_index: HashMap<String, Vec<usize>>,
    fingerprint: Option<String>,
    loaded_at: NaiveDateTime,
}

impl Dataset {
    /// Builds a dataset from records already in memory.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut region_index: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, record) in records.iter().enumerate() {
            region_index
                .entry(record.state.clone())
                .or_default()
                .push(position);
        }
        debug!(
            "Indexed {} records across {} regions",
            records.len(),
            region_index.len()
        );

        Self {
            records,
            region_index,
            fingerprint: None,
            loaded_at: Utc::now().naive_utc(),
        }
    }

    /// Loads and indexes a CSV file. The SHA-256 of the raw bytes becomes
    /// the dataset fingerprint reported with every analysis.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading crash dataset from {}", path.display());

        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read dataset file {}", path.display()))?;
        let fingerprint = hex::encode(Sha256::digest(&bytes));

        let records = parse_records(bytes.as_slice())
            .with_context(|| format!("Failed to parse dataset file {}", path.display()))?;

        let mut dataset = Self::from_records(records);
        dataset.fingerprint = Some(fingerprint);
        info!(
            "Loaded {} records for {} regions (sha256 {})",
            dataset.len(),
            dataset.region_count(),
            dataset.fingerprint.as_deref().unwrap_or_default()
        );
        Ok(dataset)
    }

    /// All records whose region code equals `code` exactly, in dataset order.
    pub fn records_for_region(&self, code: &str) -> Vec<&Record> {
        self.region_index
            .get(code)
            .map(|positions| positions.iter().map(|&p| &self.records[p]).collect())
            .unwrap_or_default()
    }

    pub fn count_for_region(&self, code: &str) -> usize {
        self.region_index.get(code).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn region_count(&self) -> usize {
        self.region_index.len()
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn loaded_at(&self) -> NaiveDateTime {
        self.loaded_at
    }
}

fn parse_records<R: std::io::Read>(reader: R) -> Result<Vec<Record>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (line, row) in csv_reader.deserialize::<Record>().enumerate() {
        // +2: one for the header, one for 1-based numbering
        let record = row.with_context(|| format!("Invalid record on line {}", line + 2))?;
        records.push(record);
    }
    Ok(records)
}
