use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ADMISSION: &str = "admission";
pub const REINCARCERATION: &str = "reincarceration";
pub const REVOCATION: &str = "revocation";

pub const DEFAULT_FILE_SUFFIX: &str = ".json";

/// Maps each metric type to the fixed list of files it is built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricCatalog {
    #[serde(default = "default_suffix")]
    pub file_suffix: String,
    pub metric_types: BTreeMap<String, Vec<String>>,
}

fn default_suffix() -> String {
    DEFAULT_FILE_SUFFIX.to_string()
}

impl MetricCatalog {
    pub fn new(metric_types: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            file_suffix: default_suffix(),
            metric_types,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix = suffix.into();
        self
    }

    /// The table used by the reference deployment.
    pub fn reference() -> Self {
        let mut metric_types = BTreeMap::new();
        metric_types.insert(
            ADMISSION.to_string(),
            to_owned(&[
                "admissions_by_type_60_days.json",
                "admissions_by_type_by_month.json",
                "admissions_versus_releases_by_month.json",
            ]),
        );
        metric_types.insert(
            REINCARCERATION.to_string(),
            to_owned(&[
                "reincarceration_rate_by_release_facility.json",
                "reincarceration_rate_by_stay_length.json",
                "reincarceration_rate_by_transitional_facility.json",
                "reincarcerations_by_month.json",
            ]),
        );
        metric_types.insert(
            REVOCATION.to_string(),
            to_owned(&[
                "revocations_by_month.json",
                "revocations_by_race_60_days.json",
                "revocations_by_supervision_type_by_month.json",
                "revocations_by_violation_type_by_month.json",
            ]),
        );
        Self::new(metric_types)
    }

    pub fn files_for(&self, metric_type: &str) -> Result<&[String]> {
        self.metric_types
            .get(metric_type)
            .map(Vec::as_slice)
            .ok_or_else(|| CacheError::Configuration(metric_type.to_string()))
    }

    pub fn contains(&self, metric_type: &str) -> bool {
        self.metric_types.contains_key(metric_type)
    }

    pub fn metric_types(&self) -> impl Iterator<Item = &str> {
        self.metric_types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.metric_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metric_types.is_empty()
    }

    pub fn file_key<'a>(&self, file_name: &'a str) -> &'a str {
        file_key(file_name, &self.file_suffix)
    }
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::reference()
    }
}

/// Strips the naming-convention suffix from a file name.
pub fn file_key<'a>(file_name: &'a str, suffix: &str) -> &'a str {
    if suffix.is_empty() {
        return file_name;
    }
    file_name.strip_suffix(suffix).unwrap_or(file_name)
}

fn to_owned(files: &[&str]) -> Vec<String> {
    files.iter().map(|f| f.to_string()).collect()
}
