// src/fetch/targets.rs

use chrono::NaiveDate;
use std::fmt;
use url::Url;

use crate::error::ConfigError;
use crate::window::year_month;

/// One remote file: a taxi type for one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub taxi_type: String,
    pub month: NaiveDate,
    pub file_name: String,
    pub url: Url,
}

impl FetchTarget {
    pub fn new(base: &Url, taxi_type: &str, month: NaiveDate) -> Result<Self, url::ParseError> {
        let file_name = file_name(taxi_type, month);
        let url = base.join(&file_name)?;
        Ok(Self {
            taxi_type: taxi_type.to_string(),
            month,
            file_name,
            url,
        })
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name)
    }
}

/// `<taxi_type>_tripdata_<YYYY-MM>.parquet`
pub fn file_name(taxi_type: &str, month: NaiveDate) -> String {
    format!("{}_tripdata_{}.parquet", taxi_type, year_month(month))
}

/// Parse the base location. A missing trailing slash is added so that
/// joining appends the file name instead of replacing the last segment.
pub fn parse_base_url(base: &str) -> Result<Url, ConfigError> {
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    Url::parse(&normalized).map_err(|e| ConfigError::InvalidBaseUrl(base.to_string(), e))
}

/// Every target for the run, taxi-type major then month ascending.
pub fn plan_targets(
    base: &Url,
    taxi_types: &[String],
    months: &[NaiveDate],
) -> Result<Vec<FetchTarget>, ConfigError> {
    let mut targets = Vec::with_capacity(taxi_types.len() * months.len());
    for taxi_type in taxi_types {
        for &month in months {
            let target = FetchTarget::new(base, taxi_type, month)
                .map_err(|e| ConfigError::InvalidBaseUrl(base.to_string(), e))?;
            targets.push(target);
        }
    }
    Ok(targets)
}
