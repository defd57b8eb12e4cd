// src/config.rs

use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

use crate::error::ConfigError;

/// Public TLC trip-record bucket.
pub const BASE_URL: &str = "https://d37ci6vzurychx.cloudfront.net/trip-data/";

pub const DEFAULT_TAXI_TYPE: &str = "yellow";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Last day for which the provider has published trip data (November 2025).
/// Months after this are never requested.
pub const AVAILABILITY_CEILING: NaiveDate = match NaiveDate::from_ymd_opt(2025, 11, 30) {
    Some(d) => d,
    None => panic!("invalid availability ceiling"),
};

// Orchestrator-provided environment.
pub const ENV_START_DATE: &str = "BRUIN_START_DATE";
pub const ENV_END_DATE: &str = "BRUIN_END_DATE";
pub const ENV_START_DATETIME: &str = "BRUIN_START_DATETIME";
pub const ENV_END_DATETIME: &str = "BRUIN_END_DATETIME";
pub const ENV_VARS: &str = "BRUIN_VARS";
// Local overrides.
pub const ENV_CEILING: &str = "TRIPS_AVAILABILITY_CEILING";
pub const ENV_BASE_URL: &str = "TRIPS_BASE_URL";
pub const ENV_OUTPUT: &str = "TRIPS_OUTPUT";

/// The JSON bag of pipeline variables. Only `taxi_types` is read; anything
/// else the orchestrator puts in there is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineVars {
    #[serde(default = "default_taxi_types")]
    pub taxi_types: Vec<String>,
}

fn default_taxi_types() -> Vec<String> {
    vec![DEFAULT_TAXI_TYPE.to_string()]
}

impl Default for PipelineVars {
    fn default() -> Self {
        Self {
            taxi_types: default_taxi_types(),
        }
    }
}

impl PipelineVars {
    /// Parse the variable bag. A missing or blank bag means "all defaults".
    pub fn parse(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Self::default()),
        }
    }
}

/// Everything one ingest run needs. Window bounds are kept raw so that a
/// missing or malformed bound surfaces from `ingest` as a configuration error.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub start: Option<String>,
    pub end: Option<String>,
    pub taxi_types: Vec<String>,
    pub availability_ceiling: NaiveDate,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl IngestConfig {
    pub fn new(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: start.map(str::to_string),
            end: end.map(str::to_string),
            taxi_types: default_taxi_types(),
            availability_ceiling: AVAILABILITY_CEILING,
            base_url: BASE_URL.to_string(),
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_taxi_types<I, S>(mut self, taxi_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.taxi_types = taxi_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_availability_ceiling(mut self, ceiling: NaiveDate) -> Self {
        self.availability_ceiling = ceiling;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build a config from the process environment. Only the binary calls
    /// this; library code always receives an explicit `IngestConfig`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Date-only variables win
    /// over their datetime counterparts; empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let start = get(ENV_START_DATE).or_else(|| get(ENV_START_DATETIME));
        let end = get(ENV_END_DATE).or_else(|| get(ENV_END_DATETIME));
        let vars = PipelineVars::parse(get(ENV_VARS).as_deref())?;

        let mut cfg = Self::new(start.as_deref(), end.as_deref()).with_taxi_types(vars.taxi_types);

        if let Some(raw) = get(ENV_CEILING) {
            let ceiling = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| ConfigError::InvalidCeiling(raw.clone()))?;
            cfg = cfg.with_availability_ceiling(ceiling);
        }
        if let Some(url) = get(ENV_BASE_URL) {
            cfg = cfg.with_base_url(url);
        }
        Ok(cfg)
    }
}
