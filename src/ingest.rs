// src/ingest.rs

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::config::IngestConfig;
use crate::error::{FetchFailure, IngestError};
use crate::fetch::targets::parse_base_url;
use crate::fetch::{plan_targets, FetchTarget, Fetcher};
use crate::process::{decode_parquet, tag_batch, Provenance, TableBuilder};
use crate::window::RunWindow;

/// Everything that was downloaded in one run, concatenated in fetch order.
/// Empty when nothing could be fetched; an empty table has no schema.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    batch: Option<RecordBatch>,
    files: usize,
}

impl ResultTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn num_rows(&self) -> usize {
        self.batch.as_ref().map_or(0, RecordBatch::num_rows)
    }

    /// Number of files that contributed rows.
    pub fn files(&self) -> usize {
        self.files
    }

    pub fn schema(&self) -> Option<SchemaRef> {
        self.batch.as_ref().map(RecordBatch::schema)
    }

    pub fn batch(&self) -> Option<&RecordBatch> {
        self.batch.as_ref()
    }

    pub fn into_batch(self) -> Option<RecordBatch> {
        self.batch
    }
}

/// Download one target and tag it with its lineage.
async fn load_target<F>(fetcher: &F, target: &FetchTarget) -> Result<RecordBatch, FetchFailure>
where
    F: Fetcher + ?Sized,
{
    let body = fetcher.fetch(&target.url).await?;
    let extracted_at = Utc::now();
    let batch = decode_parquet(body)?;
    let prov = Provenance {
        taxi_type: &target.taxi_type,
        extracted_at,
        source_file: &target.file_name,
    };
    Ok(tag_batch(&batch, &prov)?)
}

/// Fetch every month of the window for every taxi type and return the union.
///
/// Configuration problems (missing or unreadable bounds, bad base URL) fail
/// before any request is made. Per-file problems are logged and skipped; a
/// run where nothing could be fetched returns an empty table.
#[instrument(level = "info", skip(config, fetcher), fields(taxi_types = ?config.taxi_types))]
pub async fn ingest<F>(config: &IngestConfig, fetcher: &F) -> Result<ResultTable, IngestError>
where
    F: Fetcher + ?Sized,
{
    let window = RunWindow::parse(config.start.as_deref(), config.end.as_deref())?;
    let base = parse_base_url(&config.base_url)?;
    let ceiling = config.availability_ceiling;

    if window.start > ceiling {
        warn!(
            start = %window.start,
            %ceiling,
            "no trip data is published after the availability ceiling; nothing to do"
        );
        return Ok(ResultTable::empty());
    }
    if window.start > window.end {
        warn!(%window, "window start is after its end");
    }

    let months = window.months(ceiling);
    let targets = plan_targets(&base, &config.taxi_types, &months)?;
    info!(%window, months = months.len(), files = targets.len(), "planned downloads");

    let mut table = TableBuilder::new();
    for target in &targets {
        info!(file = %target, "downloading");
        let loaded = load_target(fetcher, target).await.and_then(|batch| {
            let rows = batch.num_rows();
            table
                .push(batch)
                .map(|()| rows)
                .map_err(|e| FetchFailure::Decode(e.to_string()))
        });
        match loaded {
            Ok(rows) => info!(file = %target, rows, "loaded"),
            Err(FetchFailure::Timeout) => warn!(file = %target, "timeout downloading; skipping"),
            Err(e) => warn!(file = %target, error = %e, "failed; skipping"),
        }
    }

    if table.is_empty() {
        warn!(
            %window,
            taxi_types = ?config.taxi_types,
            %ceiling,
            "no data was downloaded for the requested window and taxi types"
        );
        return Ok(ResultTable::empty());
    }

    let files = table.len();
    let batch = table.finish()?;
    let result = ResultTable { batch, files };
    info!(rows = result.num_rows(), files, "ingest complete");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::process::fixtures::{nested_vendor_parquet, to_parquet, trip_batch};
    use crate::process::{EXTRACTED_AT_COL, SOURCE_FILE_COL, TAXI_TYPE_COL};
    use arrow::array::{Array, Int64Array, StringArray};
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    use url::Url;

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,tripscraper=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    enum Reply {
        Body(Bytes),
        Timeout,
        Status(StatusCode),
    }

    /// Serves canned replies keyed by file name and records every request.
    #[derive(Default)]
    struct StubFetcher {
        replies: HashMap<String, Reply>,
        calls: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn serve(mut self, file: &str, reply: Reply) -> Self {
            self.replies.insert(file.to_string(), reply);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &Url) -> Result<Bytes, FetchFailure> {
            let file = url.path_segments().and_then(|s| s.last()).unwrap().to_string();
            self.calls.lock().unwrap().push(file.clone());
            match self.replies.get(&file) {
                Some(Reply::Body(b)) => Ok(b.clone()),
                Some(Reply::Timeout) => Err(FetchFailure::Timeout),
                Some(Reply::Status(s)) => Err(FetchFailure::Status(*s)),
                None => Err(FetchFailure::Status(StatusCode::NOT_FOUND)),
            }
        }
    }

    fn fixture(ids: &[i64]) -> Reply {
        let distances: Vec<f64> = ids.iter().map(|&i| i as f64).collect();
        Reply::Body(to_parquet(&trip_batch(ids, &distances)))
    }

    fn strings<'a>(batch: &'a RecordBatch, col: &str) -> Vec<&'a str> {
        batch
            .column_by_name(col)
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap()
            .iter()
            .map(|v| v.unwrap())
            .collect()
    }

    fn config_for(start: Option<&str>, end: Option<&str>, types: &[&str]) -> IngestConfig {
        IngestConfig::new(start, end).with_taxi_types(types.iter().copied())
    }

    #[tokio::test]
    async fn missing_bounds_are_configuration_errors() {
        init_test_logging();
        let fetcher = StubFetcher::default();

        let err = ingest(&config_for(None, Some("2024-02-01"), &["yellow"]), &fetcher)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Config(ConfigError::MissingWindowBound("start"))
        ));

        let err = ingest(&config_for(Some("2024-01-01"), None, &["yellow"]), &fetcher)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Config(ConfigError::MissingWindowBound("end"))
        ));

        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn start_beyond_ceiling_makes_no_requests() {
        init_test_logging();
        let fetcher = StubFetcher::default();
        let table = ingest(&config_for(Some("2026-01-01"), Some("2026-02-01"), &["yellow"]), &fetcher)
            .await
            .unwrap();
        assert!(table.is_empty());
        assert!(table.schema().is_none());
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn fetches_each_month_in_order() {
        init_test_logging();
        let fetcher = StubFetcher::default()
            .serve("yellow_tripdata_2024-01.parquet", fixture(&[1, 2]))
            .serve("yellow_tripdata_2024-02.parquet", fixture(&[3]));
        let table = ingest(&config_for(Some("2024-01-01"), Some("2024-03-01"), &["yellow"]), &fetcher)
            .await
            .unwrap();

        assert_eq!(
            fetcher.calls(),
            vec![
                "yellow_tripdata_2024-01.parquet",
                "yellow_tripdata_2024-02.parquet"
            ]
        );
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.files(), 2);

        let batch = table.batch().unwrap();
        let ids = batch
            .column_by_name("VendorID")
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(ids.values().to_vec(), vec![1, 2, 3]);
        assert_eq!(
            strings(batch, SOURCE_FILE_COL),
            vec![
                "yellow_tripdata_2024-01.parquet",
                "yellow_tripdata_2024-01.parquet",
                "yellow_tripdata_2024-02.parquet"
            ]
        );
    }

    #[tokio::test]
    async fn order_is_taxi_type_major() {
        init_test_logging();
        let fetcher = StubFetcher::default()
            .serve("green_tripdata_2024-01.parquet", fixture(&[10]))
            .serve("green_tripdata_2024-02.parquet", fixture(&[11]))
            .serve("yellow_tripdata_2024-01.parquet", fixture(&[20]))
            .serve("yellow_tripdata_2024-02.parquet", fixture(&[21]));
        let table = ingest(
            &config_for(Some("2024-01-15"), Some("2024-02-10"), &["green", "yellow"]),
            &fetcher,
        )
        .await
        .unwrap();

        assert_eq!(
            fetcher.calls(),
            vec![
                "green_tripdata_2024-01.parquet",
                "green_tripdata_2024-02.parquet",
                "yellow_tripdata_2024-01.parquet",
                "yellow_tripdata_2024-02.parquet",
            ]
        );
        let batch = table.batch().unwrap();
        assert_eq!(
            strings(batch, TAXI_TYPE_COL),
            vec!["green", "green", "yellow", "yellow"]
        );
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_run() {
        init_test_logging();
        let fetcher = StubFetcher::default()
            .serve("yellow_tripdata_2024-01.parquet", Reply::Timeout)
            .serve("yellow_tripdata_2024-02.parquet", fixture(&[5, 6, 7]));
        let table = ingest(&config_for(Some("2024-01-01"), Some("2024-03-01"), &["yellow"]), &fetcher)
            .await
            .unwrap();

        assert_eq!(fetcher.calls().len(), 2);
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.files(), 1);
        let batch = table.batch().unwrap();
        assert_eq!(strings(batch, TAXI_TYPE_COL), vec!["yellow"; 3]);
        assert_eq!(
            strings(batch, SOURCE_FILE_COL),
            vec!["yellow_tripdata_2024-02.parquet"; 3]
        );
    }

    #[tokio::test]
    async fn all_failures_give_an_empty_table() {
        init_test_logging();
        let fetcher = StubFetcher::default()
            .serve("yellow_tripdata_2024-01.parquet", Reply::Timeout)
            .serve(
                "yellow_tripdata_2024-02.parquet",
                Reply::Status(StatusCode::FORBIDDEN),
            )
            .serve(
                "yellow_tripdata_2024-03.parquet",
                Reply::Body(Bytes::from_static(b"not parquet")),
            );
        let table = ingest(&config_for(Some("2024-01-01"), Some("2024-04-01"), &["yellow"]), &fetcher)
            .await
            .unwrap();
        assert_eq!(fetcher.calls().len(), 3);
        assert!(table.is_empty());
        assert_eq!(table.files(), 0);
        assert!(table.into_batch().is_none());
    }

    #[tokio::test]
    async fn fixture_round_trip_keeps_rows_and_adds_provenance() {
        init_test_logging();
        let before = Utc::now().timestamp_micros();
        let fetcher =
            StubFetcher::default().serve("green_tripdata_2023-07.parquet", fixture(&[1, 2, 3, 4]));
        let table = ingest(
            &config_for(Some("2023-07-01T00:00:00Z"), Some("2023-07-31T12:00:00Z"), &["green"]),
            &fetcher,
        )
        .await
        .unwrap();

        let batch = table.batch().unwrap();
        assert_eq!(batch.num_rows(), 4);
        assert_eq!(batch.num_columns(), 2 + 3);
        assert_eq!(strings(batch, TAXI_TYPE_COL), vec!["green"; 4]);
        assert_eq!(
            strings(batch, SOURCE_FILE_COL),
            vec!["green_tripdata_2023-07.parquet"; 4]
        );

        let at = batch
            .column_by_name(EXTRACTED_AT_COL)
            .unwrap()
            .as_any()
            .downcast_ref::<arrow::array::TimestampMicrosecondArray>()
            .unwrap();
        assert_eq!(at.null_count(), 0);
        assert!(at.values().iter().all(|&t| t >= before));
    }

    #[tokio::test]
    async fn months_past_the_ceiling_are_not_requested() {
        init_test_logging();
        let fetcher = StubFetcher::default();
        let config = config_for(Some("2025-10-01"), Some("2026-02-01"), &["fhv"]);
        let table = ingest(&config, &fetcher).await.unwrap();
        assert!(table.is_empty());
        assert_eq!(
            fetcher.calls(),
            vec!["fhv_tripdata_2025-10.parquet", "fhv_tripdata_2025-11.parquet"]
        );
    }

    #[tokio::test]
    async fn empty_taxi_type_list_requests_nothing() {
        init_test_logging();
        let fetcher = StubFetcher::default();
        let config = config_for(Some("2024-01-01"), Some("2024-03-01"), &[]);
        let table = ingest(&config, &fetcher).await.unwrap();
        assert!(table.is_empty());
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn file_that_cannot_be_unified_is_skipped() {
        init_test_logging();
        let fetcher = StubFetcher::default()
            .serve("yellow_tripdata_2024-01.parquet", fixture(&[1]))
            .serve(
                "yellow_tripdata_2024-02.parquet",
                Reply::Body(nested_vendor_parquet()),
            )
            .serve("yellow_tripdata_2024-03.parquet", fixture(&[3, 4]));
        let table = ingest(
            &config_for(Some("2024-01-01"), Some("2024-04-01"), &["yellow"]),
            &fetcher,
        )
        .await
        .unwrap();

        assert_eq!(fetcher.calls().len(), 3);
        assert_eq!(table.files(), 2);
        let batch = table.batch().unwrap();
        let ids = batch
            .column_by_name("VendorID")
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(ids.values().to_vec(), vec![1, 3, 4]);
        assert_eq!(
            strings(batch, SOURCE_FILE_COL),
            vec![
                "yellow_tripdata_2024-01.parquet",
                "yellow_tripdata_2024-03.parquet",
                "yellow_tripdata_2024-03.parquet"
            ]
        );
    }
}
