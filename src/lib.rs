pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod output;
pub mod process;
pub mod window;

pub use config::IngestConfig;
pub use error::{ConfigError, FetchFailure, IngestError};
pub use ingest::{ingest, ResultTable};
