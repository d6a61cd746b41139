//! Read-only access to the host daemon's observation archive.

mod sqlite;

pub use sqlite::SqliteArchive;

use async_trait::async_trait;
use serde::Serialize;

/// A column of the archive table.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    /// Column name, which doubles as the observation type.
    pub name: String,
    /// Declared SQLite type, e.g. "REAL" or "INTEGER".
    pub data_type: String,
}

/// A single timestamped observation value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    /// Epoch seconds of the archive record.
    pub timestamp: i64,
    /// Recorded value; None when the sensor reported nothing.
    pub value: Option<f64>,
}

/// Summary statistics for an observation type over a time range.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ObsStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub sum: Option<f64>,
    pub count: i64,
}

/// First and last record timestamps in the archive.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PeriodOfRecord {
    pub start: i64,
    pub end: i64,
}

/// Aggregate functions supported by time-binned queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    /// Parses a case-insensitive function name.
    pub fn parse(s: &str) -> Result<Self, ArchiveError> {
        match s.to_ascii_lowercase().as_str() {
            "avg" => Ok(Self::Avg),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            other => Err(ArchiveError::InvalidQuery(format!(
                "aggregate function must be one of avg, min, max, got \"{other}\""
            ))),
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// ArchiveStore defines read-only queries over the observation archive.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Lists the archive table columns (observation types).
    async fn columns(&self) -> Result<Vec<ColumnInfo>, ArchiveError>;

    /// Returns the most recent record for an observation type.
    async fn latest(&self, obs_type: &str) -> Result<Option<Observation>, ArchiveError>;

    /// Returns all records with `start <= dateTime <= end`.
    async fn range(
        &self,
        obs_type: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Observation>, ArchiveError>;

    /// Returns min/max/avg/sum/count over an optional time range.
    async fn stats(
        &self,
        obs_type: &str,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<ObsStats, ArchiveError>;

    /// Returns one aggregated value per `bin_secs`-wide time bin.
    async fn aggregate(
        &self,
        obs_type: &str,
        start: i64,
        end: i64,
        func: AggregateFn,
        bin_secs: i64,
    ) -> Result<Vec<Observation>, ArchiveError>;

    /// Returns the first and last record timestamps, or None when empty.
    async fn period_of_record(&self) -> Result<Option<PeriodOfRecord>, ArchiveError>;

    /// Closes the underlying connection pool.
    async fn close(&self) -> Result<(), ArchiveError>;
}

/// ArchiveError represents errors raised by archive queries.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unknown observation type: {0}")]
    UnknownObservation(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
