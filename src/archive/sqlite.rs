//! SQLite implementation of ArchiveStore.

use crate::archive::{
    AggregateFn, ArchiveError, ArchiveStore, ColumnInfo, ObsStats, Observation, PeriodOfRecord,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::info;

/// SqliteArchive reads the daemon's archive table through a read-only pool.
pub struct SqliteArchive {
    pool: Pool<Sqlite>,
}

impl SqliteArchive {
    /// Opens the archive database read-only.
    ///
    /// The file must already exist; this service never creates or writes
    /// the archive, the host daemon owns it.
    pub async fn open(path: &str, max_connections: u32) -> Result<Self, ArchiveError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        info!(path = %path, "Archive database opened");
        Ok(Self { pool })
    }

    /// Rejects observation names that are not archive columns.
    ///
    /// Names arrive from URL paths and end up interpolated into SQL as
    /// identifiers, so anything not in PRAGMA table_info is refused.
    async fn ensure_column(&self, obs_type: &str) -> Result<(), ArchiveError> {
        let columns = self.columns().await?;
        if columns.iter().any(|c| c.name == obs_type) {
            Ok(())
        } else {
            Err(ArchiveError::UnknownObservation(obs_type.to_string()))
        }
    }
}

fn parse_observation_row(row: &SqliteRow) -> Result<Observation, ArchiveError> {
    Ok(Observation {
        timestamp: row.try_get("dateTime")?,
        value: row.try_get("value")?,
    })
}

#[async_trait]
impl ArchiveStore for SqliteArchive {
    async fn columns(&self) -> Result<Vec<ColumnInfo>, ArchiveError> {
        let rows = sqlx::query("PRAGMA table_info(archive)")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ColumnInfo {
                    name: row.try_get("name")?,
                    data_type: row.try_get("type")?,
                })
            })
            .collect()
    }

    async fn latest(&self, obs_type: &str) -> Result<Option<Observation>, ArchiveError> {
        self.ensure_column(obs_type).await?;

        let row = sqlx::query(&format!(
            "SELECT dateTime, \"{obs_type}\" AS value FROM archive ORDER BY dateTime DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(parse_observation_row).transpose()
    }

    async fn range(
        &self,
        obs_type: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Observation>, ArchiveError> {
        self.ensure_column(obs_type).await?;

        let rows = sqlx::query(&format!(
            "SELECT dateTime, \"{obs_type}\" AS value FROM archive \
             WHERE dateTime BETWEEN ? AND ? ORDER BY dateTime"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_observation_row).collect()
    }

    async fn stats(
        &self,
        obs_type: &str,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<ObsStats, ArchiveError> {
        self.ensure_column(obs_type).await?;

        let select = format!(
            "SELECT MIN(\"{obs_type}\") AS min, MAX(\"{obs_type}\") AS max, \
             AVG(\"{obs_type}\") AS avg, SUM(\"{obs_type}\") AS sum, \
             COUNT(\"{obs_type}\") AS count FROM archive"
        );

        let row = match (start, end) {
            (Some(start), Some(end)) => {
                sqlx::query(&format!("{select} WHERE dateTime BETWEEN ? AND ?"))
                    .bind(start)
                    .bind(end)
                    .fetch_one(&self.pool)
                    .await?
            }
            (Some(start), None) => {
                sqlx::query(&format!("{select} WHERE dateTime >= ?"))
                    .bind(start)
                    .fetch_one(&self.pool)
                    .await?
            }
            (None, Some(end)) => {
                sqlx::query(&format!("{select} WHERE dateTime <= ?"))
                    .bind(end)
                    .fetch_one(&self.pool)
                    .await?
            }
            (None, None) => sqlx::query(&select).fetch_one(&self.pool).await?,
        };

        Ok(ObsStats {
            min: row.try_get("min")?,
            max: row.try_get("max")?,
            avg: row.try_get("avg")?,
            sum: row.try_get("sum")?,
            count: row.try_get("count")?,
        })
    }

    async fn aggregate(
        &self,
        obs_type: &str,
        start: i64,
        end: i64,
        func: AggregateFn,
        bin_secs: i64,
    ) -> Result<Vec<Observation>, ArchiveError> {
        if bin_secs <= 0 {
            return Err(ArchiveError::InvalidQuery(
                "aggregation bin must be greater than 0".into(),
            ));
        }
        self.ensure_column(obs_type).await?;

        let rows = sqlx::query(&format!(
            "SELECT dateTime, {}(\"{obs_type}\") AS value FROM archive \
             WHERE dateTime BETWEEN ? AND ? GROUP BY dateTime / ? ORDER BY dateTime",
            func.sql()
        ))
        .bind(start)
        .bind(end)
        .bind(bin_secs)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_observation_row).collect()
    }

    async fn period_of_record(&self) -> Result<Option<PeriodOfRecord>, ArchiveError> {
        let row = sqlx::query("SELECT MIN(dateTime) AS start, MAX(dateTime) AS end FROM archive")
            .fetch_one(&self.pool)
            .await?;

        let start: Option<i64> = row.try_get("start")?;
        let end: Option<i64> = row.try_get("end")?;

        match (start, end) {
            (Some(start), Some(end)) => Ok(Some(PeriodOfRecord { start, end })),
            _ => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), ArchiveError> {
        self.pool.close().await;
        Ok(())
    }
}
