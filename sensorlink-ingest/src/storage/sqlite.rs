use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sensorlink_core::{DeviceId, ReadingDetail, ReadingId, Sensor, SensorId};
use sqlx::{
    Row, SqlitePool,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
};
use ulid::Ulid;

use crate::storage::{NewReading, NewSensor, SensorStorage, StorageStats};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, thiserror::Error)]
pub enum SqliteStorageError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
    #[error("column {column} holds {value}, which is not a byte")]
    InvalidByte { column: &'static str, value: i64 },
}

/// SQLite-backed storage implementation.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// opens or creates a SQLite database at the given path.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self, SqliteStorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        MIGRATOR.run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn new_in_memory() -> Result<Self, SqliteStorageError> {
        // every connection to `:memory:` is its own database, so keep exactly one alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        MIGRATOR.run(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SensorStorage for SqliteStorage {
    type Error = SqliteStorageError;

    async fn find_sensor_by_device_id(
        &self,
        device_id: DeviceId,
    ) -> Result<Option<Sensor>, Self::Error> {
        let row = sqlx::query(
            r#"SELECT id, device_id, type_code, description, created_at FROM sensors WHERE device_id = ?"#,
        )
        .bind(device_id.0 as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_row_to_sensor(&r)).transpose()
    }

    async fn create_sensor(&self, sensor: NewSensor) -> Result<SensorId, Self::Error> {
        let id = SensorId(Ulid::new());

        sqlx::query(
            r#"
            INSERT INTO sensors (id, device_id, type_code, description, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.0.to_string())
        .bind(sensor.device_id.0 as i64)
        .bind(sensor.type_code as i64)
        .bind(sensor.description)
        .bind(jiff::Timestamp::now().as_microsecond())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn record_reading(&self, reading: NewReading) -> Result<ReadingId, Self::Error> {
        let id = ReadingId(Ulid::new());

        sqlx::query(
            r#"
            INSERT INTO readings (id, sensor_id, query, data, crc_valid, raw_frame, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.0.to_string())
        .bind(reading.sensor_id.0.to_string())
        .bind(reading.query as i64)
        .bind(reading.data as i64)
        .bind(reading.crc_valid)
        .bind(reading.raw_frame)
        .bind(jiff::Timestamp::now().as_microsecond())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_readings(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ReadingDetail>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT r.id AS id, s.device_id AS device_id, s.type_code AS type_code,
                   s.description AS description, r.query AS query, r.data AS data,
                   r.crc_valid AS crc_valid, r.raw_frame AS raw_frame,
                   r.recorded_at AS recorded_at
            FROM readings r
            JOIN sensors s ON r.sensor_id = s.id
            ORDER BY r.seq ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_detail).collect()
    }

    async fn update_sensor_description(
        &self,
        id: SensorId,
        description: &str,
    ) -> Result<bool, Self::Error> {
        let result = sqlx::query(r#"UPDATE sensors SET description = ? WHERE id = ?"#)
            .bind(description)
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_reading(&self, id: ReadingId) -> Result<bool, Self::Error> {
        let result = sqlx::query(r#"DELETE FROM readings WHERE id = ?"#)
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<StorageStats, Self::Error> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM sensors) AS sensors,
                (SELECT COUNT(*) FROM readings) AS readings,
                (SELECT COUNT(*) FROM readings WHERE crc_valid = 0) AS crc_failures
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StorageStats {
            sensors: row.try_get::<i64, _>("sensors")? as usize,
            readings: row.try_get::<i64, _>("readings")? as usize,
            crc_failures: row.try_get::<i64, _>("crc_failures")? as usize,
        })
    }
}

fn map_row_to_sensor(r: &SqliteRow) -> Result<Sensor, SqliteStorageError> {
    let id_str: String = r.try_get("id")?;
    let id = Ulid::from_str(&id_str).map_err(|_| SqliteStorageError::InvalidUlid(id_str))?;

    Ok(Sensor {
        id: SensorId(id),
        device_id: DeviceId(get_byte(r, "device_id")?),
        type_code: get_byte(r, "type_code")?,
        description: r.try_get::<String, _>("description")?.into_boxed_str(),
        created_at: get_timestamp(r, "created_at")?,
    })
}

fn map_row_to_detail(r: &SqliteRow) -> Result<ReadingDetail, SqliteStorageError> {
    let id_str: String = r.try_get("id")?;
    let id = Ulid::from_str(&id_str).map_err(|_| SqliteStorageError::InvalidUlid(id_str))?;

    Ok(ReadingDetail {
        reading_id: ReadingId(id),
        device_id: DeviceId(get_byte(r, "device_id")?),
        type_code: get_byte(r, "type_code")?,
        description: r.try_get::<String, _>("description")?.into_boxed_str(),
        query: get_byte(r, "query")?,
        data: get_byte(r, "data")?,
        crc_valid: r.try_get("crc_valid")?,
        raw_frame: r.try_get::<String, _>("raw_frame")?.into_boxed_str(),
        recorded_at: get_timestamp(r, "recorded_at")?,
    })
}

fn get_byte(r: &SqliteRow, column: &'static str) -> Result<u8, SqliteStorageError> {
    let value: i64 = r.try_get(column)?;
    u8::try_from(value).map_err(|_| SqliteStorageError::InvalidByte { column, value })
}

fn get_timestamp(r: &SqliteRow, column: &'static str) -> Result<jiff::Timestamp, SqliteStorageError> {
    let micros: i64 = r.try_get(column)?;
    jiff::Timestamp::from_microsecond(micros)
        .map_err(|_| SqliteStorageError::InvalidTimestamp(micros))
}
