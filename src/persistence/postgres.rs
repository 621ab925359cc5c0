//! PostgreSQL implementation of the occupancy store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::OccupancyStore;
use super::models::{AdminRow, DeviceRow, ParkingLotRow, SensorRow};
use crate::config::GatewayConfig;
use crate::domain::{
    Admin, DeviceId, Esp32Device, NewParkingLot, NewSensor, ParkingLot, ParkingLotId, Sensor,
    SensorId, SensorStatus,
};
use crate::error::ParkingError;

const LOT_COLUMNS: &str =
    "id, name, address, latitude, longitude, owner, created_at, updated_at, deleted_at";

const SENSOR_COLUMNS: &str = "s.id, s.parking_lot_id, s.device_id, d.device_identifier, \
     s.sensor_number, s.status, s.created_at, s.updated_at, s.deleted_at";

const ADMIN_COLUMNS: &str = "id, subject, nit, photo_url, contact_phone, created_at, updated_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParkingError::PersistenceError`] if the database cannot
    /// be reached.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, ParkingError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| ParkingError::PersistenceError(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`ParkingError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), ParkingError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ParkingError::PersistenceError(e.to_string()))
    }

    async fn sensor_where(
        &self,
        filter: &str,
        bind: i64,
    ) -> Result<Vec<Sensor>, ParkingError> {
        let sql = format!(
            "SELECT {SENSOR_COLUMNS} FROM sensors s \
             JOIN esp32_devices d ON d.id = s.device_id \
             WHERE {filter} AND s.deleted_at IS NULL ORDER BY s.id"
        );
        let rows = sqlx::query_as::<_, SensorRow>(&sql)
            .bind(bind)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence_error)?;
        Ok(rows.into_iter().map(Sensor::from).collect())
    }
}

/// Maps a storage failure to [`ParkingError::PersistenceError`].
fn persistence_error(e: sqlx::Error) -> ParkingError {
    ParkingError::PersistenceError(e.to_string())
}

/// Maps constraint violations to [`ParkingError::Conflict`] with `conflict`
/// as the message; everything else is a persistence error.
fn write_error(e: sqlx::Error, conflict: &str) -> ParkingError {
    if let sqlx::Error::Database(db) = &e
        && (db.is_unique_violation() || db.is_foreign_key_violation())
    {
        return ParkingError::Conflict(conflict.to_string());
    }
    persistence_error(e)
}

fn count_to_u32(count: i64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[async_trait]
impl OccupancyStore for PostgresStore {
    async fn create_parking_lot(&self, lot: NewParkingLot) -> Result<ParkingLot, ParkingError> {
        let sql = format!(
            "INSERT INTO parking_lots (name, address, latitude, longitude, owner) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {LOT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ParkingLotRow>(&sql)
            .bind(&lot.name)
            .bind(&lot.address)
            .bind(lot.latitude)
            .bind(lot.longitude)
            .bind(&lot.owner)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, "parking lot already exists at these coordinates"))?;
        Ok(row.into())
    }

    async fn get_parking_lot(&self, id: ParkingLotId) -> Result<Option<ParkingLot>, ParkingError> {
        let sql = format!(
            "SELECT {LOT_COLUMNS} FROM parking_lots WHERE id = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, ParkingLotRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence_error)?;
        Ok(row.map(ParkingLot::from))
    }

    async fn list_parking_lots(&self) -> Result<Vec<ParkingLot>, ParkingError> {
        let sql = format!(
            "SELECT {LOT_COLUMNS} FROM parking_lots WHERE deleted_at IS NULL ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ParkingLotRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence_error)?;
        Ok(rows.into_iter().map(ParkingLot::from).collect())
    }

    async fn list_parking_lots_by_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<ParkingLot>, ParkingError> {
        let sql = format!(
            "SELECT {LOT_COLUMNS} FROM parking_lots \
             WHERE owner = $1 AND deleted_at IS NULL ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ParkingLotRow>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence_error)?;
        Ok(rows.into_iter().map(ParkingLot::from).collect())
    }

    async fn update_parking_lot(&self, lot: &ParkingLot) -> Result<(), ParkingError> {
        let result = sqlx::query(
            "UPDATE parking_lots \
             SET name = $2, address = $3, latitude = $4, longitude = $5, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(lot.id.get())
        .bind(&lot.name)
        .bind(&lot.address)
        .bind(lot.latitude)
        .bind(lot.longitude)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "another parking lot exists at these coordinates"))?;

        if result.rows_affected() == 0 {
            return Err(ParkingError::ParkingLotNotFound(lot.id));
        }
        Ok(())
    }

    async fn delete_parking_lot(&self, id: ParkingLotId) -> Result<bool, ParkingError> {
        let mut tx = self.pool.begin().await.map_err(persistence_error)?;
        let result = sqlx::query(
            "UPDATE parking_lots SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .map_err(persistence_error)?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        let sensors = sqlx::query(
            "UPDATE sensors SET deleted_at = now() \
             WHERE parking_lot_id = $1 AND deleted_at IS NULL",
        )
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .map_err(persistence_error)?;
        tx.commit().await.map_err(persistence_error)?;

        tracing::debug!(lot_id = %id, sensors = sensors.rows_affected(), "lot tombstoned");
        Ok(true)
    }

    async fn create_sensor(&self, sensor: NewSensor) -> Result<Sensor, ParkingError> {
        let sql = format!(
            "WITH ins AS ( \
                INSERT INTO sensors (parking_lot_id, device_id, sensor_number, status) \
                VALUES ($1, $2, $3, $4) RETURNING * \
             ) \
             SELECT {SENSOR_COLUMNS} FROM ins s JOIN esp32_devices d ON d.id = s.device_id"
        );
        let row = sqlx::query_as::<_, SensorRow>(&sql)
            .bind(sensor.parking_lot_id.get())
            .bind(sensor.device_id.get())
            .bind(sensor.sensor_number)
            .bind(sensor.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, "sensor number already registered on this device"))?;
        Ok(row.into())
    }

    async fn get_sensor(&self, id: SensorId) -> Result<Option<Sensor>, ParkingError> {
        let mut sensors = self.sensor_where("s.id = $1", id.get()).await?;
        Ok(sensors.pop())
    }

    async fn find_sensor_by_device(
        &self,
        device_identifier: &str,
        sensor_number: i32,
    ) -> Result<Option<Sensor>, ParkingError> {
        let sql = format!(
            "SELECT {SENSOR_COLUMNS} FROM sensors s \
             JOIN esp32_devices d ON d.id = s.device_id \
             WHERE d.device_identifier = $1 AND s.sensor_number = $2 \
             AND s.deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, SensorRow>(&sql)
            .bind(device_identifier)
            .bind(sensor_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence_error)?;
        Ok(row.map(Sensor::from))
    }

    async fn list_sensors_by_lot(&self, lot: ParkingLotId) -> Result<Vec<Sensor>, ParkingError> {
        self.sensor_where("s.parking_lot_id = $1", lot.get()).await
    }

    async fn list_sensors_by_device(
        &self,
        device: DeviceId,
    ) -> Result<Vec<Sensor>, ParkingError> {
        self.sensor_where("s.device_id = $1", device.get()).await
    }

    async fn update_sensor_status(
        &self,
        id: SensorId,
        status: SensorStatus,
    ) -> Result<Sensor, ParkingError> {
        let sql = format!(
            "WITH upd AS ( \
                UPDATE sensors SET status = $2, updated_at = now() \
                WHERE id = $1 AND deleted_at IS NULL RETURNING * \
             ) \
             SELECT {SENSOR_COLUMNS} FROM upd s JOIN esp32_devices d ON d.id = s.device_id"
        );
        let row = sqlx::query_as::<_, SensorRow>(&sql)
            .bind(id.get())
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence_error)?;
        row.map(Sensor::from)
            .ok_or_else(|| ParkingError::sensor_not_found(id))
    }

    async fn delete_sensor(&self, id: SensorId) -> Result<bool, ParkingError> {
        let result =
            sqlx::query("UPDATE sensors SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id.get())
                .execute(&self.pool)
                .await
                .map_err(persistence_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_free_sensors_by_lot(&self) -> Result<HashMap<ParkingLotId, u32>, ParkingError> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            "SELECT parking_lot_id, COUNT(*) FROM sensors \
             WHERE status = $1 AND deleted_at IS NULL GROUP BY parking_lot_id",
        )
        .bind(SensorStatus::FREE_MARKER)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_error)?;

        Ok(rows
            .into_iter()
            .map(|(lot_id, count)| (ParkingLotId::new(lot_id), count_to_u32(count)))
            .collect())
    }

    async fn create_device(&self, device_identifier: &str) -> Result<Esp32Device, ParkingError> {
        let row = sqlx::query_as::<_, DeviceRow>(
            "INSERT INTO esp32_devices (device_identifier) VALUES ($1) \
             RETURNING id, device_identifier, last_communication",
        )
        .bind(device_identifier)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "device identifier already registered"))?;
        Ok(row.into())
    }

    async fn get_device(&self, id: DeviceId) -> Result<Option<Esp32Device>, ParkingError> {
        let row = sqlx::query_as::<_, DeviceRow>(
            "SELECT id, device_identifier, last_communication FROM esp32_devices WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence_error)?;
        Ok(row.map(Esp32Device::from))
    }

    async fn find_device_by_identifier(
        &self,
        device_identifier: &str,
    ) -> Result<Option<Esp32Device>, ParkingError> {
        let row = sqlx::query_as::<_, DeviceRow>(
            "SELECT id, device_identifier, last_communication FROM esp32_devices \
             WHERE device_identifier = $1",
        )
        .bind(device_identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence_error)?;
        Ok(row.map(Esp32Device::from))
    }

    async fn list_devices(&self) -> Result<Vec<Esp32Device>, ParkingError> {
        let rows = sqlx::query_as::<_, DeviceRow>(
            "SELECT id, device_identifier, last_communication FROM esp32_devices ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_error)?;
        Ok(rows.into_iter().map(Esp32Device::from).collect())
    }

    async fn update_device(&self, device: &Esp32Device) -> Result<(), ParkingError> {
        let result = sqlx::query("UPDATE esp32_devices SET device_identifier = $2 WHERE id = $1")
            .bind(device.id.get())
            .bind(&device.device_identifier)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, "device identifier already registered"))?;
        if result.rows_affected() == 0 {
            return Err(ParkingError::DeviceNotFound(format!("id {}", device.id)));
        }
        Ok(())
    }

    async fn touch_device(&self, id: DeviceId, at: DateTime<Utc>) -> Result<(), ParkingError> {
        sqlx::query("UPDATE esp32_devices SET last_communication = $2 WHERE id = $1")
            .bind(id.get())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(persistence_error)?;
        Ok(())
    }

    async fn delete_device(&self, id: DeviceId) -> Result<bool, ParkingError> {
        let live: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sensors WHERE device_id = $1 AND deleted_at IS NULL",
        )
        .bind(id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(persistence_error)?;
        if live > 0 {
            return Err(ParkingError::Conflict(format!(
                "device {id} still has {live} sensor(s)"
            )));
        }

        let result = sqlx::query("DELETE FROM esp32_devices WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, "device is still referenced by sensors"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_admin(&self, subject: &str) -> Result<Admin, ParkingError> {
        let sql = format!("INSERT INTO admins (subject) VALUES ($1) RETURNING {ADMIN_COLUMNS}");
        let row = sqlx::query_as::<_, AdminRow>(&sql)
            .bind(subject)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, "admin already registered"))?;
        Ok(row.into())
    }

    async fn find_admin_by_subject(&self, subject: &str) -> Result<Option<Admin>, ParkingError> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE subject = $1");
        let row = sqlx::query_as::<_, AdminRow>(&sql)
            .bind(subject)
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence_error)?;
        Ok(row.map(Admin::from))
    }

    async fn update_admin(&self, admin: &Admin) -> Result<(), ParkingError> {
        let result = sqlx::query(
            "UPDATE admins SET nit = $2, photo_url = $3, contact_phone = $4, updated_at = now() \
             WHERE id = $1",
        )
        .bind(admin.id.get())
        .bind(&admin.nit)
        .bind(&admin.photo_url)
        .bind(&admin.contact_phone)
        .execute(&self.pool)
        .await
        .map_err(persistence_error)?;
        if result.rows_affected() == 0 {
            return Err(ParkingError::AdminNotFound(admin.subject.clone()));
        }
        Ok(())
    }
}
