use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::application::errors::StorageError;
use crate::domain::entities::{
    LevelField, Levels, Matched, NewVehicle, OwnerId, Vehicle, VehicleId,
    DEFAULT_FUEL_KM, DEFAULT_OIL_KM, DEFAULT_TYRE_PCT,
};
use crate::domain::traits::VehicleStore;

const VEHICLE_COLUMNS: &str = "id, user_id, name, fuel_km_left, oil_km_left, tyre_pct";

/// SQLite-backed vehicle store.
///
/// One connection, locked for the span of a single statement.
pub struct SqliteVehicleStore {
    conn: Mutex<Connection>,
}

impl SqliteVehicleStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        init_tables(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn query_vehicles(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Vehicle>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, vehicle_from_row)?;

        let mut vehicles = Vec::new();
        for vehicle in rows {
            vehicles.push(vehicle?);
        }
        Ok(vehicles)
    }
}

/// Create the table and apply the additive tyre migration. Safe to run repeatedly.
fn init_tables(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS vehicles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                fuel_km_left INTEGER DEFAULT {DEFAULT_FUEL_KM},
                oil_km_left INTEGER DEFAULT {DEFAULT_OIL_KM}
            )"
        ),
        [],
    )?;

    if !has_column(conn, "vehicles", "tyre_pct")? {
        let added = conn.execute(
            &format!("ALTER TABLE vehicles ADD COLUMN tyre_pct INTEGER DEFAULT {DEFAULT_TYRE_PCT}"),
            [],
        );
        match added {
            Ok(_) => tracing::info!("Migrated vehicles table: added tyre_pct"),
            Err(e) if is_duplicate_column(&e) => {
                tracing::debug!("tyre_pct column already present");
            }
            Err(e) => return Err(e.into()),
        }
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_vehicles_owner ON vehicles(user_id)",
        [],
    )?;

    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool, StorageError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2",
            params![table, column],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn is_duplicate_column(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.contains("duplicate column name"),
        _ => false,
    }
}

fn vehicle_from_row(row: &Row<'_>) -> rusqlite::Result<Vehicle> {
    // Rows written before the migration may carry NULL levels
    Ok(Vehicle {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        fuel_km_left: row.get::<_, Option<i64>>(3)?.unwrap_or(DEFAULT_FUEL_KM),
        oil_km_left: row.get::<_, Option<i64>>(4)?.unwrap_or(DEFAULT_OIL_KM),
        tyre_pct: row.get::<_, Option<i64>>(5)?.unwrap_or(DEFAULT_TYRE_PCT),
    })
}

impl VehicleStore for SqliteVehicleStore {
    fn create(&self, vehicle: &NewVehicle) -> Result<VehicleId, StorageError> {
        let levels = vehicle.initial_levels();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO vehicles (user_id, name, fuel_km_left, oil_km_left, tyre_pct)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                vehicle.owner_id,
                vehicle.name,
                levels.fuel_km_left,
                levels.oil_km_left,
                levels.tyre_pct
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list(&self, owner_id: OwnerId) -> Result<Vec<Vehicle>, StorageError> {
        self.query_vehicles(
            &format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE user_id = ?1 ORDER BY id"),
            [owner_id],
        )
    }

    fn list_all(&self) -> Result<Vec<Vehicle>, StorageError> {
        self.query_vehicles(&format!("SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY id"), [])
    }

    fn update_field(
        &self,
        owner_id: OwnerId,
        name: &str,
        field: LevelField,
        value: i64,
    ) -> Result<Matched, StorageError> {
        let sql = match field {
            LevelField::Fuel => "UPDATE vehicles SET fuel_km_left = ?1 WHERE user_id = ?2 AND name = ?3",
            LevelField::Oil => "UPDATE vehicles SET oil_km_left = ?1 WHERE user_id = ?2 AND name = ?3",
        };
        let rows = self.conn()?.execute(sql, params![field.clamp(value), owner_id, name])?;
        Ok(Matched::from_rows(rows))
    }

    fn remove_by_name(&self, owner_id: OwnerId, name: &str) -> Result<Matched, StorageError> {
        let rows = self.conn()?.execute(
            "DELETE FROM vehicles WHERE user_id = ?1 AND name = ?2",
            params![owner_id, name],
        )?;
        Ok(Matched::from_rows(rows))
    }

    fn reset_owner(&self, owner_id: OwnerId) -> Result<Matched, StorageError> {
        let rows = self.conn()?.execute("DELETE FROM vehicles WHERE user_id = ?1", [owner_id])?;
        Ok(Matched::from_rows(rows))
    }

    fn write_decayed(&self, id: VehicleId, levels: Levels) -> Result<Matched, StorageError> {
        let levels = levels.clamped();
        let rows = self.conn()?.execute(
            "UPDATE vehicles SET fuel_km_left = ?1, oil_km_left = ?2, tyre_pct = ?3 WHERE id = ?4",
            params![levels.fuel_km_left, levels.oil_km_left, levels.tyre_pct, id],
        )?;
        Ok(Matched::from_rows(rows))
    }
}
