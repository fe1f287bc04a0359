//! In-memory storage implementation

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::application::errors::StorageError;
use crate::domain::entities::{LevelField, Levels, Matched, NewVehicle, OwnerId, Vehicle, VehicleId};
use crate::domain::traits::VehicleStore;

#[derive(Default)]
struct Inner {
    vehicles: Vec<Vehicle>,
    next_id: VehicleId,
}

/// Process-local vehicle store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryVehicleStore {
    inner: RwLock<Inner>,
}

impl MemoryVehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StorageError> {
        self.inner.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StorageError> {
        self.inner.write().map_err(|_| StorageError::LockPoisoned)
    }
}

impl VehicleStore for MemoryVehicleStore {
    fn create(&self, vehicle: &NewVehicle) -> Result<VehicleId, StorageError> {
        let levels = vehicle.initial_levels();
        let mut inner = self.write()?;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.vehicles.push(Vehicle {
            id,
            owner_id: vehicle.owner_id,
            name: vehicle.name.clone(),
            fuel_km_left: levels.fuel_km_left,
            oil_km_left: levels.oil_km_left,
            tyre_pct: levels.tyre_pct,
        });
        Ok(id)
    }

    fn list(&self, owner_id: OwnerId) -> Result<Vec<Vehicle>, StorageError> {
        let inner = self.read()?;
        Ok(inner.vehicles.iter().filter(|v| v.owner_id == owner_id).cloned().collect())
    }

    fn list_all(&self) -> Result<Vec<Vehicle>, StorageError> {
        Ok(self.read()?.vehicles.clone())
    }

    fn update_field(
        &self,
        owner_id: OwnerId,
        name: &str,
        field: LevelField,
        value: i64,
    ) -> Result<Matched, StorageError> {
        let value = field.clamp(value);
        let mut inner = self.write()?;
        let mut rows = 0;
        for v in inner.vehicles.iter_mut().filter(|v| v.owner_id == owner_id && v.name == name) {
            match field {
                LevelField::Fuel => v.fuel_km_left = value,
                LevelField::Oil => v.oil_km_left = value,
            }
            rows += 1;
        }
        Ok(Matched::from_rows(rows))
    }

    fn remove_by_name(&self, owner_id: OwnerId, name: &str) -> Result<Matched, StorageError> {
        let mut inner = self.write()?;
        let before = inner.vehicles.len();
        inner.vehicles.retain(|v| !(v.owner_id == owner_id && v.name == name));
        Ok(Matched::from_rows(before - inner.vehicles.len()))
    }

    fn reset_owner(&self, owner_id: OwnerId) -> Result<Matched, StorageError> {
        let mut inner = self.write()?;
        let before = inner.vehicles.len();
        inner.vehicles.retain(|v| v.owner_id != owner_id);
        Ok(Matched::from_rows(before - inner.vehicles.len()))
    }

    fn write_decayed(&self, id: VehicleId, levels: Levels) -> Result<Matched, StorageError> {
        let levels = levels.clamped();
        let mut inner = self.write()?;
        match inner.vehicles.iter_mut().find(|v| v.id == id) {
            Some(v) => {
                v.fuel_km_left = levels.fuel_km_left;
                v.oil_km_left = levels.oil_km_left;
                v.tyre_pct = levels.tyre_pct;
                Ok(Matched::Found(1))
            }
            None => Ok(Matched::NotFound),
        }
    }
}
