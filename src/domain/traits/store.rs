use crate::application::errors::StorageError;
use crate::domain::entities::{LevelField, Levels, Matched, NewVehicle, OwnerId, Vehicle, VehicleId};

/// Store trait - persistence for vehicle records.
///
/// Every call is one short statement that is durable when it returns. Lookups by
/// name are scoped to the owner and match every row with that name.
pub trait VehicleStore: Send + Sync {
    /// Insert a vehicle and return its surrogate id. Duplicate names are allowed.
    fn create(&self, vehicle: &NewVehicle) -> Result<VehicleId, StorageError>;

    /// Vehicles of one owner in insertion order
    fn list(&self, owner_id: OwnerId) -> Result<Vec<Vehicle>, StorageError>;

    /// Every vehicle of every owner
    fn list_all(&self) -> Result<Vec<Vehicle>, StorageError>;

    /// Set fuel or oil on every vehicle of the owner with this name
    fn update_field(
        &self,
        owner_id: OwnerId,
        name: &str,
        field: LevelField,
        value: i64,
    ) -> Result<Matched, StorageError>;

    /// Delete every vehicle of the owner with this name
    fn remove_by_name(&self, owner_id: OwnerId, name: &str) -> Result<Matched, StorageError>;

    /// Delete all vehicles of the owner
    fn reset_owner(&self, owner_id: OwnerId) -> Result<Matched, StorageError>;

    /// Overwrite the three levels of one vehicle
    fn write_decayed(&self, id: VehicleId, levels: Levels) -> Result<Matched, StorageError>;
}
