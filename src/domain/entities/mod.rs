//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod command;
pub mod vehicle;

pub use user::User;
pub use message::{Message, Content};
pub use command::{Command, CommandRegistry};
pub use vehicle::{
    Levels, LevelField, Matched, NewVehicle, OwnerId, Vehicle, VehicleId,
    DEFAULT_FUEL_KM, DEFAULT_OIL_KM, DEFAULT_TYRE_PCT,
};
