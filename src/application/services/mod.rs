//! Application services - Business logic orchestration

pub mod command_service;
pub mod decay_service;
pub mod vehicle_commands;

pub use command_service::CommandService;
pub use decay_service::{DecayService, PassReport};
