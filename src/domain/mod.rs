//! Domain layer - Core business logic with no external dependencies
//! 
//! This layer contains:
//! - Entities: Core business objects (Vehicle, Message, Command)
//! - Traits: Abstractions for infrastructure (Bot, VehicleStore)
//! - Rules: Threshold and decay logic

pub mod entities;
pub mod rules;
pub mod traits;
