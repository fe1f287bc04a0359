//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: Command handling and the periodic decay job
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing

pub mod errors;
pub mod services;
pub mod messaging;
