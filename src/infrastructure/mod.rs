//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Database: SQLite vehicle store
//! - Storage: In-memory vehicle store
//! - Adapters: Platform integrations (Telegram, console)

pub mod config;
pub mod database;
pub mod storage;
pub mod adapters;
