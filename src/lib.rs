//! Vehicle care bot: tracks fuel, oil and tyre wear per user over chat commands.

pub mod domain;
pub mod application;
pub mod infrastructure;
