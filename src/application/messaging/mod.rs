//! Message handling - Turns raw platform text into commands

pub mod parser;

pub use parser::MessageParser;
