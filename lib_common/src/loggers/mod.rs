/// `tracing` subscriber setup with console output and a daily rotated JSON file.
pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogOptions, LoggerError};
