//! Driver library for the `ifacegen` binary

pub mod config;
pub mod generate;

pub use config::{ConfigFile, GeneratorConfig};
pub use generate::{process_iface, process_iface_to, run, Output};
