//! CLI module for Parley

pub mod app;
pub mod commands;

pub use app::{summarize, DomainReport, ParleyApp};
pub use commands::{Cli, Commands, SimulateArgs};
