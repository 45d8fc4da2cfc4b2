//! `stockroom-cli` — command-line front end for the inventory.
//!
//! Opens the inventory file, runs one command, and saves when the command
//! changed anything.

pub mod commands;
pub mod config;

pub use commands::{execute, Cli, Command};
pub use config::StockroomConfig;
