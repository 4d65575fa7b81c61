// Public API - only expose the runner module
pub mod runner;

// Internal modules - organized by subsystem
mod audit;
mod checks;
mod config;
mod error;
mod provider;
mod report;
mod tasks;
mod telemetry;
