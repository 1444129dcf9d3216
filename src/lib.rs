pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod scoring;
pub mod secret;
pub mod session;
pub mod store;
pub mod sweeper;
pub mod telemetry;
