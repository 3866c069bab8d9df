// Supporting modules
pub mod config;
pub mod error;
pub mod telemetry;

// Domain layer
pub mod notification;
pub mod store;
pub mod tasks;

// Application layer
pub mod binding;
