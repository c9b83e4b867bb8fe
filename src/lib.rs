// Alumni Portal - in-memory data access and aggregation layer

// Core types and primitives
pub mod core;

// Portal records
pub mod models;

// Store, latency simulation and identity
pub mod infrastructure;

// Query, lifecycle, analytics and search surfaces
pub mod services;

// Unified read/write interface
pub mod portal;

// Common utilities
pub mod app_state;
pub mod config;
pub mod data_seeder;
pub mod error;
pub mod telemetry;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use portal::PortalService;
