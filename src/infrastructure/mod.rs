// Core infrastructure modules
pub mod id_generator;          // Event id sequence
pub mod latency;               // Simulated network delay models
pub mod repository;            // In-memory entity store
pub mod request_simulator;     // Latency-bearing async boundary
pub mod viewer;                // Anonymous viewer identity

pub use id_generator::IdGenerator;
pub use latency::{FixedLatency, JitterLatency, LatencyModel, NoLatency, RequestClass};
pub use repository::EntityRepository;
pub use request_simulator::{RequestSimulator, SimulatorStats};
pub use viewer::{AnonymousIdentity, IdentityProvider, ViewerContext};
