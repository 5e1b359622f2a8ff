//! Application layer containing business logic and shared state.

pub mod batch;
pub mod risk_engine;
pub mod service;
pub mod state;

pub use batch::BatchOrchestrator;
pub use risk_engine::{DEFAULT_RULES, RiskEngine, ScreeningRule};
pub use service::{ScreeningService, ServiceConfig};
pub use state::AppState;
