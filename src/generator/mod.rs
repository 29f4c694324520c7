//! Certificate generation from API requests.

pub mod result;
pub mod service;

pub use result::{GenerationResult, UpdateOutcome};
pub use service::GeneratorService;
