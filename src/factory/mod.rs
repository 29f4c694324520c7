pub mod service;
pub mod worker;

pub use service::{CertificateFactory, QueueOptions, Queued};
pub use worker::GenerationWorkers;
