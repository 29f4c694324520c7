//! Survey responses in, open-data certificates out.
//!
//! A request keyed by question reference identifiers is resolved into
//! responses on a response set, validated, and, when complete, published as
//! the dataset's certificate.

pub mod answer;
pub mod autopopulate;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod factory;
pub mod generator;
pub mod response_set;
pub mod storage;
pub mod users;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
