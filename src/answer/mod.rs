pub mod payload;
pub mod resolver;

pub use payload::{FieldValue, RequestPayload};
pub use resolver::{plan_responses, resolve};
