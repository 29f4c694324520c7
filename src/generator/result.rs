use crate::error::{EngineError, EngineResult};
use serde::Serialize;

/// Body returned to API clients after an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub success: bool,
    pub published: bool,
    pub errors: Vec<String>,
}

impl UpdateOutcome {
    /// Lookup failures become an unsuccessful body; anything else stays an error.
    pub fn failure(err: &EngineError) -> Option<Self> {
        match err {
            EngineError::JurisdictionNotFound | EngineError::DatasetNotFound => Some(Self {
                success: false,
                published: false,
                errors: vec![err.to_string()],
            }),
            _ => None,
        }
    }

    pub fn from_result(result: EngineResult<Self>) -> EngineResult<Self> {
        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) => Self::failure(&err).ok_or(err),
        }
    }
}

/// Status of the latest generation for a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GenerationResult {
    Pending {
        success: &'static str,
        dataset_url: String,
    },
    Finished {
        success: bool,
        published: bool,
        owner_email: Option<String>,
        errors: Vec<String>,
        dataset_url: String,
    },
}

impl GenerationResult {
    pub fn pending(dataset_url: String) -> Self {
        GenerationResult::Pending {
            success: "pending",
            dataset_url,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, GenerationResult::Pending { .. })
    }
}
