use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSetState {
    Draft,
    Complete,
    Published,
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSetEvent {
    Complete,
    Publish,
    Supersede,
}

impl ResponseSetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSetState::Draft => "draft",
            ResponseSetState::Complete => "complete",
            ResponseSetState::Published => "published",
            ResponseSetState::Superseded => "superseded",
        }
    }

    /// Target state of `event`, or `IllegalTransition`.
    pub fn apply(self, event: ResponseSetEvent) -> EngineResult<Self> {
        use ResponseSetEvent as E;
        use ResponseSetState as S;

        match (self, event) {
            (S::Draft, E::Complete) => Ok(S::Complete),
            (S::Complete, E::Publish) => Ok(S::Published),
            (S::Draft, E::Supersede) => Ok(S::Superseded),
            (from, event) => Err(EngineError::IllegalTransition { from, event }),
        }
    }

    pub fn is_draft(&self) -> bool {
        *self == ResponseSetState::Draft
    }
}

impl fmt::Display for ResponseSetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseSetState {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ResponseSetState::Draft),
            "complete" => Ok(ResponseSetState::Complete),
            "published" => Ok(ResponseSetState::Published),
            "superseded" => Ok(ResponseSetState::Superseded),
            other => Err(EngineError::CorruptState(other.to_string())),
        }
    }
}

impl fmt::Display for ResponseSetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseSetEvent::Complete => "complete",
            ResponseSetEvent::Publish => "publish",
            ResponseSetEvent::Supersede => "supersede",
        };
        f.write_str(name)
    }
}
