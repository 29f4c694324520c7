use crate::response_set::{ResponseSetEvent, ResponseSetState};

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Jurisdiction not found")]
    JurisdictionNotFound,
    #[error("Dataset not found")]
    DatasetNotFound,
    #[error("modifications are not allowed on this response set")]
    ModificationsNotAllowed,
    #[error("unhandled question type: {0}")]
    UnhandledQuestionType(String),
    #[error("question '{0}' has no answer to store a response against")]
    MissingAnswer(String),
    #[error("cannot {event} a response set in state {from}")]
    IllegalTransition {
        from: ResponseSetState,
        event: ResponseSetEvent,
    },
    #[error("unknown response set state: {0}")]
    CorruptState(String),
    #[error("certificate generator {0} not found")]
    GeneratorNotFound(i32),
    #[error("response set {0} not found")]
    ResponseSetNotFound(i32),
    #[error("user {0} not found")]
    UserNotFound(i32),
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
