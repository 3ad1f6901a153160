use thiserror::Error;

/// Failures raised while handling a single lifecycle event or notification record.
///
/// None of these escape a handler: the trigger turns them into a FAILED response
/// (except [`HandlerError::NotFound`]) and the synchronizer logs them and moves on.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("malformed build message: {0}")]
    MalformedMessage(#[from] serde_json::Error),
    #[error("external service error: {0}")]
    ExternalService(String),
}

impl HandlerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HandlerError::NotFound(_))
    }
}
