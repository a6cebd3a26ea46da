#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid job parameter: {0}")]
    InvalidParameter(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
