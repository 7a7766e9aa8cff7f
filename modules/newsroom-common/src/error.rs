use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsroomError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown job status: {0}")]
    UnknownStatus(String),
}

/// True when a `NewsroomError::Config` sits anywhere in the cause chain.
/// Such runs fail the same way on every retry.
pub fn is_config_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<NewsroomError>(),
            Some(NewsroomError::Config(_))
        )
    })
}
