use newsroom_common::NewsroomError;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PhantomError>;

#[derive(Debug, thiserror::Error)]
pub enum PhantomError {
    /// The descriptor lacks a field its mode needs.
    #[error("{0}")]
    MissingInput(&'static str),

    #[error("No source material: {0}")]
    NoSource(String),

    #[error("Failed to parse AI response as JSON: {0}")]
    MalformedDraft(String),

    #[error(transparent)]
    Newsroom(#[from] NewsroomError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PhantomError {
    /// Missing credentials and malformed descriptors will fail identically on
    /// every retry.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            PhantomError::MissingInput(_) | PhantomError::Newsroom(NewsroomError::Config(_))
        )
    }
}
