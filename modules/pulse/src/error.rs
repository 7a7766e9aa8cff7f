use newsroom_common::NewsroomError;

/// Result type alias for pulse operations.
pub type Result<T> = std::result::Result<T, PulseError>;

#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// The strategy row must be seeded before the planner can run.
    #[error("No editorial strategy found")]
    StrategyMissing,

    #[error("Weight map {0} is empty")]
    EmptyWeights(&'static str),

    #[error(transparent)]
    Newsroom(#[from] NewsroomError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl PulseError {
    /// Configuration problems are fatal and never retried.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            PulseError::StrategyMissing
                | PulseError::EmptyWeights(_)
                | PulseError::Newsroom(NewsroomError::Config(_))
                | PulseError::Newsroom(NewsroomError::Validation(_))
        )
    }
}
