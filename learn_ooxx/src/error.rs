/// Errors raised outside the game core: rate windows, configuration and table files.
#[derive(Debug, thiserror::Error)]
pub enum LearnError {
    #[error("window of {duration} games is longer than the {total} recorded games")]
    WindowTooLong { duration: usize, total: usize },

    #[error("window step must be at least one game")]
    ZeroStep,

    #[error("window duration must be at least one game")]
    ZeroDuration,

    #[error("invalid training config: {0}")]
    InvalidConfig(String),

    #[error("value table has {found} entries, expected {expected}")]
    TableSize { expected: usize, found: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pickle error: {0}")]
    Pickle(#[from] serde_pickle::Error),
}
