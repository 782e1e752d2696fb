use thiserror::Error;

#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("no candidates to draw from")]
    EmptyPool,

    #[error("duplicate candidate id: {0}")]
    DuplicateCandidate(String),

    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}
