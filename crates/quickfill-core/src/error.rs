use quickfill_dom::SelectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuickfillError {
    #[error("configuration payload error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("selector error: {0}")]
    Selector(#[from] SelectorError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, QuickfillError>;
