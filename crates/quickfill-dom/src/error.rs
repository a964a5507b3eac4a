use thiserror::Error;

/// Why a selector could not be evaluated.
///
/// Discovery treats every variant the same way: log it and move on to the
/// next rule. The distinction exists so logs say what actually went wrong.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unsupported selector syntax: {0}")]
    Unsupported(String),
    #[error("unterminated selector part: {0}")]
    Unterminated(String),
}
