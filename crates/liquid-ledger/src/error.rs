/// Errors produced by change log operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid change log limits: retain {retain} must be between 1 and max {max}")]
    InvalidLimits { max: usize, retain: usize },
}
