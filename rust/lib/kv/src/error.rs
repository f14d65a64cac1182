use thiserror::Error;

#[derive(Error, Debug)]
pub enum KVError {
    #[error("storage error: {0}")]
    Storage(String),

    /// A `WriteBatch` precondition did not hold. Carries the offending key.
    #[error("precondition failed for key: {0}")]
    Conflict(String),
}
