pub type Result<T> = std::result::Result<T, PoolError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("pool exhausted: all {capacity} slots are allocated")]
    Exhausted { capacity: usize },

    #[error("VM id already allocated: {0}")]
    DuplicateId(String),

    #[error("VM id not allocated: {0}")]
    UnknownId(String),

    #[error("invalid release: index {index} is not a live allocation")]
    InvalidRelease { index: usize },

    #[error("capacity {requested} exceeds the {max}-interface addressable range")]
    CapacityExceeded { requested: usize, max: usize },
}
