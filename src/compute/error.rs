use thiserror::Error;

/// Failure raised by an individual transform while computing one node.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Expected {expected} input(s), got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("Input {position} should be {expected}, found {found}")]
    TypeMismatch { position: usize, expected: &'static str, found: &'static str },
    #[error("{0}")]
    Failed(String),
}

/// Failure of a whole `solve` request. No partial results accompany it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("No value supplied for leaf node '{node}'")]
    MissingLeafValue { node: String },
    #[error("Cycle detected at node '{node}'")]
    CyclicDependency { node: String },
    #[error("Dependency depth exceeded {limit} at node '{node}'")]
    DepthLimitExceeded { node: String, limit: usize },
    #[error("Failed to evaluate node '{node}': {source}")]
    TransformEvaluation { node: String, source: TransformError },
    #[error("No transform registered for tag '{tag}' (node '{node}')")]
    UnknownTransform { node: String, tag: String },
    #[error("Name '{name}' is shared by structurally different nodes")]
    ConflictingNodeName { name: String },
}

impl SolveError {
    /// Name of the node the failure is attributed to.
    pub fn node_name(&self) -> &str {
        match self {
            SolveError::MissingLeafValue { node }
            | SolveError::CyclicDependency { node }
            | SolveError::DepthLimitExceeded { node, .. }
            | SolveError::TransformEvaluation { node, .. }
            | SolveError::UnknownTransform { node, .. } => node,
            SolveError::ConflictingNodeName { name } => name,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Transform tag '{0}' is already registered")]
    DuplicateTag(String),
    #[error("Transform tag '{0}' is reserved for a built-in operation")]
    ReservedTag(String),
}
