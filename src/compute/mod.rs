//! Evaluates node graphs.
pub mod error;
pub mod kernel;
pub mod registry;
pub mod solver;

pub use error::{RegistryError, SolveError, TransformError};
pub use registry::{Transform, TransformRegistry};
pub use solver::{Solution, Solver};
