//! Dependency-graph engine for computing derived datasources.
//!
//! Graphs are declared as immutable [`Node`]s and evaluated on demand by a
//! [`Solver`], which walks the dependency closure of the requested targets,
//! computes each missing node at most once and returns exactly the values
//! asked for. Nodes compare structurally, so graphs built independently or
//! decoded with [`serialization`] are interchangeable cache keys.

pub mod analysis;
pub mod compute;
pub mod config;
pub mod datasources;
pub mod display;
pub mod serialization;
pub mod store;

pub use compute::{RegistryError, Solution, SolveError, Solver, Transform, TransformError, TransformRegistry};
pub use config::SolverConfig;
pub use store::{Cache, Node, Operation, Value};
