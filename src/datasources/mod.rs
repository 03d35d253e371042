//! Built-in datasource constructors. Each returns a `Node`; nothing is
//! evaluated until the node is solved.
pub mod frequencies;
pub mod vectorizers;
