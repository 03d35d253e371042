//! Structural queries over node graphs.
pub mod topology;
