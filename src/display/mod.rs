//! Human-readable renderings of node graphs and their solved values.
pub mod graphviz;
pub mod trace;

pub use trace::format_trace;
