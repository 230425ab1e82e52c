//! Follow-graph edges.

pub mod model;

pub use model::Follow;
