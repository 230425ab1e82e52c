//! Ownership-based access control for authored content.

pub mod gate;

pub use gate::ContentGate;
