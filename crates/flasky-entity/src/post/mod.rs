//! Blog posts.

pub mod model;

pub use model::{NewPost, Post};
