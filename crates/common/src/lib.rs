//! Shared types for the phongview workspace.

mod types;

pub use types::Transform;
