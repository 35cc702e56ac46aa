//! Desktop input mapped to platform-neutral actions.
//!
//! # Invariants
//! - The application loop consumes actions and movement state, never raw
//!   window events.
//! - Opposing movement keys cancel out.

pub mod action;
pub mod movement;

pub use action::{Action, MouseCapture, MoveDirection};
pub use movement::MovementState;

pub fn crate_info() -> &'static str {
    "phongview-input v0.1.0"
}
