use std::collections::HashSet;

use glam::Vec3;

use crate::{Action, MoveDirection};

/// Set of held movement keys.
#[derive(Debug, Clone, Default)]
pub struct MovementState {
    held: HashSet<MoveDirection>,
}

impl MovementState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, direction: MoveDirection) {
        self.held.insert(direction);
    }

    pub fn release(&mut self, direction: MoveDirection) {
        self.held.remove(&direction);
    }

    pub fn is_held(&self, direction: MoveDirection) -> bool {
        self.held.contains(&direction)
    }

    /// Apply a `Move` action; other actions are ignored.
    pub fn apply(&mut self, action: &Action) {
        if let Action::Move { direction, pressed } = *action {
            if pressed {
                self.press(direction);
            } else {
                self.release(direction);
            }
        }
    }

    /// Forget every held key, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }

    /// Camera-local movement axis: x = right, y = up, z = forward.
    ///
    /// Each component is -1, 0 or 1.
    pub fn local_axis(&self) -> Vec3 {
        let axis = |pos: MoveDirection, neg: MoveDirection| {
            self.is_held(pos) as i32 as f32 - self.is_held(neg) as i32 as f32
        };
        Vec3::new(
            axis(MoveDirection::Right, MoveDirection::Left),
            axis(MoveDirection::Up, MoveDirection::Down),
            axis(MoveDirection::Forward, MoveDirection::Backward),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_zero() {
        assert_eq!(MovementState::new().local_axis(), Vec3::ZERO);
    }

    #[test]
    fn held_keys_map_to_axes() {
        let mut state = MovementState::new();
        state.press(MoveDirection::Forward);
        state.press(MoveDirection::Left);
        assert_eq!(state.local_axis(), Vec3::new(-1.0, 0.0, 1.0));
        state.release(MoveDirection::Forward);
        assert_eq!(state.local_axis(), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut state = MovementState::new();
        state.press(MoveDirection::Up);
        state.press(MoveDirection::Down);
        assert_eq!(state.local_axis(), Vec3::ZERO);
    }

    #[test]
    fn apply_tracks_press_and_release() {
        let mut state = MovementState::new();
        state.apply(&Action::Move {
            direction: MoveDirection::Backward,
            pressed: true,
        });
        assert!(state.is_held(MoveDirection::Backward));
        state.apply(&Action::Look { dx: 1.0, dy: 1.0 });
        assert!(state.is_held(MoveDirection::Backward));
        state.apply(&Action::Move {
            direction: MoveDirection::Backward,
            pressed: false,
        });
        assert!(!state.is_held(MoveDirection::Backward));
    }

    #[test]
    fn clear_releases_everything() {
        let mut state = MovementState::new();
        state.press(MoveDirection::Right);
        state.clear();
        assert_eq!(state.local_axis(), Vec3::ZERO);
    }
}
