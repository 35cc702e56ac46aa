/// Direction of a held movement key, relative to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// A high-level action produced by the platform layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Start or stop moving in a direction.
    Move {
        direction: MoveDirection,
        pressed: bool,
    },
    /// Mouse-look delta in pixels.
    Look { dx: f32, dy: f32 },
    /// Grab or release the mouse for first-person look.
    ToggleMouseCapture,
    /// Show or hide the debug overlay.
    ToggleOverlay,
    /// Switch to the next post-processing effect.
    CycleEffect,
    Quit,
    /// No-op (used for input mapping that hasn't been bound yet).
    Noop,
}

/// Whether mouse motion drives the camera.
///
/// Starts captured: the demo opens in first-person look mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseCapture {
    captured: bool,
}

impl Default for MouseCapture {
    fn default() -> Self {
        Self { captured: true }
    }
}

impl MouseCapture {
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Flip the capture state and return the new one.
    pub fn toggle(&mut self) -> bool {
        self.captured = !self.captured;
        tracing::debug!(captured = self.captured, "mouse capture toggled");
        self.captured
    }

    /// Filter a look delta: released mice do not steer the camera.
    pub fn look_delta(&self, dx: f32, dy: f32) -> Option<(f32, f32)> {
        self.captured.then_some((dx, dy))
    }
}
