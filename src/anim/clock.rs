/// Phase advance per driver invocation, in seconds.
pub const FRAME_STEP: f64 = 0.016;

/// Fixed-step animation clock.
///
/// The phase is the frame counter times [`FRAME_STEP`], kept in `f64` so a
/// single step stays resolvable for the length of any realistic session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationClock {
    frames: u64,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one frame and return the new phase.
    pub fn tick(&mut self) -> f64 {
        self.frames += 1;
        self.phase()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn phase(&self) -> f64 {
        self.frames as f64 * FRAME_STEP
    }
}
