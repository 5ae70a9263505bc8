//! Per-frame animation: a fixed-step clock, pure motion layers and the
//! driver that writes their output into the scene.

pub mod clock;
pub mod driver;
pub mod layers;

pub use clock::{AnimationClock, FRAME_STEP};
pub use driver::{AnimationDriver, FrameReport};
