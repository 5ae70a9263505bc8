//! Ambient effects around the bust: orbiting particles and holographic rings.

pub mod particles;
pub mod rings;

pub use particles::ParticleField;
pub use rings::{ring_opacity, RingSet};
