//! Procedural holographic officer avatar.
//!
//! A bust built entirely from primitive solids, animated every frame from
//! two external signals (`speaking`, `listening`) and a fixed-step clock,
//! and raymarched into a pixel surface on the GPU or CPU.

pub mod anim;
pub mod chat;
pub mod config;
pub mod error;
pub mod fx;
pub mod render;
pub mod rig;
pub mod scene;
pub mod signals;
pub mod viewport;
pub mod voice;

pub use error::{AvatarError, Result};
pub use scene::AvatarScene;
pub use signals::{SignalMailbox, SignalSnapshot};
pub use viewport::{select_rasterizer, Container, FrameOutcome, SurfaceId, ViewportHost};
