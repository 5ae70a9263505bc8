//! Crate-wide error type.
//!
//! The animation core itself is infallible arithmetic; only the render
//! backend selection, configuration loading and the chat collaborator can
//! fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AvatarError {
    /// No rasterizer could be created on this host.
    #[error("render surface unavailable: {0}")]
    RenderUnavailable(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("chat backend error: {0}")]
    Chat(String),

    #[error("message is empty")]
    EmptyMessage,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AvatarError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn render_unavailable_display() {
        let e = AvatarError::RenderUnavailable("no adapter".into());
        assert!(e.to_string().contains("no adapter"));
    }

    #[test]
    fn chat_error_display() {
        let e = AvatarError::Chat("connection refused".into());
        assert!(e.to_string().starts_with("chat backend error"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AvatarError = io_err.into();
        assert!(e.to_string().contains("io error"));
        let _: &dyn Error = &e;
    }
}
