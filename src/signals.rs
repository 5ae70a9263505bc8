//! External state slots written by collaborators and read by the frame loop.
//!
//! Last write wins. The driver takes one [`SignalSnapshot`] at the top of
//! each frame so both flags are read together.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SignalMailbox {
    speaking: AtomicBool,
    listening: AtomicBool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalSnapshot {
    pub speaking: bool,
    pub listening: bool,
}

impl SignalMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_speaking(&self, on: bool) {
        self.speaking.store(on, Ordering::Release);
    }

    pub fn set_listening(&self, on: bool) {
        self.listening.store(on, Ordering::Release);
    }

    pub fn snapshot(&self) -> SignalSnapshot {
        SignalSnapshot {
            speaking: self.speaking.load(Ordering::Acquire),
            listening: self.listening.load(Ordering::Acquire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn last_write_wins() {
        let m = SignalMailbox::new();
        m.set_speaking(true);
        m.set_speaking(false);
        m.set_listening(true);
        assert_eq!(
            m.snapshot(),
            SignalSnapshot {
                speaking: false,
                listening: true
            }
        );
    }

    #[test]
    fn writes_from_other_threads_are_seen() {
        let m = Arc::new(SignalMailbox::new());
        let w = Arc::clone(&m);
        std::thread::spawn(move || w.set_speaking(true))
            .join()
            .unwrap();
        assert!(m.snapshot().speaking);
    }
}
