//! Speech stand-ins that drive the avatar's `speaking` and `listening`
//! signals.
//!
//! [`SpeechOutput`] times an utterance from its word count and speaking
//! rate; [`ListenSession`] holds the listening state while the user
//! dictates, until a transcript arrives or recognition fails.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::signals::SignalMailbox;

/// Speaking rate relative to normal speech.
pub const DEFAULT_RATE: f32 = 0.92;
/// Words per second at rate 1.0.
pub const DEFAULT_WORDS_PER_SECOND: f32 = 2.6;
/// Fixed lead-in and tail of every utterance.
const UTTERANCE_PAD: Duration = Duration::from_millis(300);

/// Languages offered for speech and chat replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-IN")]
    English,
    #[serde(rename = "hi-IN")]
    Hindi,
    #[serde(rename = "ta-IN")]
    Tamil,
    #[serde(rename = "te-IN")]
    Telugu,
    #[serde(rename = "bn-IN")]
    Bengali,
    #[serde(rename = "mr-IN")]
    Marathi,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Hindi,
        Language::Tamil,
        Language::Telugu,
        Language::Bengali,
        Language::Marathi,
    ];

    /// BCP 47 tag
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en-IN",
            Language::Hindi => "hi-IN",
            Language::Tamil => "ta-IN",
            Language::Telugu => "te-IN",
            Language::Bengali => "bn-IN",
            Language::Marathi => "mr-IN",
        }
    }

    /// Name in the language itself
    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "हिंदी",
            Language::Tamil => "தமிழ்",
            Language::Telugu => "తెలుగు",
            Language::Bengali => "বাংলা",
            Language::Marathi => "मराठी",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code().eq_ignore_ascii_case(code))
    }
}

/// How long `text` takes to say at `rate`.
pub fn estimate_duration(text: &str, rate: f32, words_per_second: f32) -> Duration {
    let words = text.split_whitespace().count();
    if words == 0 {
        return Duration::ZERO;
    }
    let wps = (words_per_second * rate).max(0.1);
    UTTERANCE_PAD + Duration::from_secs_f32(words as f32 / wps)
}

#[derive(Debug, Clone)]
struct Utterance {
    text: String,
    ends_at: Instant,
}

/// Speech output. One utterance at a time; a new one replaces the old.
#[derive(Debug)]
pub struct SpeechOutput {
    signals: Arc<SignalMailbox>,
    rate: f32,
    words_per_second: f32,
    current: Option<Utterance>,
    spoken: u64,
}

impl SpeechOutput {
    pub fn new(signals: Arc<SignalMailbox>, rate: f32, words_per_second: f32) -> Self {
        Self {
            signals,
            rate,
            words_per_second,
            current: None,
            spoken: 0,
        }
    }

    /// Start saying `text`, cancelling anything in progress. Returns the
    /// estimated length; blank text says nothing.
    pub fn speak(&mut self, text: &str, now: Instant) -> Duration {
        self.cancel();
        let length = estimate_duration(text, self.rate, self.words_per_second);
        if length.is_zero() {
            return length;
        }
        log::debug!("speaking {} words for {:?}", text.split_whitespace().count(), length);
        self.current = Some(Utterance {
            text: text.to_string(),
            ends_at: now + length,
        });
        self.spoken += 1;
        self.signals.set_speaking(true);
        length
    }

    /// Finish the utterance once its time is up. Returns whether it is
    /// still running.
    pub fn poll(&mut self, now: Instant) -> bool {
        match &self.current {
            Some(u) if now >= u.ends_at => {
                self.current = None;
                self.signals.set_speaking(false);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn cancel(&mut self) {
        if self.current.take().is_some() {
            self.signals.set_speaking(false);
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_text(&self) -> Option<&str> {
        self.current.as_ref().map(|u| u.text.as_str())
    }

    /// Time left in the current utterance.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.current
            .as_ref()
            .map(|u| u.ends_at.saturating_duration_since(now))
    }

    pub fn utterances_spoken(&self) -> u64 {
        self.spoken
    }
}

/// Why a listen session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenOutcome {
    Transcript(String),
    Failed,
}

/// A dictation session. `listening` stays raised from [`start`] until the
/// session finishes or fails.
///
/// [`start`]: ListenSession::start
#[derive(Debug)]
pub struct ListenSession {
    signals: Arc<SignalMailbox>,
    language: Language,
    active: bool,
}

impl ListenSession {
    pub fn new(signals: Arc<SignalMailbox>) -> Self {
        Self {
            signals,
            language: Language::default(),
            active: false,
        }
    }

    pub fn start(&mut self, language: Language) {
        self.language = language;
        self.active = true;
        self.signals.set_listening(true);
        log::debug!("listening ({})", language.code());
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// End with a recognised transcript. Blank transcripts count as failure.
    pub fn finish(&mut self, transcript: &str) -> ListenOutcome {
        self.stop();
        let text = transcript.trim();
        if text.is_empty() {
            ListenOutcome::Failed
        } else {
            ListenOutcome::Transcript(text.to_string())
        }
    }

    pub fn fail(&mut self) -> ListenOutcome {
        self.stop();
        ListenOutcome::Failed
    }

    fn stop(&mut self) {
        self.active = false;
        self.signals.set_listening(false);
    }
}
