//! `AvatarApp`, the top-level egui application state.
//!
//! The struct and its constructor live here; methods are split across the
//! sibling sub-modules:
//!
//! - `navigation`: chat round trips on a worker thread, speech and dictation
//! - `toolbar`:    header strip with language and avatar controls
//! - `content`:    avatar viewport, nameplate, waveform and chat log

pub mod content;
pub mod navigation;
pub mod toolbar;

use std::sync::{mpsc, Arc};
use std::time::Instant;

use eframe::egui;

use holo_avatar::chat::{ChatClient, ChatReply};
use holo_avatar::config::AvatarConfig;
use holo_avatar::viewport::{select_rasterizer, SurfaceId, ViewportHost};
use holo_avatar::voice::{Language, ListenSession, SpeechOutput};
use holo_avatar::{Result, SignalMailbox};

use content::EguiContainer;

pub const GREETING: &str = "Namaste! I am your AI Digital Government Officer. I can help you \
with scholarships, pensions, ration cards, land records, birth certificates, employment schemes, \
and all e-governance services. How may I assist you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    Officer,
    Citizen,
}

#[derive(Debug, Clone)]
pub struct ChatLine {
    pub sender: Sender,
    pub text: String,
}

impl ChatLine {
    pub fn officer(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Officer,
            text: text.into(),
        }
    }

    pub fn citizen(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Citizen,
            text: text.into(),
        }
    }
}

/// What the status row shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    Speaking,
    Listening,
    Thinking,
}

impl Status {
    pub fn color(self) -> egui::Color32 {
        match self {
            Status::Ready => egui::Color32::from_rgb(0x4a, 0x90, 0xd9),
            Status::Speaking => egui::Color32::from_rgb(0x00, 0xff, 0x88),
            Status::Listening => egui::Color32::from_rgb(0xff, 0x6b, 0x35),
            Status::Thinking => egui::Color32::from_rgb(0xc5, 0xa0, 0x28),
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Status::Ready => "Ready to assist",
            Status::Speaking => "Officer speaking...",
            Status::Listening => "Listening...",
            Status::Thinking => "Processing query...",
        }
    }
}

// ─── Application state ───────────────────────────────────────────────────────

pub struct AvatarApp {
    pub config: AvatarConfig,
    pub signals: Arc<SignalMailbox>,
    pub host: ViewportHost,
    pub panel: EguiContainer,
    /// Set when no rasterizer could be created; the panel shows a still placeholder
    pub render_error: Option<String>,
    pub avatar_visible: bool,
    pub texture: Option<egui::TextureHandle>,
    /// Surface and generation last uploaded into `texture`
    pub uploaded: Option<(SurfaceId, u64)>,
    pub chat: Option<ChatClient>,
    pub speech: SpeechOutput,
    pub listen: ListenSession,
    pub messages: Vec<ChatLine>,
    pub input: String,
    pub language: Language,
    pub loading: bool,
    pub reply_rx: Option<mpsc::Receiver<Result<ChatReply>>>,
    pub app_start: Instant,
}

impl AvatarApp {
    pub fn new(config: AvatarConfig) -> Self {
        let signals = Arc::new(SignalMailbox::new());
        let chat = match ChatClient::new(&config.chat) {
            Ok(client) => Some(client),
            Err(e) => {
                log::error!("{e}");
                None
            }
        };
        let speech = SpeechOutput::new(
            Arc::clone(&signals),
            config.voice.rate,
            config.voice.words_per_second,
        );
        let mut app = Self {
            host: ViewportHost::new(config.viewport.clone(), config.particles.clone()),
            panel: EguiContainer::default(),
            render_error: None,
            avatar_visible: true,
            texture: None,
            uploaded: None,
            chat,
            speech,
            listen: ListenSession::new(Arc::clone(&signals)),
            messages: vec![ChatLine::officer(GREETING)],
            input: String::new(),
            language: config.voice.language,
            loading: false,
            reply_rx: None,
            app_start: Instant::now(),
            signals,
            config,
        };
        app.mount_avatar();
        app.check_backend();
        app
    }

    /// Pick a rasterizer and mount the avatar into the panel. On failure the
    /// panel falls back to the static placeholder.
    pub fn mount_avatar(&mut self) {
        let mounted = select_rasterizer(&self.config.viewport).and_then(|rasterizer| {
            self.host
                .mount(&mut self.panel, Arc::clone(&self.signals), rasterizer)
        });
        match mounted {
            Ok(()) => self.render_error = None,
            Err(e) => {
                log::error!("avatar unavailable: {e}");
                self.render_error = Some(e.to_string());
            }
        }
    }

    pub fn unmount_avatar(&mut self) {
        self.host.teardown(&mut self.panel);
        self.texture = None;
        self.uploaded = None;
    }

    pub fn status(&self) -> Status {
        if self.loading {
            Status::Thinking
        } else if self.listen.is_active() {
            Status::Listening
        } else if self.speech.is_speaking() {
            Status::Speaking
        } else {
            Status::Ready
        }
    }
}

impl eframe::App for AvatarApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_reply(ctx);
        self.speech.poll(Instant::now());

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::SidePanel::left("avatar_panel")
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| {
                self.draw_avatar_panel(ui, ctx);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_conversation(ui, ctx);
        });

        if self.host.wants_frame() || self.speech.is_speaking() || self.loading {
            ctx.request_repaint();
        }
    }
}
