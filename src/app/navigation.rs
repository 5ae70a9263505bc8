//! Conversation methods for `AvatarApp`.
//!
//! A chat request runs on a worker thread and reports back through an
//! `mpsc` channel; `check_reply` drains it on the UI thread, appends the
//! reply and hands it to speech output, which raises `speaking` for the
//! avatar.

use std::sync::mpsc;
use std::time::Instant;

use eframe::egui;

use holo_avatar::voice::ListenOutcome;
use holo_avatar::AvatarError;

use super::{AvatarApp, ChatLine};

impl AvatarApp {
    /// Whether a new query can go out now.
    pub fn accepts_query(&self) -> bool {
        !self.loading
    }

    /// Send the input row. The text stays in place while a reply is pending.
    pub fn submit_input(&mut self, ctx: &egui::Context) {
        if !self.accepts_query() || self.input.trim().is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.input);
        self.send_message(text, ctx);
    }

    /// Post `text` to the chat backend. Blank input and overlapping
    /// requests are ignored.
    pub fn send_message(&mut self, text: String, ctx: &egui::Context) {
        let text = text.trim().to_string();
        if text.is_empty() || !self.accepts_query() {
            return;
        }
        self.messages.push(ChatLine::citizen(text.clone()));

        let Some(client) = self.chat.clone() else {
            self.answer_with_fallback(&AvatarError::Chat("chat client not configured".into()));
            return;
        };

        self.loading = true;
        let (tx, rx) = mpsc::channel();
        self.reply_rx = Some(rx);

        let language = self.language;
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = client.send(&text, language);
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    /// Poll the worker for a finished chat request.
    pub fn check_reply(&mut self, _ctx: &egui::Context) {
        let Some(rx) = &self.reply_rx else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => {
                Err(AvatarError::Chat("chat worker exited".into()))
            }
        };
        self.reply_rx = None;
        self.loading = false;

        match result {
            Ok(reply) => {
                if let (Some(client), Some(id)) = (self.chat.as_mut(), reply.session_id) {
                    client.set_session_id(Some(id));
                }
                if let Some(provider) = &reply.provider {
                    log::debug!("reply from {provider}");
                }
                self.speech.speak(&reply.reply, Instant::now());
                self.messages.push(ChatLine::officer(reply.reply));
            }
            Err(e) => self.answer_with_fallback(&e),
        }
    }

    fn answer_with_fallback(&mut self, err: &AvatarError) {
        log::warn!("chat failed: {err}");
        let line = match &self.chat {
            Some(client) => client.fallback_reply(),
            None => "Unable to connect. Please check the chat server configuration.".to_string(),
        };
        self.speech.speak(&line, Instant::now());
        self.messages.push(ChatLine::officer(line));
    }

    /// Mic button: start dictation, or finish it with whatever was typed.
    pub fn toggle_listening(&mut self, ctx: &egui::Context) {
        if !self.listen.is_active() {
            self.listen.start(self.language);
            return;
        }
        match self.listen.finish(&self.input) {
            ListenOutcome::Transcript(text) if self.accepts_query() => {
                self.input.clear();
                self.send_message(text, ctx);
            }
            ListenOutcome::Transcript(_) | ListenOutcome::Failed => {}
        }
    }

    /// Ask the backend for its status once, off the UI thread. The result is
    /// only logged; chat requests fall back on their own when it is down.
    pub fn check_backend(&self) {
        let Some(client) = self.chat.clone() else {
            return;
        };
        std::thread::spawn(move || match client.health() {
            Ok(health) => log::info!(
                "chat backend {} (provider {})",
                health.status,
                health.provider.as_deref().unwrap_or("unknown")
            ),
            Err(e) => log::warn!("chat backend not reachable: {e}"),
        });
    }

    /// Drop the local log and ask the backend to forget the session.
    pub fn clear_conversation(&mut self) {
        self.messages.clear();
        self.speech.cancel();
        let Some(client) = self.chat.as_mut() else {
            return;
        };
        let worker = client.clone();
        client.set_session_id(None);
        std::thread::spawn(move || {
            if let Err(e) = worker.reset() {
                log::warn!("session reset failed: {e}");
            }
        });
    }
}
