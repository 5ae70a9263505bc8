//! Panel rendering for `AvatarApp`.
//!
//! The left panel hosts the avatar viewport (an [`EguiContainer`] the
//! viewport host renders into), the nameplate, status row, waveform and
//! quick queries. The central panel is the conversation log and input row.

use std::time::Instant;

use eframe::egui;

use holo_avatar::viewport::{Container, FrameOutcome, SurfaceId};

use super::{AvatarApp, Sender};

const GOLD: egui::Color32 = egui::Color32::from_rgb(0xc5, 0xa0, 0x28);
const MUTED: egui::Color32 = egui::Color32::from_rgb(0x3a, 0x5a, 0x7a);
const FRAME_BG: egui::Color32 = egui::Color32::from_rgb(0x03, 0x0b, 0x18);

const WAVE_BARS: usize = 26;
const WAVE_HEIGHT: f32 = 36.0;

const QUICK_QUERIES: [&str; 6] = [
    "Scholarship apply",
    "Pension status",
    "Ration card",
    "Birth certificate",
    "Land records",
    "MGNREGA scheme",
];

/// An egui rect the viewport host presents into.
#[derive(Debug)]
pub struct EguiContainer {
    size: Option<[f32; 2]>,
    pixels_per_point: f32,
    attached: Vec<SurfaceId>,
}

impl Default for EguiContainer {
    fn default() -> Self {
        Self {
            size: None,
            pixels_per_point: 1.0,
            attached: Vec::new(),
        }
    }
}

impl EguiContainer {
    /// Record this frame's layout. Returns whether the physical size changed.
    pub fn lay_out(&mut self, rect: egui::Rect, pixels_per_point: f32) -> bool {
        let size = Some([rect.width(), rect.height()]);
        let changed = size != self.size || pixels_per_point != self.pixels_per_point;
        self.size = size;
        self.pixels_per_point = pixels_per_point;
        changed
    }
}

impl Container for EguiContainer {
    fn measure(&self) -> Option<[f32; 2]> {
        self.size
    }

    fn pixels_per_point(&self) -> f32 {
        self.pixels_per_point
    }

    fn attach(&mut self, surface: SurfaceId) {
        self.attached.push(surface);
    }

    fn detach(&mut self, surface: SurfaceId) {
        self.attached.retain(|s| *s != surface);
    }

    fn contains(&self, surface: SurfaceId) -> bool {
        self.attached.contains(&surface)
    }
}

impl AvatarApp {
    /// Left column: avatar frame, nameplate, status, waveform, quick queries.
    pub fn draw_avatar_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let status = self.status();
        ui.add_space(8.0);

        let width = ui.available_width();
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(width, width * 1.1), egui::Sense::hover());
        ui.painter().rect_filled(rect, 8.0, FRAME_BG);
        ui.painter()
            .rect_stroke(rect, 8.0, egui::Stroke::new(1.5, status.color().gamma_multiply(0.4)));

        if self.avatar_visible {
            self.draw_viewport(ui, ctx, rect);
        }

        ui.add_space(8.0);
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new("OFFICER RAJIV SHARMA IAS").color(GOLD).strong());
            ui.label(
                egui::RichText::new("Senior Digital Officer · e-Governance Division")
                    .color(MUTED)
                    .small(),
            );
        });

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let (dot, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
            ui.painter().circle_filled(dot.center(), 4.5, status.color());
            ui.label(status.text());
        });

        let active = self.speech.is_speaking() || self.listen.is_active();
        self.draw_waveform(ui, active, status.color());

        ui.add_space(8.0);
        ui.label(egui::RichText::new("QUICK QUERIES").color(MUTED).small());
        let mut picked = None;
        egui::Grid::new("quick_queries")
            .num_columns(2)
            .spacing([6.0, 6.0])
            .show(ui, |ui| {
                for (i, q) in QUICK_QUERIES.iter().enumerate() {
                    if ui.add_enabled(self.accepts_query(), egui::Button::new(*q)).clicked() {
                        picked = Some(*q);
                    }
                    if i % 2 == 1 {
                        ui.end_row();
                    }
                }
            });
        if let Some(q) = picked {
            self.send_message(q.to_string(), ctx);
        }
    }

    /// Drive one viewport frame into `rect` and paint the latest surface.
    fn draw_viewport(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, rect: egui::Rect) {
        if let Some(err) = &self.render_error {
            self.draw_placeholder(ui, rect, err);
            return;
        }

        if self.panel.lay_out(rect, ctx.pixels_per_point()) {
            self.host.resize(&mut self.panel);
        }
        if let FrameOutcome::Presented(_) = self.host.frame(&mut self.panel) {
            self.upload_surface(ctx);
        }

        if let Some(texture) = &self.texture {
            ui.painter().image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
    }

    /// Copy the host surface into the egui texture when it has a new frame.
    fn upload_surface(&mut self, ctx: &egui::Context) {
        let Some(surface) = self.host.surface() else {
            return;
        };
        let key = (surface.id, surface.generation);
        if self.uploaded == Some(key) || surface.pixels.is_empty() {
            return;
        }
        let [w, h] = surface.size;
        let image =
            egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &surface.pixels);
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("avatar", image, egui::TextureOptions::LINEAR));
            }
        }
        self.uploaded = Some(key);
    }

    /// Static stand-in when no renderer could be created.
    fn draw_placeholder(&self, ui: &mut egui::Ui, rect: egui::Rect, err: &str) {
        let painter = ui.painter_at(rect);
        let c = rect.center();
        let r = rect.width().min(rect.height()) * 0.18;
        painter.circle_stroke(c - egui::vec2(0.0, r * 0.6), r, egui::Stroke::new(2.0, GOLD));
        painter.line_segment(
            [c + egui::vec2(-r * 1.6, r * 2.2), c + egui::vec2(r * 1.6, r * 2.2)],
            egui::Stroke::new(2.0, GOLD),
        );
        painter.text(
            rect.center_bottom() - egui::vec2(0.0, 14.0),
            egui::Align2::CENTER_CENTER,
            format!("3D view unavailable: {err}"),
            egui::FontId::proportional(11.0),
            MUTED,
        );
    }

    /// 26 bars; flat when idle, bouncing while speaking or listening.
    fn draw_waveform(&self, ui: &mut egui::Ui, active: bool, color: egui::Color32) {
        let width = ui.available_width();
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(width, WAVE_HEIGHT), egui::Sense::hover());
        let painter = ui.painter_at(rect);
        let bar_w = 3.5;
        let gap = 3.0;
        let total = WAVE_BARS as f32 * (bar_w + gap) - gap;
        let x0 = rect.center().x - total * 0.5;
        let t = self.app_start.elapsed().as_secs_f32();

        for i in 0..WAVE_BARS {
            let h = if active {
                let period = 0.4 + (i % 6) as f32 * 0.1;
                let phase = (t / period * std::f32::consts::PI).sin().abs();
                4.0 + phase * 26.0
            } else {
                4.0
            };
            let x = x0 + i as f32 * (bar_w + gap);
            let bar = egui::Rect::from_center_size(
                egui::pos2(x + bar_w * 0.5, rect.center().y),
                egui::vec2(bar_w, h),
            );
            painter.rect_filled(bar, 2.0, color);
        }
    }

    /// Conversation log with the input row underneath.
    pub fn draw_conversation(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.heading("Conversation");
                ui.label(
                    egui::RichText::new("Ask anything about government services")
                        .color(MUTED)
                        .small(),
                );
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("✕ Clear").clicked() {
                    self.clear_conversation();
                }
            });
        });
        ui.separator();

        let input_height = 40.0;
        egui::ScrollArea::vertical()
            .max_height(ui.available_height() - input_height)
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in &self.messages {
                    let (layout, fill) = match line.sender {
                        Sender::Officer => (
                            egui::Layout::left_to_right(egui::Align::TOP),
                            egui::Color32::from_rgb(0x06, 0x2a, 0x58),
                        ),
                        Sender::Citizen => (
                            egui::Layout::right_to_left(egui::Align::TOP),
                            egui::Color32::from_rgb(0x2a, 0x24, 0x10),
                        ),
                    };
                    ui.with_layout(layout, |ui| {
                        egui::Frame::none()
                            .fill(fill)
                            .rounding(10.0)
                            .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                            .show(ui, |ui| {
                                ui.set_max_width(ui.available_width() * 0.8);
                                ui.label(&line.text);
                            });
                    });
                    ui.add_space(6.0);
                }
                if self.loading {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(egui::RichText::new("Processing query...").color(GOLD));
                    });
                }
            });

        ui.separator();
        ui.horizontal(|ui| {
            let response = ui.add_sized(
                [ui.available_width() - 90.0, 28.0],
                egui::TextEdit::singleline(&mut self.input)
                    .hint_text("Type your query or press the mic to speak..."),
            );
            let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            let mic_label = if self.listen.is_active() { "⏹" } else { "🎤" };
            if ui.button(mic_label).on_hover_text("Voice input").clicked() {
                self.toggle_listening(ctx);
            }
            let send = ui.add_enabled(self.accepts_query(), egui::Button::new("➤"));
            if send.clicked() || submitted {
                self.submit_input(ctx);
            }
        });

        if let Some(left) = self.speech.remaining(Instant::now()) {
            ctx.request_repaint_after(left);
        }
    }
}
