//! Header strip for `AvatarApp`.
//!
//! Title, live badge, language selector, the avatar show/hide toggle and the
//! active renderer.

use eframe::egui;

use holo_avatar::voice::Language;

use super::AvatarApp;

impl AvatarApp {
    /// Render the top header strip.
    pub fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_space(4.0);
            ui.vertical(|ui| {
                ui.label(
                    egui::RichText::new("AI DIGITAL OFFICER")
                        .color(egui::Color32::from_rgb(0xc5, 0xa0, 0x28))
                        .strong()
                        .size(15.0),
                );
                ui.label(
                    egui::RichText::new("e-Governance Portal · Digital India · MeitY")
                        .color(egui::Color32::from_rgb(0x3a, 0x5a, 0x7a))
                        .small(),
                );
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                egui::ComboBox::from_id_salt("language")
                    .selected_text(self.language.label())
                    .show_ui(ui, |ui| {
                        for lang in Language::ALL {
                            ui.selectable_value(&mut self.language, lang, lang.label());
                        }
                    });

                ui.colored_label(egui::Color32::from_rgb(0x00, 0xff, 0x88), "● LIVE SESSION");

                let mut visible = self.avatar_visible;
                ui.toggle_value(&mut visible, "Avatar");
                if visible != self.avatar_visible {
                    self.avatar_visible = visible;
                    if visible {
                        self.mount_avatar();
                    } else {
                        self.unmount_avatar();
                    }
                }

                match self.host.rasterizer_name() {
                    Some(name) => {
                        ui.weak(format!("{name} · {} frames", self.host.frames_presented()))
                    }
                    None => ui.weak("no renderer"),
                };
            });
        });
    }
}
