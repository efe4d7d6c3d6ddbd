//! 侧边栏 - 章节列表

use egui::{RichText, ScrollArea, Ui};
use garry_player::Intent;

use crate::state::AppState;
use crate::ui::theme::GarryTheme;

pub struct ChapterSidebar;

impl ChapterSidebar {
    pub fn show(ui: &mut Ui, state: &mut AppState) {
        ui.horizontal(|ui| {
            ui.label(
                RichText::new("Chapters")
                    .color(GarryTheme::TEXT_PRIMARY)
                    .size(18.0)
                    .strong(),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("📂").on_hover_text("Open book folder").clicked() {
                    state.pick_book_folder();
                }
            });
        });

        ui.add_space(8.0);
        ui.separator();

        if let Some(err) = &state.last_error {
            ui.label(RichText::new(err).color(GarryTheme::ACCENT).size(12.0));
        }

        if state.chapters.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label(
                    RichText::new("Open a folder of audio files")
                        .color(GarryTheme::TEXT_MUTED)
                        .size(13.0),
                );
            });
            return;
        }

        let current = state.current_chapter();
        let mut clicked: Option<usize> = None;

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (idx, title) in state.chapters.iter().enumerate() {
                    let is_current = current == Some(idx);
                    let text = RichText::new(format!("{:>2}. {}", idx + 1, title))
                        .size(13.0)
                        .color(if is_current {
                            GarryTheme::ACCENT
                        } else {
                            GarryTheme::TEXT_PRIMARY
                        });

                    if ui.selectable_label(is_current, text).clicked() && !is_current {
                        clicked = Some(idx);
                    }
                }
            });

        if let Some(idx) = clicked {
            state.dispatch(Intent::SelectChapter(idx));
        }
    }
}
