//! 底部播放控制栏

use egui::{Align, Button, Layout, RichText, Ui};
use garry_player::{format_time, Intent, PlayerSnapshot};

use crate::state::AppState;
use crate::ui::theme::GarryTheme;

pub struct PlayerDeck;

impl PlayerDeck {
    pub fn show(ui: &mut Ui, state: &mut AppState) {
        let Some(snap) = state.snapshot() else {
            ui.vertical_centered(|ui| {
                ui.label(
                    RichText::new("No book loaded")
                        .color(GarryTheme::TEXT_MUTED)
                        .size(14.0),
                );
            });
            return;
        };

        egui::Frame::none()
            .fill(GarryTheme::BG_SURFACE)
            .inner_margin(egui::Margin::symmetric(16.0, 12.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new(format!(
                            "Chapter {} of {}",
                            snap.chapter_number, snap.total_chapters
                        ))
                        .color(GarryTheme::TEXT_MUTED)
                        .size(12.0),
                    );
                    ui.add_space(4.0);
                    Self::time_slider(ui, state, &snap);
                    ui.add_space(6.0);
                    Self::transport_controls(ui, state, &snap);
                });
            });
    }

    /// 拖动开始 / 拖动中 / 松开 分别转成对应意图
    fn time_slider(ui: &mut Ui, state: &mut AppState, snap: &PlayerSnapshot) {
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(format_time(snap.current_time))
                    .color(GarryTheme::TEXT_MUTED)
                    .size(11.0),
            );

            let mut value = snap.current_time;
            let slider = egui::Slider::new(&mut value, 0.0..=snap.total_time.max(0.0))
                .show_value(false)
                .trailing_fill(true);
            let width = (ui.available_width() - 60.0).max(120.0);
            let response = ui.add_sized([width, 16.0], slider);

            if response.drag_started() {
                state.dispatch(Intent::ScrubStart);
            }
            if response.changed() {
                state.dispatch(Intent::ScrubChanged(value));
            }
            if response.drag_stopped() {
                state.dispatch(Intent::ScrubEnd);
            }

            ui.label(
                RichText::new(format_time(snap.total_time))
                    .color(GarryTheme::TEXT_MUTED)
                    .size(11.0),
            );
        });
    }

    fn transport_controls(ui: &mut Ui, state: &mut AppState, snap: &PlayerSnapshot) {
        ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
            if ui.button("⏮").on_hover_text("Previous chapter").clicked() {
                state.dispatch(Intent::PreviousChapter);
            }

            let back = ui
                .add_enabled(snap.is_skip_backward_available, Button::new("⏪"))
                .on_hover_text(format!("Back {}s", state.config.skip_backward_secs));
            if back.clicked() {
                state.dispatch(Intent::SkipBackward);
            }

            let play_btn = if snap.is_playing { "⏸" } else { "▶" };
            if ui
                .add(Button::new(RichText::new(play_btn).size(24.0)))
                .clicked()
            {
                state.dispatch(Intent::PlayToggle);
            }

            let forward = ui
                .add_enabled(snap.is_skip_forward_available, Button::new("⏩"))
                .on_hover_text(format!("Forward {}s", state.config.skip_forward_secs));
            if forward.clicked() {
                state.dispatch(Intent::SkipForward);
            }

            if ui.button("⏭").on_hover_text("Next chapter").clicked() {
                state.dispatch(Intent::NextChapter);
            }

            ui.add_space(12.0);

            if ui
                .button(RichText::new(format!("{}x", snap.current_speed)).color(GarryTheme::ACCENT))
                .on_hover_text("Playback speed")
                .clicked()
            {
                state.dispatch(Intent::SpeedTap);
            }
        });
    }
}
