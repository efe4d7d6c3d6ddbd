//! 主题定义

use egui::{Color32, Rounding, Stroke, Style, Visuals};

/// 暖色深色主题
pub struct GarryTheme;

impl GarryTheme {
    pub const BG_DEEP: Color32 = Color32::from_rgb(20, 18, 16);
    pub const BG_SURFACE: Color32 = Color32::from_rgb(34, 31, 28);
    pub const BG_ELEVATED: Color32 = Color32::from_rgb(48, 44, 40);
    pub const ACCENT: Color32 = Color32::from_rgb(214, 160, 72);
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(238, 232, 222);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(150, 142, 130);
    pub const BORDER: Color32 = Color32::from_rgb(64, 58, 52);

    /// 应用主题到 egui context
    pub fn apply(ctx: &egui::Context) {
        let mut style = Style::default();
        let mut visuals = Visuals::dark();

        visuals.panel_fill = Self::BG_DEEP;
        visuals.window_fill = Self::BG_SURFACE;
        visuals.extreme_bg_color = Self::BG_DEEP;
        visuals.faint_bg_color = Self::BG_SURFACE;

        let rounding = Rounding::same(6.0);
        for widget in [
            &mut visuals.widgets.noninteractive,
            &mut visuals.widgets.inactive,
            &mut visuals.widgets.hovered,
            &mut visuals.widgets.active,
        ] {
            widget.rounding = rounding;
            widget.fg_stroke = Stroke::new(1.0, Self::TEXT_PRIMARY);
        }

        visuals.widgets.noninteractive.bg_fill = Self::BG_SURFACE;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, Self::TEXT_MUTED);
        visuals.widgets.inactive.bg_fill = Self::BG_ELEVATED;
        visuals.widgets.hovered.bg_fill = Self::ACCENT.gamma_multiply(0.3);
        visuals.widgets.active.bg_fill = Self::ACCENT;
        visuals.widgets.active.fg_stroke = Stroke::new(1.0, Self::BG_DEEP);

        // 进度条已播放部分
        visuals.selection.bg_fill = Self::ACCENT.gamma_multiply(0.6);
        visuals.selection.stroke = Stroke::new(1.0, Self::ACCENT);

        visuals.window_rounding = Rounding::same(10.0);
        visuals.window_stroke = Stroke::new(1.0, Self::BORDER);

        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(8.0, 8.0);
        style.spacing.button_padding = egui::vec2(10.0, 6.0);
        style.spacing.slider_width = 320.0;

        ctx.set_style(style);
    }
}
