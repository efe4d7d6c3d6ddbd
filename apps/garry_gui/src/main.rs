//! Garry Player GUI

mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use garry_player::{format_time, PlayerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use state::AppState;
use ui::{ChapterSidebar, GarryTheme, PlayerDeck};

/// 有声书播放器
#[derive(Parser, Debug)]
#[command(name = "garry-player", version, about = "Audiobook player")]
struct Args {
    /// 书目录（章节音频文件所在目录）
    #[arg(env = "GARRY_BOOK_DIR")]
    book: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long, env = "GARRY_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "garry_player=info,garry_gui=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = PlayerConfig::resolve(args.config.as_deref()).context("Failed to load config")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 600.0])
            .with_min_inner_size([520.0, 360.0])
            .with_title("Garry Player"),
        ..Default::default()
    };

    eframe::run_native(
        "Garry Player",
        options,
        Box::new(move |cc| {
            GarryTheme::apply(&cc.egui_ctx);

            let mut state = AppState::new(config);
            if let Some(dir) = &args.book {
                state.open_book(dir);
            }

            Ok(Box::new(GarryApp { state }))
        }),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {e}"))
}

struct GarryApp {
    state: AppState,
}

impl eframe::App for GarryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 处理轮询计时器送来的意图
        self.state.poll();

        egui::TopBottomPanel::bottom("player_deck")
            .resizable(false)
            .show(ctx, |ui| {
                PlayerDeck::show(ui, &mut self.state);
            });

        egui::SidePanel::left("chapter_sidebar")
            .resizable(true)
            .default_width(260.0)
            .min_width(180.0)
            .show(ctx, |ui| {
                ChapterSidebar::show(ui, &mut self.state);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            Self::now_playing(ui, &self.state);
        });

        // 播放时定期重绘，让计时器意图得到处理
        if self.state.is_playing() {
            ctx.request_repaint_after(self.state.config.tick_interval() / 4);
        }
    }
}

impl GarryApp {
    fn now_playing(ui: &mut egui::Ui, state: &AppState) {
        ui.vertical_centered(|ui| {
            ui.add_space(60.0);

            let Some(snap) = state.snapshot() else {
                ui.label(
                    egui::RichText::new("No book loaded")
                        .size(20.0)
                        .color(GarryTheme::TEXT_MUTED),
                );
                return;
            };

            ui.label(
                egui::RichText::new(&snap.title)
                    .size(26.0)
                    .color(GarryTheme::TEXT_PRIMARY)
                    .strong(),
            );
            ui.add_space(6.0);

            let chapter = state
                .current_chapter()
                .and_then(|i| state.chapters.get(i).cloned())
                .unwrap_or_default();
            ui.label(
                egui::RichText::new(chapter)
                    .size(16.0)
                    .color(GarryTheme::TEXT_MUTED),
            );
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(format!(
                    "{} / {}",
                    format_time(snap.current_time),
                    format_time(snap.total_time)
                ))
                .size(14.0)
                .color(GarryTheme::TEXT_MUTED),
            );
        });
    }
}
