//! garry-cli - 命令行播放器
//!
//! 从标准输入读取命令，状态变化输出到标准输出（文本或 JSON 行）

use std::io::BufRead;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::{select, unbounded, Receiver};
use garry_player::{
    format_time, AudioBookPlayer, Book, Intent, PlaybackController, PlayerConfig, PlayerSnapshot,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "garry-cli", version, about = "Terminal audiobook player")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, global = true, env = "GARRY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 播放一本书
    Play {
        /// 书目录
        #[arg(env = "GARRY_BOOK_DIR")]
        book: PathBuf,

        /// 以 JSON 行输出状态
        #[arg(long)]
        json: bool,
    },
    /// 列出章节
    Chapters {
        book: PathBuf,
    },
}

/// 一行输入对应的操作
#[derive(Debug, Clone, PartialEq)]
enum CliCommand {
    Intents(Vec<Intent>),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<CliCommand> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next()?;
    let arg = parts.next();

    let intents = match (cmd, arg) {
        ("p" | "play" | "pause", None) => vec![Intent::PlayToggle],
        ("s" | "speed", None) => vec![Intent::SpeedTap],
        ("n" | "next", None) => vec![Intent::NextChapter],
        ("b" | "prev", None) => vec![Intent::PreviousChapter],
        ("f" | "forward", None) => vec![Intent::SkipForward],
        ("r" | "rewind", None) => vec![Intent::SkipBackward],
        // 与拖动进度条走同一套流程
        ("seek", Some(secs)) => {
            let secs = parse_time(secs)?;
            vec![Intent::ScrubStart, Intent::ScrubChanged(secs), Intent::ScrubEnd]
        }
        ("ch" | "chapter", Some(n)) => {
            let n: usize = n.parse().ok()?;
            vec![Intent::SelectChapter(n.checked_sub(1)?)]
        }
        ("h" | "help" | "?", None) => return Some(CliCommand::Help),
        ("q" | "quit", None) => return Some(CliCommand::Quit),
        _ => return None,
    };
    Some(CliCommand::Intents(intents))
}

/// 支持 "90" 或 "1:30"
fn parse_time(s: &str) -> Option<f64> {
    match s.split_once(':') {
        Some((m, sec)) => {
            let m: u64 = m.parse().ok()?;
            let sec: f64 = sec.parse().ok()?;
            Some(m as f64 * 60.0 + sec)
        }
        None => s.parse().ok(),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  p          play / pause");
    println!("  s          cycle speed");
    println!("  n / b      next / previous chapter");
    println!("  f / r      skip forward / backward");
    println!("  seek <t>   seek to seconds or mm:ss");
    println!("  ch <n>     jump to chapter n");
    println!("  q          quit");
}

fn render(snap: &PlayerSnapshot, json: bool) {
    if json {
        match serde_json::to_string(snap) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!("failed to serialize snapshot: {}", e),
        }
    } else {
        println!(
            "[{}] {} | ch {}/{} | {} / {} | {}x",
            if snap.is_playing { "playing" } else { "paused" },
            snap.title,
            snap.chapter_number,
            snap.total_chapters,
            format_time(snap.current_time),
            format_time(snap.total_time),
            snap.current_speed
        );
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn play(book_dir: PathBuf, config: PlayerConfig, json: bool) -> Result<()> {
    let book = Book::scan(&book_dir)
        .with_context(|| format!("Failed to open book {}", book_dir.display()))?;
    let title = book.title.clone();
    let engine = AudioBookPlayer::new(book, &config);
    let mut controller = PlaybackController::new(engine, title, config);

    controller.on_change(move |snap| render(snap, json));
    if !json {
        print_help();
    }

    let lines = spawn_stdin_reader();
    let intents = controller.receiver();

    loop {
        select! {
            recv(intents) -> intent => {
                if let Ok(intent) = intent {
                    controller.dispatch(intent);
                }
            }
            recv(lines) -> line => {
                // 标准输入关闭等同退出
                let Ok(line) = line else { break };
                match parse_command(&line) {
                    Some(CliCommand::Intents(list)) => {
                        for intent in list {
                            controller.dispatch(intent);
                        }
                    }
                    Some(CliCommand::Help) => print_help(),
                    Some(CliCommand::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => eprintln!("Unknown command: {}", line.trim()),
                }
            }
        }
    }

    controller.dispatch(Intent::Stop);
    Ok(())
}

fn list_chapters(book_dir: PathBuf) -> Result<()> {
    let book = Book::scan(&book_dir)
        .with_context(|| format!("Failed to open book {}", book_dir.display()))?;
    println!("{} ({} chapters)", book.title, book.len());
    for (i, path) in book.chapters().iter().enumerate() {
        println!("  {:>3}. {}", i + 1, path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "garry_player=info,garry_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Play { book, json } => {
            let config =
                PlayerConfig::resolve(args.config.as_deref()).context("Failed to load config")?;
            play(book, config, json)
        }
        Command::Chapters { book } => list_chapters(book),
    }
}
