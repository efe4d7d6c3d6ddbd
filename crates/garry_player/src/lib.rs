//! garry_player - 有声书播放核心
//!
//! 提供章节化有声书的播放引擎、播放状态机和轮询计时器。

mod book;
mod command;
mod config;
mod controller;
mod decoder;
mod engine;
mod error;
mod output;
mod resample;
mod session;
mod speed;
mod time;
mod timer;

#[cfg(test)]
mod mock;

pub use book::*;
pub use command::*;
pub use config::*;
pub use controller::*;
pub use decoder::*;
pub use engine::*;
pub use error::*;
pub use output::*;
pub use resample::*;
pub use session::*;
pub use speed::*;
pub use time::*;
pub use timer::*;
