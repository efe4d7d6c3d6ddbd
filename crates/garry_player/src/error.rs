//! 错误类型

use crate::{DecoderError, OutputError};

/// 播放器错误
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decoder error: {0}")]
    Decode(#[from] DecoderError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("No audio chapters found in {0}")]
    NoChapters(String),

    #[error("Chapter {index} out of range (total {total})")]
    ChapterOutOfRange { index: usize, total: usize },
}

impl From<toml::de::Error> for PlayerError {
    fn from(e: toml::de::Error) -> Self {
        PlayerError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
