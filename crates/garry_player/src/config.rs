//! 播放器配置
//!
//! 查找顺序：显式路径 > `<config_dir>/garry-player/config.toml` > 默认值

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{PlayerError, Result};

/// 播放器配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// 快进秒数
    pub skip_forward_secs: f64,
    /// 快退秒数
    pub skip_backward_secs: f64,
    /// 轮询间隔（毫秒）
    pub tick_interval_ms: u64,
    /// 超过该秒数时“上一章”改为回到本章开头
    pub previous_restart_threshold_secs: f64,
    /// 章节播完后自动进入下一章
    pub auto_advance: bool,
    /// 输出缓冲区容量（帧）
    pub output_buffer_frames: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            skip_forward_secs: 10.0,
            skip_backward_secs: 5.0,
            tick_interval_ms: 1000,
            previous_restart_threshold_secs: 3.0,
            auto_advance: true,
            output_buffer_frames: 8192,
        }
    }
}

impl PlayerConfig {
    /// 解析 TOML 文本并校验
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// 读取指定文件
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// 按查找顺序加载；默认位置不存在时使用默认值
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::info!("loading config from {}", path.display());
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => {
                tracing::info!("loading config from {}", path.display());
                Self::load(&path)
            }
            _ => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        let non_negative = [
            ("skip_forward_secs", self.skip_forward_secs),
            ("skip_backward_secs", self.skip_backward_secs),
            (
                "previous_restart_threshold_secs",
                self.previous_restart_threshold_secs,
            ),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(PlayerError::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.tick_interval_ms == 0 {
            return Err(PlayerError::Config(
                "tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.output_buffer_frames == 0 {
            return Err(PlayerError::Config(
                "output_buffer_frames must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// 平台默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("garry-player").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = PlayerConfig::from_toml_str("skip_forward_secs = 30.0\n").unwrap();
        assert_eq!(config.skip_forward_secs, 30.0);
        assert_eq!(config.skip_backward_secs, 5.0);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = PlayerConfig::from_toml_str("skip_backward_secs = -1.0").unwrap_err();
        assert!(matches!(err, PlayerError::Config(_)));

        let err = PlayerConfig::from_toml_str("tick_interval_ms = 0").unwrap_err();
        assert!(matches!(err, PlayerError::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = PlayerConfig::from_toml_str("volume = 0.5").unwrap_err();
        assert!(matches!(err, PlayerError::Config(_)));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "auto_advance = false\ntick_interval_ms = 250\n").unwrap();

        let config = PlayerConfig::resolve(Some(&path)).unwrap();
        assert!(!config.auto_advance);
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlayerConfig::resolve(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, PlayerError::Io(_)));
    }
}
