//! 播放会话状态

use crate::{PlayerSnapshot, SpeedCycle, TimeController};

/// 一次播放界面生命周期内的状态
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    title: String,
    chapters: Vec<String>,
    pub(crate) current_chapter_index: usize,
    pub(crate) speed: SpeedCycle,
    /// 每次传输操作后从引擎读回
    pub(crate) is_playing: bool,
    pub(crate) time: TimeController,
}

impl PlaybackSession {
    pub fn new(title: impl Into<String>, chapters: Vec<String>, total_time: f64) -> Self {
        Self {
            title: title.into(),
            chapters,
            current_chapter_index: 0,
            speed: SpeedCycle::default(),
            is_playing: false,
            time: TimeController::new(total_time),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn chapters(&self) -> &[String] {
        &self.chapters
    }

    pub fn total_chapters(&self) -> usize {
        self.chapters.len()
    }

    pub fn current_chapter_index(&self) -> usize {
        self.current_chapter_index
    }

    pub fn is_last_chapter(&self) -> bool {
        self.current_chapter_index + 1 >= self.chapters.len()
    }

    pub fn speed(&self) -> SpeedCycle {
        self.speed
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn time(&self) -> &TimeController {
        &self.time
    }

    /// 生成渲染快照；跳转按钮可用性按各自的跳转秒数判断
    pub fn snapshot(&self, skip_backward_secs: f64, skip_forward_secs: f64) -> PlayerSnapshot {
        let current_time = self.time.current_time();
        let total_time = self.time.total_time();
        PlayerSnapshot {
            title: self.title.clone(),
            current_time,
            total_time,
            is_playing: self.is_playing,
            current_speed: self.speed.speed(),
            chapter_number: self.current_chapter_index + 1,
            total_chapters: self.chapters.len(),
            is_skip_backward_available: current_time >= skip_backward_secs,
            is_skip_forward_available: current_time < total_time - skip_forward_secs,
        }
    }
}
