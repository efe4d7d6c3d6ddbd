//! 播放意图和界面快照定义

use serde::Serialize;

/// 界面手势或计时器产生的意图（展示层 -> 控制器）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// 播放 / 暂停
    PlayToggle,
    /// 切换倍速
    SpeedTap,
    /// 上一章
    PreviousChapter,
    /// 下一章
    NextChapter,
    /// 快进
    SkipForward,
    /// 快退
    SkipBackward,
    /// 开始拖动进度条
    ScrubStart,
    /// 拖动中（秒）
    ScrubChanged(f64),
    /// 松开进度条
    ScrubEnd,
    /// 轮询计时器触发
    UpdateTime,
    /// 跳到指定章节（从 0 开始）
    SelectChapter(usize),
    /// 停止并释放计时器
    Stop,
}

/// 展示层渲染所需的状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub title: String,
    pub current_time: f64,
    pub total_time: f64,
    pub is_playing: bool,
    pub current_speed: f64,
    /// 从 1 开始
    pub chapter_number: usize,
    pub total_chapters: usize,
    pub is_skip_backward_available: bool,
    pub is_skip_forward_available: bool,
}

/// 时间格式化为 mm:ss
pub fn format_time(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
