//! 测试用引擎与调度器

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::{BookPlayer, Intent, PlayerError, Result, TickScheduler, TimerHandle};

/// 按脚本推进时间的引擎
#[derive(Debug, Default)]
pub struct MockPlayer {
    pub durations: Vec<f64>,
    pub failing: Vec<usize>,
    pub loaded: Option<usize>,
    pub playing: bool,
    pub finished: bool,
    pub time: f64,
    pub rate: f64,
    pub play_calls: usize,
    pub pause_calls: usize,
    pub seeks: Vec<f64>,
    pub loads: Vec<usize>,
}

impl MockPlayer {
    pub fn new(durations: Vec<f64>) -> Self {
        Self {
            durations,
            rate: 1.0,
            ..Default::default()
        }
    }

    /// 这些章节加载失败
    pub fn failing_on(mut self, chapters: &[usize]) -> Self {
        self.failing = chapters.to_vec();
        self
    }

    /// 模拟真实时间流逝
    pub fn advance(&mut self, secs: f64) {
        if !self.is_playing() {
            return;
        }
        self.time += secs * self.rate;
        let duration = self.duration();
        if self.time >= duration {
            self.time = duration;
            self.finished = true;
        }
    }
}

impl BookPlayer for MockPlayer {
    fn files_amount(&self) -> usize {
        self.durations.len()
    }

    fn load_chapter(&mut self, index: usize) -> Result<()> {
        self.loads.push(index);
        self.loaded = None;
        self.playing = false;
        self.finished = false;
        self.time = 0.0;

        if index >= self.durations.len() {
            return Err(PlayerError::ChapterOutOfRange {
                index,
                total: self.durations.len(),
            });
        }
        if self.failing.contains(&index) {
            return Err(PlayerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "missing chapter resource",
            )));
        }
        self.loaded = Some(index);
        Ok(())
    }

    fn play(&mut self) {
        self.play_calls += 1;
        if self.loaded.is_some() {
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        self.pause_calls += 1;
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.loaded.is_some() && self.playing && !self.finished
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, secs: f64) {
        self.seeks.push(secs);
        if self.loaded.is_some() {
            self.time = secs.clamp(0.0, self.duration());
            self.finished = false;
        }
    }

    fn duration(&self) -> f64 {
        self.loaded
            .and_then(|i| self.durations.get(i).copied())
            .unwrap_or(0.0)
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn has_finished(&self) -> bool {
        self.loaded.is_some() && self.finished
    }
}

/// 只计数不计时的调度器，tick 由测试手动派发
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    active: Arc<AtomicUsize>,
    started: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ManualScheduler {
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// 同时存活的计时器最大数量
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(&mut self, _period: Duration, _sink: Sender<Intent>) -> TimerHandle {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let active = self.active.clone();
        TimerHandle::new(move || {
            active.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

/// 写一个 16 位 PCM WAV，每帧采样值为帧序号
pub fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: u32) {
    let block_align = channels * 2;
    let data_len = frames * block_align as u32;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for frame in 0..frames {
        for _ in 0..channels {
            bytes.extend_from_slice(&(frame as i16).to_le_bytes());
        }
    }

    std::fs::write(path, bytes).unwrap();
}
