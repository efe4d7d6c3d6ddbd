//! 播放引擎
//!
//! `BookPlayer` 是控制器唯一依赖的引擎接口；`AudioBookPlayer` 用 symphonia 解码、
//! cpal 输出，每个已加载章节配一个填充线程。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::{
    AudioDecoder, AudioOutput, Book, OutputConfig, OutputSink, PlayerConfig, PlayerError, Result,
    SpeedResampler,
};

/// 单个音频源的引擎接口，时间单位为秒
pub trait BookPlayer {
    /// 章节数量
    fn files_amount(&self) -> usize;

    /// 章节显示名
    fn chapter_title(&self, index: usize) -> String {
        format!("Chapter {}", index + 1)
    }

    /// 加载章节；失败时引擎处于未加载状态
    fn load_chapter(&mut self, index: usize) -> Result<()>;

    /// 从当前位置开始播放；未加载时无操作
    fn play(&mut self);

    /// 暂停，可重复调用
    fn pause(&mut self);

    /// 实际播放状态
    fn is_playing(&self) -> bool;

    fn current_time(&self) -> f64;

    /// 跳转
    fn set_current_time(&mut self, secs: f64);

    /// 当前章节时长；未加载时为 0
    fn duration(&self) -> f64;

    /// 播放倍速
    fn set_rate(&mut self, rate: f64);

    /// 当前章节已播放到结尾
    fn has_finished(&self) -> bool;
}

/// 填充线程命令
#[derive(Debug, Clone, Copy)]
enum FeedCommand {
    Seek(f64),
    SetRate(f64),
    Shutdown,
}

/// 解码填充线程句柄
struct Feeder {
    cmd_tx: Sender<FeedCommand>,
    ended: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Feeder {
    fn spawn(decoder: AudioDecoder, sink: OutputSink, rate: f64) -> Self {
        let (cmd_tx, cmd_rx) = unbounded();
        let ended = Arc::new(AtomicBool::new(false));
        let thread_ended = ended.clone();

        let thread = thread::spawn(move || {
            run_feeder(decoder, sink, cmd_rx, thread_ended, rate);
        });

        Self {
            cmd_tx,
            ended,
            thread: Some(thread),
        }
    }

    fn send(&self, cmd: FeedCommand) {
        let _ = self.cmd_tx.send(cmd);
    }
}

impl Drop for Feeder {
    fn drop(&mut self) {
        self.send(FeedCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_feeder(
    mut decoder: AudioDecoder,
    sink: OutputSink,
    cmd_rx: Receiver<FeedCommand>,
    ended: Arc<AtomicBool>,
    rate: f64,
) {
    let mut resampler = SpeedResampler::new(decoder.info.channels);
    resampler.set_rate(rate);
    let mut pending: Option<Vec<f32>> = None;

    // 返回 false 表示线程应退出
    let apply = |cmd: FeedCommand,
                 decoder: &mut AudioDecoder,
                 resampler: &mut SpeedResampler,
                 pending: &mut Option<Vec<f32>>|
     -> bool {
        match cmd {
            FeedCommand::Seek(secs) => {
                if let Err(e) = decoder.seek(secs) {
                    tracing::warn!("seek to {:.2}s failed: {}", secs, e);
                }
                resampler.reset();
                *pending = None;
                sink.reset_to(secs);
                ended.store(false, Ordering::Relaxed);
                true
            }
            FeedCommand::SetRate(rate) => {
                resampler.set_rate(rate);
                true
            }
            FeedCommand::Shutdown => false,
        }
    };

    loop {
        loop {
            match cmd_rx.try_recv() {
                Ok(cmd) => {
                    if !apply(cmd, &mut decoder, &mut resampler, &mut pending) {
                        return;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        if pending.is_none() && !ended.load(Ordering::Relaxed) {
            match decoder.decode_next() {
                Ok(Some(samples)) => pending = Some(resampler.process(&samples)),
                Ok(None) => {
                    tracing::debug!("chapter stream ended");
                    ended.store(true, Ordering::Relaxed);
                }
                Err(e) => {
                    tracing::warn!("decode error, ending chapter: {}", e);
                    ended.store(true, Ordering::Relaxed);
                }
            }
        }

        // 放不下的部分留到下一轮
        let stalled = match pending.take() {
            Some(mut chunk) => {
                let written = sink.write(&chunk);
                if written < chunk.len() {
                    chunk.drain(..written);
                    pending = Some(chunk);
                    true
                } else {
                    false
                }
            }
            None => ended.load(Ordering::Relaxed),
        };

        // 缓冲区满或已结束时等待命令，避免 CPU 空转
        if stalled {
            match cmd_rx.recv_timeout(Duration::from_millis(5)) {
                Ok(cmd) => {
                    if !apply(cmd, &mut decoder, &mut resampler, &mut pending) {
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }
}

struct LoadedChapter {
    index: usize,
    output: AudioOutput,
    feeder: Feeder,
    duration: f64,
}

impl LoadedChapter {
    fn has_finished(&self) -> bool {
        self.feeder.ended.load(Ordering::Relaxed) && self.output.sink().is_drained()
    }
}

/// 基于 symphonia + cpal 的有声书引擎
pub struct AudioBookPlayer {
    book: Book,
    buffer_frames: usize,
    rate: f64,
    loaded: Option<LoadedChapter>,
}

impl AudioBookPlayer {
    /// 创建引擎，章节由控制器加载
    pub fn new(book: Book, config: &PlayerConfig) -> Self {
        Self {
            book,
            buffer_frames: config.output_buffer_frames,
            rate: 1.0,
            loaded: None,
        }
    }

    /// 已加载的章节下标
    pub fn loaded_chapter(&self) -> Option<usize> {
        self.loaded.as_ref().map(|l| l.index)
    }

    fn open_chapter(&self, index: usize) -> Result<LoadedChapter> {
        let path = self
            .book
            .chapters()
            .get(index)
            .ok_or(PlayerError::ChapterOutOfRange {
                index,
                total: self.book.len(),
            })?;

        let decoder = AudioDecoder::open(path)?;
        let info = decoder.info.clone();

        let output = AudioOutput::new(OutputConfig {
            sample_rate: info.sample_rate,
            channels: info.channels as u16,
            buffer_frames: self.buffer_frames,
        })?;
        output.set_rate(self.rate);

        let feeder = Feeder::spawn(decoder, output.sink(), self.rate);

        tracing::info!(
            "loaded chapter {} ({}, {} Hz, {} ch, {:.1}s)",
            index + 1,
            info.codec,
            info.sample_rate,
            info.channels,
            info.duration
        );

        Ok(LoadedChapter {
            index,
            output,
            feeder,
            duration: info.duration,
        })
    }
}

impl BookPlayer for AudioBookPlayer {
    fn files_amount(&self) -> usize {
        self.book.len()
    }

    fn chapter_title(&self, index: usize) -> String {
        self.book
            .chapter_title(index)
            .unwrap_or_else(|| format!("Chapter {}", index + 1))
    }

    fn load_chapter(&mut self, index: usize) -> Result<()> {
        // 先释放旧章节的输出流和填充线程
        self.loaded = None;
        self.loaded = Some(self.open_chapter(index)?);
        Ok(())
    }

    fn play(&mut self) {
        if let Some(loaded) = &self.loaded {
            loaded.output.set_playing(true);
        }
    }

    fn pause(&mut self) {
        if let Some(loaded) = &self.loaded {
            loaded.output.set_playing(false);
        }
    }

    fn is_playing(&self) -> bool {
        self.loaded
            .as_ref()
            .map(|l| l.output.is_playing() && !l.has_finished())
            .unwrap_or(false)
    }

    fn current_time(&self) -> f64 {
        self.loaded
            .as_ref()
            .map(|l| {
                let pos = l.output.position();
                if l.duration > 0.0 {
                    pos.min(l.duration)
                } else {
                    pos
                }
            })
            .unwrap_or(0.0)
    }

    fn set_current_time(&mut self, secs: f64) {
        if let Some(loaded) = &self.loaded {
            // 立即生效，填充线程收到命令后再重新对齐
            loaded.output.sink().reset_to(secs);
            loaded.feeder.ended.store(false, Ordering::Relaxed);
            loaded.feeder.send(FeedCommand::Seek(secs));
        }
    }

    fn duration(&self) -> f64 {
        self.loaded.as_ref().map(|l| l.duration).unwrap_or(0.0)
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
        if let Some(loaded) = &self.loaded {
            loaded.output.set_rate(rate);
            loaded.feeder.send(FeedCommand::SetRate(rate));
        }
    }

    fn has_finished(&self) -> bool {
        self.loaded
            .as_ref()
            .map(LoadedChapter::has_finished)
            .unwrap_or(false)
    }
}
