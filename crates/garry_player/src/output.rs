//! 音频输出
//!
//! 使用 cpal 进行音频播放；位置以源时间计，按当前倍速累加

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};

/// 倍速与位置的定点精度
const FIXED_POINT: u64 = 1000;

/// 音频输出错误
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("No output device available")]
    NoDevice,
    #[error("No supported config")]
    NoConfig,
    #[error("Stream error: {0}")]
    Stream(String),
}

/// 音频输出配置
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// 环形缓冲区容量（帧）
    pub buffer_frames: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_frames: 8192,
        }
    }
}

/// 输出流与填充线程共享的状态
struct OutputShared {
    ring: RingBuffer,
    is_playing: AtomicBool,
    position_fixed: AtomicU64,
    rate_fixed: AtomicU64,
    sample_rate: u32,
}

impl OutputShared {
    fn new(capacity: usize, sample_rate: u32) -> Self {
        Self {
            ring: RingBuffer::new(capacity),
            is_playing: AtomicBool::new(false),
            position_fixed: AtomicU64::new(0),
            rate_fixed: AtomicU64::new(FIXED_POINT),
            sample_rate,
        }
    }

    fn set_position(&self, secs: f64) {
        let fixed = secs.max(0.0) * self.sample_rate as f64 * FIXED_POINT as f64;
        self.position_fixed.store(fixed as u64, Ordering::Relaxed);
    }
}

/// 填充端句柄，可跨线程传递
#[derive(Clone)]
pub struct OutputSink {
    shared: Arc<OutputShared>,
}

impl OutputSink {
    /// 写入能放下的部分，返回写入的采样数
    pub fn write(&self, samples: &[f32]) -> usize {
        self.shared.ring.write(samples)
    }

    /// 丢弃缓冲中的采样，并把位置设为 `secs`
    pub fn reset_to(&self, secs: f64) {
        self.shared.ring.clear();
        self.shared.set_position(secs);
    }

    /// 缓冲区是否已播空
    pub fn is_drained(&self) -> bool {
        self.shared.ring.is_empty()
    }

    /// 不接输出设备的句柄
    #[cfg(test)]
    pub(crate) fn detached(capacity: usize, sample_rate: u32) -> Self {
        Self {
            shared: Arc::new(OutputShared::new(capacity, sample_rate)),
        }
    }

    /// 取走缓冲中的全部采样
    #[cfg(test)]
    pub(crate) fn take_all(&self) -> Vec<f32> {
        let mut buf = self.shared.ring.lock();
        buf.drain(..).collect()
    }
}

/// 音频输出流
pub struct AudioOutput {
    _stream: Stream,
    shared: Arc<OutputShared>,
}

impl AudioOutput {
    /// 创建音频输出
    pub fn new(config: OutputConfig) -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(OutputError::NoDevice)?;

        Self::with_device(&device, config)
    }

    /// 使用指定设备创建音频输出
    pub fn with_device(device: &Device, config: OutputConfig) -> Result<Self, OutputError> {
        let supported_config = device
            .supported_output_configs()
            .map_err(|e| OutputError::Stream(e.to_string()))?
            .find(|c| {
                c.channels() == config.channels
                    && c.min_sample_rate().0 <= config.sample_rate
                    && c.max_sample_rate().0 >= config.sample_rate
                    && c.sample_format() == SampleFormat::F32
            })
            .ok_or(OutputError::NoConfig)?;

        let stream_config: StreamConfig = supported_config
            .with_sample_rate(cpal::SampleRate(config.sample_rate))
            .into();

        let capacity = config.buffer_frames.max(1) * config.channels as usize;
        let shared = Arc::new(OutputShared::new(capacity, config.sample_rate));
        let callback_shared = shared.clone();
        let channels = config.channels.max(1) as usize;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if callback_shared.is_playing.load(Ordering::Relaxed) {
                        let read = callback_shared.ring.read(data);
                        // 欠载部分补静音
                        data[read..].fill(0.0);
                        let frames = (read / channels) as u64;
                        let rate = callback_shared.rate_fixed.load(Ordering::Relaxed);
                        callback_shared
                            .position_fixed
                            .fetch_add(frames * rate, Ordering::Relaxed);
                    } else {
                        data.fill(0.0);
                    }
                },
                |err| {
                    tracing::error!("audio output error: {}", err);
                },
                None,
            )
            .map_err(|e| OutputError::Stream(e.to_string()))?;

        stream.play().map_err(|e| OutputError::Stream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            shared,
        })
    }

    /// 获取填充端句柄
    pub fn sink(&self) -> OutputSink {
        OutputSink {
            shared: self.shared.clone(),
        }
    }

    /// 设置播放状态
    pub fn set_playing(&self, playing: bool) {
        self.shared.is_playing.store(playing, Ordering::Relaxed);
    }

    pub fn is_playing(&self) -> bool {
        self.shared.is_playing.load(Ordering::Relaxed)
    }

    /// 当前播放位置（秒，源时间）
    pub fn position(&self) -> f64 {
        let fixed = self.shared.position_fixed.load(Ordering::Relaxed);
        fixed as f64 / FIXED_POINT as f64 / self.shared.sample_rate as f64
    }

    /// 设置位置累加所用的倍速
    pub fn set_rate(&self, rate: f64) {
        let fixed = (rate.max(0.0) * FIXED_POINT as f64).round() as u64;
        self.shared.rate_fixed.store(fixed, Ordering::Relaxed);
    }
}

/// 有界采样缓冲区
struct RingBuffer {
    buffer: Mutex<VecDeque<f32>>,
    capacity: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<f32>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 按顺序写入剩余空间能容纳的前缀
    fn write(&self, data: &[f32]) -> usize {
        let mut buf = self.lock();
        let n = self.capacity.saturating_sub(buf.len()).min(data.len());
        buf.extend(data[..n].iter().copied());
        n
    }

    fn read(&self, output: &mut [f32]) -> usize {
        let mut buf = self.lock();
        let to_read = output.len().min(buf.len());

        let (a, b) = buf.as_slices();
        let a_len = a.len().min(to_read);
        output[..a_len].copy_from_slice(&a[..a_len]);
        let b_len = to_read - a_len;
        if b_len > 0 {
            output[a_len..to_read].copy_from_slice(&b[..b_len]);
        }

        buf.drain(..to_read);
        to_read
    }

    fn clear(&self) {
        self.lock().clear();
    }

    fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_writes_up_to_capacity() {
        let ring = RingBuffer::new(8);
        assert_eq!(ring.write(&[1.0; 6]), 6);
        assert_eq!(ring.write(&[2.0; 4]), 2);
        assert_eq!(ring.write(&[3.0]), 0);

        let mut out = [0.0f32; 4];
        assert_eq!(ring.read(&mut out), 4);
        assert_eq!(ring.write(&[2.0; 4]), 4);
    }

    #[test]
    fn test_ring_buffer_wraps_in_order() {
        let ring = RingBuffer::new(4);
        assert_eq!(ring.write(&[1.0, 2.0, 3.0]), 3);
        let mut out = [0.0f32; 2];
        ring.read(&mut out);
        assert_eq!(ring.write(&[4.0, 5.0, 6.0]), 3);

        let mut out = [0.0f32; 8];
        let read = ring.read(&mut out);
        assert_eq!(&out[..read], &[3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_oversized_chunk_is_written_in_order() {
        let ring = RingBuffer::new(3);
        let chunk = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut played = Vec::new();
        let mut offset = 0;
        while offset < chunk.len() {
            offset += ring.write(&chunk[offset..]);
            let mut out = [0.0f32; 2];
            let read = ring.read(&mut out);
            played.extend_from_slice(&out[..read]);
        }
        let mut out = [0.0f32; 3];
        let read = ring.read(&mut out);
        played.extend_from_slice(&out[..read]);

        assert_eq!(played, chunk);
        ring.clear();
        assert!(ring.is_empty());
    }

    #[test]
    fn test_shared_position_from_seconds() {
        let shared = OutputShared::new(16, 48000);
        shared.set_position(2.5);
        let fixed = shared.position_fixed.load(Ordering::Relaxed);
        assert_eq!(fixed, (2.5 * 48000.0 * FIXED_POINT as f64) as u64);
    }
}
