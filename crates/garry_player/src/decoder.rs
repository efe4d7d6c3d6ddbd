//! 章节解码器
//!
//! 使用 symphonia 解码单个章节文件

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::{Time, TimeStamp};

/// 解码器错误
#[derive(thiserror::Error, Debug)]
pub enum DecoderError {
    #[error("No supported audio track found")]
    NoTrack,
    #[error("Unsupported codec")]
    UnsupportedCodec,
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SymphoniaError> for DecoderError {
    fn from(e: SymphoniaError) -> Self {
        DecoderError::Decode(e.to_string())
    }
}

/// 章节音频信息
#[derive(Debug, Clone)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    /// 总时长（秒），未知时为 0
    pub duration: f64,
    pub codec: String,
}

/// 章节解码器
pub struct AudioDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_buf: Option<SampleBuffer<f32>>,
    /// 跳转后第一个应输出的帧；之前的帧解码后丢弃
    seek_target: Option<TimeStamp>,
    pub info: AudioInfo,
}

impl AudioDecoder {
    /// 打开章节文件，扩展名作为探测提示
    pub fn open(path: &Path) -> Result<Self, DecoderError> {
        let file = File::open(path)?;
        let hint = path.extension().and_then(|ext| ext.to_str());
        Self::new(file, hint)
    }

    /// 从任意媒体源创建解码器
    pub fn new<S: MediaSource + 'static>(
        source: S,
        hint: Option<&str>,
    ) -> Result<Self, DecoderError> {
        let mss = MediaSourceStream::new(Box::new(source), Default::default());

        let mut probe_hint = Hint::new();
        if let Some(ext) = hint {
            probe_hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &probe_hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecoderError::NoTrack)?;

        let track_id = track.id;
        let codec_params = &track.codec_params;

        let sample_rate = codec_params.sample_rate.unwrap_or(44100);
        let channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);

        let duration = codec_params
            .n_frames
            .map(|frames| frames as f64 / sample_rate as f64)
            .unwrap_or(0.0);

        let info = AudioInfo {
            sample_rate,
            channels,
            duration,
            codec: format!("{:?}", codec_params.codec),
        };

        let decoder = symphonia::default::get_codecs()
            .make(codec_params, &DecoderOptions::default())
            .map_err(|_| DecoderError::UnsupportedCodec)?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_buf: None,
            seek_target: None,
            info,
        })
    }

    /// 解码下一帧，返回交错的 f32 采样；`None` 表示章节结束
    pub fn decode_next(&mut self) -> Result<Option<Vec<f32>>, DecoderError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                // 损坏的包直接跳过
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            let capacity = decoded.capacity();
            let frames = decoded.frames() as u64;

            let skip = match self.seek_target {
                Some(target) => target.saturating_sub(packet.ts()),
                None => 0,
            };
            if skip >= frames {
                continue;
            }
            self.seek_target = None;

            if self
                .sample_buf
                .as_ref()
                .map_or(true, |buf| buf.capacity() < capacity)
            {
                self.sample_buf = Some(SampleBuffer::new(capacity as u64, spec));
            }
            let Some(sample_buf) = self.sample_buf.as_mut() else {
                continue;
            };
            sample_buf.copy_interleaved_ref(decoded);

            let start = skip as usize * spec.channels.count();
            let samples = sample_buf.samples();
            return Ok(Some(samples[start.min(samples.len())..].to_vec()));
        }
    }

    /// 跳转到指定时间（秒）
    pub fn seek(&mut self, secs: f64) -> Result<(), DecoderError> {
        let seek_to = SeekTo::Time {
            time: Time::from(secs.max(0.0)),
            track_id: Some(self.track_id),
        };

        self.seek_target = None;
        let seeked = self.format.seek(SeekMode::Accurate, seek_to)?;
        self.decoder.reset();
        // 格式层只能停在包边界
        self.seek_target = (seeked.actual_ts < seeked.required_ts).then_some(seeked.required_ts);

        Ok(())
    }
}
