//! 倍速重采样
//!
//! 线性插值改变播放速率，音高随速率变化。

/// 块间连续的线性插值重采样器
pub struct SpeedResampler {
    channels: usize,
    rate: f64,
    /// 相对于扩展序列（上一块末帧 + 当前块）的读取位置
    cursor: f64,
    prev_frame: Vec<f32>,
}

impl SpeedResampler {
    pub fn new(channels: usize) -> Self {
        let channels = channels.max(1);
        Self {
            channels,
            rate: 1.0,
            cursor: 1.0,
            prev_frame: vec![0.0; channels],
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.rate = rate;
        }
    }

    /// 丢弃插值历史（跳转后调用）
    pub fn reset(&mut self) {
        self.cursor = 1.0;
        self.prev_frame.fill(0.0);
    }

    /// 处理一块交错采样
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let ch = self.channels;
        let frames = input.len() / ch;
        if frames == 0 {
            return Vec::new();
        }

        if (self.rate - 1.0).abs() < f64::EPSILON {
            self.prev_frame
                .copy_from_slice(&input[(frames - 1) * ch..frames * ch]);
            self.cursor = 1.0;
            return input[..frames * ch].to_vec();
        }

        let sample_at = |prev: &[f32], frame: usize, c: usize| -> f32 {
            if frame == 0 {
                prev[c]
            } else {
                input[(frame - 1) * ch + c]
            }
        };

        let estimated = (frames as f64 / self.rate) as usize + 1;
        let mut out = Vec::with_capacity(estimated * ch);

        // 扩展序列长度为 frames + 1，索引 0 为上一块末帧
        while self.cursor < frames as f64 {
            let i = self.cursor.floor() as usize;
            let t = (self.cursor - i as f64) as f32;
            for c in 0..ch {
                let a = sample_at(&self.prev_frame, i, c);
                let b = sample_at(&self.prev_frame, i + 1, c);
                out.push(a + (b - a) * t);
            }
            self.cursor += self.rate;
        }

        self.cursor -= frames as f64;
        self.prev_frame
            .copy_from_slice(&input[(frames - 1) * ch..frames * ch]);
        out
    }
}
