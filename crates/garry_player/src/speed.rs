//! 播放倍速

/// 可选倍速，按顺序循环
pub const SPEEDS: [f64; 4] = [0.5, 1.0, 2.0, 2.5];

/// 默认倍速下标（1.0x）
pub const DEFAULT_SPEED_INDEX: usize = 1;

/// 倍速循环；倍速值总是由下标推导
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedCycle {
    index: usize,
}

impl Default for SpeedCycle {
    fn default() -> Self {
        Self {
            index: DEFAULT_SPEED_INDEX,
        }
    }
}

impl SpeedCycle {
    pub fn speed(&self) -> f64 {
        SPEEDS[self.index]
    }

    /// 切换到下一档，最后一档之后回到第一档
    pub fn advance(&mut self) -> f64 {
        self.index = (self.index + 1) % SPEEDS.len();
        self.speed()
    }
}
