//! 播放位置
//!
//! 三个写入方：引擎时钟（轮询）、拖动进度条、按增量跳转。拖动期间位置只由手势写入。

use crate::BookPlayer;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeController {
    current_time: f64,
    total_time: f64,
    is_scrubbing: bool,
    was_playing_before_scrub: bool,
}

impl TimeController {
    pub fn new(total_time: f64) -> Self {
        Self {
            total_time: total_time.max(0.0),
            ..Default::default()
        }
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn is_scrubbing(&self) -> bool {
        self.is_scrubbing
    }

    /// 限制在 `[0, total_time]`
    pub fn clamp(&self, secs: f64) -> f64 {
        if secs.is_nan() {
            return 0.0;
        }
        secs.clamp(0.0, self.total_time)
    }

    /// 轮询：未拖动且引擎在播放时，采用引擎位置
    pub fn on_time_update_tick<E: BookPlayer + ?Sized>(&mut self, engine: &E) {
        if !self.is_scrubbing && engine.is_playing() {
            self.current_time = self.clamp(engine.current_time());
        }
    }

    /// 开始拖动：记录播放状态并暂停引擎
    pub fn on_scrub_start<E: BookPlayer + ?Sized>(&mut self, engine: &mut E) {
        if self.is_scrubbing {
            return;
        }
        self.is_scrubbing = true;
        self.was_playing_before_scrub = engine.is_playing();
        engine.pause();
    }

    /// 拖动中只更新显示位置
    pub fn on_scrub_changed(&mut self, new_time: f64) {
        self.current_time = self.clamp(new_time);
    }

    /// 松开：提交位置，必要时恢复播放
    pub fn on_scrub_end<E: BookPlayer + ?Sized>(&mut self, engine: &mut E) {
        if !self.is_scrubbing {
            return;
        }
        engine.set_current_time(self.current_time);
        if self.was_playing_before_scrub {
            engine.play();
        }
        self.is_scrubbing = false;
        self.was_playing_before_scrub = false;
    }

    /// 按增量跳转，越界时停在边界
    pub fn on_jump_by_delta<E: BookPlayer + ?Sized>(&mut self, delta: f64, engine: &mut E) {
        self.seek_to(self.current_time + delta, engine);
    }

    /// 直接跳到指定位置
    pub fn seek_to<E: BookPlayer + ?Sized>(&mut self, secs: f64, engine: &mut E) {
        self.current_time = self.clamp(secs);
        engine.set_current_time(self.current_time);
    }

    /// 章节切换后回到开头并刷新时长
    pub fn on_chapter_reset<E: BookPlayer + ?Sized>(&mut self, engine: &mut E) {
        self.current_time = 0.0;
        engine.set_current_time(0.0);
        self.total_time = engine.duration().max(0.0);
    }

    /// 章节播完，停在结尾
    pub fn on_chapter_finished(&mut self) {
        self.current_time = self.total_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPlayer;

    fn playing_engine(duration: f64) -> MockPlayer {
        let mut engine = MockPlayer::new(vec![duration]);
        engine.load_chapter(0).unwrap();
        engine.play();
        engine
    }

    #[test]
    fn test_tick_follows_engine() {
        let mut engine = playing_engine(600.0);
        let mut time = TimeController::new(engine.duration());

        for _ in 0..3 {
            engine.advance(1.0);
            time.on_time_update_tick(&engine);
        }
        assert_eq!(time.current_time(), 3.0);
    }

    #[test]
    fn test_tick_ignored_when_paused() {
        let mut engine = playing_engine(600.0);
        let mut time = TimeController::new(600.0);
        engine.advance(4.0);
        engine.pause();
        time.on_time_update_tick(&engine);
        assert_eq!(time.current_time(), 0.0);
    }

    #[test]
    fn test_ticks_do_not_move_time_while_scrubbing() {
        let mut engine = playing_engine(600.0);
        let mut time = TimeController::new(600.0);

        time.on_scrub_start(&mut engine);
        assert!(!engine.is_playing());
        time.on_scrub_changed(42.0);

        // 外部让引擎继续走也不能覆盖拖动值
        engine.play();
        engine.advance(10.0);
        for _ in 0..5 {
            time.on_time_update_tick(&engine);
            assert_eq!(time.current_time(), 42.0);
        }
    }

    #[test]
    fn test_scrub_commits_and_resumes() {
        let mut engine = playing_engine(600.0);
        let mut time = TimeController::new(600.0);
        engine.advance(3.0);
        time.on_time_update_tick(&engine);

        time.on_scrub_start(&mut engine);
        time.on_scrub_changed(60.0);
        time.on_scrub_changed(120.0);
        assert_eq!(engine.current_time(), 3.0);

        time.on_scrub_end(&mut engine);
        assert_eq!(engine.current_time(), 120.0);
        assert!(engine.is_playing());
        assert!(!time.is_scrubbing());
    }

    #[test]
    fn test_scrub_end_keeps_paused_engine_paused() {
        let mut engine = MockPlayer::new(vec![600.0]);
        engine.load_chapter(0).unwrap();
        let mut time = TimeController::new(600.0);

        time.on_scrub_start(&mut engine);
        time.on_scrub_changed(30.0);
        time.on_scrub_end(&mut engine);

        assert!(!engine.is_playing());
        assert_eq!(engine.current_time(), 30.0);
        assert_eq!(engine.play_calls, 0);
    }

    #[test]
    fn test_repeated_scrub_start_keeps_first_snapshot() {
        let mut engine = playing_engine(600.0);
        let mut time = TimeController::new(600.0);
        time.on_scrub_start(&mut engine);
        time.on_scrub_start(&mut engine);
        time.on_scrub_end(&mut engine);
        assert!(engine.is_playing());
    }

    #[test]
    fn test_scrub_end_without_start_is_noop() {
        let mut engine = playing_engine(600.0);
        let mut time = TimeController::new(600.0);
        time.on_scrub_changed(99.0);
        time.on_scrub_end(&mut engine);
        assert!(engine.seeks.is_empty());
    }

    #[test]
    fn test_jump_saturates_at_bounds() {
        let mut engine = playing_engine(600.0);
        let mut time = TimeController::new(600.0);

        for delta in [-1e9, -10.0, 0.0, 5.5, 599.0, 1e9, f64::INFINITY, f64::NEG_INFINITY] {
            time.on_jump_by_delta(delta, &mut engine);
            let t = time.current_time();
            assert!((0.0..=600.0).contains(&t), "delta {delta} gave {t}");
            assert_eq!(engine.current_time(), t);
        }

        time.on_jump_by_delta(601.0, &mut engine);
        assert_eq!(time.current_time(), 600.0);
        time.on_jump_by_delta(-10_000.0, &mut engine);
        assert_eq!(time.current_time(), 0.0);
    }

    #[test]
    fn test_scrub_value_is_clamped() {
        let mut time = TimeController::new(100.0);
        time.on_scrub_changed(250.0);
        assert_eq!(time.current_time(), 100.0);
        time.on_scrub_changed(-3.0);
        assert_eq!(time.current_time(), 0.0);
        time.on_scrub_changed(f64::NAN);
        assert_eq!(time.current_time(), 0.0);
    }

    #[test]
    fn test_chapter_reset_refreshes_total() {
        let mut engine = MockPlayer::new(vec![600.0, 300.0]);
        engine.load_chapter(0).unwrap();
        let mut time = TimeController::new(600.0);
        time.seek_to(200.0, &mut engine);

        engine.load_chapter(1).unwrap();
        time.on_chapter_reset(&mut engine);
        assert_eq!(time.current_time(), 0.0);
        assert_eq!(time.total_time(), 300.0);
        assert_eq!(engine.current_time(), 0.0);
    }
}
