//! 播放控制器
//!
//! 意图逐个处理，不并发；只有控制器（以及它持有的 `TimeController`）会调用引擎。
//! 播放期间存在且只存在一个轮询计时器。

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::{
    BookPlayer, Intent, PlaybackSession, PlayerConfig, PlayerSnapshot, ThreadScheduler,
    TickScheduler, TimerHandle,
};

type Observer = Box<dyn FnMut(&PlayerSnapshot)>;

pub struct PlaybackController<E: BookPlayer, S: TickScheduler = ThreadScheduler> {
    engine: E,
    scheduler: S,
    config: PlayerConfig,
    session: PlaybackSession,
    polling: Option<TimerHandle>,
    intent_tx: Sender<Intent>,
    intent_rx: Receiver<Intent>,
    observer: Option<Observer>,
    last_snapshot: Option<PlayerSnapshot>,
    stopped: bool,
}

impl<E: BookPlayer> PlaybackController<E, ThreadScheduler> {
    pub fn new(engine: E, title: impl Into<String>, config: PlayerConfig) -> Self {
        Self::with_scheduler(engine, title, config, ThreadScheduler)
    }
}

impl<E: BookPlayer, S: TickScheduler> PlaybackController<E, S> {
    /// 创建会话并加载第一章；加载失败时会话照常创建，只是无法播放
    pub fn with_scheduler(
        mut engine: E,
        title: impl Into<String>,
        config: PlayerConfig,
        scheduler: S,
    ) -> Self {
        let title = title.into();
        let chapters: Vec<String> = (0..engine.files_amount())
            .map(|i| engine.chapter_title(i))
            .collect();

        if !chapters.is_empty() {
            if let Err(e) = engine.load_chapter(0) {
                tracing::warn!("failed to load first chapter of {}: {}", title, e);
            }
        }

        let session = PlaybackSession::new(title, chapters, engine.duration());
        let (intent_tx, intent_rx) = unbounded();

        tracing::info!(
            "session started: {} ({} chapters)",
            session.title(),
            session.total_chapters()
        );

        Self {
            engine,
            scheduler,
            config,
            session,
            polling: None,
            intent_tx,
            intent_rx,
            observer: None,
            last_snapshot: None,
            stopped: false,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn is_polling(&self) -> bool {
        self.polling.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// 展示层和计时器共用的意图发送端
    pub fn sender(&self) -> Sender<Intent> {
        self.intent_tx.clone()
    }

    /// 意图接收端，供外部事件循环 `select!`
    pub fn receiver(&self) -> Receiver<Intent> {
        self.intent_rx.clone()
    }

    /// 注册状态变化回调；注册时立即回调一次当前状态
    pub fn on_change(&mut self, observer: impl FnMut(&PlayerSnapshot) + 'static) {
        let mut observer: Observer = Box::new(observer);
        let snapshot = self.snapshot();
        observer(&snapshot);
        self.last_snapshot = Some(snapshot);
        self.observer = Some(observer);
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.session.snapshot(
            self.config.skip_backward_secs,
            self.config.skip_forward_secs,
        )
    }

    /// 按到达顺序处理所有待处理意图，返回处理数量
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(intent) = self.intent_rx.try_recv() {
            self.dispatch(intent);
            handled += 1;
        }
        handled
    }

    /// 处理一个意图
    pub fn dispatch(&mut self, intent: Intent) {
        if self.stopped {
            tracing::debug!("session stopped, dropping {:?}", intent);
            return;
        }

        if self.session.time.is_scrubbing() && is_blocked_while_scrubbing(intent) {
            tracing::debug!("scrubbing, ignoring {:?}", intent);
            return;
        }

        match intent {
            Intent::UpdateTime => {
                tracing::trace!("tick");
                self.on_tick();
            }
            other => {
                tracing::debug!("dispatch {:?}", other);
                self.handle(other);
            }
        }

        self.notify();
    }

    fn handle(&mut self, intent: Intent) {
        match intent {
            Intent::PlayToggle => self.handle_play_toggle(),
            Intent::SpeedTap => self.toggle_speed(),
            Intent::PreviousChapter => self.previous_chapter(),
            Intent::NextChapter => self.next_chapter(),
            Intent::SkipForward => self.skip_forward(),
            Intent::SkipBackward => self.skip_backward(),
            Intent::ScrubStart => {
                self.session.time.on_scrub_start(&mut self.engine);
                self.sync_playing();
            }
            Intent::ScrubChanged(secs) => {
                if self.session.time.is_scrubbing() {
                    self.session.time.on_scrub_changed(secs);
                } else {
                    self.session.time.seek_to(secs, &mut self.engine);
                }
            }
            Intent::ScrubEnd => {
                if self.session.time.is_scrubbing() {
                    self.session.time.on_scrub_end(&mut self.engine);
                    self.sync_playing();
                }
            }
            Intent::SelectChapter(index) => self.select_chapter(index),
            Intent::Stop => self.stop(),
            Intent::UpdateTime => self.on_tick(),
        }
    }

    /// 切换到下一档倍速
    pub fn toggle_speed(&mut self) {
        let speed = self.session.speed.advance();
        self.engine.set_rate(speed);
        tracing::info!("speed set to {}x", speed);
    }

    /// 播放 / 暂停；结果以引擎读回为准
    pub fn handle_play_toggle(&mut self) {
        if !self.session.is_playing && self.engine.has_finished() {
            self.replay_finished();
            return;
        }

        if !self.session.is_playing {
            self.start_polling();
            self.engine.play();
        } else {
            self.engine.pause();
            self.cancel_polling();
        }
        self.sync_playing();

        if self.session.is_playing {
            tracing::info!("playing chapter {}", self.session.current_chapter_index + 1);
        } else {
            tracing::info!("paused");
        }
    }

    /// 超过阈值时回到本章开头，否则进入上一章；第一章只会回到开头
    pub fn previous_chapter(&mut self) {
        let index = self.session.current_chapter_index;
        let past_threshold =
            self.session.time.current_time() > self.config.previous_restart_threshold_secs;

        if index == 0 || past_threshold {
            self.session.time.seek_to(0.0, &mut self.engine);
        } else {
            let resume = self.session.is_playing;
            self.change_chapter(index - 1, resume);
        }
    }

    /// 进入下一章；最后一章时无操作
    pub fn next_chapter(&mut self) {
        if self.session.is_last_chapter() {
            tracing::debug!("already at last chapter");
            return;
        }
        let resume = self.session.is_playing;
        self.change_chapter(self.session.current_chapter_index + 1, resume);
    }

    /// 在本章内快进，不跨章节
    pub fn skip_forward(&mut self) {
        self.session
            .time
            .on_jump_by_delta(self.config.skip_forward_secs, &mut self.engine);
    }

    /// 在本章内快退，不跨章节
    pub fn skip_backward(&mut self) {
        self.session
            .time
            .on_jump_by_delta(-self.config.skip_backward_secs, &mut self.engine);
    }

    pub fn select_chapter(&mut self, index: usize) {
        if index >= self.session.total_chapters() {
            tracing::warn!(
                "chapter {} out of range (total {})",
                index + 1,
                self.session.total_chapters()
            );
            return;
        }
        let resume = self.session.is_playing;
        self.change_chapter(index, resume);
    }

    /// 取消轮询并暂停；之后的意图都会被丢弃
    pub fn stop(&mut self) {
        self.teardown();
        self.stopped = true;
        tracing::info!("session stopped");
    }

    /// 章节已播完时按播放键：进入下一章，或从本章开头重播
    fn replay_finished(&mut self) {
        let index = self.session.current_chapter_index;
        if self.config.auto_advance && !self.session.is_last_chapter() {
            tracing::info!("chapter {} already finished, advancing", index + 1);
            self.change_chapter(index + 1, true);
            return;
        }

        tracing::info!("replaying chapter {}", index + 1);
        self.session.time.seek_to(0.0, &mut self.engine);
        self.start_polling();
        self.engine.play();
        self.sync_playing();
    }

    fn on_tick(&mut self) {
        // 暂停后仍在队列中的 tick 不起作用
        if self.session.time.is_scrubbing() || !self.session.is_playing {
            return;
        }

        if self.engine.has_finished() {
            self.on_chapter_finished();
            return;
        }

        self.session.time.on_time_update_tick(&self.engine);

        // 引擎自行停下（如设备错误）时同步状态
        if self.session.is_playing && !self.engine.is_playing() {
            tracing::warn!("engine stopped unexpectedly");
            self.sync_playing();
        }
    }

    fn on_chapter_finished(&mut self) {
        let index = self.session.current_chapter_index;
        if self.config.auto_advance && !self.session.is_last_chapter() {
            tracing::info!("chapter {} finished, advancing", index + 1);
            self.change_chapter(index + 1, true);
        } else {
            tracing::info!("chapter {} finished", index + 1);
            self.engine.pause();
            self.session.time.on_chapter_finished();
            self.sync_playing();
        }
    }

    fn change_chapter(&mut self, index: usize, resume: bool) {
        self.session.current_chapter_index = index;

        if let Err(e) = self.engine.load_chapter(index) {
            tracing::warn!("failed to load chapter {}: {}", index + 1, e);
        }
        self.engine.set_rate(self.session.speed.speed());
        self.session.time.on_chapter_reset(&mut self.engine);

        if resume {
            self.start_polling();
            self.engine.play();
        }
        self.sync_playing();
    }

    /// 读回引擎状态；未在播放时不保留计时器
    fn sync_playing(&mut self) {
        self.session.is_playing = self.engine.is_playing();
        if self.session.is_playing {
            if self.polling.is_none() {
                self.start_polling();
            }
        } else {
            self.cancel_polling();
        }
    }

    /// 先取消旧计时器再启动新的
    fn start_polling(&mut self) {
        self.cancel_polling();
        let handle = self
            .scheduler
            .schedule(self.config.tick_interval(), self.intent_tx.clone());
        self.polling = Some(handle);
    }

    fn cancel_polling(&mut self) {
        if let Some(handle) = self.polling.take() {
            handle.cancel();
        }
    }

    fn teardown(&mut self) {
        self.cancel_polling();
        self.engine.pause();
        self.session.is_playing = self.engine.is_playing();
    }

    fn notify(&mut self) {
        let Some(observer) = self.observer.as_mut() else {
            return;
        };
        let snapshot = self.session.snapshot(
            self.config.skip_backward_secs,
            self.config.skip_forward_secs,
        );
        if self.last_snapshot.as_ref() != Some(&snapshot) {
            observer(&snapshot);
            self.last_snapshot = Some(snapshot);
        }
    }
}

impl<E: BookPlayer, S: TickScheduler> Drop for PlaybackController<E, S> {
    fn drop(&mut self) {
        if !self.stopped {
            self.teardown();
        }
    }
}

/// 拖动期间拖动独占位置，传输和章节操作被忽略
fn is_blocked_while_scrubbing(intent: Intent) -> bool {
    matches!(
        intent,
        Intent::PlayToggle
            | Intent::PreviousChapter
            | Intent::NextChapter
            | Intent::SkipForward
            | Intent::SkipBackward
            | Intent::SelectChapter(_)
    )
}
