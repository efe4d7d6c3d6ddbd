//! 应用状态

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use garry_player::{
    AudioBookPlayer, Book, Intent, PlaybackController, PlayerConfig, PlayerSnapshot,
};

type Controller = PlaybackController<AudioBookPlayer>;

/// 应用状态
pub struct AppState {
    pub config: PlayerConfig,
    pub chapters: Vec<String>,
    pub last_error: Option<String>,
    controller: Option<Controller>,
    // 控制器回调写入，界面每帧读取
    snapshot: Rc<RefCell<Option<PlayerSnapshot>>>,
}

impl AppState {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            chapters: Vec::new(),
            last_error: None,
            controller: None,
            snapshot: Rc::new(RefCell::new(None)),
        }
    }

    /// 打开一本书；旧会话先销毁
    pub fn open_book(&mut self, dir: &Path) {
        if let Some(mut old) = self.controller.take() {
            old.stop();
        }
        *self.snapshot.borrow_mut() = None;
        self.chapters.clear();

        let book = match Book::scan(dir) {
            Ok(book) => book,
            Err(e) => {
                tracing::warn!("failed to open book {}: {}", dir.display(), e);
                self.last_error = Some(e.to_string());
                return;
            }
        };

        let title = book.title.clone();
        let engine = AudioBookPlayer::new(book, &self.config);
        let mut controller = PlaybackController::new(engine, title, self.config.clone());

        let slot = self.snapshot.clone();
        controller.on_change(move |snap| {
            *slot.borrow_mut() = Some(snap.clone());
        });

        self.chapters = controller.session().chapters().to_vec();
        self.last_error = None;
        self.controller = Some(controller);
    }

    pub fn pick_book_folder(&mut self) {
        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
            self.open_book(&dir);
        }
    }

    /// 处理计时器等异步到达的意图
    pub fn poll(&mut self) {
        if let Some(controller) = &mut self.controller {
            controller.pump();
        }
    }

    /// 界面手势立即派发
    pub fn dispatch(&mut self, intent: Intent) {
        if let Some(controller) = &mut self.controller {
            controller.dispatch(intent);
        }
    }

    pub fn snapshot(&self) -> Option<PlayerSnapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.snapshot
            .borrow()
            .as_ref()
            .map(|s| s.is_playing)
            .unwrap_or(false)
    }

    pub fn current_chapter(&self) -> Option<usize> {
        self.controller
            .as_ref()
            .map(|c| c.session().current_chapter_index())
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        if let Some(controller) = &mut self.controller {
            controller.dispatch(Intent::Stop);
        }
    }
}
