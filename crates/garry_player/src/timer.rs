//! 可取消的重复计时器

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};

use crate::Intent;

/// 计时器句柄；`cancel` 或 drop 时停止，且只执行一次
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.cancel_inner();
    }

    fn cancel_inner(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel_inner();
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// 轮询计时器的调度方式
pub trait TickScheduler {
    /// 每隔 `period` 向 `sink` 发送一次 `Intent::UpdateTime`
    fn schedule(&mut self, period: Duration, sink: Sender<Intent>) -> TimerHandle;
}

/// 每个计时器一个线程
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadScheduler;

impl TickScheduler for ThreadScheduler {
    fn schedule(&mut self, period: Duration, sink: Sender<Intent>) -> TimerHandle {
        let (stop_tx, stop_rx) = bounded::<()>(0);

        thread::spawn(move || {
            let ticker = tick(period);
            loop {
                select! {
                    // 发送端被 drop 即为取消
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => {
                        if sink.send(Intent::UpdateTime).is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::trace!("tick thread exited");
        });

        TimerHandle::new(move || drop(stop_tx))
    }
}
