//! Tokio-backed timer source.
//!
//! Each running timer is a task that pushes `SessionInput::Tick` into the
//! session mailbox once per period. Cancelling aborts the task; a tick that
//! was already queued is dropped by the session.

use handover_core::{TimerId, TimerSource};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::actor::SessionInput;

pub struct TokioTimers {
    inbox: mpsc::Sender<SessionInput>,
    running: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioTimers {
    pub fn new(inbox: mpsc::Sender<SessionInput>) -> Self {
        Self {
            inbox,
            running: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn is_running(&self, timer: TimerId) -> bool {
        self.running
            .get(&timer)
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl TimerSource for TokioTimers {
    fn start(&mut self, timer: TimerId, period: Duration) {
        self.cancel(timer);

        let inbox = self.inbox.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                if inbox.send(SessionInput::Tick(timer)).await.is_err() {
                    break;
                }
            }
        });

        tracing::debug!(timer = ?timer, period = ?period, "Timer started");
        self.running.insert(timer, handle);
    }

    fn cancel(&mut self, timer: TimerId) {
        if let Some(handle) = self.running.remove(&timer) {
            handle.abort();
            tracing::debug!(timer = ?timer, "Timer cancelled");
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, handle) in self.running.drain() {
            handle.abort();
        }
    }
}
