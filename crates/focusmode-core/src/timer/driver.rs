//! Cooperative scheduler around [`TimerEngine`].
//!
//! The driver owns the only ticker task. The ticker is spawned when the
//! engine enters `Running` and aborted when it leaves, so at most one is
//! alive at a time. Events from commands and ticks are published to every
//! subscriber.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use super::engine::{TimerEngine, TimerState};
use super::rotation::SessionType;
use crate::events::Event;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy)]
enum Command {
    Toggle,
    Reset,
    Skip,
    Select(SessionType),
}

struct Inner {
    engine: Mutex<TimerEngine>,
    ticker: std::sync::Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<Event>,
    period: Duration,
    /// Bumped by every user command; a pending auto-start bails if it moved.
    generation: AtomicU64,
}

/// Shared handle to a running timer. Cheap to clone.
#[derive(Clone)]
pub struct TimerDriver {
    inner: Arc<Inner>,
}

impl TimerDriver {
    /// Drive `engine` with a one-second tick.
    pub fn new(engine: TimerEngine) -> Self {
        Self::with_period(engine, Duration::from_secs(1))
    }

    pub fn with_period(engine: TimerEngine, period: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                engine: Mutex::new(engine),
                ticker: std::sync::Mutex::new(None),
                events,
                period,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Register an observer. Every event published after this call is delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.events.subscribe()
    }

    pub async fn state(&self) -> TimerState {
        self.inner.engine.lock().await.state().clone()
    }

    pub async fn snapshot(&self) -> Event {
        self.inner.engine.lock().await.snapshot()
    }

    pub async fn toggle(&self) -> Event {
        self.command(Command::Toggle).await
    }

    pub async fn reset(&self) -> Event {
        self.command(Command::Reset).await
    }

    pub async fn skip(&self) -> Event {
        self.command(Command::Skip).await
    }

    pub async fn select_session_type(&self, session_type: SessionType) -> Event {
        self.command(Command::Select(session_type)).await
    }

    /// Stop ticking and hand back the final state for persistence.
    pub async fn shutdown(&self) -> TimerState {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.disarm();
        let mut engine = self.inner.engine.lock().await;
        if engine.state().is_active {
            engine.toggle().await;
        }
        engine.state().clone()
    }

    /// Whether a ticker task is currently alive.
    pub fn is_ticking(&self) -> bool {
        self.inner
            .ticker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    async fn command(&self, command: Command) -> Event {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        let mut engine = self.inner.engine.lock().await;
        let was_active = engine.state().is_active;
        let event = match command {
            Command::Toggle => engine.toggle().await,
            Command::Reset => engine.reset().await,
            Command::Skip => engine.skip().await,
            Command::Select(session_type) => engine.select_session_type(session_type).await,
        };
        let now_active = engine.state().is_active;
        self.publish(&event);
        self.schedule_after(&event);
        drop(engine);

        match (was_active, now_active) {
            (false, true) => self.arm(),
            (true, false) => self.disarm(),
            _ => {}
        }
        event
    }

    fn publish(&self, event: &Event) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event.clone());
    }

    fn arm(&self) {
        let driver = self.clone();
        let period = self.inner.period;
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut engine = driver.inner.engine.lock().await;
                if let Some(event) = engine.tick().await {
                    driver.publish(&event);
                    driver.schedule_after(&event);
                }
                if !engine.state().is_active {
                    debug!("ticker stopped");
                    break;
                }
            }
        });

        let mut slot = self.inner.ticker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    fn disarm(&self) {
        let mut slot = self.inner.ticker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    /// Completion with auto-start: start the next session after the
    /// configured delay, unless the user acted in the meantime.
    fn schedule_after(&self, event: &Event) {
        let Event::TimerCompleted {
            auto_start: true, ..
        } = event
        else {
            return;
        };

        let driver = self.clone();
        let generation = self.inner.generation.load(Ordering::Acquire);
        tokio::spawn(async move {
            let delay = driver.inner.engine.lock().await.settings().auto_start_delay();
            time::sleep(delay).await;
            if driver.inner.generation.load(Ordering::Acquire) != generation {
                debug!("auto-start cancelled by user action");
                return;
            }
            let idle = !driver.inner.engine.lock().await.state().is_active;
            if idle {
                driver.toggle().await;
            }
        });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .ticker
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
    }
}
