use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use study_core::model::{Tick, TimerState, TimerStatus};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Aborts the ticking task when dropped.
struct Ticker(JoinHandle<()>);

impl Drop for Ticker {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Work/break countdown driven by a once-a-second tokio task.
///
/// At most one ticking task exists; it is aborted on pause, reset and drop.
pub struct FocusTimer {
    state: Arc<watch::Sender<TimerState>>,
    ticker: Option<Ticker>,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusTimer {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(TimerState::default());
        Self {
            state: Arc::new(tx),
            ticker: None,
        }
    }

    /// Start or resume the countdown.
    ///
    /// Returns false if it was already running, or when there is no tokio
    /// runtime to tick on; the timer is left unchanged then.
    pub fn start(&mut self) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            warn!("focus timer needs a tokio runtime to tick");
            return false;
        };
        if !self.state.send_if_modified(TimerState::start) {
            return false;
        }
        debug!("focus timer started at {}", self.snapshot());
        self.ticker = Some(self.spawn_ticker(&runtime));
        true
    }

    /// Returns false if the countdown was not running.
    pub fn pause(&mut self) -> bool {
        self.ticker = None;
        let paused = self.state.send_if_modified(TimerState::pause);
        if paused {
            debug!("focus timer paused at {}", self.snapshot());
        }
        paused
    }

    /// Back to an idle work interval.
    pub fn reset(&mut self) {
        self.ticker = None;
        self.state.send_modify(TimerState::reset);
        debug!("focus timer reset");
    }

    /// The start/pause button.
    pub fn toggle(&mut self) -> TimerStatus {
        if self.status() == TimerStatus::Running {
            self.pause();
        } else {
            self.start();
        }
        self.status()
    }

    #[must_use]
    pub fn snapshot(&self) -> TimerState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn status(&self) -> TimerStatus {
        self.state.borrow().status()
    }

    /// Receiver notified on every change, for re-rendering.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .as_ref()
            .is_some_and(|ticker| !ticker.0.is_finished())
    }

    fn spawn_ticker(&self, runtime: &Handle) -> Ticker {
        let state = Arc::clone(&self.state);
        Ticker(runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            loop {
                interval.tick().await;
                let mut outcome = Tick::Ignored;
                state.send_if_modified(|timer| {
                    outcome = timer.tick();
                    outcome != Tick::Ignored
                });
                match outcome {
                    Tick::Counted => {}
                    Tick::PhaseComplete(phase) => {
                        info!("focus timer: {} begins", phase.label());
                        break;
                    }
                    Tick::Ignored => break,
                }
            }
        }))
    }
}
