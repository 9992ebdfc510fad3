use std::fmt;

/// Length of a work interval in seconds.
pub const WORK_SECONDS: u32 = 25 * 60;
/// Length of a break interval in seconds.
pub const BREAK_SECONDS: u32 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Work,
    Break,
}

impl TimerPhase {
    #[must_use]
    pub fn duration_secs(self) -> u32 {
        match self {
            TimerPhase::Work => WORK_SECONDS,
            TimerPhase::Break => BREAK_SECONDS,
        }
    }

    #[must_use]
    pub fn other(self) -> Self {
        match self {
            TimerPhase::Work => TimerPhase::Break,
            TimerPhase::Break => TimerPhase::Work,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TimerPhase::Work => "Work Time",
            TimerPhase::Break => "Break Time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The timer was not running.
    Ignored,
    Counted,
    /// The interval ran out; the timer now waits in the next phase.
    PhaseComplete(TimerPhase),
}

/// Work/break countdown with one-second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    phase: TimerPhase,
    remaining_seconds: u32,
    status: TimerStatus,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            phase: TimerPhase::Work,
            remaining_seconds: WORK_SECONDS,
            status: TimerStatus::Idle,
        }
    }
}

impl TimerState {
    #[must_use]
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn status(&self) -> TimerStatus {
        self.status
    }

    #[must_use]
    pub fn running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Returns false if the timer was already running.
    pub fn start(&mut self) -> bool {
        if self.running() {
            return false;
        }
        self.status = TimerStatus::Running;
        true
    }

    /// Returns false if the timer was not running.
    pub fn pause(&mut self) -> bool {
        if !self.running() {
            return false;
        }
        self.status = TimerStatus::Paused;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running() {
            return Tick::Ignored;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return Tick::Counted;
        }
        self.phase = self.phase.other();
        self.remaining_seconds = self.phase.duration_secs();
        self.status = TimerStatus::Idle;
        Tick::PhaseComplete(self.phase)
    }
}

/// Renders the remaining time as `M:SS`, e.g. `25:00` or `4:05`.
impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.remaining_seconds / 60;
        let seconds = self.remaining_seconds % 60;
        write!(f, "{minutes}:{seconds:02}")
    }
}
