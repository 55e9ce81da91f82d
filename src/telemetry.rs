//! Idle-time telemetry
//!
//! The game exposes an idle timer that counts up while the player does
//! nothing and resets when they act. Every full milestone of idle time
//! earns one hint credit.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default idle seconds per hint
pub const DEFAULT_MILESTONE_SECS: i64 = 300;

/// Non-blocking sampler of the in-game idle timer
pub trait TimerSource {
    /// Current timer value in seconds
    fn read_seconds(&mut self) -> Result<f32>;
}

/// Reads the idle timer from a file kept up to date by an external helper
#[derive(Debug, Clone)]
pub struct FileTimer {
    path: PathBuf,
}

impl FileTimer {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(Error::Telemetry(format!("timer file {:?} not found", path)));
        }
        Ok(Self { path })
    }
}

impl TimerSource for FileTimer {
    fn read_seconds(&mut self) -> Result<f32> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Io(format!("reading {:?}: {}", self.path, e)))?;
        text.trim()
            .parse::<f32>()
            .map_err(|e| Error::Telemetry(format!("bad timer value {:?}: {}", text.trim(), e)))
    }
}

/// Pick the timer source for this platform.
///
/// Only file-backed timers are available; without one the platform is
/// reported as unsupported.
pub fn open_timer(path: Option<&Path>) -> Result<FileTimer> {
    match path {
        Some(path) => FileTimer::new(path),
        None => Err(Error::UnsupportedPlatform {
            os: std::env::consts::OS.to_string(),
        }),
    }
}

/// Turns idle-timer samples into hint credits
#[derive(Debug)]
pub struct MilestoneTracker<S> {
    source: S,
    milestone: i64,
    next_milestone: i64,
    milestone_count: u32,
    last_value: Option<i64>,
    /// The timer has not been seen at zero yet, so it may have been running
    /// before we attached. Milestones crossed meanwhile earn nothing.
    at_start: bool,
}

impl<S: TimerSource> MilestoneTracker<S> {
    /// `milestone` is clamped to at least one second
    pub fn new(source: S, milestone: i64) -> Self {
        let milestone = milestone.max(1);
        Self {
            source,
            milestone,
            next_milestone: milestone,
            milestone_count: 0,
            last_value: None,
            at_start: true,
        }
    }

    pub fn milestone_count(&self) -> u32 {
        self.milestone_count
    }

    /// Sample the timer once, returning the credits earned by this sample
    pub fn poll(&mut self) -> Result<u32> {
        let seconds = self.source.read_seconds()?;
        Ok(self.observe(seconds.round() as i64))
    }

    fn observe(&mut self, current: i64) -> u32 {
        if current == 0 && self.at_start {
            debug!("idle timer at zero, milestones now earn hints");
            self.at_start = false;
        }

        // The player acted; the next sample starts a fresh idle run
        if self.last_value.is_some_and(|last| current < last) {
            self.next_milestone = self.milestone;
            self.last_value = None;
            return 0;
        }
        self.last_value = Some(current);

        if current <= self.next_milestone {
            return 0;
        }

        self.milestone_count += 1;
        self.next_milestone += self.milestone;
        if self.at_start {
            return 0;
        }
        info!("idle milestone {} reached, hint credit earned", self.milestone_count);
        1
    }
}
