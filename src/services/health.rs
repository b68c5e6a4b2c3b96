//! Uptime-based liveness probe.
//!
//! The process asks to be restarted once it has been up longer than the
//! configured threshold.
use chrono::{DateTime, Utc};

pub const DEFAULT_RESTART_AFTER_MS: i64 = 3_600_000;

/// Wall-clock instant the process started. Captured once in `app::run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStart(DateTime<Utc>);

impl ProcessStart {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn at(started_at: DateTime<Utc>) -> Self {
        Self(started_at)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Ok { elapsed_ms: i64 },
    Restart,
}

#[derive(Debug, Clone, Copy)]
pub struct HealthProbe {
    started_at: DateTime<Utc>,
    restart_after_ms: i64,
}

impl HealthProbe {
    pub fn new(start: &ProcessStart, restart_after_ms: i64) -> Self {
        Self {
            started_at: start.timestamp(),
            restart_after_ms,
        }
    }

    pub fn check(&self, now: DateTime<Utc>) -> HealthStatus {
        let elapsed_ms = (now - self.started_at).num_milliseconds();

        if elapsed_ms > self.restart_after_ms {
            HealthStatus::Restart
        } else {
            HealthStatus::Ok { elapsed_ms }
        }
    }
}
