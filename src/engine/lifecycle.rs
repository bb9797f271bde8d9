//! Connection lifecycle: backoff-gated reopen and speed-change reconnects.
//!
//! The open/closed state itself is never stored here. It is always read
//! back from [`Transport::is_open`], so the controller cannot drift from the
//! driver.

use crate::port::Transport;
use tracing::{debug, info};

/// Minimum time between two open attempts.
pub const DEFAULT_BACKOFF_MS: u64 = 1000;

/// Result of the once-per-cycle maintenance step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Maintenance {
    /// The transport is open; reading may proceed.
    Open,
    /// The transport is closed (never opened, backoff pending, or open
    /// failed).
    Closed,
    /// The desired speed changed while open; the transport was closed and
    /// the cycle must end without reading.
    SpeedReset,
}

#[derive(Debug, Clone)]
pub struct Lifecycle {
    desired_speed: u32,
    last_speed: u32,
    backoff_ms: u64,
    last_open_attempt: Option<u64>,
}

impl Lifecycle {
    pub fn new(speed: u32, backoff_ms: u64) -> Self {
        Self {
            desired_speed: speed,
            last_speed: speed,
            backoff_ms,
            last_open_attempt: None,
        }
    }

    pub fn desired_speed(&self) -> u32 {
        self.desired_speed
    }

    pub fn last_speed(&self) -> u32 {
        self.last_speed
    }

    pub fn last_open_attempt(&self) -> Option<u64> {
        self.last_open_attempt
    }

    /// Record a new desired speed. Applied on the next maintenance step.
    pub fn set_speed(&mut self, speed: u32) {
        self.desired_speed = speed;
    }

    pub fn speed_change_pending(&self) -> bool {
        self.desired_speed != self.last_speed
    }

    /// Whether enough time has passed since the last attempt. The first
    /// attempt is never held back.
    pub fn backoff_elapsed(&self, now_ms: u64) -> bool {
        match self.last_open_attempt {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.backoff_ms,
        }
    }

    /// Issue an open at the desired speed, recording the attempt.
    pub fn open<T: Transport>(&mut self, transport: &mut T, now_ms: u64, name: &str) -> bool {
        self.last_speed = self.desired_speed;
        self.last_open_attempt = Some(now_ms);

        if let Err(e) = transport.open(self.last_speed) {
            debug!(port = %name, speed = self.last_speed, error = %e, "Open attempt failed");
        }

        let open = transport.is_open();
        if open {
            debug!(port = %name, speed = self.last_speed, "Port opened");
        }
        open
    }

    /// Run the start-of-cycle checks: forced close on a pending speed change,
    /// then a reopen if closed and backoff allows.
    pub fn maintain<T: Transport>(&mut self, transport: &mut T, now_ms: u64, name: &str) -> Maintenance {
        if self.speed_change_pending() && transport.is_open() {
            info!(
                port = %name,
                new_speed = self.desired_speed,
                old_speed = self.last_speed,
                "Resetting speed"
            );
            transport.close();
            self.last_speed = self.desired_speed;
            return Maintenance::SpeedReset;
        }

        if !transport.is_open() && self.backoff_elapsed(now_ms) {
            self.open(transport, now_ms, name);
        }

        if transport.is_open() {
            Maintenance::Open
        } else {
            Maintenance::Closed
        }
    }
}
