//! # Resolver runtime configuration.
//!
//! Provides [`ResolverConfig`], the centralized settings for the executor.
//!
//! The two resolution constants (`poll_tick`, `max_attempts`) carry no deeper
//! rationale than "what has always worked"; they are exposed so hosts can tune
//! them instead of hard-coding.
//!
//! ## Sentinel values
//! - `max_attempts = 0` → clamped to 1 (every submission runs at least once)
//! - `bus_capacity = 0`, `mailbox_capacity = 0` → clamped to 1

use std::time::Duration;

/// Default fast-path wait before an observer is attached.
pub const DEFAULT_POLL_TICK: Duration = Duration::from_millis(20);

/// Default number of attempts per submitted resolution.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Global configuration for the resolver runtime.
///
/// ## Field semantics
/// - `poll_tick`: fast-path wait for a script result before attaching an observer
/// - `max_attempts`: attempts per submission before giving up
/// - `bus_capacity`: event bus ring buffer size
/// - `mailbox_capacity`: executor message queue size on the message bus
/// - `grace`: how long [`Executor::shutdown`](crate::Executor::shutdown) waits
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Fast-path wait for the script's completion flag.
    ///
    /// Scripts that report within this window never get an observer attached.
    pub poll_tick: Duration,

    /// Maximum number of attempts for one submission.
    pub max_attempts: u32,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Capacity of the executor's mailbox on the message bus.
    pub mailbox_capacity: usize,

    /// Maximum time to wait for in-flight resolutions during shutdown.
    pub grace: Duration,
}

impl ResolverConfig {
    /// Returns the attempt cap, never below 1.
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a mailbox capacity clamped to a minimum of 1.
    #[inline]
    pub fn mailbox_capacity_clamped(&self) -> usize {
        self.mailbox_capacity.max(1)
    }
}

impl Default for ResolverConfig {
    /// Default configuration:
    ///
    /// - `poll_tick = 20ms`
    /// - `max_attempts = 4`
    /// - `bus_capacity = 1024`
    /// - `mailbox_capacity = 64`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            poll_tick: DEFAULT_POLL_TICK,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            bus_capacity: 1024,
            mailbox_capacity: 64,
            grace: Duration::from_secs(5),
        }
    }
}
