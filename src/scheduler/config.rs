// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scheduler configuration.

use std::time::Duration;

// ============================================================================
// BackoffPolicy
// ============================================================================

/// Exponential backoff applied to scheduled polls after transport failures.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ecowitt_iot::scheduler::BackoffPolicy;
///
/// let policy = BackoffPolicy::new()
///     .with_initial_delay(Duration::from_secs(30))
///     .with_max_delay(Duration::from_secs(300));
///
/// assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(30));
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(60));
/// assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(300));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Upper bound for any delay.
    pub max_delay: Duration,
    /// Factor applied per additional consecutive failure.
    pub multiplier: f64,
}

impl BackoffPolicy {
    /// Default upper bound.
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(300);

    /// Creates a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay after the first failure.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the upper bound.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier. Values below 1 are treated as 1.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Calculates the delay after `attempt` additional consecutive failures.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay.min(self.max_delay);
        }

        let factor = self
            .multiplier
            .max(1.0)
            .powi(i32::try_from(attempt).unwrap_or(i32::MAX));
        let secs = self.initial_delay.as_secs_f64() * factor;

        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: SchedulerConfig::DEFAULT_POLL_INTERVAL,
            max_delay: Self::DEFAULT_MAX_DELAY,
            multiplier: 2.0,
        }
    }
}

// ============================================================================
// SchedulerConfig
// ============================================================================

/// Configuration of a [`PollScheduler`](super::PollScheduler).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ecowitt_iot::scheduler::SchedulerConfig;
///
/// let config = SchedulerConfig::new()
///     .with_poll_interval(Duration::from_secs(10))
///     .with_activation_window(Duration::from_secs(5));
///
/// // Without an explicit policy, backoff starts from the poll interval.
/// assert_eq!(config.backoff().initial_delay, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    poll_interval: Duration,
    poll_timeout: Duration,
    activation_window: Duration,
    discovery_loss_threshold: u32,
    unavailable_after: u32,
    command_refresh_delay: Duration,
    backoff: Option<BackoffPolicy>,
}

impl SchedulerConfig {
    /// Default interval between scheduled polls.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
    /// Shortest accepted poll interval.
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
    /// Default deadline for one complete poll.
    pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default activation window.
    pub const DEFAULT_ACTIVATION_WINDOW: Duration = Duration::from_secs(10);
    /// Default number of missed polls before a peripheral is removed.
    pub const DEFAULT_DISCOVERY_LOSS_THRESHOLD: u32 = 3;
    /// Default number of unreachable polls before the gateway is unavailable.
    pub const DEFAULT_UNAVAILABLE_AFTER: u32 = 3;
    /// Default delay between an acknowledged command and its refresh poll.
    pub const DEFAULT_COMMAND_REFRESH_DELAY: Duration = Duration::from_secs(1);

    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the interval between scheduled polls.
    ///
    /// Values below [`MIN_POLL_INTERVAL`](Self::MIN_POLL_INTERVAL) are raised to it.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Self::MIN_POLL_INTERVAL);
        self
    }

    /// Sets the deadline for one complete poll, device list and every status
    /// read included.
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Sets how long contradicting reports are suppressed after a command.
    #[must_use]
    pub fn with_activation_window(mut self, window: Duration) -> Self {
        self.activation_window = window;
        self
    }

    /// Sets how many consecutive polls a peripheral may be missing before removal.
    #[must_use]
    pub fn with_discovery_loss_threshold(mut self, polls: u32) -> Self {
        self.discovery_loss_threshold = polls.max(1);
        self
    }

    /// Sets how many consecutive unreachable polls mark the gateway unavailable.
    #[must_use]
    pub fn with_unavailable_after(mut self, polls: u32) -> Self {
        self.unavailable_after = polls.max(1);
        self
    }

    /// Sets the delay before the poll that follows an acknowledged command.
    #[must_use]
    pub fn with_command_refresh_delay(mut self, delay: Duration) -> Self {
        self.command_refresh_delay = delay;
        self
    }

    /// Sets an explicit backoff policy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Returns the poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the poll deadline.
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Returns the activation window.
    #[must_use]
    pub fn activation_window(&self) -> Duration {
        self.activation_window
    }

    /// Returns the discovery-loss threshold.
    #[must_use]
    pub fn discovery_loss_threshold(&self) -> u32 {
        self.discovery_loss_threshold
    }

    /// Returns the unreachable-poll threshold.
    #[must_use]
    pub fn unavailable_after(&self) -> u32 {
        self.unavailable_after
    }

    /// Returns the command refresh delay.
    #[must_use]
    pub fn command_refresh_delay(&self) -> Duration {
        self.command_refresh_delay
    }

    /// Returns the backoff policy, seeded with the poll interval unless set explicitly.
    #[must_use]
    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff.clone().unwrap_or_else(|| {
            BackoffPolicy::default().with_initial_delay(self.poll_interval)
        })
    }

    /// Returns the delay before the next scheduled poll.
    #[must_use]
    pub fn delay_after_failures(&self, consecutive_failures: u32) -> Duration {
        match consecutive_failures {
            0 => self.poll_interval,
            n => self.backoff().delay_for_attempt(n - 1),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            poll_timeout: Self::DEFAULT_POLL_TIMEOUT,
            activation_window: Self::DEFAULT_ACTIVATION_WINDOW,
            discovery_loss_threshold: Self::DEFAULT_DISCOVERY_LOSS_THRESHOLD,
            unavailable_after: Self::DEFAULT_UNAVAILABLE_AFTER,
            command_refresh_delay: Self::DEFAULT_COMMAND_REFRESH_DELAY,
            backoff: None,
        }
    }
}
