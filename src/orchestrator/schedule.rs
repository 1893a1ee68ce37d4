//! Progressive poll delays.

use std::time::Duration;

/// Delay between status polls: fast at first, slower the longer a run takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub fast_interval: Duration,
    /// Polls `1..=fast_attempts` wait `fast_interval` afterwards.
    pub fast_attempts: u32,
    pub medium_interval: Duration,
    /// Polls up to and including `medium_attempts` wait `medium_interval`.
    pub medium_attempts: u32,
    pub slow_interval: Duration,
    /// Polls before giving up.
    pub max_attempts: u32,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            fast_interval: Duration::from_secs(1),
            fast_attempts: 10,
            medium_interval: Duration::from_secs(2),
            medium_attempts: 20,
            slow_interval: Duration::from_secs(3),
            max_attempts: 60,
        }
    }
}

impl PollSchedule {
    /// Delay to wait after the given 1-based poll before the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if attempt <= self.fast_attempts {
            self.fast_interval
        } else if attempt <= self.medium_attempts {
            self.medium_interval
        } else {
            self.slow_interval
        }
    }

    /// Total time spent sleeping if a run needs `polls` polls to finish.
    pub fn total_wait(&self, polls: u32) -> Duration {
        (1..polls).map(|attempt| self.delay_after(attempt)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bands() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.delay_after(1), Duration::from_secs(1));
        assert_eq!(schedule.delay_after(10), Duration::from_secs(1));
        assert_eq!(schedule.delay_after(11), Duration::from_secs(2));
        assert_eq!(schedule.delay_after(20), Duration::from_secs(2));
        assert_eq!(schedule.delay_after(21), Duration::from_secs(3));
        assert_eq!(schedule.delay_after(60), Duration::from_secs(3));
    }

    #[test]
    fn test_total_wait() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.total_wait(1), Duration::ZERO);
        // 12 delays: ten fast, two medium.
        assert_eq!(schedule.total_wait(13), Duration::from_secs(14));
        // Full budget: 10*1 + 10*2 + 39*3.
        assert_eq!(schedule.total_wait(60), Duration::from_secs(147));
    }
}
