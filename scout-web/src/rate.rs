//! Process-wide admission control shared by the search and fetch tools.
//!
//! Two fixed windows are tracked independently:
//! - a one-second window capped at `per_second` calls;
//! - a long window capped at `per_month` calls, which starts over whenever the
//!   UTC calendar day (or month, see [`LongWindow`]) rolls past the window start.
//!
//! A rejected call never increments either counter. The read-check-increment
//! sequence runs under one mutex, so concurrent callers cannot both be admitted
//! into the last free slot.

use chrono::{DateTime, Datelike, TimeDelta, Utc};
use scout_common::{Result, ScoutError};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

const SECOND_WINDOW_MS: i64 = 1000;

/// Source of the current time; injected so tests can drive the windows.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Calendar boundary at which the long-window counter resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LongWindow {
    #[default]
    Day,
    Month,
}

impl LongWindow {
    /// Start (UTC midnight) of the calendar period containing `at`.
    fn period_start(self, at: DateTime<Utc>) -> DateTime<Utc> {
        let date = at.date_naive();
        let first = match self {
            LongWindow::Day => Some(date),
            LongWindow::Month => date.with_day(1),
        };
        first
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc())
            .unwrap_or(at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub per_second: u32,
    pub per_month: u32,
    pub long_window: LongWindow,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            per_second: 1,
            per_month: 15_000,
            long_window: LongWindow::Day,
        }
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateUsage {
    pub second: u32,
    pub month: u32,
}

#[derive(Debug)]
struct RateState {
    second_count: u32,
    month_count: u32,
    second_window_start: DateTime<Utc>,
    month_window_start: DateTime<Utc>,
}

/// Dual-window rate governor. Construct one per process and share it by `Arc`.
pub struct RateGovernor {
    limits: RateLimits,
    clock: Arc<dyn Clock>,
    state: Mutex<RateState>,
}

impl RateGovernor {
    pub fn new(limits: RateLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    pub fn with_clock(limits: RateLimits, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            limits,
            clock,
            state: Mutex::new(RateState {
                second_count: 0,
                month_count: 0,
                second_window_start: now,
                month_window_start: now,
            }),
        }
    }

    pub fn limits(&self) -> RateLimits {
        self.limits
    }

    /// Admit one call or fail with [`ScoutError::RateLimitExceeded`].
    pub fn admit(&self) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if now - state.second_window_start >= TimeDelta::milliseconds(SECOND_WINDOW_MS) {
            state.second_count = 0;
            state.second_window_start = now;
        }
        if self.limits.long_window.period_start(now) > state.month_window_start {
            debug!(target: "rate", previous = state.month_count, "long window rolled over");
            state.month_count = 0;
            state.month_window_start = now;
        }

        if state.second_count >= self.limits.per_second
            || state.month_count >= self.limits.per_month
        {
            warn!(
                target: "rate",
                second = state.second_count,
                month = state.month_count,
                per_second = self.limits.per_second,
                per_month = self.limits.per_month,
                "call rejected"
            );
            return Err(ScoutError::RateLimitExceeded {
                per_second: self.limits.per_second,
                per_month: self.limits.per_month,
            });
        }

        state.second_count += 1;
        state.month_count += 1;
        debug!(target: "rate", second = state.second_count, month = state.month_count, "call admitted");
        Ok(())
    }

    /// Counters as of the last call; windows are only rolled over by [`Self::admit`].
    pub fn usage(&self) -> RateUsage {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        RateUsage {
            second: state.second_count,
            month: state.month_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn starting_at(at: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(at)))
        }

        fn advance_ms(&self, ms: i64) {
            let mut now = self.0.lock().unwrap();
            *now += TimeDelta::milliseconds(ms);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn limits(per_second: u32, per_month: u32, long_window: LongWindow) -> RateLimits {
        RateLimits {
            per_second,
            per_month,
            long_window,
        }
    }

    fn midday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn burst_within_900ms_rejects_only_the_last_call() {
        let clock = ManualClock::starting_at(midday());
        let governor = RateGovernor::with_clock(limits(3, 100, LongWindow::Day), clock.clone());

        let mut outcomes = Vec::new();
        for _ in 0..4 {
            outcomes.push(governor.admit().is_ok());
            clock.advance_ms(300);
        }
        assert_eq!(outcomes, vec![true, true, true, false]);
    }

    #[test]
    fn calls_spaced_a_second_apart_never_hit_the_second_cap() {
        let clock = ManualClock::starting_at(midday());
        let governor = RateGovernor::with_clock(limits(1, 1_000, LongWindow::Day), clock.clone());

        for _ in 0..50 {
            assert!(governor.admit().is_ok());
            clock.advance_ms(1000);
        }
    }

    #[test]
    fn rejected_calls_do_not_increment_counters() {
        let clock = ManualClock::starting_at(midday());
        let governor = RateGovernor::with_clock(limits(1, 100, LongWindow::Day), clock.clone());

        assert!(governor.admit().is_ok());
        assert!(governor.admit().is_err());
        assert!(governor.admit().is_err());
        assert_eq!(governor.usage(), RateUsage { second: 1, month: 1 });

        clock.advance_ms(1000);
        assert!(governor.admit().is_ok());
        assert_eq!(governor.usage(), RateUsage { second: 1, month: 2 });
    }

    #[test]
    fn rejection_reports_configured_caps() {
        let clock = ManualClock::starting_at(midday());
        let governor = RateGovernor::with_clock(limits(1, 15_000, LongWindow::Day), clock);

        governor.admit().unwrap();
        let err = governor.admit().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Rate limit exceeded (limits: 1/second, 15000/month)"
        );
    }

    #[test]
    fn long_window_cap_resets_at_utc_midnight() {
        let start = Utc.with_ymd_and_hms(2025, 3, 14, 23, 59, 57).unwrap();
        let clock = ManualClock::starting_at(start);
        let governor = RateGovernor::with_clock(limits(10, 2, LongWindow::Day), clock.clone());

        assert!(governor.admit().is_ok());
        assert!(governor.admit().is_ok());
        assert!(governor.admit().is_err());

        clock.advance_ms(3_000);
        assert!(governor.admit().is_ok());
        assert_eq!(governor.usage().month, 1);
    }

    #[test]
    fn month_window_survives_day_boundaries() {
        let start = Utc.with_ymd_and_hms(2025, 3, 14, 23, 59, 59).unwrap();
        let clock = ManualClock::starting_at(start);
        let governor = RateGovernor::with_clock(limits(10, 1, LongWindow::Month), clock.clone());

        assert!(governor.admit().is_ok());
        clock.advance_ms(2_000);
        assert!(governor.admit().is_err());

        // 2025-04-01T00:00:01Z
        clock.advance_ms(17 * 24 * 60 * 60 * 1000);
        assert!(governor.admit().is_ok());
    }

    #[test]
    fn concurrent_callers_share_one_slot() {
        let clock = ManualClock::starting_at(midday());
        let governor = Arc::new(RateGovernor::with_clock(
            limits(1, 100, LongWindow::Day),
            clock,
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let governor = Arc::clone(&governor);
                std::thread::spawn(move || governor.admit().is_ok())
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(admitted, 1);
    }
}
