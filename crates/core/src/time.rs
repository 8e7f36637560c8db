use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Wall-clock source for the progression rules.
///
/// Streaks are computed on UTC calendar days, so everything that needs
/// "today" asks the clock instead of calling `Utc::now()` directly.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns a clock fixed at noon UTC on the given day.
    #[must_use]
    pub fn fixed_on(day: NaiveDate) -> Self {
        let noon = day
            .and_hms_opt(12, 0, 0)
            .map_or_else(fixed_now, |dt| dt.and_utc());
        Self::Fixed(noon)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// The current UTC calendar day.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// The UTC calendar day before `today()`, if representable.
    #[must_use]
    pub fn yesterday(&self) -> Option<NaiveDate> {
        self.today().pred_opt()
    }

    /// Move a fixed clock forward by whole days. The system clock ignores it.
    pub fn advance_days(&mut self, days: i64) {
        if let Clock::Fixed(at) = self {
            *at += Duration::days(days);
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// 2023-11-14T22:13:20Z, the instant behind `fixed_clock()`.
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// The `FIXED_TEST_TIMESTAMP` instant.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Clock pinned to `fixed_now()`; tests use it to get stable dates.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
