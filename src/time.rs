//! Wall-clock abstraction and time-of-day arithmetic.

/// Seconds in one calendar day.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Trait for abstracting the wall clock.
///
/// Implement this for your RTC or network-synchronised clock.
pub trait Clock {
    /// Monotonic milliseconds since an arbitrary epoch (typically boot).
    fn millis(&self) -> u64;

    /// Current local time of day.
    fn time_of_day(&self) -> TimeOfDay;
}

/// A time of day with one-second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    /// Midnight.
    pub const MIDNIGHT: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }

    /// Builds a time of day from seconds since midnight.
    ///
    /// Values outside a single day wrap around, so negative offsets land on
    /// the previous evening and large ones on the next morning.
    pub fn from_seconds(seconds: i64) -> Self {
        let seconds = seconds.rem_euclid(SECONDS_PER_DAY as i64) as u32;
        Self {
            hour: (seconds / 3600) as u8,
            minute: ((seconds % 3600) / 60) as u8,
            second: (seconds % 60) as u8,
        }
    }

    /// Seconds since midnight.
    #[inline]
    pub fn as_seconds(&self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60 + self.second as u32
    }
}

impl core::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// A calendar date, handed to the sun calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalendarDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl CalendarDate {
    #[inline]
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }
}
