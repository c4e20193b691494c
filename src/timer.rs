//! Timer table: eight daily schedule slots anchored to noon, sunrise or sunset.

use heapless::Vec;

use crate::codec::{TIMER_TAG, TimerCommand, encode_byte};
use crate::config::{NOON_SECONDS, TIMER_COMMAND_LEN, TIMER_COUNT, TIMERS_PER_CHANNEL};
use crate::time::{CalendarDate, TimeOfDay};
use crate::types::{INTENSITY_OFF, Intensity, TimerMode, ZeroPoint};

/// Raw bytes of a timer command, kept verbatim for persistence.
pub type RawTimerCommand = Vec<u8, TIMER_COMMAND_LEN>;

/// Trait for abstracting the astronomical calculation service.
///
/// Both methods return local `(hour, minute)` for a fixed location, or `None`
/// when the event does not happen on that date.
pub trait SunCalculator {
    fn sunrise(&self, date: CalendarDate) -> Option<(u8, u8)>;
    fn sunset(&self, date: CalendarDate) -> Option<(u8, u8)>;
}

/// Today's solar zero-points, in seconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SunTimes {
    pub sunrise_s: u32,
    pub sunset_s: u32,
}

impl SunTimes {
    /// Refreshes from `calculator`. An event the calculator cannot compute
    /// keeps its previous value.
    pub fn update<A: SunCalculator>(&mut self, calculator: &A, date: CalendarDate) {
        if let Some((hour, minute)) = calculator.sunrise(date) {
            self.sunrise_s = hour as u32 * 3600 + minute as u32 * 60;
        }
        if let Some((hour, minute)) = calculator.sunset(date) {
            self.sunset_s = hour as u32 * 3600 + minute as u32 * 60;
        }
    }

    /// Seconds since midnight of `zero_point`. A disabled timer resolves to 0.
    pub fn seconds_of(&self, zero_point: ZeroPoint) -> u32 {
        match zero_point {
            ZeroPoint::Off => 0,
            ZeroPoint::Noon => NOON_SECONDS,
            ZeroPoint::Sunrise => self.sunrise_s,
            ZeroPoint::Sunset => self.sunset_s,
        }
    }
}

/// Placeholder stored for an unconfigured timer slot.
///
/// Shorter than any timer command, so it never decodes.
pub fn unconfigured_marker(index: usize) -> [u8; 3] {
    [encode_byte(TIMER_TAG), encode_byte(index as u8), b'3']
}

/// One schedule slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    pub enabled: bool,
    /// Set when the timer fires, cleared at the start of each day.
    pub has_elapsed: bool,
    pub zero_point: ZeroPoint,
    pub zero_point_offset: i32,
    pub resolved_zero_point: u32,
    pub duration_ms: u32,
    pub mode: TimerMode,
    pub trigger: TimeOfDay,
    pub color: Intensity,
    raw: RawTimerCommand,
}

impl Timer {
    /// A disabled slot holding the unconfigured marker.
    pub fn unconfigured(index: usize) -> Self {
        let mut raw = RawTimerCommand::new();
        raw.extend(unconfigured_marker(index));
        Self {
            enabled: false,
            has_elapsed: false,
            zero_point: ZeroPoint::Off,
            zero_point_offset: 0,
            resolved_zero_point: 0,
            duration_ms: 0,
            mode: TimerMode::TurnOff,
            trigger: TimeOfDay::MIDNIGHT,
            color: INTENSITY_OFF,
            raw,
        }
    }

    fn configure(&mut self, command: &TimerCommand, raw: &[u8], sun: &SunTimes) {
        self.enabled = command.zero_point != ZeroPoint::Off;
        self.has_elapsed = false;
        self.zero_point = command.zero_point;
        self.zero_point_offset = command.offset_s;
        self.duration_ms = command.duration_ms;
        self.mode = command.mode;
        self.color = command.color;
        self.raw.clear();
        self.raw.extend(raw.iter().copied().take(TIMER_COMMAND_LEN));
        self.resolve(sun);
    }

    /// Recomputes the trigger time from the current zero-points.
    pub fn resolve(&mut self, sun: &SunTimes) {
        self.resolved_zero_point = sun.seconds_of(self.zero_point);
        self.trigger = if self.enabled {
            TimeOfDay::from_seconds(self.resolved_zero_point as i64 + self.zero_point_offset as i64)
        } else {
            TimeOfDay::MIDNIGHT
        };
    }

    /// True if the timer should fire at `now`.
    pub fn is_due(&self, now: TimeOfDay) -> bool {
        self.enabled && !self.has_elapsed && self.trigger == now
    }

    /// The command bytes this slot was configured from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

/// The eight schedule slots.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerTable {
    timers: [Timer; TIMER_COUNT],
}

impl TimerTable {
    /// Eight unconfigured slots.
    pub fn new() -> Self {
        Self {
            timers: core::array::from_fn(Timer::unconfigured),
        }
    }

    /// Channel driven by timer `index`.
    #[inline]
    pub const fn channel_for(index: usize) -> usize {
        index / TIMERS_PER_CHANNEL
    }

    /// Configures the slot named by `command`. `raw` is stored verbatim.
    pub fn apply(&mut self, command: &TimerCommand, raw: &[u8], sun: &SunTimes) {
        if let Some(timer) = self.timers.get_mut(command.index as usize) {
            timer.configure(command, raw, sun);
        }
    }

    /// Returns slot `index` to the unconfigured state.
    pub fn reset(&mut self, index: usize) -> bool {
        match self.timers.get_mut(index) {
            Some(timer) => {
                *timer = Timer::unconfigured(index);
                true
            }
            None => false,
        }
    }

    /// Re-resolves every trigger, e.g. after the sun times changed.
    pub fn resolve_all(&mut self, sun: &SunTimes) {
        for timer in self.timers.iter_mut() {
            timer.resolve(sun);
        }
    }

    /// Allows every timer to fire again.
    pub fn clear_elapsed(&mut self) {
        for timer in self.timers.iter_mut() {
            timer.has_elapsed = false;
        }
    }

    /// Slot `index`, or `None` past the last slot.
    pub fn get(&self, index: usize) -> Option<&Timer> {
        self.timers.get(index)
    }

    /// Slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Timer> {
        self.timers.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Timer> {
        self.timers.iter_mut()
    }
}

impl Default for TimerTable {
    fn default() -> Self {
        Self::new()
    }
}
