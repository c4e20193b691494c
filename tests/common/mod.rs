//! Shared test infrastructure for lights-core integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::Cell;

use lights_core::codec::encode_byte;
use lights_core::config::RECORD_CAPACITY;
use lights_core::{
    CalendarDate, ChangeNotifier, ChannelCommand, Clock, ColorCommand, Component, ControllerConfig,
    FirmwareVersion, Intensity, LightsController, NvStore, PwmSink, SunCalculator, TimeOfDay,
    TimerCommand, TimerMode, ZeroPoint,
};

// ============================================================================
// Mock Clock
// ============================================================================

/// Mock wall clock with controllable time advancement
pub struct MockClock {
    millis: Cell<u64>,
    time_of_day: Cell<TimeOfDay>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            millis: Cell::new(0),
            time_of_day: Cell::new(TimeOfDay::MIDNIGHT),
        }
    }

    /// Advance the monotonic counter by `ms`
    pub fn advance(&self, ms: u64) {
        self.millis.set(self.millis.get() + ms);
    }

    pub fn set_time_of_day(&self, time: TimeOfDay) {
        self.time_of_day.set(time);
    }
}

impl Clock for MockClock {
    fn millis(&self) -> u64 {
        self.millis.get()
    }

    fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day.get()
    }
}

// ============================================================================
// Mock PWM
// ============================================================================

/// Mock PWM stage that records the last duty cycle per output
#[derive(Default)]
pub struct MockPwm {
    pub outputs: [[u16; 3]; 2],
    pub writes: usize,
}

impl MockPwm {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PwmSink for MockPwm {
    fn write(&mut self, channel: usize, component: Component, intensity: u16) {
        self.outputs[channel][component.index()] = intensity;
        self.writes += 1;
    }
}

// ============================================================================
// Mock Store
// ============================================================================

/// Array-backed EEPROM, erased to 0xFF
#[derive(Clone)]
pub struct MockStore {
    pub bytes: [u8; 256],
    pub writes: usize,
}

impl MockStore {
    pub fn erased() -> Self {
        Self {
            bytes: [0xFF; 256],
            writes: 0,
        }
    }

    /// Same contents, write counter cleared
    pub fn reopened(&self) -> Self {
        Self {
            bytes: self.bytes,
            writes: 0,
        }
    }
}

impl NvStore for MockStore {
    fn read(&self, address: usize) -> u8 {
        self.bytes[address]
    }

    fn write(&mut self, address: usize, value: u8) {
        self.bytes[address] = value;
        self.writes += 1;
    }
}

// ============================================================================
// Mock Sun Calculator
// ============================================================================

pub struct MockSun {
    pub sunrise: Option<(u8, u8)>,
    pub sunset: Option<(u8, u8)>,
}

impl MockSun {
    pub fn new() -> Self {
        Self {
            sunrise: Some((6, 30)),
            sunset: Some((20, 15)),
        }
    }
}

impl SunCalculator for MockSun {
    fn sunrise(&self, _date: CalendarDate) -> Option<(u8, u8)> {
        self.sunrise
    }

    fn sunset(&self, _date: CalendarDate) -> Option<(u8, u8)> {
        self.sunset
    }
}

// ============================================================================
// Mock Notifier
// ============================================================================

/// Counts publications and keeps the latest payload
#[derive(Default)]
pub struct MockNotifier {
    pub count: usize,
    pub last: heapless::Vec<u8, RECORD_CAPACITY>,
}

impl ChangeNotifier for MockNotifier {
    fn publish(&mut self, record: &[u8]) {
        self.count += 1;
        self.last.clear();
        let _ = self.last.extend_from_slice(record);
    }
}

// ============================================================================
// Controller helpers
// ============================================================================

pub type TestController<'c> =
    LightsController<'c, MockClock, MockPwm, MockStore, MockSun, MockNotifier>;

pub const FIRMWARE: FirmwareVersion = FirmwareVersion::new(1, 2, 3);

pub const TODAY: CalendarDate = CalendarDate::new(2026, 6, 21);

pub fn controller_with_store(clock: &MockClock, store: MockStore) -> TestController<'_> {
    LightsController::new(
        clock,
        MockPwm::new(),
        store,
        MockSun::new(),
        MockNotifier::default(),
        ControllerConfig::new(FIRMWARE),
    )
}

/// Controller booted from an erased store
pub fn booted_controller(clock: &MockClock) -> TestController<'_> {
    let mut controller = controller_with_store(clock, MockStore::erased());
    controller.boot(TODAY);
    controller
}

// ============================================================================
// Command builders
// ============================================================================

pub const WARM: Intensity = Intensity::new(65535, 32768, 4096);

pub const COOL: Intensity = Intensity::new(8192, 40000, 65535);

pub fn color_frame(on: [bool; 2], colors: [Intensity; 2], duration_ms: u32) -> [u8; 17] {
    ColorCommand {
        channels: [
            ChannelCommand {
                on: on[0],
                color: colors[0],
            },
            ChannelCommand {
                on: on[1],
                color: colors[1],
            },
        ],
        duration_ms,
    }
    .encode()
}

pub fn timer_frame(
    index: u8,
    zero_point: ZeroPoint,
    offset_s: i32,
    mode: TimerMode,
    color: Intensity,
) -> [u8; 16] {
    TimerCommand {
        index,
        zero_point,
        offset_s,
        duration_ms: 2000,
        mode,
        color,
    }
    .encode()
}

/// Encodes a raw protocol value
pub fn enc(value: u8) -> u8 {
    encode_byte(value)
}

/// Compare two intensities with a per-component tolerance
pub fn intensities_close(a: Intensity, b: Intensity, tolerance: u16) -> bool {
    a.red.abs_diff(b.red) <= tolerance
        && a.green.abs_diff(b.green) <= tolerance
        && a.blue.abs_diff(b.blue) <= tolerance
}
