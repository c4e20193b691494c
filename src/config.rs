//! Controller configuration and fixed hardware layout.

/// Number of physical RGB output groups.
pub const CHANNEL_COUNT: usize = 2;

/// Color components per channel (red, green, blue).
pub const COMPONENT_COUNT: usize = 3;

/// Number of schedule slots.
pub const TIMER_COUNT: usize = 8;

/// Schedule slots bound to each channel.
pub const TIMERS_PER_CHANNEL: usize = TIMER_COUNT / CHANNEL_COUNT;

/// Byte length of a color command.
pub const COLOR_COMMAND_LEN: usize = 11 + COMPONENT_COUNT * CHANNEL_COUNT;

/// Byte length of a timer command.
pub const TIMER_COMMAND_LEN: usize = 16;

/// Seconds from midnight to 11:59:59, the fixed noon zero-point.
pub const NOON_SECONDS: u32 = 43_199;

/// Bias subtracted from a transmitted zero-point offset to make it signed.
pub const OFFSET_BIAS: i32 = 43_199;

/// Largest persisted record, prefix included.
pub const RECORD_CAPACITY: usize = 192;

/// Firmware version stamped into every persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl FirmwareVersion {
    #[inline]
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl core::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Radio antenna selection, persisted alongside the lighting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AntennaMode {
    /// Let the radio pick.
    #[default]
    Auto,

    /// Always use the on-board antenna.
    Internal,

    /// Always use the external connector.
    External,
}

impl AntennaMode {
    /// Decodes a stored antenna byte (already minus one). Unknown values fall
    /// back to `Auto`.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => AntennaMode::Internal,
            2 => AntennaMode::External,
            _ => AntennaMode::Auto,
        }
    }

    /// Value stored in the record, before the +1 encoding.
    pub fn as_raw(self) -> u8 {
        match self {
            AntennaMode::Auto => 0,
            AntennaMode::Internal => 1,
            AntennaMode::External => 2,
        }
    }
}

/// Boot-time settings for a [`LightsController`](crate::LightsController).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Version of the running firmware. Overrides whatever a stored record says.
    pub firmware: FirmwareVersion,

    /// Antenna mode used until a stored record is loaded.
    pub antenna_mode: AntennaMode,
}

impl ControllerConfig {
    pub const fn new(firmware: FirmwareVersion) -> Self {
        Self {
            firmware,
            antenna_mode: AntennaMode::Auto,
        }
    }
}
