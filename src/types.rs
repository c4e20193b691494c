//! Core value types shared by the codec, channel model and timer table.

use palette::Srgb;

/// A 16-bit red/green/blue intensity triple.
pub type Intensity = Srgb<u16>;

/// All components dark.
pub const INTENSITY_OFF: Intensity = Srgb::new(0, 0, 0);

/// Splits an intensity into `[red, green, blue]`.
#[inline]
pub fn components(color: Intensity) -> [u16; 3] {
    [color.red, color.green, color.blue]
}

/// Builds an intensity from `[red, green, blue]`.
#[inline]
pub fn from_components(c: [u16; 3]) -> Intensity {
    Srgb::new(c[0], c[1], c[2])
}

/// One color component of a channel's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Component {
    Red,
    Green,
    Blue,
}

impl Component {
    /// All components in wire order.
    pub const ALL: [Component; 3] = [Component::Red, Component::Green, Component::Blue];

    /// Position in [`Component::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Reference time a timer's offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ZeroPoint {
    /// Timer disabled.
    #[default]
    Off,

    /// 11:59:59.
    Noon,

    /// Today's sunrise.
    Sunrise,

    /// Today's sunset.
    Sunset,
}

impl ZeroPoint {
    /// Decodes a selector byte (already minus one). `None` above 3.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(ZeroPoint::Off),
            1 => Some(ZeroPoint::Noon),
            2 => Some(ZeroPoint::Sunrise),
            3 => Some(ZeroPoint::Sunset),
            _ => None,
        }
    }

    /// Selector value before the +1 wire encoding.
    pub fn as_raw(self) -> u8 {
        match self {
            ZeroPoint::Off => 0,
            ZeroPoint::Noon => 1,
            ZeroPoint::Sunrise => 2,
            ZeroPoint::Sunset => 3,
        }
    }
}

/// What a timer does to its channel when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerMode {
    /// Fade the channel to black, remembering its color.
    #[default]
    TurnOff,

    /// Fade back to the color remembered at the last turn-off.
    Restore,

    /// Fade to the color stored in the timer.
    SetColor,
}

impl TimerMode {
    /// Decodes a mode byte (already minus one). `None` above 2.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(TimerMode::TurnOff),
            1 => Some(TimerMode::Restore),
            2 => Some(TimerMode::SetColor),
            _ => None,
        }
    }

    /// Mode value before the +1 wire encoding.
    pub fn as_raw(self) -> u8 {
        match self {
            TimerMode::TurnOff => 0,
            TimerMode::Restore => 1,
            TimerMode::SetColor => 2,
        }
    }
}

/// Reasons a command is rejected.
///
/// A rejected command never mutates controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// The command is not the fixed length its kind requires.
    WrongLength { expected: usize, actual: usize },

    /// Timer index is not below the number of timer slots.
    TimerIndexOutOfRange(u8),

    /// Zero-point selector above 3.
    ZeroPointOutOfRange(u8),

    /// Timer mode above 2.
    ModeOutOfRange(u8),

    /// Leading tag byte names no known command.
    UnknownTag(u8),

    /// Empty input.
    Empty,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodeError::WrongLength { expected, actual } => {
                write!(f, "expected {} command bytes, got {}", expected, actual)
            }
            DecodeError::TimerIndexOutOfRange(index) => {
                write!(f, "timer index {} out of range", index)
            }
            DecodeError::ZeroPointOutOfRange(raw) => {
                write!(f, "zero-point selector {} out of range", raw)
            }
            DecodeError::ModeOutOfRange(raw) => {
                write!(f, "timer mode {} out of range", raw)
            }
            DecodeError::UnknownTag(tag) => {
                write!(f, "unknown command tag {}", tag)
            }
            DecodeError::Empty => write!(f, "empty command"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}
