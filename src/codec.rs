//! Command protocol codec.
//!
//! Every byte on the wire is its true value plus one, so a payload never
//! contains `0x00` (the transport treats payloads as text) or `0xFF` (reserved
//! as an out-of-band frame marker). Multi-byte integers are big-endian base-127:
//! each decoded digit stays in `0..=126`, which keeps its encoded form in
//! `1..=127`.
//!
//! Color components travel as two base-127 digits, a value in `0..=16128`,
//! and are rescaled to the full 16-bit PWM range.
//!
//! Everything here is pure: decoding produces values, the controller applies
//! them.

use crate::config::{CHANNEL_COUNT, COLOR_COMMAND_LEN, OFFSET_BIAS, TIMER_COMMAND_LEN, TIMER_COUNT};
use crate::types::{DecodeError, Intensity, TimerMode, ZeroPoint, components, from_components};

/// Radix of multi-byte integers.
pub const BASE: u32 = 127;

/// Largest two-digit base-127 value.
pub const MAX_COLOR_RAW: u32 = BASE * BASE - 1;

/// Tag byte (before encoding) of a color command.
pub const COLOR_TAG: u8 = b'c';

/// Tag byte (before encoding) of a timer command.
pub const TIMER_TAG: u8 = b't';

/// Transition durations travel in tenths of a second.
const DURATION_UNIT_MS: u32 = 100;

/// Encodes one protocol byte.
#[inline]
pub const fn encode_byte(value: u8) -> u8 {
    value.wrapping_add(1)
}

/// Decodes one protocol byte.
#[inline]
pub const fn decode_byte(byte: u8) -> u8 {
    byte.wrapping_sub(1)
}

/// Combines decoded base-127 digits, most significant first.
pub fn combine_bytes(digits: &[u8]) -> u32 {
    digits
        .iter()
        .fold(0u32, |acc, &digit| acc * BASE + digit as u32)
}

/// Splits `value` into `N` base-127 digits, most significant first.
///
/// Values that do not fit in `N` digits saturate to the largest representable
/// value.
pub fn split_bytes<const N: usize>(value: u32) -> [u8; N] {
    let base = BASE as u64;
    let max = base.pow(N as u32) - 1;
    let mut remaining = (value as u64).min(max);
    let mut digits = [0u8; N];

    for (i, digit) in digits.iter_mut().enumerate() {
        let place = base.pow((N - 1 - i) as u32);
        *digit = (remaining / place) as u8;
        remaining -= *digit as u64 * place;
    }

    digits
}

/// Decodes and combines a run of encoded base-127 bytes.
#[inline]
fn read_integer(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &byte| acc * BASE + decode_byte(byte) as u32)
}

/// Splits and encodes an integer into `out`.
#[inline]
fn write_integer<const N: usize>(out: &mut [u8], value: u32) {
    for (slot, digit) in out.iter_mut().zip(split_bytes::<N>(value)) {
        *slot = encode_byte(digit);
    }
}

/// Rescales a two-digit color value to 16 bits (floor).
///
/// `0` maps to `0` and `16128` to `65535`. Out-of-range input saturates.
#[inline]
pub fn map_color(raw: u32) -> u16 {
    let scaled = raw as u64 * u16::MAX as u64 / MAX_COLOR_RAW as u64;
    scaled.min(u16::MAX as u64) as u16
}

/// Rescales a 16-bit intensity to the nearest two-digit color value.
#[inline]
pub fn unmap_color(intensity: u16) -> u32 {
    (intensity as u32 * MAX_COLOR_RAW + u16::MAX as u32 / 2) / u16::MAX as u32
}

fn read_color(bytes: &[u8]) -> Intensity {
    from_components(core::array::from_fn(|j| {
        let pos = j * 2;
        map_color(read_integer(&bytes[pos..pos + 2]))
    }))
}

fn write_color(out: &mut [u8], color: Intensity) {
    for (j, value) in components(color).into_iter().enumerate() {
        let pos = j * 2;
        write_integer::<2>(&mut out[pos..pos + 2], unmap_color(value));
    }
}

fn check_len(bytes: &[u8], expected: usize) -> Result<(), DecodeError> {
    if bytes.len() != expected {
        return Err(DecodeError::WrongLength {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Requested state of one channel within a color command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelCommand {
    /// Channel should be lit. When false the color is ignored.
    pub on: bool,

    /// Target intensity.
    pub color: Intensity,
}

/// A decoded color command.
///
/// Layout (encoded bytes):
///
/// | offset | field |
/// |---|---|
/// | 0 | tag |
/// | 1 | channel mask, bit `i + 1` lights channel `i` |
/// | 2..5 | duration, tenths of a second |
/// | 5.. | per channel, per component: two-digit color |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCommand {
    pub channels: [ChannelCommand; CHANNEL_COUNT],
    pub duration_ms: u32,
}

impl ColorCommand {
    /// Decodes a color command. Fails only on a length mismatch.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        check_len(bytes, COLOR_COMMAND_LEN)?;

        let mask = decode_byte(bytes[1]);
        let duration_ms = read_integer(&bytes[2..5]) * DURATION_UNIT_MS;
        let channels = core::array::from_fn(|i| {
            let pos = i * 6 + 5;
            ChannelCommand {
                on: (mask >> (i + 1)) & 1 == 1,
                color: read_color(&bytes[pos..pos + 6]),
            }
        });

        Ok(Self {
            channels,
            duration_ms,
        })
    }

    /// Encodes the command. Durations are truncated to tenths of a second.
    pub fn encode(&self) -> [u8; COLOR_COMMAND_LEN] {
        let mut out = [0u8; COLOR_COMMAND_LEN];
        out[0] = encode_byte(COLOR_TAG);

        let mask = self
            .channels
            .iter()
            .enumerate()
            .filter(|(_, channel)| channel.on)
            .fold(0u8, |mask, (i, _)| mask | 1 << (i + 1));
        out[1] = encode_byte(mask);

        write_integer::<3>(&mut out[2..5], self.duration_ms / DURATION_UNIT_MS);
        for (i, channel) in self.channels.iter().enumerate() {
            let pos = i * 6 + 5;
            write_color(&mut out[pos..pos + 6], channel.color);
        }

        out
    }
}

/// A decoded timer command.
///
/// Layout (encoded bytes):
///
/// | offset | field |
/// |---|---|
/// | 0 | tag |
/// | 1 | timer index |
/// | 2 | zero-point selector |
/// | 3..6 | offset seconds, biased by 43199 |
/// | 6..9 | duration, tenths of a second |
/// | 9 | mode |
/// | 10..16 | two-digit color per component |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerCommand {
    pub index: u8,
    pub zero_point: ZeroPoint,
    pub offset_s: i32,
    pub duration_ms: u32,
    pub mode: TimerMode,
    pub color: Intensity,
}

impl TimerCommand {
    /// Decodes a timer command.
    ///
    /// A disabled timer (`ZeroPoint::Off`) is accepted whatever its mode byte
    /// says; an unknown mode is then stored as `TurnOff`.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        check_len(bytes, TIMER_COMMAND_LEN)?;

        let index = decode_byte(bytes[1]);
        if index as usize >= TIMER_COUNT {
            return Err(DecodeError::TimerIndexOutOfRange(index));
        }

        let selector = decode_byte(bytes[2]);
        let zero_point =
            ZeroPoint::from_raw(selector).ok_or(DecodeError::ZeroPointOutOfRange(selector))?;

        let offset_s = read_integer(&bytes[3..6]) as i32 - OFFSET_BIAS;
        let duration_ms = read_integer(&bytes[6..9]) * DURATION_UNIT_MS;

        let mode_raw = decode_byte(bytes[9]);
        let mode = match (TimerMode::from_raw(mode_raw), zero_point) {
            (Some(mode), _) => mode,
            (None, ZeroPoint::Off) => TimerMode::TurnOff,
            (None, _) => return Err(DecodeError::ModeOutOfRange(mode_raw)),
        };

        Ok(Self {
            index,
            zero_point,
            offset_s,
            duration_ms,
            mode,
            color: read_color(&bytes[10..16]),
        })
    }

    /// Encodes the command. Offsets below `-43199` s clamp to `-43199` s.
    pub fn encode(&self) -> [u8; TIMER_COMMAND_LEN] {
        let mut out = [0u8; TIMER_COMMAND_LEN];
        out[0] = encode_byte(TIMER_TAG);
        out[1] = encode_byte(self.index);
        out[2] = encode_byte(self.zero_point.as_raw());
        write_integer::<3>(&mut out[3..6], (self.offset_s + OFFSET_BIAS).max(0) as u32);
        write_integer::<3>(&mut out[6..9], self.duration_ms / DURATION_UNIT_MS);
        out[9] = encode_byte(self.mode.as_raw());
        write_color(&mut out[10..16], self.color);
        out
    }
}

/// Any inbound command, dispatched on its tag byte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Color(ColorCommand),
    Timer(TimerCommand),
}

impl Command {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let tag = decode_byte(*bytes.first().ok_or(DecodeError::Empty)?);
        match tag {
            COLOR_TAG => ColorCommand::decode(bytes).map(Command::Color),
            TIMER_TAG => TimerCommand::decode(bytes).map(Command::Timer),
            other => Err(DecodeError::UnknownTag(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::INTENSITY_OFF;
    use palette::Srgb;

    fn encoded_digits<const N: usize>(value: u32) -> [u8; N] {
        split_bytes::<N>(value).map(encode_byte)
    }

    #[test]
    fn combine_two_digits() {
        for b0 in [0u8, 1, 63, 126] {
            for b1 in [0u8, 5, 126] {
                assert_eq!(combine_bytes(&[b0, b1]), b0 as u32 * 127 + b1 as u32);
            }
        }
    }

    #[test]
    fn split_inverts_combine() {
        for value in [0u32, 1, 126, 127, 16128, 46799, 2_048_382] {
            assert_eq!(combine_bytes(&split_bytes::<3>(value)), value);
        }
        assert_eq!(split_bytes::<3>(46799), [2, 114, 63]);
    }

    #[test]
    fn split_saturates_oversized_values() {
        assert_eq!(split_bytes::<2>(1_000_000), [126, 126]);
    }

    #[test]
    fn color_map_endpoints() {
        assert_eq!(map_color(0), 0);
        assert_eq!(map_color(MAX_COLOR_RAW), 65535);
        assert_eq!(map_color(u32::MAX / 2), 65535);
    }

    #[test]
    fn unmap_recovers_within_rounding() {
        for raw in [0u32, 1, 500, 8064, 16127, 16128] {
            assert_eq!(unmap_color(map_color(raw)), raw);
        }
    }

    #[test]
    fn color_command_rejects_wrong_length() {
        let bytes = [1u8; COLOR_COMMAND_LEN - 1];
        assert_eq!(
            ColorCommand::decode(&bytes),
            Err(DecodeError::WrongLength {
                expected: COLOR_COMMAND_LEN,
                actual: COLOR_COMMAND_LEN - 1
            })
        );
    }

    #[test]
    fn color_command_minimal_frame() {
        // Channel 0 on, 1.0 s, every component raw (1, 1) i.e. zero
        let mut bytes = [1u8; COLOR_COMMAND_LEN];
        bytes[0] = encode_byte(COLOR_TAG);
        bytes[1] = encode_byte(0b0000_0010);
        bytes[4] = 11;

        let command = ColorCommand::decode(&bytes).unwrap();
        assert_eq!(command.duration_ms, 1000);
        assert!(command.channels[0].on);
        assert!(!command.channels[1].on);
        assert_eq!(command.channels[0].color, INTENSITY_OFF);
    }

    #[test]
    fn color_command_reads_component_offsets() {
        let mut bytes = [1u8; COLOR_COMMAND_LEN];
        bytes[1] = encode_byte(0b0000_0110);
        // Channel 1, blue sits at 1 * 6 + 2 * 2 + 5 = 15
        bytes[15..17].copy_from_slice(&encoded_digits::<2>(MAX_COLOR_RAW));
        // Channel 0, green at 7
        bytes[7..9].copy_from_slice(&encoded_digits::<2>(8064));

        let command = ColorCommand::decode(&bytes).unwrap();
        assert!(command.channels[1].on);
        assert_eq!(command.channels[1].color, Srgb::new(0, 0, 65535));
        assert_eq!(command.channels[0].color.green, map_color(8064));
    }

    #[test]
    fn color_command_encode_round_trips() {
        let command = ColorCommand {
            channels: [
                ChannelCommand {
                    on: true,
                    color: Srgb::new(65535, 1234, 0),
                },
                ChannelCommand {
                    on: false,
                    color: Srgb::new(40000, 20000, 10),
                },
            ],
            duration_ms: 2500,
        };

        let decoded = ColorCommand::decode(&command.encode()).unwrap();
        assert_eq!(decoded.duration_ms, 2500);
        assert_eq!(decoded.channels[0].on, true);
        assert_eq!(decoded.channels[1].on, false);
        for (a, b) in [
            (decoded.channels[0].color, command.channels[0].color),
            (decoded.channels[1].color, command.channels[1].color),
        ] {
            for (x, y) in components(a).into_iter().zip(components(b)) {
                assert!(x.abs_diff(y) <= 5, "{} vs {}", x, y);
            }
        }
    }

    #[test]
    fn encoded_commands_avoid_reserved_bytes() {
        let command = TimerCommand {
            index: 7,
            zero_point: ZeroPoint::Sunset,
            offset_s: -43199,
            duration_ms: 204_838_200,
            mode: TimerMode::SetColor,
            color: Srgb::new(65535, 0, 65535),
        };
        assert!(command.encode().iter().all(|&b| b != 0 && b != 0xFF));
    }

    fn timer_bytes(index: u8, selector: u8, offset_s: i32, mode: u8) -> [u8; TIMER_COMMAND_LEN] {
        let mut bytes = [1u8; TIMER_COMMAND_LEN];
        bytes[0] = encode_byte(TIMER_TAG);
        bytes[1] = encode_byte(index);
        bytes[2] = encode_byte(selector);
        bytes[3..6].copy_from_slice(&encoded_digits::<3>((offset_s + OFFSET_BIAS) as u32));
        bytes[6..9].copy_from_slice(&encoded_digits::<3>(25));
        bytes[9] = encode_byte(mode);
        bytes
    }

    #[test]
    fn timer_command_decodes_fields() {
        let command = TimerCommand::decode(&timer_bytes(5, 2, 3600, 1)).unwrap();
        assert_eq!(command.index, 5);
        assert_eq!(command.zero_point, ZeroPoint::Sunrise);
        assert_eq!(command.offset_s, 3600);
        assert_eq!(command.duration_ms, 2500);
        assert_eq!(command.mode, TimerMode::Restore);
    }

    #[test]
    fn timer_command_negative_offset() {
        let command = TimerCommand::decode(&timer_bytes(0, 3, -1800, 0)).unwrap();
        assert_eq!(command.offset_s, -1800);
    }

    #[test]
    fn timer_command_rejects_out_of_range_fields() {
        assert_eq!(
            TimerCommand::decode(&timer_bytes(8, 1, 0, 0)),
            Err(DecodeError::TimerIndexOutOfRange(8))
        );
        assert_eq!(
            TimerCommand::decode(&timer_bytes(0, 4, 0, 0)),
            Err(DecodeError::ZeroPointOutOfRange(4))
        );
        assert_eq!(
            TimerCommand::decode(&timer_bytes(0, 1, 0, 3)),
            Err(DecodeError::ModeOutOfRange(3))
        );
        assert!(matches!(
            TimerCommand::decode(&[1u8; 3]),
            Err(DecodeError::WrongLength { .. })
        ));
    }

    #[test]
    fn disabled_timer_ignores_mode_byte() {
        let command = TimerCommand::decode(&timer_bytes(2, 0, 77, 9)).unwrap();
        assert_eq!(command.zero_point, ZeroPoint::Off);
        assert_eq!(command.mode, TimerMode::TurnOff);
    }

    #[test]
    fn timer_command_encode_round_trips() {
        let bytes = timer_bytes(3, 1, -120, 2);
        let command = TimerCommand::decode(&bytes).unwrap();
        assert_eq!(command.encode(), bytes);
    }

    #[test]
    fn command_dispatches_on_tag() {
        let timer = timer_bytes(1, 1, 0, 0);
        assert!(matches!(Command::decode(&timer), Ok(Command::Timer(_))));

        let mut color = [1u8; COLOR_COMMAND_LEN];
        color[0] = encode_byte(COLOR_TAG);
        assert!(matches!(Command::decode(&color), Ok(Command::Color(_))));

        assert_eq!(Command::decode(&[]), Err(DecodeError::Empty));
        assert_eq!(
            Command::decode(&[encode_byte(b'x')]),
            Err(DecodeError::UnknownTag(b'x'))
        );
    }
}
