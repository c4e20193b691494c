//! Persisted configuration record.
//!
//! Layout, every byte +1 encoded:
//!
//! | offset | field |
//! |---|---|
//! | 0..2 | body length, two base-127 digits |
//! | 2..5 | firmware major, minor, patch |
//! | 5 | antenna mode |
//! | 6 | channel count |
//! | 7 | color command length, then the color command |
//! | .. | per timer: command length, then the timer command |
//!
//! Commands are stored in their wire form, which is already +1 encoded.

use heapless::Vec;

use crate::codec::{combine_bytes, decode_byte, encode_byte, split_bytes};
use crate::config::{AntennaMode, CHANNEL_COUNT, FirmwareVersion, RECORD_CAPACITY, TIMER_COUNT};

/// Bytes taken by the length prefix.
pub const PREFIX_LEN: usize = 2;

/// Version, antenna mode and channel count.
const HEADER_LEN: usize = 5;

/// Trait for abstracting the byte-addressable non-volatile store (EEPROM or
/// emulated EEPROM).
pub trait NvStore {
    fn read(&self, address: usize) -> u8;
    fn write(&mut self, address: usize, value: u8);
}

/// Errors raised while reading or building a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistenceError {
    /// The stored length prefix is unreadable or exceeds the record capacity.
    InvalidLength(u32),

    /// The record would not fit in `RECORD_CAPACITY` bytes.
    CapacityExceeded,
}

impl core::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PersistenceError::InvalidLength(len) => {
                write!(f, "stored record length {} is invalid", len)
            }
            PersistenceError::CapacityExceeded => {
                write!(f, "record exceeds {} bytes", RECORD_CAPACITY)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PersistenceError {}

/// A complete encoded record, prefix included.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigRecord {
    bytes: Vec<u8, RECORD_CAPACITY>,
}

impl ConfigRecord {
    /// Encodes a record from its parts.
    pub fn encode<'a, I>(
        firmware: FirmwareVersion,
        antenna_mode: AntennaMode,
        color: &[u8],
        timers: I,
    ) -> Result<Self, PersistenceError>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut bytes = Vec::<u8, RECORD_CAPACITY>::new();
        // Length is patched in once the body is complete
        push(&mut bytes, &[0, 0])?;
        push(
            &mut bytes,
            &[
                encode_byte(firmware.major),
                encode_byte(firmware.minor),
                encode_byte(firmware.patch),
                encode_byte(antenna_mode.as_raw()),
                encode_byte(CHANNEL_COUNT as u8),
            ],
        )?;
        push_block(&mut bytes, color)?;
        for timer in timers {
            push_block(&mut bytes, timer)?;
        }

        let body_len = (bytes.len() - PREFIX_LEN) as u32;
        let [high, low] = split_bytes::<2>(body_len);
        bytes[0] = encode_byte(high);
        bytes[1] = encode_byte(low);

        Ok(Self { bytes })
    }

    /// Reads a record from the start of `store`.
    pub fn read_from<S: NvStore>(store: &S) -> Result<Self, PersistenceError> {
        let high = decode_byte(store.read(0));
        let low = decode_byte(store.read(1));
        if high > 126 || low > 126 {
            return Err(PersistenceError::InvalidLength(u32::MAX));
        }

        let body_len = combine_bytes(&[high, low]);
        let total = body_len as usize + PREFIX_LEN;
        if total > RECORD_CAPACITY {
            return Err(PersistenceError::InvalidLength(body_len));
        }

        let mut bytes = Vec::<u8, RECORD_CAPACITY>::new();
        for address in 0..total {
            bytes
                .push(store.read(address))
                .map_err(|_| PersistenceError::CapacityExceeded)?;
        }

        Ok(Self { bytes })
    }

    /// Writes the record to the start of `store`, one byte at a time.
    pub fn write_to<S: NvStore>(&self, store: &mut S) {
        for (address, &byte) in self.bytes.iter().enumerate() {
            store.write(address, byte);
        }
    }

    /// Splits the record into its fields.
    ///
    /// Never fails: a block that runs past the end of the record, and every
    /// block after it, is reported as missing.
    pub fn parse(&self) -> StoredConfig<'_> {
        let body = self.bytes.get(PREFIX_LEN..).unwrap_or(&[]);
        let mut stored = StoredConfig {
            firmware: None,
            antenna_mode: None,
            channel_count: None,
            color: None,
            timers: [None; TIMER_COUNT],
        };

        if body.len() < HEADER_LEN {
            return stored;
        }

        stored.firmware = Some(FirmwareVersion::new(
            decode_byte(body[0]),
            decode_byte(body[1]),
            decode_byte(body[2]),
        ));
        stored.antenna_mode = Some(decode_byte(body[3]));
        stored.channel_count = Some(decode_byte(body[4]));

        let mut cursor = HEADER_LEN;
        stored.color = next_block(body, &mut cursor);
        if stored.color.is_none() {
            return stored;
        }
        for slot in stored.timers.iter_mut() {
            *slot = next_block(body, &mut cursor);
            if slot.is_none() {
                break;
            }
        }

        stored
    }

    /// The encoded record, length prefix included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Fields of a stored record. `None` marks a field the record did not contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredConfig<'a> {
    /// Version that wrote the record. Informational only.
    pub firmware: Option<FirmwareVersion>,
    pub antenna_mode: Option<u8>,
    pub channel_count: Option<u8>,
    pub color: Option<&'a [u8]>,
    pub timers: [Option<&'a [u8]>; TIMER_COUNT],
}

fn push(bytes: &mut Vec<u8, RECORD_CAPACITY>, data: &[u8]) -> Result<(), PersistenceError> {
    bytes
        .extend_from_slice(data)
        .map_err(|_| PersistenceError::CapacityExceeded)
}

fn push_block(bytes: &mut Vec<u8, RECORD_CAPACITY>, block: &[u8]) -> Result<(), PersistenceError> {
    let len = u8::try_from(block.len()).map_err(|_| PersistenceError::CapacityExceeded)?;
    push(bytes, &[encode_byte(len)])?;
    push(bytes, block)
}

fn next_block<'a>(body: &'a [u8], cursor: &mut usize) -> Option<&'a [u8]> {
    let len = decode_byte(*body.get(*cursor)?) as usize;
    let start = *cursor + 1;
    let block = body.get(start..start + len)?;
    *cursor = start + len;
    Some(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ArrayStore([u8; 256]);

    impl NvStore for ArrayStore {
        fn read(&self, address: usize) -> u8 {
            self.0[address]
        }

        fn write(&mut self, address: usize, value: u8) {
            self.0[address] = value;
        }
    }

    const VERSION: FirmwareVersion = FirmwareVersion::new(1, 4, 0);

    fn sample() -> ConfigRecord {
        let timers: [&[u8]; TIMER_COUNT] = [&[10, 11, 12], &[], &[5], &[], &[], &[], &[], &[9]];
        ConfigRecord::encode(VERSION, AntennaMode::External, &[100], timers).unwrap()
    }

    #[test]
    fn header_offsets() {
        let record = sample();
        let bytes = record.as_bytes();
        assert_eq!(&bytes[2..5], &[2, 5, 1]);
        assert_eq!(bytes[5], 3);
        assert_eq!(bytes[6], 3);
        assert_eq!(&bytes[7..9], &[2, 100]);
        let body_len = combine_bytes(&[bytes[0] - 1, bytes[1] - 1]) as usize;
        assert_eq!(body_len + PREFIX_LEN, bytes.len());
    }

    #[test]
    fn store_round_trip() {
        let record = sample();
        let mut store = ArrayStore([0xFF; 256]);
        record.write_to(&mut store);
        assert_eq!(ConfigRecord::read_from(&store).unwrap(), record);
    }

    #[test]
    fn parse_recovers_blocks() {
        let record = sample();
        let stored = record.parse();
        assert_eq!(stored.firmware, Some(VERSION));
        assert_eq!(stored.antenna_mode, Some(2));
        assert_eq!(stored.channel_count, Some(CHANNEL_COUNT as u8));
        assert_eq!(stored.color, Some(&[100u8][..]));
        assert_eq!(stored.timers[0], Some(&[10u8, 11, 12][..]));
        assert_eq!(stored.timers[1], Some(&[][..]));
        assert_eq!(stored.timers[7], Some(&[9u8][..]));
    }

    #[test]
    fn erased_store_is_rejected() {
        let store = ArrayStore([0xFF; 256]);
        assert!(matches!(
            ConfigRecord::read_from(&store),
            Err(PersistenceError::InvalidLength(_))
        ));
        let store = ArrayStore([0x00; 256]);
        assert!(ConfigRecord::read_from(&store).is_err());
    }

    #[test]
    fn oversized_length_is_rejected() {
        let mut store = ArrayStore([1; 256]);
        store.0[0] = encode_byte(2);
        assert_eq!(
            ConfigRecord::read_from(&store),
            Err(PersistenceError::InvalidLength(254))
        );
    }

    #[test]
    fn truncated_record_reports_missing_timers() {
        let record = sample();
        let mut store = ArrayStore([0xFF; 256]);
        record.write_to(&mut store);
        // Claim a body that ends inside the first timer block
        let [high, low] = split_bytes::<2>((HEADER_LEN + 2 + 2) as u32);
        store.0[0] = encode_byte(high);
        store.0[1] = encode_byte(low);

        let truncated = ConfigRecord::read_from(&store).unwrap();
        let stored = truncated.parse();
        assert_eq!(stored.color, Some(&[100u8][..]));
        assert!(stored.timers.iter().all(Option::is_none));
    }
}
