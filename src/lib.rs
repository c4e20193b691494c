#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`codec`**: Decodes and encodes the 7-bit-safe command protocol (color and timer commands)
//! - **`ChannelBank`**: Two RGB channels sharing a single transition clock
//! - **`TransitionClock`**: Start time and duration of the active raised-cosine fade
//! - **`TimerTable`**: Eight daily schedule slots anchored to noon, sunrise or sunset
//! - **`scheduler`**: Fires due timers once per second
//! - **`ConfigRecord`**: Length-prefixed persisted configuration with self-healing load
//! - **`LightsController`**: Owns all of the above and wires them to your hardware
//!
//! Hardware is reached through small traits: [`PwmSink`], [`NvStore`], [`Clock`],
//! [`SunCalculator`] and [`ChangeNotifier`]. Intensities are 16-bit per component
//! (`palette::Srgb<u16>`).

#[macro_use]
mod fmt;

pub mod channel;
pub mod codec;
pub mod config;
pub mod controller;
pub mod persistence;
pub mod scheduler;
pub mod time;
pub mod timer;
pub mod transition;
pub mod types;

pub use palette::Srgb;

pub use channel::{Channel, ChannelBank, PwmSink};
pub use codec::{ChannelCommand, ColorCommand, Command, TimerCommand};
pub use config::{
    AntennaMode, CHANNEL_COUNT, COLOR_COMMAND_LEN, ControllerConfig, FirmwareVersion,
    TIMER_COMMAND_LEN, TIMER_COUNT,
};
pub use controller::{ChangeNotifier, Commit, LightsController, UNCONFIGURED_LIGHTS};
pub use persistence::{ConfigRecord, NvStore, PersistenceError, StoredConfig};
pub use scheduler::FiredTimers;
pub use time::{CalendarDate, Clock, TimeOfDay};
pub use timer::{SunCalculator, SunTimes, Timer, TimerTable};
pub use transition::{TransitionClock, TransitionStatus};
pub use types::{Component, DecodeError, INTENSITY_OFF, Intensity, TimerMode, ZeroPoint};
