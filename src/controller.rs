//! The lighting controller: one owned state tree wired to the hardware seams.
//!
//! Drive it from a single loop:
//!
//! - feed inbound command frames to [`LightsController::handle_command`],
//! - call [`LightsController::tick`] on every iteration,
//! - call [`LightsController::check_timers`] once per wall-clock second,
//! - call [`LightsController::begin_day`] when the calendar date changes.

use heapless::Vec;

use crate::channel::{Channel, ChannelBank, PwmSink};
use crate::codec::{COLOR_TAG, ColorCommand, Command, TimerCommand, encode_byte};
use crate::config::{
    AntennaMode, CHANNEL_COUNT, COLOR_COMMAND_LEN, ControllerConfig, FirmwareVersion,
    TIMER_COMMAND_LEN, TIMER_COUNT,
};
use crate::persistence::{ConfigRecord, NvStore};
use crate::scheduler::{self, FiredTimers};
use crate::time::{CalendarDate, Clock};
use crate::timer::{SunCalculator, SunTimes, Timer, TimerTable, unconfigured_marker};
use crate::transition::{TransitionClock, TransitionStatus};
use crate::types::DecodeError;

/// Placeholder stored when no color command has been configured.
///
/// Shorter than any color command, so it never decodes.
pub const UNCONFIGURED_LIGHTS: [u8; 1] = [encode_byte(COLOR_TAG)];

/// Trait for publishing configuration changes to observers.
///
/// Receives the complete encoded record. Rate limiting is up to the
/// implementation.
pub trait ChangeNotifier {
    fn publish(&mut self, record: &[u8]);
}

/// Whether a snapshot should also be committed to the non-volatile store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Commit {
    /// Write the record to the store.
    Store,
    /// Keep the snapshot in memory only.
    Volatile,
}

/// Controls both RGB channels, the timer table and their persisted record.
///
/// # Type Parameters
/// * `'c` - Lifetime of the clock reference
/// * `C` - Wall clock
/// * `P` - PWM output stage
/// * `S` - Non-volatile store
/// * `A` - Sunrise/sunset calculator
/// * `N` - Change notification channel
pub struct LightsController<'c, C, P, S, A, N>
where
    C: Clock,
    P: PwmSink,
    S: NvStore,
    A: SunCalculator,
    N: ChangeNotifier,
{
    clock: &'c C,
    pwm: P,
    store: S,
    sun: A,
    notifier: N,
    firmware: FirmwareVersion,
    antenna_mode: AntennaMode,
    channels: ChannelBank,
    timers: TimerTable,
    sun_times: SunTimes,
    color_command: Vec<u8, COLOR_COMMAND_LEN>,
    record: ConfigRecord,
}

impl<'c, C, P, S, A, N> LightsController<'c, C, P, S, A, N>
where
    C: Clock,
    P: PwmSink,
    S: NvStore,
    A: SunCalculator,
    N: ChangeNotifier,
{
    /// Creates a controller with every channel dark and every timer
    /// unconfigured. Nothing is read from the store until
    /// [`load_config`](Self::load_config) or [`boot`](Self::boot).
    pub fn new(
        clock: &'c C,
        pwm: P,
        store: S,
        sun: A,
        notifier: N,
        config: ControllerConfig,
    ) -> Self {
        let mut controller = Self {
            clock,
            pwm,
            store,
            sun,
            notifier,
            firmware: config.firmware,
            antenna_mode: config.antenna_mode,
            channels: ChannelBank::new(),
            timers: TimerTable::new(),
            sun_times: SunTimes::default(),
            color_command: Vec::new(),
            record: ConfigRecord::default(),
        };
        controller.set_color_command(&UNCONFIGURED_LIGHTS);
        controller.snapshot();
        controller
    }

    /// Computes today's sun times, then restores the stored configuration.
    pub fn boot(&mut self, today: CalendarDate) {
        self.update_sun_times(today);
        self.load_config();
    }

    /// Decodes a tagged command frame and applies it.
    pub fn handle_command(&mut self, bytes: &[u8]) -> Result<Command, DecodeError> {
        let command = Command::decode(bytes).inspect_err(|err| {
            warn!("rejected command: {:?}", err);
        })?;

        match &command {
            Command::Color(color) => self.apply_color_command(color, bytes),
            Command::Timer(timer) => self.apply_timer_command(timer, bytes),
        }

        Ok(command)
    }

    /// Applies a color command.
    ///
    /// The new state is persisted once the transition completes. If a
    /// previous transition is still running, its configuration is published
    /// first so observers see the superseded state.
    pub fn process_color_command(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        let command = ColorCommand::decode(bytes).inspect_err(|err| {
            warn!("rejected color command: {:?}", err);
        })?;
        self.apply_color_command(&command, bytes);
        Ok(())
    }

    /// Configures a timer slot, persists and publishes. Returns the slot index.
    pub fn process_timer_command(&mut self, bytes: &[u8]) -> Result<usize, DecodeError> {
        let command = TimerCommand::decode(bytes).inspect_err(|err| {
            warn!("rejected timer command: {:?}", err);
        })?;
        self.apply_timer_command(&command, bytes);
        Ok(command.index as usize)
    }

    fn apply_color_command(&mut self, command: &ColorCommand, bytes: &[u8]) {
        if !self.channels.clock().reached() {
            debug!("color command supersedes running transition");
            self.save_config(Commit::Volatile);
            self.notify();
        }

        self.channels.apply_color(command, self.clock.millis());
        self.set_color_command(bytes);

        debug!(
            "color command accepted: channel 0 {}, channel 1 {}, {} ms",
            command.channels[0].on,
            command.channels[CHANNEL_COUNT - 1].on,
            command.duration_ms
        );
    }

    fn apply_timer_command(&mut self, command: &TimerCommand, bytes: &[u8]) {
        self.timers.apply(command, bytes, &self.sun_times);

        if let Some(timer) = self.timers.get(command.index as usize) {
            info!(
                "timer {} set: enabled {}, fires at {}:{}:{}",
                command.index,
                timer.enabled,
                timer.trigger.hour,
                timer.trigger.minute,
                timer.trigger.second
            );
        }

        self.save_config(Commit::Store);
        self.notify();
    }

    /// Advances the active transition. Call on every loop iteration.
    ///
    /// On completion the configuration is persisted and published.
    pub fn tick(&mut self) -> TransitionStatus {
        let status = self.channels.tick(self.clock.millis(), &mut self.pwm);
        if status == TransitionStatus::Completed {
            trace!("transition complete");
            self.save_config(Commit::Store);
            self.notify();
        }
        status
    }

    /// Fires due timers. Call once per wall-clock second.
    pub fn check_timers(&mut self) -> FiredTimers {
        scheduler::evaluate(
            &mut self.timers,
            &mut self.channels,
            self.clock.time_of_day(),
            self.clock.millis(),
        )
    }

    /// Starts a new calendar day: refreshes sun times, re-resolves solar
    /// timers and lets every timer fire again.
    pub fn begin_day(&mut self, today: CalendarDate) {
        self.update_sun_times(today);
        self.timers.resolve_all(&self.sun_times);
        self.timers.clear_elapsed();
    }

    /// Refreshes sunrise and sunset from the calculator. Events it cannot
    /// compute keep their previous zero-point.
    pub fn update_sun_times(&mut self, today: CalendarDate) {
        self.sun_times.update(&self.sun, today);
        debug!(
            "sun times for {}-{}-{}: sunrise {} s, sunset {} s",
            today.year,
            today.month,
            today.day,
            self.sun_times.sunrise_s,
            self.sun_times.sunset_s
        );
    }

    /// Rebuilds the record from the current state, optionally writing it to
    /// the store.
    pub fn save_config(&mut self, commit: Commit) {
        self.snapshot();
        if commit == Commit::Store {
            self.record.write_to(&mut self.store);
        }
    }

    /// Restores channels and timers from the store.
    ///
    /// Missing, short or undecodable timer blocks are replaced by the
    /// unconfigured marker, an undecodable color command by
    /// [`UNCONFIGURED_LIGHTS`]. The store is rewritten only if something had
    /// to be repaired. Finally the stored color command is re-applied.
    pub fn load_config(&mut self) {
        let mut repaired = false;

        let record = match ConfigRecord::read_from(&self.store) {
            Ok(record) => record,
            Err(err) => {
                warn!("stored record unreadable ({:?}), starting empty", err);
                repaired = true;
                ConfigRecord::default()
            }
        };
        let stored = record.parse();

        if let Some(version) = stored.firmware {
            if version != self.firmware {
                info!(
                    "record written by {}.{}.{}, now {}.{}.{}",
                    version.major,
                    version.minor,
                    version.patch,
                    self.firmware.major,
                    self.firmware.minor,
                    self.firmware.patch
                );
            }
        }

        if let Some(raw) = stored.antenna_mode {
            self.antenna_mode = AntennaMode::from_raw(raw);
            repaired |= self.antenna_mode.as_raw() != raw;
        }

        match stored.color {
            Some(bytes) if ColorCommand::decode(bytes).is_ok() => self.set_color_command(bytes),
            Some(bytes) if bytes == UNCONFIGURED_LIGHTS => self.set_color_command(bytes),
            _ => {
                warn!("stored color command invalid, resetting lights");
                self.set_color_command(&UNCONFIGURED_LIGHTS);
                repaired = true;
            }
        }

        for (index, block) in stored.timers.into_iter().enumerate() {
            let Some(bytes) = block else {
                warn!("stored timer {} missing, resetting", index);
                self.timers.reset(index);
                repaired = true;
                continue;
            };

            if bytes == unconfigured_marker(index) {
                self.timers.reset(index);
                continue;
            }

            match TimerCommand::decode(bytes) {
                Ok(command) if command.index as usize == index => {
                    self.timers.apply(&command, bytes, &self.sun_times);
                }
                _ => {
                    warn!("stored timer {} invalid, resetting", index);
                    self.timers.reset(index);
                    repaired = true;
                }
            }
        }

        if repaired {
            info!("stored record repaired");
            self.save_config(Commit::Store);
        } else {
            self.save_config(Commit::Volatile);
        }

        if let Ok(command) = ColorCommand::decode(&self.color_command) {
            self.channels.apply_color(&command, self.clock.millis());
        }
    }

    /// Returns timer `index` to the unconfigured state and persists.
    ///
    /// Returns `false`, changing nothing, if `index` names no slot.
    pub fn reset_timer(&mut self, index: usize) -> bool {
        if !self.timers.reset(index) {
            warn!("no timer {} to reset", index);
            return false;
        }
        info!("timer {} reset", index);
        self.save_config(Commit::Store);
        true
    }

    /// Forgets the stored color command and persists. Channels keep their
    /// current output until the next command.
    pub fn reset_lights(&mut self) {
        info!("lights reset");
        self.set_color_command(&UNCONFIGURED_LIGHTS);
        self.save_config(Commit::Store);
    }

    /// Changes the antenna mode, persists and publishes.
    pub fn set_antenna_mode(&mut self, mode: AntennaMode) {
        self.antenna_mode = mode;
        self.save_config(Commit::Store);
        self.notify();
    }

    /// Channel `index`, or `None` past the last channel.
    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.channel(index)
    }

    /// Timer slot `index`, or `None` past the last slot.
    pub fn timer(&self, index: usize) -> Option<&Timer> {
        self.timers.get(index)
    }

    /// All eight timer slots.
    pub fn timers(&self) -> &TimerTable {
        &self.timers
    }

    /// The transition clock shared by both channels.
    pub fn transition(&self) -> &TransitionClock {
        self.channels.clock()
    }

    /// Today's sunrise and sunset zero-points.
    pub fn sun_times(&self) -> SunTimes {
        self.sun_times
    }

    /// Antenna mode as last set or loaded.
    pub fn antenna_mode(&self) -> AntennaMode {
        self.antenna_mode
    }

    /// Running firmware version, stamped into every record.
    pub fn firmware(&self) -> FirmwareVersion {
        self.firmware
    }

    /// Raw bytes of the last accepted color command.
    pub fn color_command(&self) -> &[u8] {
        &self.color_command
    }

    /// The current record snapshot.
    pub fn config_record(&self) -> &[u8] {
        self.record.as_bytes()
    }

    /// The PWM output stage.
    pub fn pwm(&self) -> &P {
        &self.pwm
    }

    /// The non-volatile store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The change notification channel.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn set_color_command(&mut self, bytes: &[u8]) {
        self.color_command.clear();
        self.color_command
            .extend(bytes.iter().copied().take(COLOR_COMMAND_LEN));
    }

    fn snapshot(&mut self) {
        match ConfigRecord::encode(
            self.firmware,
            self.antenna_mode,
            &self.color_command,
            self.timers.iter().map(Timer::raw),
        ) {
            Ok(record) => self.record = record,
            Err(err) => warn!("could not encode record: {:?}", err),
        }
    }

    fn notify(&mut self) {
        self.notifier.publish(self.record.as_bytes());
    }
}

// The record always fits: header, one color command and eight timer commands
// each with a length byte.
const _: () = assert!(
    crate::persistence::PREFIX_LEN + 5 + 1 + COLOR_COMMAND_LEN + TIMER_COUNT * (1 + TIMER_COMMAND_LEN)
        <= crate::config::RECORD_CAPACITY
);
