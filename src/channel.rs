//! Channel model and the interpolation engine that drives the PWM outputs.

use crate::codec::ColorCommand;
use crate::config::CHANNEL_COUNT;
use crate::transition::{TransitionClock, TransitionStatus, ease, interpolate};
use crate::types::{Component, INTENSITY_OFF, Intensity, components, from_components};

/// Trait for abstracting the PWM output stage.
///
/// Implement this for your timer/PWM peripheral. Writes are fire-and-forget:
/// handle any hardware errors internally.
pub trait PwmSink {
    /// Drives one component of one channel at a 16-bit duty cycle.
    fn write(&mut self, channel: usize, component: Component, intensity: u16);
}

/// One RGB output group.
///
/// `value` holds the intensity the active transition started from and
/// `current` the intensity last written to the outputs. Once a transition
/// completes both equal `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub current: Intensity,
    pub value: Intensity,
    pub target: Intensity,
    pub saved: Intensity,
    pub is_off: bool,
}

impl Channel {
    /// A dark channel with nothing to restore.
    pub const fn new() -> Self {
        Self {
            current: INTENSITY_OFF,
            value: INTENSITY_OFF,
            target: INTENSITY_OFF,
            saved: INTENSITY_OFF,
            is_off: true,
        }
    }

    /// Fades towards black, remembering the transition's start color so a
    /// later [`turn_on`](Self::turn_on) can restore it.
    pub fn turn_off(&mut self) {
        self.saved = self.value;
        self.target = INTENSITY_OFF;
        self.is_off = true;
    }

    /// Fades back to the color remembered at the last turn-off.
    pub fn turn_on(&mut self) {
        self.target = self.saved;
        self.is_off = false;
    }

    /// Fades to `color`, starting from wherever the channel is right now.
    pub fn set_target(&mut self, color: Intensity) {
        self.value = self.current;
        self.target = color;
        self.is_off = false;
    }

    /// Fades to `color` from the start point of the active transition.
    /// Leaves the on/off flag alone.
    pub fn show(&mut self, color: Intensity) {
        self.target = color;
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

/// Every channel plus the single transition clock they share.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBank {
    channels: [Channel; CHANNEL_COUNT],
    clock: TransitionClock,
}

impl ChannelBank {
    pub const fn new() -> Self {
        Self {
            channels: [Channel::new(); CHANNEL_COUNT],
            clock: TransitionClock::idle(),
        }
    }

    /// Applies a decoded color command and restarts the shared clock.
    ///
    /// Lit channels fade from their current intensity to the new target,
    /// unlit ones are turned off.
    pub fn apply_color(&mut self, command: &ColorCommand, now_ms: u64) {
        for (channel, requested) in self.channels.iter_mut().zip(command.channels.iter()) {
            if requested.on {
                channel.set_target(requested.color);
            } else {
                channel.turn_off();
            }
        }
        self.clock.restart(now_ms, command.duration_ms);
    }

    /// Restarts the shared clock without touching any channel.
    pub fn start_transition(&mut self, now_ms: u64, duration_ms: u32) {
        self.clock.restart(now_ms, duration_ms);
    }

    /// Advances the active transition and writes every output.
    pub fn tick<P: PwmSink>(&mut self, now_ms: u64, pwm: &mut P) -> TransitionStatus {
        if self.clock.reached() {
            return TransitionStatus::Idle;
        }

        match self.clock.progress(now_ms) {
            Some(progress) => {
                let factor = ease(progress);
                for (index, channel) in self.channels.iter_mut().enumerate() {
                    let from = components(channel.value);
                    let to = components(channel.target);
                    channel.current =
                        from_components(core::array::from_fn(|j| interpolate(from[j], to[j], factor)));
                    write_channel(pwm, index, channel.current);
                }
                TransitionStatus::InProgress
            }
            None => {
                for (index, channel) in self.channels.iter_mut().enumerate() {
                    channel.value = channel.target;
                    channel.current = channel.target;
                    write_channel(pwm, index, channel.current);
                }
                self.clock.finish();
                TransitionStatus::Completed
            }
        }
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut Channel> {
        self.channels.get_mut(index)
    }

    pub fn channels(&self) -> &[Channel; CHANNEL_COUNT] {
        &self.channels
    }

    pub fn clock(&self) -> &TransitionClock {
        &self.clock
    }
}

impl Default for ChannelBank {
    fn default() -> Self {
        Self::new()
    }
}

fn write_channel<P: PwmSink>(pwm: &mut P, index: usize, color: Intensity) {
    for (component, intensity) in Component::ALL.into_iter().zip(components(color)) {
        pwm.write(index, component, intensity);
    }
}
