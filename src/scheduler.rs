//! Once-per-second timer evaluation.

use heapless::Vec;

use crate::channel::ChannelBank;
use crate::config::TIMER_COUNT;
use crate::time::TimeOfDay;
use crate::timer::TimerTable;
use crate::types::TimerMode;

/// Indices of the timers that fired during one evaluation.
pub type FiredTimers = Vec<usize, TIMER_COUNT>;

/// Fires every timer whose trigger equals `now`.
///
/// A fired timer applies its mode to its channel, takes over the shared
/// transition clock with its own duration, and is marked elapsed so it cannot
/// fire again until the next [`TimerTable::clear_elapsed`].
pub fn evaluate(
    timers: &mut TimerTable,
    channels: &mut ChannelBank,
    now: TimeOfDay,
    now_ms: u64,
) -> FiredTimers {
    let mut fired = FiredTimers::new();

    for (index, timer) in timers.iter_mut().enumerate() {
        if !timer.is_due(now) {
            continue;
        }

        let channel_index = TimerTable::channel_for(index);
        let Some(channel) = channels.channel_mut(channel_index) else {
            continue;
        };

        match timer.mode {
            TimerMode::TurnOff => channel.turn_off(),
            TimerMode::Restore => channel.turn_on(),
            TimerMode::SetColor => channel.show(timer.color),
        }

        channels.start_transition(now_ms, timer.duration_ms);
        timer.has_elapsed = true;

        info!(
            "timer {} fired at {}:{}:{}, mode {:?} on channel {}",
            index,
            now.hour,
            now.minute,
            now.second,
            timer.mode,
            channel_index
        );

        // At most TIMER_COUNT entries
        let _ = fired.push(index);
    }

    fired
}
