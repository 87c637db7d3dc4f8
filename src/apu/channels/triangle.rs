//! Triangle wave channel implementation

use crate::apu::components::{LengthCounter, LinearCounter, Timer};
use crate::apu::constants::TRIANGLE_SEQUENCE;

/// Triangle channel
///
/// The timer runs at CPU rate and steps a 32-entry sequence. Both the
/// length counter and the linear counter must be open for the sequencer
/// to advance; when either is zero the output holds its last value.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TriangleChannel {
    /// Enabled flag (from $4015)
    pub(crate) enabled: bool,
    /// Position in the 32-step sequence
    sequence_position: u8,
    /// Linear counter
    pub(crate) linear_counter: LinearCounter,
    /// Length counter
    pub(crate) length_counter: LengthCounter,
    /// Timer (clocked at CPU rate)
    pub(crate) timer: Timer,
}

impl TriangleChannel {
    pub fn new() -> Self {
        Self {
            enabled: false,
            sequence_position: 0,
            linear_counter: LinearCounter::new(),
            length_counter: LengthCounter::new(),
            timer: Timer::new(),
        }
    }

    /// Write register 0 ($4008: control/halt flag and linear reload value)
    pub fn write_register_0(&mut self, data: u8) {
        self.length_counter.set_halt(data & 0x80 != 0);
        self.linear_counter.write_control(data);
    }

    /// Write register 2 ($400A: timer low byte)
    pub fn write_register_2(&mut self, data: u8) {
        let high = (self.timer.period >> 8) as u8;
        self.timer.set_period(data, high);
    }

    /// Write register 3 ($400B: length load, timer high, linear reload arm)
    pub fn write_register_3(&mut self, data: u8) {
        let low = self.timer.period as u8;
        self.timer.set_period(low, data & 0x07);

        if self.enabled {
            self.length_counter.load(data >> 3);
        }
        self.linear_counter.arm_reload();
    }

    /// Set the enabled flag (from $4015)
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length_counter.clear();
        }
    }

    /// Whether the length counter still holds the channel open
    pub fn is_active(&self) -> bool {
        self.enabled && self.length_counter.is_active()
    }

    /// Clock the timer (every CPU cycle)
    pub fn clock_timer(&mut self) {
        if self.timer.clock()
            && self.is_active()
            && self.linear_counter.is_active()
        {
            self.sequence_position = (self.sequence_position + 1) % 32;
        }
    }

    /// Quarter-frame clock
    pub fn clock_linear_counter(&mut self) {
        self.linear_counter.clock();
    }

    /// Half-frame clock
    pub fn clock_length_counter(&mut self) {
        self.length_counter.clock();
    }

    /// Current output level (0-15); holds when the sequencer is gated
    pub fn output(&self) -> u8 {
        TRIANGLE_SEQUENCE[self.sequence_position as usize]
    }
}

impl Default for TriangleChannel {
    fn default() -> Self {
        Self::new()
    }
}
