//! Pulse wave channel implementation

use crate::apu::components::{Envelope, LengthCounter, Sweep, Timer};
use crate::apu::constants::DUTY_PATTERNS;

/// Pulse wave channel (used for both Pulse 1 and Pulse 2)
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PulseChannel {
    /// Enabled flag (from $4015)
    pub(crate) enabled: bool,
    /// Duty cycle (0-3)
    pub(crate) duty: u8,
    /// Duty cycle sequence position (0-7)
    duty_position: u8,
    /// Envelope generator
    pub(crate) envelope: Envelope,
    /// Sweep unit
    pub(crate) sweep: Sweep,
    /// Length counter
    pub(crate) length_counter: LengthCounter,
    /// Timer (clocked at half CPU rate)
    pub(crate) timer: Timer,
}

impl PulseChannel {
    /// Create a new pulse channel
    /// `channel_number` is 1 or 2 and selects the sweep negate flavor
    pub fn new(channel_number: u8) -> Self {
        Self {
            enabled: false,
            duty: 0,
            duty_position: 0,
            envelope: Envelope::new(),
            sweep: Sweep::new(channel_number),
            length_counter: LengthCounter::new(),
            timer: Timer::new(),
        }
    }

    /// Write register 0 (duty, halt/loop, envelope)
    pub fn write_register_0(&mut self, data: u8) {
        self.duty = (data >> 6) & 0x03;
        self.length_counter.set_halt((data & 0x20) != 0);
        self.envelope.write_control(data);
    }

    /// Write register 1 (sweep unit)
    pub fn write_register_1(&mut self, data: u8) {
        self.sweep.write_control(data);
    }

    /// Write register 2 (timer low byte)
    pub fn write_register_2(&mut self, data: u8) {
        let high = (self.timer.period >> 8) as u8;
        self.timer.set_period(data, high);
    }

    /// Write register 3 (length counter load and timer high bits)
    pub fn write_register_3(&mut self, data: u8) {
        let low = self.timer.period as u8;
        self.timer.set_period(low, data & 0x07);

        if self.enabled {
            self.length_counter.load(data >> 3);
        }

        self.envelope.restart();
        self.duty_position = 0;
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

    /// Clock the timer (every other CPU cycle); advances the duty step
    pub fn clock_timer(&mut self) {
        if self.timer.clock() {
            self.duty_position = (self.duty_position + 1) % 8;
        }
    }

    /// Quarter-frame clock
    pub fn clock_envelope(&mut self) {
        self.envelope.clock();
    }

    /// Half-frame clock
    pub fn clock_length_counter(&mut self) {
        self.length_counter.clock();
    }

    /// Half-frame clock; may retune the timer
    pub fn clock_sweep(&mut self) {
        if let Some(new_period) = self.sweep.clock(self.timer.period) {
            self.timer.set_period_direct(new_period);
        }
    }

    /// Current output sample (0 or the envelope volume)
    pub fn output(&self) -> u8 {
        if !self.is_active() {
            return 0;
        }
        if self.sweep.is_muting(self.timer.period) {
            return 0;
        }

        let duty_output = DUTY_PATTERNS[self.duty as usize][self.duty_position as usize];
        if duty_output == 0 {
            0
        } else {
            self.envelope.volume()
        }
    }
}
