//! DMC (delta modulation channel) implementation
//!
//! The channel plays 1-bit delta samples fetched from CPU memory. It
//! cannot read the bus itself: `needs_sample_read` reports the address it
//! wants and the bus feeds the byte back through `load_sample_byte`,
//! charging the CPU the 4-cycle DMA stall.

use crate::apu::components::Timer;
use crate::apu::constants::DMC_RATE_TABLE;

/// DMC channel for sample playback
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DmcChannel {
    /// Enabled flag (from $4015)
    pub(crate) enabled: bool,
    /// IRQ enable flag ($4010 bit 7)
    pub(crate) irq_enabled: bool,
    /// Loop flag ($4010 bit 6)
    pub(crate) loop_flag: bool,
    /// Rate timer
    pub(crate) timer: Timer,

    /// Sample start address ($C000 + value * 64)
    pub(crate) sample_address: u16,
    /// Sample length (value * 16 + 1 bytes)
    pub(crate) sample_length: u16,
    /// Address of the next byte to fetch
    pub(crate) current_address: u16,
    /// Bytes left in the current sample
    pub(crate) bytes_remaining: u16,

    /// One-byte sample buffer between the DMA reader and the shifter
    sample_buffer: u8,
    /// The buffer is waiting for a DMA fill
    sample_buffer_empty: bool,
    /// Output shift register
    shift_register: u8,
    /// Bits left in the shift register (0-8)
    bits_remaining: u8,
    /// 7-bit output level (0-127)
    output_level: u8,
    /// Silence flag: the current output cycle has no sample data
    silence: bool,
    /// IRQ pending flag
    pub(crate) irq_flag: bool,
}

impl DmcChannel {
    pub fn new() -> Self {
        Self {
            enabled: false,
            irq_enabled: false,
            loop_flag: false,
            timer: Timer::new(),
            sample_address: 0xC000,
            sample_length: 0,
            current_address: 0xC000,
            bytes_remaining: 0,
            sample_buffer: 0,
            sample_buffer_empty: true,
            shift_register: 0,
            bits_remaining: 0,
            output_level: 0,
            silence: true,
            irq_flag: false,
        }
    }

    /// Write register 0 ($4010: IRQ enable, loop, rate index)
    pub fn write_register_0(&mut self, data: u8) {
        self.irq_enabled = data & 0x80 != 0;
        self.loop_flag = data & 0x40 != 0;
        if !self.irq_enabled {
            self.irq_flag = false;
        }

        let rate = DMC_RATE_TABLE[(data & 0x0F) as usize];
        // The timer counts rate-1 then wraps, giving `rate` cycles per clock
        self.timer.set_period_direct(rate - 1);
    }

    /// Write register 1 ($4011: direct output load, 7 bits)
    pub fn write_register_1(&mut self, data: u8) {
        self.output_level = data & 0x7F;
    }

    /// Write register 2 ($4012: sample start address)
    pub fn write_register_2(&mut self, data: u8) {
        self.sample_address = 0xC000 + ((data as u16) << 6);
    }

    /// Write register 3 ($4013: sample length)
    pub fn write_register_3(&mut self, data: u8) {
        self.sample_length = ((data as u16) << 4) + 1;
    }

    /// Set the enabled flag (from $4015)
    ///
    /// Disabling stops the sample; enabling restarts it when finished.
    /// Either way the write clears the DMC IRQ.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.bytes_remaining = 0;
        } else if self.bytes_remaining == 0 {
            self.restart_sample();
        }
    }

    fn restart_sample(&mut self) {
        self.current_address = self.sample_address;
        self.bytes_remaining = self.sample_length;
    }

    /// Whether bytes remain in the current sample
    pub fn is_active(&self) -> bool {
        self.bytes_remaining > 0
    }

    pub fn irq_pending(&self) -> bool {
        self.irq_flag
    }

    pub fn clear_irq(&mut self) {
        self.irq_flag = false;
    }

    /// Address of the DMA fetch the channel is waiting on, if any
    pub fn needs_sample_read(&self) -> Option<u16> {
        if self.sample_buffer_empty && self.bytes_remaining > 0 {
            Some(self.current_address)
        } else {
            None
        }
    }

    /// Deliver a DMA-fetched sample byte
    ///
    /// Advances the address (wrapping $FFFF to $8000) and ends or loops
    /// the sample when the last byte arrives.
    pub fn load_sample_byte(&mut self, byte: u8) {
        if self.bytes_remaining == 0 {
            return;
        }

        self.sample_buffer = byte;
        self.sample_buffer_empty = false;

        self.current_address = match self.current_address {
            0xFFFF => 0x8000,
            addr => addr + 1,
        };
        self.bytes_remaining -= 1;

        if self.bytes_remaining == 0 {
            if self.loop_flag {
                self.restart_sample();
            } else if self.irq_enabled {
                self.irq_flag = true;
            }
        }
    }

    /// Clock the rate timer (every CPU cycle)
    pub fn clock_timer(&mut self) {
        if self.timer.clock() {
            self.clock_output_unit();
        }
    }

    /// One output-unit cycle: refill the shifter if needed, then slew the
    /// output level by the next delta bit.
    fn clock_output_unit(&mut self) {
        if self.bits_remaining == 0 {
            self.bits_remaining = 8;
            if self.sample_buffer_empty {
                self.silence = true;
            } else {
                self.silence = false;
                self.shift_register = self.sample_buffer;
                self.sample_buffer_empty = true;
            }
        }

        if !self.silence {
            if self.shift_register & 0x01 != 0 {
                if self.output_level <= 125 {
                    self.output_level += 2;
                }
            } else if self.output_level >= 2 {
                self.output_level -= 2;
            }
        }

        self.shift_register >>= 1;
        self.bits_remaining -= 1;
    }

    /// Current output level (0-127)
    pub fn output(&self) -> u8 {
        self.output_level
    }
}

impl Default for DmcChannel {
    fn default() -> Self {
        Self::new()
    }
}
