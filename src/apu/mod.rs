// APU module - Audio Processing Unit (2A03) implementation
//
// The APU is five channels plus a frame counter. The channels own their
// envelope/sweep/length/timer components (see `components`); this module
// routes register traffic, distributes the frame counter's quarter- and
// half-frame clocks, runs the mixer, and exposes the two IRQ sources.
//
// ## Register Map
//
// | Address       | Channel   | Registers                                |
// |---------------|-----------|------------------------------------------|
// | $4000-$4003   | Pulse 1   | duty/envelope, sweep, timer lo, len/hi   |
// | $4004-$4007   | Pulse 2   | duty/envelope, sweep, timer lo, len/hi   |
// | $4008-$400B   | Triangle  | linear, -, timer lo, len/hi              |
// | $400C-$400F   | Noise     | envelope, -, mode/period, len            |
// | $4010-$4013   | DMC       | flags/rate, direct load, address, length |
// | $4015         | Status    | enables (W), lengths + IRQ flags (R)     |
// | $4017         | Frame     | frame counter mode (W)                   |
//
// One CPU cycle = one `tick`. The triangle, noise, and DMC timers run at
// CPU rate; the pulse timers divide by two. DMC sample fetches cannot be
// performed here (the APU has no bus access): the bus polls
// `dmc_fetch_address` and feeds bytes back, charging the 4-cycle stall.

pub mod channels;
pub mod components;
pub mod constants;

#[cfg(test)]
mod tests;

use channels::{DmcChannel, NoiseChannel, PulseChannel, TriangleChannel};
use components::{FrameCounter, FrameSignals};

/// APU structure holding the five channels and the frame counter
pub struct Apu {
    pulse1: PulseChannel,
    pulse2: PulseChannel,
    triangle: TriangleChannel,
    noise: NoiseChannel,
    dmc: DmcChannel,
    frame_counter: FrameCounter,

    /// CPU cycles elapsed; parity gates the pulse timers
    cycle: u64,
    /// Mixed output, one sample per CPU cycle
    samples: Vec<f32>,
    /// Most recent mixed sample
    last_sample: f32,
}

/// Drop the oldest half of the sample buffer once it reaches this size;
/// a host that drains audio every frame never gets near it.
const MAX_PENDING_SAMPLES: usize = 1 << 18;

impl Apu {
    /// Create a new APU in the power-on state (all channels silent)
    pub fn new() -> Self {
        Apu {
            pulse1: PulseChannel::new(1),
            pulse2: PulseChannel::new(2),
            triangle: TriangleChannel::new(),
            noise: NoiseChannel::new(),
            dmc: DmcChannel::new(),
            frame_counter: FrameCounter::new(),
            cycle: 0,
            samples: Vec::new(),
            last_sample: 0.0,
        }
    }

    /// Reset as the console reset line does: silence all channels
    pub fn reset(&mut self) {
        self.write_register(0x4015, 0x00);
        self.frame_counter.reset();
        self.samples.clear();
        self.last_sample = 0.0;
    }

    /// Advance the APU by one CPU cycle
    pub fn tick(&mut self) {
        let signals = self.frame_counter.clock();
        self.distribute_frame_signals(signals);

        self.triangle.clock_timer();
        self.noise.clock_timer();
        self.dmc.clock_timer();
        if self.cycle % 2 == 1 {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
        }
        self.cycle += 1;

        let sample = self.mix();
        self.last_sample = sample;
        if self.samples.len() >= MAX_PENDING_SAMPLES {
            self.samples.drain(..MAX_PENDING_SAMPLES / 2);
        }
        self.samples.push(sample);
    }

    /// Apply quarter/half-frame clocks to every channel
    fn distribute_frame_signals(&mut self, signals: FrameSignals) {
        if signals.quarter {
            self.pulse1.clock_envelope();
            self.pulse2.clock_envelope();
            self.triangle.clock_linear_counter();
            self.noise.clock_envelope();
        }
        if signals.half {
            self.pulse1.clock_length_counter();
            self.pulse2.clock_length_counter();
            self.triangle.clock_length_counter();
            self.noise.clock_length_counter();

            self.pulse1.clock_sweep();
            self.pulse2.clock_sweep();
        }
    }

    /// Write an APU register ($4000-$4013, $4015, $4017)
    pub fn write_register(&mut self, addr: u16, data: u8) {
        match addr {
            0x4000 => self.pulse1.write_register_0(data),
            0x4001 => self.pulse1.write_register_1(data),
            0x4002 => self.pulse1.write_register_2(data),
            0x4003 => self.pulse1.write_register_3(data),

            0x4004 => self.pulse2.write_register_0(data),
            0x4005 => self.pulse2.write_register_1(data),
            0x4006 => self.pulse2.write_register_2(data),
            0x4007 => self.pulse2.write_register_3(data),

            0x4008 => self.triangle.write_register_0(data),
            0x400A => self.triangle.write_register_2(data),
            0x400B => self.triangle.write_register_3(data),

            0x400C => self.noise.write_register_0(data),
            0x400E => self.noise.write_register_2(data),
            0x400F => self.noise.write_register_3(data),

            0x4010 => self.dmc.write_register_0(data),
            0x4011 => self.dmc.write_register_1(data),
            0x4012 => self.dmc.write_register_2(data),
            0x4013 => self.dmc.write_register_3(data),

            0x4015 => {
                self.pulse1.set_enabled(data & 0x01 != 0);
                self.pulse2.set_enabled(data & 0x02 != 0);
                self.triangle.set_enabled(data & 0x04 != 0);
                self.noise.set_enabled(data & 0x08 != 0);
                self.dmc.set_enabled(data & 0x10 != 0);
                self.dmc.clear_irq();
            }

            0x4017 => {
                let signals = self.frame_counter.write_control(data);
                self.distribute_frame_signals(signals);
            }

            // $4009/$400D do not exist; $4014 belongs to the bus
            _ => {}
        }
    }

    /// Read $4015: channel length status and the two IRQ flags
    ///
    /// Bit layout: `ID.N TQPP` - DMC IRQ, frame IRQ (cleared by this
    /// read), then length-counter/bytes-remaining status per channel.
    pub fn read_status(&mut self) -> u8 {
        let mut status = 0u8;

        if self.pulse1.is_active() {
            status |= 0x01;
        }
        if self.pulse2.is_active() {
            status |= 0x02;
        }
        if self.triangle.is_active() {
            status |= 0x04;
        }
        if self.noise.is_active() {
            status |= 0x08;
        }
        if self.dmc.is_active() {
            status |= 0x10;
        }
        if self.frame_counter.irq_pending() {
            status |= 0x40;
        }
        if self.dmc.irq_pending() {
            status |= 0x80;
        }

        self.frame_counter.clear_irq();
        status
    }

    /// Whether either APU IRQ source is asserted
    pub fn irq_pending(&self) -> bool {
        self.frame_counter.irq_pending() || self.dmc.irq_pending()
    }

    /// Address of a pending DMC sample fetch, if one is due
    pub fn dmc_fetch_address(&self) -> Option<u16> {
        self.dmc.needs_sample_read()
    }

    /// Deliver a DMC sample byte fetched by the bus
    pub fn load_dmc_sample(&mut self, byte: u8) {
        self.dmc.load_sample_byte(byte);
    }

    /// The most recent mixed sample, in [0, 1]
    pub fn sample(&self) -> f32 {
        self.last_sample
    }

    /// Drain the per-cycle sample buffer
    pub fn take_samples(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.samples)
    }

    /// The canonical non-linear mixer
    ///
    /// ```text
    /// pulse_out = 95.88 / (8128 / (p1 + p2) + 100)
    /// tnd_out   = 159.79 / (1 / (t/8227 + n/12241 + d/22638) + 100)
    /// ```
    fn mix(&self) -> f32 {
        let pulse_sum = (self.pulse1.output() + self.pulse2.output()) as f32;
        let pulse_out = if pulse_sum == 0.0 {
            0.0
        } else {
            95.88 / (8128.0 / pulse_sum + 100.0)
        };

        let tnd_sum = self.triangle.output() as f32 / 8227.0
            + self.noise.output() as f32 / 12241.0
            + self.dmc.output() as f32 / 22638.0;
        let tnd_out = if tnd_sum == 0.0 {
            0.0
        } else {
            159.79 / (1.0 / tnd_sum + 100.0)
        };

        pulse_out + tnd_out
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable APU snapshot (the sample buffer is transient output)
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApuState {
    pulse1: PulseChannel,
    pulse2: PulseChannel,
    triangle: TriangleChannel,
    noise: NoiseChannel,
    dmc: DmcChannel,
    frame_counter: FrameCounter,
    cycle: u64,
}

impl Apu {
    /// Capture a snapshot of the APU state
    pub fn save_state(&self) -> ApuState {
        ApuState {
            pulse1: self.pulse1.clone(),
            pulse2: self.pulse2.clone(),
            triangle: self.triangle.clone(),
            noise: self.noise.clone(),
            dmc: self.dmc.clone(),
            frame_counter: self.frame_counter.clone(),
            cycle: self.cycle,
        }
    }

    /// Restore a snapshot
    pub fn load_state(&mut self, state: &ApuState) {
        self.pulse1 = state.pulse1.clone();
        self.pulse2 = state.pulse2.clone();
        self.triangle = state.triangle.clone();
        self.noise = state.noise.clone();
        self.dmc = state.dmc.clone();
        self.frame_counter = state.frame_counter.clone();
        self.cycle = state.cycle;
        self.samples.clear();
        self.last_sample = 0.0;
    }
}
