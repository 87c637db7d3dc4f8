//! Frame counter for the APU
//!
//! A CPU-rate divider that produces the quarter-frame and half-frame
//! clocks driving envelopes, linear counters, length counters, and sweep
//! units, and the frame IRQ in 4-step mode.

use crate::apu::constants::{
    FRAME_COUNTER_4_STEP_CYCLES, FRAME_COUNTER_4_STEP_PERIOD, FRAME_COUNTER_5_STEP_CYCLES,
    FRAME_COUNTER_5_STEP_PERIOD,
};

/// Clocks produced by one frame-counter tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSignals {
    /// Clock envelopes and the triangle linear counter
    pub quarter: bool,
    /// Additionally clock length counters and sweep units
    pub half: bool,
}

/// Frame counter sequencer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FrameMode {
    /// 4-step mode (default), generates the frame IRQ
    FourStep,
    /// 5-step mode, no IRQ
    FiveStep,
}

/// Frame counter state
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FrameCounter {
    /// Current mode
    mode: FrameMode,
    /// CPU cycles into the current frame
    cycle: u32,
    /// Next step boundary to fire (0-3 or 0-4)
    step: usize,
    /// IRQ inhibit flag ($4017 bit 6)
    irq_inhibit: bool,
    /// Frame interrupt flag; holds until $4015 is read
    irq_pending: bool,
}

impl FrameCounter {
    /// New frame counter in 4-step mode
    pub fn new() -> Self {
        Self {
            mode: FrameMode::FourStep,
            cycle: 0,
            step: 0,
            irq_inhibit: false,
            irq_pending: false,
        }
    }

    pub fn reset(&mut self) {
        self.mode = FrameMode::FourStep;
        self.cycle = 0;
        self.step = 0;
        self.irq_inhibit = false;
        self.irq_pending = false;
    }

    /// Write $4017
    ///
    /// Bit 7 selects 5-step mode, bit 6 inhibits (and clears) the frame
    /// IRQ. The sequence restarts, and entering 5-step mode clocks a
    /// quarter+half frame immediately.
    pub fn write_control(&mut self, value: u8) -> FrameSignals {
        self.mode = if value & 0x80 != 0 {
            FrameMode::FiveStep
        } else {
            FrameMode::FourStep
        };
        self.irq_inhibit = value & 0x40 != 0;
        if self.irq_inhibit {
            self.irq_pending = false;
        }

        self.cycle = 0;
        self.step = 0;

        if self.mode == FrameMode::FiveStep {
            FrameSignals {
                quarter: true,
                half: true,
            }
        } else {
            FrameSignals::default()
        }
    }

    /// Advance one CPU cycle
    pub fn clock(&mut self) -> FrameSignals {
        self.cycle += 1;

        match self.mode {
            FrameMode::FourStep => self.clock_4_step(),
            FrameMode::FiveStep => self.clock_5_step(),
        }
    }

    fn clock_4_step(&mut self) -> FrameSignals {
        let mut signals = FrameSignals::default();

        if self.step < 4 && self.cycle == FRAME_COUNTER_4_STEP_CYCLES[self.step] {
            signals.quarter = true;
            // Steps 1 and 3 are the half-frame boundaries
            if self.step % 2 == 1 {
                signals.half = true;
            }
            if self.step == 3 && !self.irq_inhibit {
                self.irq_pending = true;
            }
            self.step += 1;
        }

        if self.cycle >= FRAME_COUNTER_4_STEP_PERIOD {
            // The flag is also raised on the wrap cycle itself
            if !self.irq_inhibit {
                self.irq_pending = true;
            }
            self.cycle = 0;
            self.step = 0;
        }

        signals
    }

    fn clock_5_step(&mut self) -> FrameSignals {
        let mut signals = FrameSignals::default();

        if self.step < 5 && self.cycle == FRAME_COUNTER_5_STEP_CYCLES[self.step] {
            // Step 3 (cycle 29829) produces no clocks in 5-step mode
            match self.step {
                0 | 2 => signals.quarter = true,
                1 | 4 => {
                    signals.quarter = true;
                    signals.half = true;
                }
                _ => {}
            }
            self.step += 1;
        }

        if self.cycle >= FRAME_COUNTER_5_STEP_PERIOD {
            self.cycle = 0;
            self.step = 0;
        }

        signals
    }

    /// Whether the frame IRQ is pending
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    /// Clear the frame IRQ flag ($4015 read)
    pub fn clear_irq(&mut self) {
        self.irq_pending = false;
    }

    pub fn mode(&self) -> FrameMode {
        self.mode
    }

    pub fn irq_inhibited(&self) -> bool {
        self.irq_inhibit
    }
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new()
    }
}
