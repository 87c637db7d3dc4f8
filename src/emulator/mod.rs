// Emulator module - System integrator
//
// Ties the CPU, bus (PPU + APU + controllers), and mapper together and
// drives them in lockstep: each `step` runs one CPU instruction, then
// advances the PPU three dots and the APU one cycle per CPU cycle, and
// drains any DMA stall cycles (OAM DMA, DMC fetches) the same way before
// the next instruction dispatches.

mod config;
mod save_state;

pub use config::{AudioConfig, EmulatorConfig, SaveStateConfig};
pub use save_state::{SaveState, SaveStateError};

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use thiserror::Error;

use crate::bus::Bus;
use crate::cartridge::{create_mapper, Cartridge, INesError, Mapper, MapperError};
use crate::cpu::Cpu;
use crate::input::Button;

/// Errors surfaced while bringing a cartridge up
#[derive(Debug, Error)]
pub enum LoadError {
    /// The iNES image was malformed
    #[error(transparent)]
    Format(#[from] INesError),

    /// The image asks for a mapper outside the supported set
    #[error(transparent)]
    Mapper(#[from] MapperError),
}

/// Main emulator structure
///
/// Owns every component; all mutation flows through `step`, `run_frame`,
/// and the register-level accessors.
pub struct Emulator {
    /// CPU (2A03 core)
    cpu: Cpu,
    /// Bus: RAM, PPU, APU, controllers, mapper window
    bus: Bus,
    /// Mapper handle shared with the bus and PPU
    mapper: Rc<RefCell<Box<dyn Mapper>>>,
    /// Configuration
    config: EmulatorConfig,
    /// Mapper number, kept for save-state validation
    mapper_id: u8,
    /// The board has battery-backed PRG RAM worth persisting
    has_battery: bool,
}

impl Emulator {
    /// Build a system around a parsed cartridge and run the reset sequence
    pub fn new(cartridge: Cartridge) -> Result<Self, LoadError> {
        let mapper_id = cartridge.mapper;
        let has_battery = cartridge.has_battery;
        let mirroring = cartridge.mirroring;

        let mapper = Rc::new(RefCell::new(create_mapper(cartridge)?));

        let mut bus = Bus::new();
        bus.ppu_mut().set_mirroring(mirroring);
        bus.attach_mapper(mapper.clone());

        let mut emulator = Emulator {
            cpu: Cpu::new(),
            bus,
            mapper,
            config: EmulatorConfig::load_or_default(),
            mapper_id,
            has_battery,
        };
        emulator.reset();
        Ok(emulator)
    }

    /// Build a system straight from iNES image bytes
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, LoadError> {
        Self::new(Cartridge::from_ines_bytes(data)?)
    }

    /// Build a system from an iNES file on disk
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Self::new(Cartridge::from_ines_file(path)?)
    }

    /// Press the reset button
    ///
    /// The CPU re-reads the reset vector (7 cycles), the PPU clears its
    /// control registers, and the APU silences all channels.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        self.bus.ppu_mut().reset();
        self.bus.apu_mut().reset();
        // The PPU and APU run through the 7-cycle reset sequence, which
        // also keeps the bus cycle counter in phase with the CPU's
        self.bus.tick(crate::cpu::INTERRUPT_CYCLES as u32);
    }

    /// Execute one CPU instruction (or interrupt sequence)
    ///
    /// Returns the total CPU cycles consumed, including DMA stalls. The
    /// PPU and APU tick through stalls too: the CPU is the only component
    /// the DMA halts.
    pub fn step(&mut self) -> u32 {
        let executed = self.cpu.step(&mut self.bus) as u32;
        let mut total = executed;
        self.bus.tick(executed);

        // Stall cycles accumulate from a $4014 write during the
        // instruction or DMC fetches during the ticks just issued; both
        // are accounted before the next instruction dispatches.
        loop {
            let stall = self.bus.take_dma_stall();
            if stall == 0 {
                break;
            }
            self.cpu.cycles += stall as u64;
            total += stall;
            self.bus.tick(stall);
        }

        total
    }

    /// Run until the next frame is published (VBlank start)
    pub fn run_frame(&mut self) {
        loop {
            self.step();
            if self.bus.ppu_mut().take_frame_complete() {
                break;
            }
        }
    }

    /// Update one controller button
    pub fn set_button(&mut self, port: usize, button: Button, pressed: bool) {
        self.bus.controllers.set_button(port, button, pressed);
    }

    /// The published 256×240 framebuffer of 6-bit palette indices
    ///
    /// Valid for reading between VBlank start and the next `run_frame`.
    pub fn framebuffer(&self) -> &[u8] {
        self.bus.ppu().frame()
    }

    /// The most recent mixed audio sample, in [0, 1]
    pub fn audio_sample(&self) -> f32 {
        self.bus.apu().sample()
    }

    /// Drain the per-CPU-cycle audio sample buffer
    pub fn take_audio_samples(&mut self) -> Vec<f32> {
        self.bus.apu_mut().take_samples()
    }

    /// One nestest-format trace line for the next instruction
    pub fn trace(&self) -> String {
        self.cpu.trace(&self.bus)
    }

    /// Serialize the complete system state to bytes
    pub fn save_state_bytes(&self) -> Result<Vec<u8>, SaveStateError> {
        SaveState::capture(self).to_bytes()
    }

    /// Restore the system from bytes produced by `save_state_bytes`
    ///
    /// On error the running system is left untouched.
    pub fn load_state_bytes(&mut self, data: &[u8]) -> Result<(), SaveStateError> {
        SaveState::from_bytes(data)?.restore(self)
    }

    /// Save the system state into a numbered slot file
    pub fn save_state_slot(&self, slot: u8) -> Result<(), SaveStateError> {
        SaveState::capture(self).save_to_slot(&self.config, slot)
    }

    /// Load the system state from a numbered slot file
    pub fn load_state_slot(&mut self, slot: u8) -> Result<(), SaveStateError> {
        SaveState::load_from_slot(&self.config, slot)?.restore(self)
    }

    /// Battery-backed PRG RAM contents, when the board persists them
    pub fn battery_ram(&self) -> Option<Vec<u8>> {
        if !self.has_battery {
            return None;
        }
        self.mapper.borrow().prg_ram().map(<[u8]>::to_vec)
    }

    /// Restore battery-backed PRG RAM (after `battery_ram` from a prior run)
    pub fn set_battery_ram(&mut self, data: &[u8]) {
        if let Some(ram) = self.mapper.borrow_mut().prg_ram_mut() {
            let len = ram.len().min(data.len());
            ram[..len].copy_from_slice(&data[..len]);
        }
    }

    /// Get reference to CPU
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Get mutable reference to CPU
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// Get reference to Bus
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Get mutable reference to Bus
    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Get reference to configuration
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Get mutable reference to configuration
    pub fn config_mut(&mut self) -> &mut EmulatorConfig {
        &mut self.config
    }

    pub(crate) fn mapper(&self) -> &Rc<RefCell<Box<dyn Mapper>>> {
        &self.mapper
    }

    pub(crate) fn mapper_id(&self) -> u8 {
        self.mapper_id
    }
}
