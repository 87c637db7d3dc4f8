// Save state functionality
//
// Serializes the complete system (CPU, PPU, APU, bus, mapper blob) into a
// versioned JSON document. Restoring validates everything before mutating
// anything, so a bad state never leaves the running system half-loaded.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Emulator, EmulatorConfig};
use crate::apu::ApuState;
use crate::bus::BusState;
use crate::ppu::PpuState;

/// Current save state format version
const SAVE_STATE_VERSION: u32 = 1;

/// Errors from save state operations
#[derive(Debug, Error)]
pub enum SaveStateError {
    /// I/O error reading or writing a slot file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Save state was written by a different format version
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// Save state belongs to a cartridge with a different mapper
    #[error("mapper mismatch: expected {expected}, found {found}")]
    MapperMismatch { expected: u8, found: u8 },

    /// Buffer lengths inside the state do not match this system
    #[error("save state is corrupt or incompatible")]
    Corrupt,
}

/// CPU registers for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CpuState {
    a: u8,
    x: u8,
    y: u8,
    sp: u8,
    pc: u16,
    status: u8,
    cycles: u64,
}

/// Complete system save state
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveState {
    /// Format version for compatibility checking
    version: u32,
    /// Creation time (RFC 3339)
    timestamp: String,
    /// Mapper number the state belongs to
    mapper_id: u8,
    /// CPU registers
    cpu: CpuState,
    /// PPU snapshot
    ppu: PpuState,
    /// APU snapshot
    apu: ApuState,
    /// Bus snapshot (RAM, controllers, timing)
    bus: BusState,
    /// Opaque mapper blob (registers + RAM)
    mapper: Vec<u8>,
}

impl SaveState {
    /// Capture the complete state of a running system
    pub fn capture(emulator: &Emulator) -> Self {
        let cpu = emulator.cpu();
        SaveState {
            version: SAVE_STATE_VERSION,
            timestamp: Utc::now().to_rfc3339(),
            mapper_id: emulator.mapper_id(),
            cpu: CpuState {
                a: cpu.a,
                x: cpu.x,
                y: cpu.y,
                sp: cpu.sp,
                pc: cpu.pc,
                status: cpu.status,
                cycles: cpu.cycles,
            },
            ppu: emulator.bus().ppu().save_state(),
            apu: emulator.bus().apu().save_state(),
            bus: emulator.bus().save_state(),
            mapper: emulator.mapper().borrow().serialize(),
        }
    }

    /// Restore this state into a running system
    ///
    /// All validation happens before the first mutation; any error leaves
    /// the system exactly as it was.
    pub fn restore(&self, emulator: &mut Emulator) -> Result<(), SaveStateError> {
        if self.version != SAVE_STATE_VERSION {
            return Err(SaveStateError::VersionMismatch {
                expected: SAVE_STATE_VERSION,
                found: self.version,
            });
        }
        if self.mapper_id != emulator.mapper_id() {
            return Err(SaveStateError::MapperMismatch {
                expected: emulator.mapper_id(),
                found: self.mapper_id,
            });
        }
        if !self.ppu.is_valid() || !self.bus.is_valid() {
            return Err(SaveStateError::Corrupt);
        }
        // The blob length must match what this mapper would produce
        if self.mapper.len() != emulator.mapper().borrow().serialize().len() {
            return Err(SaveStateError::Corrupt);
        }

        emulator
            .mapper()
            .borrow_mut()
            .deserialize(&self.mapper)
            .map_err(|_| SaveStateError::Corrupt)?;

        let bus = emulator.bus_mut();
        bus.ppu_mut().load_state(&self.ppu);
        bus.apu_mut().load_state(&self.apu);
        bus.load_state(&self.bus);

        let cpu = emulator.cpu_mut();
        cpu.a = self.cpu.a;
        cpu.x = self.cpu.x;
        cpu.y = self.cpu.y;
        cpu.sp = self.cpu.sp;
        cpu.pc = self.cpu.pc;
        cpu.status = self.cpu.status;
        cpu.cycles = self.cpu.cycles;

        Ok(())
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveStateError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, SaveStateError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Write into a numbered slot file under the configured directory
    pub fn save_to_slot(&self, config: &EmulatorConfig, slot: u8) -> Result<(), SaveStateError> {
        let path = Self::slot_path(config, slot);
        fs::create_dir_all(&config.save_state.save_directory)?;
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read from a numbered slot file
    pub fn load_from_slot(config: &EmulatorConfig, slot: u8) -> Result<Self, SaveStateError> {
        let data = fs::read(Self::slot_path(config, slot))?;
        Self::from_bytes(&data)
    }

    fn slot_path(config: &EmulatorConfig, slot: u8) -> PathBuf {
        config
            .save_state
            .save_directory
            .join(format!("slot_{}.state", slot))
    }
}
