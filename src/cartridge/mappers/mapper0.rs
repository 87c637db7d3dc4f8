// Mapper 0 (NROM) - The simplest cartridge board, no banking at all
//
// Memory Layout:
// - CPU $6000-$7FFF: 8KB PRG-RAM (Family BASIC boards; always present here)
// - CPU $8000-$BFFF: First 16KB of PRG-ROM
// - CPU $C000-$FFFF: Last 16KB of PRG-ROM (mirror of first on 16KB boards)
// - PPU $0000-$1FFF: 8KB CHR-ROM or CHR-RAM

use crate::cartridge::mappers::{check_snapshot_len, MapperError};
use crate::cartridge::{Cartridge, Mapper, Mirroring};

/// PRG-RAM size (8KB)
const PRG_RAM_SIZE: usize = 8 * 1024;

/// Mapper 0 implementation (NROM)
///
/// Used by early titles such as Super Mario Bros., Donkey Kong, and most
/// of the accuracy test ROMs this core is validated against.
pub struct Mapper0 {
    /// PRG-ROM data (16KB or 32KB)
    prg_rom: Vec<u8>,
    /// CHR-ROM or CHR-RAM data
    chr_mem: Vec<u8>,
    /// PRG-RAM (used by test ROMs for their result protocol)
    prg_ram: Vec<u8>,
    /// Whether CHR memory is writable
    chr_is_ram: bool,
    /// Fixed mirroring from the header
    mirroring: Mirroring,
}

impl Mapper0 {
    /// Create a new Mapper0 instance from a cartridge
    pub fn new(cartridge: Cartridge) -> Self {
        let chr_is_ram = cartridge.uses_chr_ram();
        let chr_mem = cartridge.chr_mem();

        Mapper0 {
            prg_rom: cartridge.prg_rom,
            chr_mem,
            prg_ram: vec![0; PRG_RAM_SIZE],
            chr_is_ram,
            mirroring: cartridge.mirroring,
        }
    }
}

impl Mapper for Mapper0 {
    fn cpu_read(&self, address: u16) -> u8 {
        match address {
            0x6000..=0x7FFF => self.prg_ram[(address - 0x6000) as usize],
            0x8000..=0xFFFF => {
                // 16KB boards mirror $8000-$BFFF into $C000-$FFFF
                let index = (address - 0x8000) as usize % self.prg_rom.len();
                self.prg_rom[index]
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, address: u16, value: u8) {
        if let 0x6000..=0x7FFF = address {
            self.prg_ram[(address - 0x6000) as usize] = value;
        }
        // Writes to ROM are dropped; NROM has no registers
    }

    fn ppu_read(&self, address: u16) -> u8 {
        match address {
            0x0000..=0x1FFF => self.chr_mem[address as usize % self.chr_mem.len()],
            _ => 0,
        }
    }

    fn ppu_write(&mut self, address: u16, value: u8) {
        if self.chr_is_ram {
            if let 0x0000..=0x1FFF = address {
                let len = self.chr_mem.len();
                self.chr_mem[address as usize % len] = value;
            }
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn serialize(&self) -> Vec<u8> {
        // NROM has no registers; the snapshot is PRG-RAM plus CHR-RAM
        let mut data = self.prg_ram.clone();
        if self.chr_is_ram {
            data.extend_from_slice(&self.chr_mem);
        }
        data
    }

    fn deserialize(&mut self, data: &[u8]) -> Result<(), MapperError> {
        let chr_len = if self.chr_is_ram { self.chr_mem.len() } else { 0 };
        check_snapshot_len(data, PRG_RAM_SIZE + chr_len)?;

        self.prg_ram.copy_from_slice(&data[..PRG_RAM_SIZE]);
        if self.chr_is_ram {
            self.chr_mem.copy_from_slice(&data[PRG_RAM_SIZE..]);
        }
        Ok(())
    }

    fn prg_ram(&self) -> Option<&[u8]> {
        Some(&self.prg_ram)
    }

    fn prg_ram_mut(&mut self) -> Option<&mut [u8]> {
        Some(&mut self.prg_ram)
    }
}
