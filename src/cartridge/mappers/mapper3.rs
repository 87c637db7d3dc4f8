// Mapper 3 (CNROM) - CHR bank switching only
//
// Memory Layout:
// - CPU $8000-$FFFF: 16KB or 32KB PRG-ROM, not banked (16KB mirrored)
// - PPU $0000-$1FFF: 8KB CHR-ROM bank (switchable)
//
// Any write to $8000-$FFFF selects the 8KB CHR bank.

use crate::cartridge::mappers::{check_snapshot_len, MapperError};
use crate::cartridge::{Cartridge, Mapper, Mirroring};

/// CHR bank size (8KB)
const CHR_BANK_SIZE: usize = 8 * 1024;

/// Mapper 3 implementation (CNROM)
///
/// Used by titles such as Arkanoid, Gradius, and Solomon's Key.
pub struct Mapper3 {
    /// PRG-ROM data (16KB or 32KB)
    prg_rom: Vec<u8>,
    /// CHR-ROM data
    chr_mem: Vec<u8>,
    /// Selected 8KB CHR bank
    chr_bank: u8,
    /// Fixed mirroring from the header
    mirroring: Mirroring,
}

impl Mapper3 {
    /// Create a new Mapper3 instance from a cartridge
    pub fn new(cartridge: Cartridge) -> Self {
        let chr_mem = cartridge.chr_mem();

        Mapper3 {
            prg_rom: cartridge.prg_rom,
            chr_mem,
            chr_bank: 0,
            mirroring: cartridge.mirroring,
        }
    }
}

impl Mapper for Mapper3 {
    fn cpu_read(&self, address: u16) -> u8 {
        match address {
            0x8000..=0xFFFF => {
                let index = (address - 0x8000) as usize % self.prg_rom.len();
                self.prg_rom[index]
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, address: u16, value: u8) {
        if let 0x8000..=0xFFFF = address {
            self.chr_bank = value;
        }
    }

    fn ppu_read(&self, address: u16) -> u8 {
        match address {
            0x0000..=0x1FFF => {
                let banks = self.chr_mem.len() / CHR_BANK_SIZE;
                let bank = self.chr_bank as usize % banks.max(1);
                self.chr_mem[bank * CHR_BANK_SIZE + address as usize]
            }
            _ => 0,
        }
    }

    fn ppu_write(&mut self, _address: u16, _value: u8) {
        // CNROM boards carry CHR-ROM; writes are dropped
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn serialize(&self) -> Vec<u8> {
        vec![self.chr_bank]
    }

    fn deserialize(&mut self, data: &[u8]) -> Result<(), MapperError> {
        check_snapshot_len(data, 1)?;
        self.chr_bank = data[0];
        Ok(())
    }
}
