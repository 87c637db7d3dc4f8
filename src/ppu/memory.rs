// PPU memory access: VRAM mirroring, palette aliasing, mapper coupling
//
// Every access that drives the PPU address bus is reported to the mapper
// together with a free-running dot counter; MMC3 recovers its filtered A12
// rising edges from that stream.

use super::constants::NAMETABLE_SIZE;
use super::Ppu;
use crate::cartridge::Mirroring;

impl Ppu {
    /// Mirroring currently in force (the mapper can change it at runtime)
    pub(crate) fn current_mirroring(&self) -> Mirroring {
        match &self.mapper {
            Some(mapper) => mapper.borrow().mirroring(),
            None => self.default_mirroring,
        }
    }

    /// Map a nametable address ($2000-$2FFF) into VRAM
    ///
    /// The console has 2 KiB of VRAM aliased across the 4 KiB nametable
    /// window; four-screen boards address the full 4 KiB.
    pub(super) fn mirror_nametable_addr(&self, addr: u16) -> usize {
        let addr = (addr & 0x0FFF) as usize;
        let table = addr / NAMETABLE_SIZE;
        let offset = addr % NAMETABLE_SIZE;

        let mirrored_table = match self.current_mirroring() {
            // $2000=$2400, $2800=$2C00
            Mirroring::Horizontal => table / 2,
            // $2000=$2800, $2400=$2C00
            Mirroring::Vertical => table % 2,
            Mirroring::SingleScreenLower => 0,
            Mirroring::SingleScreenUpper => 1,
            Mirroring::FourScreen => table,
        };

        mirrored_table * NAMETABLE_SIZE + offset
    }

    /// Map a palette address ($3F00-$3FFF) into the 32-byte palette RAM
    ///
    /// $3F10/$3F14/$3F18/$3F1C alias $3F00/$3F04/$3F08/$3F0C: sprite
    /// palette entry 0 is the shared backdrop color.
    pub(super) fn mirror_palette_addr(&self, addr: u16) -> usize {
        let addr = (addr & 0x001F) as usize;
        if addr >= 16 && addr % 4 == 0 {
            addr - 16
        } else {
            addr
        }
    }

    /// Report an address-bus transition to the mapper
    pub(super) fn notify_mapper(&mut self, addr: u16) {
        if let Some(mapper) = &self.mapper {
            mapper.borrow_mut().ppu_address_notify(addr & 0x3FFF, self.dot_counter);
        }
    }

    /// Read from PPU memory, driving the address bus
    pub(crate) fn read_ppu_memory(&mut self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        self.notify_mapper(addr);

        match addr {
            // Pattern tables live on the cartridge
            0x0000..=0x1FFF => match &self.mapper {
                Some(mapper) => mapper.borrow().ppu_read(addr),
                None => 0,
            },

            0x2000..=0x2FFF => self.nametables[self.mirror_nametable_addr(addr)],

            // $3000-$3EFF mirrors $2000-$2EFF
            0x3000..=0x3EFF => self.nametables[self.mirror_nametable_addr(addr - 0x1000)],

            0x3F00..=0x3FFF => self.palette_ram[self.mirror_palette_addr(addr)],

            _ => unreachable!(),
        }
    }

    /// Write to PPU memory, driving the address bus
    pub(crate) fn write_ppu_memory(&mut self, addr: u16, data: u8) {
        let addr = addr & 0x3FFF;
        self.notify_mapper(addr);

        match addr {
            0x0000..=0x1FFF => {
                if let Some(mapper) = &self.mapper {
                    mapper.borrow_mut().ppu_write(addr, data);
                }
            }

            0x2000..=0x2FFF => {
                let index = self.mirror_nametable_addr(addr);
                self.nametables[index] = data;
            }

            0x3000..=0x3EFF => {
                let index = self.mirror_nametable_addr(addr - 0x1000);
                self.nametables[index] = data;
            }

            0x3F00..=0x3FFF => {
                let index = self.mirror_palette_addr(addr);
                self.palette_ram[index] = data;
            }

            _ => unreachable!(),
        }
    }
}
