// PPU test support and submodules

mod registers;

use std::cell::RefCell;
use std::rc::Rc;

use crate::cartridge::{create_mapper, Cartridge, Mapper, Mirroring};
use crate::ppu::Ppu;

/// A PPU wired to an NROM board with 8KB of CHR-RAM, so tests can write
/// pattern data directly.
pub(super) fn ppu_with_chr_ram() -> Ppu {
    let cartridge = Cartridge {
        prg_rom: vec![0; 16 * 1024],
        chr_rom: vec![],
        trainer: None,
        mapper: 0,
        mirroring: Mirroring::Horizontal,
        has_battery: false,
    };
    let mapper = create_mapper(cartridge).unwrap();

    let mut ppu = Ppu::new();
    ppu.set_mapper(Rc::new(RefCell::new(mapper)));
    ppu
}

/// Tick until the PPU sits at the given (scanline, dot)
pub(super) fn tick_to(ppu: &mut Ppu, scanline: u16, dot: u16) {
    while !(ppu.scanline == scanline && ppu.dot == dot) {
        ppu.tick();
    }
}

/// Write a byte into VRAM through the $2006/$2007 interface
pub(super) fn vram_write(ppu: &mut Ppu, addr: u16, data: u8) {
    ppu.write_register(0x2006, (addr >> 8) as u8);
    ppu.write_register(0x2006, addr as u8);
    ppu.write_register(0x2007, data);
}

/// Point the scroll origin back at (0, 0) of nametable 0
///
/// $2006 writes clobber `t`, so tests that set VRAM up through the data
/// port must restore the scroll before enabling rendering.
pub(super) fn reset_scroll(ppu: &mut Ppu) {
    ppu.write_register(0x2000, 0x00);
    ppu.write_register(0x2005, 0x00);
    ppu.write_register(0x2005, 0x00);
}

/// Fill one 8x8 CHR tile with a solid 2-bit color
pub(super) fn fill_tile(ppu: &mut Ppu, tile: u16, color: u8) {
    let lo = if color & 1 != 0 { 0xFF } else { 0x00 };
    let hi = if color & 2 != 0 { 0xFF } else { 0x00 };
    let mapper = ppu.mapper.as_ref().unwrap().clone();
    for row in 0..8 {
        mapper.borrow_mut().ppu_write(tile * 16 + row, lo);
        mapper.borrow_mut().ppu_write(tile * 16 + row + 8, hi);
    }
}
