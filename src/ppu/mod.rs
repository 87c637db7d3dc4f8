// PPU module - Picture Processing Unit (2C02) implementation
//
// This is a dot-accurate PPU: one call to `tick` advances exactly one dot,
// and a frame is 262 scanlines of 341 dots (with the odd-frame skip on the
// pre-render line). The background is produced by the shift-register
// pipeline the hardware uses; sprites go through secondary-OAM evaluation
// and eight rendering units.
//
// ## Scanline map
//
// | Scanline | Role        | Notable dots                                  |
// |----------|-------------|-----------------------------------------------|
// | 0-239    | Visible     | 1-256 pixels + fetches, 257-320 sprite fetches|
// | 240      | Post-render | idle                                          |
// | 241-260  | VBlank      | 241/1 sets VBlank (and NMI when enabled)      |
// | 261      | Pre-render  | 1 clears flags, 280-304 copies vertical bits  |
//
// ## Register map
//
// | Address | Name       | Access  | Description                   |
// |---------|------------|---------|-------------------------------|
// | $2000   | PPUCTRL    | Write   | NT select, increment, NMI     |
// | $2001   | PPUMASK    | Write   | Rendering enables, emphasis   |
// | $2002   | PPUSTATUS  | Read    | VBlank, sprite 0, overflow    |
// | $2003   | OAMADDR    | Write   | OAM address                   |
// | $2004   | OAMDATA    | R/W     | OAM data                      |
// | $2005   | PPUSCROLL  | Write×2 | Fine/coarse scroll into t/x   |
// | $2006   | PPUADDR    | Write×2 | VRAM address into t then v    |
// | $2007   | PPUDATA    | R/W     | Buffered VRAM port            |

mod constants;
mod memory;
mod registers;
mod rendering;

#[cfg(test)]
mod tests;

pub use constants::{SCREEN_HEIGHT, SCREEN_WIDTH, SYSTEM_PALETTE};

use std::cell::RefCell;
use std::rc::Rc;

use crate::cartridge::{Mapper, Mirroring};
use constants::*;

/// One of the eight sprite rendering units
///
/// Loaded during the sprite-fetch dots (257-320); during visible dots the
/// X counter counts down and then the pattern latches shift out one pixel
/// per dot.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct SpriteUnit {
    /// Pattern plane 0, already flipped for horizontal mirror
    pattern_lo: u8,
    /// Pattern plane 1, already flipped for horizontal mirror
    pattern_hi: u8,
    /// Attribute byte (palette, priority, flips)
    attributes: u8,
    /// Dots left until the unit starts shifting
    x_counter: u8,
    /// This unit holds OAM sprite 0
    is_sprite_zero: bool,
}

/// PPU structure holding all 2C02 state
pub struct Ppu {
    // ========================================
    // Registers ($2000-$2007)
    // ========================================
    /// $2000: PPUCTRL
    pub(crate) ppuctrl: u8,
    /// $2001: PPUMASK
    pub(crate) ppumask: u8,
    /// $2002: PPUSTATUS (bits 7-5; low bits come from the I/O latch)
    pub(crate) ppustatus: u8,
    /// $2003: OAMADDR
    pub(crate) oam_addr: u8,

    // ========================================
    // Internal scroll registers (loopy v/t/x/w)
    // ========================================
    /// Current VRAM address (15 bits)
    pub(crate) v: u16,
    /// Temporary VRAM address / top-left scroll
    pub(crate) t: u16,
    /// Fine X scroll (3 bits)
    pub(crate) fine_x: u8,
    /// Write toggle shared by $2005/$2006
    pub(crate) write_latch: bool,
    /// $2007 read buffer
    pub(crate) read_buffer: u8,

    // ========================================
    // Memory
    // ========================================
    /// Nametable VRAM; 2KB on-console, the full 4KB only for four-screen
    pub(crate) nametables: [u8; NAMETABLE_SIZE * 4],
    /// Palette RAM with its $3F10/$3F14/$3F18/$3F1C aliases
    pub(crate) palette_ram: [u8; PALETTE_SIZE],
    /// Fallback mirroring before a mapper is attached
    pub(crate) default_mirroring: Mirroring,
    /// Mapper shared with the CPU bus; pattern tables live behind it
    pub(crate) mapper: Option<Rc<RefCell<Box<dyn Mapper>>>>,

    // ========================================
    // OAM
    // ========================================
    /// Primary OAM: 64 sprites × 4 bytes
    pub(crate) oam: [u8; 256],
    /// Secondary OAM: the up-to-8 sprites picked for the next scanline
    pub(crate) secondary_oam: [u8; 32],

    // ========================================
    // Background pipeline
    // ========================================
    nt_latch: u8,
    at_latch: u8,
    pattern_lo_latch: u8,
    pattern_hi_latch: u8,
    bg_pattern_lo: u16,
    bg_pattern_hi: u16,
    bg_attr_lo: u16,
    bg_attr_hi: u16,

    // ========================================
    // Sprite pipeline
    // ========================================
    sprite_units: [SpriteUnit; 8],
    /// Sprites copied into secondary OAM by the last evaluation
    sprites_found: u8,
    /// Sprite 0 was among them
    sprite_zero_next: bool,
    /// Address computed at the start of a sprite fetch slot
    sprite_fetch_addr: u16,

    // ========================================
    // Timing
    // ========================================
    /// Current scanline (0-261; 261 is the pre-render line)
    pub(crate) scanline: u16,
    /// Current dot within the scanline (0-340)
    pub(crate) dot: u16,
    /// Completed frame count
    frame: u64,
    /// Frame parity for the odd-frame dot skip
    odd_frame: bool,
    /// Free-running dot counter handed to the mapper for A12 filtering
    dot_counter: u64,

    // ========================================
    // CPU-visible side channels
    // ========================================
    /// Latched NMI edge, consumed by the CPU at instruction boundaries
    nmi_pending: bool,
    /// Current level of the NMI line (VBlank AND enable)
    nmi_line: bool,
    /// True only during the tick that set the VBlank flag ($2002 race)
    vblank_just_set: bool,
    /// Set when the frame is published at VBlank start
    frame_complete: bool,
    /// Last value driven over the register interface (open-bus bits)
    io_latch: u8,

    /// 256×240 framebuffer of 6-bit palette indices
    framebuffer: Vec<u8>,
}

impl Ppu {
    /// Create a new PPU in the power-on state
    pub fn new() -> Self {
        Ppu {
            ppuctrl: 0,
            ppumask: 0,
            ppustatus: 0,
            oam_addr: 0,

            v: 0,
            t: 0,
            fine_x: 0,
            write_latch: false,
            read_buffer: 0,

            nametables: [0; NAMETABLE_SIZE * 4],
            palette_ram: [0; PALETTE_SIZE],
            default_mirroring: Mirroring::Horizontal,
            mapper: None,

            oam: [0; 256],
            secondary_oam: [0xFF; 32],

            nt_latch: 0,
            at_latch: 0,
            pattern_lo_latch: 0,
            pattern_hi_latch: 0,
            bg_pattern_lo: 0,
            bg_pattern_hi: 0,
            bg_attr_lo: 0,
            bg_attr_hi: 0,

            sprite_units: [SpriteUnit::default(); 8],
            sprites_found: 0,
            sprite_zero_next: false,
            sprite_fetch_addr: 0,

            scanline: 0,
            dot: 0,
            frame: 0,
            odd_frame: false,
            dot_counter: 0,

            nmi_pending: false,
            nmi_line: false,
            vblank_just_set: false,
            frame_complete: false,
            io_latch: 0,

            framebuffer: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    /// Reset the PPU as the console reset line does
    ///
    /// Control registers and the write toggle clear; VRAM, OAM, and the
    /// scanline position survive.
    pub fn reset(&mut self) {
        self.ppuctrl = 0;
        self.ppumask = 0;
        self.write_latch = false;
        self.read_buffer = 0;
        self.fine_x = 0;
        self.t = 0;
        self.nmi_pending = false;
        self.nmi_line = false;
        self.vblank_just_set = false;
        self.odd_frame = false;
    }

    /// Attach the mapper shared with the CPU bus
    pub fn set_mapper(&mut self, mapper: Rc<RefCell<Box<dyn Mapper>>>) {
        self.mapper = Some(mapper);
    }

    /// Set the mirroring used when no mapper is attached
    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.default_mirroring = mirroring;
    }

    /// Write one byte into OAM (used by $2004 and OAM DMA)
    pub fn write_oam(&mut self, addr: u8, data: u8) {
        self.oam[addr as usize] = data;
    }

    /// Read one byte from OAM
    pub fn read_oam(&self, addr: u8) -> u8 {
        self.oam[addr as usize]
    }

    /// The published frame: 256×240 bytes of 6-bit palette indices
    pub fn frame(&self) -> &[u8] {
        &self.framebuffer
    }

    /// Color-emphasis bits from PPUMASK (red, green, blue in bits 0-2)
    pub fn emphasis(&self) -> u8 {
        self.ppumask >> 5
    }

    /// Advance the PPU by one dot
    pub fn tick(&mut self) {
        self.vblank_just_set = false;

        match self.scanline {
            0..=LAST_VISIBLE_SCANLINE => self.visible_scanline_dot(),
            POSTRENDER_SCANLINE => {}
            VBLANK_SCANLINE => {
                if self.dot == 1 {
                    self.enter_vblank();
                }
            }
            PRERENDER_SCANLINE => self.prerender_scanline_dot(),
            _ => {}
        }

        self.advance_dot();
    }

    /// Whether background or sprite rendering is enabled
    pub(crate) fn rendering_enabled(&self) -> bool {
        self.ppumask & 0x18 != 0
    }

    /// Set the VBlank flag and raise NMI when enabled (scanline 241, dot 1)
    fn enter_vblank(&mut self) {
        self.ppustatus |= 0x80;
        self.vblank_just_set = true;
        self.frame_complete = true;
        self.update_nmi_line();
    }

    /// Recompute the NMI line level; a rising edge latches an NMI
    ///
    /// The line is the AND of the VBlank flag and PPUCTRL bit 7, so both
    /// VBlank start and a $2000 write during VBlank can produce the edge.
    pub(crate) fn update_nmi_line(&mut self) {
        let level = (self.ppustatus & 0x80 != 0) && (self.ppuctrl & 0x80 != 0);
        if level && !self.nmi_line {
            self.nmi_pending = true;
        }
        self.nmi_line = level;
    }

    /// Consume the latched NMI edge
    pub fn take_nmi(&mut self) -> bool {
        let pending = self.nmi_pending;
        self.nmi_pending = false;
        pending
    }

    /// Whether an NMI edge is latched (without consuming it)
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Suppress a latched NMI (the $2002 race)
    pub(crate) fn suppress_nmi(&mut self) {
        self.nmi_pending = false;
    }

    /// Consume the frame-published flag
    pub fn take_frame_complete(&mut self) -> bool {
        let complete = self.frame_complete;
        self.frame_complete = false;
        complete
    }

    /// Current scanline (261 is the pre-render line)
    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    /// Current dot within the scanline
    pub fn dot(&self) -> u16 {
        self.dot
    }

    /// Completed frame count
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Move to the next dot, handling wrap and the odd-frame skip
    fn advance_dot(&mut self) {
        self.dot_counter += 1;
        self.dot += 1;

        // Odd frames drop the last pre-render dot while rendering is on
        if self.scanline == PRERENDER_SCANLINE
            && self.dot == DOTS_PER_SCANLINE - 1
            && self.odd_frame
            && self.ppumask & 0x08 != 0
        {
            self.dot = DOTS_PER_SCANLINE;
        }

        if self.dot >= DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline >= SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.frame += 1;
                self.odd_frame = !self.odd_frame;
            }
        }
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable PPU snapshot (everything except the mapper handle and the
/// framebuffer, which is transient output)
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PpuState {
    ppuctrl: u8,
    ppumask: u8,
    ppustatus: u8,
    oam_addr: u8,
    v: u16,
    t: u16,
    fine_x: u8,
    write_latch: bool,
    read_buffer: u8,
    nametables: Vec<u8>,
    palette_ram: Vec<u8>,
    oam: Vec<u8>,
    secondary_oam: Vec<u8>,
    nt_latch: u8,
    at_latch: u8,
    pattern_lo_latch: u8,
    pattern_hi_latch: u8,
    bg_pattern_lo: u16,
    bg_pattern_hi: u16,
    bg_attr_lo: u16,
    bg_attr_hi: u16,
    sprite_units: Vec<SpriteUnit>,
    sprites_found: u8,
    sprite_zero_next: bool,
    sprite_fetch_addr: u16,
    scanline: u16,
    dot: u16,
    frame: u64,
    odd_frame: bool,
    dot_counter: u64,
    nmi_pending: bool,
    nmi_line: bool,
    io_latch: u8,
}

impl PpuState {
    /// Whether the buffer lengths match this build's layout
    pub fn is_valid(&self) -> bool {
        self.nametables.len() == NAMETABLE_SIZE * 4
            && self.palette_ram.len() == PALETTE_SIZE
            && self.oam.len() == 256
            && self.secondary_oam.len() == 32
            && self.sprite_units.len() == 8
    }
}

impl Ppu {
    /// Capture a snapshot of the PPU state
    pub fn save_state(&self) -> PpuState {
        PpuState {
            ppuctrl: self.ppuctrl,
            ppumask: self.ppumask,
            ppustatus: self.ppustatus,
            oam_addr: self.oam_addr,
            v: self.v,
            t: self.t,
            fine_x: self.fine_x,
            write_latch: self.write_latch,
            read_buffer: self.read_buffer,
            nametables: self.nametables.to_vec(),
            palette_ram: self.palette_ram.to_vec(),
            oam: self.oam.to_vec(),
            secondary_oam: self.secondary_oam.to_vec(),
            nt_latch: self.nt_latch,
            at_latch: self.at_latch,
            pattern_lo_latch: self.pattern_lo_latch,
            pattern_hi_latch: self.pattern_hi_latch,
            bg_pattern_lo: self.bg_pattern_lo,
            bg_pattern_hi: self.bg_pattern_hi,
            bg_attr_lo: self.bg_attr_lo,
            bg_attr_hi: self.bg_attr_hi,
            sprite_units: self.sprite_units.to_vec(),
            sprites_found: self.sprites_found,
            sprite_zero_next: self.sprite_zero_next,
            sprite_fetch_addr: self.sprite_fetch_addr,
            scanline: self.scanline,
            dot: self.dot,
            frame: self.frame,
            odd_frame: self.odd_frame,
            dot_counter: self.dot_counter,
            nmi_pending: self.nmi_pending,
            nmi_line: self.nmi_line,
            io_latch: self.io_latch,
        }
    }

    /// Restore a snapshot; returns false (leaving state alone) when the
    /// buffer lengths do not match this build's layout
    pub fn load_state(&mut self, state: &PpuState) -> bool {
        if state.nametables.len() != self.nametables.len()
            || state.palette_ram.len() != self.palette_ram.len()
            || state.oam.len() != self.oam.len()
            || state.secondary_oam.len() != self.secondary_oam.len()
            || state.sprite_units.len() != self.sprite_units.len()
        {
            return false;
        }

        self.ppuctrl = state.ppuctrl;
        self.ppumask = state.ppumask;
        self.ppustatus = state.ppustatus;
        self.oam_addr = state.oam_addr;
        self.v = state.v;
        self.t = state.t;
        self.fine_x = state.fine_x;
        self.write_latch = state.write_latch;
        self.read_buffer = state.read_buffer;
        self.nametables.copy_from_slice(&state.nametables);
        self.palette_ram.copy_from_slice(&state.palette_ram);
        self.oam.copy_from_slice(&state.oam);
        self.secondary_oam.copy_from_slice(&state.secondary_oam);
        self.nt_latch = state.nt_latch;
        self.at_latch = state.at_latch;
        self.pattern_lo_latch = state.pattern_lo_latch;
        self.pattern_hi_latch = state.pattern_hi_latch;
        self.bg_pattern_lo = state.bg_pattern_lo;
        self.bg_pattern_hi = state.bg_pattern_hi;
        self.bg_attr_lo = state.bg_attr_lo;
        self.bg_attr_hi = state.bg_attr_hi;
        self.sprite_units.copy_from_slice(&state.sprite_units);
        self.sprites_found = state.sprites_found;
        self.sprite_zero_next = state.sprite_zero_next;
        self.sprite_fetch_addr = state.sprite_fetch_addr;
        self.scanline = state.scanline;
        self.dot = state.dot;
        self.frame = state.frame;
        self.odd_frame = state.odd_frame;
        self.dot_counter = state.dot_counter;
        self.nmi_pending = state.nmi_pending;
        self.nmi_line = state.nmi_line;
        self.vblank_just_set = false;
        self.frame_complete = false;
        self.io_latch = state.io_latch;
        true
    }
}
