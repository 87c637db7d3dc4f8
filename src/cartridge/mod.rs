// Cartridge module - ROM image handling and the mapper abstraction
//
// A cartridge is described by its PRG ROM, CHR ROM (or CHR RAM), mirroring
// mode, mapper number, and battery flag. The descriptor is immutable; all
// runtime banking state lives in the mapper built from it.
//
// # iNES Layout
//
// ```text
// Offset  Size      Contents
// 0       4         Magic "NES\x1A"
// 4       1         PRG ROM size in 16 KiB units
// 5       1         CHR ROM size in 8 KiB units (0 = 8 KiB CHR RAM)
// 6       1         Flags 6: mirroring, battery, trainer, four-screen, mapper low nibble
// 7       1         Flags 7: mapper high nibble, NES 2.0 signature
// 8-15    8         Unused by this core
// 16      512       Trainer (only if flags 6 bit 2 set)
// ...               PRG ROM, then CHR ROM
// ```

pub mod mappers;

use std::fs;
use std::path::Path;

use thiserror::Error;

pub use mappers::{create_mapper, MapperError};

/// PRG ROM bank unit (16 KiB)
pub const PRG_ROM_UNIT: usize = 16 * 1024;

/// CHR ROM bank unit (8 KiB)
pub const CHR_ROM_UNIT: usize = 8 * 1024;

/// CHR RAM size when the image carries no CHR ROM (8 KiB)
pub const CHR_RAM_SIZE: usize = 8 * 1024;

/// Size of the optional trainer block
const TRAINER_SIZE: usize = 512;

/// Nametable mirroring arrangement
///
/// Describes how the four logical nametables at $2000-$2FFF alias onto the
/// console's 2 KiB of VRAM (or, for four-screen boards, onto 4 KiB of
/// cartridge VRAM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Mirroring {
    /// $2000=$2400, $2800=$2C00 (vertical scrolling layouts)
    Horizontal,
    /// $2000=$2800, $2400=$2C00 (horizontal scrolling layouts)
    Vertical,
    /// All four nametables alias the lower 1 KiB
    SingleScreenLower,
    /// All four nametables alias the upper 1 KiB
    SingleScreenUpper,
    /// Four distinct nametables backed by 4 KiB of VRAM
    FourScreen,
}

/// Errors produced while decoding an iNES image
#[derive(Debug, Error)]
pub enum INesError {
    /// Missing or wrong magic bytes
    #[error("not an iNES image (bad magic)")]
    BadMagic,

    /// Image shorter than the header claims
    #[error("truncated image: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    /// Header declares zero PRG ROM banks
    #[error("image declares no PRG ROM")]
    NoPrgRom,

    /// Underlying file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cartridge descriptor produced by the iNES parser
///
/// All fields are fixed for the lifetime of the cartridge; the mapper copies
/// or takes ownership of the ROM buffers when it is constructed.
#[derive(Debug, Clone)]
pub struct Cartridge {
    /// PRG ROM data (multiple of 16 KiB)
    pub prg_rom: Vec<u8>,
    /// CHR ROM data; empty means the board carries 8 KiB of CHR RAM
    pub chr_rom: Vec<u8>,
    /// Optional 512-byte trainer (kept for completeness, unused by the core)
    pub trainer: Option<Vec<u8>>,
    /// iNES mapper number
    pub mapper: u8,
    /// Initial nametable mirroring
    pub mirroring: Mirroring,
    /// Whether PRG RAM is battery backed
    pub has_battery: bool,
}

impl Cartridge {
    /// Parse a cartridge from raw iNES image bytes
    ///
    /// # Errors
    ///
    /// Returns `INesError` when the magic is wrong, the image is shorter
    /// than the header-declared PRG/CHR sizes, or no PRG ROM is present.
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, INesError> {
        if data.len() < 16 || &data[0..4] != b"NES\x1A" {
            return Err(INesError::BadMagic);
        }

        let prg_banks = data[4] as usize;
        let chr_banks = data[5] as usize;
        let flags6 = data[6];
        let flags7 = data[7];

        if prg_banks == 0 {
            return Err(INesError::NoPrgRom);
        }

        // NES 2.0 images use an extended size encoding we do not need for
        // the supported mapper set; the iNES fields still describe them.
        if flags7 & 0x0C == 0x08 {
            log::warn!("NES 2.0 header detected; reading iNES-compatible fields only");
        }

        let mapper = (flags7 & 0xF0) | (flags6 >> 4);
        let has_trainer = flags6 & 0x04 != 0;
        let has_battery = flags6 & 0x02 != 0;

        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let prg_size = prg_banks * PRG_ROM_UNIT;
        let chr_size = chr_banks * CHR_ROM_UNIT;
        let trainer_size = if has_trainer { TRAINER_SIZE } else { 0 };
        let expected = 16 + trainer_size + prg_size + chr_size;

        if data.len() < expected {
            return Err(INesError::Truncated {
                expected,
                found: data.len(),
            });
        }

        let prg_start = 16 + trainer_size;
        let trainer = has_trainer.then(|| data[16..16 + TRAINER_SIZE].to_vec());
        let prg_rom = data[prg_start..prg_start + prg_size].to_vec();
        let chr_rom = data[prg_start + prg_size..prg_start + prg_size + chr_size].to_vec();

        Ok(Cartridge {
            prg_rom,
            chr_rom,
            trainer,
            mapper,
            mirroring,
            has_battery,
        })
    }

    /// Parse a cartridge from an iNES file on disk
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, INesError> {
        let data = fs::read(path)?;
        Self::from_ines_bytes(&data)
    }

    /// Whether the board uses CHR RAM instead of CHR ROM
    pub fn uses_chr_ram(&self) -> bool {
        self.chr_rom.is_empty()
    }

    /// CHR memory for the mapper: the ROM image, or zeroed CHR RAM
    pub(crate) fn chr_mem(&self) -> Vec<u8> {
        if self.chr_rom.is_empty() {
            vec![0; CHR_RAM_SIZE]
        } else {
            self.chr_rom.clone()
        }
    }
}

/// Trait implemented by every cartridge mapper
///
/// The mapper owns the PRG/CHR buffers and all banking state. It sits on
/// both buses: the CPU bus hands it `$4020-$FFFF`, the PPU bus hands it
/// `$0000-$1FFF` plus address-line notifications used by scanline counters.
pub trait Mapper {
    /// Read a byte from CPU address space ($4020-$FFFF)
    fn cpu_read(&self, address: u16) -> u8;

    /// Write a byte to CPU address space ($4020-$FFFF)
    ///
    /// Writes into ROM ranges reprogram mapper registers; anything the
    /// mapper does not decode is dropped.
    fn cpu_write(&mut self, address: u16, value: u8);

    /// Read a byte from the pattern-table range ($0000-$1FFF)
    fn ppu_read(&self, address: u16) -> u8;

    /// Write a byte to the pattern-table range (CHR RAM boards only)
    fn ppu_write(&mut self, address: u16, value: u8);

    /// Current nametable mirroring (may change at runtime)
    fn mirroring(&self) -> Mirroring;

    /// Whether the mapper is asserting its IRQ line
    fn irq_pending(&self) -> bool {
        false
    }

    /// Deassert the mapper IRQ line
    fn irq_acknowledge(&mut self) {}

    /// Observe a PPU bus access
    ///
    /// `dot` is a monotonically increasing PPU dot counter. MMC3 derives
    /// filtered A12 rising edges from the address stream; other mappers
    /// ignore it.
    fn ppu_address_notify(&mut self, _address: u16, _dot: u64) {}

    /// Snapshot internal registers and RAM into an opaque byte blob
    fn serialize(&self) -> Vec<u8>;

    /// Restore a snapshot produced by [`Mapper::serialize`]
    ///
    /// # Errors
    ///
    /// Fails without modifying state when the blob length does not match
    /// this mapper's layout.
    fn deserialize(&mut self, data: &[u8]) -> Result<(), MapperError>;

    /// Battery-backed PRG RAM, if the board has any
    fn prg_ram(&self) -> Option<&[u8]> {
        None
    }

    /// Mutable battery-backed PRG RAM, if the board has any
    fn prg_ram_mut(&mut self) -> Option<&mut [u8]> {
        None
    }
}
