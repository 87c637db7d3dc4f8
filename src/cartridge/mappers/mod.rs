// Mappers module - Implementations of the supported cartridge mappers
//
// This module contains the mapper factory and individual mapper
// implementations. Each mapper handles memory mapping, banking, and (for
// MMC3) scanline IRQ generation for its board family.

mod mapper0;
mod mapper1;
mod mapper2;
mod mapper3;
mod mapper4;

use thiserror::Error;

use super::{Cartridge, Mapper};
pub use mapper0::Mapper0;
pub use mapper1::Mapper1;
pub use mapper2::Mapper2;
pub use mapper3::Mapper3;
pub use mapper4::Mapper4;

/// Errors for mapper construction and snapshot restore
#[derive(Debug, Error)]
pub enum MapperError {
    /// The requested mapper number is not in the supported set
    #[error("mapper {0} is not supported")]
    UnsupportedMapper(u8),

    /// Snapshot blob does not match the mapper's layout
    #[error("mapper snapshot length mismatch: expected {expected}, found {found}")]
    SnapshotLength { expected: usize, found: usize },
}

/// Create a mapper instance for the given cartridge
///
/// The mapper number comes from the iNES header. Supported mappers:
/// 0 (NROM), 1 (MMC1), 2 (UxROM), 3 (CNROM), 4 (MMC3).
///
/// # Errors
///
/// Returns `MapperError::UnsupportedMapper` for any other number.
pub fn create_mapper(cartridge: Cartridge) -> Result<Box<dyn Mapper>, MapperError> {
    match cartridge.mapper {
        0 => Ok(Box::new(Mapper0::new(cartridge))),
        1 => Ok(Box::new(Mapper1::new(cartridge))),
        2 => Ok(Box::new(Mapper2::new(cartridge))),
        3 => Ok(Box::new(Mapper3::new(cartridge))),
        4 => Ok(Box::new(Mapper4::new(cartridge))),
        mapper_num => Err(MapperError::UnsupportedMapper(mapper_num)),
    }
}

/// Check a snapshot blob length before unpacking it
pub(crate) fn check_snapshot_len(data: &[u8], expected: usize) -> Result<(), MapperError> {
    if data.len() != expected {
        return Err(MapperError::SnapshotLength {
            expected,
            found: data.len(),
        });
    }
    Ok(())
}
