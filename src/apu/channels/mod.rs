//! The five APU channels
//!
//! Each channel owns its components and exposes `write_register_N`
//! methods matching its four-register window.

mod dmc;
mod noise;
mod pulse;
mod triangle;

pub use dmc::DmcChannel;
pub use noise::NoiseChannel;
pub use pulse::PulseChannel;
pub use triangle::TriangleChannel;
