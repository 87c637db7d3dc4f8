// famicore - A cycle-accurate NES (NTSC) emulation core
//
// The crate models the execution engine of the console: the 2A03 CPU
// interpreter, the dot-accurate 2C02 PPU, the five-channel APU with its
// frame counter and DMC DMA, the cartridge mappers, and the integrator
// that drives them in lockstep. Video presentation, audio output, and
// input polling belong to the embedding host.

// Public modules
pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod emulator;
pub mod input;
pub mod ppu;

// Re-export main types for convenience
pub use apu::Apu;
pub use bus::Bus;
pub use cartridge::{Cartridge, INesError, Mapper, MapperError, Mirroring};
pub use cpu::Cpu;
pub use emulator::{Emulator, EmulatorConfig, LoadError, SaveState, SaveStateError};
pub use input::{Button, Controller, ControllerIo};
pub use ppu::{Ppu, SCREEN_HEIGHT, SCREEN_WIDTH, SYSTEM_PALETTE};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_components() {
        // Every component can be instantiated standalone
        let _cpu = Cpu::new();
        let _ppu = Ppu::new();
        let _apu = Apu::new();
        let _bus = Bus::new();
        let _controller = Controller::new();
        let _controller_io = ControllerIo::new();
    }
}
