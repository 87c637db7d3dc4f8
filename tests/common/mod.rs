// Common test utilities for system-level integration tests
//
// Builds cartridges programmatically so the scenarios run without any ROM
// files, plus the blargg test-ROM result protocol for the ignored
// ROM-driven suites.

#![allow(dead_code)]

use famicore::{Cartridge, Emulator, Mirroring};

/// Builds a 32KB NROM program image mapped at $8000-$FFFF
pub struct ProgramBuilder {
    prg: Vec<u8>,
    chr: Vec<u8>,
    mirroring: Mirroring,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        ProgramBuilder {
            prg: vec![0xEA; 32 * 1024], // NOP-filled
            chr: vec![],
            mirroring: Mirroring::Vertical,
        }
    }

    /// Place bytes at a CPU address in $8000-$FFFF
    pub fn code(mut self, addr: u16, bytes: &[u8]) -> Self {
        let offset = (addr - 0x8000) as usize;
        self.prg[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Set the reset vector
    pub fn reset_vector(self, addr: u16) -> Self {
        let bytes = [addr as u8, (addr >> 8) as u8];
        self.code(0xFFFC, &bytes)
    }

    /// Set the NMI vector
    pub fn nmi_vector(self, addr: u16) -> Self {
        let bytes = [addr as u8, (addr >> 8) as u8];
        self.code(0xFFFA, &bytes)
    }

    /// Set the IRQ/BRK vector
    pub fn irq_vector(self, addr: u16) -> Self {
        let bytes = [addr as u8, (addr >> 8) as u8];
        self.code(0xFFFE, &bytes)
    }

    pub fn build_cartridge(self) -> Cartridge {
        Cartridge {
            prg_rom: self.prg,
            chr_rom: self.chr,
            trainer: None,
            mapper: 0,
            mirroring: self.mirroring,
            has_battery: false,
        }
    }

    pub fn build(self) -> Emulator {
        Emulator::new(self.build_cartridge()).expect("NROM is always supported")
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of running a blargg-style test ROM
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    /// Status $00
    Passed,
    /// Status $01-$7F with the NUL-terminated message from $6004
    Failed(u8, String),
    /// The ROM never left the running state
    Timeout,
}

/// Maximum CPU cycles before a test ROM is considered hung
pub const MAX_TEST_CYCLES: u64 = 200_000_000;

/// Blargg result protocol: $6000 status, $6001-$6003 signature $DE $B0 $61,
/// $6004.. NUL-terminated result text.
pub fn run_blargg_rom(path: &str) -> TestResult {
    let mut emulator = Emulator::from_ines_file(path).expect("test ROM must load");

    let mut started = false;
    while emulator.cpu().cycles < MAX_TEST_CYCLES {
        emulator.run_frame();

        let signature = [
            emulator.bus_mut().read(0x6001),
            emulator.bus_mut().read(0x6002),
            emulator.bus_mut().read(0x6003),
        ];
        if signature != [0xDE, 0xB0, 0x61] {
            continue;
        }

        let status = emulator.bus_mut().read(0x6000);
        match status {
            0x80 => started = true,
            0x81 => emulator.reset(),
            0x00 if started => return TestResult::Passed,
            code @ 0x01..=0x7F if started => {
                return TestResult::Failed(code, read_result_string(&mut emulator));
            }
            _ => {}
        }
    }

    TestResult::Timeout
}

fn read_result_string(emulator: &mut Emulator) -> String {
    let mut text = String::new();
    for addr in 0x6004..0x6104u16 {
        let byte = emulator.bus_mut().read(addr);
        if byte == 0 {
            break;
        }
        text.push(byte as char);
    }
    text
}
