// Mapper 4 (MMC3) - 8KB PRG banking, fine CHR banking, scanline IRQ
//
// Memory Layout:
// - CPU $6000-$7FFF: 8KB PRG-RAM (optional, battery-backed on some boards)
// - CPU $8000-$9FFF: 8KB PRG-ROM bank (switchable or fixed depending on mode)
// - CPU $A000-$BFFF: 8KB PRG-ROM bank (always switchable)
// - CPU $C000-$DFFF: 8KB PRG-ROM bank (switchable or fixed depending on mode)
// - CPU $E000-$FFFF: 8KB PRG-ROM bank (fixed to last bank)
// - PPU $0000-$1FFF: two 2KB + four 1KB CHR banks, layout flips with A12
//   inversion
//
// Register Interface (selected by address bit 0 and bits 13-14):
// - $8000 even: bank select (bits 0-2 target R0-R7, bit 6 PRG mode,
//   bit 7 CHR A12 inversion)
// - $8001 odd:  bank data for the selected target
// - $A000 even: mirroring (bit 0: 0=vertical, 1=horizontal)
// - $A001 odd:  PRG-RAM protect (bit 7 enable, bit 6 allow writes)
// - $C000 even: IRQ latch (counter reload value)
// - $C001 odd:  IRQ reload (counter reloads on next qualified A12 edge)
// - $E000 even: IRQ disable + acknowledge
// - $E001 odd:  IRQ enable
//
// The scanline counter is clocked by PPU A12 rising edges. An edge only
// counts when A12 stayed low for at least 8 PPU dots beforehand, which
// filters the rapid toggling inside a single tile fetch.

use crate::cartridge::mappers::{check_snapshot_len, MapperError};
use crate::cartridge::{Cartridge, Mapper, Mirroring};

/// PRG-ROM bank size (8KB)
const PRG_BANK_SIZE: usize = 8 * 1024;

/// CHR bank size (1KB)
const CHR_BANK_SIZE: usize = 1024;

/// PRG-RAM size (8KB)
const PRG_RAM_SIZE: usize = 8 * 1024;

/// Minimum number of PPU dots A12 must stay low before a rising edge
/// clocks the scanline counter
const A12_FILTER_DOTS: u64 = 8;

/// Mapper 4 implementation (MMC3)
///
/// Used by titles such as Super Mario Bros. 3, Kirby's Adventure, and the
/// Mega Man 3-6 series.
pub struct Mapper4 {
    /// PRG-ROM data
    prg_rom: Vec<u8>,
    /// CHR-ROM or CHR-RAM data
    chr_mem: Vec<u8>,
    /// PRG-RAM (8KB)
    prg_ram: Vec<u8>,
    /// Whether CHR memory is writable
    chr_is_ram: bool,

    /// Bank select register (target + PRG/CHR modes)
    bank_select: u8,
    /// Bank registers R0-R7
    bank_registers: [u8; 8],
    /// Current mirroring
    mirroring: Mirroring,
    /// Header requested four-screen VRAM (mirroring register is then inert)
    four_screen: bool,
    /// PRG-RAM protect (bit 7 enable, bit 6 allow writes)
    prg_ram_protect: u8,

    /// IRQ counter reload value
    irq_latch: u8,
    /// IRQ scanline counter
    irq_counter: u8,
    /// Counter reloads from the latch on the next qualified edge
    irq_reload: bool,
    /// IRQ generation enabled
    irq_enabled: bool,
    /// IRQ line asserted
    irq_pending: bool,

    /// Dot at which A12 last went low; `None` while A12 is high
    a12_low_since: Option<u64>,

    /// Number of 8KB PRG banks
    prg_banks: usize,
    /// Number of 1KB CHR banks
    chr_banks: usize,
}

impl Mapper4 {
    /// Create a new Mapper4 instance from a cartridge
    pub fn new(cartridge: Cartridge) -> Self {
        let chr_is_ram = cartridge.uses_chr_ram();
        let chr_mem = cartridge.chr_mem();
        let prg_banks = cartridge.prg_rom.len() / PRG_BANK_SIZE;
        let chr_banks = chr_mem.len() / CHR_BANK_SIZE;

        Mapper4 {
            prg_rom: cartridge.prg_rom,
            chr_mem,
            prg_ram: vec![0; PRG_RAM_SIZE],
            chr_is_ram,

            bank_select: 0,
            bank_registers: [0; 8],
            mirroring: cartridge.mirroring,
            four_screen: cartridge.mirroring == Mirroring::FourScreen,
            prg_ram_protect: 0,

            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,

            a12_low_since: None,

            prg_banks,
            chr_banks,
        }
    }

    /// PRG bank mode: true when $C000 holds the switchable bank
    fn prg_mode_swapped(&self) -> bool {
        self.bank_select & 0x40 != 0
    }

    /// CHR layout: true when the 2KB banks sit at $1000-$1FFF
    fn chr_a12_inverted(&self) -> bool {
        self.bank_select & 0x80 != 0
    }

    /// Map a CPU address to a PRG-ROM offset
    fn map_prg_address(&self, address: u16) -> usize {
        let second_last = self.prg_banks - 2;
        let last = self.prg_banks - 1;
        let r6 = self.bank_registers[6] as usize;
        let r7 = self.bank_registers[7] as usize;

        let bank = match (address, self.prg_mode_swapped()) {
            (0x8000..=0x9FFF, false) => r6,
            (0x8000..=0x9FFF, true) => second_last,
            (0xA000..=0xBFFF, _) => r7,
            (0xC000..=0xDFFF, false) => second_last,
            (0xC000..=0xDFFF, true) => r6,
            (0xE000..=0xFFFF, _) => last,
            _ => 0,
        };

        (bank % self.prg_banks) * PRG_BANK_SIZE + (address & 0x1FFF) as usize
    }

    /// Map a PPU address to a CHR offset
    ///
    /// R0/R1 select 2KB banks (low bit ignored), R2-R5 select 1KB banks.
    /// With A12 inversion the two groups trade pattern tables.
    fn map_chr_address(&self, address: u16) -> usize {
        let slot = (address >> 10) as usize & 0x07;
        let logical = if self.chr_a12_inverted() { slot ^ 0x04 } else { slot };

        let bank = match logical {
            0 => (self.bank_registers[0] & 0xFE) as usize,
            1 => (self.bank_registers[0] | 0x01) as usize,
            2 => (self.bank_registers[1] & 0xFE) as usize,
            3 => (self.bank_registers[1] | 0x01) as usize,
            slot => self.bank_registers[slot - 2] as usize,
        };

        (bank % self.chr_banks.max(1)) * CHR_BANK_SIZE + (address & 0x03FF) as usize
    }

    /// Clock the scanline counter from one qualified A12 rising edge
    fn clock_irq_counter(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }

        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }
}

impl Mapper for Mapper4 {
    fn cpu_read(&self, address: u16) -> u8 {
        match address {
            0x6000..=0x7FFF => {
                if self.prg_ram_protect & 0x80 != 0 {
                    self.prg_ram[(address - 0x6000) as usize]
                } else {
                    0
                }
            }
            0x8000..=0xFFFF => self.prg_rom[self.map_prg_address(address)],
            _ => 0,
        }
    }

    fn cpu_write(&mut self, address: u16, value: u8) {
        match address {
            0x6000..=0x7FFF => {
                if self.prg_ram_protect & 0xC0 == 0xC0 {
                    self.prg_ram[(address - 0x6000) as usize] = value;
                }
            }
            0x8000..=0xFFFF => match address & 0xE001 {
                0x8000 => self.bank_select = value,
                0x8001 => {
                    let target = (self.bank_select & 0x07) as usize;
                    self.bank_registers[target] = value;
                }
                0xA000 => {
                    if !self.four_screen {
                        self.mirroring = if value & 0x01 != 0 {
                            Mirroring::Horizontal
                        } else {
                            Mirroring::Vertical
                        };
                    }
                }
                0xA001 => self.prg_ram_protect = value,
                0xC000 => self.irq_latch = value,
                0xC001 => {
                    self.irq_counter = 0;
                    self.irq_reload = true;
                }
                0xE000 => {
                    self.irq_enabled = false;
                    self.irq_pending = false;
                }
                0xE001 => self.irq_enabled = true,
                _ => {}
            },
            _ => {}
        }
    }

    fn ppu_read(&self, address: u16) -> u8 {
        match address {
            0x0000..=0x1FFF => self.chr_mem[self.map_chr_address(address) % self.chr_mem.len()],
            _ => 0,
        }
    }

    fn ppu_write(&mut self, address: u16, value: u8) {
        if self.chr_is_ram {
            if let 0x0000..=0x1FFF = address {
                let len = self.chr_mem.len();
                let index = self.map_chr_address(address) % len;
                self.chr_mem[index] = value;
            }
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    fn irq_acknowledge(&mut self) {
        self.irq_pending = false;
    }

    fn ppu_address_notify(&mut self, address: u16, dot: u64) {
        let a12_high = address & 0x1000 != 0;

        if a12_high {
            if let Some(since) = self.a12_low_since {
                if dot.saturating_sub(since) >= A12_FILTER_DOTS {
                    self.clock_irq_counter();
                }
            }
            self.a12_low_since = None;
        } else if self.a12_low_since.is_none() {
            self.a12_low_since = Some(dot);
        }
    }

    fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(32 + PRG_RAM_SIZE);
        data.push(self.bank_select);
        data.extend_from_slice(&self.bank_registers);
        data.push(match self.mirroring {
            Mirroring::Vertical => 0,
            _ => 1,
        });
        data.push(self.prg_ram_protect);
        data.push(self.irq_latch);
        data.push(self.irq_counter);
        data.push(u8::from(self.irq_reload));
        data.push(u8::from(self.irq_enabled));
        data.push(u8::from(self.irq_pending));
        data.extend_from_slice(&self.prg_ram);
        if self.chr_is_ram {
            data.extend_from_slice(&self.chr_mem);
        }
        data
    }

    fn deserialize(&mut self, data: &[u8]) -> Result<(), MapperError> {
        let chr_len = if self.chr_is_ram { self.chr_mem.len() } else { 0 };
        check_snapshot_len(data, 16 + PRG_RAM_SIZE + chr_len)?;

        self.bank_select = data[0];
        self.bank_registers.copy_from_slice(&data[1..9]);
        if !self.four_screen {
            self.mirroring = if data[9] == 0 {
                Mirroring::Vertical
            } else {
                Mirroring::Horizontal
            };
        }
        self.prg_ram_protect = data[10];
        self.irq_latch = data[11];
        self.irq_counter = data[12];
        self.irq_reload = data[13] != 0;
        self.irq_enabled = data[14] != 0;
        self.irq_pending = data[15] != 0;
        self.a12_low_since = None;
        self.prg_ram.copy_from_slice(&data[16..16 + PRG_RAM_SIZE]);
        if self.chr_is_ram {
            self.chr_mem.copy_from_slice(&data[16 + PRG_RAM_SIZE..]);
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

#[cfg(test)]
mod tests {
    use super::*;

    /// Cartridge with identifiable bank markers at every bank start
    fn build_cartridge(prg_banks: usize, chr_banks: usize) -> Cartridge {
        let mut prg_rom = vec![0; prg_banks * PRG_BANK_SIZE];
        for bank in 0..prg_banks {
            prg_rom[bank * PRG_BANK_SIZE] = bank as u8;
        }
        let mut chr_rom = vec![0; chr_banks * CHR_BANK_SIZE];
        for bank in 0..chr_banks {
            chr_rom[bank * CHR_BANK_SIZE] = bank as u8;
        }
        Cartridge {
            prg_rom,
            chr_rom,
            trainer: None,
            mapper: 4,
            mirroring: Mirroring::Horizontal,
            has_battery: false,
        }
    }

    fn select_bank(mapper: &mut Mapper4, target: u8, bank: u8) {
        let mode = mapper.bank_select & 0xC0;
        mapper.cpu_write(0x8000, mode | target);
        mapper.cpu_write(0x8001, bank);
    }

    #[test]
    fn test_prg_banking_mode_0() {
        let mut mapper = Mapper4::new(build_cartridge(16, 128));

        select_bank(&mut mapper, 6, 5);
        select_bank(&mut mapper, 7, 9);

        assert_eq!(mapper.cpu_read(0x8000), 5); // R6
        assert_eq!(mapper.cpu_read(0xA000), 9); // R7
        assert_eq!(mapper.cpu_read(0xC000), 14); // fixed second-to-last
        assert_eq!(mapper.cpu_read(0xE000), 15); // fixed last
    }

    #[test]
    fn test_prg_banking_mode_1() {
        let mut mapper = Mapper4::new(build_cartridge(16, 128));

        select_bank(&mut mapper, 6, 5);
        select_bank(&mut mapper, 7, 9);
        mapper.cpu_write(0x8000, 0x46); // swap mode

        assert_eq!(mapper.cpu_read(0x8000), 14); // fixed second-to-last
        assert_eq!(mapper.cpu_read(0xA000), 9); // R7
        assert_eq!(mapper.cpu_read(0xC000), 5); // R6
        assert_eq!(mapper.cpu_read(0xE000), 15); // fixed last
    }

    #[test]
    fn test_chr_banking() {
        let mut mapper = Mapper4::new(build_cartridge(16, 128));

        select_bank(&mut mapper, 0, 4); // 2KB pair 4/5
        select_bank(&mut mapper, 1, 8); // 2KB pair 8/9
        select_bank(&mut mapper, 2, 16);
        select_bank(&mut mapper, 3, 17);
        select_bank(&mut mapper, 4, 18);
        select_bank(&mut mapper, 5, 19);

        assert_eq!(mapper.ppu_read(0x0000), 4);
        assert_eq!(mapper.ppu_read(0x0400), 5);
        assert_eq!(mapper.ppu_read(0x0800), 8);
        assert_eq!(mapper.ppu_read(0x0C00), 9);
        assert_eq!(mapper.ppu_read(0x1000), 16);
        assert_eq!(mapper.ppu_read(0x1400), 17);
        assert_eq!(mapper.ppu_read(0x1800), 18);
        assert_eq!(mapper.ppu_read(0x1C00), 19);
    }

    #[test]
    fn test_chr_a12_inversion_swaps_pattern_tables() {
        let mut mapper = Mapper4::new(build_cartridge(16, 128));

        mapper.cpu_write(0x8000, 0x80); // inversion on
        select_bank(&mut mapper, 0, 4);
        select_bank(&mut mapper, 2, 16);

        // 2KB pair now answers at $1000, the 1KB banks at $0000
        assert_eq!(mapper.ppu_read(0x1000), 4);
        assert_eq!(mapper.ppu_read(0x1400), 5);
        assert_eq!(mapper.ppu_read(0x0000), 16);
    }

    #[test]
    fn test_mirroring_register() {
        let mut mapper = Mapper4::new(build_cartridge(16, 8));

        mapper.cpu_write(0xA000, 0x00);
        assert_eq!(mapper.mirroring(), Mirroring::Vertical);
        mapper.cpu_write(0xA000, 0x01);
        assert_eq!(mapper.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn test_four_screen_ignores_mirroring_register() {
        let mut cartridge = build_cartridge(16, 8);
        cartridge.mirroring = Mirroring::FourScreen;
        let mut mapper = Mapper4::new(cartridge);

        mapper.cpu_write(0xA000, 0x01);
        assert_eq!(mapper.mirroring(), Mirroring::FourScreen);
    }

    #[test]
    fn test_prg_ram_protect() {
        let mut mapper = Mapper4::new(build_cartridge(16, 8));

        // Disabled at power-on
        mapper.cpu_write(0x6000, 0x42);
        assert_eq!(mapper.cpu_read(0x6000), 0);

        mapper.cpu_write(0xA001, 0xC0); // enable + allow writes
        mapper.cpu_write(0x6000, 0x42);
        assert_eq!(mapper.cpu_read(0x6000), 0x42);

        mapper.cpu_write(0xA001, 0x80); // read-only
        mapper.cpu_write(0x6000, 0x99);
        assert_eq!(mapper.cpu_read(0x6000), 0x42);
    }

    /// Drive one qualified A12 rising edge: hold A12 low long enough,
    /// then access a $1000-range address.
    fn qualified_a12_edge(mapper: &mut Mapper4, dot: &mut u64) {
        mapper.ppu_address_notify(0x0000, *dot);
        *dot += A12_FILTER_DOTS;
        mapper.ppu_address_notify(0x1000, *dot);
        *dot += 1;
    }

    #[test]
    fn test_irq_counter_counts_qualified_edges() {
        let mut mapper = Mapper4::new(build_cartridge(16, 8));
        let mut dot = 0u64;

        mapper.cpu_write(0xC000, 0x03); // latch = 3
        mapper.cpu_write(0xC001, 0x00); // reload
        mapper.cpu_write(0xE001, 0x00); // enable

        qualified_a12_edge(&mut mapper, &mut dot); // reload -> 3
        qualified_a12_edge(&mut mapper, &mut dot); // 2
        qualified_a12_edge(&mut mapper, &mut dot); // 1
        assert!(!mapper.irq_pending());

        qualified_a12_edge(&mut mapper, &mut dot); // 0 -> IRQ
        assert!(mapper.irq_pending());
    }

    #[test]
    fn test_short_a12_toggles_are_filtered() {
        let mut mapper = Mapper4::new(build_cartridge(16, 8));

        mapper.cpu_write(0xC000, 0x01);
        mapper.cpu_write(0xC001, 0x00);
        mapper.cpu_write(0xE001, 0x00);

        // A12 bounces low/high within a tile fetch: low phase too short
        let mut dot = 0;
        for _ in 0..32 {
            mapper.ppu_address_notify(0x0000, dot);
            mapper.ppu_address_notify(0x1000, dot + 2);
            dot += 4;
        }
        assert!(!mapper.irq_pending());
    }

    #[test]
    fn test_irq_disable_acknowledges() {
        let mut mapper = Mapper4::new(build_cartridge(16, 8));
        let mut dot = 0u64;

        mapper.cpu_write(0xC000, 0x00); // latch 0 fires on every clock
        mapper.cpu_write(0xC001, 0x00);
        mapper.cpu_write(0xE001, 0x00);
        qualified_a12_edge(&mut mapper, &mut dot);
        assert!(mapper.irq_pending());

        mapper.cpu_write(0xE000, 0x00);
        assert!(!mapper.irq_pending());
    }

    #[test]
    fn test_irq_acknowledge_keeps_enable() {
        let mut mapper = Mapper4::new(build_cartridge(16, 8));
        let mut dot = 0u64;

        mapper.cpu_write(0xC000, 0x00);
        mapper.cpu_write(0xC001, 0x00);
        mapper.cpu_write(0xE001, 0x00);
        qualified_a12_edge(&mut mapper, &mut dot);
        assert!(mapper.irq_pending());

        mapper.irq_acknowledge();
        assert!(!mapper.irq_pending());

        // Still enabled: the next zero crossing asserts again
        qualified_a12_edge(&mut mapper, &mut dot);
        assert!(mapper.irq_pending());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut mapper = Mapper4::new(build_cartridge(16, 8));
        select_bank(&mut mapper, 6, 5);
        mapper.cpu_write(0xA001, 0xC0);
        mapper.cpu_write(0x6000, 0x5A);
        mapper.cpu_write(0xC000, 0x10);

        let blob = mapper.serialize();
        let mut restored = Mapper4::new(build_cartridge(16, 8));
        restored.deserialize(&blob).unwrap();

        assert_eq!(restored.cpu_read(0x8000), 5);
        assert_eq!(restored.cpu_read(0x6000), 0x5A);
        assert_eq!(restored.irq_latch, 0x10);
    }
}
