// Bus module - CPU-visible address space and lockstep clocking
//
// The bus owns the PPU, APU, and controller ports, and shares the mapper
// with the PPU. Besides address decoding it carries the timing glue: for
// every CPU cycle ticked through it, the PPU advances 3 dots and the APU
// 1 cycle, DMC sample fetches are serviced (4 stall cycles each), and OAM
// DMA copies cost 513/514 stall cycles depending on alignment.
//
// # NES Memory Map (CPU Address Space)
//
// ```text
// $0000-$07FF: 2KB internal RAM
// $0800-$1FFF: Mirrors of RAM (3 times)
// $2000-$2007: PPU registers
// $2008-$3FFF: Mirrors of PPU registers (every 8 bytes)
// $4000-$4013: APU channel registers
// $4014:       OAM DMA trigger
// $4015:       APU status
// $4016:       Controller 1 data / strobe
// $4017:       Controller 2 data (read), APU frame counter (write)
// $4018-$401F: CPU test mode (disabled)
// $4020-$FFFF: Cartridge space (PRG-ROM, PRG-RAM, mapper registers)
// ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::apu::Apu;
use crate::cartridge::Mapper;
use crate::input::ControllerIo;
use crate::ppu::Ppu;

/// Size of the mapperless cartridge-space fallback ($4020-$FFFF)
const FALLBACK_ROM_SIZE: usize = 0xC000;

/// Main memory bus structure
pub struct Bus {
    /// 2KB internal RAM, mirrored through $1FFF
    ram: [u8; 2048],
    /// Picture processing unit (registers at $2000-$2007)
    pub(crate) ppu: Ppu,
    /// Audio processing unit (registers at $4000-$4017)
    pub(crate) apu: Apu,
    /// Two controller shift registers at $4016/$4017
    pub(crate) controllers: ControllerIo,
    /// Cartridge mapper, shared with the PPU
    mapper: Option<Rc<RefCell<Box<dyn Mapper>>>>,

    /// Writable stand-in for cartridge space while no mapper is attached;
    /// lets CPU-level tests and benches run raw programs
    fallback_rom: Box<[u8; FALLBACK_ROM_SIZE]>,

    /// Last value driven on the bus (returned for unmapped reads)
    open_bus: u8,
    /// Stall cycles owed to the CPU from DMA activity
    dma_stall: u32,
    /// CPU cycles ticked so far; parity picks the OAM DMA cost
    cpu_cycles: u64,
}

impl Bus {
    /// Create a new bus with power-on components and no cartridge
    pub fn new() -> Self {
        Bus {
            ram: [0; 2048],
            ppu: Ppu::new(),
            apu: Apu::new(),
            controllers: ControllerIo::new(),
            mapper: None,
            fallback_rom: Box::new([0; FALLBACK_ROM_SIZE]),
            open_bus: 0,
            dma_stall: 0,
            cpu_cycles: 0,
        }
    }

    /// Attach the cartridge mapper and share it with the PPU
    pub fn attach_mapper(&mut self, mapper: Rc<RefCell<Box<dyn Mapper>>>) {
        self.ppu.set_mapper(mapper.clone());
        self.mapper = Some(mapper);
    }

    /// Read a byte from the bus (with full register side effects)
    pub fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],

            0x2000..=0x3FFF => self.ppu.read_register(addr),

            0x4015 => self.apu.read_status(),

            0x4016 => {
                let bit = self.controllers.read(0);
                (self.open_bus & 0xE0) | bit
            }
            0x4017 => {
                let bit = self.controllers.read(1);
                (self.open_bus & 0xE0) | bit
            }

            // Write-only APU registers and the disabled test range
            0x4000..=0x4014 | 0x4018..=0x401F => self.open_bus,

            0x4020..=0xFFFF => match &self.mapper {
                Some(mapper) => mapper.borrow().cpu_read(addr),
                None => self.fallback_rom[(addr - 0x4020) as usize],
            },
        };

        self.open_bus = value;
        value
    }

    /// Read without side effects (trace/disassembly only)
    ///
    /// Registers whose reads have side effects report the open-bus value
    /// instead of disturbing hardware state.
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x401F => self.open_bus,
            0x4020..=0xFFFF => match &self.mapper {
                Some(mapper) => mapper.borrow().cpu_read(addr),
                None => self.fallback_rom[(addr - 0x4020) as usize],
            },
        }
    }

    /// Write a byte to the bus
    pub fn write(&mut self, addr: u16, data: u8) {
        self.open_bus = data;

        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,

            0x2000..=0x3FFF => self.ppu.write_register(addr, data),

            0x4014 => self.oam_dma(data),

            0x4016 => self.controllers.write_strobe(data),

            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write_register(addr, data),

            0x4018..=0x401F => {
                // CPU test mode is disabled on production hardware
            }

            0x4020..=0xFFFF => match &self.mapper {
                Some(mapper) => mapper.borrow_mut().cpu_write(addr, data),
                None => self.fallback_rom[(addr - 0x4020) as usize] = data,
            },
        }
    }

    /// Read a 16-bit little-endian word
    pub fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Write a 16-bit little-endian word
    pub fn write_u16(&mut self, addr: u16, data: u16) {
        self.write(addr, data as u8);
        self.write(addr.wrapping_add(1), (data >> 8) as u8);
    }

    /// $4014 write: copy a 256-byte page into OAM
    ///
    /// The CPU is halted for 513 cycles (514 when the write lands on an
    /// odd cycle); the stall is drained by the integrator, which keeps
    /// the PPU and APU ticking through it.
    fn oam_dma(&mut self, page: u8) {
        let base = (page as u16) << 8;
        let start = self.ppu.oam_addr;
        for i in 0..256u16 {
            let value = self.read(base + i);
            self.ppu.write_oam(start.wrapping_add(i as u8), value);
        }

        self.dma_stall += 513 + (self.cpu_cycles & 1) as u32;
    }

    /// Advance the PPU and APU in lockstep with `cpu_cycles` CPU cycles
    ///
    /// Per CPU cycle: 3 PPU dots, 1 APU cycle, and any DMC fetch the APU
    /// requested (serviced here because only the bus can read memory).
    pub fn tick(&mut self, cpu_cycles: u32) {
        for _ in 0..cpu_cycles {
            self.ppu.tick();
            self.ppu.tick();
            self.ppu.tick();

            self.apu.tick();
            if let Some(addr) = self.apu.dmc_fetch_address() {
                let byte = self.read(addr);
                self.apu.load_dmc_sample(byte);
                self.dma_stall += 4;
            }

            self.cpu_cycles += 1;
        }
    }

    /// Consume the latched PPU NMI edge
    pub fn take_nmi(&mut self) -> bool {
        self.ppu.take_nmi()
    }

    /// Level of the combined IRQ line (APU frame, APU DMC, mapper)
    pub fn irq_asserted(&self) -> bool {
        if self.apu.irq_pending() {
            return true;
        }
        match &self.mapper {
            Some(mapper) => mapper.borrow().irq_pending(),
            None => false,
        }
    }

    /// Take the stall cycles accumulated by DMA activity
    pub fn take_dma_stall(&mut self) -> u32 {
        std::mem::take(&mut self.dma_stall)
    }

    /// CPU cycles ticked through the bus so far
    pub fn cpu_cycles(&self) -> u64 {
        self.cpu_cycles
    }

    /// Borrow the PPU
    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    /// Borrow the PPU mutably
    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    /// Borrow the APU
    pub fn apu(&self) -> &Apu {
        &self.apu
    }

    /// Borrow the APU mutably
    pub fn apu_mut(&mut self) -> &mut Apu {
        &mut self.apu
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable bus snapshot (RAM, controllers, timing glue)
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BusState {
    ram: Vec<u8>,
    controllers: ControllerIo,
    open_bus: u8,
    dma_stall: u32,
    cpu_cycles: u64,
}

impl BusState {
    /// Whether the RAM image length matches the hardware
    pub fn is_valid(&self) -> bool {
        self.ram.len() == 2048
    }
}

impl Bus {
    /// Capture a snapshot of the bus-owned state (excluding PPU/APU/mapper,
    /// which snapshot themselves)
    pub fn save_state(&self) -> BusState {
        BusState {
            ram: self.ram.to_vec(),
            controllers: self.controllers.clone(),
            open_bus: self.open_bus,
            dma_stall: self.dma_stall,
            cpu_cycles: self.cpu_cycles,
        }
    }

    /// Restore a snapshot; returns false when the RAM image length is wrong
    pub fn load_state(&mut self, state: &BusState) -> bool {
        if state.ram.len() != self.ram.len() {
            return false;
        }
        self.ram.copy_from_slice(&state.ram);
        self.controllers = state.controllers.clone();
        self.open_bus = state.open_bus;
        self.dma_stall = state.dma_stall;
        self.cpu_cycles = state.cpu_cycles;
        true
    }
}
