// Mapper behavior through the full system

use famicore::{Cartridge, Emulator, Mirroring};

/// MMC1 cartridge: 8 PRG banks, each starting with its bank number, with
/// the reset vector in the fixed last bank.
fn mmc1_cartridge() -> Cartridge {
    let mut prg_rom = vec![0xEA; 8 * 16 * 1024];
    for bank in 0..8 {
        prg_rom[bank * 16 * 1024] = bank as u8;
    }
    // Reset vector lives in the last bank, visible at $FFFC
    let last = 7 * 16 * 1024;
    prg_rom[last + 0x3FFC] = 0x02;
    prg_rom[last + 0x3FFD] = 0xC0;

    Cartridge {
        prg_rom,
        chr_rom: vec![0; 8 * 1024],
        trainer: None,
        mapper: 1,
        mirroring: Mirroring::Horizontal,
        has_battery: true,
    }
}

/// Shift a 5-bit value into an MMC1 register through the system bus
fn mmc1_serial_write(emulator: &mut Emulator, addr: u16, value: u8) {
    for bit in 0..5 {
        emulator.bus_mut().write(addr, (value >> bit) & 0x01);
    }
}

#[test]
fn test_mmc1_power_on_maps_last_bank_high() {
    let mut emulator = Emulator::new(mmc1_cartridge()).unwrap();

    assert_eq!(emulator.cpu().pc, 0xC002, "reset vector from the fixed bank");
    assert_eq!(emulator.bus_mut().read(0xC000), 7);
    assert_eq!(emulator.bus_mut().read(0x8000), 0);
}

#[test]
fn test_mmc1_prg_switch_keeps_fixed_bank() {
    let mut emulator = Emulator::new(mmc1_cartridge()).unwrap();

    mmc1_serial_write(&mut emulator, 0xE000, 3);
    assert_eq!(emulator.bus_mut().read(0x8000), 3);
    assert_eq!(emulator.bus_mut().read(0xC000), 7, "last bank stays fixed");
}

#[test]
fn test_mmc1_shift_register_needs_five_writes() {
    let mut emulator = Emulator::new(mmc1_cartridge()).unwrap();

    for _ in 0..4 {
        emulator.bus_mut().write(0xE000, 0x01);
    }
    assert_eq!(emulator.bus_mut().read(0x8000), 0, "four writes commit nothing");

    emulator.bus_mut().write(0xE000, 0x00); // fifth write: value 0b01111
    assert_eq!(emulator.bus_mut().read(0x8000), 7);
}

#[test]
fn test_mmc1_reset_bit_aborts_sequence() {
    let mut emulator = Emulator::new(mmc1_cartridge()).unwrap();

    emulator.bus_mut().write(0xE000, 0x01);
    emulator.bus_mut().write(0xE000, 0x80); // reset
    mmc1_serial_write(&mut emulator, 0xE000, 5);
    assert_eq!(emulator.bus_mut().read(0x8000), 5);
}

#[test]
fn test_battery_ram_survives_round_trip() {
    let mut emulator = Emulator::new(mmc1_cartridge()).unwrap();

    emulator.bus_mut().write(0x6000, 0x5A);
    emulator.bus_mut().write(0x7FFF, 0xA5);

    let ram = emulator.battery_ram().expect("battery board");
    let mut emulator2 = Emulator::new(mmc1_cartridge()).unwrap();
    emulator2.set_battery_ram(&ram);

    assert_eq!(emulator2.bus_mut().read(0x6000), 0x5A);
    assert_eq!(emulator2.bus_mut().read(0x7FFF), 0xA5);
}

#[test]
fn test_uxrom_bank_switch_through_system() {
    let mut prg_rom = vec![0xEA; 8 * 16 * 1024];
    for bank in 0..8 {
        prg_rom[bank * 16 * 1024] = 0x10 + bank as u8;
    }
    let last = 7 * 16 * 1024;
    prg_rom[last + 0x3FFC] = 0x00;
    prg_rom[last + 0x3FFD] = 0xC0;

    let cartridge = Cartridge {
        prg_rom,
        chr_rom: vec![],
        trainer: None,
        mapper: 2,
        mirroring: Mirroring::Vertical,
        has_battery: false,
    };
    let mut emulator = Emulator::new(cartridge).unwrap();

    assert_eq!(emulator.bus_mut().read(0xC000), 0x17, "fixed last bank");
    emulator.bus_mut().write(0x8000, 0x03);
    assert_eq!(emulator.bus_mut().read(0x8000), 0x13);
}

#[test]
fn test_cnrom_chr_bank_switch_reaches_ppu() {
    let mut chr_rom = vec![0; 4 * 8 * 1024];
    for bank in 0..4 {
        chr_rom[bank * 8 * 1024] = 0x20 + bank as u8;
    }
    let mut prg_rom = vec![0xEA; 32 * 1024];
    prg_rom[0x7FFC] = 0x00;
    prg_rom[0x7FFD] = 0x80;

    let cartridge = Cartridge {
        prg_rom,
        chr_rom,
        trainer: None,
        mapper: 3,
        mirroring: Mirroring::Horizontal,
        has_battery: false,
    };
    let mut emulator = Emulator::new(cartridge).unwrap();

    emulator.bus_mut().write(0x8000, 0x02);

    // Read pattern table through $2006/$2007 (first read primes the buffer)
    let bus = emulator.bus_mut();
    bus.write(0x2006, 0x00);
    bus.write(0x2006, 0x00);
    let _ = bus.read(0x2007);
    assert_eq!(bus.read(0x2007), 0x22);
}

#[test]
fn test_mmc3_scanline_irq_fires_during_rendering() {
    // MMC3 board with sprites on $0000 and background on $1000: the
    // background pattern fetches give one qualified A12 rise per scanline.
    let mut prg_rom = vec![0xEA; 4 * 16 * 1024];
    let last = prg_rom.len() - 16 * 1024;
    prg_rom[last + 0x3FFC] = 0x00;
    prg_rom[last + 0x3FFD] = 0x80;

    let cartridge = Cartridge {
        prg_rom,
        chr_rom: vec![0; 8 * 1024],
        trainer: None,
        mapper: 4,
        mirroring: Mirroring::Horizontal,
        has_battery: false,
    };
    let mut emulator = Emulator::new(cartridge).unwrap();

    {
        let bus = emulator.bus_mut();
        // Background table at $1000, sprites at $0000
        bus.write(0x2000, 0x10);
        // Enable background rendering
        bus.write(0x2001, 0x0A);
        // IRQ after 16 scanline clocks
        bus.write(0xC000, 16); // latch
        bus.write(0xC001, 0x00); // reload
        bus.write(0xE001, 0x00); // enable
    }

    // Run two frames; the counter reaches zero well within them
    emulator.run_frame();
    emulator.run_frame();

    let mapper_irq = emulator.bus().irq_asserted();
    assert!(mapper_irq, "MMC3 scanline counter must assert IRQ");
}

#[test]
fn test_mmc3_irq_disable_acknowledges() {
    let mut prg_rom = vec![0xEA; 4 * 16 * 1024];
    let last = prg_rom.len() - 16 * 1024;
    prg_rom[last + 0x3FFC] = 0x00;
    prg_rom[last + 0x3FFD] = 0x80;

    let cartridge = Cartridge {
        prg_rom,
        chr_rom: vec![0; 8 * 1024],
        trainer: None,
        mapper: 4,
        mirroring: Mirroring::Horizontal,
        has_battery: false,
    };
    let mut emulator = Emulator::new(cartridge).unwrap();

    {
        let bus = emulator.bus_mut();
        bus.write(0x2000, 0x10);
        bus.write(0x2001, 0x0A);
        bus.write(0xC000, 4);
        bus.write(0xC001, 0x00);
        bus.write(0xE001, 0x00);
    }

    emulator.run_frame();
    emulator.run_frame();
    assert!(emulator.bus().irq_asserted());

    emulator.bus_mut().write(0xE000, 0x00);
    assert!(!emulator.bus().irq_asserted());
}

#[test]
fn test_unsupported_mapper_is_rejected() {
    let cartridge = Cartridge {
        prg_rom: vec![0; 16 * 1024],
        chr_rom: vec![],
        trainer: None,
        mapper: 66,
        mirroring: Mirroring::Horizontal,
        has_battery: false,
    };
    assert!(Emulator::new(cartridge).is_err());
}
