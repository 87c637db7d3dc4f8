// Power-on and reset state tests

use crate::apu::Apu;

#[test]
fn test_power_on_status_is_clear() {
    let mut apu = Apu::new();
    assert_eq!(apu.read_status(), 0x00);
}

#[test]
fn test_power_on_sample_is_silence() {
    let apu = Apu::new();
    assert_eq!(apu.sample(), 0.0);
}

#[test]
fn test_enabled_channel_reports_in_status() {
    let mut apu = Apu::new();

    apu.write_register(0x4015, 0x01);
    apu.write_register(0x4003, 0x08); // load pulse 1 length
    assert_eq!(apu.read_status() & 0x01, 0x01);
}

#[test]
fn test_disabling_channel_clears_length() {
    let mut apu = Apu::new();

    apu.write_register(0x4015, 0x01);
    apu.write_register(0x4003, 0x08);
    apu.write_register(0x4015, 0x00);
    assert_eq!(apu.read_status() & 0x01, 0x00);
}

#[test]
fn test_length_load_blocked_while_disabled() {
    let mut apu = Apu::new();

    apu.write_register(0x4003, 0x08);
    assert_eq!(apu.read_status() & 0x01, 0x00);
}

#[test]
fn test_reset_silences_everything() {
    let mut apu = Apu::new();

    apu.write_register(0x4015, 0x0F);
    apu.write_register(0x4003, 0x08);
    apu.write_register(0x4007, 0x08);
    apu.reset();

    assert_eq!(apu.read_status() & 0x1F, 0x00);
}

#[test]
fn test_dmc_enable_restarts_sample() {
    let mut apu = Apu::new();

    apu.write_register(0x4012, 0x00);
    apu.write_register(0x4013, 0x01); // 17 bytes
    apu.write_register(0x4015, 0x10);

    assert_eq!(apu.read_status() & 0x10, 0x10, "DMC has bytes remaining");
    assert_eq!(apu.dmc_fetch_address(), Some(0xC000));
}
