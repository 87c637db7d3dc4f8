// nestest CPU conformance test
//
// Runs the nestest ROM in automation mode (PC forced to $C000) and checks
// every trace line against the golden log: PC, opcode bytes, registers,
// and cycle count. The golden log's PPU column is ignored.
//
// ROM and log are not checked in; place them at:
//   tests/roms/nestest.nes
//   tests/roms/nestest.log

use std::fs;

use famicore::Emulator;

const ROM_PATH: &str = "tests/roms/nestest.nes";
const LOG_PATH: &str = "tests/roms/nestest.log";

/// Official-opcode run length of the golden log
const OFFICIAL_LINES: usize = 5003;

/// Compare one emitted line against a golden line, ignoring the golden
/// PPU column: everything before it must match, as must the CYC field.
fn lines_match(ours: &str, golden: &str) -> bool {
    let golden_head = match golden.find(" PPU:") {
        Some(index) => &golden[..index],
        None => golden,
    };
    if !ours.starts_with(golden_head) {
        return false;
    }

    let golden_cyc = golden.rsplit("CYC:").next();
    let our_cyc = ours.rsplit("CYC:").next();
    golden_cyc == our_cyc
}

#[test]
#[ignore = "needs tests/roms/nestest.nes; run with: cargo test nestest -- --ignored"]
fn nestest_official_opcodes() {
    let golden_log = fs::read_to_string(LOG_PATH).expect("golden log missing");
    let golden_lines: Vec<&str> = golden_log.lines().collect();

    let mut emulator = Emulator::from_ines_file(ROM_PATH).expect("nestest ROM missing");

    // Automation mode starts at $C000 with 7 cycles on the clock
    emulator.cpu_mut().pc = 0xC000;
    emulator.cpu_mut().cycles = 7;

    let mut mismatches = Vec::new();
    for (line_number, golden) in golden_lines.iter().take(OFFICIAL_LINES).enumerate() {
        let ours = emulator.trace();
        if !lines_match(&ours, golden) {
            mismatches.push((line_number + 1, ours.clone(), golden.to_string()));
            if mismatches.len() <= 10 {
                println!("mismatch at line {}:", line_number + 1);
                println!("  expected: {}", golden);
                println!("  got:      {}", ours);
            }
        }
        emulator.step();
    }

    // nestest reports failure codes in $02/$03
    let code_02 = emulator.bus_mut().read(0x02);
    let code_03 = emulator.bus_mut().read(0x03);

    assert!(
        mismatches.is_empty(),
        "{} trace mismatches (first at line {})",
        mismatches.len(),
        mismatches[0].0
    );
    assert_eq!((code_02, code_03), (0, 0), "nestest error codes");
}
