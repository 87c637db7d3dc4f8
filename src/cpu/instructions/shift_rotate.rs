// Shift and rotate instructions for the 6502 core
//
// All four operate either on the accumulator or read-modify-write on
// memory; the dispatcher passes which form was encoded.

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::{flags, Cpu};

impl Cpu {
    /// ASL - Arithmetic Shift Left
    ///
    /// Bit 7 goes to carry; bit 0 is filled with 0.
    ///
    /// Flags affected: C, Z, N
    pub fn asl(&mut self, bus: &mut Bus, addr_result: &AddressingResult, accumulator: bool) {
        let value = self.rmw_operand(bus, addr_result, accumulator);
        let result = value << 1;
        self.update_flag(flags::CARRY, value & 0x80 != 0);
        self.rmw_commit(bus, addr_result, accumulator, result);
    }

    /// LSR - Logical Shift Right
    ///
    /// Bit 0 goes to carry; bit 7 is filled with 0.
    ///
    /// Flags affected: C, Z, N (N always cleared)
    pub fn lsr(&mut self, bus: &mut Bus, addr_result: &AddressingResult, accumulator: bool) {
        let value = self.rmw_operand(bus, addr_result, accumulator);
        let result = value >> 1;
        self.update_flag(flags::CARRY, value & 0x01 != 0);
        self.rmw_commit(bus, addr_result, accumulator, result);
    }

    /// ROL - Rotate Left through carry
    ///
    /// Flags affected: C, Z, N
    pub fn rol(&mut self, bus: &mut Bus, addr_result: &AddressingResult, accumulator: bool) {
        let value = self.rmw_operand(bus, addr_result, accumulator);
        let result = (value << 1) | u8::from(self.get_carry());
        self.update_flag(flags::CARRY, value & 0x80 != 0);
        self.rmw_commit(bus, addr_result, accumulator, result);
    }

    /// ROR - Rotate Right through carry
    ///
    /// Flags affected: C, Z, N
    pub fn ror(&mut self, bus: &mut Bus, addr_result: &AddressingResult, accumulator: bool) {
        let value = self.rmw_operand(bus, addr_result, accumulator);
        let result = (value >> 1) | (u8::from(self.get_carry()) << 7);
        self.update_flag(flags::CARRY, value & 0x01 != 0);
        self.rmw_commit(bus, addr_result, accumulator, result);
    }

    /// Fetch the value a read-modify-write instruction operates on
    fn rmw_operand(&self, bus: &mut Bus, addr_result: &AddressingResult, accumulator: bool) -> u8 {
        if accumulator {
            self.a
        } else {
            bus.read(addr_result.address)
        }
    }

    /// Write back a read-modify-write result and set Z/N
    fn rmw_commit(
        &mut self,
        bus: &mut Bus,
        addr_result: &AddressingResult,
        accumulator: bool,
        result: u8,
    ) {
        if accumulator {
            self.a = result;
        } else {
            bus.write(addr_result.address, result);
        }
        self.update_zero_and_negative_flags(result);
    }
}
