// Logical instructions for the 6502 core

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::{flags, Cpu};

impl Cpu {
    /// AND - Logical AND with accumulator
    ///
    /// Flags affected: Z, N
    pub fn and(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        self.a &= self.read_operand(bus, addr_result);
        self.update_zero_and_negative_flags(self.a);
    }

    /// ORA - Logical OR with accumulator
    ///
    /// Flags affected: Z, N
    pub fn ora(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        self.a |= self.read_operand(bus, addr_result);
        self.update_zero_and_negative_flags(self.a);
    }

    /// EOR - Exclusive OR with accumulator
    ///
    /// Flags affected: Z, N
    pub fn eor(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        self.a ^= self.read_operand(bus, addr_result);
        self.update_zero_and_negative_flags(self.a);
    }

    /// BIT - Bit Test
    ///
    /// Z from A & M; N and V copied from bits 7 and 6 of the operand.
    ///
    /// Flags affected: Z, V, N
    pub fn bit(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        let value = self.read_operand(bus, addr_result);
        self.update_flag(flags::ZERO, self.a & value == 0);
        self.update_flag(flags::NEGATIVE, value & 0x80 != 0);
        self.update_flag(flags::OVERFLOW, value & 0x40 != 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imm(value: u8) -> AddressingResult {
        AddressingResult::immediate(value)
    }

    #[test]
    fn test_and_or_eor() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();

        cpu.a = 0b1100_1100;
        cpu.and(&mut bus, &imm(0b1010_1010));
        assert_eq!(cpu.a, 0b1000_1000);
        assert!(cpu.get_negative());

        cpu.ora(&mut bus, &imm(0b0000_0111));
        assert_eq!(cpu.a, 0b1000_1111);

        cpu.eor(&mut bus, &imm(0b1000_1111));
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.get_zero());
    }

    #[test]
    fn test_bit_copies_operand_high_bits() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();
        bus.write(0x0030, 0xC0);

        cpu.a = 0x00;
        cpu.bit(&mut bus, &AddressingResult::new(0x0030));
        assert!(cpu.get_zero());
        assert!(cpu.get_negative());
        assert!(cpu.get_overflow());

        bus.write(0x0030, 0x01);
        cpu.a = 0x01;
        cpu.bit(&mut bus, &AddressingResult::new(0x0030));
        assert!(!cpu.get_zero());
        assert!(!cpu.get_negative());
        assert!(!cpu.get_overflow());
    }
}
