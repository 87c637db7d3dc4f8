// Compare instructions for the 6502 core
//
// A compare is a subtraction that only updates flags: C when the register
// is >= the operand (unsigned), Z on equality, N from the difference.

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::{flags, Cpu};

impl Cpu {
    /// CMP - Compare Accumulator
    pub fn cmp(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        let value = self.read_operand(bus, addr_result);
        self.compare(self.a, value);
    }

    /// CPX - Compare X Register
    pub fn cpx(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        let value = self.read_operand(bus, addr_result);
        self.compare(self.x, value);
    }

    /// CPY - Compare Y Register
    pub fn cpy(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        let value = self.read_operand(bus, addr_result);
        self.compare(self.y, value);
    }

    fn compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.update_flag(flags::CARRY, register >= value);
        self.update_zero_and_negative_flags(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imm(value: u8) -> AddressingResult {
        AddressingResult::immediate(value)
    }

    #[test]
    fn test_cmp_greater() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();

        cpu.a = 0x50;
        cpu.cmp(&mut bus, &imm(0x30));
        assert!(cpu.get_carry());
        assert!(!cpu.get_zero());
    }

    #[test]
    fn test_cmp_equal() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();

        cpu.a = 0x42;
        cpu.cmp(&mut bus, &imm(0x42));
        assert!(cpu.get_carry());
        assert!(cpu.get_zero());
    }

    #[test]
    fn test_cmp_less_sets_negative() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();

        cpu.a = 0x10;
        cpu.cmp(&mut bus, &imm(0x20));
        assert!(!cpu.get_carry());
        assert!(cpu.get_negative());
    }

    #[test]
    fn test_cpx_cpy() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();

        cpu.x = 0x05;
        cpu.cpx(&mut bus, &imm(0x05));
        assert!(cpu.get_zero());

        cpu.y = 0x01;
        cpu.cpy(&mut bus, &imm(0x02));
        assert!(!cpu.get_carry());
    }
}
