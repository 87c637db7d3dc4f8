// Flag manipulation instructions for the 6502 core

use crate::cpu::{flags, Cpu};

impl Cpu {
    /// CLC - Clear Carry Flag
    pub fn clc(&mut self) {
        self.clear_flag(flags::CARRY);
    }

    /// SEC - Set Carry Flag
    pub fn sec(&mut self) {
        self.set_flag(flags::CARRY);
    }

    /// CLI - Clear Interrupt Disable
    pub fn cli(&mut self) {
        self.clear_flag(flags::INTERRUPT_DISABLE);
    }

    /// SEI - Set Interrupt Disable
    pub fn sei(&mut self) {
        self.set_flag(flags::INTERRUPT_DISABLE);
    }

    /// CLD - Clear Decimal Mode (stored only; the ALU ignores it)
    pub fn cld(&mut self) {
        self.clear_flag(flags::DECIMAL);
    }

    /// SED - Set Decimal Mode (stored only; the ALU ignores it)
    pub fn sed(&mut self) {
        self.set_flag(flags::DECIMAL);
    }

    /// CLV - Clear Overflow Flag
    pub fn clv(&mut self) {
        self.clear_flag(flags::OVERFLOW);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carry_set_clear() {
        let mut cpu = Cpu::new();
        cpu.sec();
        assert!(cpu.get_carry());
        cpu.clc();
        assert!(!cpu.get_carry());
    }

    #[test]
    fn test_interrupt_disable_set_clear() {
        let mut cpu = Cpu::new();
        cpu.cli();
        assert!(!cpu.get_interrupt_disable());
        cpu.sei();
        assert!(cpu.get_interrupt_disable());
    }

    #[test]
    fn test_decimal_is_stored() {
        let mut cpu = Cpu::new();
        cpu.sed();
        assert!(cpu.get_flag(flags::DECIMAL));
        cpu.cld();
        assert!(!cpu.get_flag(flags::DECIMAL));
    }

    #[test]
    fn test_clv() {
        let mut cpu = Cpu::new();
        cpu.set_flag(flags::OVERFLOW);
        cpu.clv();
        assert!(!cpu.get_overflow());
    }
}
