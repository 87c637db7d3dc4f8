// Load and Store instructions for the 6502 core

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::Cpu;

impl Cpu {
    // ========================================
    // Load Instructions
    // ========================================
    // Loads copy memory into a register and update Z and N.

    /// LDA - Load Accumulator
    ///
    /// Flags affected: Z, N
    pub fn lda(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        let value = self.read_operand(bus, addr_result);
        self.a = value;
        self.update_zero_and_negative_flags(value);
    }

    /// LDX - Load X Register
    ///
    /// Flags affected: Z, N
    pub fn ldx(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        let value = self.read_operand(bus, addr_result);
        self.x = value;
        self.update_zero_and_negative_flags(value);
    }

    /// LDY - Load Y Register
    ///
    /// Flags affected: Z, N
    pub fn ldy(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        let value = self.read_operand(bus, addr_result);
        self.y = value;
        self.update_zero_and_negative_flags(value);
    }

    // ========================================
    // Store Instructions
    // ========================================
    // Stores write a register to memory and touch no flags.

    /// STA - Store Accumulator
    pub fn sta(&self, bus: &mut Bus, addr_result: &AddressingResult) {
        bus.write(addr_result.address, self.a);
    }

    /// STX - Store X Register
    pub fn stx(&self, bus: &mut Bus, addr_result: &AddressingResult) {
        bus.write(addr_result.address, self.x);
    }

    /// STY - Store Y Register
    pub fn sty(&self, bus: &mut Bus, addr_result: &AddressingResult) {
        bus.write(addr_result.address, self.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lda_sets_zero_flag() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();

        cpu.lda(&mut bus, &AddressingResult::immediate(0x00));
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.get_zero());
        assert!(!cpu.get_negative());
    }

    #[test]
    fn test_lda_sets_negative_flag() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();

        cpu.lda(&mut bus, &AddressingResult::immediate(0x85));
        assert_eq!(cpu.a, 0x85);
        assert!(cpu.get_negative());
    }

    #[test]
    fn test_ldx_ldy_from_memory() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();
        bus.write(0x0042, 0x11);
        bus.write(0x0043, 0x22);

        cpu.ldx(&mut bus, &AddressingResult::new(0x0042));
        cpu.ldy(&mut bus, &AddressingResult::new(0x0043));
        assert_eq!(cpu.x, 0x11);
        assert_eq!(cpu.y, 0x22);
    }

    #[test]
    fn test_stores_do_not_touch_flags() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();
        cpu.a = 0x00;
        cpu.x = 0x80;
        cpu.y = 0x7F;
        let status = cpu.status;

        cpu.sta(&mut bus, &AddressingResult::new(0x0010));
        cpu.stx(&mut bus, &AddressingResult::new(0x0011));
        cpu.sty(&mut bus, &AddressingResult::new(0x0012));

        assert_eq!(bus.read(0x0010), 0x00);
        assert_eq!(bus.read(0x0011), 0x80);
        assert_eq!(bus.read(0x0012), 0x7F);
        assert_eq!(cpu.status, status);
    }
}
