//! CB-prefixed page: rotates/shifts, BIT/RES/SET, and the DDCB/FDCB
//! indexed forms with their undocumented register-copy behavior.

use super::{IndexMode, Z80};
use crate::core::Bus;
use crate::cpu::alu;
use crate::cpu::flags::FLAG_53;

impl Z80 {
    /// Rotate/shift select: RLC RRC RL RR SLA SRA SLL SRL.
    fn rotate(&mut self, which: u8, v: u8) -> u8 {
        match which & 7 {
            0 => alu::rlc(&mut self.f, v),
            1 => alu::rrc(&mut self.f, v),
            2 => alu::rl(&mut self.f, v),
            3 => alu::rr(&mut self.f, v),
            4 => alu::sla(&mut self.f, v),
            5 => alu::sra(&mut self.f, v),
            6 => alu::sll(&mut self.f, v),
            _ => alu::srl(&mut self.f, v),
        }
    }

    fn cb_read_reg(&self, idx: u8) -> u8 {
        match idx & 7 {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            _ => self.a,
        }
    }

    fn cb_write_reg(&mut self, idx: u8, v: u8) {
        match idx & 7 {
            0 => self.b = v,
            1 => self.c = v,
            2 => self.d = v,
            3 => self.e = v,
            4 => self.h = v,
            5 => self.l = v,
            _ => self.a = v,
        }
    }

    pub(super) fn dispatch_cb<B: Bus<Address = u16>>(&mut self, bus: &mut B) {
        let op = self.fetch_opcode(bus);
        let idx = op & 7;
        let mask = 1u8 << ((op >> 3) & 7);

        if idx == 6 {
            let hl = self.hl();
            let v = self.peek8(bus, hl);
            match op >> 6 {
                0 => {
                    let v = self.rotate(op >> 3, v);
                    self.ticks += 1;
                    self.poke8(bus, hl, v);
                }
                1 => {
                    // BIT n,(HL): bits 5/3 leak from MEMPTR
                    alu::bit_test(&mut self.f, mask, v);
                    self.f.bits =
                        (self.f.bits & !FLAG_53) | ((self.memptr >> 8) as u8 & FLAG_53);
                    self.ticks += 1;
                }
                2 => {
                    self.ticks += 1;
                    self.poke8(bus, hl, v & !mask);
                }
                _ => {
                    self.ticks += 1;
                    self.poke8(bus, hl, v | mask);
                }
            }
        } else {
            let v = self.cb_read_reg(idx);
            match op >> 6 {
                0 => {
                    let v = self.rotate(op >> 3, v);
                    self.cb_write_reg(idx, v);
                }
                1 => alu::bit_test(&mut self.f, mask, v),
                2 => self.cb_write_reg(idx, v & !mask),
                _ => self.cb_write_reg(idx, v | mask),
            }
        }
    }

    /// DD CB d op / FD CB d op. The operand always comes from memory; a
    /// non-BIT result is written back there and, for register indexes
    /// other than 6, copied into that register as well.
    pub(super) fn dispatch_index_cb<B: Bus<Address = u16>>(
        &mut self,
        bus: &mut B,
        mode: IndexMode,
    ) {
        let d = self.fetch8(bus) as i8;
        let op = self.fetch8(bus);
        self.ticks += 2;
        let addr = self.index(mode).wrapping_add(d as u16);
        self.memptr = addr;

        let v = self.peek8(bus, addr);
        let mask = 1u8 << ((op >> 3) & 7);

        if op >> 6 == 1 {
            // BIT n,(IX+d): bits 5/3 from the effective address high byte
            alu::bit_test(&mut self.f, mask, v);
            self.f.bits = (self.f.bits & !FLAG_53) | ((addr >> 8) as u8 & FLAG_53);
            self.ticks += 1;
            return;
        }

        let res = match op >> 6 {
            0 => self.rotate(op >> 3, v),
            2 => v & !mask,
            _ => v | mask,
        };
        self.ticks += 1;
        self.poke8(bus, addr, res);
        if op & 7 != 6 {
            self.cb_write_reg(op, res);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::alu;
    use crate::cpu::flags::{BIT3, BIT5, Flags, HALFCARRY, PARITY, SIGN, ZERO};

    #[test]
    fn bit_test_sign_only_for_bit7() {
        let mut f = Flags::default();
        alu::bit_test(&mut f, 0x80, 0x80);
        assert!(f.bits & SIGN != 0);
        assert!(f.bits & ZERO == 0);
        assert!(f.bits & HALFCARRY != 0);
        alu::bit_test(&mut f, 0x40, 0x80);
        assert!(f.bits & SIGN == 0);
        assert!(f.bits & (ZERO | PARITY) == ZERO | PARITY);
    }

    #[test]
    fn bit_copies_value_bits_53() {
        let mut f = Flags::default();
        alu::bit_test(&mut f, 0x01, 0x29);
        assert!(f.bits & BIT5 != 0);
        assert!(f.bits & BIT3 != 0);
    }
}
