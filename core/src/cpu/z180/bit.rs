//! CB-prefixed page and the DDCB/FDCB indexed forms. The Z180 drops the
//! undocumented SLL row and the indexed register-copy encodings; both
//! trap instead.

use super::Z180;
use crate::core::Bus;
use crate::cpu::alu;
use crate::cpu::flags::FLAG_53;

impl Z180 {
    /// Rotate/shift select: RLC RRC RL RR SLA SRA - SRL. Row 6 (SLL on
    /// the Z80) does not exist here; callers trap before selecting it.
    fn rotate(&mut self, which: u8, v: u8) -> u8 {
        match which & 7 {
            0 => alu::rlc(&mut self.f, v),
            1 => alu::rrc(&mut self.f, v),
            2 => alu::rl(&mut self.f, v),
            3 => alu::rr(&mut self.f, v),
            4 => alu::sla(&mut self.f, v),
            5 => alu::sra(&mut self.f, v),
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

    pub(super) fn dispatch_cb<B: Bus<Address = u32>>(&mut self, bus: &mut B) {
        let op = self.fetch_opcode(bus);
        if op & 0xf8 == 0x30 {
            // SLL row: undefined on the Z180
            self.trap(bus, 2);
            return;
        }
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
                2 => {
                    self.ticks += 1;
                    self.cb_write_reg(idx, v & !mask);
                }
                _ => {
                    self.ticks += 1;
                    self.cb_write_reg(idx, v | mask);
                }
            }
        }
    }

    /// DD CB d op / FD CB d op. Only the memory forms (operand index 6,
    /// SLL row excluded) exist; the Z80's register-copy encodings are
    /// undefined opcodes here and trap with a three-byte prefix width.
    pub(super) fn dispatch_index_cb<B: Bus<Address = u32>>(
        &mut self,
        bus: &mut B,
        op: u8,
        addr: u16,
    ) {
        if op & 7 != 6 || op & 0xf8 == 0x30 {
            self.trap(bus, 3);
            return;
        }
        let mask = 1u8 << ((op >> 3) & 7);
        match op >> 6 {
            0 => {
                let v = self.peek8(bus, addr);
                let v = self.rotate(op >> 3, v);
                self.ticks += 1;
                self.poke8(bus, addr, v);
            }
            1 => {
                // BIT n,(IX+d): bits 5/3 from the effective address
                let v = self.peek8(bus, addr);
                alu::bit_test(&mut self.f, mask, v);
                self.f.bits = (self.f.bits & !FLAG_53) | ((addr >> 8) as u8 & FLAG_53);
                self.ticks += 1;
            }
            2 => {
                let v = self.peek8(bus, addr) & !mask;
                self.ticks += 1;
                self.poke8(bus, addr, v);
            }
            _ => {
                let v = self.peek8(bus, addr) | mask;
                self.ticks += 1;
                self.poke8(bus, addr, v);
            }
        }
    }
}
