//! ED-prefixed page: the Z180 additions (IN0/OUT0, TST/TSTIO, MLT, SLP,
//! OTIM/OTDM) alongside the inherited port I/O, 16-bit carry
//! arithmetic, RRD/RLD and block families. ED codes the chip does not
//! define trap; there are no ED no-op fillers here.

use super::Z180;
use crate::core::{Bus, IntMode};
use crate::cpu::alu;
use crate::cpu::flags::*;

impl Z180 {
    pub(super) fn dispatch_ed<B: Bus<Address = u32>>(&mut self, bus: &mut B) {
        let op = self.fetch_opcode(bus);
        match op {
            op if op & 0xc7 == 0x00 => {
                // IN0 r,(n); index 6 only updates the flags
                self.memptr = self.fetch8(bus) as u16;
                let port = self.memptr;
                let v = self.in_port(bus, port);
                self.memptr = self.memptr.wrapping_add(1);
                self.ticks += 3;
                self.f.bits = SZ53P_ADD[v as usize];
                self.f.q = true;
                if (op >> 3) & 7 != 6 {
                    self.set_in_reg(op >> 3, v);
                }
            }
            op if op & 0xc7 == 0x01 => {
                // OUT0 (n),r; index 6 writes the byte at (HL)
                let v = if (op >> 3) & 7 == 6 {
                    let hl = self.hl();
                    self.peek8(bus, hl)
                } else {
                    self.get_out_reg(op >> 3)
                };
                self.memptr = self.fetch8(bus) as u16;
                let port = self.memptr;
                self.out_port(bus, port, v);
                self.memptr = self.memptr.wrapping_add(1);
                self.ticks += 4;
            }
            op if op & 0xc7 == 0x04 => {
                // TST r / TST (HL)
                let v = if (op >> 3) & 7 == 6 {
                    let hl = self.hl();
                    self.peek8(bus, hl)
                } else {
                    self.get_out_reg(op >> 3)
                };
                self.tst(v);
            }
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x78 => {
                // IN r,(C)
                self.memptr = self.bc();
                let port = self.memptr;
                let v = self.in_port(bus, port);
                self.memptr = self.memptr.wrapping_add(1);
                self.ticks += 3;
                self.f.bits = SZ53P_ADD[v as usize];
                self.f.q = true;
                self.set_in_reg(op >> 3, v);
            }
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x79 => {
                // OUT (C),r
                let v = self.get_out_reg(op >> 3);
                self.memptr = self.bc();
                let port = self.memptr;
                self.out_port(bus, port, v);
                self.memptr = self.memptr.wrapping_add(1);
                self.ticks += 4;
            }
            op if op & 0xcf == 0x42 => {
                self.ticks += 4; // SBC HL,rr
                let (lhs, rhs) = (self.hl(), self.reg_pair(op >> 4));
                let (hl, wz) = alu::sbc16(&mut self.f, lhs, rhs);
                self.set_hl(hl);
                self.memptr = wz;
            }
            op if op & 0xcf == 0x4a => {
                self.ticks += 4; // ADC HL,rr
                let (lhs, rhs) = (self.hl(), self.reg_pair(op >> 4));
                let (hl, wz) = alu::adc16(&mut self.f, lhs, rhs);
                self.set_hl(hl);
                self.memptr = wz;
            }
            0x43 | 0x53 | 0x73 => {
                // LD (nn),rr
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let v = self.reg_pair(op >> 4);
                self.poke16(bus, addr, v);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x4b | 0x5b | 0x7b => {
                // LD rr,(nn)
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let v = self.peek16(bus, addr);
                self.set_reg_pair(op >> 4, v);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x44 => {
                // NEG
                let a = self.a;
                self.a = alu::sub8(&mut self.f, 0, a);
            }
            0x4c | 0x5c | 0x6c | 0x7c => {
                self.ticks += 11; // MLT rr: 8x8 unsigned into the pair
                let idx = op >> 4;
                let v = self.reg_pair(idx);
                self.set_reg_pair(idx, (v >> 8) * (v & 0xff));
            }
            0x4d => {
                // RETI
                self.iff1 = self.iff2;
                self.pc = self.pop(bus);
                self.memptr = self.pc;
                self.ticks += 10; // re-fetch for the daisy chain
                bus.reti(op);
            }
            0x45 | 0x55 | 0x65 | 0x75 | 0x5d | 0x6d | 0x7d => {
                // RETN (and mirrors)
                self.iff1 = self.iff2;
                self.pc = self.pop(bus);
                self.memptr = self.pc;
                bus.reti(op);
            }
            0x46 | 0x66 => {
                self.im = IntMode::Mode0;
            }
            0x56 => {
                self.im = IntMode::Mode1;
            }
            0x5e | 0x7e => {
                self.im = IntMode::Mode2;
            }
            0x47 => {
                self.ticks += 1; // LD I,A
                self.i = self.a;
            }
            0x4f => {
                self.ticks += 1; // LD R,A
                self.set_reg_r(self.a);
            }
            0x57 => {
                self.ticks += 1; // LD A,I
                self.a = self.i;
                self.ld_a_ir_flags();
            }
            0x5f => {
                self.ticks += 1; // LD A,R
                self.a = self.reg_r();
                self.ld_a_ir_flags();
            }
            0x64 => {
                // TST n
                let v = self.fetch8(bus);
                self.tst(v);
            }
            0x67 => {
                // RRD
                self.memptr = self.hl();
                let addr = self.memptr;
                let v = self.peek8(bus, addr);
                self.ticks += 4;
                let mem = (self.a << 4) | (v >> 4);
                self.a = (self.a & 0xf0) | (v & 0x0f);
                self.poke8(bus, addr, mem);
                self.f.bits = SZ53P_ADD[self.a as usize];
                self.memptr = self.memptr.wrapping_add(1);
                self.f.q = true;
            }
            0x6f => {
                // RLD
                self.memptr = self.hl();
                let addr = self.memptr;
                let v = self.peek8(bus, addr);
                self.ticks += 4;
                let mem = (v << 4) | (self.a & 0x0f);
                self.a = (self.a & 0xf0) | (v >> 4);
                self.poke8(bus, addr, mem);
                self.f.bits = SZ53P_ADD[self.a as usize];
                self.memptr = self.memptr.wrapping_add(1);
                self.f.q = true;
            }
            0x74 => {
                // TSTIO (C),n
                self.memptr = self.c as u16;
                let port = self.memptr;
                let r = self.fetch8(bus) & self.in_port(bus, port);
                self.memptr = self.memptr.wrapping_add(1);
                self.ticks += 3;
                self.f.bits = SZ53P_ADD[r as usize];
                self.f.q = true;
            }
            0x76 => {
                // SLP: low-power halt. PC holds on the second opcode
                // byte so the resume bump lands past the instruction.
                self.pc = self.pc.wrapping_sub(1);
                self.halted = true;
                self.ticks += 2;
            }
            0x83 => {
                // OTIM
                self.outi_outd(bus, false, true);
                self.c = self.c.wrapping_add(1);
                self.ticks += 2;
            }
            0x8b => {
                // OTDM
                self.outi_outd(bus, true, true);
                self.c = self.c.wrapping_sub(1);
                self.ticks += 2;
            }
            0x93 => {
                // OTIMR
                self.outi_outd(bus, false, true);
                self.c = self.c.wrapping_add(1);
                self.ticks += 2;
                if self.b != 0 {
                    self.pc = self.pc.wrapping_sub(2);
                    self.ticks += 2;
                }
            }
            0x9b => {
                // OTDMR
                self.outi_outd(bus, true, true);
                self.c = self.c.wrapping_sub(1);
                self.ticks += 2;
                if self.b != 0 {
                    self.pc = self.pc.wrapping_sub(2);
                    self.ticks += 2;
                }
            }
            0xa0 => self.ldi_ldd(bus, false),
            0xa8 => self.ldi_ldd(bus, true),
            0xa1 => self.cpi_cpd(bus, false),
            0xa9 => self.cpi_cpd(bus, true),
            0xa2 => self.ini_ind(bus, false),
            0xaa => self.ini_ind(bus, true),
            0xa3 => self.outi_outd(bus, false, false),
            0xab => self.outi_outd(bus, true, false),
            0xb0 | 0xb8 => {
                // LDIR / LDDR
                self.ldi_ldd(bus, op == 0xb8);
                if self.f.bits & PARITY != 0 {
                    self.pc = self.pc.wrapping_sub(2);
                    self.memptr = self.pc.wrapping_add(1);
                    self.ticks += 2;
                }
            }
            0xb1 | 0xb9 => {
                // CPIR / CPDR
                self.cpi_cpd(bus, op == 0xb9);
                if self.f.bits & PARITY != 0 && self.f.bits & ZERO == 0 {
                    self.pc = self.pc.wrapping_sub(2);
                    self.memptr = self.pc.wrapping_add(1);
                    self.ticks += 2;
                }
            }
            0xb2 | 0xba => {
                // INIR / INDR
                self.ini_ind(bus, op == 0xba);
                if self.b != 0 {
                    self.pc = self.pc.wrapping_sub(2);
                    self.ticks += 2;
                }
            }
            0xb3 | 0xbb => {
                // OTIR / OTDR
                self.outi_outd(bus, op == 0xbb, false);
                if self.b != 0 {
                    self.pc = self.pc.wrapping_sub(2);
                    self.ticks += 2;
                }
            }
            _ => self.trap(bus, 2),
        }
    }

    fn set_in_reg(&mut self, idx: u8, v: u8) {
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

    fn get_out_reg(&self, idx: u8) -> u8 {
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

    /// AND without storing: flags as the logic op, half-carry forced.
    fn tst(&mut self, v: u8) {
        let r = self.a & v;
        self.f.carry = false;
        self.f.bits = SZ53P_ADD[r as usize] | HALFCARRY;
        self.f.q = true;
        self.ticks += 1;
    }

    /// LD A,I / LD A,R flag update: P/V samples IFF2 so NMI-interrupted
    /// code can recover the enable state.
    fn ld_a_ir_flags(&mut self) {
        self.f.bits = SZ53_ADD[self.a as usize];
        if self.iff2 {
            self.f.bits |= PARITY;
        }
        self.f.q = true;
    }

    fn ldi_ldd<B: Bus<Address = u32>>(&mut self, bus: &mut B, dec: bool) {
        let hl = self.hl();
        let w = self.peek8(bus, hl);
        let de = self.de();
        self.poke8(bus, de, w);
        if dec {
            self.set_hl(hl.wrapping_sub(1));
            self.set_de(de.wrapping_sub(1));
        } else {
            self.set_hl(hl.wrapping_add(1));
            self.set_de(de.wrapping_add(1));
        }
        let bc = self.bc().wrapping_sub(1);
        self.set_bc(bc);

        // Bits 5/3 leak from A + the transferred byte: bit 3 directly,
        // bit 1 into position 5. P/V tracks the counter.
        let sum = self.a.wrapping_add(w);
        self.f.bits = (self.f.bits & FLAG_SZ) | (sum & BIT3) | ((sum & 0x02) << 4);
        if bc != 0 {
            self.f.bits |= PARITY;
        }
        self.f.q = true;
    }

    fn cpi_cpd<B: Bus<Address = u32>>(&mut self, bus: &mut B, dec: bool) {
        let hl = self.hl();
        let w = self.peek8(bus, hl);
        let carry = self.f.carry;
        alu::cp8(&mut self.f, self.a, w);
        self.f.carry = carry;
        self.ticks += 3;

        if dec {
            self.set_hl(hl.wrapping_sub(1));
            self.memptr = self.memptr.wrapping_sub(1);
        } else {
            self.set_hl(hl.wrapping_add(1));
            self.memptr = self.memptr.wrapping_add(1);
        }
        let bc = self.bc().wrapping_sub(1);
        self.set_bc(bc);

        // Bits 5/3 come from A - (HL) - H, P/V from the counter.
        let half = self.f.bits & HALFCARRY != 0;
        let n = self.a.wrapping_sub(w).wrapping_sub(half as u8);
        self.f.bits =
            (self.f.bits & FLAG_SZHN) | (n & BIT3) | ((n & 0x02) << 4);
        if bc != 0 {
            self.f.bits |= PARITY;
        }
        self.f.q = true;
    }

    fn ini_ind<B: Bus<Address = u32>>(&mut self, bus: &mut B, dec: bool) {
        self.memptr = self.bc();
        let port = self.memptr;
        let w = self.in_port(bus, port);
        self.ticks += 3;
        let hl = self.hl();
        self.poke8(bus, hl, w);

        self.memptr = if dec {
            self.memptr.wrapping_sub(1)
        } else {
            self.memptr.wrapping_add(1)
        };
        self.b = self.b.wrapping_sub(1);
        self.set_hl(if dec {
            hl.wrapping_sub(1)
        } else {
            hl.wrapping_add(1)
        });

        self.f.bits = SZ53P_ADD[self.b as usize];
        if w > 0x7f {
            self.f.bits |= ADDSUB;
        }
        self.f.carry = false;
        let c_adj = if dec {
            self.c.wrapping_sub(1)
        } else {
            self.c.wrapping_add(1)
        };
        let tmp = w as u16 + c_adj as u16;
        if tmp > 0xff {
            self.f.bits |= HALFCARRY;
            self.f.carry = true;
        }
        if SZ53P_ADD[((tmp & 7) as u8 ^ self.b) as usize] & PARITY != 0 {
            self.f.bits |= PARITY;
        } else {
            self.f.bits &= !PARITY;
        }
        self.f.q = true;
    }

    /// OUTI/OUTD and, with `masked` set, the OTIM/OTDM forms that
    /// address the port through C alone.
    fn outi_outd<B: Bus<Address = u32>>(&mut self, bus: &mut B, dec: bool, masked: bool) {
        self.ticks += 1;
        self.b = self.b.wrapping_sub(1);
        self.memptr = if masked { self.c as u16 } else { self.bc() };

        let hl = self.hl();
        let w = self.peek8(bus, hl);
        let port = self.memptr;
        self.out_port(bus, port, w);
        self.ticks += 4;
        self.memptr = if dec {
            self.memptr.wrapping_sub(1)
        } else {
            self.memptr.wrapping_add(1)
        };
        self.set_hl(if dec {
            hl.wrapping_sub(1)
        } else {
            hl.wrapping_add(1)
        });

        self.f.carry = false;
        self.f.bits = if w > 0x7f {
            SZ53_SUB[self.b as usize]
        } else {
            SZ53_ADD[self.b as usize]
        };
        let tmp = self.l as u16 + w as u16;
        if tmp > 0xff {
            self.f.bits |= HALFCARRY;
            self.f.carry = true;
        }
        if SZ53P_ADD[((tmp & 7) as u8 ^ self.b) as usize] & PARITY != 0 {
            self.f.bits |= PARITY;
        }
        self.f.q = true;
    }
}
