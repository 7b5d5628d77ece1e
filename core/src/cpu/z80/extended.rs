//! ED-prefixed page: port I/O through BC, 16-bit carry arithmetic, the
//! interrupt plumbing ops, RRD/RLD and the block transfer/search/IO
//! family. Unassigned ED codes execute as two-fetch no-ops.

use super::Z80;
use crate::core::{Bus, IntMode};
use crate::cpu::alu;
use crate::cpu::flags::*;

impl Z80 {
    pub(super) fn dispatch_ed<B: Bus<Address = u16>>(&mut self, bus: &mut B) {
        let op = self.fetch_opcode(bus);
        match op {
            op if op & 0xc7 == 0x40 => {
                // IN r,(C); index 6 is the flags-only undocumented form
                self.memptr = self.bc();
                let v = bus.io_read(self.memptr);
                self.ticks += 4;
                self.memptr = self.memptr.wrapping_add(1);
                self.f.bits = (self.f.bits & !FLAG_SZHP & !ADDSUB & !FLAG_53)
                    | SZ53P_ADD[v as usize];
                self.f.q = true;
                if (op >> 3) & 7 != 6 {
                    self.set_in_reg(op >> 3, v);
                }
            }
            op if op & 0xc7 == 0x41 => {
                // OUT (C),r; index 6 is the undocumented OUT (C),0
                let v = if (op >> 3) & 7 == 6 {
                    0
                } else {
                    self.get_out_reg(op >> 3)
                };
                self.memptr = self.bc();
                bus.io_write(self.memptr, v);
                self.ticks += 4;
                self.memptr = self.memptr.wrapping_add(1);
            }
            op if op & 0xcf == 0x42 => {
                self.ticks += 7; // SBC HL,rr
                let (lhs, rhs) = (self.hl(), self.reg_pair(op >> 4));
                let (hl, wz) = alu::sbc16(&mut self.f, lhs, rhs);
                self.set_hl(hl);
                self.memptr = wz;
            }
            op if op & 0xcf == 0x4a => {
                self.ticks += 7; // ADC HL,rr
                let (lhs, rhs) = (self.hl(), self.reg_pair(op >> 4));
                let (hl, wz) = alu::adc16(&mut self.f, lhs, rhs);
                self.set_hl(hl);
                self.memptr = wz;
            }
            op if op & 0xcf == 0x43 => {
                // LD (nn),rr
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let v = self.reg_pair(op >> 4);
                self.poke16(bus, addr, v);
                self.memptr = self.memptr.wrapping_add(1);
            }
            op if op & 0xcf == 0x4b => {
                // LD rr,(nn)
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let v = self.peek16(bus, addr);
                self.set_reg_pair(op >> 4, v);
                self.memptr = self.memptr.wrapping_add(1);
            }
            op if op & 0xc7 == 0x44 => {
                // NEG (documented form plus the six mirrors)
                let a = self.a;
                self.a = alu::sub8(&mut self.f, 0, a);
            }
            0x4d => {
                // RETI
                self.iff1 = self.iff2;
                self.pc = self.pop(bus);
                self.memptr = self.pc;
                bus.reti(op);
            }
            op if op & 0xc7 == 0x45 => {
                // RETN (and mirrors)
                self.iff1 = self.iff2;
                self.pc = self.pop(bus);
                self.memptr = self.pc;
                bus.reti(op);
            }
            0x46 | 0x4e | 0x66 | 0x6e => {
                self.im = IntMode::Mode0;
            }
            0x56 | 0x76 => {
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
            0x67 => {
                // RRD
                let hl = self.hl();
                let v = self.peek8(bus, hl);
                self.ticks += 4;
                self.memptr = hl.wrapping_add(1);
                let mem = (self.a << 4) | (v >> 4);
                self.a = (self.a & 0xf0) | (v & 0x0f);
                self.poke8(bus, hl, mem);
                self.f.bits = (self.f.bits & !FLAG_SZHP & !ADDSUB & !FLAG_53)
                    | SZ53P_ADD[self.a as usize];
                self.f.q = true;
            }
            0x6f => {
                // RLD
                let hl = self.hl();
                let v = self.peek8(bus, hl);
                self.ticks += 4;
                self.memptr = hl.wrapping_add(1);
                let mem = (v << 4) | (self.a & 0x0f);
                self.a = (self.a & 0xf0) | (v >> 4);
                self.poke8(bus, hl, mem);
                self.f.bits = (self.f.bits & !FLAG_SZHP & !ADDSUB & !FLAG_53)
                    | SZ53P_ADD[self.a as usize];
                self.f.q = true;
            }
            0xa0 => self.ldi_ldd(bus, false, false),
            0xa8 => self.ldi_ldd(bus, true, false),
            0xb0 => self.ldi_ldd(bus, false, true),
            0xb8 => self.ldi_ldd(bus, true, true),
            0xa1 => self.cpi_cpd(bus, false, false),
            0xa9 => self.cpi_cpd(bus, true, false),
            0xb1 => self.cpi_cpd(bus, false, true),
            0xb9 => self.cpi_cpd(bus, true, true),
            0xa2 => self.ini_ind(bus, false, false),
            0xaa => self.ini_ind(bus, true, false),
            0xb2 => self.ini_ind(bus, false, true),
            0xba => self.ini_ind(bus, true, true),
            0xa3 => self.outi_outd(bus, false, false),
            0xab => self.outi_outd(bus, true, false),
            0xb3 => self.outi_outd(bus, false, true),
            0xbb => self.outi_outd(bus, true, true),
            // Remaining ED codes are 8 T-state no-ops.
            _ => {}
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

    /// LD A,I / LD A,R flag update: P/V samples IFF2 so NMI-interrupted
    /// code can recover the enable state.
    fn ld_a_ir_flags(&mut self) {
        self.f.bits = (self.f.bits & !FLAG_SZHP & !ADDSUB & !FLAG_53)
            | SZ53_ADD[self.a as usize];
        if self.iff2 {
            self.f.bits |= PARITY;
        }
        self.f.q = true;
    }

    fn ldi_ldd<B: Bus<Address = u16>>(&mut self, bus: &mut B, dec: bool, repeat: bool) {
        let hl = self.hl();
        let w = self.peek8(bus, hl);
        let de = self.de();
        self.poke8(bus, de, w);
        self.ticks += 2;
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

        if repeat && bc != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.memptr = self.pc.wrapping_add(1);
            self.ticks += 5;
        }
    }

    fn cpi_cpd<B: Bus<Address = u16>>(&mut self, bus: &mut B, dec: bool, repeat: bool) {
        let hl = self.hl();
        let w = self.peek8(bus, hl);
        self.ticks += 5;

        let carry = self.f.carry;
        alu::cp8(&mut self.f, self.a, w);
        self.f.carry = carry;

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
            (self.f.bits & !(FLAG_53 | PARITY)) | (n & BIT3) | ((n & 0x02) << 4);
        if bc != 0 {
            self.f.bits |= PARITY;
        }
        self.f.q = true;

        if repeat && bc != 0 && self.f.bits & ZERO == 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.memptr = self.pc.wrapping_add(1);
            self.ticks += 5;
        }
    }

    fn ini_ind<B: Bus<Address = u16>>(&mut self, bus: &mut B, dec: bool, repeat: bool) {
        self.ticks += 1;
        let bc = self.bc();
        self.memptr = if dec {
            bc.wrapping_sub(1)
        } else {
            bc.wrapping_add(1)
        };
        let w = bus.io_read(bc);
        self.ticks += 4;
        let hl = self.hl();
        self.poke8(bus, hl, w);
        self.set_hl(if dec {
            hl.wrapping_sub(1)
        } else {
            hl.wrapping_add(1)
        });
        self.b = self.b.wrapping_sub(1);

        let c_adj = if dec {
            self.c.wrapping_sub(1)
        } else {
            self.c.wrapping_add(1)
        };
        self.block_io_flags(w, c_adj);

        if repeat && self.b != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.ticks += 5;
        }
    }

    fn outi_outd<B: Bus<Address = u16>>(&mut self, bus: &mut B, dec: bool, repeat: bool) {
        self.ticks += 1;
        let hl = self.hl();
        let w = self.peek8(bus, hl);
        self.b = self.b.wrapping_sub(1);
        let bc = self.bc();
        self.memptr = if dec {
            bc.wrapping_sub(1)
        } else {
            bc.wrapping_add(1)
        };
        bus.io_write(bc, w);
        self.ticks += 4;
        self.set_hl(if dec {
            hl.wrapping_sub(1)
        } else {
            hl.wrapping_add(1)
        });

        let l = self.l;
        self.block_io_flags(w, l);

        if repeat && self.b != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.ticks += 5;
        }
    }

    /// Shared INI/IND/OUTI/OUTD flag recipe: S/Z/5/3 from the new B, N
    /// from bit 7 of the data, H and C from the data plus the adjusted
    /// port counterpart, P from the low bits of that sum against B.
    fn block_io_flags(&mut self, w: u8, adj: u8) {
        let b = self.b;
        self.f.bits = SZ53_ADD[b as usize];
        if w & 0x80 != 0 {
            self.f.bits |= ADDSUB;
        }
        let tmp = w as u16 + adj as u16;
        self.f.carry = tmp > 0xff;
        if self.f.carry {
            self.f.bits |= HALFCARRY;
        }
        if SZ53P_ADD[((tmp & 7) as u8 ^ b) as usize] & PARITY != 0 {
            self.f.bits |= PARITY;
        }
        self.f.q = true;
    }
}
