//! 8085 opcode dispatch. Same flat-match shape as the 8080 engine, but
//! with the 8085 timing model (conditional branches are cheaper when not
//! taken) and the ten undocumented opcodes filled in where the 8080
//! treats them as NOPs.

use super::{I8085, K, PARITY, SIGN, V, ZERO};
use crate::core::Bus;

impl I8085 {
    /// Register index decode for the r/m field: B C D E H L M A.
    fn read_reg<B: Bus<Address = u16>>(&mut self, bus: &mut B, idx: u8) -> u8 {
        match idx & 7 {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            6 => {
                let hl = self.hl();
                self.peek8(bus, hl)
            }
            _ => self.a,
        }
    }

    fn write_reg<B: Bus<Address = u16>>(&mut self, bus: &mut B, idx: u8, v: u8) {
        match idx & 7 {
            0 => self.b = v,
            1 => self.c = v,
            2 => self.d = v,
            3 => self.e = v,
            4 => self.h = v,
            5 => self.l = v,
            6 => {
                let hl = self.hl();
                self.poke8(bus, hl, v)
            }
            _ => self.a = v,
        }
    }

    /// Condition decode for the cc field: NZ Z NC C PO PE P M.
    fn condition(&self, idx: u8) -> bool {
        match idx & 7 {
            0 => self.f & ZERO == 0,
            1 => self.f & ZERO != 0,
            2 => !self.carry,
            3 => self.carry,
            4 => self.f & PARITY == 0,
            5 => self.f & PARITY != 0,
            6 => self.f & SIGN == 0,
            _ => self.f & SIGN != 0,
        }
    }

    pub(super) fn dispatch<B: Bus<Address = u16>>(&mut self, bus: &mut B, op: u8) {
        match op {
            0x01 => {
                // LXI B,nn
                let v = self.fetch16(bus);
                self.set_bc(v);
            }
            0x02 => {
                // STAX B
                let bc = self.bc();
                let a = self.a;
                self.poke8(bus, bc, a);
                self.memptr = (a as u16) << 8 | self.c.wrapping_add(1) as u16;
            }
            0x03 => {
                self.ticks += 2; // INX B
                self.inc_bc();
            }
            0x0b => {
                self.ticks += 2; // DCX B
                self.dec_bc();
            }
            0x07 => {
                // RLC: carry and A only
                self.carry = self.a & 0x80 != 0;
                self.a = self.a.rotate_left(1);
            }
            0x08 => {
                self.ticks += 6; // DSUB (undocumented): HL -= BC
                let hl = self.sub16(self.hl(), self.bc());
                self.set_hl(hl);
            }
            0x09 => {
                self.ticks += 6; // DAD B
                let hl = self.add16(self.hl(), self.bc());
                self.set_hl(hl);
            }
            0x0a => {
                // LDAX B
                self.memptr = self.bc();
                let addr = self.memptr;
                self.a = self.peek8(bus, addr);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x0f => {
                // RRC
                self.carry = self.a & 0x01 != 0;
                self.a = self.a.rotate_right(1);
            }
            0x10 => {
                self.ticks += 3; // ARHL (undocumented): HL >>= 1 arithmetic
                let hl = self.hl();
                self.set_hl((hl & 0x8000) | (hl >> 1));
                self.carry = hl & 1 != 0;
            }
            0x11 => {
                // LXI D,nn
                let v = self.fetch16(bus);
                self.set_de(v);
            }
            0x12 => {
                // STAX D
                let de = self.de();
                let a = self.a;
                self.poke8(bus, de, a);
                self.memptr = (a as u16) << 8 | self.e.wrapping_add(1) as u16;
            }
            0x13 => {
                self.ticks += 2; // INX D
                self.inc_de();
            }
            0x1b => {
                self.ticks += 2; // DCX D
                self.dec_de();
            }
            0x17 => {
                // RAL
                let old_carry = self.carry;
                self.carry = self.a & 0x80 != 0;
                self.a <<= 1;
                if old_carry {
                    self.a |= 0x01;
                }
            }
            0x18 => {
                self.ticks += 6; // RDEL (undocumented): DE rotated left through carry
                let de = self.de();
                let res = de << 1 | self.carry as u16;
                self.set_de(res);
                self.carry = de & 0x8000 != 0;
                // V marks a sign change; never cleared here
                if (res ^ de) & 0x8000 != 0 {
                    self.f |= V;
                }
            }
            0x19 => {
                self.ticks += 6; // DAD D
                let hl = self.add16(self.hl(), self.de());
                self.set_hl(hl);
            }
            0x1a => {
                // LDAX D
                self.memptr = self.de();
                let addr = self.memptr;
                self.a = self.peek8(bus, addr);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x1f => {
                // RAR
                let old_carry = self.carry;
                self.carry = self.a & 0x01 != 0;
                self.a >>= 1;
                if old_carry {
                    self.a |= 0x80;
                }
            }
            0x20 => {
                // RIM: interrupt mask, pending lines, IE and SID
                self.refresh_sid();
                self.a = self.im;
            }
            0x21 => {
                // LXI H,nn
                let v = self.fetch16(bus);
                self.set_hl(v);
            }
            0x22 => {
                // SHLD nn
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let hl = self.hl();
                self.poke16(bus, addr, hl);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x23 => {
                self.ticks += 2; // INX H
                self.inc_hl();
            }
            0x2b => {
                self.ticks += 2; // DCX H
                self.dec_hl();
            }
            0x27 => {
                self.daa();
            }
            0x28 => {
                self.ticks += 3; // LDHI (undocumented): DE = HL + n
                let n = self.fetch8(bus);
                self.set_de(self.hl().wrapping_add(n as u16));
            }
            0x29 => {
                self.ticks += 6; // DAD H
                let hl = self.hl();
                let hl = self.add16(hl, hl);
                self.set_hl(hl);
            }
            0x2a => {
                // LHLD nn
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let v = self.peek16(bus, addr);
                self.set_hl(v);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x2f => {
                // CMA
                self.a ^= 0xff;
            }
            0x30 => {
                // SIM: bit 3 enables the mask update, bit 4 clears the
                // RST7.5 latch, bit 6 enables the SOD update
                if self.a & 0x08 != 0 {
                    self.im = (self.im & !7) | (self.a & 7);
                }
                if self.a & 0x10 != 0 {
                    self.im &= !super::I7_5;
                }
                if self.a & 0x40 != 0 {
                    let bit = self.a & 0x80 != 0;
                    self.set_sod(bit);
                }
            }
            0x31 => {
                // LXI SP,nn
                self.sp = self.fetch16(bus);
            }
            0x32 => {
                // STA nn
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let a = self.a;
                self.poke8(bus, addr, a);
                self.memptr = (a as u16) << 8 | self.memptr.wrapping_add(1) & 0xff;
            }
            0x33 => {
                self.ticks += 2; // INX SP
                self.sp = self.sp.wrapping_add(1);
                let k = self.sp == 0;
                self.set_k(k);
            }
            0x3b => {
                self.ticks += 2; // DCX SP
                let k = self.sp == 0;
                self.set_k(k);
                self.sp = self.sp.wrapping_sub(1);
            }
            0x34 => {
                // INR M
                let hl = self.hl();
                let v = self.peek8(bus, hl);
                let v = self.inc8(v);
                self.poke8(bus, hl, v);
            }
            0x35 => {
                // DCR M
                let hl = self.hl();
                let v = self.peek8(bus, hl);
                let v = self.dec8(v);
                self.poke8(bus, hl, v);
            }
            0x36 => {
                // MVI M,n
                let v = self.fetch8(bus);
                let hl = self.hl();
                self.poke8(bus, hl, v);
            }
            0x37 => {
                // STC
                self.carry = true;
            }
            0x3f => {
                // CMC
                self.carry = !self.carry;
            }
            0x38 => {
                self.ticks += 3; // LDSI (undocumented): DE = SP + n
                let n = self.fetch8(bus);
                self.set_de(self.sp.wrapping_add(n as u16));
            }
            0x39 => {
                self.ticks += 6; // DAD SP
                let hl = self.add16(self.hl(), self.sp);
                self.set_hl(hl);
            }
            0x3a => {
                // LDA nn
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                self.a = self.peek8(bus, addr);
                self.memptr = self.memptr.wrapping_add(1);
            }
            op if op & 0xc7 == 0x04 => {
                // INR r
                let v = self.read_reg(bus, op >> 3);
                let v = self.inc8(v);
                self.write_reg(bus, op >> 3, v);
            }
            op if op & 0xc7 == 0x05 => {
                // DCR r
                let v = self.read_reg(bus, op >> 3);
                let v = self.dec8(v);
                self.write_reg(bus, op >> 3, v);
            }
            op if op & 0xc7 == 0x06 => {
                // MVI r,n
                let v = self.fetch8(bus);
                self.write_reg(bus, op >> 3, v);
            }
            0x76 => {
                // HLT: hold PC on the halt opcode until an interrupt
                self.pc = self.pc.wrapping_sub(1);
                self.halted = true;
            }
            op if op & 0xc0 == 0x40 => {
                // MOV r,r'
                let v = self.read_reg(bus, op);
                self.write_reg(bus, op >> 3, v);
            }
            op if op & 0xc0 == 0x80 => {
                // arithmetic/logic block
                let v = self.read_reg(bus, op);
                self.alu_a(op >> 3, v);
            }
            0xc3 => {
                // JMP nn
                self.memptr = self.fetch16(bus);
                self.pc = self.memptr;
            }
            0xc9 => {
                // RET
                self.pc = self.pop(bus);
                self.memptr = self.pc;
            }
            0xcb => {
                self.ticks += 2; // RSTV (undocumented): RST to 0x40 on overflow
                if self.f & V != 0 {
                    self.ticks += 3;
                    let pc = self.pc;
                    self.push(bus, pc);
                    self.pc = 0x0040;
                    self.memptr = self.pc;
                }
            }
            0xcd => {
                // CALL nn
                self.memptr = self.fetch16(bus);
                self.ticks += 2;
                let pc = self.pc;
                self.push(bus, pc);
                self.pc = self.memptr;
            }
            0xc1 => {
                let v = self.pop(bus); // POP B
                self.set_bc(v);
            }
            0xd1 => {
                let v = self.pop(bus); // POP D
                self.set_de(v);
            }
            0xe1 => {
                let v = self.pop(bus); // POP H
                self.set_hl(v);
            }
            0xf1 => {
                let v = self.pop(bus); // POP PSW
                self.set_af(v);
            }
            0xc5 => {
                self.ticks += 1; // PUSH B
                let v = self.bc();
                self.push(bus, v);
            }
            0xd5 => {
                self.ticks += 1; // PUSH D
                let v = self.de();
                self.push(bus, v);
            }
            0xe5 => {
                self.ticks += 1; // PUSH H
                let v = self.hl();
                self.push(bus, v);
            }
            0xf5 => {
                self.ticks += 1; // PUSH PSW
                let v = self.af();
                self.push(bus, v);
            }
            0xd3 => {
                // OUT n
                let n = self.fetch8(bus);
                let a = self.a;
                bus.io_write((a as u16) << 8 | n as u16, a);
                self.ticks += 4;
                self.memptr = (a as u16) << 8 | n.wrapping_add(1) as u16;
            }
            0xdb => {
                // IN n
                let n = self.fetch8(bus);
                self.memptr = (self.a as u16) << 8 | n as u16;
                self.a = bus.io_read(self.memptr);
                self.memptr = self.memptr.wrapping_add(1);
                self.ticks += 4;
            }
            0xd9 => {
                // SHLX (undocumented): (DE) = HL
                let de = self.de();
                let hl = self.hl();
                self.poke16(bus, de, hl);
            }
            0xed => {
                // LHLX (undocumented): HL = (DE)
                let de = self.de();
                let v = self.peek16(bus, de);
                self.set_hl(v);
            }
            0xdd => {
                // JNK nn (undocumented)
                if self.f & K == 0 {
                    self.memptr = self.fetch16(bus);
                    self.pc = self.memptr;
                } else {
                    self.pc = self.pc.wrapping_add(2);
                    self.ticks += 3;
                }
            }
            0xfd => {
                // JK nn (undocumented)
                if self.f & K != 0 {
                    self.memptr = self.fetch16(bus);
                    self.pc = self.memptr;
                } else {
                    self.pc = self.pc.wrapping_add(2);
                    self.ticks += 3;
                }
            }
            0xe3 => {
                // XTHL
                let h = self.h;
                let l = self.l;
                let sp = self.sp;
                let v = self.peek16(bus, sp);
                self.set_hl(v);
                self.ticks += 1;
                self.poke8(bus, sp.wrapping_add(1), h);
                self.poke8(bus, sp, l);
                self.ticks += 2;
                self.memptr = self.hl();
            }
            0xe9 => {
                // PCHL
                self.pc = self.hl();
            }
            0xeb => {
                // XCHG
                core::mem::swap(&mut self.d, &mut self.h);
                core::mem::swap(&mut self.e, &mut self.l);
            }
            0xf3 => {
                // DI
                self.set_ei(false);
            }
            0xfb => {
                // EI: takes effect after the next instruction
                self.set_ei(true);
                self.pending_ei = true;
            }
            0xf9 => {
                self.ticks += 2; // SPHL
                self.sp = self.hl();
            }
            op if op & 0xc7 == 0xc0 => {
                // conditional RET: 6 T not taken, 12 taken
                self.ticks += 2;
                if self.condition(op >> 3) {
                    self.pc = self.pop(bus);
                    self.memptr = self.pc;
                }
            }
            op if op & 0xc7 == 0xc2 => {
                // conditional JMP: address fetched only when taken
                if self.condition(op >> 3) {
                    self.memptr = self.fetch16(bus);
                    self.pc = self.memptr;
                } else {
                    self.pc = self.pc.wrapping_add(2);
                    self.ticks += 3;
                }
            }
            op if op & 0xc7 == 0xc4 => {
                // conditional CALL: 9 T not taken, 18 taken
                self.ticks += 2;
                if self.condition(op >> 3) {
                    self.memptr = self.fetch16(bus);
                    let pc = self.pc;
                    self.push(bus, pc);
                    self.pc = self.memptr;
                } else {
                    self.pc = self.pc.wrapping_add(2);
                    self.ticks += 3;
                }
            }
            op if op & 0xc7 == 0xc6 => {
                // arithmetic/logic immediate
                let v = self.fetch8(bus);
                self.alu_a(op >> 3, v);
            }
            op if op & 0xc7 == 0xc7 => {
                // RST p
                self.ticks += 1;
                let pc = self.pc;
                self.push(bus, pc);
                self.pc = (op & 0x38) as u16;
                self.memptr = self.pc;
            }
            // 0x00 NOP
            _ => {}
        }
    }

    fn alu_a(&mut self, which: u8, v: u8) {
        match which & 7 {
            0 => self.add(v),
            1 => self.adc(v),
            2 => self.sub(v),
            3 => self.sbc(v),
            4 => self.and(v),
            5 => self.xor(v),
            6 => self.or(v),
            _ => self.cp(v),
        }
    }
}
