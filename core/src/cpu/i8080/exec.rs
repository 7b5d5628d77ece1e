//! 8080 opcode dispatch. One flat match over the opcode byte; regular
//! register families use masked arms. Tick surcharges beyond the
//! fetch/memory costs are noted per arm.

use super::I8080;
use crate::core::Bus;
use crate::cpu::alu;
use crate::cpu::flags::*;

impl I8080 {
    /// Register index decode for the r/m field: B C D E H L (HL) A.
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
            0 => self.f.bits & ZERO == 0,
            1 => self.f.bits & ZERO != 0,
            2 => !self.f.carry,
            3 => self.f.carry,
            4 => self.f.bits & PARITY == 0,
            5 => self.f.bits & PARITY != 0,
            6 => self.f.bits & SIGN == 0,
            _ => self.f.bits & SIGN != 0,
        }
    }

    pub(super) fn dispatch<B: Bus<Address = u16>>(&mut self, bus: &mut B, op: u8) {
        match op {
            0x01 => {
                // LD BC,nn
                let v = self.fetch16(bus);
                self.set_bc(v);
            }
            0x02 => {
                // LD (BC),A
                let bc = self.bc();
                let a = self.a;
                self.poke8(bus, bc, a);
                self.memptr = (a as u16) << 8 | self.c.wrapping_add(1) as u16;
            }
            0x03 => {
                self.ticks += 2; // INC BC
                self.inc_bc();
            }
            0x0b => {
                self.ticks += 2; // DEC BC
                self.dec_bc();
            }
            0x07 => {
                // RLCA
                self.f.carry = self.a & 0x80 != 0;
                self.a = self.a.rotate_left(1);
                self.f.bits = (self.f.bits & FLAG_SZP) | (self.a & FLAG_53);
                self.f.q = true;
            }
            0x09 => {
                self.ticks += 7; // ADD HL,BC
                let (lhs, rhs) = (self.hl(), self.bc());
                let (hl, wz) = alu::add16(&mut self.f, lhs, rhs);
                self.set_hl(hl);
                self.memptr = wz;
            }
            0x0a => {
                // LD A,(BC)
                self.memptr = self.bc();
                let addr = self.memptr;
                self.a = self.peek8(bus, addr);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x0f => {
                // RRCA
                self.f.carry = self.a & 0x01 != 0;
                self.a = self.a.rotate_right(1);
                self.f.bits = (self.f.bits & FLAG_SZP) | (self.a & FLAG_53);
                self.f.q = true;
            }
            0x11 => {
                // LD DE,nn
                let v = self.fetch16(bus);
                self.set_de(v);
            }
            0x12 => {
                // LD (DE),A
                let de = self.de();
                let a = self.a;
                self.poke8(bus, de, a);
                self.memptr = (a as u16) << 8 | self.e.wrapping_add(1) as u16;
            }
            0x13 => {
                self.ticks += 2; // INC DE
                self.inc_de();
            }
            0x1b => {
                self.ticks += 2; // DEC DE
                self.dec_de();
            }
            0x17 => {
                // RLA
                let old_carry = self.f.carry;
                self.f.carry = self.a & 0x80 != 0;
                self.a <<= 1;
                if old_carry {
                    self.a |= 0x01;
                }
                self.f.bits = (self.f.bits & FLAG_SZP) | (self.a & FLAG_53);
                self.f.q = true;
            }
            0x19 => {
                self.ticks += 7; // ADD HL,DE
                let (lhs, rhs) = (self.hl(), self.de());
                let (hl, wz) = alu::add16(&mut self.f, lhs, rhs);
                self.set_hl(hl);
                self.memptr = wz;
            }
            0x1a => {
                // LD A,(DE)
                self.memptr = self.de();
                let addr = self.memptr;
                self.a = self.peek8(bus, addr);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x1f => {
                // RRA
                let old_carry = self.f.carry;
                self.f.carry = self.a & 0x01 != 0;
                self.a >>= 1;
                if old_carry {
                    self.a |= 0x80;
                }
                self.f.bits = (self.f.bits & FLAG_SZP) | (self.a & FLAG_53);
                self.f.q = true;
            }
            0x21 => {
                // LD HL,nn
                let v = self.fetch16(bus);
                self.set_hl(v);
            }
            0x22 => {
                // LD (nn),HL
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let hl = self.hl();
                self.poke16(bus, addr, hl);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x23 => {
                self.ticks += 2; // INC HL
                self.inc_hl();
            }
            0x2b => {
                self.ticks += 2; // DEC HL
                self.dec_hl();
            }
            0x27 => {
                // DAA
                self.a = alu::daa(&mut self.f, self.a);
            }
            0x29 => {
                self.ticks += 7; // ADD HL,HL
                let hl = self.hl();
                let (hl, wz) = alu::add16(&mut self.f, hl, hl);
                self.set_hl(hl);
                self.memptr = wz;
            }
            0x2a => {
                // LD HL,(nn)
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let v = self.peek16(bus, addr);
                self.set_hl(v);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x2f => {
                // CPL
                self.a ^= 0xff;
                self.f.bits =
                    (self.f.bits & FLAG_SZP) | HALFCARRY | ADDSUB | (self.a & FLAG_53);
                self.f.q = true;
            }
            0x31 => {
                // LD SP,nn
                self.sp = self.fetch16(bus);
            }
            0x32 => {
                // LD (nn),A
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let a = self.a;
                self.poke8(bus, addr, a);
                self.memptr = (a as u16) << 8 | self.memptr.wrapping_add(1) & 0xff;
            }
            0x33 => {
                self.ticks += 2; // INC SP
                self.sp = self.sp.wrapping_add(1);
            }
            0x3b => {
                self.ticks += 2; // DEC SP
                self.sp = self.sp.wrapping_sub(1);
            }
            0x34 => {
                // INC (HL)
                let hl = self.hl();
                let v = self.peek8(bus, hl);
                let v = alu::inc8(&mut self.f, v);
                self.ticks += 1;
                self.poke8(bus, hl, v);
            }
            0x35 => {
                // DEC (HL)
                let hl = self.hl();
                let v = self.peek8(bus, hl);
                let v = alu::dec8(&mut self.f, v);
                self.ticks += 1;
                self.poke8(bus, hl, v);
            }
            0x36 => {
                // LD (HL),n
                let v = self.fetch8(bus);
                let hl = self.hl();
                self.poke8(bus, hl, v);
            }
            0x37 => {
                // SCF, with the bit-5/3 Q quirk
                let q = if self.last_q { self.f.bits } else { 0 };
                self.f.carry = true;
                self.f.bits =
                    (self.f.bits & FLAG_SZP) | (((q ^ self.f.bits) | self.a) & FLAG_53);
                self.f.q = true;
            }
            0x3f => {
                // CCF, same quirk
                let q = if self.last_q { self.f.bits } else { 0 };
                self.f.bits =
                    (self.f.bits & FLAG_SZP) | (((q ^ self.f.bits) | self.a) & FLAG_53);
                if self.f.carry {
                    self.f.bits |= HALFCARRY;
                }
                self.f.carry = !self.f.carry;
                self.f.q = true;
            }
            0x39 => {
                self.ticks += 7; // ADD HL,SP
                let lhs = self.hl();
                let (hl, wz) = alu::add16(&mut self.f, lhs, self.sp);
                self.set_hl(hl);
                self.memptr = wz;
            }
            0x3a => {
                // LD A,(nn)
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                self.a = self.peek8(bus, addr);
                self.memptr = self.memptr.wrapping_add(1);
            }
            op if op & 0xc7 == 0x04 => {
                // INC r
                let v = self.read_reg(bus, op >> 3);
                let v = alu::inc8(&mut self.f, v);
                self.write_reg(bus, op >> 3, v);
            }
            op if op & 0xc7 == 0x05 => {
                // DEC r
                let v = self.read_reg(bus, op >> 3);
                let v = alu::dec8(&mut self.f, v);
                self.write_reg(bus, op >> 3, v);
            }
            op if op & 0xc7 == 0x06 => {
                // LD r,n
                let v = self.fetch8(bus);
                self.write_reg(bus, op >> 3, v);
            }
            0x76 => {
                // HALT: hold PC on the halt opcode until an interrupt
                self.pc = self.pc.wrapping_sub(1);
                self.halted = true;
            }
            op if op & 0xc0 == 0x40 => {
                // LD r,r'
                let v = self.read_reg(bus, op);
                self.write_reg(bus, op >> 3, v);
            }
            op if op & 0xc0 == 0x80 => {
                // ALU A,r
                let v = self.read_reg(bus, op);
                self.alu_a(op >> 3, v);
            }
            op if op & 0xc7 == 0xc0 => {
                // RET cc: 5 T not taken, 11 taken
                self.ticks += 1;
                if self.condition(op >> 3) {
                    self.pc = self.pop(bus);
                    self.memptr = self.pc;
                }
            }
            0xc1 => {
                let v = self.pop(bus); // POP BC
                self.set_bc(v);
            }
            0xd1 => {
                let v = self.pop(bus); // POP DE
                self.set_de(v);
            }
            0xe1 => {
                let v = self.pop(bus); // POP HL
                self.set_hl(v);
            }
            0xf1 => {
                let v = self.pop(bus); // POP AF
                self.set_af(v);
            }
            0xc3 => {
                // JP nn
                self.memptr = self.fetch16(bus);
                self.pc = self.memptr;
            }
            op if op & 0xc7 == 0xc2 => {
                // JP cc,nn: address bytes always fetched
                self.memptr = self.fetch16(bus);
                if self.condition(op >> 3) {
                    self.pc = self.memptr;
                }
            }
            0xcd => {
                // CALL nn
                self.memptr = self.fetch16(bus);
                self.ticks += 1;
                let pc = self.pc;
                self.push(bus, pc);
                self.pc = self.memptr;
            }
            op if op & 0xc7 == 0xc4 => {
                // CALL cc,nn
                self.memptr = self.fetch16(bus);
                if self.condition(op >> 3) {
                    self.ticks += 1;
                    let pc = self.pc;
                    self.push(bus, pc);
                    self.pc = self.memptr;
                }
            }
            0xc5 => {
                self.ticks += 1; // PUSH BC
                let v = self.bc();
                self.push(bus, v);
            }
            0xd5 => {
                self.ticks += 1; // PUSH DE
                let v = self.de();
                self.push(bus, v);
            }
            0xe5 => {
                self.ticks += 1; // PUSH HL
                let v = self.hl();
                self.push(bus, v);
            }
            0xf5 => {
                self.ticks += 1; // PUSH AF
                let v = self.af();
                self.push(bus, v);
            }
            op if op & 0xc7 == 0xc6 => {
                // ALU A,n
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
            0xc9 => {
                // RET
                self.pc = self.pop(bus);
                self.memptr = self.pc;
            }
            0xd3 => {
                // OUT (n),A
                let n = self.fetch8(bus);
                let a = self.a;
                bus.io_write((a as u16) << 8 | n as u16, a);
                self.ticks += 4;
                self.memptr = (a as u16) << 8 | n.wrapping_add(1) as u16;
            }
            0xdb => {
                // IN A,(n)
                let n = self.fetch8(bus);
                self.memptr = (self.a as u16) << 8 | n as u16;
                self.a = bus.io_read(self.memptr);
                self.memptr = self.memptr.wrapping_add(1);
                self.ticks += 4;
            }
            0xe3 => {
                // EX (SP),HL
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
                // JP (HL)
                self.pc = self.hl();
            }
            0xeb => {
                // EX DE,HL
                core::mem::swap(&mut self.d, &mut self.h);
                core::mem::swap(&mut self.e, &mut self.l);
            }
            0xf3 => {
                // DI
                self.ie = false;
            }
            0xfb => {
                // EI: takes effect after the next instruction
                self.ie = true;
                self.pending_ei = true;
            }
            0xf9 => {
                self.ticks += 2; // LD SP,HL
                self.sp = self.hl();
            }
            // Everything else (0x00, 0x08, 0x10, ..., 0xcb, 0xd9, 0xdd,
            // 0xed, 0xfd) executes as NOP on this part.
            _ => {}
        }
    }

    fn alu_a(&mut self, which: u8, v: u8) {
        match which & 7 {
            0 => self.a = alu::add8(&mut self.f, self.a, v),
            1 => self.a = alu::adc8(&mut self.f, self.a, v),
            2 => self.a = alu::sub8(&mut self.f, self.a, v),
            3 => self.a = alu::sbc8(&mut self.f, self.a, v),
            4 => self.and_a(v),
            5 => self.a = alu::xor8(&mut self.f, self.a, v),
            6 => self.a = alu::or8(&mut self.f, self.a, v),
            _ => alu::cp8(&mut self.f, self.a, v),
        }
    }
}
