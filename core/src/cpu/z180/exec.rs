//! Z180 opcode dispatch: the unprefixed page plus the DD/FD indexed
//! subset. Same flat-match shape as the Z80 engine, but with the Z180's
//! shorter internal timings, and a trap instead of a no-op for every
//! indexed encoding the chip does not implement.

use super::{IndexMode, Z180};
use crate::core::Bus;
use crate::cpu::alu;
use crate::cpu::flags::*;

impl Z180 {
    /// Register index decode for the r/m field: B C D E H L (HL) A.
    fn read_reg<B: Bus<Address = u32>>(&mut self, bus: &mut B, idx: u8) -> u8 {
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

    fn write_reg<B: Bus<Address = u32>>(&mut self, bus: &mut B, idx: u8, v: u8) {
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

    /// Register-pair decode for the dd field: BC DE HL SP.
    pub(super) fn reg_pair(&self, idx: u8) -> u16 {
        match idx & 3 {
            0 => self.bc(),
            1 => self.de(),
            2 => self.hl(),
            _ => self.sp,
        }
    }

    pub(super) fn set_reg_pair(&mut self, idx: u8, v: u16) {
        match idx & 3 {
            0 => self.set_bc(v),
            1 => self.set_de(v),
            2 => self.set_hl(v),
            _ => self.sp = v,
        }
    }

    pub(crate) fn alu_a(&mut self, which: u8, v: u8) {
        match which & 7 {
            0 => self.a = alu::add8(&mut self.f, self.a, v),
            1 => self.a = alu::adc8(&mut self.f, self.a, v),
            2 => self.a = alu::sub8(&mut self.f, self.a, v),
            3 => self.a = alu::sbc8(&mut self.f, self.a, v),
            4 => self.a = alu::and8(&mut self.f, self.a, v),
            5 => self.a = alu::xor8(&mut self.f, self.a, v),
            6 => self.a = alu::or8(&mut self.f, self.a, v),
            _ => alu::cp8(&mut self.f, self.a, v),
        }
    }

    pub(super) fn dispatch<B: Bus<Address = u32>>(&mut self, bus: &mut B, op: u8) {
        match op {
            0x01 => {
                // LD BC,nn
                let v = self.fetch16(bus);
                self.set_bc(v);
            }
            0x11 => {
                // LD DE,nn
                let v = self.fetch16(bus);
                self.set_de(v);
            }
            0x21 => {
                // LD HL,nn
                let v = self.fetch16(bus);
                self.set_hl(v);
            }
            0x31 => {
                // LD SP,nn
                self.sp = self.fetch16(bus);
            }
            0x02 => {
                // LD (BC),A
                let bc = self.bc();
                let a = self.a;
                self.poke8(bus, bc, a);
                self.memptr = (a as u16) << 8 | self.c.wrapping_add(1) as u16;
            }
            0x12 => {
                // LD (DE),A
                let de = self.de();
                let a = self.a;
                self.poke8(bus, de, a);
                self.memptr = (a as u16) << 8 | self.e.wrapping_add(1) as u16;
            }
            0x0a => {
                // LD A,(BC)
                self.memptr = self.bc();
                let addr = self.memptr;
                self.a = self.peek8(bus, addr);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x1a => {
                // LD A,(DE)
                self.memptr = self.de();
                let addr = self.memptr;
                self.a = self.peek8(bus, addr);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x03 | 0x13 | 0x23 | 0x33 => {
                self.ticks += 1; // INC rr
                let idx = op >> 4;
                self.set_reg_pair(idx, self.reg_pair(idx).wrapping_add(1));
            }
            0x0b | 0x1b | 0x2b | 0x3b => {
                self.ticks += 1; // DEC rr
                let idx = op >> 4;
                self.set_reg_pair(idx, self.reg_pair(idx).wrapping_sub(1));
            }
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.ticks += 4; // ADD HL,rr
                let (lhs, rhs) = (self.hl(), self.reg_pair(op >> 4));
                let (hl, wz) = alu::add16(&mut self.f, lhs, rhs);
                self.set_hl(hl);
                self.memptr = wz;
            }
            0x07 => {
                // RLCA
                self.f.carry = self.a & 0x80 != 0;
                self.a = self.a.rotate_left(1);
                self.f.bits = (self.f.bits & FLAG_SZP) | (self.a & FLAG_53);
                self.f.q = true;
            }
            0x0f => {
                // RRCA
                self.f.carry = self.a & 0x01 != 0;
                self.a = self.a.rotate_right(1);
                self.f.bits = (self.f.bits & FLAG_SZP) | (self.a & FLAG_53);
                self.f.q = true;
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
            0x08 => {
                self.ticks += 1; // EX AF,AF'
                self.exchange_af();
            }
            0x10 => {
                // DJNZ d: 9 T taken, 7 not
                self.ticks += 1;
                let d = self.fetch8(bus) as i8;
                self.b = self.b.wrapping_sub(1);
                if self.b != 0 {
                    self.ticks += 2;
                    self.memptr = self.pc.wrapping_add(d as u16);
                    self.pc = self.memptr;
                }
            }
            0x18 => {
                // JR d
                let d = self.fetch8(bus) as i8;
                self.ticks += 2;
                self.memptr = self.pc.wrapping_add(d as u16);
                self.pc = self.memptr;
            }
            op if op & 0xe7 == 0x20 => {
                // JR cc,d: 8 T taken, 6 not
                let d = self.fetch8(bus) as i8;
                if self.condition((op >> 3) & 3) {
                    self.ticks += 2;
                    self.memptr = self.pc.wrapping_add(d as u16);
                    self.pc = self.memptr;
                }
            }
            0x22 => {
                // LD (nn),HL
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let hl = self.hl();
                self.poke16(bus, addr, hl);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x2a => {
                // LD HL,(nn)
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let v = self.peek16(bus, addr);
                self.set_hl(v);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x32 => {
                // LD (nn),A
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let a = self.a;
                self.poke8(bus, addr, a);
                self.memptr = (a as u16) << 8 | self.memptr.wrapping_add(1) & 0xff;
            }
            0x3a => {
                // LD A,(nn)
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                self.a = self.peek8(bus, addr);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x27 => {
                self.ticks += 1; // DAA
                self.a = alu::daa(&mut self.f, self.a);
            }
            0x2f => {
                // CPL
                self.a ^= 0xff;
                self.f.bits =
                    (self.f.bits & FLAG_SZP) | HALFCARRY | ADDSUB | (self.a & FLAG_53);
                self.f.q = true;
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
                // ALU A,r: one internal clock for register operands,
                // none on top of the read for (HL)
                let v = self.read_reg(bus, op);
                if op & 7 != 6 {
                    self.ticks += 1;
                }
                self.alu_a(op >> 3, v);
            }
            0xc3 => {
                // JP nn
                self.memptr = self.fetch16(bus);
                self.pc = self.memptr;
            }
            0xc9 => {
                // RET
                self.pc = self.pop(bus);
                self.memptr = self.pc;
            }
            0xcd => {
                // CALL nn
                self.memptr = self.fetch16(bus);
                self.ticks += 1;
                let pc = self.pc;
                self.push(bus, pc);
                self.pc = self.memptr;
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
            0xc5 => {
                self.ticks += 2; // PUSH BC
                let v = self.bc();
                self.push(bus, v);
            }
            0xd5 => {
                self.ticks += 2; // PUSH DE
                let v = self.de();
                self.push(bus, v);
            }
            0xe5 => {
                self.ticks += 2; // PUSH HL
                let v = self.hl();
                self.push(bus, v);
            }
            0xf5 => {
                self.ticks += 2; // PUSH AF
                let v = self.af();
                self.push(bus, v);
            }
            0xcb => {
                self.dispatch_cb(bus);
            }
            0xd3 => {
                // OUT (n),A
                let n = self.fetch8(bus);
                self.memptr = (self.a as u16) << 8;
                let port = self.memptr | n as u16;
                let a = self.a;
                self.out_port(bus, port, a);
                self.ticks += 4;
                self.memptr |= n.wrapping_add(1) as u16;
            }
            0xdb => {
                // IN A,(n)
                let n = self.fetch8(bus);
                self.memptr = (self.a as u16) << 8 | n as u16;
                let port = self.memptr;
                self.a = self.in_port(bus, port);
                self.ticks += 4;
                self.memptr = self.memptr.wrapping_add(1);
            }
            0xd9 => {
                // EXX
                self.exchange_regs();
            }
            0xdd => {
                self.dispatch_index(bus, IndexMode::Ix);
            }
            0xfd => {
                self.dispatch_index(bus, IndexMode::Iy);
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
            0xed => {
                self.dispatch_ed(bus);
            }
            0xf3 => {
                // DI
                self.iff1 = false;
                self.iff2 = false;
            }
            0xfb => {
                // EI: takes effect after the next instruction
                self.iff1 = true;
                self.iff2 = true;
                self.pending_ei = true;
            }
            0xf9 => {
                self.ticks += 1; // LD SP,HL
                self.sp = self.hl();
            }
            op if op & 0xc7 == 0xc0 => {
                // RET cc: 10 T taken, 5 not
                self.ticks += 1;
                if self.condition(op >> 3) {
                    self.pc = self.pop(bus);
                    self.memptr = self.pc;
                } else {
                    self.ticks += 1;
                }
            }
            op if op & 0xc7 == 0xc2 => {
                // JP cc,nn: 9 T taken, 6 not (address skipped, not read)
                if self.condition(op >> 3) {
                    self.memptr = self.fetch16(bus);
                    self.pc = self.memptr;
                } else {
                    self.pc = self.pc.wrapping_add(2);
                    self.ticks += 3;
                }
            }
            op if op & 0xc7 == 0xc4 => {
                // CALL cc,nn: 16 T taken, 6 not
                if self.condition(op >> 3) {
                    self.memptr = self.fetch16(bus);
                    self.ticks += 1;
                    let pc = self.pc;
                    self.push(bus, pc);
                    self.pc = self.memptr;
                } else {
                    self.pc = self.pc.wrapping_add(2);
                    self.ticks += 3;
                }
            }
            op if op & 0xc7 == 0xc6 => {
                // ALU A,n
                let v = self.fetch8(bus);
                self.alu_a(op >> 3, v);
            }
            op if op & 0xc7 == 0xc7 => {
                // RST p
                self.ticks += 2;
                let pc = self.pc;
                self.push(bus, pc);
                self.pc = (op & 0x38) as u16;
                self.memptr = self.pc;
            }
            // 0x00 NOP
            _ => {}
        }
    }

    pub(super) fn index(&self, mode: IndexMode) -> u16 {
        match mode {
            IndexMode::Ix => self.ix,
            IndexMode::Iy => self.iy,
        }
    }

    fn set_index(&mut self, mode: IndexMode, v: u16) {
        match mode {
            IndexMode::Ix => self.ix = v,
            IndexMode::Iy => self.iy = v,
        }
    }

    /// Fetch the displacement and form the effective address, leaving
    /// it in MEMPTR. The internal add costs five clocks on the load
    /// forms; the ALU forms charge their own shorter cost at the call
    /// site.
    fn index_addr<B: Bus<Address = u32>>(&mut self, bus: &mut B, mode: IndexMode) -> u16 {
        let d = self.fetch8(bus) as i8;
        self.memptr = self.index(mode).wrapping_add(d as u16);
        self.memptr
    }

    /// DD/FD page. The Z180 implements only the documented indexed
    /// forms; everything else (including the IXH/IXL half-register
    /// encodings) is an undefined opcode and traps.
    pub(super) fn dispatch_index<B: Bus<Address = u32>>(&mut self, bus: &mut B, mode: IndexMode) {
        let op = self.fetch_opcode(bus);
        match op {
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.ticks += 7; // ADD IX,rr (rr index 2 names IX itself)
                let idx = op >> 4;
                let oper = if idx & 3 == 2 {
                    self.index(mode)
                } else {
                    self.reg_pair(idx)
                };
                let lhs = self.index(mode);
                let (res, wz) = alu::add16(&mut self.f, lhs, oper);
                self.set_index(mode, res);
                self.memptr = wz;
            }
            0x21 => {
                // LD IX,nn
                let v = self.fetch16(bus);
                self.set_index(mode, v);
            }
            0x22 => {
                // LD (nn),IX
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let v = self.index(mode);
                self.poke16(bus, addr, v);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x2a => {
                // LD IX,(nn)
                self.memptr = self.fetch16(bus);
                let addr = self.memptr;
                let v = self.peek16(bus, addr);
                self.set_index(mode, v);
                self.memptr = self.memptr.wrapping_add(1);
            }
            0x23 => {
                self.ticks += 1; // INC IX
                self.set_index(mode, self.index(mode).wrapping_add(1));
            }
            0x2b => {
                self.ticks += 1; // DEC IX
                self.set_index(mode, self.index(mode).wrapping_sub(1));
            }
            0x34 => {
                // INC (IX+d)
                let addr = self.index_addr(bus, mode);
                self.ticks += 5;
                let v = self.peek8(bus, addr);
                let v = alu::inc8(&mut self.f, v);
                self.ticks += 1;
                self.poke8(bus, addr, v);
            }
            0x35 => {
                // DEC (IX+d)
                let addr = self.index_addr(bus, mode);
                self.ticks += 5;
                let v = self.peek8(bus, addr);
                let v = alu::dec8(&mut self.f, v);
                self.ticks += 1;
                self.poke8(bus, addr, v);
            }
            0x36 => {
                // LD (IX+d),n
                let addr = self.index_addr(bus, mode);
                let v = self.fetch8(bus);
                self.ticks += 2;
                self.poke8(bus, addr, v);
            }
            0x46 | 0x4e | 0x56 | 0x5e | 0x66 | 0x6e | 0x7e => {
                // LD r,(IX+d)
                let addr = self.index_addr(bus, mode);
                self.ticks += 5;
                let v = self.peek8(bus, addr);
                self.write_reg(bus, op >> 3, v);
            }
            0x70..=0x75 | 0x77 => {
                // LD (IX+d),r
                let addr = self.index_addr(bus, mode);
                self.ticks += 5;
                let v = self.read_reg(bus, op);
                self.poke8(bus, addr, v);
            }
            0x86 | 0x8e | 0x96 | 0x9e | 0xa6 | 0xae | 0xb6 | 0xbe => {
                // ALU A,(IX+d)
                let addr = self.index_addr(bus, mode);
                self.ticks += 2;
                let v = self.peek8(bus, addr);
                self.alu_a(op >> 3, v);
            }
            0xcb => {
                let addr = self.index_addr(bus, mode);
                let op2 = self.fetch8(bus);
                self.dispatch_index_cb(bus, op2, addr);
            }
            0xe1 => {
                // POP IX
                let v = self.pop(bus);
                self.set_index(mode, v);
            }
            0xe3 => {
                // EX (SP),IX
                let old = self.index(mode);
                let sp = self.sp;
                let v = self.peek16(bus, sp);
                self.set_index(mode, v);
                self.ticks += 1;
                self.poke8(bus, sp.wrapping_add(1), (old >> 8) as u8);
                self.poke8(bus, sp, old as u8);
                self.memptr = v;
            }
            0xe5 => {
                self.ticks += 2; // PUSH IX
                let v = self.index(mode);
                self.push(bus, v);
            }
            0xe9 => {
                // JP (IX)
                self.pc = self.index(mode);
            }
            0xf9 => {
                self.ticks += 1; // LD SP,IX
                self.sp = self.index(mode);
            }
            _ => {
                if self.breakpoints[self.pc as usize] {
                    bus.breakpoint();
                }
                self.trap(bus, 2);
            }
        }
    }
}
