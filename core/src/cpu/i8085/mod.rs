//! Intel 8085 execution engine.
//!
//! The 8085 keeps the 8080 programming model but swaps the undocumented
//! flag bits: PSW bit 5 is K (signed/wrap indicator), bit 1 is V (signed
//! overflow), bit 3 reads as zero. Adds RIM/SIM, the RST5.5/6.5/7.5 and
//! TRAP interrupt sources, SID/SOD serial lines and ten undocumented
//! opcodes.

mod alu;
mod exec;

use crate::core::{Bus, IntMode};
use crate::cpu::state::{CpuState, I8085State};

// PSW bits.
pub(crate) const CARRY: u8 = 0x01;
pub(crate) const V: u8 = 0x02;
pub(crate) const PARITY: u8 = 0x04;
pub(crate) const HALFCARRY: u8 = 0x10;
pub(crate) const K: u8 = 0x20;
pub(crate) const ZERO: u8 = 0x40;
pub(crate) const SIGN: u8 = 0x80;

// Interrupt mask register bits.
pub const M5_5: u8 = 0x01;
pub const M6_5: u8 = 0x02;
pub const M7_5: u8 = 0x04;
pub const IE: u8 = 0x08;
pub const I5_5: u8 = 0x10;
pub const I6_5: u8 = 0x20;
pub const I7_5: u8 = 0x40;
pub const SID: u8 = 0x80;

/// SID/SOD serial collaborator: RIM samples `input`, SIM drives `output`.
pub trait SerialLine {
    fn input(&mut self) -> bool;
    fn output(&mut self, bit: bool);
}

pub struct I8085 {
    pub(crate) a: u8,
    pub(crate) b: u8,
    pub(crate) c: u8,
    pub(crate) d: u8,
    pub(crate) e: u8,
    pub(crate) h: u8,
    pub(crate) l: u8,
    pub(crate) f: u8, // S Z K H 0 P V, carry held separately
    pub(crate) carry: bool,
    pub(crate) pc: u16,
    pub(crate) sp: u16,
    pub(crate) memptr: u16,
    pub(crate) im: u8, // interrupt mask register
    pub(crate) ie: bool,
    pub(crate) pending_ei: bool,
    pub(crate) int_line: bool,
    pub(crate) trap_pending: bool,
    trap_level: bool,
    pub(crate) intr_fetch: bool,
    pub(crate) halted: bool,
    pin_reset: bool,
    exec_done: bool,
    pub(crate) ticks: i32,
    siod: Option<Box<dyn SerialLine>>,
    breakpoints: Box<[bool; 0x10000]>,
}

impl Default for I8085 {
    fn default() -> Self {
        Self::new()
    }
}

impl I8085 {
    pub fn new() -> Self {
        let mut cpu = Self {
            a: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            f: 0,
            carry: false,
            pc: 0,
            sp: 0,
            memptr: 0,
            im: 0,
            ie: false,
            pending_ei: false,
            int_line: false,
            trap_pending: false,
            trap_level: false,
            intr_fetch: false,
            halted: false,
            pin_reset: false,
            exec_done: false,
            ticks: 0,
            siod: None,
            breakpoints: Box::new([false; 0x10000]),
        };
        cpu.reset();
        cpu
    }

    /// Attach the SID/SOD collaborator.
    pub fn with_serial(siod: Box<dyn SerialLine>) -> Self {
        let mut cpu = Self::new();
        cpu.siod = Some(siod);
        cpu
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }
    pub fn set_bc(&mut self, v: u16) {
        [self.b, self.c] = v.to_be_bytes();
    }
    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }
    pub fn set_de(&mut self, v: u16) {
        [self.d, self.e] = v.to_be_bytes();
    }
    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }
    pub fn set_hl(&mut self, v: u16) {
        [self.h, self.l] = v.to_be_bytes();
    }
    pub fn flags(&self) -> u8 {
        if self.carry { self.f | CARRY } else { self.f }
    }
    pub fn set_flags(&mut self, v: u8) {
        self.f = v & !CARRY;
        self.carry = v & CARRY != 0;
    }
    pub fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.flags() as u16
    }
    pub fn set_af(&mut self, v: u16) {
        self.a = (v >> 8) as u8;
        self.set_flags(v as u8);
    }
    pub fn pc(&self) -> u16 {
        self.pc
    }
    pub fn set_pc(&mut self, v: u16) {
        self.pc = v;
    }
    pub fn sp(&self) -> u16 {
        self.sp
    }
    pub fn set_sp(&mut self, v: u16) {
        self.sp = v;
    }
    pub fn interrupt_mask(&self) -> u8 {
        self.im
    }

    fn set_k(&mut self, state: bool) {
        if state {
            self.f |= K;
        } else {
            self.f &= !K;
        }
    }

    // INX/DCX: chained 8-bit carries; K records the full-pair wrap.
    pub(crate) fn inc_bc(&mut self) {
        self.c = self.c.wrapping_add(1);
        if self.c == 0 {
            self.b = self.b.wrapping_add(1);
            self.set_k(self.b == 0);
        } else {
            self.set_k(false);
        }
    }
    pub(crate) fn dec_bc(&mut self) {
        self.c = self.c.wrapping_sub(1);
        if self.c == 0xff {
            self.b = self.b.wrapping_sub(1);
            self.set_k(self.b == 0xff);
        } else {
            self.set_k(false);
        }
    }
    pub(crate) fn inc_de(&mut self) {
        self.e = self.e.wrapping_add(1);
        if self.e == 0 {
            self.d = self.d.wrapping_add(1);
            self.set_k(self.d == 0);
        } else {
            self.set_k(false);
        }
    }
    pub(crate) fn dec_de(&mut self) {
        self.e = self.e.wrapping_sub(1);
        if self.e == 0xff {
            self.d = self.d.wrapping_sub(1);
            self.set_k(self.d == 0xff);
        } else {
            self.set_k(false);
        }
    }
    pub(crate) fn inc_hl(&mut self) {
        self.l = self.l.wrapping_add(1);
        if self.l == 0 {
            self.h = self.h.wrapping_add(1);
            self.set_k(self.h == 0);
        } else {
            self.set_k(false);
        }
    }
    pub(crate) fn dec_hl(&mut self) {
        self.l = self.l.wrapping_sub(1);
        if self.l == 0xff {
            self.h = self.h.wrapping_sub(1);
            self.set_k(self.h == 0xff);
        } else {
            self.set_k(false);
        }
    }

    pub fn int_line(&self) -> bool {
        self.int_line
    }
    pub fn set_int_line(&mut self, level: bool) {
        self.int_line = level;
    }
    pub fn rst5_5_line(&self) -> bool {
        self.im & I5_5 != 0
    }
    /// Level-sensed RST5.5, vector 0x002c.
    pub fn set_rst5_5_line(&mut self, level: bool) {
        if level {
            self.im |= I5_5;
        } else {
            self.im &= !I5_5;
        }
    }
    pub fn rst6_5_line(&self) -> bool {
        self.im & I6_5 != 0
    }
    /// Level-sensed RST6.5, vector 0x0034.
    pub fn set_rst6_5_line(&mut self, level: bool) {
        if level {
            self.im |= I6_5;
        } else {
            self.im &= !I6_5;
        }
    }
    pub fn rst7_5_line(&self) -> bool {
        self.im & I7_5 != 0
    }
    /// RST7.5 latches on the rising edge, vector 0x003c.
    pub fn set_rst7_5_line(&mut self, level: bool) {
        let last = self.im & I7_5 != 0;
        if !last && level {
            self.im |= I7_5;
        } else if last && !level {
            self.im &= !I7_5;
        }
    }
    /// TRAP goes high and stays pending until acknowledged; the level
    /// must drop before another edge can trigger it.
    pub fn set_trap_line(&mut self, level: bool) {
        if level {
            if self.trap_level {
                return;
            }
            self.trap_pending = true;
            self.trap_level = true;
        } else {
            self.trap_level = false;
        }
    }
    /// Serial input level, surfaces as bit 7 of RIM.
    pub fn set_sid_line(&mut self, level: bool) {
        if level {
            self.im |= SID;
        } else {
            self.im &= !SID;
        }
    }

    pub(crate) fn set_ei(&mut self, ei: bool) {
        self.ie = ei;
        if ei {
            self.im |= IE;
        } else {
            self.im &= !IE;
        }
    }

    pub(crate) fn set_sod(&mut self, bit: bool) {
        if let Some(siod) = self.siod.as_mut() {
            siod.output(bit);
        }
    }

    pub(crate) fn refresh_sid(&mut self) {
        if let Some(siod) = self.siod.as_mut() {
            let level = siod.input();
            self.set_sid_line(level);
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
    pub fn is_ie(&self) -> bool {
        self.ie
    }
    pub fn is_pending_ei(&self) -> bool {
        self.pending_ei
    }
    pub fn set_pin_reset(&mut self) {
        self.pin_reset = true;
    }
    pub fn set_exec_done(&mut self, on: bool) {
        self.exec_done = on;
    }
    pub fn special_cycle(&self) -> &'static str {
        "INT"
    }

    /// Cold reset zeros the register file; a warm reset (armed by
    /// `set_pin_reset`) preserves it.
    pub fn reset(&mut self) {
        if self.pin_reset {
            self.pin_reset = false;
        } else {
            self.a = 0;
            self.set_flags(0);
            self.b = 0;
            self.c = 0;
            self.d = 0;
            self.e = 0;
            self.h = 0;
            self.l = 0;
            self.im = 0;
            self.sp = 0;
            self.memptr = 0;
        }
        self.pc = 0;
        self.ie = false;
        self.pending_ei = false;
        self.int_line = false;
        self.trap_pending = false;
        self.trap_level = false;
        self.halted = false;
        self.intr_fetch = false;
    }

    pub fn is_breakpoint(&self, addr: u16) -> bool {
        self.breakpoints[addr as usize]
    }
    pub fn set_breakpoint(&mut self, addr: u16, state: bool) {
        self.breakpoints[addr as usize] = state;
    }
    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.fill(false);
    }

    pub(crate) fn fetch8<B: Bus<Address = u16>>(&mut self, bus: &mut B) -> u8 {
        let v = if self.intr_fetch {
            bus.int_ack(IntMode::Mode0)
        } else {
            let v = bus.read(self.pc);
            self.pc = self.pc.wrapping_add(1);
            v
        };
        self.ticks += 3;
        v
    }

    pub(crate) fn fetch16<B: Bus<Address = u16>>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch8(bus);
        let hi = self.fetch8(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn fetch_opcode<B: Bus<Address = u16>>(&mut self, bus: &mut B) -> u8 {
        self.ticks += 1;
        self.fetch8(bus)
    }

    pub(crate) fn peek8<B: Bus<Address = u16>>(&mut self, bus: &mut B, addr: u16) -> u8 {
        self.ticks += 3;
        bus.read(addr)
    }

    pub(crate) fn peek16<B: Bus<Address = u16>>(&mut self, bus: &mut B, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read(addr.wrapping_add(1));
        self.ticks += 6;
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn poke8<B: Bus<Address = u16>>(&mut self, bus: &mut B, addr: u16, v: u8) {
        self.ticks += 3;
        bus.write(addr, v);
    }

    pub(crate) fn poke16<B: Bus<Address = u16>>(&mut self, bus: &mut B, addr: u16, v: u16) {
        let [lo, hi] = v.to_le_bytes();
        bus.write(addr, lo);
        bus.write(addr.wrapping_add(1), hi);
        self.ticks += 6;
    }

    pub(crate) fn pop<B: Bus<Address = u16>>(&mut self, bus: &mut B) -> u16 {
        let v = self.peek16(bus, self.sp);
        self.sp = self.sp.wrapping_add(2);
        v
    }

    pub(crate) fn push<B: Bus<Address = u16>>(&mut self, bus: &mut B, v: u16) {
        let [lo, hi] = v.to_le_bytes();
        self.sp = self.sp.wrapping_sub(1);
        self.poke8(bus, self.sp, hi);
        self.sp = self.sp.wrapping_sub(1);
        self.poke8(bus, self.sp, lo);
    }

    /// INTR acceptance: acknowledge-byte fetch, like the 8080.
    fn interruption(&mut self) {
        if self.halted {
            self.halted = false;
            self.pc = self.pc.wrapping_add(1);
        }
        self.set_ei(false);
        self.intr_fetch = true;
        self.ticks += 2;
        self.memptr = self.pc;
    }

    /// Fixed-vector acceptance for TRAP and the RST lines: push the
    /// return address and jump. TRAP clears only the master enable so a
    /// later RIM still shows the pre-TRAP mask.
    fn intr85<B: Bus<Address = u16>>(&mut self, bus: &mut B, vector: u16) {
        if vector == 0x0024 {
            self.ie = false;
        } else {
            self.set_ei(false);
        }
        if self.halted {
            self.halted = false;
            self.pc = self.pc.wrapping_add(1);
        }
        let pc = self.pc;
        self.push(bus, pc);
        self.pc = vector;
        self.memptr = vector;
    }

    /// Run one instruction, servicing pending interrupts first in
    /// TRAP > RST7.5 > RST6.5 > RST5.5 > INTR priority order.
    pub fn execute<B: Bus<Address = u16>>(&mut self, bus: &mut B) -> i32 {
        self.ticks = 0;

        if self.trap_pending {
            self.trap_pending = false;
            self.intr85(bus, 0x0024);
        } else if self.ie && !self.pending_ei {
            if self.im & I7_5 != 0 {
                self.intr85(bus, 0x003c);
            } else if self.im & I6_5 != 0 {
                self.intr85(bus, 0x0034);
            } else if self.im & I5_5 != 0 {
                self.intr85(bus, 0x002c);
            } else if self.int_line {
                self.interruption();
            }
        }

        if self.breakpoints[self.pc as usize] {
            bus.breakpoint();
        }

        let opcode = self.fetch_opcode(bus);
        self.dispatch(bus, opcode);

        if self.pending_ei && opcode != 0xfb {
            self.pending_ei = false;
        }

        if self.exec_done {
            bus.retired();
        }
        let t = if self.intr_fetch { -self.ticks } else { self.ticks };
        self.intr_fetch = false;
        t
    }

    pub fn dump_debug(&self) -> String {
        let mut s = String::new();
        s.push_str("--- 8085 ---\n");
        s.push_str(&format!(
            "INT={} IE={} TRAP={}\nI5.5={} I6.5={} I7.5={}\n",
            self.int_line,
            self.ie,
            self.trap_pending,
            self.rst5_5_line(),
            self.rst6_5_line(),
            self.rst7_5_line()
        ));
        s.push_str(&format!("PC={:04x} SP={:04x}\n", self.pc, self.sp));
        s.push_str(&format!(
            "HL={:04x} DE={:04x} BC={:04x}\n",
            self.hl(),
            self.de(),
            self.bc()
        ));
        s.push_str(&format!(
            "A={:02x} F={}{}{}{}.{}{}{} IM={:02x}\n",
            self.a,
            if self.f & SIGN != 0 { 'S' } else { 's' },
            if self.f & ZERO != 0 { 'Z' } else { 'z' },
            if self.f & K != 0 { 'K' } else { 'k' },
            if self.f & HALFCARRY != 0 { 'H' } else { 'h' },
            if self.f & PARITY != 0 { 'P' } else { 'p' },
            if self.f & V != 0 { 'V' } else { 'v' },
            if self.carry { 'C' } else { 'c' },
            self.im
        ));
        s
    }
}

impl CpuState for I8085 {
    type Snapshot = I8085State;

    fn snapshot(&self) -> I8085State {
        I8085State {
            a: self.a,
            f: self.flags(),
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            sp: self.sp,
            pc: self.pc,
            memptr: self.memptr,
            im: self.im,
            ie: self.ie,
            pending_ei: self.pending_ei,
            int_line: self.int_line,
            trap_pending: self.trap_pending,
            trap_level: self.trap_level,
            halted: self.halted,
        }
    }

    fn restore(&mut self, state: &I8085State) {
        self.a = state.a;
        self.set_flags(state.f);
        self.b = state.b;
        self.c = state.c;
        self.d = state.d;
        self.e = state.e;
        self.h = state.h;
        self.l = state.l;
        self.sp = state.sp;
        self.pc = state.pc;
        self.memptr = state.memptr;
        self.im = state.im;
        self.ie = state.ie;
        self.pending_ei = state.pending_ei;
        self.int_line = state.int_line;
        self.trap_pending = state.trap_pending;
        self.trap_level = state.trap_level;
        self.halted = state.halted;
        self.intr_fetch = false;
    }
}
