//! Intel 8080 execution engine.
//!
//! Per-instruction stepping: `execute` runs exactly one instruction (or
//! one interrupt acceptance) and returns the T-state count, negated when
//! the step serviced the INTR line instead of a normal fetch. Undefined
//! opcodes execute as NOP.

mod exec;

use crate::core::{Bus, IntMode};
use crate::cpu::alu;
use crate::cpu::flags::Flags;
use crate::cpu::state::{CpuState, I8080State};

pub struct I8080 {
    pub(crate) a: u8,
    pub(crate) b: u8,
    pub(crate) c: u8,
    pub(crate) d: u8,
    pub(crate) e: u8,
    pub(crate) h: u8,
    pub(crate) l: u8,
    pub(crate) f: Flags,
    pub(crate) pc: u16,
    pub(crate) sp: u16,
    // Hidden address latch; feeds undocumented bit-5/3 sources.
    pub(crate) memptr: u16,
    pub(crate) ie: bool,
    pub(crate) pending_ei: bool,
    pub(crate) int_line: bool,
    pub(crate) intr_fetch: bool,
    pub(crate) halted: bool,
    pub(crate) last_q: bool,
    pin_reset: bool,
    exec_done: bool,
    pub(crate) ticks: i32,
    breakpoints: Box<[bool; 0x10000]>,
}

impl Default for I8080 {
    fn default() -> Self {
        Self::new()
    }
}

impl I8080 {
    pub fn new() -> Self {
        let mut cpu = Self {
            a: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            f: Flags::default(),
            pc: 0,
            sp: 0,
            memptr: 0,
            ie: false,
            pending_ei: false,
            int_line: false,
            intr_fetch: false,
            halted: false,
            last_q: false,
            pin_reset: false,
            exec_done: false,
            ticks: 0,
            breakpoints: Box::new([false; 0x10000]),
        };
        cpu.reset();
        cpu
    }

    // 16-bit pair accessors compose/decompose the 8-bit halves.
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
    pub fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.f.get() as u16
    }
    pub fn set_af(&mut self, v: u16) {
        self.a = (v >> 8) as u8;
        self.f.set(v as u8);
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
    pub fn flags(&self) -> u8 {
        self.f.get()
    }
    pub fn set_flags(&mut self, v: u8) {
        self.f.set(v);
    }

    // Pair inc/dec are chained 8-bit carries, not a 16-bit add.
    pub(crate) fn inc_bc(&mut self) {
        self.c = self.c.wrapping_add(1);
        if self.c == 0 {
            self.b = self.b.wrapping_add(1);
        }
    }
    pub(crate) fn dec_bc(&mut self) {
        self.c = self.c.wrapping_sub(1);
        if self.c == 0xff {
            self.b = self.b.wrapping_sub(1);
        }
    }
    pub(crate) fn inc_de(&mut self) {
        self.e = self.e.wrapping_add(1);
        if self.e == 0 {
            self.d = self.d.wrapping_add(1);
        }
    }
    pub(crate) fn dec_de(&mut self) {
        self.e = self.e.wrapping_sub(1);
        if self.e == 0xff {
            self.d = self.d.wrapping_sub(1);
        }
    }
    pub(crate) fn inc_hl(&mut self) {
        self.l = self.l.wrapping_add(1);
        if self.l == 0 {
            self.h = self.h.wrapping_add(1);
        }
    }
    pub(crate) fn dec_hl(&mut self) {
        self.l = self.l.wrapping_sub(1);
        if self.l == 0xff {
            self.h = self.h.wrapping_sub(1);
        }
    }

    pub fn int_line(&self) -> bool {
        self.int_line
    }
    /// Level-sensed maskable request line.
    pub fn set_int_line(&mut self, level: bool) {
        self.int_line = level;
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
    /// Arm a warm reset: the next `reset` clears control state but
    /// preserves the register file.
    pub fn set_pin_reset(&mut self) {
        self.pin_reset = true;
    }
    /// Enable the per-instruction `Bus::retired` notification.
    pub fn set_exec_done(&mut self, on: bool) {
        self.exec_done = on;
    }
    /// Tag for the last special cycle; the 8080 only has one kind.
    pub fn special_cycle(&self) -> &'static str {
        "INT"
    }

    pub fn reset(&mut self) {
        if self.pin_reset {
            self.pin_reset = false;
        } else {
            self.a = 0xff;
            self.f.set(0xff);
            self.b = 0xff;
            self.c = 0xff;
            self.d = 0xff;
            self.e = 0xff;
            self.h = 0xff;
            self.l = 0xff;
            self.sp = 0xffff;
            self.memptr = 0xffff;
        }
        self.pc = 0;
        self.ie = false;
        self.pending_ei = false;
        self.int_line = false;
        self.halted = false;
        self.intr_fetch = false;
        self.last_q = false;
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

    // Bus access helpers. Every memory byte costs 3 T, an opcode fetch 4.
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

    /// INTR acceptance: take the CPU out of halt, drop IE and redirect the
    /// next fetch to the bus acknowledge byte. 2 extra T-states for the
    /// acknowledge M1.
    fn interruption(&mut self) {
        if self.halted {
            self.halted = false;
            self.pc = self.pc.wrapping_add(1);
        }
        self.ie = false;
        self.intr_fetch = true;
        self.ticks += 2;
        self.memptr = self.pc;
    }

    /// Run one instruction (or accept a pending interrupt). Negative
    /// return means the step serviced INTR.
    pub fn execute<B: Bus<Address = u16>>(&mut self, bus: &mut B) -> i32 {
        self.ticks = 0;

        if self.int_line && self.ie && !self.pending_ei {
            self.last_q = false;
            self.interruption();
        }

        if self.breakpoints[self.pc as usize] {
            bus.breakpoint();
        }

        let opcode = self.fetch_opcode(bus); // may fetch the acknowledge byte

        self.f.q = false;
        self.dispatch(bus, opcode);
        self.last_q = self.f.q;

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

    /// AND with the documented 8080 half-carry rule: AC is the OR of the
    /// operands' bit 3.
    pub(crate) fn and_a(&mut self, v: u8) {
        let h = (self.a | v) & 0x08 != 0;
        self.a = alu::and8(&mut self.f, self.a, v);
        if !h {
            self.f.bits &= !crate::cpu::flags::HALFCARRY;
        }
    }

    pub fn dump_debug(&self) -> String {
        let f = self.f.get();
        let mut s = String::new();
        s.push_str("--- 8080 ---\n");
        s.push_str(&format!(
            "PC={:04x} SP={:04x} IE={} INT={}\n",
            self.pc, self.sp, self.ie as u8, self.int_line as u8
        ));
        s.push_str(&format!(
            "A={:02x} B={:02x} C={:02x} D={:02x} E={:02x} H={:02x} L={:02x}\n",
            self.a, self.b, self.c, self.d, self.e, self.h, self.l
        ));
        s.push_str(&format!(
            "F={:02x} {}{}{}{}{}{}\n",
            f,
            if f & 0x80 != 0 { 'S' } else { 's' },
            if f & 0x40 != 0 { 'Z' } else { 'z' },
            if f & 0x10 != 0 { 'H' } else { 'h' },
            if f & 0x04 != 0 { 'P' } else { 'p' },
            if f & 0x02 != 0 { 'N' } else { 'n' },
            if f & 0x01 != 0 { 'C' } else { 'c' },
        ));
        s
    }
}

impl CpuState for I8080 {
    type Snapshot = I8080State;

    fn snapshot(&self) -> I8080State {
        I8080State {
            a: self.a,
            f: self.f.get(),
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            sp: self.sp,
            pc: self.pc,
            memptr: self.memptr,
            ie: self.ie,
            pending_ei: self.pending_ei,
            int_line: self.int_line,
            halted: self.halted,
        }
    }

    fn restore(&mut self, state: &I8080State) {
        self.a = state.a;
        self.f.set(state.f);
        self.b = state.b;
        self.c = state.c;
        self.d = state.d;
        self.e = state.e;
        self.h = state.h;
        self.l = state.l;
        self.sp = state.sp;
        self.pc = state.pc;
        self.memptr = state.memptr;
        self.ie = state.ie;
        self.pending_ei = state.pending_ei;
        self.int_line = state.int_line;
        self.halted = state.halted;
        self.intr_fetch = false;
        self.last_q = false;
    }
}
