//! Zilog Z80 execution engine.
//!
//! Full documented and undocumented instruction space: the CB/ED/DD/FD
//! pages including SLL, the IXH/IXL/IYH/IYL register halves and the
//! DDCB/FDCB register-copy forms. MEMPTR and the Q latch are modeled so
//! BIT n,(HL) and SCF/CCF produce the exact undocumented flag bits.

mod bit;
mod exec;
mod extended;

use crate::core::{Bus, IntMode};
use crate::cpu::flags::Flags;
use crate::cpu::state::{CpuState, Z80State};

/// Which register stands in for HL under a DD/FD prefix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum IndexMode {
    Ix,
    Iy,
}

pub struct Z80 {
    pub(crate) a: u8,
    pub(crate) b: u8,
    pub(crate) c: u8,
    pub(crate) d: u8,
    pub(crate) e: u8,
    pub(crate) h: u8,
    pub(crate) l: u8,
    pub(crate) f: Flags,
    a_prime: u8,
    f_prime: u8,
    b_prime: u8,
    c_prime: u8,
    d_prime: u8,
    e_prime: u8,
    h_prime: u8,
    l_prime: u8,
    pub(crate) ix: u16,
    pub(crate) iy: u16,
    pub(crate) pc: u16,
    pub(crate) sp: u16,
    pub(crate) i: u8,
    r: u8, // low 7 bits count M1 cycles
    r_bit7: bool,
    pub(crate) im: IntMode,
    pub(crate) iff1: bool,
    pub(crate) iff2: bool,
    pub(crate) memptr: u16,
    pub(crate) last_q: bool,
    pub(crate) pending_ei: bool,
    int_line: bool,
    nmi_pending: bool,
    pub(crate) intr_fetch: bool,
    pub(crate) halted: bool,
    pin_reset: bool,
    exec_done: bool,
    pub(crate) ticks: i32,
    breakpoints: Box<[bool; 0x10000]>,
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80 {
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
            a_prime: 0,
            f_prime: 0,
            b_prime: 0,
            c_prime: 0,
            d_prime: 0,
            e_prime: 0,
            h_prime: 0,
            l_prime: 0,
            ix: 0,
            iy: 0,
            pc: 0,
            sp: 0,
            i: 0,
            r: 0,
            r_bit7: false,
            im: IntMode::Mode0,
            iff1: false,
            iff2: false,
            memptr: 0,
            last_q: false,
            pending_ei: false,
            int_line: false,
            nmi_pending: false,
            intr_fetch: false,
            halted: false,
            pin_reset: false,
            exec_done: false,
            ticks: 0,
            breakpoints: Box::new([false; 0x10000]),
        };
        cpu.reset();
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
    pub fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.f.get() as u16
    }
    pub fn set_af(&mut self, v: u16) {
        self.a = (v >> 8) as u8;
        self.f.set(v as u8);
    }
    pub fn ix(&self) -> u16 {
        self.ix
    }
    pub fn set_ix(&mut self, v: u16) {
        self.ix = v;
    }
    pub fn iy(&self) -> u16 {
        self.iy
    }
    pub fn set_iy(&mut self, v: u16) {
        self.iy = v;
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
    pub fn reg_i(&self) -> u8 {
        self.i
    }
    pub fn set_reg_i(&mut self, v: u8) {
        self.i = v;
    }
    pub fn reg_r(&self) -> u8 {
        (self.r & 0x7f) | if self.r_bit7 { 0x80 } else { 0 }
    }
    pub fn set_reg_r(&mut self, v: u8) {
        self.r = v & 0x7f;
        self.r_bit7 = v & 0x80 != 0;
    }
    pub fn im(&self) -> IntMode {
        self.im
    }
    pub fn set_im(&mut self, im: IntMode) {
        self.im = im;
    }
    pub fn is_iff1(&self) -> bool {
        self.iff1
    }
    pub fn is_iff2(&self) -> bool {
        self.iff2
    }

    pub fn int_line(&self) -> bool {
        self.int_line
    }
    /// Level-sensed /INT.
    pub fn set_int_line(&mut self, level: bool) {
        self.int_line = level;
    }
    /// Edge-sensed /NMI; latched until serviced.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
    pub fn is_ie(&self) -> bool {
        self.iff1
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
        if self.nmi_pending { "NMI" } else { "INT" }
    }

    /// Cold reset forces the register file to all-ones; a warm reset
    /// (armed by `set_pin_reset`) preserves it.
    pub fn reset(&mut self) {
        if self.pin_reset {
            self.pin_reset = false;
        } else {
            self.a = 0xff;
            self.a_prime = 0xff;
            self.f.set(0xff);
            self.f_prime = 0xff;
            self.b = 0xff;
            self.b_prime = 0xff;
            self.c = 0xff;
            self.c_prime = 0xff;
            self.d = 0xff;
            self.d_prime = 0xff;
            self.e = 0xff;
            self.e_prime = 0xff;
            self.h = 0xff;
            self.h_prime = 0xff;
            self.l = 0xff;
            self.l_prime = 0xff;
            self.ix = 0xffff;
            self.iy = 0xffff;
            self.sp = 0xffff;
            self.memptr = 0xffff;
        }
        self.pc = 0;
        self.i = 0;
        self.r = 0;
        self.r_bit7 = false;
        self.iff1 = false;
        self.iff2 = false;
        self.pending_ei = false;
        self.nmi_pending = false;
        self.int_line = false;
        self.halted = false;
        self.im = IntMode::Mode0;
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

    /// M1 cycle: one extra tick and an R bump on top of the fetch.
    pub(crate) fn fetch_opcode<B: Bus<Address = u16>>(&mut self, bus: &mut B) -> u8 {
        self.ticks += 1;
        self.r = self.r.wrapping_add(1);
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

    pub(crate) fn exchange_af(&mut self) {
        core::mem::swap(&mut self.a, &mut self.a_prime);
        let f = self.f.get();
        self.f.set(self.f_prime);
        self.f_prime = f;
    }

    pub(crate) fn exchange_regs(&mut self) {
        core::mem::swap(&mut self.b, &mut self.b_prime);
        core::mem::swap(&mut self.c, &mut self.c_prime);
        core::mem::swap(&mut self.d, &mut self.d_prime);
        core::mem::swap(&mut self.e, &mut self.e_prime);
        core::mem::swap(&mut self.h, &mut self.h_prime);
        core::mem::swap(&mut self.l, &mut self.l_prime);
    }

    /// Mode-dependent /INT acceptance. IM0 arms the acknowledge fetch
    /// and lets the normal fetch path read the instruction; IM1 and IM2
    /// complete the whole service here.
    fn interruption<B: Bus<Address = u16>>(&mut self, bus: &mut B) {
        if self.halted {
            self.halted = false;
            self.pc = self.pc.wrapping_add(1);
        }
        self.iff1 = false;
        self.iff2 = false;
        match self.im {
            IntMode::Mode0 => {
                self.intr_fetch = true;
                self.ticks += 2;
            }
            IntMode::Mode1 => {
                self.ticks += 7;
                let pc = self.pc;
                self.push(bus, pc);
                self.pc = 0x0038;
            }
            IntMode::Mode2 => {
                self.ticks += 7;
                let val = bus.int_ack(IntMode::Mode2);
                let pc = self.pc;
                self.push(bus, pc);
                let vec = (self.i as u16) << 8 | val as u16;
                self.pc = self.peek16(bus, vec);
            }
        }
        self.memptr = self.pc;
    }

    fn nmi<B: Bus<Address = u16>>(&mut self, bus: &mut B) {
        self.ticks += 5;
        if self.halted {
            self.halted = false;
            self.pc = self.pc.wrapping_add(1);
        }
        self.iff1 = false;
        let pc = self.pc;
        self.push(bus, pc);
        self.pc = 0x0066;
        self.memptr = 0x0066;
    }

    /// Run one instruction, or one interrupt/NMI service reported as a
    /// negative tick count.
    pub fn execute<B: Bus<Address = u16>>(&mut self, bus: &mut B) -> i32 {
        self.ticks = 0;

        if self.nmi_pending {
            self.nmi_pending = false;
            self.nmi(bus);
            return -self.ticks;
        }

        if self.int_line && self.iff1 && !self.pending_ei {
            self.interruption(bus);
            if !self.intr_fetch {
                return -self.ticks;
            }
        }

        if self.breakpoints[self.pc as usize] {
            bus.breakpoint();
        }

        let opcode = self.fetch_opcode(bus);
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

    pub fn dump_debug(&self) -> String {
        let f = self.f.get();
        let mut s = String::new();
        s.push_str("--- Z80 ---\n");
        s.push_str(&format!(
            "INT={} NMI={} IFF1={} IFF2={} IM={:?}\n",
            self.int_line, self.nmi_pending, self.iff1, self.iff2, self.im
        ));
        s.push_str(&format!("PC={:04x} SP={:04x}\n", self.pc, self.sp));
        s.push_str(&format!(
            "HL={:04x} DE={:04x} BC={:04x} IX={:04x} IY={:04x}\n",
            self.hl(),
            self.de(),
            self.bc(),
            self.ix,
            self.iy
        ));
        s.push_str(&format!(
            "A={:02x} F={}{}{}{}{}{}{}{} I={:02x} R={:02x} WZ={:04x}\n",
            self.a,
            if f & 0x80 != 0 { 'S' } else { 's' },
            if f & 0x40 != 0 { 'Z' } else { 'z' },
            if f & 0x20 != 0 { '5' } else { '.' },
            if f & 0x10 != 0 { 'H' } else { 'h' },
            if f & 0x08 != 0 { '3' } else { '.' },
            if f & 0x04 != 0 { 'P' } else { 'p' },
            if f & 0x02 != 0 { 'N' } else { 'n' },
            if f & 0x01 != 0 { 'C' } else { 'c' },
            self.i,
            self.reg_r(),
            self.memptr
        ));
        s
    }
}

impl CpuState for Z80 {
    type Snapshot = Z80State;

    fn snapshot(&self) -> Z80State {
        Z80State {
            a: self.a,
            f: self.f.get(),
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            a_prime: self.a_prime,
            f_prime: self.f_prime,
            b_prime: self.b_prime,
            c_prime: self.c_prime,
            d_prime: self.d_prime,
            e_prime: self.e_prime,
            h_prime: self.h_prime,
            l_prime: self.l_prime,
            ix: self.ix,
            iy: self.iy,
            sp: self.sp,
            pc: self.pc,
            i: self.i,
            r: self.reg_r(),
            im: self.im,
            iff1: self.iff1,
            iff2: self.iff2,
            memptr: self.memptr,
            last_q: self.last_q,
            pending_ei: self.pending_ei,
            int_line: self.int_line,
            nmi_pending: self.nmi_pending,
            halted: self.halted,
        }
    }

    fn restore(&mut self, state: &Z80State) {
        self.a = state.a;
        self.f.set(state.f);
        self.b = state.b;
        self.c = state.c;
        self.d = state.d;
        self.e = state.e;
        self.h = state.h;
        self.l = state.l;
        self.a_prime = state.a_prime;
        self.f_prime = state.f_prime;
        self.b_prime = state.b_prime;
        self.c_prime = state.c_prime;
        self.d_prime = state.d_prime;
        self.e_prime = state.e_prime;
        self.h_prime = state.h_prime;
        self.l_prime = state.l_prime;
        self.ix = state.ix;
        self.iy = state.iy;
        self.sp = state.sp;
        self.pc = state.pc;
        self.i = state.i;
        self.set_reg_r(state.r);
        self.im = state.im;
        self.iff1 = state.iff1;
        self.iff2 = state.iff2;
        self.memptr = state.memptr;
        self.last_q = state.last_q;
        self.pending_ei = state.pending_ei;
        self.int_line = state.int_line;
        self.nmi_pending = state.nmi_pending;
        self.halted = state.halted;
        self.intr_fetch = false;
    }
}
