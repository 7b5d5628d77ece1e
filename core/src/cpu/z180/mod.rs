//! Zilog Z180 execution engine.
//!
//! The Z80 programming model plus the on-chip peripherals: a three-zone
//! bank-switching MMU in front of every memory access, a 64-byte
//! internal I/O register file, a memory-to-memory DMA channel, the
//! programmable reload timers clocked off the free-running counter, and
//! a vectored internal-interrupt controller. Tick counts follow the
//! shorter Z180 machine cycles (3-clock opcode fetch) and include the
//! programmable memory/I/O wait-state surcharges. Undefined opcodes in
//! the prefixed pages raise the on-chip trap instead of acting as
//! no-ops.

mod bit;
mod dma;
mod exec;
mod extended;
mod ports;

pub use ports::PortDevice;

use crate::core::{Bus, IntMode};
use crate::cpu::flags::Flags;
use crate::cpu::state::{CpuState, Z180State};

/// Which register stands in for HL under a DD/FD prefix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum IndexMode {
    Ix,
    Iy,
}

/// What the last `execute` call spent its time on, when it was not an
/// ordinary instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ServiceKind {
    #[default]
    None,
    Nmi,
    Dma,
    /// External /INT0 acceptance.
    Int0,
    /// Vectored source, numbered as in the IL vector field.
    Internal(u8),
    Trap,
}

pub struct Z180 {
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
    /// Internal and vectored sources, one bit per IL slot (bits 0/1 are
    /// the external /INT1 and /INT2 pins).
    pub(crate) int_lines: u16,
    nmi_pending: bool,
    pub(crate) intr_fetch: bool,
    pub(crate) halted: bool,
    pin_reset: bool,
    exec_done: bool,
    pub(crate) ticks: i32,

    /// On-chip I/O register file, indexed by the relocatable 64-byte
    /// internal port window.
    pub(crate) ccr: [u8; 64],
    /// Memory/I/O wait states and the refresh generator, decoded out of
    /// DCNTL/RCR on write.
    pub(crate) mw: i32,
    pub(crate) iw: i32,
    rw: i32,
    rc: i32,
    rcc: i32,
    /// MMU bases and boundaries, decoded out of CBR/BBR/CBAR on write.
    pub(crate) cbr: u32,
    pub(crate) bbr: u32,
    pub(crate) com1: u16,
    pub(crate) bnk1: u16,
    /// Internal I/O window base (ICR bits 7-6).
    pub(crate) ioa: u16,
    pre_frc: i32,
    pub(crate) active_dma: bool,
    pub(crate) active_trap: bool,
    service: ServiceKind,

    pub(crate) devices: Vec<Box<dyn PortDevice>>,
    pub(crate) port_claims: [u8; 64],
    breakpoints: Box<[bool; 0x10000]>,
}

impl Default for Z180 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z180 {
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
            int_lines: 0,
            nmi_pending: false,
            intr_fetch: false,
            halted: false,
            pin_reset: false,
            exec_done: false,
            ticks: 0,
            ccr: [0; 64],
            mw: 0,
            iw: 0,
            rw: 0,
            rc: 0,
            rcc: 0,
            cbr: 0,
            bbr: 0,
            com1: 0,
            bnk1: 0,
            ioa: 0,
            pre_frc: 0,
            active_dma: false,
            active_trap: false,
            service: ServiceKind::None,
            devices: Vec::new(),
            port_claims: [0; 64],
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
    /// Level-sensed /INT0, gated by ITC bit 0 and IFF1.
    pub fn set_int_line(&mut self, level: bool) {
        self.int_line = level;
    }
    /// Level-sensed /INT1, slot 0 of the vectored sources.
    pub fn set_int1_line(&mut self, level: bool) {
        if level {
            self.raise_internal_int(0);
        } else {
            self.lower_internal_int(0);
        }
    }
    pub fn is_int1_line(&self) -> bool {
        self.int_lines & 0b01 != 0
    }
    /// Level-sensed /INT2, slot 1.
    pub fn set_int2_line(&mut self, level: bool) {
        if level {
            self.raise_internal_int(1);
        } else {
            self.lower_internal_int(1);
        }
    }
    pub fn is_int2_line(&self) -> bool {
        self.int_lines & 0b10 != 0
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
    /// What the previous `execute` call serviced, if anything.
    pub fn last_service(&self) -> ServiceKind {
        self.service
    }

    /// Cold reset forces the register file to all-ones and the on-chip
    /// register file to its power-on pattern; a warm reset (armed by
    /// `set_pin_reset`) preserves the general registers but still
    /// reinitializes the on-chip peripherals.
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
        self.int_lines = 0;
        self.pre_frc = 0;
        self.halted = false;
        self.im = IntMode::Mode0;
        self.intr_fetch = false;
        self.last_q = false;
        self.active_dma = false;
        self.active_trap = false;
        self.service = ServiceKind::None;

        self.ccr.fill(0);
        self.ccr[0x30] = 0b0011_0010; // DSTAT
        self.ccr[0x31] = 0b1100_0001; // DMODE
        self.ccr[0x32] = 0b1111_0000; // DCNTL
        self.mw = 3;
        self.iw = 3;
        self.ccr[0x34] = 0b0011_1001; // ITC
        self.ccr[0x36] = 0b1111_1100; // RCR
        self.rw = 2;
        self.rc = 10;
        self.rcc = 0;
        self.ccr[0x3e] = 0xff; // OMCR
        self.ccr[0x3f] = 0b0001_1111; // ICR
        // PRT reload and counter registers idle at all-ones
        self.ccr[0x0c] = 0xff;
        self.ccr[0x0d] = 0xff;
        self.ccr[0x0e] = 0xff;
        self.ccr[0x0f] = 0xff;
        self.ccr[0x14] = 0xff;
        self.ccr[0x15] = 0xff;
        self.ccr[0x16] = 0xff;
        self.ccr[0x17] = 0xff;
        self.ccr[0x18] = 0xff; // FRC
        self.ioa = 0;
        self.cbr = 0;
        self.bbr = 0;
        self.ccr[0x3a] = 0xff; // CBAR
        self.com1 = ((self.ccr[0x3a] & 0xf0) as u16) << 8;
        self.bnk1 = ((self.ccr[0x3a] & 0x0f) as u16) << 12;
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

    pub(crate) fn fetch8<B: Bus<Address = u32>>(&mut self, bus: &mut B) -> u8 {
        if self.intr_fetch {
            let v = bus.int_ack(self.im);
            self.ticks += 3;
            v
        } else {
            let pc = self.pc;
            let v = self.peek8(bus, pc);
            self.pc = self.pc.wrapping_add(1);
            v
        }
    }

    pub(crate) fn fetch16<B: Bus<Address = u32>>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch8(bus);
        let hi = self.fetch8(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// M1 cycle: an R bump on top of the fetch. Unlike the Z80 there is
    /// no extra clock; the Z180 fetches opcodes in three.
    pub(crate) fn fetch_opcode<B: Bus<Address = u32>>(&mut self, bus: &mut B) -> u8 {
        self.r = self.r.wrapping_add(1);
        self.fetch8(bus)
    }

    /// Every memory access runs through the MMU and charges the
    /// programmed memory wait states.
    pub(crate) fn peek8<B: Bus<Address = u32>>(&mut self, bus: &mut B, addr: u16) -> u8 {
        let pa = self.phy_addr(addr);
        let v = bus.read(pa);
        self.ticks += 3 + self.mw;
        v
    }

    pub(crate) fn peek16<B: Bus<Address = u32>>(&mut self, bus: &mut B, addr: u16) -> u16 {
        let lo = self.peek8(bus, addr);
        let hi = self.peek8(bus, addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn poke8<B: Bus<Address = u32>>(&mut self, bus: &mut B, addr: u16, v: u8) {
        let pa = self.phy_addr(addr);
        bus.write(pa, v);
        self.ticks += 3 + self.mw;
    }

    pub(crate) fn poke16<B: Bus<Address = u32>>(&mut self, bus: &mut B, addr: u16, v: u16) {
        let [lo, hi] = v.to_le_bytes();
        self.poke8(bus, addr, lo);
        self.poke8(bus, addr.wrapping_add(1), hi);
    }

    pub(crate) fn pop<B: Bus<Address = u32>>(&mut self, bus: &mut B) -> u16 {
        let sp = self.sp;
        let v = self.peek16(bus, sp);
        self.sp = self.sp.wrapping_add(2);
        v
    }

    pub(crate) fn push<B: Bus<Address = u32>>(&mut self, bus: &mut B, v: u16) {
        let [lo, hi] = v.to_le_bytes();
        self.sp = self.sp.wrapping_sub(1);
        let sp = self.sp;
        self.poke8(bus, sp, hi);
        self.sp = self.sp.wrapping_sub(1);
        let sp = self.sp;
        self.poke8(bus, sp, lo);
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

    /// Undefined prefixed opcode: record the prefix width in ITC, push
    /// the address of the offending byte and restart at the trap
    /// vector. `width` counts the opcode bytes consumed including the
    /// undefined one.
    pub(crate) fn trap<B: Bus<Address = u32>>(&mut self, bus: &mut B, width: u8) {
        self.ccr[0x34] &= 0b0011_1111;
        self.ccr[0x34] |= 0b1000_0000; // TRAP
        if width > 2 {
            self.ccr[0x34] |= 0b0100_0000; // UFO
        }
        let ret = self.pc.wrapping_sub(1);
        self.push(bus, ret);
        self.pc = 0x0000;
        self.active_trap = true;
    }

    /// /INT0 acceptance, by interrupt mode. IM0 arms the acknowledge
    /// fetch and lets the normal fetch path read the instruction; IM1
    /// and IM2 complete the whole service here.
    fn interruption<B: Bus<Address = u32>>(&mut self, bus: &mut B) {
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

    /// Vectored service for the internal/INT1/INT2 sources: always
    /// IM2-style through the I register and the IL vector field.
    fn internal_intr<B: Bus<Address = u32>>(&mut self, bus: &mut B, slot: u8) {
        if self.halted {
            self.halted = false;
            self.pc = self.pc.wrapping_add(1);
        }
        self.iff1 = false;
        self.iff2 = false;
        let pc = self.pc;
        self.push(bus, pc);
        let vec = (self.i as u16) << 8 | (self.ccr[0x33] & 0b1110_0000) as u16 | (slot as u16) << 1;
        self.pc = self.peek16(bus, vec);
        self.memptr = self.pc;
    }

    /// NMI also freezes the DMA engine (DME cleared).
    fn nmi<B: Bus<Address = u32>>(&mut self, bus: &mut B) {
        self.ccr[0x30] &= !0b0000_0001;
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

    /// Run one instruction, DMA cycle, or interrupt/NMI/trap service
    /// (the latter reported as a negative tick count), then clock the
    /// free-running counter and the reload timers off the time spent.
    pub fn execute<B: Bus<Address = u32>>(&mut self, bus: &mut B) -> i32 {
        let t = self.exec_one(bus);
        self.pre_frc += t.abs();
        while self.pre_frc >= 10 {
            self.ccr[0x18] = self.ccr[0x18].wrapping_sub(1);
            self.pre_frc -= 10;
            if self.ccr[0x10] & 0b0000_0011 != 0 && self.ccr[0x18] & 1 != 0 {
                self.do_prt();
            }
        }
        t
    }

    fn exec_one<B: Bus<Address = u32>>(&mut self, bus: &mut B) -> i32 {
        // Refresh accounting: charge a REF cycle every rc clocks.
        self.rcc -= self.ticks;
        self.ticks = 0;
        if self.rw > 0 && self.rcc <= 0 {
            self.rcc = self.rc;
            self.ticks += self.rw;
        }
        self.service = ServiceKind::None;

        if self.nmi_pending {
            self.nmi_pending = false;
            self.last_q = false;
            self.nmi(bus);
            self.service = ServiceKind::Nmi;
            return -self.ticks;
        }

        if self.dma(bus) {
            self.service = ServiceKind::Dma;
            return -self.ticks;
        }

        let itc = self.ccr[0x34];
        // ITE1/ITE2 gate the two external pins; internal sources are
        // always enabled.
        let iim = (itc as u16 >> 1) | !0b11;
        if self.int_line && itc & 0b0000_0001 != 0 && self.iff1 && !self.pending_ei {
            self.last_q = false;
            self.interruption(bus);
            self.service = ServiceKind::Int0;
            if !self.intr_fetch {
                return -self.ticks;
            }
        } else if self.int_lines & iim != 0 && self.iff1 && !self.pending_ei {
            let slot = (self.int_lines & iim).trailing_zeros() as u8;
            self.last_q = false;
            self.internal_intr(bus, slot);
            self.service = ServiceKind::Internal(slot);
            return -self.ticks;
        }

        if self.breakpoints[self.pc as usize] {
            bus.breakpoint();
        }

        let opcode = self.fetch_opcode(bus);
        self.f.q = false;
        self.active_trap = false;
        self.dispatch(bus, opcode);
        if self.active_trap {
            self.active_trap = false;
            self.service = ServiceKind::Trap;
            return -self.ticks;
        }
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

    /// Decrement one reload timer pair; reload and raise its TIF/irq on
    /// terminal count.
    fn dcr_prt(&mut self, reg: usize) {
        if self.ccr[reg] == 0 && self.ccr[reg + 1] == 0 {
            self.ccr[reg] = self.ccr[reg + 2];
            self.ccr[reg + 1] = self.ccr[reg + 3];
            return;
        }
        self.ccr[reg] = self.ccr[reg].wrapping_sub(1);
        if self.ccr[reg] == 0 && self.ccr[reg + 1] == 0 {
            let (tif, tie, slot) = if reg > 0x10 {
                (0b1000_0000, 0b0010_0000, 3)
            } else {
                (0b0100_0000, 0b0001_0000, 2)
            };
            self.ccr[0x10] |= tif;
            if self.ccr[0x10] & tie != 0 {
                self.raise_internal_int(slot);
            }
        } else if self.ccr[reg] == 0xff {
            self.ccr[reg + 1] = self.ccr[reg + 1].wrapping_sub(1);
        }
    }

    fn do_prt(&mut self) {
        if self.ccr[0x10] & 0b0000_0001 != 0 {
            self.dcr_prt(0x0c);
        }
        if self.ccr[0x10] & 0b0000_0010 != 0 {
            self.dcr_prt(0x14);
        }
    }

    pub fn dump_debug(&self) -> String {
        let f = self.f.get();
        let mut s = String::new();
        s.push_str("--- Z180 ---\n");
        s.push_str(&format!(
            "INT0={} NMI={} IFF1={} IFF2={} IM={:?}\n",
            self.int_line, self.nmi_pending, self.iff1, self.iff2, self.im
        ));
        s.push_str(&format!(
            "PC={:04x} SP={:04x} I={:02x} R={:02x}\n",
            self.pc,
            self.sp,
            self.i,
            self.reg_r()
        ));
        s.push_str(&format!(
            "HL={:04x} DE={:04x} BC={:04x} IX={:04x} IY={:04x}\n",
            self.hl(),
            self.de(),
            self.bc(),
            self.ix,
            self.iy
        ));
        s.push_str(&format!(
            "A={:02x} F={}{}{}{}{}{}{}{} WZ={:04x}\n",
            self.a,
            if f & 0x80 != 0 { 'S' } else { 's' },
            if f & 0x40 != 0 { 'Z' } else { 'z' },
            if f & 0x20 != 0 { '5' } else { '.' },
            if f & 0x10 != 0 { 'H' } else { 'h' },
            if f & 0x08 != 0 { '3' } else { '.' },
            if f & 0x04 != 0 { 'P' } else { 'p' },
            if f & 0x02 != 0 { 'N' } else { 'n' },
            if f & 0x01 != 0 { 'C' } else { 'c' },
            self.memptr
        ));
        s.push_str(&format!("ITC={:02x} INTLINES={:04x}\n", self.ccr[0x34], self.int_lines));
        s.push_str(&format!(
            "DMA0: {:02x}:{:02x}:{:02x} {:02x}:{:02x}:{:02x} {:02x}:{:02x}\n",
            self.ccr[0x22],
            self.ccr[0x21],
            self.ccr[0x20],
            self.ccr[0x25],
            self.ccr[0x24],
            self.ccr[0x23],
            self.ccr[0x27],
            self.ccr[0x26]
        ));
        s.push_str(&format!(
            "DSTAT={:02x} DMODE={:02x}\n",
            self.ccr[0x30], self.ccr[0x31]
        ));
        s.push_str(&format!(
            "MMU: CBR={:02x} BBR={:02x} CBAR={:02x}\n",
            self.ccr[0x38], self.ccr[0x39], self.ccr[0x3a]
        ));
        s
    }
}

impl CpuState for Z180 {
    type Snapshot = Z180State;

    fn snapshot(&self) -> Z180State {
        Z180State {
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
            int_lines: self.int_lines,
            nmi_pending: self.nmi_pending,
            halted: self.halted,
        }
    }

    fn restore(&mut self, state: &Z180State) {
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
        self.int_lines = state.int_lines;
        self.nmi_pending = state.nmi_pending;
        self.halted = state.halted;
        self.intr_fetch = false;
    }
}
