//! CPU state snapshot types and traits

use crate::core::IntMode;

/// Trait for engines that can export and re-import their full
/// register-file-plus-interrupt state as one value object. The
/// persistence format is the host's concern.
pub trait CpuState {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;
    fn restore(&mut self, state: &Self::Snapshot);
}

/// 8080 CPU state snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct I8080State {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub memptr: u16, // Hidden address latch
    pub ie: bool,    // Interrupt enable flip-flop
    pub pending_ei: bool,
    pub int_line: bool,
    pub halted: bool,
}

/// 8085 CPU state snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct I8085State {
    pub a: u8,
    pub f: u8, // PSW: S Z K H 0 P V C
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub memptr: u16,
    pub im: u8, // Interrupt mask register (SID I7.5 I6.5 I5.5 IE M7.5 M6.5 M5.5)
    pub ie: bool,
    pub pending_ei: bool,
    pub int_line: bool,
    pub trap_pending: bool,
    pub trap_level: bool, // TRAP pin level latch (edge detector)
    pub halted: bool,
}

/// Z80 CPU state snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Z80State {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub a_prime: u8,
    pub f_prime: u8,
    pub b_prime: u8,
    pub c_prime: u8,
    pub d_prime: u8,
    pub e_prime: u8,
    pub h_prime: u8,
    pub l_prime: u8,
    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,
    pub im: IntMode,
    pub iff1: bool,
    pub iff2: bool,
    pub memptr: u16,  // Hidden WZ register
    pub last_q: bool, // "previous instruction modified F" latch
    pub pending_ei: bool,
    pub int_line: bool,
    pub nmi_pending: bool,
    pub halted: bool,
}

/// Z180 CPU state snapshot. The on-chip I/O register file is engine
/// configuration reached through ports, not architectural state, so it is
/// re-established by reset/port writes rather than carried here.
#[derive(Debug, Clone, PartialEq)]
pub struct Z180State {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub a_prime: u8,
    pub f_prime: u8,
    pub b_prime: u8,
    pub c_prime: u8,
    pub d_prime: u8,
    pub e_prime: u8,
    pub h_prime: u8,
    pub l_prime: u8,
    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,
    pub im: IntMode,
    pub iff1: bool,
    pub iff2: bool,
    pub memptr: u16,
    pub last_q: bool,
    pub pending_ei: bool,
    pub int_line: bool, // external /INT0
    pub int_lines: u16, // internal/vectored source bitmap
    pub nmi_pending: bool,
    pub halted: bool,
}
