use ferrite_core::cpu::Z180;

mod common;
use common::PhysBus;

/// Zero out DCNTL (memory/I/O wait states) and RCR (refresh) so tick
/// assertions see the raw machine-cycle counts.
const FAST: &[u8] = &[0xaf, 0xed, 0x39, 0x32, 0xed, 0x39, 0x36];

fn warm_up(cpu: &mut Z180, bus: &mut PhysBus) -> u16 {
    bus.load(0, FAST);
    for _ in 0..3 {
        cpu.execute(bus);
    }
    FAST.len() as u16
}

#[test]
fn cold_reset_state() {
    let cpu = Z180::new();
    assert_eq!(cpu.pc(), 0);
    assert_eq!(cpu.sp(), 0xffff);
    assert_eq!(cpu.af(), 0xffff);
    assert!(!cpu.is_iff1());
    // CBAR resets to 0xff: the whole address space is common area 0
    assert_eq!(cpu.phy_addr(0x1234), 0x1234);
    assert_eq!(cpu.phy_addr(0xf800), 0xf800);
}

#[test]
fn opcode_fetch_is_three_clocks() {
    let mut cpu = Z180::new();
    let mut bus = PhysBus::new();
    let pc = warm_up(&mut cpu, &mut bus);
    bus.load(pc as u32, &[0x00, 0x3e, 0x42]); // NOP; LD A,n
    assert_eq!(cpu.execute(&mut bus), 3);
    assert_eq!(cpu.execute(&mut bus), 6);
    assert_eq!(cpu.af() >> 8, 0x42);
}

#[test]
fn reset_wait_states_and_refresh_apply_until_reprogrammed() {
    let mut cpu = Z180::new();
    let mut bus = PhysBus::new();
    // First fetch pays the refresh cycle (2) plus one programmed
    // memory wait state per access; the second one fits inside the
    // refresh interval.
    assert_eq!(cpu.execute(&mut bus), 8); // NOP at reset defaults
    assert_eq!(cpu.execute(&mut bus), 6);
}

#[test]
fn tick_profile() {
    let mut cpu = Z180::new();
    let mut bus = PhysBus::new();
    let pc = warm_up(&mut cpu, &mut bus);
    cpu.set_sp(0xfff0);
    bus.load(pc as u32, &[0xc3, 0x00, 0x02]); // JP 0x200
    bus.load(0x200, &[0x18, 0x02]); // JR +2
    bus.load(0x204, &[0x06, 0x02, 0x10, 0xfe, 0xcd, 0x00, 0x03]);
    bus.load(0x300, &[0xc5, 0xc1, 0xc9]);
    bus.load(0x20b, &[0x09, 0x03, 0xaf, 0xd3, 0x60, 0xdb, 0x60]);

    assert_eq!(cpu.execute(&mut bus), 9); // JP
    assert_eq!(cpu.execute(&mut bus), 8); // JR
    assert_eq!(cpu.execute(&mut bus), 6); // LD B,2
    assert_eq!(cpu.execute(&mut bus), 9); // DJNZ taken
    assert_eq!(cpu.execute(&mut bus), 7); // DJNZ falls through
    assert_eq!(cpu.execute(&mut bus), 16); // CALL
    assert_eq!(cpu.execute(&mut bus), 11); // PUSH BC
    assert_eq!(cpu.execute(&mut bus), 9); // POP BC
    assert_eq!(cpu.execute(&mut bus), 9); // RET
    assert_eq!(cpu.pc(), 0x20b);
    assert_eq!(cpu.execute(&mut bus), 7); // ADD HL,BC
    assert_eq!(cpu.execute(&mut bus), 4); // INC BC
    assert_eq!(cpu.execute(&mut bus), 3); // XOR A
    assert_eq!(cpu.execute(&mut bus), 10); // OUT (n),A
    assert_eq!(cpu.execute(&mut bus), 10); // IN A,(n)
}

#[test]
fn halt_holds_pc() {
    let mut cpu = Z180::new();
    let mut bus = PhysBus::new();
    let pc = warm_up(&mut cpu, &mut bus);
    bus.load(pc as u32, &[0x76]);
    cpu.execute(&mut bus);
    assert!(cpu.is_halted());
    cpu.execute(&mut bus);
    assert_eq!(cpu.pc(), pc);
}

#[test]
fn slp_halts_and_resumes_past_the_instruction() {
    let mut cpu = Z180::new();
    let mut bus = PhysBus::new();
    let pc = warm_up(&mut cpu, &mut bus);
    cpu.set_sp(0xfff0);
    bus.load(pc as u32, &[0xed, 0x76]); // SLP
    assert_eq!(cpu.execute(&mut bus), 8);
    assert!(cpu.is_halted());
    cpu.execute(&mut bus);
    assert!(cpu.is_halted());
    cpu.trigger_nmi();
    let t = cpu.execute(&mut bus);
    assert!(t < 0);
    assert!(!cpu.is_halted());
    assert_eq!(cpu.pc(), 0x0066);
    // Pushed resume address points past the two-byte SLP
    assert_eq!(bus.memory[0xffee], (pc + 2) as u8);
    assert_eq!(bus.memory[0xffef], 0x00);
}

#[test]
fn r_counts_m1_cycles_including_prefixes() {
    let mut cpu = Z180::new();
    let mut bus = PhysBus::new();
    bus.load(0, &[0x00, 0xed, 0x39, 0x32]); // NOP; OUT0 (n),A
    let r0 = cpu.reg_r();
    cpu.execute(&mut bus);
    assert_eq!(cpu.reg_r(), r0 + 1);
    cpu.execute(&mut bus);
    assert_eq!(cpu.reg_r(), r0 + 3); // prefix bumps R too
}

#[test]
fn warm_reset_preserves_registers_but_reinitializes_the_chip() {
    let mut cpu = Z180::new();
    let mut bus = PhysBus::new();
    warm_up(&mut cpu, &mut bus);
    cpu.set_sp(0x1234);
    cpu.set_bc(0xbeef);
    cpu.set_pin_reset();
    cpu.reset();
    assert_eq!(cpu.sp(), 0x1234);
    assert_eq!(cpu.bc(), 0xbeef);
    assert_eq!(cpu.pc(), 0);
    assert!(!cpu.is_iff1());
    // Wait states are back at the reset defaults
    assert_eq!(cpu.execute(&mut bus), 8);
}
