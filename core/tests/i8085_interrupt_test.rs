use ferrite_core::cpu::I8085;

mod common;
use common::TestBus;

#[test]
fn trap_preempts_everything() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_sp(0xfff0);
    bus.load(0x100, &[0xfb, 0x00]); // EI; NOP
    cpu.set_pc(0x100);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    cpu.set_trap_line(true);
    cpu.set_rst7_5_line(true);
    // Service jumps to 0x24 and runs the handler's first instruction
    cpu.execute(&mut bus);
    assert_eq!(cpu.pc(), 0x0025);
    assert!(!cpu.is_ie());
    assert_eq!(bus.memory[0xffee], 0x02);
    assert_eq!(bus.memory[0xffef], 0x01);
}

#[test]
fn trap_needs_no_interrupt_enable() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_sp(0xfff0);
    cpu.set_trap_line(true);
    cpu.execute(&mut bus);
    assert_eq!(cpu.pc(), 0x0025);
}

#[test]
fn trap_is_edge_triggered() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_sp(0xfff0);
    cpu.set_trap_line(true);
    cpu.execute(&mut bus);
    // Level still high: no second service
    cpu.set_trap_line(true);
    cpu.execute(&mut bus);
    assert_eq!(cpu.pc(), 0x0026);
    // Drop and raise again: new edge
    cpu.set_trap_line(false);
    cpu.set_trap_line(true);
    cpu.execute(&mut bus);
    assert_eq!(cpu.pc(), 0x0025);
}

#[test]
fn rst_priority_is_descending() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_sp(0xfff0);
    bus.load(0x100, &[0xfb, 0x00, 0xfb, 0x00]);
    cpu.set_pc(0x100);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    cpu.set_rst6_5_line(true);
    cpu.set_rst5_5_line(true);
    cpu.execute(&mut bus);
    assert_eq!(cpu.pc(), 0x0035); // 6.5 wins
    assert!(!cpu.is_ie());
    cpu.set_rst6_5_line(false);

    // 5.5 is level-held and still waiting once re-enabled
    bus.load(0x0035, &[0xfb, 0x00]);
    cpu.set_pc(0x0035);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert_eq!(cpu.pc(), 0x002d);
}

#[test]
fn sim_clears_the_rst7_5_latch() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_rst7_5_line(true);
    assert!(cpu.rst7_5_line());
    bus.load(0, &[0x3e, 0x10, 0x30, 0xfb, 0x00, 0x00]); // MVI A,0x10; SIM; EI; NOP
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert!(!cpu.rst7_5_line());
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert_eq!(cpu.pc(), 6); // never serviced
}

#[test]
fn rim_reports_masks_pending_and_sid() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_sid_line(true);
    cpu.set_rst5_5_line(true);
    // MVI A,0x0b: mask-set enable + M6.5 + M5.5; SIM; RIM
    bus.load(0, &[0x3e, 0x0b, 0x30, 0x20]);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert_eq!(cpu.interrupt_mask() & 0x07, 0x03);
    cpu.execute(&mut bus);
    assert_eq!(cpu.af() >> 8, 0x93); // SID | I5.5 | M6.5 | M5.5
}

#[test]
fn rim_reflects_ie() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xfb, 0x00, 0x20]); // EI; NOP; RIM
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert_ne!((cpu.af() >> 8) & 0x08, 0);
}

#[test]
fn intr_acknowledge_byte() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_sp(0xfff0);
    bus.int_ack_byte = 0xef; // RST 5
    bus.load(0x100, &[0xfb, 0x00]);
    cpu.set_pc(0x100);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    cpu.set_int_line(true);
    let t = cpu.execute(&mut bus);
    assert!(t < 0);
    assert_eq!(cpu.pc(), 0x0028);
    assert!(!cpu.is_ie());
}

#[test]
fn ei_shadow_delays_rst_lines_too() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_sp(0xfff0);
    cpu.set_rst6_5_line(true);
    bus.load(0, &[0xfb, 0x00]);
    cpu.execute(&mut bus); // EI
    assert!(cpu.is_pending_ei());
    cpu.execute(&mut bus); // NOP still runs
    assert_eq!(cpu.pc(), 2);
    cpu.execute(&mut bus);
    assert_eq!(cpu.pc(), 0x0035);
}

#[test]
fn rst_line_resumes_halt() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_sp(0xfff0);
    bus.load(0x100, &[0xfb, 0x76]); // EI; HLT
    cpu.set_pc(0x100);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert!(cpu.is_halted());
    cpu.set_rst7_5_line(true);
    cpu.execute(&mut bus);
    assert!(!cpu.is_halted());
    // Return address skips the HLT byte
    assert_eq!(bus.memory[0xffee], 0x02);
}
