use ferrite_core::cpu::I8080;

mod common;
use common::TestBus;

#[test]
fn intr_executes_acknowledge_byte() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.set_sp(0xfff0);
    bus.int_ack_byte = 0xff; // RST 7
    bus.load(0x100, &[0xfb, 0x00]); // EI; NOP
    cpu.set_pc(0x100);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert!(cpu.is_ie());
    cpu.set_int_line(true);
    let t = cpu.execute(&mut bus);
    assert!(t < 0);
    assert_eq!(cpu.pc(), 0x0038);
    assert!(!cpu.is_ie());
    assert_eq!(bus.memory[0xffee], 0x02);
    assert_eq!(bus.memory[0xffef], 0x01);
}

#[test]
fn intr_ignored_while_disabled() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.set_int_line(true);
    assert_eq!(cpu.execute(&mut bus), 4);
    assert_eq!(cpu.pc(), 1);
}

#[test]
fn ei_delay_spans_one_instruction() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.set_sp(0xfff0);
    bus.int_ack_byte = 0xff;
    bus.load(0, &[0xfb, 0x00, 0x00]); // EI; NOP; NOP
    cpu.set_int_line(true);
    cpu.execute(&mut bus); // EI
    assert!(cpu.is_pending_ei());
    assert_eq!(cpu.execute(&mut bus), 4); // shielded instruction
    assert!(cpu.execute(&mut bus) < 0);
    assert_eq!(cpu.pc(), 0x0038);
}

#[test]
fn intr_resumes_halt() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    cpu.set_sp(0xfff0);
    bus.int_ack_byte = 0xf7; // RST 6
    bus.load(0x100, &[0xfb, 0x76]); // EI; HLT
    cpu.set_pc(0x100);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert!(cpu.is_halted());
    cpu.set_int_line(true);
    cpu.execute(&mut bus);
    assert!(!cpu.is_halted());
    assert_eq!(cpu.pc(), 0x0030);
    // Return address points past the HLT
    assert_eq!(bus.memory[0xffee], 0x02);
}

#[test]
fn di_masks_again() {
    let mut cpu = I8080::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xfb, 0x00, 0xf3, 0x00]);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert!(cpu.is_ie());
    cpu.execute(&mut bus); // DI
    assert!(!cpu.is_ie());
    cpu.set_int_line(true);
    assert_eq!(cpu.execute(&mut bus), 4);
}
