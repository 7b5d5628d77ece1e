use ferrite_core::cpu::{CpuState, Z80};

mod common;
use common::TestBus;

fn flags(cpu: &Z80) -> u16 {
    cpu.af() & 0xff
}

#[test]
fn in_r_c_sets_flags() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_af(0x0001); // carry must survive
    cpu.set_bc(0x1280);
    bus.io_in[0x80] = 0x00;
    bus.load(0, &[0xed, 0x50]); // IN D,(C)
    assert_eq!(cpu.execute(&mut bus), 12);
    assert_eq!(cpu.de() >> 8, 0x00);
    assert_ne!(flags(&cpu) & 0x40, 0); // Z
    assert_ne!(flags(&cpu) & 0x01, 0); // carry preserved
}

#[test]
fn in_c_flags_only() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0010);
    bus.io_in[0x10] = 0x80;
    bus.load(0, &[0xed, 0x70]);
    cpu.execute(&mut bus);
    assert_ne!(flags(&cpu) & 0x80, 0); // S from the sampled byte
    assert_eq!(cpu.bc(), 0x0010); // nothing written back
}

#[test]
fn out_c_r() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x1234);
    bus.load(0, &[0xed, 0x41]); // OUT (C),B
    assert_eq!(cpu.execute(&mut bus), 12);
    assert_eq!(bus.io_out, vec![(0x1234, 0x12)]);
}

#[test]
fn out_c_zero_undocumented() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0042);
    bus.load(0, &[0xed, 0x71]);
    cpu.execute(&mut bus);
    assert_eq!(bus.io_out, vec![(0x0042, 0x00)]);
}

#[test]
fn sbc_hl_de() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_af(0x0001);
    cpu.set_hl(0x1000);
    cpu.set_de(0x0fff);
    bus.load(0, &[0xed, 0x52]);
    assert_eq!(cpu.execute(&mut bus), 15);
    assert_eq!(cpu.hl(), 0x0000);
    assert_ne!(flags(&cpu) & 0x40, 0);
    assert_ne!(flags(&cpu) & 0x02, 0); // N
}

#[test]
fn adc_hl_bc_overflow() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_af(0x0000);
    cpu.set_hl(0x7fff);
    cpu.set_bc(0x0001);
    bus.load(0, &[0xed, 0x4a]);
    cpu.execute(&mut bus);
    assert_eq!(cpu.hl(), 0x8000);
    assert_ne!(flags(&cpu) & 0x04, 0); // P/V overflow
    assert_ne!(flags(&cpu) & 0x80, 0);
}

#[test]
fn ld_nn_de_and_back() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_de(0x1234);
    bus.load(0, &[0xed, 0x53, 0x00, 0x40, 0xed, 0x4b, 0x00, 0x40]);
    assert_eq!(cpu.execute(&mut bus), 20);
    assert_eq!(bus.memory[0x4000], 0x34);
    assert_eq!(bus.memory[0x4001], 0x12);
    assert_eq!(cpu.execute(&mut bus), 20); // LD BC,(0x4000)
    assert_eq!(cpu.bc(), 0x1234);
}

#[test]
fn neg() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_af(0x0100);
    bus.load(0, &[0xed, 0x44]);
    assert_eq!(cpu.execute(&mut bus), 8);
    assert_eq!(cpu.af() >> 8, 0xff);
    assert_ne!(flags(&cpu) & 0x01, 0);
    assert_ne!(flags(&cpu) & 0x02, 0);
}

#[test]
fn rrd_rld_nibble_shuffle() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_af(0x1200);
    cpu.set_hl(0x4000);
    bus.memory[0x4000] = 0x34;
    bus.load(0, &[0xed, 0x67, 0xed, 0x6f]);
    assert_eq!(cpu.execute(&mut bus), 18); // RRD
    assert_eq!(cpu.af() >> 8, 0x14);
    assert_eq!(bus.memory[0x4000], 0x23);
    assert_eq!(cpu.execute(&mut bus), 18); // RLD undoes it
    assert_eq!(cpu.af() >> 8, 0x12);
    assert_eq!(bus.memory[0x4000], 0x34);
}

#[test]
fn ld_a_i_copies_iff2_to_pv() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_reg_i(0x80);
    bus.load(0, &[0xed, 0x57]); // IFF2 clear after reset
    assert_eq!(cpu.execute(&mut bus), 9);
    assert_eq!(cpu.af() >> 8, 0x80);
    assert_eq!(flags(&cpu) & 0x04, 0);

    let mut cpu = Z80::new();
    cpu.set_reg_i(0x01);
    bus.load(0x100, &[0xfb, 0x00, 0xed, 0x57]); // EI; NOP; LD A,I
    cpu.set_pc(0x100);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert_ne!(flags(&cpu) & 0x04, 0);
}

#[test]
fn ld_i_a_and_r_a() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_af(0x5500);
    bus.load(0, &[0xed, 0x47, 0xed, 0x4f]);
    assert_eq!(cpu.execute(&mut bus), 9);
    assert_eq!(cpu.reg_i(), 0x55);
    cpu.execute(&mut bus);
    assert_eq!(cpu.reg_r(), 0x55);
}

#[test]
fn reti_notifies_bus() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_sp(0xfff0);
    bus.load(0xfff0, &[0x34, 0x12]);
    bus.load(0, &[0xed, 0x4d]);
    assert_eq!(cpu.execute(&mut bus), 14);
    assert_eq!(cpu.pc(), 0x1234);
    assert_eq!(bus.reti_ops, vec![0x4d]);
}

#[test]
fn retn_restores_iff1_from_iff2() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    let mut state = cpu.snapshot();
    state.iff1 = false;
    state.iff2 = true;
    state.sp = 0xfff0;
    cpu.restore(&state);
    bus.load(0xfff0, &[0x00, 0x10]);
    bus.load(0, &[0xed, 0x45]);
    assert_eq!(cpu.execute(&mut bus), 14);
    assert_eq!(cpu.pc(), 0x1000);
    assert!(cpu.is_iff1());
}

#[test]
fn im_select() {
    use ferrite_core::core::IntMode;
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xed, 0x5e, 0xed, 0x56, 0xed, 0x46]);
    assert_eq!(cpu.execute(&mut bus), 8);
    assert_eq!(cpu.im(), IntMode::Mode2);
    cpu.execute(&mut bus);
    assert_eq!(cpu.im(), IntMode::Mode1);
    cpu.execute(&mut bus);
    assert_eq!(cpu.im(), IntMode::Mode0);
}
