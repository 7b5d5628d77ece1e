use ferrite_core::cpu::I8085;

mod common;
use common::TestBus;

const CARRY: u8 = 0x01;
const V: u8 = 0x02;
const K: u8 = 0x20;
const ZERO: u8 = 0x40;

#[test]
fn shares_the_8080_core_model() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x3e, 0x42, 0x21, 0x00, 0x40, 0x77]); // MVI A; LXI H; MOV M,A
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert_eq!(bus.memory[0x4000], 0x42);
}

#[test]
fn alu_results_never_set_psw_bit3() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_af(0xff00);
    bus.load(0, &[0xc6, 0x09]); // ADI 0x09 -> result 0x08
    cpu.execute(&mut bus);
    assert_eq!(cpu.af() >> 8, 0x08);
    assert_eq!(cpu.flags() & 0x08, 0);
}

#[test]
fn dsub_subtracts_bc_from_hl() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x1234);
    cpu.set_bc(0x1234);
    bus.load(0, &[0x08]);
    assert_eq!(cpu.execute(&mut bus), 10);
    assert_eq!(cpu.hl(), 0x0000);
    assert_ne!(cpu.flags() & ZERO, 0);
    assert_eq!(cpu.flags() & CARRY, 0);
}

#[test]
fn dsub_borrow() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x0000);
    cpu.set_bc(0x0001);
    bus.load(0, &[0x08]);
    cpu.execute(&mut bus);
    assert_eq!(cpu.hl(), 0xffff);
    assert_ne!(cpu.flags() & CARRY, 0);
}

#[test]
fn arhl_arithmetic_shift() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x8003);
    bus.load(0, &[0x10]);
    assert_eq!(cpu.execute(&mut bus), 7);
    assert_eq!(cpu.hl(), 0xc001);
    assert_ne!(cpu.flags() & CARRY, 0);
}

#[test]
fn rdel_rotates_de_through_carry() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_de(0x8001);
    cpu.set_flags(0x00);
    bus.load(0, &[0x18]);
    assert_eq!(cpu.execute(&mut bus), 10);
    assert_eq!(cpu.de(), 0x0002);
    assert_ne!(cpu.flags() & CARRY, 0);
    assert_ne!(cpu.flags() & V, 0); // sign changed
}

#[test]
fn ldhi_ldsi() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x1000);
    cpu.set_sp(0x2000);
    bus.load(0, &[0x28, 0x30, 0x38, 0xf0]); // LDHI 0x30; LDSI 0xf0
    assert_eq!(cpu.execute(&mut bus), 10);
    assert_eq!(cpu.de(), 0x1030);
    cpu.execute(&mut bus);
    assert_eq!(cpu.de(), 0x20f0);
}

#[test]
fn shlx_lhlx_indirect_through_de() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x1234);
    cpu.set_de(0x4000);
    bus.load(0, &[0xd9, 0x21, 0x00, 0x00, 0xed]); // SHLX; LXI H,0; LHLX
    cpu.execute(&mut bus);
    assert_eq!(bus.memory[0x4000], 0x34);
    assert_eq!(bus.memory[0x4001], 0x12);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert_eq!(cpu.hl(), 0x1234);
}

#[test]
fn dcx_sets_k_on_wrap() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0000);
    bus.load(0, &[0x0b]); // DCX B
    cpu.execute(&mut bus);
    assert_eq!(cpu.bc(), 0xffff);
    assert_ne!(cpu.flags() & K, 0);
}

#[test]
fn jk_jnk_branch_on_k() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0000);
    // DCX B sets K; JK taken; at target JNK not taken
    bus.load(0, &[0x0b, 0xfd, 0x00, 0x50]);
    bus.load(0x5000, &[0xdd, 0x00, 0x60]);
    cpu.execute(&mut bus);
    assert_eq!(cpu.execute(&mut bus), 10);
    assert_eq!(cpu.pc(), 0x5000);
    assert_eq!(cpu.execute(&mut bus), 7);
    assert_eq!(cpu.pc(), 0x5003);
}

#[test]
fn rstv_fires_only_on_overflow() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_sp(0xfff0);
    cpu.set_af(0x7f00);
    bus.load(0, &[0x3c, 0xcb]); // INR A -> V; RSTV
    cpu.execute(&mut bus);
    assert_ne!(cpu.flags() & V, 0);
    cpu.execute(&mut bus);
    assert_eq!(cpu.pc(), 0x0040);
    assert_eq!(bus.memory[0xffee], 0x02);

    let mut cpu = I8085::new();
    cpu.set_sp(0xfff0);
    cpu.set_af(0x1000);
    bus.load(0x100, &[0x3c, 0xcb]);
    cpu.set_pc(0x100);
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert_eq!(cpu.pc(), 0x102); // falls through
}

#[test]
fn inr_overflow_and_dcr_underflow_set_v() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x7f00);
    bus.load(0, &[0x04, 0x05, 0x05]); // INR B; DCR B; DCR B
    cpu.execute(&mut bus);
    assert_ne!(cpu.flags() & V, 0);
    cpu.execute(&mut bus);
    assert_ne!(cpu.flags() & V, 0); // 0x80 -> 0x7f underflows
    cpu.execute(&mut bus);
    assert_eq!(cpu.flags() & V, 0);
}
