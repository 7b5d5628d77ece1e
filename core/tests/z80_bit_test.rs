use ferrite_core::cpu::Z80;

mod common;
use common::TestBus;

fn flags(cpu: &Z80) -> u16 {
    cpu.af() & 0xff
}

#[test]
fn bit_on_register() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x8000);
    bus.load(0, &[0xcb, 0x78, 0xcb, 0x70]); // BIT 7,B; BIT 6,B
    assert_eq!(cpu.execute(&mut bus), 8);
    assert_eq!(flags(&cpu) & 0x40, 0); // Z clear
    assert_ne!(flags(&cpu) & 0x80, 0); // S mirrors bit 7
    cpu.execute(&mut bus);
    assert_ne!(flags(&cpu) & 0x40, 0);
    assert_ne!(flags(&cpu) & 0x04, 0); // P/V tracks Z
}

#[test]
fn bit_hl_leaks_memptr_high() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    bus.memory[0x4000] = 0xff;
    // LD A,(0x27ff) leaves WZ = 0x2800, whose high byte feeds bits 5/3
    bus.load(0, &[0x3a, 0xff, 0x27, 0xcb, 0x66]);
    cpu.execute(&mut bus);
    assert_eq!(cpu.execute(&mut bus), 12); // BIT 4,(HL)
    assert_eq!(flags(&cpu) & 0x28, 0x28);
    assert_eq!(flags(&cpu) & 0x40, 0);
}

#[test]
fn set_res_register() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0000);
    bus.load(0, &[0xcb, 0xf8, 0xcb, 0xb8]); // SET 7,B; RES 7,B
    assert_eq!(cpu.execute(&mut bus), 8);
    assert_eq!(cpu.bc() >> 8, 0x80);
    cpu.execute(&mut bus);
    assert_eq!(cpu.bc() >> 8, 0x00);
}

#[test]
fn set_res_memory() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    bus.load(0, &[0xcb, 0xc6, 0xcb, 0x86]); // SET 0,(HL); RES 0,(HL)
    assert_eq!(cpu.execute(&mut bus), 15);
    assert_eq!(bus.memory[0x4000], 0x01);
    assert_eq!(cpu.execute(&mut bus), 15);
    assert_eq!(bus.memory[0x4000], 0x00);
}

#[test]
fn rlc_register() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x8100);
    bus.load(0, &[0xcb, 0x00]);
    assert_eq!(cpu.execute(&mut bus), 8);
    assert_eq!(cpu.bc() >> 8, 0x03);
    assert_ne!(flags(&cpu) & 0x01, 0);
}

#[test]
fn sll_shifts_in_one() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x8000);
    bus.load(0, &[0xcb, 0x30]); // SLL B (undocumented)
    cpu.execute(&mut bus);
    assert_eq!(cpu.bc() >> 8, 0x01);
    assert_ne!(flags(&cpu) & 0x01, 0);
}

#[test]
fn sra_keeps_sign() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x8100);
    bus.load(0, &[0xcb, 0x28]); // SRA B
    cpu.execute(&mut bus);
    assert_eq!(cpu.bc() >> 8, 0xc0);
    assert_ne!(flags(&cpu) & 0x01, 0);
}

#[test]
fn srl_clears_sign() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x8100);
    bus.load(0, &[0xcb, 0x38]); // SRL B
    cpu.execute(&mut bus);
    assert_eq!(cpu.bc() >> 8, 0x40);
    assert_ne!(flags(&cpu) & 0x01, 0);
}

#[test]
fn rlca_preserves_szp() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_af(0x81c4); // S, Z, P pre-set
    bus.load(0, &[0x07]);
    assert_eq!(cpu.execute(&mut bus), 4);
    assert_eq!(cpu.af() >> 8, 0x03);
    assert_ne!(flags(&cpu) & 0x01, 0);
    assert_eq!(flags(&cpu) & 0xc4, 0xc4);
}

#[test]
fn rra_through_carry() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_af(0x0201); // carry in
    bus.load(0, &[0x1f]);
    cpu.execute(&mut bus);
    assert_eq!(cpu.af() >> 8, 0x81);
    assert_eq!(flags(&cpu) & 0x01, 0);
}

#[test]
fn rotate_memory() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    bus.memory[0x4000] = 0x01;
    bus.load(0, &[0xcb, 0x06]); // RLC (HL)
    assert_eq!(cpu.execute(&mut bus), 15);
    assert_eq!(bus.memory[0x4000], 0x02);
}

#[test]
fn ddcb_set_copies_to_register() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_ix(0x4000);
    cpu.set_bc(0x0000);
    bus.memory[0x4001] = 0x40;
    // SET 0,(IX+1) with the result also landing in B
    bus.load(0, &[0xdd, 0xcb, 0x01, 0xc0]);
    assert_eq!(cpu.execute(&mut bus), 23);
    assert_eq!(bus.memory[0x4001], 0x41);
    assert_eq!(cpu.bc() >> 8, 0x41);
}

#[test]
fn ddcb_bit_uses_effective_address_bits() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_ix(0x2800);
    bus.memory[0x2810] = 0xff;
    bus.load(0, &[0xdd, 0xcb, 0x10, 0x66]); // BIT 4,(IX+0x10) at 0x2810
    assert_eq!(cpu.execute(&mut bus), 20);
    assert_eq!(flags(&cpu) & 0x28, 0x28); // bits 5/3 from addr high 0x28
}
