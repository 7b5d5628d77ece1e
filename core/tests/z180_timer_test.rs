use ferrite_core::cpu::Z180;
use ferrite_core::cpu::z180::ServiceKind;

mod common;
use common::PhysBus;

const FAST: &[u8] = &[0xaf, 0xed, 0x39, 0x32, 0xed, 0x39, 0x36];

fn out0(code: &mut Vec<u8>, port: u8, val: u8) {
    code.extend_from_slice(&[0x3e, val, 0xed, 0x39, port]);
}

/// PRT0 loaded with a count of 2, reload 2, TIE0 + TDE0, vectored
/// through I = 0x90. Returns the setup instruction count.
fn timer_program(code: &mut Vec<u8>) -> usize {
    out0(code, 0x0c, 0x02); // TMDR0 low
    out0(code, 0x0d, 0x00); // TMDR0 high
    out0(code, 0x0e, 0x02); // RLDR0 low
    out0(code, 0x0f, 0x00); // RLDR0 high
    out0(code, 0x10, 0x11); // TCR: TIE0 | TDE0
    code.extend_from_slice(&[0x3e, 0x90, 0xed, 0x47, 0xfb]); // I = 0x90; EI
    13
}

#[test]
fn prt0_terminal_count_raises_its_vector() {
    let mut cpu = Z180::new();
    let mut bus = PhysBus::new();
    let mut code = FAST.to_vec();
    let instrs = 3 + timer_program(&mut code);
    bus.load(0, &code);
    bus.load(0x9004, &[0x00, 0x80]); // PRT0 is vector slot 2
    cpu.set_sp(0xfff0);
    for _ in 0..instrs {
        cpu.execute(&mut bus);
    }
    // NOP slide until the down-counter hits zero
    let mut serviced = false;
    for _ in 0..200 {
        if cpu.execute(&mut bus) < 0 {
            serviced = true;
            break;
        }
    }
    assert!(serviced);
    assert_eq!(cpu.last_service(), ServiceKind::Internal(2));
    assert_eq!(cpu.pc(), 0x8000);
    assert!(!cpu.is_iff1());
}

#[test]
fn tcr_read_acknowledges_the_timer() {
    let mut cpu = Z180::new();
    let mut bus = PhysBus::new();
    let mut code = FAST.to_vec();
    let instrs = 3 + timer_program(&mut code);
    bus.load(0, &code);
    bus.load(0x9004, &[0x00, 0x80]);
    // Handler reads TCR twice
    bus.load(0x8000, &[0xed, 0x38, 0x10, 0xed, 0x38, 0x10]);
    cpu.set_sp(0xfff0);
    for _ in 0..instrs {
        cpu.execute(&mut bus);
    }
    for _ in 0..200 {
        if cpu.execute(&mut bus) < 0 {
            break;
        }
    }
    assert_eq!(cpu.pc(), 0x8000);
    cpu.execute(&mut bus);
    assert_eq!(cpu.af() >> 8, 0x51); // TIF0 over the programmed bits
    cpu.execute(&mut bus);
    assert_eq!(cpu.af() >> 8, 0x11); // cleared by the first read
}

#[test]
fn disabled_timer_never_fires() {
    let mut cpu = Z180::new();
    let mut bus = PhysBus::new();
    let mut code = FAST.to_vec();
    out0(&mut code, 0x0c, 0x02);
    out0(&mut code, 0x0d, 0x00);
    out0(&mut code, 0x10, 0x10); // TIE0 without TDE0: no counting
    code.extend_from_slice(&[0x3e, 0x90, 0xed, 0x47, 0xfb]);
    bus.load(0, &code);
    cpu.set_sp(0xfff0);
    for _ in 0..100 {
        assert!(cpu.execute(&mut bus) > 0);
    }
}

#[test]
fn frc_counts_down_as_time_passes() {
    let mut cpu = Z180::new();
    let mut bus = PhysBus::new();
    let mut code = FAST.to_vec();
    code.extend_from_slice(&[0xed, 0x38, 0x18, 0x47]); // IN0 A,(FRC); LD B,A
    code.extend_from_slice(&[0x00; 14]);
    code.extend_from_slice(&[0xed, 0x38, 0x18]); // IN0 A,(FRC)
    bus.load(0, &code);
    for _ in 0..3 + 2 + 14 + 1 {
        cpu.execute(&mut bus);
    }
    let first = (cpu.bc() >> 8) as u8;
    let second = (cpu.af() >> 8) as u8;
    let elapsed = first.wrapping_sub(second);
    assert!(elapsed >= 1 && elapsed <= 10, "elapsed {elapsed}");
}
