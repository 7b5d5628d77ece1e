use std::io::Read;
use std::path::Path;

use ferrite_core::core::IntMode;
use ferrite_core::cpu::CpuState;
use ferrite_core::cpu::state::Z80State;
use ferrite_core::cpu::z80::Z80;
use ferrite_cpu_validation::{TracingBus, Z80CpuState, Z80TestCase};

fn int_mode(im: u8) -> IntMode {
    match im {
        1 => IntMode::Mode1,
        2 => IntMode::Mode2,
        _ => IntMode::Mode0,
    }
}

fn to_snapshot(s: &Z80CpuState) -> Z80State {
    Z80State {
        a: s.a,
        f: s.f,
        b: s.b,
        c: s.c,
        d: s.d,
        e: s.e,
        h: s.h,
        l: s.l,
        a_prime: (s.af_prime >> 8) as u8,
        f_prime: s.af_prime as u8,
        b_prime: (s.bc_prime >> 8) as u8,
        c_prime: s.bc_prime as u8,
        d_prime: (s.de_prime >> 8) as u8,
        e_prime: s.de_prime as u8,
        h_prime: (s.hl_prime >> 8) as u8,
        l_prime: s.hl_prime as u8,
        ix: s.ix,
        iy: s.iy,
        sp: s.sp,
        pc: s.pc,
        i: s.i,
        r: s.r,
        im: int_mode(s.im),
        iff1: s.iff1 != 0,
        iff2: s.iff2 != 0,
        memptr: s.wz,
        last_q: s.q != 0,
        pending_ei: s.ei != 0,
        int_line: false,
        nmi_pending: false,
        halted: false,
    }
}

fn run_test_case(tc: &Z80TestCase) -> Option<String> {
    let mut cpu = Z80::new();
    let mut bus = TracingBus::new();

    cpu.restore(&to_snapshot(&tc.initial));

    for &(addr, val) in &tc.initial.ram {
        bus.memory[addr as usize] = val;
    }
    for &(port, data, ref dir) in &tc.ports {
        let d = dir.chars().next().unwrap_or('r');
        bus.port_queue.push((port, data, d));
    }

    let ticks = cpu.execute(&mut bus);

    let got = cpu.snapshot();
    let fs = &tc.final_state;

    macro_rules! check {
        ($got:expr, $exp:expr, $name:expr) => {
            if $got != $exp {
                return Some(format!(
                    "{}: {} (got 0x{:X} exp 0x{:X})",
                    tc.name, $name, $got as u64, $exp as u64
                ));
            }
        };
    }

    check!(got.a, fs.a, "A");
    check!(got.f, fs.f, "F");
    check!(got.b, fs.b, "B");
    check!(got.c, fs.c, "C");
    check!(got.d, fs.d, "D");
    check!(got.e, fs.e, "E");
    check!(got.h, fs.h, "H");
    check!(got.l, fs.l, "L");
    check!(got.i, fs.i, "I");
    check!(got.r, fs.r, "R");
    check!(got.ix, fs.ix, "IX");
    check!(got.iy, fs.iy, "IY");
    check!(got.sp, fs.sp, "SP");
    check!(got.pc, fs.pc, "PC");
    check!(got.memptr, fs.wz, "WZ");
    check!(got.iff1 as u8, (fs.iff1 != 0) as u8, "IFF1");
    check!(got.iff2 as u8, (fs.iff2 != 0) as u8, "IFF2");
    check!(got.im as u8, int_mode(fs.im) as u8, "IM");
    check!(got.pending_ei as u8, (fs.ei != 0) as u8, "EI");
    check!(got.last_q as u8, (fs.q != 0) as u8, "Q");

    let af_prime = ((got.a_prime as u16) << 8) | got.f_prime as u16;
    let bc_prime = ((got.b_prime as u16) << 8) | got.c_prime as u16;
    let de_prime = ((got.d_prime as u16) << 8) | got.e_prime as u16;
    let hl_prime = ((got.h_prime as u16) << 8) | got.l_prime as u16;
    check!(af_prime, fs.af_prime, "AF'");
    check!(bc_prime, fs.bc_prime, "BC'");
    check!(de_prime, fs.de_prime, "DE'");
    check!(hl_prime, fs.hl_prime, "HL'");

    for &(addr, expected) in &fs.ram {
        if bus.memory[addr as usize] != expected {
            return Some(format!(
                "{}: RAM[0x{:04X}] (got 0x{:02X} exp 0x{:02X})",
                tc.name, addr, bus.memory[addr as usize], expected
            ));
        }
    }

    if ticks.unsigned_abs() as usize != tc.cycles.len() {
        return Some(format!(
            "{}: cycles (got {} exp {})",
            tc.name,
            ticks.unsigned_abs(),
            tc.cycles.len()
        ));
    }

    None
}

fn read_cases(path: &Path) -> Vec<Z80TestCase> {
    let raw = std::fs::read(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));
    let json = if path.extension().is_some_and(|ext| ext == "gz") {
        let mut s = String::new();
        flate2::read::GzDecoder::new(&raw[..])
            .read_to_string(&mut s)
            .unwrap_or_else(|e| panic!("Failed to decompress {path:?}: {e}"));
        s
    } else {
        String::from_utf8(raw).unwrap_or_else(|e| panic!("{path:?} is not UTF-8: {e}"))
    };
    serde_json::from_str(&json).unwrap_or_else(|e| panic!("Failed to parse {path:?}: {e}"))
}

#[test]
fn z80_single_step_vectors() {
    let test_dir = Path::new("test_data/z80/v1");
    if !test_dir.exists() {
        eprintln!("No Z80 single-step data under {}; skipping", test_dir.display());
        return;
    }

    let mut entries: Vec<_> = std::fs::read_dir(test_dir)
        .expect("Failed to read test directory")
        .filter_map(|e| e.ok())
        .filter(|e| {
            let p = e.path();
            p.extension()
                .is_some_and(|ext| ext == "json" || ext == "gz")
        })
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut total_tests = 0;
    let mut failed_tests = 0;
    let mut failed_files = std::collections::BTreeSet::new();
    let mut first_failures: Vec<String> = Vec::new();

    for entry in &entries {
        let filename = entry.file_name().to_string_lossy().into_owned();
        let tests = read_cases(&entry.path());
        assert!(!tests.is_empty(), "Test file {filename} is empty");

        for tc in &tests {
            if let Some(err) = run_test_case(tc) {
                failed_tests += 1;
                if failed_files.insert(filename.clone()) && first_failures.len() < 50 {
                    first_failures.push(err);
                }
            }
        }
        total_tests += tests.len();
    }

    eprintln!(
        "\nZ80 single-step vectors: {} passed, {} failed across {} files",
        total_tests - failed_tests,
        failed_tests,
        entries.len()
    );

    if !first_failures.is_empty() {
        eprintln!("\nFirst failure per file ({} files):", failed_files.len());
        for err in &first_failures {
            eprintln!("  {err}");
        }
    }

    assert_eq!(
        failed_tests, 0,
        "{} of {} vectors failed across {} files",
        failed_tests,
        total_tests,
        failed_files.len()
    );
}
