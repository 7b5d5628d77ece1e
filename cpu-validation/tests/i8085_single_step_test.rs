use std::io::Read;
use std::path::Path;

use ferrite_core::cpu::CpuState;
use ferrite_core::cpu::i8085::I8085;
use ferrite_core::cpu::state::I8085State;
use ferrite_cpu_validation::{I8085CpuState, I8085TestCase, TracingBus};

fn to_snapshot(s: &I8085CpuState) -> I8085State {
    I8085State {
        a: s.a,
        f: s.f,
        b: s.b,
        c: s.c,
        d: s.d,
        e: s.e,
        h: s.h,
        l: s.l,
        sp: s.sp,
        pc: s.pc,
        memptr: 0,
        im: s.im,
        ie: s.ie != 0,
        pending_ei: false,
        int_line: false,
        trap_pending: false,
        trap_level: false,
        halted: false,
    }
}

fn run_test_case(tc: &I8085TestCase) -> Option<String> {
    let mut cpu = I8085::new();
    let mut bus = TracingBus::new();

    cpu.restore(&to_snapshot(&tc.initial));
    for &(addr, val) in &tc.initial.ram {
        bus.memory[addr as usize] = val;
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
    check!(got.sp, fs.sp, "SP");
    check!(got.pc, fs.pc, "PC");
    check!(got.im, fs.im, "IM");
    check!(got.ie as u8, fs.ie, "IE");

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

fn read_cases(path: &Path) -> Vec<I8085TestCase> {
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
fn i8085_single_step_vectors() {
    let test_dir = Path::new("test_data/i8085");
    if !test_dir.exists() {
        eprintln!(
            "No 8085 single-step data under {}; run gen_i8085_tests first. Skipping",
            test_dir.display()
        );
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
        "\n8085 single-step vectors: {} passed, {} failed across {} files",
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
