//! Command-line front end: `cellvm [-trace] <programfile> [args...]`.
//!
//! Mirrors the distilled source's `main`/`execute`: CPU time is measured
//! around the run loop only, file loading and argument parsing are outside
//! the clock. Unlike the original, `-trace` is matched by exact string
//! comparison rather than a 7-character `strncmp` prefix.

use std::fs::File;
use std::mem::MaybeUninit;
use std::process::ExitCode;

use cellvm::{Program, Vm, VmConfig, VmError};

fn cpu_seconds() -> f64 {
    unsafe {
        let mut usage = MaybeUninit::<libc::rusage>::zeroed();
        libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr());
        let usage = usage.assume_init();
        usage.ru_utime.tv_sec as f64 + usage.ru_utime.tv_usec as f64 / 1_000_000.0
    }
}

struct Args {
    trace: bool,
    programfile: String,
    program_args: Vec<i32>,
}

fn parse_args(argv: &[String]) -> Result<Args, VmError> {
    let usage = || {
        VmError::Usage(format!(
            "{} [-trace] <programfile> [args...]",
            argv.first().map(String::as_str).unwrap_or("cellvm")
        ))
    };

    let rest = argv.get(1..).ok_or_else(usage)?;
    if rest.is_empty() {
        return Err(usage());
    }

    let (trace, rest) = if rest[0] == "-trace" {
        (true, &rest[1..])
    } else {
        (false, rest)
    };

    let (programfile, rest) = rest.split_first().ok_or_else(usage)?;

    let mut program_args = Vec::with_capacity(rest.len());
    for a in rest {
        let n: i32 = a
            .parse()
            .map_err(|_| VmError::Usage(format!("argument {:?} is not an integer", a)))?;
        program_args.push(n);
    }

    Ok(Args {
        trace,
        programfile: programfile.clone(),
        program_args,
    })
}

fn run() -> Result<i32, VmError> {
    env_logger::init();

    let argv: Vec<String> = std::env::args().collect();
    let args = parse_args(&argv)?;

    let file = File::open(&args.programfile)?;
    let program = Program::load(file)?;

    let config = VmConfig::from_env();
    let mut vm = Vm::new(program, args.program_args, config).with_trace(args.trace);

    let started = cpu_seconds();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let code = vm.run(&mut out)?;
    let elapsed = cpu_seconds() - started;

    use std::io::Write;
    writeln!(out, "\nUsed {:7.3} cpu seconds", elapsed)?;

    Ok(code)
}

fn main() -> ExitCode {
    match run() {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("cellvm: {}", e);
            let code = e.exit_code();
            ExitCode::from((code as i64 & 0xff) as u8)
        }
    }
}
