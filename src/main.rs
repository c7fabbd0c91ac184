//! Thin CLI front end: load two compiled programs, run the match to
//! completion, and print the winner. Everything interesting lives in
//! `cw_core` and `cw_asm`; this binary is just plumbing.

#[macro_use]
extern crate log;

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use cw_core::{binary, Machine, MachineError, Outcome};
use log::LevelFilter;

#[derive(thiserror::Error, Debug)]
enum LoadError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Assemble(#[from] cw_asm::Error),
    #[error("{0}")]
    Binary(#[from] MachineError),
}

/// Load a program from `path`: `.asm` files are assembled from source,
/// anything else is read as a pre-assembled little-endian binary.
fn load_program(path: &Path) -> Result<Vec<u32>, LoadError> {
    let is_asm = path.extension().and_then(|ext| ext.to_str()) == Some("asm");
    if is_asm {
        let source = std::fs::read_to_string(path)?;
        Ok(cw_asm::assemble(&source)?)
    } else {
        let bytes = std::fs::read(path)?;
        Ok(binary::from_bytes(&bytes)?)
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Draw => "draw",
        Outcome::Player1Wins => "player1-wins",
        Outcome::Player2Wins => "player2-wins",
    }
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .format(|f, record| writeln!(f, "{}: {}", record.level(), record.args()))
        .filter(None, LevelFilter::Info)
        .init();

    let mut args = std::env::args();
    args.next(); // program name, never used as an input per the base spec's §9 note
    let (Some(path1), Some(path2)) = (args.next(), args.next()) else {
        eprintln!("usage: corewar <player1> <player2>");
        return ExitCode::FAILURE;
    };

    let program1 = match load_program(Path::new(&path1)) {
        Ok(words) => words,
        Err(err) => {
            eprintln!("failed to load {path1}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let program2 = match load_program(Path::new(&path2)) {
        Ok(words) => words,
        Err(err) => {
            eprintln!("failed to load {path2}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut machine = match Machine::new(&program1, &program2) {
        Ok(machine) => machine,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = machine.run();
    info!("match finished: {outcome:?}");
    println!("{}", outcome_label(outcome));

    ExitCode::SUCCESS
}
