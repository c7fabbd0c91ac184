mod scenarios;

use crate::machine::Machine;

/// Assemble `input` and load it as both players, for tests that only care
/// about one side's behavior (the other side just spins on DIE).
fn run_one(input: &str) -> Machine {
    let program = match cw_asm::assemble(input) {
        Ok(words) => words,
        Err(error) => panic!("{error}"),
    };
    let die = cw_asm::assemble("DIE").unwrap();
    let mut machine = Machine::new(&program, &die).unwrap();
    machine.step();
    machine
}
