//! The two-player scheduler: round-robin stepping of both cohorts and the win condition.

use std::collections::VecDeque;

use crate::instr::Instr;
use crate::memory::{Memory, DEFAULT_SIZE};
use crate::process::Process;

/// Tunable parameters of a match, so the "standard configuration" numbers
/// the base rules describe aren't hard-coded magic numbers.
#[derive(Debug, Clone, Copy)]
pub struct MachineConfig {
    /// Number of words in the shared core.
    pub mem_size: u32,
    /// Load offset for each player's program, and the initial PC of its seed process.
    pub offsets: [u32; 2],
    /// Programs longer than this are rejected at construction.
    pub max_program_words: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        let mem_size = DEFAULT_SIZE;
        Self {
            mem_size,
            offsets: [0, mem_size / 2],
            max_program_words: mem_size / 2,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MachineError {
    #[error("program is {len} words, which overflows the {max} words available")]
    ProgramTooLarge { len: usize, max: usize },
    #[error("binary length {len} is not a multiple of 4 bytes")]
    MisalignedBinary { len: usize },
}

/// The outcome of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Draw,
    Player1Wins,
    Player2Wins,
}

pub struct Machine {
    memory: Memory,
    cohorts: [VecDeque<Process>; 2],
}

impl Machine {
    /// Build a fresh match from two word-oriented program images, one per
    /// player, using the standard-configuration core (4096 words, players
    /// loaded at 0 and 2048).
    pub fn new(program1: &[u32], program2: &[u32]) -> Result<Self, MachineError> {
        Self::with_config(MachineConfig::default(), program1, program2)
    }

    /// Build a fresh match under a custom [`MachineConfig`].
    pub fn with_config(
        config: MachineConfig,
        program1: &[u32],
        program2: &[u32],
    ) -> Result<Self, MachineError> {
        for program in [program1, program2] {
            if program.len() as u32 > config.max_program_words {
                return Err(MachineError::ProgramTooLarge {
                    len: program.len(),
                    max: config.max_program_words as usize,
                });
            }
        }

        let mut memory = Memory::with_size(config.mem_size);
        memory.load(program1, config.offsets[0] as usize);
        memory.load(program2, config.offsets[1] as usize);

        let cohorts = [
            VecDeque::from([Process::new(config.offsets[0])]),
            VecDeque::from([Process::new(config.offsets[1])]),
        ];

        Ok(Self { memory, cohorts })
    }

    /// Live process count for each player, in player order.
    pub fn cohort_sizes(&self) -> (usize, usize) {
        (self.cohorts[0].len(), self.cohorts[1].len())
    }

    /// The processes currently owned by `player`'s cohort, in scheduling order.
    pub fn cohort(&self, player: usize) -> &VecDeque<Process> {
        &self.cohorts[player]
    }

    /// Read a committed memory cell, for inspection outside of a running process.
    pub fn peek_memory(&self, addr: i64) -> u32 {
        self.memory.read(addr)
    }

    /// `None` while both cohorts are non-empty, otherwise the final result.
    pub fn status(&self) -> Option<Outcome> {
        let (first, second) = self.cohort_sizes();
        match (first > 0, second > 0) {
            (true, true) => None,
            (false, false) => Some(Outcome::Draw),
            (true, false) => Some(Outcome::Player1Wins),
            (false, true) => Some(Outcome::Player2Wins),
        }
    }

    /// Advance each non-empty cohort by one process: pop its head, decode and
    /// execute its current instruction, and put the result back. A cohort
    /// that is already empty is simply skipped, so one side can keep moving
    /// after the other has run out of processes (the match just ends on the
    /// next [`Machine::status`] check in that case, since there's nothing
    /// left to schedule against it).
    pub fn step(&mut self) {
        for player in 0..2 {
            self.step_cohort(player);
        }
        self.memory.commit();
    }

    fn step_cohort(&mut self, player: usize) {
        let Some(mut process) = self.cohorts[player].pop_front() else {
            return;
        };

        let word = self.memory.read(process.pc as i64);
        let outcome = Instr::decode(word).and_then(|ins| ins.exec(&mut self.memory, &mut process));

        match outcome {
            Ok(child) => {
                self.cohorts[player].push_back(process);
                if let Some(child) = child {
                    trace!("player {player} forked a process at {:#x}", child.pc);
                    self.cohorts[player].push_back(child);
                }
            }
            Err(fault) => {
                trace!("player {player} lost a process at {:#x}: {fault}", process.pc);
            }
        }
    }

    /// Run to completion. There is no turn ceiling: a match that never
    /// empties a cohort loops forever, matching the base rules' "terminates
    /// exactly when a cohort empties" contract.
    pub fn run(&mut self) -> Outcome {
        loop {
            if let Some(outcome) = self.status() {
                return outcome;
            }
            self.step();
        }
    }

    /// Run for at most `max_turns` steps, stopping early if the match
    /// resolves. `None` means the ceiling was hit with both cohorts still
    /// alive; callers that don't want to loop unboundedly (tests driving a
    /// pathological, possibly non-terminating program) can use this instead
    /// of [`Machine::run`].
    pub fn run_for(&mut self, max_turns: u64) -> Option<Outcome> {
        for _ in 0..max_turns {
            if let Some(outcome) = self.status() {
                return Some(outcome);
            }
            self.step();
        }
        self.status()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn die() -> u32 {
        15
    }

    fn fork() -> u32 {
        0
    }

    #[test]
    fn empty_programs_draw_immediately() {
        let mut machine = Machine::new(&[die()], &[die()]).unwrap();
        assert_eq!(machine.run(), Outcome::Draw);
    }

    #[test]
    fn the_side_that_keeps_a_process_wins() {
        // Player 1 spins on JMP $0 (a no-op jump to itself); player 2 dies immediately.
        let jmp_self = 13_u32;
        let mut machine = Machine::new(&[jmp_self], &[die()]).unwrap();
        assert_eq!(machine.run(), Outcome::Player1Wins);
    }

    #[test]
    fn fork_doubles_a_cohort() {
        let mut machine = Machine::new(&[fork(), die()], &[die()]).unwrap();
        machine.step();
        assert_eq!(machine.cohort_sizes(), (2, 0));
    }

    #[test]
    fn oversized_program_is_rejected() {
        let max = MachineConfig::default().max_program_words as usize;
        let program = vec![die(); max + 1];
        assert!(Machine::new(&program, &[die()]).is_err());
    }

    #[test]
    fn run_for_stops_early_on_a_non_terminating_match() {
        let jmp_self = 13_u32;
        let mut machine = Machine::new(&[jmp_self], &[jmp_self]).unwrap();
        assert_eq!(machine.run_for(10), None);
    }

    #[test]
    fn run_for_reports_a_resolved_match() {
        let mut machine = Machine::new(&[die()], &[die()]).unwrap();
        assert_eq!(machine.run_for(10), Some(Outcome::Draw));
    }

    #[test]
    fn a_smaller_custom_core_loads_both_players() {
        let config = MachineConfig {
            mem_size: 16,
            offsets: [0, 8],
            max_program_words: 8,
        };
        let machine = Machine::with_config(config, &[die()], &[die()]).unwrap();
        assert_eq!(machine.peek_memory(0), die());
        assert_eq!(machine.peek_memory(8), die());
    }
}
