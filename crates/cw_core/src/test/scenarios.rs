use super::run_one;

#[test]
fn countdown_leaves_a_zero_register() {
    let mut machine = run_one(
        r#"
            MOV $3 r1
&loop:      ADD $-1 r1
            BZ  $&end
            JMP $&loop
&end:       DIE
        "#,
    );
    // run_one already ran MOV; three more trips round the loop (ADD, BZ, JMP)
    // land exactly on the third ADD, the step where r1 hits zero but before
    // BZ sends the process on to DIE.
    for _ in 0..7 {
        machine.step();
    }
    let process = machine.cohort(0).front().expect("player 1 still alive");
    assert_eq!(process.registers[1], 0);
}

#[test]
fn push_then_pop_round_trips_through_a_register() {
    let mut machine = run_one(
        r#"
            MOV $42 r2
            PUSH r2
            POP  r3
            DIE
        "#,
    );
    // run_one ran MOV; two more steps cover PUSH then POP, stopping before DIE.
    for _ in 0..2 {
        machine.step();
    }
    let process = machine.cohort(0).front().expect("player 1 still alive");
    assert_eq!(process.registers[3], 42);
}

#[test]
fn fork_appends_a_child_to_the_same_cohort() {
    let machine = run_one("FORK\nDIE");
    assert_eq!(machine.cohort(0).len(), 2);
}

#[test]
fn relative_write_lands_at_pc_plus_offset() {
    let machine = run_one("MOV $7 @9\nDIE");
    assert_eq!(machine.peek_memory(9), 7);
}
