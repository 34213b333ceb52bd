//! End-to-end scenarios run against the public `Vm` API with an in-memory
//! output buffer, covering the example programs and error cases.

use cellvm::{Program, Vm, VmConfig};

fn run(words: &[u32], args: Vec<i32>) -> (i32, String) {
    let program = Program::from_words(words.to_vec());
    let mut vm = Vm::new(program, args, VmConfig::default());
    let mut out = Vec::new();
    let code = vm.run(&mut out).expect("program should not fault");
    (code, String::from_utf8(out).unwrap())
}

fn run_config(words: &[u32], args: Vec<i32>, config: VmConfig) -> Result<(i32, String), String> {
    let program = Program::from_words(words.to_vec());
    let mut vm = Vm::new(program, args, config);
    let mut out = Vec::new();
    match vm.run(&mut out) {
        Ok(code) => Ok((code, String::from_utf8(out).unwrap())),
        Err(e) => Err(e.to_string()),
    }
}

#[test]
fn prints_a_literal() {
    let (code, out) = run(&[0, 42, 22, 25], vec![]);
    assert_eq!(code, 0);
    assert_eq!(out, "42 ");
}

#[test]
fn adds_two_literals() {
    let (code, out) = run(&[0, 2, 0, 3, 1, 22, 25], vec![]);
    assert_eq!(code, 0);
    assert_eq!(out, "5 ");
}

#[test]
fn ldargs_pushes_command_line_args_in_order() {
    // LDARGS; PRINTI; SWAP; PRINTI; STOP (two args, print both)
    let (code, out) = run(&[24, 22, 10, 22, 25], vec![10, 20]);
    assert_eq!(code, 0);
    assert_eq!(out, "20 10 ");
}

#[test]
fn cons_then_car_and_cdr_recover_both_fields() {
    // CSTI 1; CSTI 2; CONS; DUP; CAR; PRINTI; SWAP; CDR; PRINTI; STOP
    let (code, out) = run(
        &[0, 1, 0, 2, 27, 9, 28, 22, 10, 29, 22, 25],
        vec![],
    );
    assert_eq!(code, 0);
    assert_eq!(out, "1 2 ");
}

#[test]
fn printc_prints_a_character_without_popping() {
    // CSTI 65 ('A'); PRINTC; STOP
    let (code, out) = run(&[0, 65, 23, 25], vec![]);
    assert_eq!(code, 0);
    assert_eq!(out, "A");
}

#[test]
fn goto_skips_the_dead_branch() {
    // GOTO 6; CSTI 1; PRINTI; STOP; (unreached filler); CSTI 2; PRINTI; STOP
    let (code, out) = run(&[16, 6, 0, 1, 22, 25, 0, 2, 22, 25], vec![]);
    assert_eq!(code, 0);
    assert_eq!(out, "2 ");
}

#[test]
fn ifzero_branches_on_a_zero_scalar() {
    // CSTI 0; IFZERO 8; CSTI 1; PRINTI; STOP; CSTI 2; PRINTI; STOP
    let (code, out) = run(&[0, 0, 17, 8, 0, 1, 22, 25, 0, 2, 22, 25], vec![]);
    assert_eq!(code, 0);
    assert_eq!(out, "2 ");
}

#[test]
fn dividing_by_zero_is_reported_not_a_panic() {
    let result = run_config(&[0, 1, 0, 0, 4, 22, 25], vec![], VmConfig::default());
    assert!(result.is_err());
}

#[test]
fn car_of_nil_is_reported_not_a_panic() {
    // NIL; CAR; STOP
    let result = run_config(&[26, 28, 25], vec![], VmConfig::default());
    assert_eq!(result.unwrap_err(), "Cannot take car of null");
}

#[test]
fn illegal_opcode_is_reported() {
    let result = run_config(&[99, 25], vec![], VmConfig::default());
    assert!(result.unwrap_err().contains("Illegal/unknown opcode"));
}

#[test]
fn running_off_the_end_of_the_program_is_a_fault_not_a_panic() {
    // A single CSTI with no operand word and no STOP after it.
    let result = run_config(&[0], vec![], VmConfig::default());
    assert!(result.unwrap_err().contains("out of bounds"));
}

#[test]
fn running_out_of_heap_reports_out_of_memory() {
    // A heap with room for one block header but not a full cons cell: the
    // first CONS can never succeed, even after collecting.
    let config = VmConfig {
        heap_words: 2,
        stack_words: 16,
    };
    // CSTI 1; CSTI 2; CONS; STOP
    let result = run_config(&[0, 1, 0, 2, 27, 25], vec![], config);
    assert_eq!(result.unwrap_err(), "Out of memory");
}

#[test]
fn call_and_ret_round_trip_the_stack_and_program_counter() {
    // A hand-assembled `double(n) = n + n`: push one argument, CALL into a
    // callee that doubles it in place, RET back to the caller's PRINTI.
    //   idx 0: CSTI 5            -- the argument
    //   idx 2: CALL 1 7          -- argc=1, callee at idx 7
    //   idx 5: PRINTI            -- return address; prints the result
    //   idx 6: STOP
    //   idx 7: DUP               -- callee: n, n
    //   idx 8: ADD               -- n + n
    //   idx 9: RET 0             -- no locals above the argument to discard
    let words: Vec<u32> = vec![
        0, 5, // 0,1
        19, 1, 7, // 2,3,4
        22, // 5
        25, // 6
        9, // 7
        1, // 8
        21, 0, // 9,10
    ];
    let (code, out) = run(&words, vec![]);
    assert_eq!(code, 0);
    assert_eq!(out, "10 ");
}
