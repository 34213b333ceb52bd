//! The `-trace` pretty-printer: one line of stack contents followed by the
//! instruction about to be dispatched, matching `printStackAndPc`/
//! `printInstruction` in the distilled source. Pointers are marked with a
//! leading `#` so a trace reader can tell them apart from tagged scalars
//! without decoding the tag bit by hand.

use std::convert::TryFrom;
use std::io::{self, Write};

use crate::opcode::Opcode;
use crate::program::Program;
use crate::word::{is_scalar, untag, Word};

pub fn print_step<W: Write>(
    out: &mut W,
    program: &Program,
    stack: &[Word],
    sp: i64,
    pc: usize,
) -> io::Result<()> {
    write!(out, "[ ")?;
    for i in 0..=sp {
        let w = stack[i as usize];
        if is_scalar(w) {
            write!(out, "{} ", untag(w))?;
        } else {
            write!(out, "#{} ", w)?;
        }
    }
    write!(out, "]")?;

    write!(out, "{{{}: ", pc)?;
    match program.get(pc).and_then(|raw| Opcode::try_from(raw).ok()) {
        Some(op) => {
            write!(out, "{}", op.mnemonic())?;
            for i in 0..op.operand_count() {
                if let Some(operand) = program.get(pc + 1 + i) {
                    write!(out, " {}", operand)?;
                }
            }
        }
        None => write!(out, "?")?,
    }
    writeln!(out, "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::tag;

    #[test]
    fn scalars_print_untagged_pointers_print_hash_prefixed() {
        let program = Program::from_words(vec![0, 7, 22, 25]);
        let stack = [tag(7), 0x0010_0000];
        let mut out = Vec::new();
        print_step(&mut out, &program, &stack, 1, 0).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[ 7 #1048576 ]"));
        assert!(text.contains("{0: CSTI 7}"));
    }

    #[test]
    fn empty_stack_prints_empty_brackets() {
        let program = Program::from_words(vec![25]);
        let stack: [Word; 0] = [];
        let mut out = Vec::new();
        print_step(&mut out, &program, &stack, -1, 0).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[ ]"));
        assert!(text.contains("{0: STOP}"));
    }
}
