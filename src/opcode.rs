//! The 32-opcode instruction set (SPEC_FULL.md §6).
//!
//! Each instruction is one opcode word followed by zero to three inline
//! operand words, decoded by [`crate::vm::Vm`] rather than by a packed
//! multi-field encoding.

use std::convert::TryFrom;

use crate::word::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Opcode {
    Csti = 0,
    Add = 1,
    Sub = 2,
    Mul = 3,
    Div = 4,
    Mod = 5,
    Eq = 6,
    Lt = 7,
    Not = 8,
    Dup = 9,
    Swap = 10,
    Ldi = 11,
    Sti = 12,
    Getbp = 13,
    Getsp = 14,
    Incsp = 15,
    Goto = 16,
    Ifzero = 17,
    Ifnzro = 18,
    Call = 19,
    Tcall = 20,
    Ret = 21,
    Printi = 22,
    Printc = 23,
    Ldargs = 24,
    Stop = 25,
    Nil = 26,
    Cons = 27,
    Car = 28,
    Cdr = 29,
    Setcar = 30,
    Setcdr = 31,
}

impl Opcode {
    /// How many inline operand words follow this opcode.
    pub fn operand_count(self) -> usize {
        use Opcode::*;
        match self {
            Csti | Incsp | Goto | Ifzero | Ifnzro | Ret => 1,
            Call => 2,
            Tcall => 3,
            _ => 0,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Csti => "CSTI",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Mod => "MOD",
            Eq => "EQ",
            Lt => "LT",
            Not => "NOT",
            Dup => "DUP",
            Swap => "SWAP",
            Ldi => "LDI",
            Sti => "STI",
            Getbp => "GETBP",
            Getsp => "GETSP",
            Incsp => "INCSP",
            Goto => "GOTO",
            Ifzero => "IFZERO",
            Ifnzro => "IFNZRO",
            Call => "CALL",
            Tcall => "TCALL",
            Ret => "RET",
            Printi => "PRINTI",
            Printc => "PRINTC",
            Ldargs => "LDARGS",
            Stop => "STOP",
            Nil => "NIL",
            Cons => "CONS",
            Car => "CAR",
            Cdr => "CDR",
            Setcar => "SETCAR",
            Setcdr => "SETCDR",
        }
    }
}

impl TryFrom<Word> for Opcode {
    type Error = ();

    fn try_from(w: Word) -> Result<Self, Self::Error> {
        use Opcode::*;
        Ok(match w {
            0 => Csti,
            1 => Add,
            2 => Sub,
            3 => Mul,
            4 => Div,
            5 => Mod,
            6 => Eq,
            7 => Lt,
            8 => Not,
            9 => Dup,
            10 => Swap,
            11 => Ldi,
            12 => Sti,
            13 => Getbp,
            14 => Getsp,
            15 => Incsp,
            16 => Goto,
            17 => Ifzero,
            18 => Ifnzro,
            19 => Call,
            20 => Tcall,
            21 => Ret,
            22 => Printi,
            23 => Printc,
            24 => Ldargs,
            25 => Stop,
            26 => Nil,
            27 => Cons,
            28 => Car,
            29 => Cdr,
            30 => Setcar,
            31 => Setcdr,
            _ => return Err(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_round_trips_through_try_from() {
        for raw in 0..32u32 {
            let op = Opcode::try_from(raw).unwrap();
            assert_eq!(op as u32, raw);
        }
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        assert!(Opcode::try_from(32).is_err());
        assert!(Opcode::try_from(Word::MAX).is_err());
    }

    #[test]
    fn call_has_two_operands_tcall_has_three() {
        assert_eq!(Opcode::Call.operand_count(), 2);
        assert_eq!(Opcode::Tcall.operand_count(), 3);
        assert_eq!(Opcode::Stop.operand_count(), 0);
    }
}
