//! The interpreter: value stack, base/stack pointers, program counter, and
//! the dispatch loop. Ports `execcode()` from the distilled source
//! instruction by instruction, replacing raw array indexing with
//! bounds-checked, `Result`-returning accessors so a malformed program
//! produces a `RuntimeError` instead of undefined behavior.

use std::convert::TryFrom;
use std::io::Write;

use crate::config::VmConfig;
use crate::error::{RuntimeError, VmError};
use crate::heap::Heap;
use crate::opcode::Opcode;
use crate::program::Program;
use crate::trace;
use crate::word::{is_scalar, is_zero, tag, untag, Word, CONSTAG};

pub struct Vm {
    program: Program,
    stack: Vec<Word>,
    sp: i64,
    bp: i64,
    pc: usize,
    heap: Heap,
    args: Vec<i32>,
    trace: bool,
}

impl Vm {
    pub fn new(program: Program, args: Vec<i32>, config: VmConfig) -> Vm {
        Vm {
            program,
            stack: vec![0; config.stack_words],
            sp: -1,
            bp: -1,
            pc: 0,
            heap: Heap::new(config.heap_words),
            args,
            trace: false,
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Vm {
        self.trace = trace;
        self
    }

    fn get(&self, i: i64) -> Result<Word, RuntimeError> {
        if i < 0 {
            return Err(RuntimeError::StackUnderflow { index: i });
        }
        self.stack
            .get(i as usize)
            .copied()
            .ok_or(RuntimeError::StackOverflow {
                sp: i,
                capacity: self.stack.len(),
            })
    }

    fn set(&mut self, i: i64, v: Word) -> Result<(), RuntimeError> {
        if i < 0 {
            return Err(RuntimeError::StackUnderflow { index: i });
        }
        let capacity = self.stack.len();
        let slot = self
            .stack
            .get_mut(i as usize)
            .ok_or(RuntimeError::StackOverflow { sp: i, capacity })?;
        *slot = v;
        Ok(())
    }

    fn push(&mut self, v: Word) -> Result<(), RuntimeError> {
        let new_sp = self.sp + 1;
        self.set(new_sp, v)?;
        self.sp = new_sp;
        Ok(())
    }

    fn pop(&mut self) -> Result<Word, RuntimeError> {
        let v = self.get(self.sp)?;
        self.sp -= 1;
        Ok(v)
    }

    fn top(&self) -> Result<Word, RuntimeError> {
        self.get(self.sp)
    }

    fn fetch_operand(&mut self) -> Result<Word, RuntimeError> {
        let w = self
            .program
            .get(self.pc)
            .ok_or(RuntimeError::PcOutOfBounds {
                pc: self.pc,
                len: self.program.len(),
            })?;
        self.pc += 1;
        Ok(w)
    }

    fn check_sp_in_bounds(&self, sp: i64) -> Result<(), RuntimeError> {
        if sp < -1 {
            Err(RuntimeError::StackUnderflow { index: sp })
        } else if sp >= self.stack.len() as i64 {
            Err(RuntimeError::StackOverflow {
                sp,
                capacity: self.stack.len(),
            })
        } else {
            Ok(())
        }
    }

    /// Run until `STOP` (returns `Ok(0)`) or a fault (`Err`). `out` receives
    /// the output of `PRINTI`/`PRINTC`; the `-trace` stream (if enabled) is
    /// written to the same sink, one line per dispatched instruction.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<i32, VmError> {
        loop {
            if self.trace {
                trace::print_step(out, &self.program, &self.stack, self.sp, self.pc)
                    .map_err(VmError::Io)?;
            }

            let addr = self.pc;
            let raw_op = self.fetch_operand()?;
            let op = Opcode::try_from(raw_op).map_err(|_| RuntimeError::IllegalOpcode {
                opcode: raw_op,
                address: addr,
            })?;

            match op {
                Opcode::Csti => {
                    let n = self.fetch_operand()? as i32;
                    self.push(tag(n))?;
                }
                Opcode::Add => {
                    let b = untag(self.pop()?);
                    let a = untag(self.pop()?);
                    self.push(tag(a.wrapping_add(b)))?;
                }
                Opcode::Sub => {
                    let b = untag(self.pop()?);
                    let a = untag(self.pop()?);
                    self.push(tag(a.wrapping_sub(b)))?;
                }
                Opcode::Mul => {
                    let b = untag(self.pop()?);
                    let a = untag(self.pop()?);
                    self.push(tag(a.wrapping_mul(b)))?;
                }
                Opcode::Div => {
                    let b = untag(self.pop()?);
                    let a = untag(self.pop()?);
                    if b == 0 {
                        return Err(RuntimeError::DivideByZero.into());
                    }
                    self.push(tag(a.wrapping_div(b)))?;
                }
                Opcode::Mod => {
                    let b = untag(self.pop()?);
                    let a = untag(self.pop()?);
                    if b == 0 {
                        return Err(RuntimeError::DivideByZero.into());
                    }
                    self.push(tag(a.wrapping_rem(b)))?;
                }
                Opcode::Eq => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.push(tag(if a == b { 1 } else { 0 }))?;
                }
                Opcode::Lt => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.push(tag(if a < b { 1 } else { 0 }))?;
                }
                Opcode::Not => {
                    let a = self.pop()?;
                    self.push(tag(if is_zero(a) { 1 } else { 0 }))?;
                }
                Opcode::Dup => {
                    let a = self.top()?;
                    self.push(a)?;
                }
                Opcode::Swap => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.push(b)?;
                    self.push(a)?;
                }
                Opcode::Ldi => {
                    let addr = self.pop()?;
                    let v = self.get(i64::from(untag(addr)))?;
                    self.push(v)?;
                }
                Opcode::Sti => {
                    let v = self.pop()?;
                    let addr = self.pop()?;
                    self.set(i64::from(untag(addr)), v)?;
                    self.push(v)?;
                }
                Opcode::Getbp => {
                    self.push(tag(self.bp as i32))?;
                }
                Opcode::Getsp => {
                    self.push(tag(self.sp as i32))?;
                }
                Opcode::Incsp => {
                    let m = self.fetch_operand()? as i32;
                    let new_sp = self.sp + i64::from(m);
                    self.check_sp_in_bounds(new_sp)?;
                    self.sp = new_sp;
                }
                Opcode::Goto => {
                    let t = self.fetch_operand()?;
                    self.pc = t as usize;
                }
                Opcode::Ifzero => {
                    let t = self.fetch_operand()?;
                    let a = self.pop()?;
                    if is_zero(a) {
                        self.pc = t as usize;
                    }
                }
                Opcode::Ifnzro => {
                    let t = self.fetch_operand()?;
                    let a = self.pop()?;
                    if !is_zero(a) {
                        self.pc = t as usize;
                    }
                }
                Opcode::Call => {
                    let argc = i64::from(self.fetch_operand()?);
                    let target = self.fetch_operand()? as usize;
                    let return_addr = self.pc;
                    for i in 0..argc {
                        let v = self.get(self.sp - i)?;
                        self.set(self.sp - i + 2, v)?;
                    }
                    self.set(self.sp - argc + 1, tag(return_addr as i32))?;
                    self.sp += 1;
                    self.set(self.sp - argc + 1, tag(self.bp as i32))?;
                    self.sp += 1;
                    self.bp = self.sp + 1 - argc;
                    self.pc = target;
                }
                Opcode::Tcall => {
                    let argc = i64::from(self.fetch_operand()?);
                    let pop_n = i64::from(self.fetch_operand()?);
                    let target = self.fetch_operand()? as usize;
                    for i in (0..argc).rev() {
                        let v = self.get(self.sp - i)?;
                        self.set(self.sp - i - pop_n, v)?;
                    }
                    self.sp -= pop_n;
                    self.pc = target;
                }
                Opcode::Ret => {
                    let m = i64::from(self.fetch_operand()?);
                    let res = self.get(self.sp)?;
                    self.sp -= m;
                    self.sp -= 1;
                    self.bp = i64::from(untag(self.get(self.sp)?));
                    self.sp -= 1;
                    self.pc = untag(self.get(self.sp)?) as usize;
                    self.set(self.sp, res)?;
                }
                Opcode::Printi => {
                    let a = self.top()?;
                    if is_scalar(a) {
                        write!(out, "{} ", untag(a)).map_err(VmError::Io)?;
                    } else {
                        write!(out, "{} ", a).map_err(VmError::Io)?;
                    }
                }
                Opcode::Printc => {
                    let a = self.top()?;
                    let code = untag(a) as u32;
                    let ch = char::from_u32(code).unwrap_or('\u{FFFD}');
                    write!(out, "{}", ch).map_err(VmError::Io)?;
                }
                Opcode::Ldargs => {
                    for i in 0..self.args.len() {
                        let v = self.args[i];
                        self.push(tag(v))?;
                    }
                }
                Opcode::Stop => return Ok(0),
                Opcode::Nil => {
                    self.push(0)?;
                }
                Opcode::Cons => {
                    // Allocate with the window 0..=sp still intact: the two
                    // operands (car at sp-1, cdr at sp) must be recognized
                    // as roots if this allocation triggers a collection.
                    let window_len = (self.sp + 1) as usize;
                    let ptr = self
                        .heap
                        .allocate(CONSTAG, 2, &mut self.stack[..window_len])?;
                    let cdr = self.pop()?;
                    let car = self.pop()?;
                    self.heap.set_car(ptr, car)?;
                    self.heap.set_cdr(ptr, cdr)?;
                    self.push(ptr)?;
                }
                Opcode::Car => {
                    let p = self.pop()?;
                    let v = self.heap.car(p)?;
                    self.push(v)?;
                }
                Opcode::Cdr => {
                    let p = self.pop()?;
                    let v = self.heap.cdr(p)?;
                    self.push(v)?;
                }
                Opcode::Setcar => {
                    let v = self.pop()?;
                    let p = self.pop()?;
                    self.heap.set_car(p, v)?;
                    self.push(p)?;
                }
                Opcode::Setcdr => {
                    let v = self.pop()?;
                    let p = self.pop()?;
                    self.heap.set_cdr(p, v)?;
                    self.push(p)?;
                }
            }
        }
    }
}
