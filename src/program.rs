//! Loads a program file: whitespace-separated decimal words, read left to
//! right into a dense array (SPEC_FULL.md §6).

use std::io::Read;

use crate::error::VmError;
use crate::word::Word;

#[derive(Debug, Clone)]
pub struct Program {
    words: Vec<Word>,
}

impl Program {
    pub fn from_words(words: Vec<Word>) -> Program {
        Program { words }
    }

    /// Parse a program from any `Read` source. The original reader grows its
    /// buffer geometrically; `Vec`'s own amortized-doubling growth already
    /// gives us that without manual buffer bookkeeping.
    pub fn load(mut source: impl Read) -> Result<Program, VmError> {
        let mut text = String::new();
        source.read_to_string(&mut text)?;

        let mut words = Vec::new();
        for token in text.split_ascii_whitespace() {
            let n: i64 = token
                .parse()
                .map_err(|_| VmError::Parse(format!("not a decimal integer: {:?}", token)))?;
            if n < i64::from(i32::MIN) || n > i64::from(u32::MAX) {
                return Err(VmError::Parse(format!(
                    "word out of 32-bit range: {}",
                    token
                )));
            }
            words.push(n as u32);
        }
        Ok(Program::from_words(words))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[inline]
    pub fn get(&self, pc: usize) -> Option<Word> {
        self.words.get(pc).copied()
    }
}
