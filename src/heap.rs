//! Two-semispace Cheney copying collector over cons cells.
//!
//! The two semispaces are fixed-capacity `Vec<Word>` buffers given distinct,
//! disjoint synthetic base addresses for the lifetime of the VM (see
//! SPEC_FULL.md §4.1/§9). A pointer word is `base + 4*index`. "Swapping" the
//! semispaces on collection is a single flip of `a_is_from`, never a move of
//! the backing storage, so a from-space pointer and a to-space pointer are
//! always numerically distinguishable by which disjoint range they fall in.

use crate::error::RuntimeError;
use crate::word::{header_length, is_scalar, make_header, Color, Tag, Word, CONSTAG};

/// Default words per semispace, matching the distilled source's HEAPSIZE.
pub const DEFAULT_HEAP_WORDS: usize = 1000;

const SPACE_A_BASE: Word = 0x0010_0000;
const SPACE_B_BASE: Word = 0x0020_0000;

/// Number of words of address space between the two bases, which bounds how
/// large a single semispace may be without the two ranges overlapping.
const MAX_SPACE_WORDS: usize = ((SPACE_B_BASE - SPACE_A_BASE) / 4) as usize;

pub struct Heap {
    space_a: Vec<Word>,
    space_b: Vec<Word>,
    a_is_from: bool,
    free: usize,
    size: usize,
}

impl Heap {
    pub fn new(size: usize) -> Heap {
        assert!(size >= 2, "a semispace needs room for at least one block");
        assert!(
            size <= MAX_SPACE_WORDS,
            "heap size {} would make the two semispaces' address ranges overlap",
            size
        );
        let mut space_a = vec![0; size];
        space_a[0] = make_header(CONSTAG, (size - 1) as u32, Color::Blue);
        Heap {
            space_a,
            space_b: vec![0; size],
            a_is_from: true,
            free: 0,
            size,
        }
    }

    fn base(is_a: bool) -> Word {
        if is_a {
            SPACE_A_BASE
        } else {
            SPACE_B_BASE
        }
    }

    fn in_range(base: Word, size: usize, addr: Word) -> bool {
        let span = (size as Word).saturating_mul(4);
        addr >= base && addr < base.saturating_add(span)
    }

    /// `true` if `addr` currently points into the active (from) semispace.
    pub fn in_active_space(&self, addr: Word) -> bool {
        Self::in_range(Self::base(self.a_is_from), self.size, addr)
    }

    fn from_space(&self) -> &Vec<Word> {
        if self.a_is_from {
            &self.space_a
        } else {
            &self.space_b
        }
    }

    fn from_space_mut(&mut self) -> &mut Vec<Word> {
        if self.a_is_from {
            &mut self.space_a
        } else {
            &mut self.space_b
        }
    }

    fn index_in_from(&self, ptr: Word) -> Result<usize, RuntimeError> {
        if is_scalar(ptr) || !self.in_active_space(ptr) {
            return Err(RuntimeError::InvalidHeapPointer { value: ptr });
        }
        Ok(((ptr - Self::base(self.a_is_from)) / 4) as usize)
    }

    pub fn car(&self, ptr: Word) -> Result<Word, RuntimeError> {
        if ptr == 0 {
            return Err(RuntimeError::NullCar);
        }
        let idx = self.index_in_from(ptr)?;
        Ok(self.from_space()[idx + 1])
    }

    pub fn cdr(&self, ptr: Word) -> Result<Word, RuntimeError> {
        if ptr == 0 {
            return Err(RuntimeError::NullCdr);
        }
        let idx = self.index_in_from(ptr)?;
        Ok(self.from_space()[idx + 2])
    }

    pub fn set_car(&mut self, ptr: Word, v: Word) -> Result<(), RuntimeError> {
        if ptr == 0 {
            return Err(RuntimeError::NullCar);
        }
        let idx = self.index_in_from(ptr)?;
        self.from_space_mut()[idx + 1] = v;
        Ok(())
    }

    pub fn set_cdr(&mut self, ptr: Word, v: Word) -> Result<(), RuntimeError> {
        if ptr == 0 {
            return Err(RuntimeError::NullCdr);
        }
        let idx = self.index_in_from(ptr)?;
        self.from_space_mut()[idx + 2] = v;
        Ok(())
    }

    fn try_alloc(&mut self, tag: Tag, length: u32) -> Option<Word> {
        let need = length as usize + 1;
        if self.free + need > self.size {
            return None;
        }
        let idx = self.free;
        let is_a = self.a_is_from;
        let header = make_header(tag, length, Color::White);
        if is_a {
            self.space_a[idx] = header;
        } else {
            self.space_b[idx] = header;
        }
        self.free += need;
        Some(Self::base(is_a) + (idx as Word) * 4)
    }

    /// Allocate a block of `length + 1` words, collecting once if the
    /// fast path fails. `stack` is the live window of stack slots (roots);
    /// on collection any root that was a from-space pointer is rewritten in
    /// place to its forwarded to-space address.
    pub fn allocate(
        &mut self,
        tag: Tag,
        length: u32,
        stack: &mut [Word],
    ) -> Result<Word, RuntimeError> {
        if let Some(p) = self.try_alloc(tag, length) {
            return Ok(p);
        }
        log::debug!(
            "heap exhausted (free={}, size={}), collecting",
            self.free,
            self.size
        );
        let live_before = self.free;
        self.collect(stack);
        log::debug!(
            "collection kept {} of {} words live, reclaimed {}",
            self.free,
            self.size,
            live_before.saturating_sub(self.free)
        );
        self.try_alloc(tag, length).ok_or(RuntimeError::OutOfMemory)
    }

    /// Cheney's algorithm: forward every root, then scan the copies
    /// breadth-first, forwarding every from-space pointer found in them,
    /// until the scan pointer catches up with the free pointer.
    fn collect(&mut self, stack: &mut [Word]) {
        let size = self.size;
        let (from_base, to_base) = if self.a_is_from {
            (SPACE_A_BASE, SPACE_B_BASE)
        } else {
            (SPACE_B_BASE, SPACE_A_BASE)
        };

        let mut free = 0usize;
        {
            let (from, to): (&mut Vec<Word>, &mut Vec<Word>) = if self.a_is_from {
                (&mut self.space_a, &mut self.space_b)
            } else {
                (&mut self.space_b, &mut self.space_a)
            };
            for w in to.iter_mut() {
                *w = 0;
            }

            for slot in stack.iter_mut() {
                let w = *slot;
                if !is_scalar(w) && w != 0 {
                    *slot = Self::forward(from, to, from_base, to_base, w, &mut free);
                }
            }

            let mut scan = 0usize;
            while scan < free {
                let header = to[scan];
                let length = header_length(header) as usize;
                for i in 1..=length {
                    let w = to[scan + i];
                    if !is_scalar(w) && w != 0 && Self::in_range(from_base, size, w) {
                        to[scan + i] = Self::forward(from, to, from_base, to_base, w, &mut free);
                    }
                }
                scan += length + 1;
            }

            if free < size {
                let remaining = (size - free - 1) as u32;
                to[free] = make_header(CONSTAG, remaining, Color::Blue);
            }
        }

        self.a_is_from = !self.a_is_from;
        self.free = free;
    }

    /// Copy the block at `ptr` (a from-space pointer) into to-space if it
    /// hasn't been copied yet this collection, returning its (possibly
    /// already-existing) to-space address. A block's car field is reused to
    /// store the forwarding pointer once it has length >= 1, exactly as in
    /// the classical Cheney trick: the from-space copy is dead the moment
    /// the flip happens, so overwriting it here is safe.
    fn forward(
        from: &mut [Word],
        to: &mut [Word],
        from_base: Word,
        to_base: Word,
        ptr: Word,
        free: &mut usize,
    ) -> Word {
        let idx = ((ptr - from_base) / 4) as usize;
        let header = from[idx];
        let length = header_length(header) as usize;

        if length >= 1 {
            let car = from[idx + 1];
            if !is_scalar(car) && car != 0 && car >= to_base && (car - to_base) / 4 < *free as Word
            {
                return car;
            }
        }

        let dest = *free;
        for n in 0..=length {
            to[dest + n] = from[idx + n];
        }
        let forwarded = to_base + (dest as Word) * 4;
        if length >= 1 {
            from[idx + 1] = forwarded;
        }
        *free += length + 1;
        forwarded
    }
}
