//! Virtual Machine memory implementation.

use alloc::vec::Vec;
use hashbrown::HashMap;

use crate::program::Program;

/// Represents memory of one running program.
///
/// Addresses below [`Memory::len`] live in a dense vector copied from the
/// [`Program`], everything above is kept in a sparse map. Reads never fail:
/// an address that was never written holds `0`.
///
/// ```
/// # use intcode_base::{memory::Memory, program::Program};
/// let mut memory = Memory::from(&Program::from(vec![1, 2, 3]));
///
/// memory.set(1, 20);
/// memory.set(1_000_000, 7);
///
/// assert_eq!(memory.get(1), 20);
/// assert_eq!(memory.get(1_000_000), 7);
/// assert_eq!(memory.get(5), 0);
/// assert_eq!(memory.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memory {
    dense: Vec<i64>,
    sparse: HashMap<usize, i64>,
}

impl Memory {
    pub fn new(dense: Vec<i64>) -> Self {
        Self {
            dense,
            sparse: HashMap::new(),
        }
    }

    /// Reads a cell.
    #[inline]
    pub fn get(&self, address: usize) -> i64 {
        match self.dense.get(address) {
            Some(v) => *v,
            None => self.sparse.get(&address).copied().unwrap_or(0),
        }
    }
    /// Writes a cell.
    #[inline]
    pub fn set(&mut self, address: usize, v: i64) {
        match self.dense.get_mut(address) {
            Some(cell) => *cell = v,
            None => {
                self.sparse.insert(address, v);
            }
        }
    }

    /// Length of the dense part, that is of the program memory was created from.
    pub fn len(&self) -> usize {
        self.dense.len()
    }
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// The dense part of memory.
    pub fn as_slice(&self) -> &[i64] {
        &self.dense
    }

    /// Highest address ever written plus one, at least [`Memory::len`].
    pub fn extent(&self) -> usize {
        self.sparse
            .keys()
            .max()
            .map_or(self.dense.len(), |max| max + 1)
    }

    /// Copies memory to a vector up to [`Memory::extent`]. Cells never written
    /// are filled with `0`.
    pub fn to_vec(&self) -> Vec<i64> {
        let mut v = self.dense.clone();
        v.extend((self.dense.len()..self.extent()).map(|address| self.get(address)));
        v
    }
}

impl From<&Program> for Memory {
    fn from(program: &Program) -> Self {
        Self::new(program.words().to_vec())
    }
}
impl From<Vec<i64>> for Memory {
    fn from(v: Vec<i64>) -> Self {
        Self::new(v)
    }
}
