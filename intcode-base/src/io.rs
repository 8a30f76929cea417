//! Input and output of a running program.
//!
//! [`InputSource`] and [`OutputSink`] are implemented for closures, so simple
//! programs can be connected with `|| 5` and `|v| println!("{v}")`. [`Pipe`] is
//! a shared queue that implements both and wires runners together.

use core::cell::RefCell;
use alloc::{collections::VecDeque, rc::Rc, vec::Vec};

/// Producer of values for `in` instructions.
pub trait InputSource {
    /// Returns next value or [`None`] if there is nothing to read.
    fn read(&mut self) -> Option<i64>;
}

/// Consumer of values from `out` instructions.
pub trait OutputSink {
    fn write(&mut self, value: i64);
}

impl<F: FnMut() -> i64> InputSource for F {
    fn read(&mut self) -> Option<i64> {
        Some(self())
    }
}
impl InputSource for VecDeque<i64> {
    fn read(&mut self) -> Option<i64> {
        self.pop_front()
    }
}

impl<F: FnMut(i64)> OutputSink for F {
    fn write(&mut self, value: i64) {
        self(value)
    }
}
impl OutputSink for Vec<i64> {
    fn write(&mut self, value: i64) {
        self.push(value)
    }
}

/// FIFO queue shared between a writer and a reader. Clones refer to the same queue.
///
/// ```
/// # use intcode_base::io::{Pipe, InputSource, OutputSink};
/// let pipe = Pipe::with_values([5]);
/// let mut writer = pipe.clone();
///
/// writer.write(7);
///
/// assert_eq!(pipe.len(), 2);
/// assert_eq!(pipe.clone().read(), Some(5));
/// assert_eq!(pipe.pop(), Some(7));
/// assert!(pipe.is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Pipe(Rc<RefCell<VecDeque<i64>>>);

impl Pipe {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn with_values<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Self(Rc::new(RefCell::new(values.into_iter().collect())))
    }

    pub fn push(&self, value: i64) {
        self.0.borrow_mut().push_back(value);
    }
    pub fn pop(&self) -> Option<i64> {
        self.0.borrow_mut().pop_front()
    }
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
    /// Takes all queued values.
    pub fn drain(&self) -> Vec<i64> {
        self.0.borrow_mut().drain(..).collect()
    }
}

impl InputSource for Pipe {
    fn read(&mut self) -> Option<i64> {
        self.pop()
    }
}
impl OutputSink for Pipe {
    fn write(&mut self, value: i64) {
        self.push(value)
    }
}
