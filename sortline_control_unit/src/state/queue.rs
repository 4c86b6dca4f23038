//! FIFO of measured boxes awaiting the turntable.

use std::collections::VecDeque;

use sortline_common::line::state::BoxSizeClass;

/// Pending size classes, oldest first.
#[derive(Debug, Clone, Default)]
pub struct BoxQueue {
    inner: VecDeque<BoxSizeClass>,
}

impl BoxQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, size: BoxSizeClass) {
        self.inner.push_back(size);
    }

    /// Take the oldest entry, `None` when empty.
    pub fn pop(&mut self) -> Option<BoxSizeClass> {
        self.inner.pop_front()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Queued sizes as plain integers, oldest first.
    pub fn sizes(&self) -> Vec<u8> {
        self.inner.iter().map(|s| s.get()).collect()
    }
}
