//! Secure erasure of scalar buffers.
//!
//! An [`Eraser`] is an injected strategy that overwrites a byte buffer before
//! it is dropped. The translator applies it to each scalar event's buffer
//! once the text has been copied into the tree, and the node store applies it
//! to scalar text of nodes it frees. Without an eraser both steps are skipped.

use std::fmt;
use std::rc::Rc;

/// Byte pattern written by [`Eraser::fill`] when none is given.
pub const ERASE_PATTERN: u8 = b'A';

/// Shared handle to an erase function.
#[derive(Clone)]
pub struct Eraser(Rc<dyn Fn(&mut [u8])>);

impl Eraser {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut [u8]) + 'static,
    {
        Eraser(Rc::new(f))
    }

    /// Eraser overwriting every byte with `byte`.
    pub fn fill(byte: u8) -> Self {
        Eraser::new(move |buf: &mut [u8]| buf.fill(byte))
    }

    pub fn erase(&self, buf: &mut [u8]) {
        (self.0)(buf)
    }

    /// Erase the heap buffer of `text`, then drop it.
    pub fn erase_string(&self, text: String) {
        let mut bytes = text.into_bytes();
        self.erase(&mut bytes);
    }
}

impl Default for Eraser {
    fn default() -> Self {
        Eraser::fill(ERASE_PATTERN)
    }
}

impl fmt::Debug for Eraser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Eraser(..)")
    }
}
