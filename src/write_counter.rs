//! Byte-counting writer used to keep size-limited replies, such as READDIR,
//! within the budget the client asked for.

use std::io::{self, Write};

/// Wraps a writer and counts the bytes it accepted.
pub struct WriteCounter<W> {
    inner: W,
    count: usize,
}

impl<W: Write> WriteCounter<W> {
    pub fn new(inner: W) -> Self {
        WriteCounter { inner, count: 0 }
    }

    /// Total number of bytes accepted by the inner writer so far
    pub fn bytes_written(&self) -> usize {
        self.count
    }
}

impl<W: Write> Write for WriteCounter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.count += size;
        Ok(size)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
