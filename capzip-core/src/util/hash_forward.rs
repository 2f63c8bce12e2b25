use std::io::{Result, Write};

/// Write adapter that feeds every forwarded byte into a blake3 hasher.
pub struct HashingForward<'a, W: Write> {
    inner: W,
    hasher: &'a mut blake3::Hasher,
    pub written: u64,
}

impl<'a, W: Write> HashingForward<'a, W> {
    pub fn new(inner: W, hasher: &'a mut blake3::Hasher) -> Self {
        Self {
            inner,
            hasher,
            written: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<'a, W: Write> Write for HashingForward<'a, W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        // only hash what the sink accepted
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}
