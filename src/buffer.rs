//! buffer.rs - The mutable text buffer (component A) and the line-buffered
//! output writer used by the input loop.
//!
//! [`TextBuffer`] is a thin wrapper around `Vec<u8>` offering insert/delete/
//! replace at arbitrary byte offsets. It deliberately knows nothing about
//! regexes, styles or rules - those live in [`crate::stylelist`],
//! [`crate::rmatch`] and [`crate::rule`], which all mutate a buffer through
//! this interface and react to the returned length delta.

/// A mutable byte string with insert/delete/replace at arbitrary offsets.
///
/// All positions are byte offsets, half-open where a range is involved.
/// `replace`/`insert`/`delete` return the signed length change so callers
/// can propagate it into submatch spans and style ranges (see
/// [`crate::rmatch::update_positions`]).
#[derive(Debug, Default, Clone)]
pub struct TextBuffer {
    data: Vec<u8>,
}

impl TextBuffer {
    pub fn new() -> Self {
        TextBuffer { data: Vec::new() }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        TextBuffer { data: bytes.into() }
    }

    /// Resets the buffer's content to `bytes`, discarding whatever was there.
    pub fn set(&mut self, bytes: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the byte at `pos`, or `None` past the end of the buffer.
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        self.data.get(pos).copied()
    }

    /// Replaces `[lo, hi)` with `new`, returning the signed length delta
    /// (`new.len() as isize - (hi - lo) as isize`).
    pub fn replace(&mut self, lo: usize, hi: usize, new: &[u8]) -> isize {
        let old_len = hi - lo;
        self.data.splice(lo..hi, new.iter().copied());
        new.len() as isize - old_len as isize
    }

    /// Inserts `new` at `pos`, returning the number of bytes inserted.
    pub fn insert(&mut self, pos: usize, new: &[u8]) -> usize {
        self.data.splice(pos..pos, new.iter().copied());
        new.len()
    }

    /// Deletes `[lo, hi)`.
    pub fn delete(&mut self, lo: usize, hi: usize) {
        self.data.splice(lo..hi, std::iter::empty());
    }

    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

/// Line-buffered writer that flushes after each newline.
///
/// This ensures near-real-time output when `remark` is used interactively
/// in a pipeline, matching the teacher's buffered-writer strategy rather
/// than leaving flushing entirely to the OS pipe buffer.
pub struct LineBufferedWriter<W: std::io::Write> {
    inner: W,
}

impl<W: std::io::Write> LineBufferedWriter<W> {
    /// Create a new `LineBufferedWriter` wrapping `inner`.
    ///
    /// The returned writer will delegate write and flush calls to `inner`,
    /// but will also flush `inner` whenever a newline (`\n`) byte is written
    /// to ensure near-real-time line output.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: std::io::Write> std::io::Write for LineBufferedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        if buf.contains(&b'\n') {
            self.inner.flush()?;
        }
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
