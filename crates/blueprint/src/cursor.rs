// ---------------------------------------------------------------------------
// cursor – bounds-checked little-endian reader/writer over byte buffers
// ---------------------------------------------------------------------------
//
// The blueprint format is little-endian throughout. `Cursor` walks an input
// slice and fails with `OutOfBounds` before any read can run past the end;
// `Writer` appends to a growable buffer with the matching typed writers.
// Strings are u32 length-prefixed UTF-8 with no terminator.

use crate::error::BlueprintError;

/// Sequential reader over a byte slice. All reads are little-endian and
/// bounds-checked.
#[derive(Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the current position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Whether the cursor has consumed the whole buffer.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Skip `n` bytes forward.
    pub fn skip(&mut self, n: usize) -> Result<(), BlueprintError> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Read `n` bytes as a borrowed slice.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], BlueprintError> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a 4-byte magic tag.
    pub fn read_magic(&mut self) -> Result<[u8; 4], BlueprintError> {
        let bytes = self.read_bytes(4)?;
        let mut magic = [0u8; 4];
        magic.copy_from_slice(bytes);
        Ok(magic)
    }

    pub fn read_u8(&mut self) -> Result<u8, BlueprintError> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16, BlueprintError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, BlueprintError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, BlueprintError> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    pub fn read_f32(&mut self) -> Result<f32, BlueprintError> {
        let bytes = self.read_bytes(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a u32 length-prefixed UTF-8 string.
    ///
    /// A declared length larger than the remaining buffer is `CorruptData`
    /// (the length field is lying) rather than `OutOfBounds`.
    pub fn read_string(&mut self) -> Result<String, BlueprintError> {
        let offset = self.pos;
        let len = self.read_u32()? as usize;
        if len > self.remaining() {
            return Err(BlueprintError::CorruptData(format!(
                "string at offset {offset} declares {len} bytes but only {} remain",
                self.remaining()
            )));
        }
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            BlueprintError::CorruptData(format!("string at offset {offset} is not valid UTF-8: {e}"))
        })
    }

    /// Split off a sub-cursor over the next `n` bytes and advance past them.
    ///
    /// Record payloads are parsed through a sub-cursor so a known type whose
    /// fields read past its declared length fails inside the record instead
    /// of bleeding into the next one.
    pub fn take(&mut self, n: usize) -> Result<Cursor<'a>, BlueprintError> {
        let slice = self.read_bytes(n)?;
        Ok(Cursor::new(slice))
    }

    fn ensure(&self, n: usize) -> Result<(), BlueprintError> {
        if self.pos + n > self.data.len() {
            return Err(BlueprintError::OutOfBounds {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }
}

/// Append-only output buffer with typed little-endian writers.
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_magic(&mut self, magic: &[u8; 4]) {
        self.buf.extend_from_slice(magic);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a u32 length-prefixed UTF-8 string. `s` must fit the u32
    /// prefix; [`Document::validate`] bounds every string that reaches here.
    ///
    /// [`Document::validate`]: crate::document::Document::validate
    pub fn write_string(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}
