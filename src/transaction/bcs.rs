//! Minimal canonical binary encoder for the transaction types the wallet signs.
//!
//! Integers are little-endian, sequence lengths and enum variant tags are
//! ULEB128, fixed-size arrays are written raw.

/// Append-only canonical encoder.
#[derive(Debug, Default)]
pub struct BcsWriter {
    buf: Vec<u8>,
}

impl BcsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_uleb128(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Write a fixed-length value with no length prefix.
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a length-prefixed byte vector.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_uleb128(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_str(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Write a length-prefixed sequence, encoding each item with `f`.
    pub fn write_seq<T>(&mut self, items: &[T], mut f: impl FnMut(&mut Self, &T)) {
        self.write_uleb128(items.len() as u64);
        for item in items {
            f(self, item);
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Types with a canonical binary form.
pub trait BcsEncode {
    fn encode(&self, writer: &mut BcsWriter);

    fn to_bcs(&self) -> Vec<u8> {
        let mut writer = BcsWriter::new();
        self.encode(&mut writer);
        writer.into_bytes()
    }
}

impl BcsEncode for u64 {
    fn encode(&self, writer: &mut BcsWriter) {
        writer.write_u64(*self);
    }
}

impl BcsEncode for str {
    fn encode(&self, writer: &mut BcsWriter) {
        writer.write_str(self);
    }
}
