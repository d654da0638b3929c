use std::ops::Deref;

use crate::base::VInt64;
use crate::element::Element;
use crate::functional::*;

/// Ebml Void element, used for padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Void {
    /// Size of the void element's body in bytes.
    pub size: u64,
}

impl Element for Void {
    const ID: VInt64 = VInt64::from_encoded(0xEC);
    fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
        let len = buf.len() as u64;
        buf.advance(buf.len());
        Ok(Self { size: len })
    }
    fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
        buf.append_slice(&vec![0; self.size as usize]);
        Ok(())
    }
}

impl Void {
    /// The Void whose encoded form occupies exactly `total` bytes, together
    /// with the width of its size field. Returns `None` for `total < 2`:
    /// a Void cannot be smaller than its own header.
    pub fn filling(total: u64) -> Option<(Void, usize)> {
        if total < 2 {
            return None;
        }
        // One byte of ID, then the smallest size width whose minimum body
        // still fits. Non-minimal size encodings cover the in-between cases.
        for width in 1..=8u64 {
            let body = match total.checked_sub(1 + width) {
                Some(body) => body,
                None => break,
            };
            // All value bits set would be the unknown-size marker.
            if body < (u64::MAX >> (64 - 7 * width)) {
                return Some((Void { size: body }, width as usize));
            }
        }
        None
    }

    /// Encode this Void with a fixed size-field width.
    pub fn encode_sized<B: BufMut>(&self, width: usize, buf: &mut B) -> crate::Result<()> {
        Self::ID.encode(buf)?;
        VInt64::new(self.size).encode_sized(width, buf)?;
        buf.append_slice(&vec![0; self.size as usize]);
        Ok(())
    }
}

/// CRC-32 element, used for integrity checking. The CRC-32 is stored as a little-endian u32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32(pub u32);

impl Deref for Crc32 {
    type Target = u32;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Element for Crc32 {
    const ID: VInt64 = VInt64::from_encoded(0xBF);
    fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
        let buf = <[u8; 4]>::decode_exact(buf, 4)?;
        Ok(Self(u32::from_le_bytes(buf)))
    }
    fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
        buf.append_slice(&self.0.to_le_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_filling_exact_totals() {
        for total in 2..300u64 {
            let (void, width) = Void::filling(total).unwrap();
            let mut out = vec![];
            void.encode_sized(width, &mut out).unwrap();
            assert_eq!(out.len() as u64, total, "total {total}");
        }
        assert!(Void::filling(0).is_none());
        assert!(Void::filling(1).is_none());
    }
}
