//! Blocking I/O: reading and writing elements through `std::io` streams.

use crate::{base::Header, element::Element, functional::Encode};
use std::io::{Read, Write};

/// Convenience reads for primitive values.
pub trait ReadExt: Read {
    /// Read a single byte.
    fn read_u8(&mut self) -> std::io::Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}
impl<R: Read> ReadExt for R {}

/// Read from a reader.
pub trait ReadFrom: Sized {
    /// Read Self from a reader.
    fn read_from<R: Read>(r: &mut R) -> crate::Result<Self>;
}

/// Read an element from a reader provided the header.
pub trait ReadElement: Sized + Element {
    /// Read an element from a reader provided the header.
    fn read_element<R: Read>(header: &Header, r: &mut R) -> crate::Result<Self> {
        let body = header.read_body(r)?;
        Self::decode_body(&mut &body[..])
    }
}
impl<T: Element> ReadElement for T {}

impl Header {
    /// Read the body of the element from a reader into memory.
    pub(crate) fn read_body<R: Read>(&self, r: &mut R) -> crate::Result<Vec<u8>> {
        let size = if self.size.is_unknown {
            // Segment and Cluster may carry unknown sizes mid-write; a
            // finished file has them fixed up, so reading one is an error.
            return Err(crate::Error::ElementBodySizeUnknown(self.id));
        } else {
            *self.size
        };
        // we allocate 4096 bytes upfront and grow as needed
        let cap = size.min(4096) as usize;
        let mut buf = Vec::with_capacity(cap);
        let n = std::io::copy(&mut r.take(size), &mut buf)?;
        if size != n {
            return Err(crate::Error::OutOfBounds);
        }
        Ok(buf)
    }
}

/// Write to a writer.
pub trait WriteTo {
    /// Write to a writer.
    fn write_to<W: Write>(&self, w: &mut W) -> crate::Result<()>;
}

impl<T: Encode> WriteTo for T {
    fn write_to<W: Write>(&self, w: &mut W) -> crate::Result<()> {
        let mut buf = vec![];
        self.encode(&mut buf)?;
        w.write_all(&buf)?;
        Ok(())
    }
}
