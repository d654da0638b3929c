//! The single seekable byte sink a segment file is written through.
//!
//! Rewrites of already-written regions (duration, meta seek, chapter
//! reserve) go through [`Placeholder`] handles, which validate bounds and
//! pad the remainder with a Void filler, and are bracketed with a
//! save-position/restore-position stack so streaming writes continue where
//! they left off.

use std::io::{Seek, SeekFrom, Write};

use crate::error::Error;
use crate::functional::Encode;
use crate::io::WriteTo;
use crate::supplement::Void;

/// A reserved Void region that may later be overwritten with a real
/// element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    /// Absolute file offset of the reserved region.
    pub offset: u64,
    /// Total size of the region in bytes, header included.
    pub reserved: u64,
}

/// A seekable element writer with a saved-position stack.
#[derive(Debug)]
pub struct SeekWriter<W: Write + Seek> {
    inner: W,
    saved: Vec<u64>,
}

impl<W: Write + Seek> SeekWriter<W> {
    /// Wrap a sink.
    pub fn new(inner: W) -> Self {
        SeekWriter {
            inner,
            saved: Vec::new(),
        }
    }

    /// Current byte position.
    pub fn position(&mut self) -> crate::Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Write raw bytes at the current position.
    pub fn write_all(&mut self, data: &[u8]) -> crate::Result<()> {
        self.inner.write_all(data)?;
        Ok(())
    }

    /// Write an encodable value at the current position.
    pub fn write<E: Encode>(&mut self, value: &E) -> crate::Result<()> {
        value.write_to(&mut self.inner)
    }

    /// Push the current position onto the stack and optionally seek.
    pub fn save_pos(&mut self, seek_to: Option<u64>) -> crate::Result<()> {
        let here = self.inner.stream_position()?;
        self.saved.push(here);
        if let Some(pos) = seek_to {
            self.inner.seek(SeekFrom::Start(pos))?;
        }
        Ok(())
    }

    /// Seek back to the most recently saved position.
    pub fn restore_pos(&mut self) -> crate::Result<()> {
        let pos = self
            .saved
            .pop()
            .ok_or_else(|| std::io::Error::other("restore_pos without save_pos"))?;
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Seek to an absolute position.
    pub fn seek_to(&mut self, pos: u64) -> crate::Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Write a Void occupying exactly `total` bytes at the current position
    /// and return a handle for overwriting it later.
    pub fn reserve(&mut self, total: u64) -> crate::Result<Placeholder> {
        let offset = self.position()?;
        self.write_void(total)?;
        Ok(Placeholder {
            offset,
            reserved: total,
        })
    }

    /// Write a Void occupying exactly `total` bytes.
    pub fn write_void(&mut self, total: u64) -> crate::Result<()> {
        let (void, width) = Void::filling(total).ok_or(Error::SpaceReservationOverrun {
            needed: 2,
            reserved: total,
        })?;
        let mut buf = Vec::with_capacity(total as usize);
        void.encode_sized(width, &mut buf)?;
        self.write_all(&buf)
    }

    /// Overwrite a reserved region with `value`, padding what remains with
    /// a fresh Void. The value must either fill the region exactly or leave
    /// at least two bytes for the pad; otherwise the region is left
    /// untouched and [`Error::SpaceReservationOverrun`] is returned.
    pub fn fill(&mut self, placeholder: &Placeholder, value: &impl Encode) -> crate::Result<()> {
        let mut rendered = Vec::new();
        value.encode(&mut rendered)?;
        let needed = rendered.len() as u64;
        let leftover = placeholder.reserved.checked_sub(needed);
        match leftover {
            Some(0) => {}
            Some(pad) if pad >= 2 => {}
            _ => {
                return Err(Error::SpaceReservationOverrun {
                    needed,
                    reserved: placeholder.reserved,
                });
            }
        }

        self.save_pos(Some(placeholder.offset))?;
        self.write_all(&rendered)?;
        if let Some(pad) = leftover.filter(|pad| *pad > 0) {
            self.write_void(pad)?;
        }
        self.restore_pos()
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> crate::Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Unwrap the sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functional::Decode;
    use crate::leaf::CueTime;
    use std::io::Cursor;

    #[test]
    fn save_restore_nest() {
        let mut writer = SeekWriter::new(Cursor::new(Vec::new()));
        writer.write_all(&[0u8; 32]).unwrap();
        writer.save_pos(Some(4)).unwrap();
        writer.write_all(&[1u8; 2]).unwrap();
        writer.save_pos(Some(10)).unwrap();
        writer.write_all(&[2u8; 2]).unwrap();
        writer.restore_pos().unwrap();
        assert_eq!(writer.position().unwrap(), 6);
        writer.restore_pos().unwrap();
        assert_eq!(writer.position().unwrap(), 32);
        assert!(writer.restore_pos().is_err());
    }

    #[test]
    fn reserve_and_fill_pads_with_void() {
        let mut writer = SeekWriter::new(Cursor::new(Vec::new()));
        let placeholder = writer.reserve(64).unwrap();
        writer.write_all(&[0xAA; 4]).unwrap();

        let element = CueTime(777);
        writer.fill(&placeholder, &element).unwrap();
        // writing through the placeholder must not move the tail position
        assert_eq!(writer.position().unwrap(), 68);

        let data = writer.into_inner().into_inner();
        assert_eq!(data.len(), 68);
        // the element sits at the start of the region
        let decoded = CueTime::decode(&mut &data[..]).unwrap();
        assert_eq!(*decoded, 777);
        // and a Void fills the rest up to the guard bytes
        let element_len = {
            let mut buf = Vec::new();
            element.encode(&mut buf).unwrap();
            buf.len()
        };
        let mut rest = &data[element_len..64];
        let void = Void::decode(&mut rest).unwrap();
        assert_eq!(void.size as usize + 2, 64 - element_len);
        assert_eq!(&data[64..], &[0xAA; 4]);
    }

    #[test]
    fn fill_rejects_overrun_and_one_byte_leftover() {
        let mut writer = SeekWriter::new(Cursor::new(Vec::new()));
        let placeholder = writer.reserve(4).unwrap();

        // CueTime(777) takes 4 bytes: exact fit works.
        writer.fill(&placeholder, &CueTime(777)).unwrap();
        // 5 bytes into 4 overruns.
        let err = writer.fill(&placeholder, &CueTime(70000)).unwrap_err();
        assert!(matches!(err, Error::SpaceReservationOverrun { .. }));
        // 3 bytes into 4 leaves a 1-byte hole no Void can fill.
        let err = writer.fill(&placeholder, &CueTime(7)).unwrap_err();
        assert!(matches!(err, Error::SpaceReservationOverrun { .. }));
    }
}
