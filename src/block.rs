//! Encoding and decoding of Block element bodies.
//!
//! A Block body is the track number as a vint, a signed 16-bit timecode
//! relative to the enclosing Cluster's timestamp, one flags byte, and the
//! frame data (laced when the flags say so).

use crate::base::VInt64;
use crate::error::Error;
use crate::functional::{Decode, Encode};
use crate::lacer::Lacer;
use crate::leaf::Block;

/// Flag bit: the frame is invisible and the duration of this block is 0.
pub const BLOCK_FLAG_INVISIBLE: u8 = 0x08;

/// Encode a block body carrying `frames` of track `track_number` at
/// `relative_timecode` ticks from the cluster timestamp. More than one frame
/// requires a `lacer`; exactly one frame is written unlaced regardless.
pub fn encode_block(
    track_number: u64,
    relative_timecode: i16,
    lacer: Option<Lacer>,
    frames: &[&[u8]],
) -> crate::Result<Block> {
    let mut body = Vec::new();
    VInt64::new(track_number).encode(&mut body)?;
    relative_timecode.encode(&mut body)?;

    match frames {
        [] => return Err(Error::MalformedLacingData),
        [single] => {
            body.push(0);
            body.extend_from_slice(single);
        }
        _ => {
            let lacer = lacer.ok_or(Error::MalformedLacingData)?;
            body.push(lacer.flag_bits());
            body.extend_from_slice(&lacer.lace(frames)?);
        }
    }

    Ok(Block(body))
}

/// A decoded view of a Block body. Frames borrow from the body.
#[derive(Debug, PartialEq, Eq)]
pub struct BlockView<'a> {
    /// The track number this block belongs to.
    pub track_number: u64,
    /// Timecode in ticks, relative to the enclosing cluster's timestamp.
    pub relative_timecode: i16,
    /// The raw flags byte.
    pub flags: u8,
    /// The frames carried by the block, delaced.
    pub frames: Vec<&'a [u8]>,
}

impl<'a> BlockView<'a> {
    /// Parse a block body.
    pub fn parse(body: &'a [u8]) -> crate::Result<Self> {
        let mut buf = body;
        let track_number = VInt64::decode(&mut buf)?;
        let relative_timecode = i16::decode(&mut buf)?;
        let flags = u8::decode(&mut buf)?;

        let frames = match Lacer::from_flags(flags) {
            None => vec![buf],
            Some(lacer) => lacer.delace(buf)?,
        };

        Ok(BlockView {
            track_number: *track_number,
            relative_timecode,
            flags,
            frames,
        })
    }
}
