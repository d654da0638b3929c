//! Handler for lacing and delacing operations on frame data.

use crate::Error;
use crate::base::VInt64;
use crate::functional::{Buf, Decode, Encode};

/// Handler for lacing and delacing operations on frame data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lacer {
    /// Xiph lacing (variable-size frames with 255-split size prefixes)
    Xiph,
    /// Fixed-size lacing (all frames have the same size)
    FixedSize,
    /// EBML lacing (first size as a vint, then signed vint deltas)
    Ebml,
}

impl Lacer {
    /// The two lacing bits for the Block flags byte (bits 1-2).
    pub fn flag_bits(&self) -> u8 {
        match self {
            Lacer::Xiph => 0b01 << 1,
            Lacer::FixedSize => 0b10 << 1,
            Lacer::Ebml => 0b11 << 1,
        }
    }

    /// The lacer corresponding to the lacing bits of a Block flags byte,
    /// `None` when the block is not laced.
    pub fn from_flags(flags: u8) -> Option<Self> {
        match (flags >> 1) & 0x03 {
            0b01 => Some(Lacer::Xiph),
            0b10 => Some(Lacer::FixedSize),
            0b11 => Some(Lacer::Ebml),
            _ => None,
        }
    }

    /// Encode multiple frames into a single laced block body (lace head
    /// followed by the concatenated frame data).
    pub fn lace(&self, frames: &[&[u8]]) -> crate::Result<Vec<u8>> {
        if frames.is_empty() {
            return Ok(vec![]);
        }
        let num_frames = frames.len();
        let mut output = vec![];
        output.push((num_frames - 1) as u8); // Number of frames - 1

        match self {
            Lacer::Xiph => {
                for frame in &frames[..num_frames - 1] {
                    let mut size = frame.len();
                    while size >= 0xFF {
                        output.push(0xFF);
                        size -= 0xFF;
                    }
                    output.push(size as u8);
                }
            }
            Lacer::FixedSize => {
                // The size of every frame is deduced from the count; they
                // must all be equal.
                if frames.iter().any(|f| f.len() != frames[0].len()) {
                    return Err(Error::MalformedLacingData);
                }
            }
            Lacer::Ebml => {
                VInt64::new(frames[0].len() as u64)
                    .encode(&mut output)
                    .map_err(|_| Error::MalformedLacingData)?;
                let mut previous = frames[0].len() as i64;
                for frame in &frames[1..num_frames - 1] {
                    let diff = frame.len() as i64 - previous;
                    encode_signed_vint(diff, &mut output);
                    previous = frame.len() as i64;
                }
            }
        }

        for frame in frames {
            output.extend_from_slice(frame);
        }
        Ok(output)
    }

    /// Decode a laced block body into individual frames.
    pub fn delace<'a>(&self, data: &'a [u8]) -> crate::Result<Vec<&'a [u8]>> {
        if data.is_empty() {
            return Ok(vec![]);
        }

        let num_frames = data[0] as usize + 1;
        if num_frames == 1 {
            return Ok(vec![&data[1..]]);
        }

        match self {
            Lacer::Xiph => {
                let mut out = Vec::with_capacity(num_frames);

                let data_start_pos = data
                    .iter()
                    .enumerate()
                    .skip(1)
                    .filter(|(_, b)| **b != 0xFF)
                    .nth(num_frames - 2)
                    .map(|(i, _)| i)
                    .ok_or(Error::MalformedLacingData)?
                    + 1;

                let laced_data = data
                    .get(data_start_pos..)
                    .ok_or(Error::MalformedLacingData)?;

                let mut start = 0;
                for size in data[1..data_start_pos]
                    .split_inclusive(|b| *b != 0xFF)
                    .map(|chunk| chunk.iter().map(|b| *b as usize).sum::<usize>())
                {
                    out.push(
                        laced_data
                            .get(start..start + size)
                            .ok_or(Error::MalformedLacingData)?,
                    );
                    start += size;
                }
                out.push(laced_data.get(start..).ok_or(Error::MalformedLacingData)?);
                Ok(out)
            }
            Lacer::FixedSize => {
                let payload = &data[1..];
                if payload.len() % num_frames != 0 {
                    return Err(Error::MalformedLacingData);
                }
                Ok(payload.chunks_exact(payload.len() / num_frames).collect())
            }
            Lacer::Ebml => {
                let mut head = &data[1..];
                let mut sizes = Vec::with_capacity(num_frames - 1);
                let first =
                    VInt64::decode(&mut head).map_err(|_| Error::MalformedLacingData)?;
                sizes.push(*first as i64);
                for _ in 1..num_frames - 1 {
                    let diff = decode_signed_vint(&mut head)?;
                    let previous = *sizes.last().unwrap_or(&0);
                    sizes.push(previous + diff);
                }

                let laced_data = head;
                let mut out = Vec::with_capacity(num_frames);
                let mut start = 0usize;
                for size in sizes {
                    let size = usize::try_from(size).map_err(|_| Error::MalformedLacingData)?;
                    out.push(
                        laced_data
                            .get(start..start + size)
                            .ok_or(Error::MalformedLacingData)?,
                    );
                    start += size;
                }
                out.push(laced_data.get(start..).ok_or(Error::MalformedLacingData)?);
                Ok(out)
            }
        }
    }
}

// Signed vints shift the unsigned range down by half: a value encoded in n
// bytes carries value - (2^(7n-1) - 1).
fn encode_signed_vint(value: i64, out: &mut Vec<u8>) {
    let mut width = 1usize;
    while width < 8 {
        let half = (1i64 << (7 * width - 1)) - 1;
        if value >= -half && value <= half {
            break;
        }
        width += 1;
    }
    let bias = (1i64 << (7 * width - 1)) - 1;
    let unsigned = (value + bias) as u64;
    let mut bytes = [0u8; 8];
    bytes[8 - width..].copy_from_slice(&unsigned.to_be_bytes()[8 - width..]);
    bytes[8 - width] |= 1u8 << (8 - width);
    out.extend_from_slice(&bytes[8 - width..]);
}

fn decode_signed_vint(buf: &mut &[u8]) -> crate::Result<i64> {
    if !buf.has_remaining() {
        return Err(Error::MalformedLacingData);
    }
    let width = buf[0].leading_zeros() as usize + 1;
    if width > 8 {
        return Err(Error::MalformedLacingData);
    }
    let v = VInt64::decode(buf).map_err(|_| Error::MalformedLacingData)?;
    let bias = (1i64 << (7 * width - 1)) - 1;
    Ok(*v as i64 - bias)
}
