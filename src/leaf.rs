#![allow(clippy::doc_lazy_continuation)]
//! Leaf (non-master) elements written by the muxer.
//!
//! Each element is declared through one of the `*_element!` macros below,
//! which expand to the same `Element` impls for the EBML bottom types
//! (unsigned/signed integer, float, text, binary, date) that the Matroska
//! specification defines for them.

use crate::base::VInt64;
use crate::element::Element;
use crate::functional::{Buf, BufMut};

macro_rules! uint_element {
    ($(#[$doc:meta])* $name:ident = $id:literal) => {
        uint_element!(@impl $(#[$doc])* $name, $id, 0, false);
    };
    ($(#[$doc:meta])* $name:ident = $id:literal, default $def:expr) => {
        uint_element!(@impl $(#[$doc])* $name, $id, $def, true);
    };
    (@impl $(#[$doc:meta])* $name:ident, $id:literal, $def:expr, $has_def:literal) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);
        impl std::ops::Deref for $name {
            type Target = u64;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
        impl Default for $name {
            fn default() -> Self {
                Self($def)
            }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            const HAS_DEFAULT_VALUE: bool = $has_def;
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                if buf.is_empty() {
                    return Ok(Self::default());
                }
                if buf.len() > 8 {
                    return Err(crate::Error::UnderDecode(Self::ID));
                }
                let len = buf.len();
                let mut value = [0u8; 8];
                value[8 - len..].copy_from_slice(&buf[..len]);
                buf.advance(len);
                Ok(Self(u64::from_be_bytes(value)))
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                let bytes = self.0.to_be_bytes();
                let first_non_zero = bytes
                    .iter()
                    .position(|&b| b != 0)
                    .unwrap_or(bytes.len() - 1);
                buf.append_slice(&bytes[first_non_zero..]);
                Ok(())
            }
        }
    };
}

macro_rules! sint_element {
    ($(#[$doc:meta])* $name:ident = $id:literal) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);
        impl std::ops::Deref for $name {
            type Target = i64;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
        impl Default for $name {
            fn default() -> Self {
                Self(0)
            }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                if buf.is_empty() {
                    return Ok(Self(0));
                }
                if buf.len() > 8 {
                    return Err(crate::Error::UnderDecode(Self::ID));
                }
                let len = buf.len();
                let is_neg = (buf[0] & 0x80) != 0;
                let mut value = if is_neg { [0xFFu8; 8] } else { [0u8; 8] };
                value[8 - len..].copy_from_slice(&buf[..len]);
                buf.advance(len);
                Ok(Self(i64::from_be_bytes(value)))
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                let bytes = self.0.to_be_bytes();
                if self.0 >= 0 {
                    let first_non_zero = bytes
                        .iter()
                        .position(|&b| b != 0)
                        .unwrap_or(bytes.len() - 1);
                    // Keep a leading zero byte when the top bit would flip the sign.
                    let start = if bytes[first_non_zero] & 0x80 != 0 && first_non_zero > 0 {
                        first_non_zero - 1
                    } else {
                        first_non_zero
                    };
                    buf.append_slice(&bytes[start..]);
                } else {
                    let first_non_ff = bytes
                        .iter()
                        .position(|&b| b != 0xFF)
                        .unwrap_or(bytes.len() - 1);
                    let start = if bytes[first_non_ff] & 0x80 == 0 && first_non_ff > 0 {
                        first_non_ff - 1
                    } else {
                        first_non_ff
                    };
                    buf.append_slice(&bytes[start..]);
                }
                Ok(())
            }
        }
    };
}

macro_rules! float_element {
    ($(#[$doc:meta])* $name:ident = $id:literal) => {
        float_element!(@impl $(#[$doc])* $name, $id, 0.0, false);
    };
    ($(#[$doc:meta])* $name:ident = $id:literal, default $def:expr) => {
        float_element!(@impl $(#[$doc])* $name, $id, $def, true);
    };
    (@impl $(#[$doc:meta])* $name:ident, $id:literal, $def:expr, $has_def:literal) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
        pub struct $name(pub f64);
        impl std::ops::Deref for $name {
            type Target = f64;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
        impl Default for $name {
            fn default() -> Self {
                Self($def)
            }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            const HAS_DEFAULT_VALUE: bool = $has_def;
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                match buf.len() {
                    0 => Ok(Self::default()),
                    4 => {
                        let mut value = [0u8; 4];
                        value.copy_from_slice(&buf[..4]);
                        buf.advance(4);
                        Ok(Self(f32::from_be_bytes(value) as f64))
                    }
                    8 => {
                        let mut value = [0u8; 8];
                        value.copy_from_slice(&buf[..8]);
                        buf.advance(8);
                        Ok(Self(f64::from_be_bytes(value)))
                    }
                    _ => Err(crate::Error::UnderDecode(Self::ID)),
                }
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                if can_represent_as_f32(self.0) {
                    buf.append_slice(&(self.0 as f32).to_be_bytes());
                } else {
                    buf.append_slice(&self.0.to_be_bytes());
                }
                Ok(())
            }
        }
    };
}

/// Like `float_element!`, but always encoded as eight bytes so the element
/// can be rewritten in place without changing its size.
macro_rules! float8_element {
    ($(#[$doc:meta])* $name:ident = $id:literal) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
        pub struct $name(pub f64);
        impl std::ops::Deref for $name {
            type Target = f64;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
        impl Default for $name {
            fn default() -> Self {
                Self(0.0)
            }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                match buf.len() {
                    0 => Ok(Self(0.0)),
                    4 => {
                        let mut value = [0u8; 4];
                        value.copy_from_slice(&buf[..4]);
                        buf.advance(4);
                        Ok(Self(f32::from_be_bytes(value) as f64))
                    }
                    8 => {
                        let mut value = [0u8; 8];
                        value.copy_from_slice(&buf[..8]);
                        buf.advance(8);
                        Ok(Self(f64::from_be_bytes(value)))
                    }
                    _ => Err(crate::Error::UnderDecode(Self::ID)),
                }
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                buf.append_slice(&self.0.to_be_bytes());
                Ok(())
            }
        }
    };
}

macro_rules! text_element {
    ($(#[$doc:meta])* $name:ident = $id:literal) => {
        text_element!(@impl $(#[$doc])* $name, $id, "", false);
    };
    ($(#[$doc:meta])* $name:ident = $id:literal, default $def:literal) => {
        text_element!(@impl $(#[$doc])* $name, $id, $def, true);
    };
    (@impl $(#[$doc:meta])* $name:ident, $id:literal, $def:literal, $has_def:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub String);
        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
        impl Default for $name {
            fn default() -> Self {
                Self($def.to_string())
            }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            const HAS_DEFAULT_VALUE: bool = $has_def;
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                if buf.is_empty() {
                    return Ok(Self::default());
                }
                let first_zero = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
                let result = Self(String::from_utf8_lossy(&buf[..first_zero]).to_string());
                buf.advance(buf.len());
                Ok(result)
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                buf.append_slice(self.0.as_bytes());
                Ok(())
            }
        }
    };
}

macro_rules! bin_element {
    ($(#[$doc:meta])* $name:ident = $id:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub Vec<u8>);
        impl std::ops::Deref for $name {
            type Target = [u8];
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
        impl Default for $name {
            fn default() -> Self {
                Self(Vec::new())
            }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                let result = Self(buf.to_vec());
                buf.advance(buf.len());
                Ok(result)
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                buf.append_slice(&self.0);
                Ok(())
            }
        }
    };
}

macro_rules! date_element {
    ($(#[$doc:meta])* $name:ident = $id:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);
        impl std::ops::Deref for $name {
            type Target = i64;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
        impl Default for $name {
            fn default() -> Self {
                Self(0)
            }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                if buf.len() != 8 {
                    return Err(crate::Error::UnderDecode(Self::ID));
                }
                let mut value = [0u8; 8];
                value.copy_from_slice(&buf[..8]);
                buf.advance(8);
                Ok(Self(i64::from_be_bytes(value)))
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                buf.append_slice(&self.0.to_be_bytes());
                Ok(())
            }
        }
    };
}

fn can_represent_as_f32(value: f64) -> bool {
    if value.is_infinite() || value.is_nan() {
        return false;
    }
    if value.abs() > f32::MAX as f64 || (value != 0.0 && value.abs() < f32::MIN_POSITIVE as f64) {
        return false;
    }
    let f32_value = value as f32;
    f32_value as f64 == value
}

// ---------------------------------------------------------------------------
// EBML head

uint_element! {
    /// EBMLVersion element, indicates the version of EBML used.
    EbmlVersion = 0x4286, default 1
}
uint_element! {
    /// EBMLReadVersion element, indicates the minimum EBML version required to read the file.
    EbmlReadVersion = 0x42F7, default 1
}
uint_element! {
    /// The maximum length of the IDs found in this file, in bytes.
    EbmlMaxIdLength = 0x42F2, default 4
}
uint_element! {
    /// The maximum length of the sizes found in this file, in bytes.
    EbmlMaxSizeLength = 0x42F3, default 8
}
text_element! {
    /// DocType element, indicates the type of the document.
    DocType = 0x4282, default "matroska"
}
uint_element! {
    /// DocTypeVersion element, indicates the version of the document type.
    DocTypeVersion = 0x4287, default 1
}
uint_element! {
    /// DocTypeReadVersion element, indicates the minimum document type version required to read the file.
    DocTypeReadVersion = 0x4285, default 1
}

// ---------------------------------------------------------------------------
// SeekHead

bin_element! {
    /// The binary EBML ID of a Top-Level Element.
    SeekId = 0x53AB
}
uint_element! {
    /// The Segment Position of a Top-Level Element.
    SeekPosition = 0x53AC
}

// ---------------------------------------------------------------------------
// Segment info

bin_element! {
    /// A randomly generated unique ID to identify the Segment amongst many others (128 bits).
    SegmentUuid = 0x73A4
}
text_element! {
    /// A filename corresponding to this Segment.
    SegmentFilename = 0x7384
}
bin_element! {
    /// An ID to identify the previous Segment of a Linked Segment.
    PrevUuid = 0x3CB923
}
text_element! {
    /// A filename corresponding to the file of the previous Linked Segment.
    PrevFilename = 0x3C83AB
}
bin_element! {
    /// An ID to identify the next Segment of a Linked Segment.
    NextUuid = 0x3EB923
}
text_element! {
    /// A filename corresponding to the file of the next Linked Segment.
    NextFilename = 0x3E83BB
}
uint_element! {
    /// Base unit for Segment Ticks and Track Ticks, in nanoseconds.
    /// A TimestampScale value of 1000000 means scaled timestamps in the Segment are expressed in milliseconds.
    TimestampScale = 0x2AD7B1, default 1_000_000
}
float8_element! {
    /// Duration of the Segment, expressed in Segment Ticks.
    /// Pinned to eight bytes: it is rendered as a placeholder first and
    /// rewritten in place once the last cluster is known.
    Duration = 0x4489
}
date_element! {
    /// The date and time that the Segment was created by the muxing application or library,
    /// in nanoseconds since 2001-01-01T00:00:00 UTC.
    DateUtc = 0x4461
}
text_element! {
    /// General name of the Segment.
    Title = 0x7BA9
}
text_element! {
    /// Muxing application or library.
    MuxingApp = 0x4D80
}
text_element! {
    /// Writing application.
    WritingApp = 0x5741
}

// ---------------------------------------------------------------------------
// Tracks

uint_element! {
    /// The track number as used in the Block Header.
    TrackNumber = 0xD7
}
uint_element! {
    /// A unique ID to identify the Track.
    TrackUid = 0x73C5
}
uint_element! {
    /// The type of the track: 1 video, 2 audio, 17 subtitle.
    TrackType = 0x83
}
uint_element! {
    /// Set if the track is usable.
    FlagEnabled = 0xB9, default 1
}
uint_element! {
    /// Set if that track (audio, video or subs) is eligible for automatic selection by the player.
    FlagDefault = 0x88, default 1
}
uint_element! {
    /// Set if the track **MUST** be played, for example because it contains forced subtitles.
    FlagForced = 0x55AA, default 0
}
uint_element! {
    /// Set if the track **MAY** contain blocks using lacing.
    FlagLacing = 0x9C, default 1
}
uint_element! {
    /// The minimum number of frames a player should be able to cache during playback.
    MinCache = 0x6DE7, default 0
}
uint_element! {
    /// The maximum cache size necessary to store referenced frames and the current frame.
    MaxCache = 0x6DF8
}
uint_element! {
    /// Number of nanoseconds per frame, frame being the unit described by the codec.
    DefaultDuration = 0x23E383
}
text_element! {
    /// A human-readable track name.
    Name = 0x536E
}
text_element! {
    /// The language of the track, in the Matroska languages form (ISO 639-2).
    Language = 0x22B59C, default "eng"
}
text_element! {
    /// An ID corresponding to the codec.
    CodecId = 0x86
}
bin_element! {
    /// Private data only known to the codec.
    CodecPrivate = 0x63A2
}

// Audio

float_element! {
    /// Sampling frequency in Hz.
    SamplingFrequency = 0xB5, default hexf::hexf64!("0x1.f4p12")
}
float_element! {
    /// Real output sampling frequency in Hz, used for SBR techniques.
    OutputSamplingFrequency = 0x78B5
}
uint_element! {
    /// Numbers of channels in the track.
    Channels = 0x9F, default 1
}
uint_element! {
    /// Bits per sample, mostly used for PCM.
    BitDepth = 0x6264
}

// Video

uint_element! {
    /// Width of the encoded video frames in pixels.
    PixelWidth = 0xB0
}
uint_element! {
    /// Height of the encoded video frames in pixels.
    PixelHeight = 0xBA
}
uint_element! {
    /// Width of the video frames to display, accounting for aspect ratio.
    DisplayWidth = 0x54B0
}
uint_element! {
    /// Height of the video frames to display, accounting for aspect ratio.
    DisplayHeight = 0x54BA
}

// Content encoding (compression signalling)

uint_element! {
    /// Order of the content encoding, smallest applied last on writing.
    ContentEncodingOrder = 0x5031, default 0
}
uint_element! {
    /// A bit field describing which elements have been modified: 1 blocks, 2 codec private, 4 next encoding.
    ContentEncodingScope = 0x5032, default 1
}
uint_element! {
    /// The transformation kind: 0 compression, 1 encryption.
    ContentEncodingType = 0x5033, default 0
}
uint_element! {
    /// The compression algorithm used: 0 zlib, 1 bzlib, 2 lzo1x.
    ContentCompAlgo = 0x4254, default 0
}
bin_element! {
    /// Settings that might be needed by the decompressor.
    ContentCompSettings = 0x4255
}

// ---------------------------------------------------------------------------
// Cluster

uint_element! {
    /// Absolute timestamp of the cluster, expressed in Segment Ticks.
    Timestamp = 0xE7
}
uint_element! {
    /// The Segment Position of the Cluster in the Segment.
    Position = 0xA7
}
uint_element! {
    /// Size of the previous Cluster, in octets. Can be useful for backward playing.
    PrevSize = 0xAB
}
bin_element! {
    /// Block containing the actual data to be rendered and a timestamp
    /// relative to the Cluster Timestamp.
    Block = 0xA1
}
uint_element! {
    /// The duration of the Block, expressed in Track Ticks.
    BlockDuration = 0x9B
}
uint_element! {
    /// This frame is referenced and has the specified cache priority.
    /// A value of 0 means the frame is not referenced.
    ReferencePriority = 0xFA, default 0
}
sint_element! {
    /// A timestamp value, relative to the timestamp of the Block in this
    /// BlockGroup, expressed in Track Ticks. Used to reference other frames
    /// necessary to decode this frame.
    ReferenceBlock = 0xFB
}
uint_element! {
    /// The number of the frame to generate from this lace with this delay.
    SliceFrameNumber = 0xCD, default 0
}
uint_element! {
    /// The duration of the lace, in Track Ticks.
    SliceDuration = 0xCF
}

// ---------------------------------------------------------------------------
// Cues

uint_element! {
    /// Absolute timestamp of the seek point, expressed in Segment Ticks.
    CueTime = 0xB3
}
uint_element! {
    /// The track for which a position is given.
    CueTrack = 0xF7
}
uint_element! {
    /// The Segment Position of the Cluster containing the associated Block.
    CueClusterPosition = 0xF1
}
uint_element! {
    /// Number of the Block in the specified Cluster.
    CueBlockNumber = 0x5378, default 1
}

// ---------------------------------------------------------------------------
// Chapters

uint_element! {
    /// A unique ID to identify the edition.
    EditionUid = 0x45BC
}
uint_element! {
    /// Set to hide the edition in the user interface.
    EditionFlagHidden = 0x45BD, default 0
}
uint_element! {
    /// Set if the edition should be used as the default one.
    EditionFlagDefault = 0x45DB, default 0
}
uint_element! {
    /// A unique ID to identify the chapter.
    ChapterUid = 0x73C4
}
uint_element! {
    /// Timestamp of the start of the chapter, expressed in Matroska Ticks (nanoseconds).
    ChapterTimeStart = 0x91
}
uint_element! {
    /// Timestamp of the end of the chapter, expressed in Matroska Ticks (nanoseconds).
    ChapterTimeEnd = 0x92
}
uint_element! {
    /// Set to hide the chapter in the user interface.
    ChapterFlagHidden = 0x98, default 0
}
uint_element! {
    /// Set if the chapter is enabled.
    ChapterFlagEnabled = 0x4598, default 1
}
uint_element! {
    /// The UID of a Track the chapter applies to.
    ChapterTrackNumber = 0x89
}
text_element! {
    /// The string to use for this chapter.
    ChapString = 0x85
}
text_element! {
    /// A language corresponding to the chapter string.
    ChapLanguage = 0x437C, default "eng"
}
text_element! {
    /// A country corresponding to the string.
    ChapCountry = 0x437E
}

// ---------------------------------------------------------------------------
// Tags

uint_element! {
    /// A number to indicate the logical level of the tag target.
    TargetTypeValue = 0x68CA, default 50
}
uint_element! {
    /// A UID of a track the tags belong to.
    TagTrackUid = 0x63C5, default 0
}
uint_element! {
    /// A UID of a chapter the tags belong to.
    TagChapterUid = 0x63C4, default 0
}
uint_element! {
    /// A UID of an attachment the tags belong to.
    TagAttachmentUid = 0x63C6, default 0
}
text_element! {
    /// The name of the tag value that is going to be stored.
    TagName = 0x45A3
}
text_element! {
    /// The language of the tag.
    TagLanguage = 0x447A, default "und"
}
uint_element! {
    /// Set if this is the default or original language for this tag.
    TagDefault = 0x4484, default 1
}
text_element! {
    /// The tag value.
    TagString = 0x4487
}
bin_element! {
    /// The tag value if it is binary.
    TagBinary = 0x4485
}

// ---------------------------------------------------------------------------
// Attachments

text_element! {
    /// A human-friendly name for the attached file.
    FileDescription = 0x467E
}
text_element! {
    /// Filename of the attached file.
    FileName = 0x466E
}
text_element! {
    /// Media type of the file following the format described in RFC 6838.
    FileMimeType = 0x4660
}
bin_element! {
    /// The data of the file.
    FileData = 0x465C
}
uint_element! {
    /// A UID to identify the attached file.
    FileUid = 0x46AE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functional::{Decode, Encode};

    #[test]
    fn uint_body_coding() {
        let pairs: &[(&[u8], u64)] = &[
            (&[], 0),
            (&[1], 1),
            (&[0xFF], 255),
            (&[0x01, 0x00], 256),
            (&[0x01, 0x00, 0x00, 0x00], 1 << 24),
            (&[0xFF; 8], u64::MAX),
        ];
        for (encoded, value) in pairs {
            let decoded = TrackNumber::decode_body(&mut &encoded[..]).unwrap();
            assert_eq!(*decoded, *value);
            if !encoded.is_empty() {
                let mut out = vec![];
                TrackNumber(*value).encode_body(&mut out).unwrap();
                assert_eq!(&out, encoded);
            }
        }
        // zero still encodes one byte
        let mut out = vec![];
        TrackNumber(0).encode_body(&mut out).unwrap();
        assert_eq!(out, vec![0]);
    }

    #[test]
    fn sint_body_coding() {
        for value in [-300i64, -129, -128, -1, 0, 1, 127, 128, 300] {
            let mut out = vec![];
            ReferenceBlock(value).encode_body(&mut out).unwrap();
            let decoded = ReferenceBlock::decode_body(&mut &out[..]).unwrap();
            assert_eq!(*decoded, value, "value {value} via {out:?}");
        }
        // -40 must stay one byte: the common P-frame backward reference.
        let mut out = vec![];
        ReferenceBlock(-40).encode_body(&mut out).unwrap();
        assert_eq!(out, vec![0xD8]);
    }

    #[test]
    fn defaults() {
        assert_eq!(*TimestampScale::default(), 1_000_000);
        assert_eq!(*SamplingFrequency::default(), 8000.0);
        assert_eq!(&*Language::default(), "eng");
        assert!(TimestampScale::HAS_DEFAULT_VALUE);
        assert!(!TrackNumber::HAS_DEFAULT_VALUE);
    }

    #[test]
    fn duration_is_always_eight_bytes() {
        let mut out = vec![];
        Duration(0.0).encode(&mut out).unwrap();
        let placeholder_len = out.len();
        let mut out2 = vec![];
        Duration(123456.789).encode(&mut out2).unwrap();
        assert_eq!(placeholder_len, out2.len());
        let decoded = Duration::decode(&mut &out2[..]).unwrap();
        assert_eq!(*decoded, 123456.789);
    }
}
