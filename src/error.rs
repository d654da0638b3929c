use crate::base::VInt64;
use crate::packet::SourceId;

/// Error types for this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error, from `std::io::Error`. Writer seek/write failures end up here.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid variable-length integer encoding, indicates a vint longer than 8 bytes.
    #[error("Invalid variable-length integer encoding, 8 leading zeros found...")]
    InvalidVInt,

    /// A value does not fit the number of vint bytes it was asked to occupy.
    #[error("Value {value} does not fit a {width}-byte variable-length integer")]
    VIntWidth {
        /// The value that was to be encoded.
        value: u64,
        /// The requested encoded width in bytes.
        width: usize,
    },

    /// Attempted to read past the end of the buffer.
    #[error("Attempted to read past the end of the buffer")]
    OutOfBounds,

    /// Attempted to read past the end of the buffer during element body decoding.
    #[error("Element body over decode, ID: {0}")]
    OverDecode(VInt64),

    /// Not all bytes were consumed in a element body
    #[error("Short read: not all bytes were consumed")]
    ShortRead,

    /// Not all bytes were consumed in a element body during element body decoding.
    #[error("Element body under decode, ID: {0}")]
    UnderDecode(VInt64),

    /// Missing element.
    #[error("Missing element, ID: {0}")]
    MissingElement(VInt64),

    /// Duplicate element in a master element.
    #[error("Duplicate element {id} in master element {parent}")]
    DuplicateElement {
        /// The duplicate element ID.
        id: VInt64,
        /// The parent master element ID.
        parent: VInt64,
    },

    /// Element body size is unknown.
    #[error("Element body size is unknown, ID: {0}")]
    ElementBodySizeUnknown(VInt64),

    /// Malformed lacing data.
    #[error("Malformed lacing data")]
    MalformedLacingData,

    /// Contradictory or out-of-range muxer configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A packet source failed to produce a packet. Fatal for that source.
    #[error("Source {source_id} failed to produce a packet")]
    SourceError {
        /// The failed source.
        source_id: SourceId,
    },

    /// A block names a backward or forward reference timecode that cannot be
    /// matched to any packet of the same source.
    #[error(
        "Packet of source {source_id} at {timecode}ns references {ref_timecode}ns, \
         which cannot be resolved"
    )]
    ReferenceUnresolved {
        /// The source whose packet carries the dangling reference.
        source_id: SourceId,
        /// Timecode of the referencing packet, in nanoseconds.
        timecode: i64,
        /// The reference timecode that could not be located.
        ref_timecode: i64,
    },

    /// A rewritten element did not fit the Void space reserved for it.
    /// Recoverable: callers skip the rewrite and keep the file valid.
    #[error("Element of {needed} bytes does not fit the {reserved} bytes reserved for it")]
    SpaceReservationOverrun {
        /// Bytes the element needs.
        needed: u64,
        /// Bytes that were reserved.
        reserved: u64,
    },

    /// A source violated strict per-source timecode monotonicity.
    #[error(
        "Source {source_id} went backwards in time: {timecode}ns after {previous}ns"
    )]
    TimecodeBackwards {
        /// The offending source.
        source_id: SourceId,
        /// The out-of-order timecode, in nanoseconds.
        timecode: i64,
        /// The highest timecode previously seen from this source.
        previous: i64,
    },
}

impl Error {
    /// Whether the error leaves the output file valid after the closure path
    /// has run (warnings), as opposed to aborting the mux (fatal).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::SpaceReservationOverrun { .. })
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
