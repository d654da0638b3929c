//! Packets and the contract between demuxer packetizers and the muxing core.

use std::collections::VecDeque;
use std::fmt::Display;

use bytes::Bytes;

/// Reference timecode value meaning "no reference".
pub const NO_REFERENCE: i64 = -1;

/// Stable identity of a packet source. Assigned by the muxer when the source
/// is registered; packets carry it instead of a pointer to their producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub usize);

impl Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The atomic unit flowing through the muxing pipeline: an opaque payload
/// plus the metadata the cluster assembler needs.
#[derive(Debug, Clone)]
pub struct Packet {
    /// The frame data. Immutable after ingestion; dropped by the reference
    /// resolver once nothing can reference this packet anymore, while the
    /// metadata lives on.
    pub payload: Bytes,
    /// Identity of the producing source. Set when the packet is enqueued.
    pub source_id: SourceId,
    /// Source-native timestamp in nanoseconds. Never negative.
    pub timecode: i64,
    /// Timecode after sync offset and linear drift correction; all mux
    /// decisions use this value.
    pub assigned_timecode: i64,
    /// Duration in nanoseconds, -1 when unknown.
    pub duration: i64,
    /// Forces the duration to be serialised even when it equals the track
    /// default.
    pub duration_mandatory: bool,
    /// Backward reference: the `timecode` of an earlier packet of the same
    /// source this frame depends on, or [`NO_REFERENCE`].
    pub bref: i64,
    /// Forward reference, or [`NO_REFERENCE`].
    pub fref: i64,
    /// Reference priority hint, serialised when non-zero.
    pub ref_priority: u64,

    /// Monotonic ingestion order, assigned by the scheduler. Tie-break for
    /// equal timecodes and for splitpoints.
    pub(crate) sequence_number: u64,
    /// Set by the reference resolver once the source declared everything up
    /// to this packet's timecode free.
    pub(crate) superseded: bool,
    /// Absolute timecode of the BlockGroup this packet was emitted into.
    /// Populated by the cluster assembler; later packets resolve their
    /// references against it.
    pub(crate) group_timecode: Option<i64>,
}

impl Packet {
    /// A packet with the given payload and timecode and no references.
    /// `assigned_timecode` starts out equal to `timecode`; pushing the
    /// packet through a [`PacketQueue`] applies the sync correction.
    pub fn new(payload: Bytes, timecode: i64) -> Self {
        Packet {
            payload,
            source_id: SourceId(0),
            timecode,
            assigned_timecode: timecode,
            duration: -1,
            duration_mandatory: false,
            bref: NO_REFERENCE,
            fref: NO_REFERENCE,
            ref_priority: 0,
            sequence_number: 0,
            superseded: false,
            group_timecode: None,
        }
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = duration;
        self
    }

    /// Set the backward reference timecode.
    pub fn with_bref(mut self, bref: i64) -> Self {
        self.bref = bref;
        self
    }

    /// Set the forward reference timecode.
    pub fn with_fref(mut self, fref: i64) -> Self {
        self.fref = fref;
        self
    }

    /// Whether this packet is a key frame: it references nothing.
    pub fn is_key(&self) -> bool {
        self.bref == NO_REFERENCE && self.fref == NO_REFERENCE
    }
}

/// What a call to [`PacketSource::read`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// Packets may have been enqueued and more are available.
    MoreData,
    /// The source is exhausted.
    NoMoreData,
    /// The source cannot make progress right now (e.g. it waits on data from
    /// another track); it is skipped for this scheduler round and asked
    /// again on the next one.
    Holding,
    /// The source failed. Fatal for this source; the mux continues with the
    /// remaining sources.
    Error,
}

/// The contract every codec packetizer satisfies towards the mux scheduler.
///
/// A source may enqueue any number of packets per `read` call, but packets
/// of one source must leave the queue with non-decreasing
/// `assigned_timecode`s.
pub trait PacketSource {
    /// Produce more packets. May enqueue zero or more.
    fn read(&mut self) -> SourceStatus;

    /// Depth of the output queue.
    fn packet_available(&self) -> usize;

    /// The front of the output queue.
    fn peek(&self) -> Option<&Packet>;

    /// Remove and return the front of the output queue.
    fn pop(&mut self) -> Option<Packet>;

    /// Populate the track descriptor and any codec-private data. Called once
    /// before the first `read`; the returned descriptor is frozen for the
    /// life of the output apart from the fields a [`HeaderUpdate`] may
    /// revise.
    fn set_headers(&mut self) -> crate::Result<crate::track::TrackDescriptor>;

    /// Header fields the source wants to revise after having seen more
    /// data. Polled by the scheduler; a `Some` triggers an in-place rewrite
    /// of the track headers.
    fn header_update(&mut self) -> Option<HeaderUpdate> {
        None
    }

    /// A diagnostic description of the source, for identification output.
    fn identify(&self) -> String;
}

/// Track header fields that may be rewritten after muxing has started.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeaderUpdate {
    /// New default frame duration in nanoseconds.
    pub default_duration_ns: Option<u64>,
    /// New audio output sampling frequency (SBR detection and friends).
    pub output_sampling_frequency: Option<f64>,
}

/// Sync correction applied to every timecode of one source: a linear drift
/// factor and a constant displacement, both from the `--sync` style knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimecodeSync {
    /// Displacement in nanoseconds, added after scaling.
    pub displacement: i64,
    /// Linear drift factor as numerator/denominator.
    pub linear: (u64, u64),
}

impl Default for TimecodeSync {
    fn default() -> Self {
        TimecodeSync {
            displacement: 0,
            linear: (1, 1),
        }
    }
}

impl TimecodeSync {
    /// Apply the correction to a source-native timecode.
    pub fn apply(&self, timecode: i64) -> i64 {
        let (num, den) = self.linear;
        (timecode as i128 * num as i128 / den as i128) as i64 + self.displacement
    }
}

/// A FIFO of packets with the bookkeeping every packetizer needs: sync
/// correction on entry, strict per-source monotonicity, and queued-bytes
/// accounting for backpressure decisions.
#[derive(Debug, Default)]
pub struct PacketQueue {
    queue: VecDeque<Packet>,
    sync: TimecodeSync,
    queued_bytes: u64,
    highest_assigned: i64,
}

impl PacketQueue {
    /// An empty queue applying `sync` to every pushed packet.
    pub fn new(sync: TimecodeSync) -> Self {
        PacketQueue {
            queue: VecDeque::new(),
            sync,
            queued_bytes: 0,
            highest_assigned: 0,
        }
    }

    /// Enqueue a packet, assigning its corrected timecode. Rejects packets
    /// that would move backwards in time.
    pub fn push(&mut self, mut packet: Packet) -> crate::Result<()> {
        packet.assigned_timecode = self.sync.apply(packet.timecode);
        if packet.timecode < 0 || packet.assigned_timecode < self.highest_assigned {
            return Err(crate::Error::TimecodeBackwards {
                source_id: packet.source_id,
                timecode: packet.assigned_timecode,
                previous: self.highest_assigned,
            });
        }
        self.highest_assigned = packet.assigned_timecode;
        self.queued_bytes += packet.payload.len() as u64;
        self.queue.push_back(packet);
        Ok(())
    }

    /// The front of the queue.
    pub fn peek(&self) -> Option<&Packet> {
        self.queue.front()
    }

    /// Remove and return the front of the queue.
    pub fn pop(&mut self) -> Option<Packet> {
        let packet = self.queue.pop_front()?;
        self.queued_bytes -= packet.payload.len() as u64;
        Some(packet)
    }

    /// Number of queued packets.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total payload bytes currently queued.
    pub fn queued_bytes(&self) -> u64 {
        self.queued_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_correction() {
        let sync = TimecodeSync {
            displacement: 500,
            linear: (48000, 48048),
        };
        assert_eq!(sync.apply(0), 500);
        assert_eq!(sync.apply(48048), 48500);
        assert_eq!(TimecodeSync::default().apply(123), 123);
    }

    #[test]
    fn queue_applies_sync_and_counts_bytes() {
        let mut queue = PacketQueue::new(TimecodeSync {
            displacement: 1_000_000,
            linear: (1, 1),
        });
        queue
            .push(Packet::new(Bytes::from_static(&[0; 16]), 0))
            .unwrap();
        queue
            .push(Packet::new(Bytes::from_static(&[0; 8]), 26_000_000))
            .unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.queued_bytes(), 24);
        assert_eq!(queue.peek().unwrap().assigned_timecode, 1_000_000);
        let first = queue.pop().unwrap();
        assert_eq!(first.assigned_timecode, 1_000_000);
        assert_eq!(queue.queued_bytes(), 8);
    }

    #[test]
    fn queue_rejects_backwards_timecodes() {
        let mut queue = PacketQueue::new(TimecodeSync::default());
        queue.push(Packet::new(Bytes::new(), 40)).unwrap();
        let err = queue.push(Packet::new(Bytes::new(), 39)).unwrap_err();
        assert!(matches!(err, crate::Error::TimecodeBackwards { .. }));
        // equal timecodes are fine
        queue.push(Packet::new(Bytes::new(), 40)).unwrap();
    }
}
