//! Shared helpers for the integration tests: an in-memory seekable sink,
//! an output provider over it, and scripted packet sources.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use mkv_mux::packet::{
    Packet, PacketQueue, PacketSource, SourceStatus, TimecodeSync,
};
use mkv_mux::split::OutputProvider;
use mkv_mux::track::{AudioParams, MediaKind, TrackDescriptor, VideoParams};

/// A `Write + Seek` sink over a shared byte vector, so the test can read
/// what the muxer wrote after the provider has been consumed.
#[derive(Debug, Clone, Default)]
pub struct SharedSink {
    data: Arc<Mutex<Vec<u8>>>,
    position: u64,
}

impl SharedSink {
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut data = self.data.lock().unwrap();
        let position = self.position as usize;
        if position > data.len() {
            data.resize(position, 0);
        }
        let overlap = (data.len() - position).min(buf.len());
        data[position..position + overlap].copy_from_slice(&buf[..overlap]);
        data.extend_from_slice(&buf[overlap..]);
        self.position += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Seek for SharedSink {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let len = self.data.lock().unwrap().len() as i64;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => len + offset,
            SeekFrom::Current(offset) => self.position as i64 + offset,
        };
        if target < 0 {
            return Err(std::io::Error::other("seek before start"));
        }
        self.position = target as u64;
        Ok(self.position)
    }
}

/// Collects one `SharedSink` per output file.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    files: Arc<Mutex<Vec<SharedSink>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        MemoryOutput::default()
    }

    /// Snapshots of every file written so far.
    pub fn files(&self) -> Vec<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .map(|sink| sink.contents())
            .collect()
    }
}

impl OutputProvider for MemoryOutput {
    type Sink = SharedSink;

    fn open(&mut self, file_num: u64) -> std::io::Result<(SharedSink, String)> {
        let sink = SharedSink::default();
        self.files.lock().unwrap().push(sink.clone());
        Ok((sink, format!("out-{file_num:03}.mkv")))
    }
}

/// A source that replays a fixed list of packets, one per `read` call.
pub struct ScriptedSource {
    descriptor: TrackDescriptor,
    pending: VecDeque<Packet>,
    queue: PacketQueue,
    /// Set the flag once this many packets have been produced.
    trip: Option<(usize, Arc<AtomicBool>)>,
    produced: usize,
}

impl ScriptedSource {
    pub fn new(descriptor: TrackDescriptor, packets: Vec<Packet>) -> Self {
        ScriptedSource {
            descriptor,
            pending: packets.into(),
            queue: PacketQueue::new(TimecodeSync::default()),
            trip: None,
            produced: 0,
        }
    }

    pub fn trip_flag_after(mut self, produced: usize, flag: Arc<AtomicBool>) -> Self {
        self.trip = Some((produced, flag));
        self
    }
}

impl PacketSource for ScriptedSource {
    fn read(&mut self) -> SourceStatus {
        let Some(packet) = self.pending.pop_front() else {
            return SourceStatus::NoMoreData;
        };
        self.queue.push(packet).expect("scripted packets are monotonic");
        self.produced += 1;
        if let Some((after, flag)) = &self.trip {
            if self.produced >= *after {
                flag.store(true, Ordering::Relaxed);
            }
        }
        SourceStatus::MoreData
    }

    fn packet_available(&self) -> usize {
        self.queue.len()
    }

    fn peek(&self) -> Option<&Packet> {
        self.queue.peek()
    }

    fn pop(&mut self) -> Option<Packet> {
        self.queue.pop()
    }

    fn set_headers(&mut self) -> mkv_mux::Result<TrackDescriptor> {
        Ok(self.descriptor.clone())
    }

    fn identify(&self) -> String {
        format!("scripted {} source", self.descriptor.codec_id)
    }
}

pub const MS: i64 = 1_000_000;

/// An MP3-flavoured audio descriptor: 26ms frames, lacing allowed.
pub fn mp3_descriptor() -> TrackDescriptor {
    let mut descriptor = TrackDescriptor::new(MediaKind::Audio, "A_MPEG/L3");
    descriptor.default_duration_ns = Some(26 * MS as u64);
    descriptor.audio = Some(AudioParams {
        channels: 2,
        sampling_frequency: 44_100.0,
        output_sampling_frequency: None,
        bit_depth: None,
    });
    descriptor
}

/// MP3 frames of `count` packets at 26ms spacing.
pub fn mp3_packets(count: usize) -> Vec<Packet> {
    (0..count as i64)
        .map(|n| {
            Packet::new(Bytes::from(vec![0x55u8; 104]), n * 26 * MS)
                .with_duration(26 * MS)
        })
        .collect()
}

/// A video descriptor: 25fps, no lacing, cues on key frames.
pub fn video_descriptor() -> TrackDescriptor {
    let mut descriptor = TrackDescriptor::new(MediaKind::Video, "V_MPEG4/ISO/ASP");
    descriptor.default_duration_ns = Some(40 * MS as u64);
    descriptor.video = Some(VideoParams {
        pixel_width: 640,
        pixel_height: 480,
        display_width: None,
        display_height: None,
    });
    descriptor
}

/// Video packets following a repeated I P P ... P pattern: one key frame
/// per `gop_len` frames, `frame_ms` apart, P frames referencing their
/// predecessor.
pub fn video_gop_packets(
    frame_count: usize,
    frame_ms: i64,
    gop_len: usize,
    payload_size: usize,
) -> Vec<Packet> {
    (0..frame_count)
        .map(|n| {
            let timecode = n as i64 * frame_ms * MS;
            let mut packet = Packet::new(Bytes::from(vec![0xE5u8; payload_size]), timecode)
                .with_duration(frame_ms * MS);
            if n % gop_len != 0 {
                packet = packet.with_bref((n as i64 - 1) * frame_ms * MS);
            }
            packet
        })
        .collect()
}
