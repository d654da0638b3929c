//! The cluster assembler: groups packets into Matroska clusters, laces
//! consecutive frames, emits block groups with reference and duration
//! fields, and feeds the cue index.

use std::collections::HashMap;
use std::io::{Seek, Write};

use bytes::Bytes;

use crate::block::encode_block;
use crate::cues::{CueEntry, CueIndex};
use crate::error::Error;
use crate::lacer::Lacer;
use crate::leaf::{
    Block, BlockDuration, PrevSize, Position, ReferenceBlock, ReferencePriority,
    SliceDuration, SliceFrameNumber, Timestamp,
};
use crate::master::{BlockGroup, Cluster, Slices, TimeSlice};
use crate::packet::{NO_REFERENCE, Packet, SourceId};
use crate::resolver::ReferenceResolver;
use crate::track::{CuePolicy, TrackRegistry};
use crate::writer::SeekWriter;

/// Maximum number of laced frames per block.
const MAX_LACES: usize = 8;

/// One slot of the cluster arena: the packets of one cluster plus its
/// lifecycle flags. Rendered clusters stay in the arena while anything
/// still references their packets.
#[derive(Debug)]
pub(crate) struct ClusterContents {
    pub(crate) packets: Vec<Packet>,
    pub(crate) rendered: bool,
    pub(crate) is_referenced: bool,
}

/// The rotation budgets of a cluster.
#[derive(Debug, Clone, Copy)]
pub struct ClusterLimits {
    /// Time span budget in nanoseconds.
    pub max_ns: i64,
    /// Maximum number of blocks.
    pub max_blocks: u64,
    /// Soft byte budget.
    pub max_bytes: u64,
}

impl Default for ClusterLimits {
    fn default() -> Self {
        ClusterLimits {
            max_ns: 2_000_000_000,
            max_blocks: 65_535,
            max_bytes: 1_500_000,
        }
    }
}

/// Per-source scratchpad while one cluster renders: the open block group
/// and whether it accepts more laces.
#[derive(Debug)]
struct RenderState {
    open: Option<usize>,
    accept_more_laces: bool,
}

/// A block group being collected during a render pass. References are kept
/// as raw timecodes and resolved once every group of the cluster exists: a
/// forward-referenced frame is ingested after the frame referencing it.
#[derive(Debug)]
struct PendingGroup {
    source_id: SourceId,
    track_number: u64,
    first_timecode: i64,
    frames: Vec<Bytes>,
    durations: Vec<i64>,
    duration_mandatory: bool,
    bref: Option<i64>,
    fref: Option<i64>,
    ref_priority: u64,
}

/// Groups packets into clusters and renders them.
#[derive(Debug)]
pub struct ClusterAssembler {
    clusters: Vec<ClusterContents>,
    resolver: ReferenceResolver,
    limits: ClusterLimits,
    timecode_scale: u64,
    lacer: Option<Lacer>,
    use_durations: bool,
    use_timeslices: bool,
    write_cues: bool,

    content_size: u64,
    max_timecode: i64,
    first_timecode: i64,
    timecode_offset: i64,
    last_cluster_size: Option<u64>,
    cluster_positions: Vec<u64>,
}

impl ClusterAssembler {
    /// A fresh assembler.
    pub fn new(
        limits: ClusterLimits,
        timecode_scale: u64,
        lacer: Option<Lacer>,
        use_durations: bool,
        use_timeslices: bool,
        write_cues: bool,
    ) -> Self {
        ClusterAssembler {
            clusters: Vec::new(),
            resolver: ReferenceResolver::new(timecode_scale as i64),
            limits,
            timecode_scale,
            lacer,
            use_durations,
            use_timeslices,
            write_cues,
            content_size: 0,
            max_timecode: 0,
            // Both resolve to the first rendered packet, so the first
            // file's clock starts at zero like every no-linking rollover.
            first_timecode: -1,
            timecode_offset: -1,
            last_cluster_size: None,
            cluster_positions: Vec::new(),
        }
    }

    /// The assigned timecode the current cluster started at.
    fn current_cluster_timecode(&self) -> i64 {
        self.clusters
            .last()
            .and_then(|c| c.packets.first())
            .map(|p| p.assigned_timecode)
            .unwrap_or(0)
    }

    fn open_cluster(&mut self) {
        self.clusters.push(ClusterContents {
            packets: Vec::new(),
            rendered: false,
            is_referenced: false,
        });
        self.content_size = 0;
    }

    fn current_full(&self) -> bool {
        let Some(current) = self.clusters.last() else {
            return false;
        };
        let Some(last_packet) = current.packets.last() else {
            return false;
        };
        last_packet.assigned_timecode - self.current_cluster_timecode() > self.limits.max_ns
            || current.packets.len() as u64 > self.limits.max_blocks
            || self.content_size > self.limits.max_bytes
    }

    /// Ingest one packet; may flush and rotate the cluster before and
    /// after, subject to every reference of the closing cluster being
    /// resolvable.
    pub fn add_packet<W: Write + Seek>(
        &mut self,
        packet: Packet,
        registry: &TrackRegistry,
        writer: &mut SeekWriter<W>,
        payload_start: u64,
        cues: &mut CueIndex,
    ) -> crate::Result<()> {
        if self.clusters.is_empty() {
            self.open_cluster();
        } else if packet.assigned_timecode - self.current_cluster_timecode() > self.limits.max_ns
            && self.references_resolved()
        {
            self.render(registry, writer, payload_start, cues)?;
            self.open_cluster();
        }

        self.content_size += packet.payload.len() as u64;
        if packet.assigned_timecode + packet.duration.max(0) > self.max_timecode {
            self.max_timecode = packet.assigned_timecode + packet.duration.max(0);
        }
        self.clusters
            .last_mut()
            .expect("cluster opened above")
            .packets
            .push(packet);

        if self.current_full() && self.references_resolved() {
            self.render(registry, writer, payload_start, cues)?;
            self.open_cluster();
        }
        Ok(())
    }

    fn references_resolved(&self) -> bool {
        match self.clusters.last() {
            Some(current) => self.resolver.all_references_resolved(&self.clusters, current),
            None => true,
        }
    }

    /// Declare that nothing at or before `timecode` of `source_id` is
    /// referenced anymore.
    pub fn free_ref(&mut self, timecode: i64, source_id: SourceId) {
        self.resolver.free_ref(timecode, source_id);
    }

    /// Number of packets waiting in the current cluster.
    pub fn pending_packets(&self) -> usize {
        self.clusters
            .last()
            .filter(|c| !c.rendered)
            .map(|c| c.packets.len())
            .unwrap_or(0)
    }

    /// Serialise the current cluster.
    pub fn render<W: Write + Seek>(
        &mut self,
        registry: &TrackRegistry,
        writer: &mut SeekWriter<W>,
        payload_start: u64,
        cues: &mut CueIndex,
    ) -> crate::Result<()> {
        let Some(index) = self.clusters.len().checked_sub(1) else {
            return Ok(());
        };
        if self.clusters[index].packets.is_empty() || self.clusters[index].rendered {
            return Ok(());
        }

        let relative_position = writer.position()? - payload_start;
        let scale = self.timecode_scale as i64;

        let mut groups: Vec<PendingGroup> = Vec::new();
        let mut states: HashMap<SourceId, RenderState> = HashMap::new();
        let mut cluster_ticks = 0u64;

        for packet_index in 0..self.clusters[index].packets.len() {
            let (source_id, assigned, raw_timecode, bref, fref, duration, duration_mandatory, ref_priority, payload) = {
                let p = &self.clusters[index].packets[packet_index];
                (
                    p.source_id,
                    p.assigned_timecode,
                    p.timecode,
                    p.bref,
                    p.fref,
                    p.duration,
                    p.duration_mandatory,
                    p.ref_priority,
                    p.payload.clone(),
                )
            };

            let track = registry.by_source(source_id).ok_or(Error::SourceError { source_id })?;

            if self.timecode_offset == -1 {
                self.timecode_offset = assigned;
            }
            // File-local: relative to the offset, like everything written.
            if self.first_timecode == -1 {
                self.first_timecode = assigned - self.timecode_offset;
            }
            if packet_index == 0 {
                cluster_ticks = ((assigned - self.timecode_offset) / scale) as u64;
            }

            let state = states.entry(source_id).or_insert(RenderState {
                open: None,
                accept_more_laces: false,
            });
            if bref != NO_REFERENCE {
                state.accept_more_laces = false;
            }

            let group_index = match state.open {
                Some(open) if state.accept_more_laces => open,
                _ => {
                    groups.push(PendingGroup {
                        source_id,
                        track_number: track.track_number,
                        first_timecode: assigned,
                        frames: Vec::new(),
                        durations: Vec::new(),
                        duration_mandatory: false,
                        bref: None,
                        fref: None,
                        ref_priority: 0,
                    });
                    let opened = groups.len() - 1;
                    state.open = Some(opened);

                    // The cue index follows the track's policy; an entry
                    // points at the block group this packet opened.
                    let policy = track.descriptor.cue_policy;
                    if self.write_cues
                        && (policy == CuePolicy::All
                            || (policy == CuePolicy::IFrames && bref == NO_REFERENCE))
                    {
                        cues.add(CueEntry {
                            time: ((assigned - self.timecode_offset) / scale) as u64,
                            track: track.track_number,
                            cluster_position: relative_position,
                            block_number: opened as u64 + 1,
                        });
                    }
                    opened
                }
            };

            if bref != NO_REFERENCE {
                // P and B frames record their reference timecodes; they
                // resolve in the second pass, once the forward-referenced
                // frames of this cluster have their own groups.
                groups[group_index].bref = Some(bref);
                if fref != NO_REFERENCE {
                    groups[group_index].fref = Some(fref);
                }
            } else {
                // A key frame; everything earlier of this source is no
                // longer needed.
                self.resolver.free_ref(raw_timecode, source_id);
            }

            let group = &mut groups[group_index];
            group.frames.push(payload);
            group.durations.push(duration);
            group.duration_mandatory |= duration_mandatory;
            if ref_priority > 0 {
                group.ref_priority = ref_priority;
            }

            let group_timecode = group.first_timecode;
            let state = states.get_mut(&source_id).expect("state inserted above");
            state.accept_more_laces = self.lacer.is_some()
                && track.descriptor.lacing_allowed
                && bref == NO_REFERENCE
                && fref == NO_REFERENCE
                && group.frames.len() < MAX_LACES;

            self.clusters[index].packets[packet_index].group_timecode = Some(group_timecode);
        }

        let mut out = Cluster {
            crc32: None,
            void: None,
            timestamp: Timestamp(cluster_ticks),
            position: Some(Position(relative_position)),
            prev_size: self.last_cluster_size.map(PrevSize),
            block_group: Vec::with_capacity(groups.len()),
        };
        for group in &groups {
            out.block_group.push(self.finish_group(group, registry, cluster_ticks)?);
        }

        let mut rendered = Vec::new();
        crate::functional::Encode::encode(&out, &mut rendered)?;
        writer.write_all(&rendered)?;
        self.cluster_positions.push(relative_position);
        self.last_cluster_size = Some(rendered.len() as u64);

        // Payloads are spent; metadata survives for reference resolution.
        for packet in &mut self.clusters[index].packets {
            packet.payload = Bytes::new();
        }
        self.clusters[index].rendered = true;
        self.resolver.free_clusters(&mut self.clusters)?;
        Ok(())
    }

    /// Turn a pending group into a serialisable block group, applying the
    /// duration and time-slice rules.
    fn finish_group(
        &self,
        group: &PendingGroup,
        registry: &TrackRegistry,
        cluster_ticks: u64,
    ) -> crate::Result<BlockGroup> {
        let scale = self.timecode_scale as i64;
        let group_ticks = (group.first_timecode - self.timecode_offset) / scale;
        let relative = i16::try_from(group_ticks - cluster_ticks as i64).map_err(|_| {
            Error::InvalidConfig(format!(
                "block at {} ticks does not fit the cluster starting at {} ticks",
                group_ticks, cluster_ticks
            ))
        })?;

        let frames: Vec<&[u8]> = group.frames.iter().map(|f| f.as_ref()).collect();
        let block: Block = encode_block(group.track_number, relative, self.lacer, &frames)?;

        let default_duration = registry
            .by_source(group.source_id)
            .and_then(|t| t.descriptor.default_duration_ns)
            .map(|d| d as i64)
            .unwrap_or(-1);

        let known_durations = group.durations.iter().all(|d| *d >= 0);
        let block_duration: i64 = if known_durations {
            group.durations.iter().sum()
        } else {
            0
        };

        let mut result = BlockGroup {
            crc32: None,
            void: None,
            block,
            block_duration: None,
            reference_priority: (group.ref_priority > 0)
                .then_some(ReferencePriority(group.ref_priority)),
            slices: None,
            reference_block: Vec::new(),
        };

        if block_duration > 0
            && block_duration != default_duration
            && (self.use_durations || group.duration_mandatory)
        {
            result.block_duration = Some(BlockDuration((block_duration / scale) as u64));
        }

        for reference in [group.bref, group.fref].into_iter().flatten() {
            let target = self
                .resolver
                .find_packet(&self.clusters, reference, group.source_id)
                .and_then(|p| p.group_timecode)
                .ok_or(Error::ReferenceUnresolved {
                    source_id: group.source_id,
                    timecode: group.first_timecode,
                    ref_timecode: reference,
                })?;
            let target_ticks = (target - self.timecode_offset) / scale;
            result
                .reference_block
                .push(ReferenceBlock(target_ticks - group_ticks));
        }

        if self.use_timeslices
            && !(group.durations.len() == 1
                && (self.use_durations
                    || group.duration_mandatory
                    || (default_duration > 0 && default_duration == block_duration)))
        {
            let mut slices = Slices {
                crc32: None,
                void: None,
                time_slice: Vec::new(),
            };
            for (lace, duration) in group.durations.iter().enumerate() {
                if *duration != default_duration || lace > 0 {
                    slices.time_slice.push(TimeSlice {
                        crc32: None,
                        void: None,
                        slice_frame_number: SliceFrameNumber(lace as u64),
                        slice_duration: (*duration != default_duration && *duration >= 0)
                            .then_some(SliceDuration((*duration / scale) as u64)),
                    });
                }
            }
            if !slices.time_slice.is_empty() {
                result.slices = Some(slices);
            }
        }

        Ok(result)
    }

    /// Highest packed timecode seen, relative to the segment's offset.
    pub fn max_timecode(&self) -> i64 {
        self.max_timecode - self.timecode_offset.max(0)
    }

    /// Raw maximum timecode, for the splitter's duration bookkeeping.
    pub(crate) fn max_timecode_raw(&self) -> i64 {
        self.max_timecode
    }

    pub(crate) fn set_max_timecode_raw(&mut self, value: i64) {
        self.max_timecode = value;
    }

    /// Timecode of the first packet rendered into the current file,
    /// relative to the segment's timecode offset.
    pub fn first_timecode(&self) -> i64 {
        self.first_timecode.max(0)
    }

    /// The offset subtracted from every timecode of the current file.
    pub fn timecode_offset(&self) -> i64 {
        self.timecode_offset.max(0)
    }

    /// Segment-relative positions of the clusters rendered into the
    /// current file.
    pub fn cluster_positions(&self) -> &[u64] {
        &self.cluster_positions
    }

    /// Reset the per-file state when the splitter rolls over to the next
    /// output file. Without linking the new file restarts its clock at
    /// zero; with linking timecodes continue monotonically.
    pub fn begin_file(&mut self, no_linking: bool) {
        if no_linking {
            self.timecode_offset = -1;
            self.first_timecode = 0;
        } else {
            self.first_timecode = -1;
        }
        self.cluster_positions.clear();
        self.last_cluster_size = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{MediaKind, TrackDescriptor};
    use std::io::Cursor;

    fn registry_with_audio() -> TrackRegistry {
        let mut registry = TrackRegistry::new();
        let mut descriptor = TrackDescriptor::new(MediaKind::Audio, "A_MPEG/L3");
        descriptor.default_duration_ns = Some(26_000_000);
        registry.register(SourceId(0), descriptor, true);
        registry
    }

    fn audio_packet(timecode_ms: i64) -> Packet {
        let mut p = Packet::new(Bytes::from_static(&[0u8; 100]), timecode_ms * 1_000_000)
            .with_duration(26_000_000);
        p.source_id = SourceId(0);
        p
    }

    #[test]
    fn consecutive_key_frames_are_laced() {
        let registry = registry_with_audio();
        let mut assembler = ClusterAssembler::new(
            ClusterLimits::default(),
            1_000_000,
            Some(Lacer::Xiph),
            false,
            false,
            true,
        );
        let mut writer = SeekWriter::new(Cursor::new(Vec::new()));
        let mut cues = CueIndex::new();

        for ms in [0, 26, 52, 78] {
            assembler
                .add_packet(audio_packet(ms), &registry, &mut writer, 0, &mut cues)
                .unwrap();
        }
        assembler.render(&registry, &mut writer, 0, &mut cues).unwrap();

        let data = writer.into_inner().into_inner();
        let cluster = crate::functional::Decode::decode(&mut &data[..]).map(|c: Cluster| c).unwrap();
        // one block group carrying all four frames as laces
        assert_eq!(cluster.block_group.len(), 1);
        let view = crate::block::BlockView::parse(&cluster.block_group[0].block).unwrap();
        assert_eq!(view.frames.len(), 4);
        assert_eq!(view.track_number, 1);
        // the sum of the lace durations matches four defaults and
        // durations were not requested, so no BlockDuration is written
        assert!(cluster.block_group[0].block_duration.is_none());
    }

    #[test]
    fn lacing_stops_at_eight_frames() {
        let registry = registry_with_audio();
        let mut assembler = ClusterAssembler::new(
            ClusterLimits::default(),
            1_000_000,
            Some(Lacer::Xiph),
            false,
            false,
            false,
        );
        let mut writer = SeekWriter::new(Cursor::new(Vec::new()));
        let mut cues = CueIndex::new();

        for n in 0..10 {
            assembler
                .add_packet(audio_packet(n * 26), &registry, &mut writer, 0, &mut cues)
                .unwrap();
        }
        assembler.render(&registry, &mut writer, 0, &mut cues).unwrap();

        let data = writer.into_inner().into_inner();
        let cluster: Cluster = crate::functional::Decode::decode(&mut &data[..]).unwrap();
        assert_eq!(cluster.block_group.len(), 2);
        let first = crate::block::BlockView::parse(&cluster.block_group[0].block).unwrap();
        let second = crate::block::BlockView::parse(&cluster.block_group[1].block).unwrap();
        assert_eq!(first.frames.len(), 8);
        assert_eq!(second.frames.len(), 2);
        // the second group's block timecode is eight frames in
        assert_eq!(second.relative_timecode, 8 * 26);
    }

    #[test]
    fn p_frame_gets_backward_reference() {
        let mut registry = TrackRegistry::new();
        registry.register(
            SourceId(0),
            TrackDescriptor::new(MediaKind::Video, "V_MPEG4/ISO/ASP"),
            true,
        );
        let mut assembler = ClusterAssembler::new(
            ClusterLimits::default(),
            1_000_000,
            Some(Lacer::Xiph),
            false,
            false,
            false,
        );
        let mut writer = SeekWriter::new(Cursor::new(Vec::new()));
        let mut cues = CueIndex::new();

        let mut key = Packet::new(Bytes::from_static(&[1u8; 50]), 0).with_duration(40_000_000);
        key.source_id = SourceId(0);
        let mut p_frame = Packet::new(Bytes::from_static(&[2u8; 50]), 40_000_000)
            .with_duration(40_000_000)
            .with_bref(0);
        p_frame.source_id = SourceId(0);

        assembler.add_packet(key, &registry, &mut writer, 0, &mut cues).unwrap();
        assembler.add_packet(p_frame, &registry, &mut writer, 0, &mut cues).unwrap();
        assembler.render(&registry, &mut writer, 0, &mut cues).unwrap();

        let data = writer.into_inner().into_inner();
        let cluster: Cluster = crate::functional::Decode::decode(&mut &data[..]).unwrap();
        assert_eq!(cluster.block_group.len(), 2);
        assert!(cluster.block_group[0].reference_block.is_empty());
        assert_eq!(cluster.block_group[1].reference_block.len(), 1);
        // the P frame at 40ms points back 40 ticks to the I frame
        assert_eq!(*cluster.block_group[1].reference_block[0], -40);
    }

    #[test]
    fn b_frame_gets_both_references() {
        let mut registry = TrackRegistry::new();
        registry.register(
            SourceId(0),
            TrackDescriptor::new(MediaKind::Video, "V_MPEG4/ISO/ASP"),
            true,
        );
        let mut assembler = ClusterAssembler::new(
            ClusterLimits::default(),
            1_000_000,
            Some(Lacer::Xiph),
            false,
            false,
            false,
        );
        let mut writer = SeekWriter::new(Cursor::new(Vec::new()));
        let mut cues = CueIndex::new();

        // an I frame at 0, the B frame at 40 referencing both neighbours,
        // and the P frame at 80 it forward-references, in timecode order as
        // the scheduler hands them over
        let mut frames = vec![
            Packet::new(Bytes::from_static(&[1u8; 40]), 0).with_duration(40_000_000),
            Packet::new(Bytes::from_static(&[3u8; 40]), 40_000_000)
                .with_duration(40_000_000)
                .with_bref(0)
                .with_fref(80_000_000),
            Packet::new(Bytes::from_static(&[2u8; 40]), 80_000_000)
                .with_duration(40_000_000)
                .with_bref(0),
        ];
        for packet in &mut frames {
            packet.source_id = SourceId(0);
        }
        for packet in frames {
            assembler
                .add_packet(packet, &registry, &mut writer, 0, &mut cues)
                .unwrap();
        }
        assembler.render(&registry, &mut writer, 0, &mut cues).unwrap();

        let data = writer.into_inner().into_inner();
        let cluster: Cluster = crate::functional::Decode::decode(&mut &data[..]).unwrap();
        assert_eq!(cluster.block_group.len(), 3);
        let b_group = &cluster.block_group[1];
        let refs: Vec<i64> = b_group.reference_block.iter().map(|r| **r).collect();
        // backward to the I frame at 0, forward to the P frame at 80
        assert_eq!(refs, vec![-40, 40]);
    }

    #[test]
    fn cluster_rotates_on_time_budget() {
        let registry = registry_with_audio();
        let mut assembler = ClusterAssembler::new(
            ClusterLimits {
                max_ns: 100_000_000,
                ..ClusterLimits::default()
            },
            1_000_000,
            None,
            false,
            false,
            false,
        );
        let mut writer = SeekWriter::new(Cursor::new(Vec::new()));
        let mut cues = CueIndex::new();

        assembler.add_packet(audio_packet(0), &registry, &mut writer, 0, &mut cues).unwrap();
        assembler.add_packet(audio_packet(260), &registry, &mut writer, 0, &mut cues).unwrap();
        assembler.render(&registry, &mut writer, 0, &mut cues).unwrap();

        let data = writer.into_inner().into_inner();
        let mut slice = &data[..];
        let first: Cluster = crate::functional::Decode::decode(&mut slice).unwrap();
        let second: Cluster = crate::functional::Decode::decode(&mut slice).unwrap();
        assert_eq!(*first.timestamp, 0);
        assert_eq!(*second.timestamp, 260);
        assert_eq!(assembler.cluster_positions().len(), 2);
        // the second cluster records the first one's size
        assert_eq!(**second.prev_size.as_ref().unwrap() as usize, first_len(&data));
    }

    fn first_len(data: &[u8]) -> usize {
        let mut slice = data;
        let _: Cluster = crate::functional::Decode::decode(&mut slice).unwrap();
        data.len() - slice.len()
    }

    #[test]
    fn first_file_clock_starts_at_zero() {
        let registry = registry_with_audio();
        let mut assembler = ClusterAssembler::new(
            ClusterLimits::default(),
            1_000_000,
            None,
            false,
            false,
            false,
        );
        let mut writer = SeekWriter::new(Cursor::new(Vec::new()));
        let mut cues = CueIndex::new();

        // the stream starts half a second in (e.g. a sync displacement)
        assembler.add_packet(audio_packet(500), &registry, &mut writer, 0, &mut cues).unwrap();
        assembler.add_packet(audio_packet(526), &registry, &mut writer, 0, &mut cues).unwrap();
        assembler.render(&registry, &mut writer, 0, &mut cues).unwrap();

        assert_eq!(assembler.timecode_offset(), 500_000_000);
        assert_eq!(assembler.first_timecode(), 0);
        // the span excludes the lead-in
        assert_eq!(assembler.max_timecode(), 52_000_000);

        let data = writer.into_inner().into_inner();
        let cluster: Cluster = crate::functional::Decode::decode(&mut &data[..]).unwrap();
        assert_eq!(*cluster.timestamp, 0);
        let second = crate::block::BlockView::parse(&cluster.block_group[1].block).unwrap();
        assert_eq!(second.relative_timecode, 26);
    }

    #[test]
    fn max_timecode_includes_duration() {
        let registry = registry_with_audio();
        let mut assembler = ClusterAssembler::new(
            ClusterLimits::default(),
            1_000_000,
            None,
            false,
            false,
            false,
        );
        let mut writer = SeekWriter::new(Cursor::new(Vec::new()));
        let mut cues = CueIndex::new();
        assembler.add_packet(audio_packet(78), &registry, &mut writer, 0, &mut cues).unwrap();
        assert_eq!(assembler.max_timecode(), 104_000_000);
    }
}
