//! Segment layout: renders the EBML head, segment info, track headers and
//! the reserved Void regions up front, and fixes everything up when a file
//! closes so the result is both streamable and index-friendly.

use std::io::{Seek, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::base::VInt64;
use crate::config::{MuxConfig, TIMECODE_SCALE};
use crate::cues::CueIndex;
use crate::element::Element;
use crate::error::Error;
use crate::functional::Encode;
use crate::leaf::{
    DateUtc, DocType, DocTypeReadVersion, DocTypeVersion, Duration, MuxingApp, NextUuid,
    PrevFilename, PrevUuid, SegmentFilename, SegmentUuid, TimestampScale, Title, WritingApp,
};
use crate::master::{
    Attachments, Chapters, Cluster, Cues, Ebml, Info, SEGMENT_ID, Seek as SeekEntry, SeekHead,
    Tags, Tracks,
};
use crate::track::TrackRegistry;
use crate::writer::{Placeholder, SeekWriter};

/// Bytes reserved up front for the top-level meta seek.
const META_SEEK_RESERVE: u64 = 4096;
/// Bytes reserved after the track headers for later header rewrites.
const TRACK_HEADER_RESERVE: u64 = 1024;
/// Slack added to the chapter reserve so the per-file selection fits.
const CHAPTER_RESERVE_SLACK: u64 = 10;

/// Nanoseconds between the Unix epoch and 2001-01-01T00:00:00 UTC, the
/// Matroska date epoch.
const MATROSKA_EPOCH_OFFSET_SECS: i64 = 978_307_200;

/// The fixed token written as MuxingApp/WritingApp when all run-dependent
/// data is suppressed.
const NO_VARIABLE_DATA_APP: &str = "no_variable_data";

/// The segment UIDs of one output file.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SegmentUids {
    pub current: [u8; 16],
    pub previous: Option<[u8; 16]>,
    pub next: Option<[u8; 16]>,
}

/// What the layout needs to know to close a file.
pub(crate) struct FinishContext<'a> {
    pub duration_ticks: f64,
    pub cluster_positions: &'a [u64],
    pub chapters: Option<Chapters>,
    pub tags: Option<&'a Tags>,
    pub last_file: bool,
    pub external_next_uid: Option<[u8; 16]>,
}

/// The layout state of the file currently being written.
#[derive(Debug)]
pub(crate) struct SegmentLayout<W: Write + Seek> {
    writer: SeekWriter<W>,
    segment_pos: u64,
    payload_start: u64,
    sh_void: Placeholder,
    duration_pos: u64,
    info_pos: u64,
    info: Info,
    info_len: u64,
    tracks_pos: u64,
    track_region_end: u64,
    chapters_void: Option<Placeholder>,
    seeks: Vec<SeekEntry>,
    warnings: u64,
}

impl<W: Write + Seek> SegmentLayout<W> {
    /// Open a new output file: write the EBML head, the Segment with an
    /// unknown size, the reserved meta-seek Void, segment info, track
    /// headers (plus their rewrite reserve), attachments and chapters.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        sink: W,
        file_name: &str,
        prev_file_name: Option<&str>,
        config: &MuxConfig,
        registry: &TrackRegistry,
        uids: SegmentUids,
        splitting: bool,
        chapters: Option<&Chapters>,
        attachments: Option<&Attachments>,
    ) -> crate::Result<Self> {
        let mut writer = SeekWriter::new(sink);

        let head = Ebml {
            doc_type: Some(DocType("matroska".to_string())),
            doc_type_version: Some(DocTypeVersion(1)),
            doc_type_read_version: Some(DocTypeReadVersion(1)),
            ..Default::default()
        };
        writer.write(&head)?;

        // Open the Segment with an unknown length; the closure path
        // overwrites it once the final size is known.
        let segment_pos = writer.position()?;
        let mut segment_header = Vec::new();
        SEGMENT_ID.encode(&mut segment_header)?;
        segment_header.extend_from_slice(&VInt64::UNKNOWN_WIDE);
        writer.write_all(&segment_header)?;
        let payload_start = writer.position()?;

        let sh_void = writer.reserve(META_SEEK_RESERVE)?;

        let info = build_info(config, &uids, splitting.then_some(file_name), prev_file_name);
        let info_pos = writer.position()?;
        let mut info_bytes = Vec::new();
        info.encode(&mut info_bytes)?;
        // The Duration placeholder is the first optional child of the info
        // body; remember its position for the in-place rewrite on close.
        let mut prefix = Vec::new();
        info.timestamp_scale.encode(&mut prefix)?;
        info.muxing_app.encode(&mut prefix)?;
        info.writing_app.encode(&mut prefix)?;
        let mut body_bytes = Vec::new();
        info.encode_body(&mut body_bytes)?;
        let header_len = info_bytes.len() - body_bytes.len();
        let duration_pos = info_pos + header_len as u64 + prefix.len() as u64;
        writer.write_all(&info_bytes)?;

        let mut seeks = vec![SeekEntry::to(Info::ID, info_pos - payload_start)];

        let tracks_pos = writer.position()?;
        writer.write(&registry.to_tracks())?;
        seeks.push(SeekEntry::to(Tracks::ID, tracks_pos - payload_start));

        // Reserve a small amount of space for header changes by the
        // packetizers.
        writer.reserve(TRACK_HEADER_RESERVE)?;
        let track_region_end = writer.position()?;

        if let Some(attachments) = attachments {
            let pos = writer.position()?;
            writer.write(attachments)?;
            seeks.push(SeekEntry::to(Attachments::ID, pos - payload_start));
        }

        let mut chapters_void = None;
        if let Some(chapters) = chapters {
            if splitting {
                // When splitting, the per-file chapter selection is only
                // known on close; reserve enough space for the full set.
                let full_size = chapters.encoded_size()?;
                chapters_void = Some(writer.reserve(full_size + CHAPTER_RESERVE_SLACK)?);
            } else {
                let pos = writer.position()?;
                writer.write(chapters)?;
                seeks.push(SeekEntry::to(Chapters::ID, pos - payload_start));
            }
        }

        Ok(SegmentLayout {
            writer,
            segment_pos,
            payload_start,
            sh_void,
            duration_pos,
            info_pos,
            info,
            info_len: info_bytes.len() as u64,
            tracks_pos,
            track_region_end,
            chapters_void,
            seeks,
            warnings: 0,
        })
    }

    /// The writer clusters are rendered through.
    pub fn writer_mut(&mut self) -> &mut SeekWriter<W> {
        &mut self.writer
    }

    /// Position of the first byte of segment data; cue and seek positions
    /// are relative to it.
    pub fn payload_start(&self) -> u64 {
        self.payload_start
    }

    /// Rewrite the Tracks element in place after a packetizer revised its
    /// headers, resizing the trailing Void to keep the following bytes
    /// where they are.
    pub fn rerender_tracks(&mut self, registry: &TrackRegistry) -> crate::Result<()> {
        let region = Placeholder {
            offset: self.tracks_pos,
            reserved: self.track_region_end - self.tracks_pos,
        };
        match self.writer.fill(&region, &registry.to_tracks()) {
            Ok(()) => Ok(()),
            Err(Error::SpaceReservationOverrun { needed, reserved }) => {
                log::warn!(
                    "rewritten track headers need {needed} bytes but only {reserved} were \
                     reserved; keeping the old headers"
                );
                self.warnings += 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Run the closure path: cues, duration, per-file chapters, meta seek,
    /// tags and the final segment size. The file is playable afterwards
    /// even if the mux loop aborted early.
    pub fn finish(
        &mut self,
        config: &MuxConfig,
        cues: &CueIndex,
        ctx: FinishContext<'_>,
    ) -> crate::Result<u64> {
        // Render the cues.
        if config.write_cues && !cues.is_empty() {
            let pos = self.writer.position()?;
            self.writer.write(&cues.to_element())?;
            self.seeks
                .push(SeekEntry::to(Cues::ID, pos - self.payload_start));
        }

        // Re-render the duration with the biggest timecode seen.
        self.writer.save_pos(Some(self.duration_pos))?;
        self.writer.write(&Duration(ctx.duration_ticks))?;
        self.writer.restore_pos()?;

        // The last file of a split chain carries no next-segment UID,
        // unless the user supplied an external one.
        if ctx.last_file && config.split.is_some() {
            self.rewrite_info_next_uid(ctx.external_next_uid)?;
        }

        // Chapters selected for this file go into the space reserved at the
        // front.
        if let Some(placeholder) = self.chapters_void {
            if let Some(chapters) = &ctx.chapters {
                match self.writer.fill(&placeholder, chapters) {
                    Ok(()) => {
                        self.seeks.push(SeekEntry::to(
                            Chapters::ID,
                            placeholder.offset - self.payload_start,
                        ));
                    }
                    Err(Error::SpaceReservationOverrun { needed, reserved }) => {
                        log::warn!(
                            "chapters for this file need {needed} bytes but only {reserved} \
                             were reserved; dropping them"
                        );
                        self.warnings += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        // The meta seek head listing every cluster.
        if config.clusters_in_meta_seek && !ctx.cluster_positions.is_empty() {
            let pos = self.writer.position()?;
            let cluster_seeks = SeekHead {
                crc32: None,
                void: None,
                seek: ctx
                    .cluster_positions
                    .iter()
                    .map(|p| SeekEntry::to(Cluster::ID, *p))
                    .collect(),
            };
            self.writer.write(&cluster_seeks)?;
            self.seeks
                .push(SeekEntry::to(SeekHead::ID, pos - self.payload_start));
        }

        // Render the tags if we have some.
        if let Some(tags) = ctx.tags {
            let pos = self.writer.position()?;
            self.writer.write(tags)?;
            self.seeks
                .push(SeekEntry::to(Tags::ID, pos - self.payload_start));
        }

        // The top-level meta seek goes into the Void reserved at the start
        // of the segment. Overflow degrades seekability, not validity.
        if !self.seeks.is_empty() {
            let seek_head = SeekHead {
                crc32: None,
                void: None,
                seek: std::mem::take(&mut self.seeks),
            };
            let sh_void = self.sh_void;
            match self.writer.fill(&sh_void, &seek_head) {
                Ok(()) => {}
                Err(Error::SpaceReservationOverrun { needed, reserved }) => {
                    log::warn!(
                        "the meta seek needs {needed} bytes but only {reserved} were \
                         reserved; the file stays valid but is less seek-friendly"
                    );
                    self.warnings += 1;
                }
                Err(e) => return Err(e),
            }
        }

        // Fix up the segment size, keeping the 8-byte width of the
        // unknown-size marker written at open.
        let end = self.writer.position()?;
        let mut size_bytes = Vec::new();
        VInt64::new(end - self.payload_start).encode_sized(8, &mut size_bytes)?;
        self.writer.save_pos(Some(self.segment_pos + 4))?;
        self.writer.write_all(&size_bytes)?;
        self.writer.restore_pos()?;
        self.writer.flush()?;

        Ok(self.warnings)
    }

    /// Strip (or replace with the external value) the NextUID of the
    /// segment info and re-render it in place, padding with Void.
    fn rewrite_info_next_uid(&mut self, external: Option<[u8; 16]>) -> crate::Result<()> {
        let before = self.info.next_uuid.clone();
        self.info.next_uuid = external.map(|uid| NextUuid(uid.to_vec()));
        if self.info.next_uuid == before {
            return Ok(());
        }
        let region = Placeholder {
            offset: self.info_pos,
            reserved: self.info_len,
        };
        self.writer.fill(&region, &self.info)
    }

    /// Consume the layout, returning the underlying sink.
    pub fn into_sink(self) -> W {
        self.writer.into_inner()
    }
}

fn build_info(
    config: &MuxConfig,
    uids: &SegmentUids,
    segment_file_name: Option<&str>,
    prev_file_name: Option<&str>,
) -> Info {
    let date_utc = if config.no_variable_data {
        DateUtc(0)
    } else {
        let unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        DateUtc((unix_secs - MATROSKA_EPOCH_OFFSET_SECS) * 1_000_000_000)
    };

    // App strings may carry build dates or versions; a byte-identical
    // rerun needs them pinned too.
    let (muxing_app, writing_app) = if config.no_variable_data {
        (
            NO_VARIABLE_DATA_APP.to_string(),
            NO_VARIABLE_DATA_APP.to_string(),
        )
    } else {
        (config.muxing_app.clone(), config.writing_app.clone())
    };

    Info {
        crc32: None,
        void: None,
        timestamp_scale: TimestampScale(TIMECODE_SCALE),
        muxing_app: MuxingApp(muxing_app),
        writing_app: WritingApp(writing_app),
        duration: Some(Duration(0.0)),
        date_utc: Some(date_utc),
        title: config.title.clone().map(Title),
        segment_uuid: Some(SegmentUuid(uids.current.to_vec())),
        prev_uuid: uids.previous.map(|uid| PrevUuid(uid.to_vec())),
        next_uuid: uids.next.map(|uid| NextUuid(uid.to_vec())),
        segment_filename: segment_file_name.map(|n| SegmentFilename(n.to_string())),
        prev_filename: prev_file_name.map(|n| PrevFilename(n.to_string())),
        next_filename: None,
    }
}
