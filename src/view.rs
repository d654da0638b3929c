//! A View of a Matroska file, parsing w/o loading clusters into memory.
//!
//! The verification counterpart of the writer: it scans every top-level
//! element of a produced file, records cluster positions without loading
//! their bodies, and hands back the parsed metadata.

use std::io::{Read, Seek, SeekFrom};

use crate::base::{Header, VInt64};
use crate::element::Element;
use crate::io::{ReadElement, ReadFrom};
use crate::master::*;
use crate::supplement::Void;

/// View of a Matroska file: the EBML head plus one view per Segment.
#[derive(Debug, Clone, PartialEq)]
pub struct MatroskaView {
    /// The EBML header.
    pub ebml: Ebml,
    /// The Segment views, as there can be multiple segments in a file.
    pub segment: Vec<SegmentView>,
}

impl MatroskaView {
    /// Parse the EBML header and all Segment headers, skipping Cluster
    /// bodies.
    pub fn new<R>(reader: &mut R) -> crate::Result<Self>
    where
        R: Read + Seek,
    {
        let ebml = Ebml::read_from(reader)?;

        let mut segments = Vec::new();
        while let Ok(segment) = SegmentView::new(reader) {
            segments.push(segment);
        }

        if segments.is_empty() {
            return Err(crate::Error::MissingElement(SEGMENT_ID));
        }

        Ok(MatroskaView {
            ebml,
            segment: segments,
        })
    }
}

/// View of a Segment: its metadata elements and the positions of its
/// clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentView {
    /// Every seek head found, the reserved top-level one included.
    pub seek_head: Vec<SeekHead>,
    /// Contains general information about the Segment.
    pub info: Info,
    /// The track headers.
    pub tracks: Option<Tracks>,
    /// The cue index.
    pub cues: Option<Cues>,
    /// Attached files.
    pub attachments: Option<Attachments>,
    /// Chapters.
    pub chapters: Option<Chapters>,
    /// Tags.
    pub tags: Vec<Tags>,
    /// Positions of the Cluster elements, relative to the start of the
    /// segment data.
    pub cluster_positions: Vec<u64>,
    /// The position of the Segment data (after the Segment header).
    pub segment_data_position: u64,
    /// The declared size of the segment data.
    pub segment_size: u64,
}

impl SegmentView {
    /// Parse one Segment's metadata, skipping over Cluster bodies.
    pub fn new<R>(reader: &mut R) -> crate::Result<Self>
    where
        R: Read + Seek,
    {
        let segment_header = Header::read_from(reader)?;
        if segment_header.id != SEGMENT_ID {
            return Err(crate::Error::MissingElement(SEGMENT_ID));
        }
        if segment_header.size.is_unknown {
            // A finished file has the size fixed up by the closure path.
            return Err(crate::Error::ElementBodySizeUnknown(SEGMENT_ID));
        }
        let segment_size = *segment_header.size;
        let segment_data_position = reader.stream_position()?;
        let segment_end = segment_data_position + segment_size;

        let mut seek_head = Vec::new();
        let mut info = None;
        let mut tracks = None;
        let mut cues = None;
        let mut attachments = None;
        let mut chapters = None;
        let mut tags = Vec::new();
        let mut cluster_positions = Vec::new();

        while reader.stream_position()? < segment_end {
            let current_position = reader.stream_position()?;
            let Ok(header) = Header::read_from(reader) else {
                break;
            };
            match header.id {
                id if id == SeekHead::ID => {
                    seek_head.push(SeekHead::read_element(&header, reader)?);
                }
                id if id == Info::ID => {
                    info = Some(Info::read_element(&header, reader)?);
                }
                id if id == Tracks::ID => {
                    tracks = Some(Tracks::read_element(&header, reader)?);
                }
                id if id == Cues::ID => {
                    cues = Some(Cues::read_element(&header, reader)?);
                }
                id if id == Attachments::ID => {
                    attachments = Some(Attachments::read_element(&header, reader)?);
                }
                id if id == Chapters::ID => {
                    chapters = Some(Chapters::read_element(&header, reader)?);
                }
                id if id == Cluster::ID => {
                    // Record where the cluster sits and step over its body.
                    cluster_positions.push(current_position - segment_data_position);
                    reader.seek(SeekFrom::Current(*header.size as i64))?;
                }
                id if id == Tags::ID => {
                    tags.push(Tags::read_element(&header, reader)?);
                }
                id if id == Void::ID => {
                    reader.seek(SeekFrom::Current(*header.size as i64))?;
                }
                _ => {
                    log::warn!("Skipped unknown element with ID: {}", header.id);
                    reader.seek(SeekFrom::Current(*header.size as i64))?;
                }
            }
        }

        let info = info.ok_or(crate::Error::MissingElement(Info::ID))?;

        Ok(SegmentView {
            seek_head,
            info,
            tracks,
            cues,
            attachments,
            chapters,
            tags,
            cluster_positions,
            segment_data_position,
            segment_size,
        })
    }

    /// Read the cluster at `position` (segment-relative), loading its body.
    pub fn read_cluster<R>(&self, reader: &mut R, position: u64) -> crate::Result<Cluster>
    where
        R: Read + Seek,
    {
        reader.seek(SeekFrom::Start(self.segment_data_position + position))?;
        Cluster::read_from(reader)
    }

    /// The EBML ID found at `position` (segment-relative). Used to check
    /// that cue entries really point at Cluster headers.
    pub fn element_id_at<R>(&self, reader: &mut R, position: u64) -> crate::Result<VInt64>
    where
        R: Read + Seek,
    {
        reader.seek(SeekFrom::Start(self.segment_data_position + position))?;
        VInt64::read_from(reader)
    }
}
