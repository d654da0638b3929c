use crate::Error;
use crate::base::*;
use crate::element::*;
use crate::functional::*;
use crate::leaf::*;
use crate::supplement::*;

/// The EBML ID of the Segment element. The Segment itself is streamed by the
/// layout manager (its size is unknown while clusters are appended), so it
/// has no master struct here.
pub const SEGMENT_ID: VInt64 = VInt64::from_encoded(0x18538067);

// A helper for generating nested elements.
/* example:
nested! {
    required: [ EbmlMaxIdLength, EbmlMaxSizeLength ],
    optional: [ EbmlVersion, EbmlReadVersion, DocType, DocTypeVersion, DocTypeReadVersion ],
    multiple: [ ],
}
*/
macro_rules! nested {
    (required: [$($required:ident),*$(,)?], optional: [$($optional:ident),*$(,)?], multiple: [$($multiple:ident),*$(,)?],) => {
        paste::paste! {
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                let mut crc32: Option<Crc32> = None;
                let mut void: Option<Void> = None;
                $( let mut [<$required:snake>] = None; )*
                $( let mut [<$optional:snake>] = None; )*
                $( let mut [<$multiple:snake>] = Vec::new(); )*

                while buf.has_remaining() {
                    let header = Header::decode(buf)?;
                    match header.id {
                        $( id if id == $required::ID => {
                            if [<$required:snake>].is_some() {
                                return Err(Error::DuplicateElement { id: header.id, parent: Self::ID });
                            }
                            [<$required:snake>] = Some($required::decode_element(&header, buf)?);
                        } )*
                        $( id if id == $optional::ID => {
                            if [<$optional:snake>].is_some() {
                                return Err(Error::DuplicateElement { id: header.id, parent: Self::ID });
                            }
                            [<$optional:snake>] = Some($optional::decode_element(&header, buf)?);
                        } )*
                        $( id if id == $multiple::ID => {
                            [<$multiple:snake>].push($multiple::decode_element(&header, buf)?);
                        } )*
                        id if id == Crc32::ID => {
                            crc32 = Some(Crc32::decode_element(&header, buf)?);
                        }
                        id if id == Void::ID => {
                            let v = Void::decode_element(&header, buf)?;
                            void = Some(match void {
                                Some(previous) => Void { size: previous.size + v.size },
                                None => v,
                            });
                        }
                        _ => {
                            let size = *header.size as usize;
                            if buf.remaining() < size {
                                return Err(Error::OutOfBounds);
                            }
                            buf.advance(size);
                            log::warn!(
                                "Unknown element {}({}B) in element {}",
                                header.id,
                                *header.size,
                                Self::ID
                            );
                        }
                    }
                }

                Ok(Self {
                    crc32,
                    void,
                    $( [<$required:snake>]: [<$required:snake>]
                        .or(if $required::HAS_DEFAULT_VALUE { Some($required::default()) } else { None })
                        .ok_or(Error::MissingElement($required::ID))?, )*
                    $( [<$optional:snake>], )*
                    $( [<$multiple:snake>], )*
                })
            }

            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                self.crc32.encode(buf)?;
                $( self.[<$required:snake>].encode(buf)?; )*
                $( self.[<$optional:snake>].encode(buf)?; )*
                $( self.[<$multiple:snake>].encode(buf)?; )*
                self.void.encode(buf)?;
                Ok(())
            }
        }
    };
}

/// EBML element, the first top-level element in a Matroska file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ebml {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The maximum length of the IDs found in this file.
    pub ebml_max_id_length: EbmlMaxIdLength,
    /// The maximum length of the sizes found in this file.
    pub ebml_max_size_length: EbmlMaxSizeLength,
    /// EBMLVersion element, indicates the version of EBML used.
    pub ebml_version: Option<EbmlVersion>,
    /// EBMLReadVersion element, indicates the minimum version of EBML required to read the file.
    pub ebml_read_version: Option<EbmlReadVersion>,
    /// DocType element, "matroska" for the files this crate writes.
    pub doc_type: Option<DocType>,
    /// DocTypeVersion element, indicates the version of the document type.
    pub doc_type_version: Option<DocTypeVersion>,
    /// DocTypeReadVersion element, indicates the minimum version of the document type required to read the file.
    pub doc_type_read_version: Option<DocTypeReadVersion>,
}

impl Element for Ebml {
    const ID: VInt64 = VInt64::from_encoded(0x1A45_DFA3);
    nested! {
        required: [ EbmlMaxIdLength, EbmlMaxSizeLength ],
        optional: [ EbmlVersion, EbmlReadVersion, DocType, DocTypeVersion, DocTypeReadVersion ],
        multiple: [ ],
    }
}

/// Contains seeking information of Top-Level Elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeekHead {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Contains a single seek entry to an EBML Element.
    pub seek: Vec<Seek>,
}

impl Element for SeekHead {
    const ID: VInt64 = VInt64::from_encoded(0x114D9B74);
    nested! {
        required: [ ],
        optional: [ ],
        multiple: [ Seek ],
    }
}

/// Contains a single seek entry to an EBML Element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seek {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The binary EBML ID of a Top-Level Element.
    pub seek_id: SeekId,
    /// The Segment Position of a Top-Level Element.
    pub seek_position: SeekPosition,
}

impl Element for Seek {
    const ID: VInt64 = VInt64::from_encoded(0x4DBB);
    nested! {
        required: [ SeekId, SeekPosition ],
        optional: [ ],
        multiple: [ ],
    }
}

impl Seek {
    /// A seek entry pointing at the top-level element `id`, at the given
    /// position relative to the start of the Segment data.
    pub fn to(id: VInt64, position: u64) -> Self {
        let mut id_bytes = Vec::new();
        // A seek ID is the raw encoded bytes of the element ID.
        let encoded = id.as_encoded();
        let width = (8 - encoded.leading_zeros() as usize / 8).max(1);
        id_bytes.extend_from_slice(&encoded.to_be_bytes()[8 - width..]);
        Seek {
            crc32: None,
            void: None,
            seek_id: SeekId(id_bytes),
            seek_position: SeekPosition(position),
        }
    }
}

/// Contains general information about the Segment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Info {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Base unit for Segment Ticks and Track Ticks, in nanoseconds.
    pub timestamp_scale: TimestampScale,
    /// Muxing application or library.
    pub muxing_app: MuxingApp,
    /// Writing application.
    pub writing_app: WritingApp,
    /// Duration of the Segment.
    pub duration: Option<Duration>,
    /// The date and time that the Segment was created.
    pub date_utc: Option<DateUtc>,
    /// General name of the Segment.
    pub title: Option<Title>,
    /// A randomly generated unique ID to identify the Segment amongst many others.
    pub segment_uuid: Option<SegmentUuid>,
    /// An ID to identify the previous Segment of a Linked Segment.
    pub prev_uuid: Option<PrevUuid>,
    /// An ID to identify the next Segment of a Linked Segment.
    pub next_uuid: Option<NextUuid>,
    /// A filename corresponding to this Segment.
    pub segment_filename: Option<SegmentFilename>,
    /// A filename corresponding to the file of the previous Linked Segment.
    pub prev_filename: Option<PrevFilename>,
    /// A filename corresponding to the file of the next Linked Segment.
    pub next_filename: Option<NextFilename>,
}

impl Element for Info {
    const ID: VInt64 = VInt64::from_encoded(0x1549A966);
    nested! {
        required: [ TimestampScale, MuxingApp, WritingApp ],
        optional: [ Duration, DateUtc, Title, SegmentUuid, PrevUuid, NextUuid,
                    SegmentFilename, PrevFilename, NextFilename ],
        multiple: [ ],
    }
}

/// A Top-Level Element of information with many tracks described.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tracks {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Describes a track with all Elements.
    pub track_entry: Vec<TrackEntry>,
}

impl Element for Tracks {
    const ID: VInt64 = VInt64::from_encoded(0x1654AE6B);
    nested! {
        required: [ ],
        optional: [ ],
        multiple: [ TrackEntry ],
    }
}

/// Describes a track with all Elements.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEntry {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The track number as used in the Block Header.
    pub track_number: TrackNumber,
    /// A unique ID to identify the Track.
    pub track_uid: TrackUid,
    /// The type of the track.
    pub track_type: TrackType,
    /// An ID corresponding to the codec.
    pub codec_id: CodecId,
    /// Private data only known to the codec.
    pub codec_private: Option<CodecPrivate>,
    /// Number of nanoseconds per frame.
    pub default_duration: Option<DefaultDuration>,
    /// The minimum number of frames a player should be able to cache.
    pub min_cache: Option<MinCache>,
    /// The maximum cache size necessary to store referenced frames.
    pub max_cache: Option<MaxCache>,
    /// Set if the track is usable.
    pub flag_enabled: Option<FlagEnabled>,
    /// Set if the track is eligible for automatic selection by the player.
    pub flag_default: Option<FlagDefault>,
    /// Set if the track **MUST** be played.
    pub flag_forced: Option<FlagForced>,
    /// Set if the track **MAY** contain blocks using lacing.
    pub flag_lacing: Option<FlagLacing>,
    /// The language of the track.
    pub language: Option<Language>,
    /// A human-readable track name.
    pub name: Option<Name>,
    /// Audio settings.
    pub audio: Option<Audio>,
    /// Video settings.
    pub video: Option<Video>,
    /// Settings for several content encoding mechanisms like compression.
    pub content_encodings: Option<ContentEncodings>,
}

impl Element for TrackEntry {
    const ID: VInt64 = VInt64::from_encoded(0xAE);
    nested! {
        required: [ TrackNumber, TrackUid, TrackType, CodecId ],
        optional: [ CodecPrivate, DefaultDuration, MinCache, MaxCache, FlagEnabled,
                    FlagDefault, FlagForced, FlagLacing, Language, Name, Audio, Video,
                    ContentEncodings ],
        multiple: [ ],
    }
}

/// Audio settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Audio {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Sampling frequency in Hz.
    pub sampling_frequency: SamplingFrequency,
    /// Numbers of channels in the track.
    pub channels: Channels,
    /// Real output sampling frequency in Hz, used for SBR techniques.
    pub output_sampling_frequency: Option<OutputSamplingFrequency>,
    /// Bits per sample.
    pub bit_depth: Option<BitDepth>,
}

impl Element for Audio {
    const ID: VInt64 = VInt64::from_encoded(0xE1);
    nested! {
        required: [ SamplingFrequency, Channels ],
        optional: [ OutputSamplingFrequency, BitDepth ],
        multiple: [ ],
    }
}

/// Video settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Video {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Width of the encoded video frames in pixels.
    pub pixel_width: PixelWidth,
    /// Height of the encoded video frames in pixels.
    pub pixel_height: PixelHeight,
    /// Width of the video frames to display.
    pub display_width: Option<DisplayWidth>,
    /// Height of the video frames to display.
    pub display_height: Option<DisplayHeight>,
}

impl Element for Video {
    const ID: VInt64 = VInt64::from_encoded(0xE0);
    nested! {
        required: [ PixelWidth, PixelHeight ],
        optional: [ DisplayWidth, DisplayHeight ],
        multiple: [ ],
    }
}

/// Settings for several content encoding mechanisms like compression.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentEncodings {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Settings for one content encoding like compression or encryption.
    pub content_encoding: Vec<ContentEncoding>,
}

impl Element for ContentEncodings {
    const ID: VInt64 = VInt64::from_encoded(0x6D80);
    nested! {
        required: [ ],
        optional: [ ],
        multiple: [ ContentEncoding ],
    }
}

/// Settings for one content encoding like compression or encryption.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentEncoding {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Order of the content encoding.
    pub content_encoding_order: ContentEncodingOrder,
    /// A bit field describing which elements have been modified.
    pub content_encoding_scope: ContentEncodingScope,
    /// The transformation kind: 0 compression, 1 encryption.
    pub content_encoding_type: ContentEncodingType,
    /// Settings describing the compression used.
    pub content_compression: Option<ContentCompression>,
}

impl Element for ContentEncoding {
    const ID: VInt64 = VInt64::from_encoded(0x6240);
    nested! {
        required: [ ContentEncodingOrder, ContentEncodingScope, ContentEncodingType ],
        optional: [ ContentCompression ],
        multiple: [ ],
    }
}

/// Settings describing the compression used.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentCompression {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The compression algorithm used.
    pub content_comp_algo: ContentCompAlgo,
    /// Settings that might be needed by the decompressor.
    pub content_comp_settings: Option<ContentCompSettings>,
}

impl Element for ContentCompression {
    const ID: VInt64 = VInt64::from_encoded(0x5034);
    nested! {
        required: [ ContentCompAlgo ],
        optional: [ ContentCompSettings ],
        multiple: [ ],
    }
}

/// The Top-Level Element containing the Block structure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cluster {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Absolute timestamp of the cluster, expressed in Segment Ticks.
    pub timestamp: Timestamp,
    /// The Segment Position of the Cluster in the Segment.
    pub position: Option<Position>,
    /// Size of the previous Cluster, in octets.
    pub prev_size: Option<PrevSize>,
    /// Basic container of information containing a single Block and information specific to that Block.
    pub block_group: Vec<BlockGroup>,
}

impl Element for Cluster {
    const ID: VInt64 = VInt64::from_encoded(0x1F43B675);
    nested! {
        required: [ Timestamp ],
        optional: [ Position, PrevSize ],
        multiple: [ BlockGroup ],
    }
}

/// Basic container of information containing a single Block and information
/// specific to that Block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockGroup {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Block containing the actual data to be rendered and a timestamp
    /// relative to the Cluster Timestamp.
    pub block: Block,
    /// The duration of the Block, expressed in Track Ticks. **MUST** be set
    /// when the Block duration differs from the track's DefaultDuration and
    /// durations were requested.
    pub block_duration: Option<BlockDuration>,
    /// This frame is referenced and has the specified cache priority.
    pub reference_priority: Option<ReferencePriority>,
    /// Per-lace timing when lace durations deviate from the default.
    pub slices: Option<Slices>,
    /// A timestamp value, relative to the timestamp of the Block in this
    /// BlockGroup. Used to reference other frames necessary to decode this
    /// frame. If the BlockGroup doesn't have any ReferenceBlock element, the
    /// Block it contains can be decoded without using any other Block data.
    pub reference_block: Vec<ReferenceBlock>,
}

impl Element for BlockGroup {
    const ID: VInt64 = VInt64::from_encoded(0xA0);
    nested! {
        required: [ Block ],
        optional: [ BlockDuration, ReferencePriority, Slices ],
        multiple: [ ReferenceBlock ],
    }
}

/// Contains slices description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Slices {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Contains extra time information about the data contained in the Block.
    pub time_slice: Vec<TimeSlice>,
}

impl Element for Slices {
    const ID: VInt64 = VInt64::from_encoded(0x8E);
    nested! {
        required: [ ],
        optional: [ ],
        multiple: [ TimeSlice ],
    }
}

/// Contains extra time information about the data contained in the Block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeSlice {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The number of the frame to generate from this lace with this delay.
    pub slice_frame_number: SliceFrameNumber,
    /// The duration of the lace, when it deviates from the track default.
    pub slice_duration: Option<SliceDuration>,
}

impl Element for TimeSlice {
    const ID: VInt64 = VInt64::from_encoded(0xE8);
    nested! {
        required: [ SliceFrameNumber ],
        optional: [ SliceDuration ],
        multiple: [ ],
    }
}

/// A Top-Level Element to speed seeking access.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cues {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Contains all information relative to a seek point in the Segment.
    pub cue_point: Vec<CuePoint>,
}

impl Element for Cues {
    const ID: VInt64 = VInt64::from_encoded(0x1C53BB6B);
    nested! {
        required: [ ],
        optional: [ ],
        multiple: [ CuePoint ],
    }
}

/// Contains all information relative to a seek point in the Segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CuePoint {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Absolute timestamp of the seek point, expressed in Segment Ticks.
    pub cue_time: CueTime,
    /// Contain positions for different tracks corresponding to the timestamp.
    pub cue_track_positions: Vec<CueTrackPositions>,
}

impl Element for CuePoint {
    const ID: VInt64 = VInt64::from_encoded(0xBB);
    nested! {
        required: [ CueTime ],
        optional: [ ],
        multiple: [ CueTrackPositions ],
    }
}

/// Contain positions for different tracks corresponding to the timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CueTrackPositions {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The track for which a position is given.
    pub cue_track: CueTrack,
    /// The Segment Position of the Cluster containing the associated Block.
    pub cue_cluster_position: CueClusterPosition,
    /// Number of the Block in the specified Cluster.
    pub cue_block_number: Option<CueBlockNumber>,
}

impl Element for CueTrackPositions {
    const ID: VInt64 = VInt64::from_encoded(0xB7);
    nested! {
        required: [ CueTrack, CueClusterPosition ],
        optional: [ CueBlockNumber ],
        multiple: [ ],
    }
}

/// A system to define basic menus and partition data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chapters {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Contains all information about a Segment edition.
    pub edition_entry: Vec<EditionEntry>,
}

impl Element for Chapters {
    const ID: VInt64 = VInt64::from_encoded(0x1043A770);
    nested! {
        required: [ ],
        optional: [ ],
        multiple: [ EditionEntry ],
    }
}

/// Contains all information about a Segment edition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditionEntry {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// A unique ID to identify the edition.
    pub edition_uid: Option<EditionUid>,
    /// Set to hide the edition in the user interface.
    pub edition_flag_hidden: Option<EditionFlagHidden>,
    /// Set if the edition should be used as the default one.
    pub edition_flag_default: Option<EditionFlagDefault>,
    /// Contains the atom information to use as the chapter atom.
    pub chapter_atom: Vec<ChapterAtom>,
}

impl Element for EditionEntry {
    const ID: VInt64 = VInt64::from_encoded(0x45B9);
    nested! {
        required: [ ],
        optional: [ EditionUid, EditionFlagHidden, EditionFlagDefault ],
        multiple: [ ChapterAtom ],
    }
}

/// Contains the atom information to use as the chapter atom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterAtom {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// A unique ID to identify the chapter.
    pub chapter_uid: ChapterUid,
    /// Timestamp of the start of the chapter, in nanoseconds.
    pub chapter_time_start: ChapterTimeStart,
    /// Timestamp of the end of the chapter, in nanoseconds.
    pub chapter_time_end: Option<ChapterTimeEnd>,
    /// Set to hide the chapter in the user interface.
    pub chapter_flag_hidden: Option<ChapterFlagHidden>,
    /// Set if the chapter is enabled.
    pub chapter_flag_enabled: Option<ChapterFlagEnabled>,
    /// List of tracks on which the chapter applies.
    pub chapter_track: Option<ChapterTrack>,
    /// Contains all possible strings to use for the chapter display.
    pub chapter_display: Vec<ChapterDisplay>,
}

impl Element for ChapterAtom {
    const ID: VInt64 = VInt64::from_encoded(0xB6);
    nested! {
        required: [ ChapterUid, ChapterTimeStart ],
        optional: [ ChapterTimeEnd, ChapterFlagHidden, ChapterFlagEnabled, ChapterTrack ],
        multiple: [ ChapterDisplay ],
    }
}

/// List of tracks on which the chapter applies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChapterTrack {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// UID of a Track to apply this chapter to.
    pub chapter_track_number: Vec<ChapterTrackNumber>,
}

impl Element for ChapterTrack {
    const ID: VInt64 = VInt64::from_encoded(0x8F);
    nested! {
        required: [ ],
        optional: [ ],
        multiple: [ ChapterTrackNumber ],
    }
}

/// Contains all possible strings to use for the chapter display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDisplay {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The string to use for this chapter.
    pub chap_string: ChapString,
    /// A language corresponding to the string.
    pub chap_language: Vec<ChapLanguage>,
    /// A country corresponding to the string.
    pub chap_country: Vec<ChapCountry>,
}

impl Element for ChapterDisplay {
    const ID: VInt64 = VInt64::from_encoded(0x80);
    nested! {
        required: [ ChapString ],
        optional: [ ],
        multiple: [ ChapLanguage, ChapCountry ],
    }
}

/// Element containing metadata describing Tracks, Editions, Chapters,
/// Attachments, or the Segment as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tags {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// A single metadata descriptor.
    pub tag: Vec<Tag>,
}

impl Element for Tags {
    const ID: VInt64 = VInt64::from_encoded(0x1254C367);
    nested! {
        required: [ ],
        optional: [ ],
        multiple: [ Tag ],
    }
}

/// A single metadata descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Specifies which other elements the metadata represented by this tag applies to.
    pub targets: Option<Targets>,
    /// Contains general information about the target.
    pub simple_tag: Vec<SimpleTag>,
}

impl Element for Tag {
    const ID: VInt64 = VInt64::from_encoded(0x7373);
    nested! {
        required: [ ],
        optional: [ Targets ],
        multiple: [ SimpleTag ],
    }
}

/// Specifies which other elements the metadata represented by this tag applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Targets {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// A number to indicate the logical level of the tag target.
    pub target_type_value: Option<TargetTypeValue>,
    /// A UID of a track the tags belong to.
    pub tag_track_uid: Vec<TagTrackUid>,
    /// A UID of a chapter the tags belong to.
    pub tag_chapter_uid: Vec<TagChapterUid>,
    /// A UID of an attachment the tags belong to.
    pub tag_attachment_uid: Vec<TagAttachmentUid>,
}

impl Element for Targets {
    const ID: VInt64 = VInt64::from_encoded(0x63C0);
    nested! {
        required: [ ],
        optional: [ TargetTypeValue ],
        multiple: [ TagTrackUid, TagChapterUid, TagAttachmentUid ],
    }
}

/// Contains general information about the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleTag {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The name of the tag value that is going to be stored.
    pub tag_name: TagName,
    /// The language of the tag.
    pub tag_language: Option<TagLanguage>,
    /// Set if this is the default or original language for this tag.
    pub tag_default: Option<TagDefault>,
    /// The tag value.
    pub tag_string: Option<TagString>,
    /// The tag value if it is binary.
    pub tag_binary: Option<TagBinary>,
}

impl Element for SimpleTag {
    const ID: VInt64 = VInt64::from_encoded(0x67C8);
    nested! {
        required: [ TagName ],
        optional: [ TagLanguage, TagDefault, TagString, TagBinary ],
        multiple: [ ],
    }
}

/// Contain attached files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attachments {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// An attached file.
    pub attached_file: Vec<AttachedFile>,
}

impl Element for Attachments {
    const ID: VInt64 = VInt64::from_encoded(0x1941A469);
    nested! {
        required: [ ],
        optional: [ ],
        multiple: [ AttachedFile ],
    }
}

/// An attached file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Filename of the attached file.
    pub file_name: FileName,
    /// Media type of the file.
    pub file_mime_type: FileMimeType,
    /// The data of the file.
    pub file_data: FileData,
    /// A UID to identify the attached file.
    pub file_uid: FileUid,
    /// A human-friendly name for the attached file.
    pub file_description: Option<FileDescription>,
}

impl Element for AttachedFile {
    const ID: VInt64 = VInt64::from_encoded(0x61A7);
    nested! {
        required: [ FileName, FileMimeType, FileData, FileUid ],
        optional: [ FileDescription ],
        multiple: [ ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functional::{Decode, Encode};

    #[test]
    fn ebml_head_roundtrip() {
        let head = Ebml {
            doc_type: Some(DocType("matroska".to_string())),
            doc_type_version: Some(DocTypeVersion(1)),
            doc_type_read_version: Some(DocTypeReadVersion(1)),
            ..Default::default()
        };
        let mut out = vec![];
        head.encode(&mut out).unwrap();
        let decoded = Ebml::decode(&mut &out[..]).unwrap();
        assert_eq!(head, decoded);
    }

    #[test]
    fn required_with_default_may_be_absent() {
        // An Info body missing TimestampScale decodes to the 1ms default.
        let info = Info {
            muxing_app: MuxingApp("test".into()),
            writing_app: WritingApp("test".into()),
            ..Default::default()
        };
        let mut body = vec![];
        info.muxing_app.encode(&mut body).unwrap();
        info.writing_app.encode(&mut body).unwrap();
        let decoded = Info::decode_body(&mut &body[..]).unwrap();
        assert_eq!(*decoded.timestamp_scale, 1_000_000);
    }

    #[test]
    fn missing_required_is_an_error() {
        let mut body = vec![];
        SeekPosition(12).encode(&mut body).unwrap();
        assert!(matches!(
            Seek::decode_body(&mut &body[..]),
            Err(Error::MissingElement(id)) if id == SeekId::ID
        ));
    }

    #[test]
    fn duplicate_required_is_an_error() {
        let mut body = vec![];
        SeekId(vec![0x1C, 0x53, 0xBB, 0x6B]).encode(&mut body).unwrap();
        SeekId(vec![0x1C, 0x53, 0xBB, 0x6B]).encode(&mut body).unwrap();
        SeekPosition(12).encode(&mut body).unwrap();
        assert!(matches!(
            Seek::decode_body(&mut &body[..]),
            Err(Error::DuplicateElement { .. })
        ));
    }

    #[test]
    fn unknown_children_are_skipped() {
        let mut body = vec![];
        Seek::to(Cues::ID, 77).encode(&mut body).unwrap();
        // A bogus element the muxer never writes.
        body.extend_from_slice(&[0xC7, 0x81, 0x00]);
        let decoded = SeekHead::decode_body(&mut &body[..]).unwrap();
        assert_eq!(decoded.seek.len(), 1);
        assert_eq!(*decoded.seek[0].seek_position, 77);
    }

    #[test]
    fn seek_id_bytes() {
        let seek = Seek::to(Cues::ID, 4096);
        assert_eq!(&seek.seek_id.0, &[0x1C, 0x53, 0xBB, 0x6B]);
        let seek = Seek::to(Info::ID, 100);
        assert_eq!(&seek.seek_id.0, &[0x15, 0x49, 0xA9, 0x66]);
    }
}
