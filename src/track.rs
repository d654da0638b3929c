//! Track descriptors and the registry of active tracks.

use crate::leaf::*;
use crate::master::{
    Audio, ContentCompression, ContentEncoding, ContentEncodings, TrackEntry, Tracks, Video,
};
use crate::packet::SourceId;

/// Track type codes as serialised into TrackType.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// A video track.
    Video,
    /// An audio track.
    Audio,
    /// A subtitle track.
    Subtitle,
}

impl MediaKind {
    /// The TrackType code.
    pub fn code(&self) -> u64 {
        match self {
            MediaKind::Video => 0x01,
            MediaKind::Audio => 0x02,
            MediaKind::Subtitle => 0x11,
        }
    }
}

/// When to add cue (seek index) entries for a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CuePolicy {
    /// No cue entries.
    #[default]
    None,
    /// One entry per key frame.
    IFrames,
    /// One entry per block.
    All,
}

/// Compression scheme signalled in the track's ContentEncodings. Applying
/// the compression to payloads is the packetizer's concern; the registry
/// only writes the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionPolicy {
    /// No compression.
    #[default]
    None,
    /// zlib.
    Zlib,
    /// bzip2.
    Bz2,
    /// LZO1X.
    Lzo,
}

impl CompressionPolicy {
    fn algo_code(&self) -> Option<u64> {
        match self {
            CompressionPolicy::None => None,
            CompressionPolicy::Zlib => Some(0),
            CompressionPolicy::Bz2 => Some(1),
            CompressionPolicy::Lzo => Some(2),
        }
    }
}

/// Audio parameters of a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioParams {
    /// Number of channels.
    pub channels: u64,
    /// Sampling frequency in Hz.
    pub sampling_frequency: f64,
    /// Output sampling frequency in Hz when it differs (SBR).
    pub output_sampling_frequency: Option<f64>,
    /// Bits per sample.
    pub bit_depth: Option<u64>,
}

/// Video parameters of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoParams {
    /// Encoded frame width in pixels.
    pub pixel_width: u64,
    /// Encoded frame height in pixels.
    pub pixel_height: u64,
    /// Display width; derived from the aspect ratio when given.
    pub display_width: Option<u64>,
    /// Display height.
    pub display_height: Option<u64>,
}

impl VideoParams {
    /// Derive the display size from a display aspect ratio, keeping the
    /// pixel height.
    pub fn with_aspect_ratio(mut self, aspect_ratio: f64) -> Self {
        self.display_width = Some((self.pixel_height as f64 * aspect_ratio).round() as u64);
        self.display_height = Some(self.pixel_height);
        self
    }
}

/// Everything the muxer knows about one track. Produced by the source's
/// `set_headers` and frozen afterwards, apart from `default_duration_ns`
/// and the audio output sampling frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDescriptor {
    /// The kind of media carried.
    pub kind: MediaKind,
    /// The codec identifier, e.g. `A_MPEG/L3`.
    pub codec_id: String,
    /// Codec private data.
    pub codec_private: Option<Vec<u8>>,
    /// Default frame duration in nanoseconds.
    pub default_duration_ns: Option<u64>,
    /// Minimum number of frames a player should cache.
    pub min_cache: u64,
    /// Maximum cache size necessary for referenced frames.
    pub max_cache: Option<u64>,
    /// Audio parameters, for audio tracks.
    pub audio: Option<AudioParams>,
    /// Video parameters, for video tracks.
    pub video: Option<VideoParams>,
    /// Track language (ISO 639-2).
    pub language: String,
    /// Human-readable track name.
    pub name: Option<String>,
    /// Eligible for automatic selection.
    pub default_flag: bool,
    /// Must be played.
    pub forced_flag: bool,
    /// Cue entry policy.
    pub cue_policy: CuePolicy,
    /// Compression signalled in the track headers.
    pub compression: CompressionPolicy,
    /// Whether blocks of this track may be laced.
    pub lacing_allowed: bool,
}

impl TrackDescriptor {
    /// A descriptor with the defaults for `kind`: video tracks get cue
    /// entries for key frames and no lacing, everything else gets lacing
    /// and no cues.
    pub fn new(kind: MediaKind, codec_id: impl Into<String>) -> Self {
        let is_video = kind == MediaKind::Video;
        TrackDescriptor {
            kind,
            codec_id: codec_id.into(),
            codec_private: None,
            default_duration_ns: None,
            min_cache: 0,
            max_cache: None,
            audio: None,
            video: None,
            language: "eng".to_string(),
            name: None,
            default_flag: true,
            forced_flag: false,
            cue_policy: if is_video {
                CuePolicy::IFrames
            } else {
                CuePolicy::None
            },
            compression: CompressionPolicy::None,
            lacing_allowed: !is_video,
        }
    }
}

/// One registered track: the descriptor plus the identity the muxer
/// assigned to it.
#[derive(Debug, Clone)]
pub struct RegisteredTrack {
    /// The producing source.
    pub source_id: SourceId,
    /// Track number used in block headers, 1-based and unique per segment.
    pub track_number: u64,
    /// Track UID, unique across files when linking.
    pub track_uid: u64,
    /// The frozen descriptor.
    pub descriptor: TrackDescriptor,
}

/// The set of active tracks of one mux run. Assigns track numbers and UIDs
/// and renders the Tracks element.
#[derive(Debug, Default)]
pub struct TrackRegistry {
    tracks: Vec<RegisteredTrack>,
}

impl TrackRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        TrackRegistry { tracks: Vec::new() }
    }

    /// Register the descriptor a source produced. Track numbers are handed
    /// out in registration order, starting at 1. With `no_variable_data`
    /// the UID equals the track number instead of being random.
    pub fn register(
        &mut self,
        source_id: SourceId,
        descriptor: TrackDescriptor,
        no_variable_data: bool,
    ) -> u64 {
        let track_number = self.tracks.len() as u64 + 1;
        let track_uid = if no_variable_data {
            track_number
        } else {
            let bytes = uuid::Uuid::new_v4().into_bytes();
            u64::from_be_bytes(bytes[..8].try_into().expect("uuid is 16 bytes")) & 0xFFFF_FFFF
        };
        self.tracks.push(RegisteredTrack {
            source_id,
            track_number,
            track_uid,
            descriptor,
        });
        track_number
    }

    /// All registered tracks.
    pub fn tracks(&self) -> &[RegisteredTrack] {
        &self.tracks
    }

    /// The track registered for a source.
    pub fn by_source(&self, source_id: SourceId) -> Option<&RegisteredTrack> {
        self.tracks.iter().find(|t| t.source_id == source_id)
    }

    /// The source whose key frames anchor split points: the first video
    /// track when one exists, else the first track. With no video track the
    /// first track's notion of "key frame" decides, even for subtitles.
    pub fn reference_source(&self) -> Option<SourceId> {
        self.tracks
            .iter()
            .find(|t| t.descriptor.kind == MediaKind::Video)
            .or_else(|| self.tracks.first())
            .map(|t| t.source_id)
    }

    /// Whether any video track is registered.
    pub fn has_video(&self) -> bool {
        self.tracks
            .iter()
            .any(|t| t.descriptor.kind == MediaKind::Video)
    }

    /// Without a video track, the first track's key frames feed the cue
    /// index so audio-only output remains seekable.
    pub fn resolve_cue_policies(&mut self) {
        if self.has_video() {
            return;
        }
        if let Some(first) = self.tracks.first_mut() {
            if first.descriptor.cue_policy == CuePolicy::None {
                first.descriptor.cue_policy = CuePolicy::IFrames;
            }
        }
    }

    /// Apply a header update to a source's track.
    pub fn apply_update(&mut self, source_id: SourceId, update: &crate::packet::HeaderUpdate) {
        if let Some(track) = self.tracks.iter_mut().find(|t| t.source_id == source_id) {
            if let Some(duration) = update.default_duration_ns {
                track.descriptor.default_duration_ns = Some(duration);
            }
            if let Some(freq) = update.output_sampling_frequency {
                if let Some(audio) = track.descriptor.audio.as_mut() {
                    audio.output_sampling_frequency = Some(freq);
                }
            }
        }
    }

    /// Render the Tracks element from the registered descriptors.
    pub fn to_tracks(&self) -> Tracks {
        Tracks {
            crc32: None,
            void: None,
            track_entry: self.tracks.iter().map(track_entry).collect(),
        }
    }
}

fn track_entry(track: &RegisteredTrack) -> TrackEntry {
    let d = &track.descriptor;
    TrackEntry {
        crc32: None,
        void: None,
        track_number: TrackNumber(track.track_number),
        track_uid: TrackUid(track.track_uid),
        track_type: TrackType(d.kind.code()),
        codec_id: CodecId(d.codec_id.clone()),
        codec_private: d.codec_private.clone().map(CodecPrivate),
        default_duration: d.default_duration_ns.map(DefaultDuration),
        min_cache: Some(MinCache(d.min_cache)),
        max_cache: d.max_cache.map(MaxCache),
        flag_enabled: Some(FlagEnabled(1)),
        flag_default: Some(FlagDefault(d.default_flag as u64)),
        flag_forced: Some(FlagForced(d.forced_flag as u64)),
        flag_lacing: Some(FlagLacing(d.lacing_allowed as u64)),
        language: Some(Language(d.language.clone())),
        name: d.name.clone().map(Name),
        audio: d.audio.as_ref().map(|a| Audio {
            crc32: None,
            void: None,
            sampling_frequency: SamplingFrequency(a.sampling_frequency),
            channels: Channels(a.channels),
            output_sampling_frequency: a.output_sampling_frequency.map(OutputSamplingFrequency),
            bit_depth: a.bit_depth.map(BitDepth),
        }),
        video: d.video.as_ref().map(|v| Video {
            crc32: None,
            void: None,
            pixel_width: PixelWidth(v.pixel_width),
            pixel_height: PixelHeight(v.pixel_height),
            display_width: v.display_width.map(DisplayWidth),
            display_height: v.display_height.map(DisplayHeight),
        }),
        content_encodings: d.compression.algo_code().map(|algo| ContentEncodings {
            crc32: None,
            void: None,
            content_encoding: vec![ContentEncoding {
                crc32: None,
                void: None,
                content_encoding_order: ContentEncodingOrder(0),
                content_encoding_scope: ContentEncodingScope(1),
                content_encoding_type: ContentEncodingType(0),
                content_compression: Some(ContentCompression {
                    crc32: None,
                    void: None,
                    content_comp_algo: ContentCompAlgo(algo),
                    content_comp_settings: None,
                }),
            }],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_assigns_sequential_numbers() {
        let mut registry = TrackRegistry::new();
        let a = registry.register(
            SourceId(0),
            TrackDescriptor::new(MediaKind::Audio, "A_MPEG/L3"),
            true,
        );
        let v = registry.register(
            SourceId(1),
            TrackDescriptor::new(MediaKind::Video, "V_MPEG4/ISO/ASP"),
            true,
        );
        assert_eq!((a, v), (1, 2));
        assert_eq!(registry.by_source(SourceId(1)).unwrap().track_number, 2);
        // deterministic UIDs under no_variable_data
        assert_eq!(registry.tracks()[0].track_uid, 1);
    }

    #[test]
    fn reference_source_prefers_video() {
        let mut registry = TrackRegistry::new();
        registry.register(
            SourceId(0),
            TrackDescriptor::new(MediaKind::Audio, "A_AC3"),
            true,
        );
        assert_eq!(registry.reference_source(), Some(SourceId(0)));
        registry.register(
            SourceId(1),
            TrackDescriptor::new(MediaKind::Video, "V_MS/VFW/FOURCC"),
            true,
        );
        assert_eq!(registry.reference_source(), Some(SourceId(1)));
        assert!(registry.has_video());
    }

    #[test]
    fn defaults_by_kind() {
        let video = TrackDescriptor::new(MediaKind::Video, "V_REAL/RV40");
        assert_eq!(video.cue_policy, CuePolicy::IFrames);
        assert!(!video.lacing_allowed);
        let audio = TrackDescriptor::new(MediaKind::Audio, "A_VORBIS");
        assert_eq!(audio.cue_policy, CuePolicy::None);
        assert!(audio.lacing_allowed);
    }

    #[test]
    fn compression_renders_content_encodings() {
        let mut descriptor = TrackDescriptor::new(MediaKind::Subtitle, "S_VOBSUB");
        descriptor.compression = CompressionPolicy::Zlib;
        let mut registry = TrackRegistry::new();
        registry.register(SourceId(0), descriptor, true);
        let tracks = registry.to_tracks();
        let encodings = tracks.track_entry[0].content_encodings.as_ref().unwrap();
        assert_eq!(
            *encodings.content_encoding[0]
                .content_compression
                .as_ref()
                .unwrap()
                .content_comp_algo,
            0
        );
    }
}
