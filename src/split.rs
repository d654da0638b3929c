//! Output file splitting: the state machine that decides when to close the
//! current segment file and open the next one, plus output naming.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::packet::{Packet, SourceId};

/// How to split the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Start a new file once the current one reaches this many bytes
    /// (cues counted in).
    Bytes(u64),
    /// Start a new file once it spans this many nanoseconds.
    Duration(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitState {
    Writing,
    /// The threshold was crossed; waiting for the next key frame of the
    /// reference track so the split lands on a seekable boundary.
    PendingSplit,
}

/// Observes every packet about to be ingested and reports when the current
/// file must be rolled over.
#[derive(Debug)]
pub struct Splitter {
    mode: Option<SplitMode>,
    max_files: u64,
    reference_source: Option<SourceId>,
    state: SplitState,
    file_num: u64,
    first_timecode: i64,
}

impl Splitter {
    /// A splitter; `mode` of `None` never splits.
    pub fn new(mode: Option<SplitMode>, max_files: u64) -> Self {
        Splitter {
            mode,
            max_files,
            reference_source: None,
            state: SplitState::Writing,
            file_num: 1,
            first_timecode: -1,
        }
    }

    /// Set the track whose key frames anchor split points (video if
    /// present, else the first track).
    pub fn set_reference_source(&mut self, source: Option<SourceId>) {
        self.reference_source = source;
    }

    /// The number of the file currently being written, 1-based.
    pub fn file_num(&self) -> u64 {
        self.file_num
    }

    /// Whether the current file must be closed before ingesting `packet`.
    /// `writer_position` is the current output offset and `queued_cue_bytes`
    /// the size the cue index would currently render to.
    pub fn should_split(
        &mut self,
        packet: &Packet,
        writer_position: u64,
        queued_cue_bytes: u64,
    ) -> bool {
        let Some(mode) = self.mode else {
            return false;
        };
        if self.first_timecode == -1 {
            self.first_timecode = packet.assigned_timecode;
        }
        // Once the cap is reached the final file grows unbounded.
        if self.file_num >= self.max_files {
            return false;
        }

        if self.state == SplitState::Writing {
            let crossed = match mode {
                SplitMode::Duration(split_after) => {
                    packet.assigned_timecode - self.first_timecode >= split_after
                }
                SplitMode::Bytes(split_after) => {
                    writer_position + queued_cue_bytes >= split_after
                }
            };
            if crossed {
                self.state = SplitState::PendingSplit;
            }
        }

        self.state == SplitState::PendingSplit
            && packet.is_key()
            && Some(packet.source_id) == self.reference_source
    }

    /// Note that the muxer rolled over to the next output file.
    pub fn file_rolled(&mut self) {
        self.file_num += 1;
        self.first_timecode = -1;
        self.state = SplitState::Writing;
    }
}

/// Insert the file number into the output name: `%d` and `%0Nd` patterns
/// are substituted; otherwise `-NNN` goes in front of the extension (or at
/// the end when there is none).
pub fn output_name(path: &Path, file_num: u64) -> PathBuf {
    let name = path.to_string_lossy();

    if let Some(pos) = name.find("%d") {
        let mut out = String::with_capacity(name.len());
        out.push_str(&name[..pos]);
        out.push_str(&file_num.to_string());
        out.push_str(&name[pos + 2..]);
        return PathBuf::from(out);
    }

    if let Some(start) = name.find('%') {
        if let Some(end) = name[start + 1..].find('d') {
            let width_spec = &name[start + 1..start + 1 + end];
            if !width_spec.is_empty() && width_spec.chars().all(|c| c.is_ascii_digit()) {
                let width: usize = width_spec.trim_start_matches('0').parse().unwrap_or(1);
                let mut out = String::with_capacity(name.len());
                out.push_str(&name[..start]);
                out.push_str(&format!("{file_num:0width$}"));
                out.push_str(&name[start + 2 + end..]);
                return PathBuf::from(out);
            }
        }
    }

    let infix = format!("-{file_num:03}");
    match name.rfind('.') {
        Some(dot) => PathBuf::from(format!("{}{}{}", &name[..dot], infix, &name[dot..])),
        None => PathBuf::from(format!("{name}{infix}")),
    }
}

/// Hands the muxer a sink for each output file of a (possibly split) run.
pub trait OutputProvider {
    /// The sink type produced.
    type Sink: std::io::Write + std::io::Seek;

    /// Open the sink for file number `file_num` (1-based) and return it
    /// together with the name recorded in the segment info.
    fn open(&mut self, file_num: u64) -> std::io::Result<(Self::Sink, String)>;
}

/// Writes output files to disk, deriving split file names from the base
/// path.
#[derive(Debug)]
pub struct FileOutput {
    base: PathBuf,
    splitting: bool,
}

impl FileOutput {
    /// An output provider writing to `base`; when `splitting`, file names
    /// are derived with [`output_name`].
    pub fn new(base: impl Into<PathBuf>, splitting: bool) -> Self {
        FileOutput {
            base: base.into(),
            splitting,
        }
    }
}

impl OutputProvider for FileOutput {
    type Sink = BufWriter<File>;

    fn open(&mut self, file_num: u64) -> std::io::Result<(Self::Sink, String)> {
        let path = if self.splitting {
            output_name(&self.base, file_num)
        } else {
            self.base.clone()
        };
        let file = File::create(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok((BufWriter::new(file), name))
    }
}
