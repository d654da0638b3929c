//! The cue (seek index) table collected while clusters are rendered.

use crate::functional::Encode;
use crate::leaf::{CueBlockNumber, CueClusterPosition, CueTime, CueTrack};
use crate::master::{CuePoint, CueTrackPositions, Cues};

/// One future CuePoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueEntry {
    /// Seek point timestamp in segment ticks.
    pub time: u64,
    /// Track number the entry belongs to.
    pub track: u64,
    /// Position of the containing cluster, relative to the segment data.
    pub cluster_position: u64,
    /// 1-based number of the block within its cluster.
    pub block_number: u64,
}

/// Collects cue entries during cluster rendering and renders the Cues
/// element on file close. The rendered size is cached for the splitter's
/// byte accounting.
#[derive(Debug, Default)]
pub struct CueIndex {
    entries: Vec<CueEntry>,
    cached_size: u64,
    cached_for: usize,
}

impl CueIndex {
    /// An empty index.
    pub fn new() -> Self {
        CueIndex::default()
    }

    /// Append an entry.
    pub fn add(&mut self, entry: CueEntry) {
        self.entries.push(entry);
    }

    /// Whether any entry was collected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of collected entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop all entries, for the next file of a split run.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cached_size = 0;
        self.cached_for = 0;
    }

    /// Build the Cues element.
    pub fn to_element(&self) -> Cues {
        Cues {
            crc32: None,
            void: None,
            cue_point: self
                .entries
                .iter()
                .map(|entry| CuePoint {
                    crc32: None,
                    void: None,
                    cue_time: CueTime(entry.time),
                    cue_track_positions: vec![CueTrackPositions {
                        crc32: None,
                        void: None,
                        cue_track: CueTrack(entry.track),
                        cue_cluster_position: CueClusterPosition(entry.cluster_position),
                        cue_block_number: (entry.block_number != 1)
                            .then_some(CueBlockNumber(entry.block_number)),
                    }],
                })
                .collect(),
        }
    }

    /// The size the Cues element would currently render to. Recomputed only
    /// when entries were added since the last call.
    pub fn rendered_size(&mut self) -> u64 {
        if self.cached_for != self.entries.len() {
            self.cached_size = self
                .to_element()
                .encoded_size()
                .unwrap_or(0);
            self.cached_for = self.entries.len();
        }
        self.cached_size
    }
}
