//! Muxer configuration: the knobs that reach the muxing core.

use crate::cluster::ClusterLimits;
use crate::error::Error;
use crate::lacer::Lacer;
use crate::split::SplitMode;

/// The timecode scale of every produced segment: one millisecond per tick.
pub const TIMECODE_SCALE: u64 = 1_000_000;

/// Configuration of one mux run. `validate` rejects contradictory or
/// out-of-range combinations before the main loop starts.
#[derive(Debug, Clone)]
pub struct MuxConfig {
    /// Segment title.
    pub title: Option<String>,
    /// MuxingApp string written into the segment info.
    pub muxing_app: String,
    /// WritingApp string written into the segment info.
    pub writing_app: String,

    /// Cluster time budget in milliseconds (100..=32000).
    pub cluster_length_ms: u64,
    /// Maximum number of blocks per cluster.
    pub max_blocks_per_cluster: u64,
    /// Soft byte budget per cluster.
    pub max_cluster_bytes: u64,

    /// Write the cue index (`--no-cues` clears this).
    pub write_cues: bool,
    /// Write the per-cluster meta seek head
    /// (`--no-clusters-in-meta-seek` clears this).
    pub clusters_in_meta_seek: bool,

    /// Lacing style for eligible tracks; `None` disables lacing entirely
    /// (`--disable-lacing`).
    pub lacing: Option<Lacer>,
    /// Emit per-lace TimeSlice elements (`--enable-timeslices`).
    pub use_timeslices: bool,
    /// Emit BlockDuration whenever it deviates from the track default
    /// (`--enable-durations`).
    pub use_durations: bool,

    /// Split the output by size or duration.
    pub split: Option<SplitMode>,
    /// Hard cap on the number of split output files.
    pub split_max_files: u64,
    /// Do not link split files: every file restarts its timecodes at zero.
    pub no_linking: bool,
    /// Previous segment UID for the first file of the chain.
    pub link_to_previous: Option<[u8; 16]>,
    /// Next segment UID for the last file of the chain.
    pub link_to_next: Option<[u8; 16]>,

    /// Suppress all run-dependent data (random UIDs, DateUTC, app version
    /// strings) so two runs over the same inputs are byte-identical.
    pub no_variable_data: bool,
}

impl Default for MuxConfig {
    fn default() -> Self {
        MuxConfig {
            title: None,
            muxing_app: concat!("mkv-mux v", env!("CARGO_PKG_VERSION")).to_string(),
            writing_app: concat!("mkv-mux v", env!("CARGO_PKG_VERSION")).to_string(),
            cluster_length_ms: 2_000,
            max_blocks_per_cluster: 65_535,
            max_cluster_bytes: 1_500_000,
            write_cues: true,
            clusters_in_meta_seek: true,
            lacing: Some(Lacer::Xiph),
            use_timeslices: false,
            use_durations: false,
            split: None,
            split_max_files: 65_535,
            no_linking: false,
            link_to_previous: None,
            link_to_next: None,
            no_variable_data: false,
        }
    }
}

impl MuxConfig {
    /// Check the configuration for contradictions.
    pub fn validate(&self) -> crate::Result<()> {
        if !(100..=32_000).contains(&self.cluster_length_ms) {
            return Err(Error::InvalidConfig(format!(
                "cluster length must lie between 100ms and 32000ms, not {}ms",
                self.cluster_length_ms
            )));
        }
        if self.max_blocks_per_cluster == 0 || self.max_blocks_per_cluster > 65_535 {
            return Err(Error::InvalidConfig(
                "blocks per cluster must lie between 1 and 65535".to_string(),
            ));
        }
        match self.split {
            Some(SplitMode::Bytes(bytes)) if bytes == 0 => {
                return Err(Error::InvalidConfig("split size must not be zero".to_string()));
            }
            Some(SplitMode::Duration(ns)) if ns <= 0 => {
                return Err(Error::InvalidConfig(
                    "split duration must be positive".to_string(),
                ));
            }
            _ => {}
        }
        if self.split_max_files == 0 {
            return Err(Error::InvalidConfig(
                "the maximum number of split files must be at least 1".to_string(),
            ));
        }
        for (name, uid) in [
            ("link-to-previous", &self.link_to_previous),
            ("link-to-next", &self.link_to_next),
        ] {
            if let Some(uid) = uid {
                if uid.iter().all(|b| *b == 0) {
                    return Err(Error::InvalidConfig(format!(
                        "the {name} segment UID must contain at least one set bit"
                    )));
                }
            }
        }
        Ok(())
    }

    /// The cluster budgets this configuration implies.
    pub fn cluster_limits(&self) -> ClusterLimits {
        ClusterLimits {
            max_ns: self.cluster_length_ms as i64 * 1_000_000,
            max_blocks: self.max_blocks_per_cluster,
            max_bytes: self.max_cluster_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        MuxConfig::default().validate().unwrap();
    }

    #[test]
    fn cluster_length_range() {
        let mut config = MuxConfig::default();
        config.cluster_length_ms = 99;
        assert!(config.validate().is_err());
        config.cluster_length_ms = 32_001;
        assert!(config.validate().is_err());
        config.cluster_length_ms = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn malformed_link_uid() {
        let mut config = MuxConfig::default();
        config.link_to_previous = Some([0u8; 16]);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_split_size() {
        let mut config = MuxConfig::default();
        config.split = Some(SplitMode::Bytes(0));
        assert!(config.validate().is_err());
        config.split = Some(SplitMode::Duration(-5));
        assert!(config.validate().is_err());
    }
}
