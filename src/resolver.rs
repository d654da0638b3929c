//! Reference resolution: matching backward/forward reference timecodes to
//! already-ingested packets, and deciding when packet payloads and whole
//! clusters may be released.

use std::collections::HashMap;

use crate::cluster::ClusterContents;
use crate::error::Error;
use crate::packet::{NO_REFERENCE, SourceId};

/// Tracks, per source, the highest timecode declared free, and resolves
/// reference timecodes to packets in the cluster arena.
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    /// Highest timecode each source has declared free. A key frame frees
    /// everything before it.
    free_marks: HashMap<SourceId, i64>,
    /// Match slack in nanoseconds: one timecode tick, absorbing demuxer
    /// rounding. This deliberately also masks off-by-one backwards
    /// timecodes from upstream demuxers.
    fuzz: i64,
}

impl ReferenceResolver {
    /// A resolver whose fuzzy match allows `fuzz` nanoseconds of slack
    /// (one segment tick).
    pub fn new(fuzz: i64) -> Self {
        ReferenceResolver {
            free_marks: HashMap::new(),
            fuzz,
        }
    }

    /// Declare that nothing at or before `timecode` of `source_id` is
    /// referenced by anything that still matters.
    pub fn free_ref(&mut self, timecode: i64, source_id: SourceId) {
        self.free_marks.insert(source_id, timecode);
    }

    /// The free mark of a source, if any.
    pub fn free_mark(&self, source_id: SourceId) -> Option<i64> {
        self.free_marks.get(&source_id).copied()
    }

    /// Forget all free marks (new mux run).
    pub fn reset(&mut self) {
        self.free_marks.clear();
    }

    /// Locate the packet of `source_id` with the given raw timecode. Exact
    /// matches win; otherwise anything within the fuzz is accepted.
    pub fn find_packet<'a>(
        &self,
        clusters: &'a [ClusterContents],
        ref_timecode: i64,
        source_id: SourceId,
    ) -> Option<&'a crate::packet::Packet> {
        let mut fuzzy = None;
        for cluster in clusters {
            for packet in &cluster.packets {
                if packet.source_id != source_id {
                    continue;
                }
                if packet.timecode == ref_timecode {
                    return Some(packet);
                }
                if fuzzy.is_none() && (packet.timecode - ref_timecode).abs() <= self.fuzz {
                    fuzzy = Some(packet);
                }
            }
        }
        fuzzy
    }

    /// The index of the cluster containing the referenced packet.
    fn find_packet_cluster(
        &self,
        clusters: &[ClusterContents],
        ref_timecode: i64,
        source_id: SourceId,
    ) -> Option<usize> {
        let mut fuzzy = None;
        for (index, cluster) in clusters.iter().enumerate() {
            for packet in &cluster.packets {
                if packet.source_id != source_id {
                    continue;
                }
                if packet.timecode == ref_timecode {
                    return Some(index);
                }
                if fuzzy.is_none() && (packet.timecode - ref_timecode).abs() <= self.fuzz {
                    fuzzy = Some(index);
                }
            }
        }
        fuzzy
    }

    /// Whether every reference of every packet in `cluster` can be resolved
    /// against the arena. A cluster must not be closed while this is false.
    pub fn all_references_resolved(
        &self,
        clusters: &[ClusterContents],
        cluster: &ClusterContents,
    ) -> bool {
        cluster.packets.iter().all(|packet| {
            (packet.bref == NO_REFERENCE
                || self
                    .find_packet(clusters, packet.bref, packet.source_id)
                    .is_some())
                && (packet.fref == NO_REFERENCE
                    || self
                        .find_packet(clusters, packet.fref, packet.source_id)
                        .is_some())
        })
    }

    /// Release everything that can be released:
    ///
    /// 1. mark packets superseded when their source's free mark has moved
    ///    past them;
    /// 2. walk the survivors and mark the clusters their backward
    ///    references land in as still referenced, failing hard on a
    ///    dangling reference;
    /// 3. drop every cluster that is rendered and unreferenced.
    pub fn free_clusters(&self, clusters: &mut Vec<ClusterContents>) -> crate::Result<()> {
        for cluster in clusters.iter_mut() {
            cluster.is_referenced = false;
            for packet in &mut cluster.packets {
                if let Some(mark) = self.free_marks.get(&packet.source_id) {
                    if *mark > packet.timecode {
                        packet.superseded = true;
                    }
                }
            }
        }

        let mut referenced = vec![false; clusters.len()];
        for index in 0..clusters.len() {
            for k in 0..clusters[index].packets.len() {
                let (source_id, timecode, bref, superseded) = {
                    let p = &clusters[index].packets[k];
                    (p.source_id, p.timecode, p.bref, p.superseded)
                };
                if superseded {
                    continue;
                }
                referenced[index] = true;
                if bref == NO_REFERENCE {
                    continue;
                }
                let target = self
                    .find_packet_cluster(clusters, bref, source_id)
                    .ok_or(Error::ReferenceUnresolved {
                        source_id,
                        timecode,
                        ref_timecode: bref,
                    })?;
                referenced[target] = true;
            }
        }
        for (cluster, flag) in clusters.iter_mut().zip(&referenced) {
            cluster.is_referenced = *flag;
        }

        clusters.retain(|cluster| !cluster.rendered || cluster.is_referenced);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;
    use bytes::Bytes;

    fn packet(source: usize, timecode: i64, bref: i64) -> Packet {
        let mut p = Packet::new(Bytes::new(), timecode).with_bref(bref);
        p.source_id = SourceId(source);
        p
    }

    fn arena(groups: Vec<(Vec<Packet>, bool)>) -> Vec<ClusterContents> {
        groups
            .into_iter()
            .map(|(packets, rendered)| ClusterContents {
                packets,
                rendered,
                is_referenced: false,
            })
            .collect()
    }

    #[test]
    fn exact_match_beats_fuzzy() {
        let resolver = ReferenceResolver::new(1_000_000);
        let clusters = arena(vec![(
            vec![packet(0, 40_000_000, -1), packet(0, 40_500_000, -1)],
            false,
        )]);
        let found = resolver
            .find_packet(&clusters, 40_500_000, SourceId(0))
            .unwrap();
        assert_eq!(found.timecode, 40_500_000);
        // one tick off still resolves
        let found = resolver
            .find_packet(&clusters, 39_100_000, SourceId(0))
            .unwrap();
        assert_eq!(found.timecode, 40_000_000);
        // but not for the wrong source
        assert!(resolver.find_packet(&clusters, 40_000_000, SourceId(1)).is_none());
    }

    #[test]
    fn unresolved_reference_blocks_cluster_close() {
        let resolver = ReferenceResolver::new(1_000_000);
        let clusters = arena(vec![(
            vec![packet(0, 0, -1), packet(0, 80_000_000, 40_000_000)],
            false,
        )]);
        assert!(!resolver.all_references_resolved(&clusters, &clusters[0]));

        let clusters = arena(vec![(
            vec![packet(0, 40_000_000, -1), packet(0, 80_000_000, 40_000_000)],
            false,
        )]);
        assert!(resolver.all_references_resolved(&clusters, &clusters[0]));
    }

    #[test]
    fn free_clusters_keeps_referenced_rendered_clusters() {
        let mut resolver = ReferenceResolver::new(1_000_000);
        // Cluster 0 rendered, holding the I frame a packet in cluster 1
        // still points back at.
        let mut clusters = arena(vec![
            (vec![packet(0, 0, -1)], true),
            (vec![packet(0, 40, 0)], false),
        ]);
        resolver.free_ref(0, SourceId(0));
        resolver.free_clusters(&mut clusters).unwrap();
        assert_eq!(clusters.len(), 2);

        // A new key frame frees everything before it.
        clusters[1].rendered = true;
        clusters.push(ClusterContents {
            packets: vec![packet(0, 80, -1)],
            rendered: false,
            is_referenced: false,
        });
        resolver.free_ref(80, SourceId(0));
        resolver.free_clusters(&mut clusters).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].packets[0].timecode, 80);
    }

    #[test]
    fn dangling_backward_reference_is_fatal() {
        let resolver = ReferenceResolver::new(1_000_000);
        let mut clusters = arena(vec![(vec![packet(0, 40_000_000, 7)], false)]);
        let err = resolver.free_clusters(&mut clusters).unwrap_err();
        assert!(matches!(err, Error::ReferenceUnresolved { .. }));
    }
}
