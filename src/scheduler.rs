//! The mux scheduler: polls packet sources round-robin and hands the packet
//! with the lowest assigned timecode to the cluster assembler.

use crate::packet::{Packet, PacketSource, SourceId, SourceStatus};

#[derive(Debug)]
struct Slot {
    status: SourceStatus,
    peeked: Option<Packet>,
    highest_timecode: i64,
    failed: bool,
}

/// Round-robins over the registered sources, keeps one packet peeked per
/// source, and picks the global winner. Sources reporting
/// [`SourceStatus::Holding`] are skipped for a round; sources reporting
/// [`SourceStatus::Error`] are dropped while the rest continue.
#[derive(Debug)]
pub struct MuxScheduler {
    slots: Vec<Slot>,
    sequence: u64,
    failed_sources: Vec<SourceId>,
}

impl MuxScheduler {
    /// A scheduler for `source_count` sources.
    pub fn new(source_count: usize) -> Self {
        MuxScheduler {
            slots: (0..source_count)
                .map(|_| Slot {
                    status: SourceStatus::MoreData,
                    peeked: None,
                    highest_timecode: 0,
                    failed: false,
                })
                .collect(),
            sequence: 0,
            failed_sources: Vec::new(),
        }
    }

    /// Sources that reported [`SourceStatus::Error`] so far.
    pub fn failed_sources(&self) -> &[SourceId] {
        &self.failed_sources
    }

    /// One scheduling round: refill every source's peeked packet, then pick
    /// the one with the lowest assigned timecode, tie-broken by ingestion
    /// order. `Ok(None)` means every source is drained.
    pub fn next_packet(
        &mut self,
        sources: &mut [Box<dyn PacketSource>],
    ) -> crate::Result<Option<Packet>> {
        debug_assert_eq!(sources.len(), self.slots.len());

        // Step 1: make sure a packet is peeked for each source as long as
        // it has more data to give.
        for (index, source) in sources.iter_mut().enumerate() {
            let slot = &mut self.slots[index];
            if slot.failed {
                continue;
            }
            if slot.status == SourceStatus::Holding {
                // a held source gets another chance every round
                slot.status = SourceStatus::MoreData;
            }
            while slot.peeked.is_none()
                && slot.status == SourceStatus::MoreData
                && source.packet_available() == 0
            {
                slot.status = source.read();
                if slot.status == SourceStatus::Error {
                    let source_id = SourceId(index);
                    log::error!("source {source_id} failed; dropping it and continuing");
                    slot.failed = true;
                    self.failed_sources.push(source_id);
                }
            }
            if slot.peeked.is_none() && !slot.failed {
                if let Some(mut packet) = source.pop() {
                    packet.source_id = SourceId(index);
                    if packet.assigned_timecode < slot.highest_timecode {
                        return Err(crate::Error::TimecodeBackwards {
                            source_id: packet.source_id,
                            timecode: packet.assigned_timecode,
                            previous: slot.highest_timecode,
                        });
                    }
                    slot.highest_timecode = packet.assigned_timecode;
                    packet.sequence_number = self.sequence;
                    self.sequence += 1;
                    slot.peeked = Some(packet);
                }
            }
        }

        // Step 2: lowest assigned timecode wins; ingestion order breaks
        // ties, and the sequence numbers assigned in scan order encode it.
        let winner = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.peeked
                    .as_ref()
                    .map(|p| (index, p.assigned_timecode, p.sequence_number))
            })
            .min_by_key(|(_, timecode, sequence)| (*timecode, *sequence))
            .map(|(index, _, _)| index);

        Ok(winner.and_then(|index| self.slots[index].peeked.take()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{PacketQueue, TimecodeSync};
    use crate::track::{MediaKind, TrackDescriptor};
    use bytes::Bytes;

    /// A scripted source: a list of (timecode, hold-before) entries.
    struct Scripted {
        queue: PacketQueue,
        script: Vec<(i64, bool)>,
        next: usize,
        fail_at: Option<usize>,
    }

    impl Scripted {
        fn new(timecodes: &[i64]) -> Self {
            Scripted {
                queue: PacketQueue::new(TimecodeSync::default()),
                script: timecodes.iter().map(|tc| (*tc, false)).collect(),
                next: 0,
                fail_at: None,
            }
        }

        fn holding_before_each(mut self) -> Self {
            for entry in &mut self.script {
                entry.1 = true;
            }
            self
        }
    }

    impl PacketSource for Scripted {
        fn read(&mut self) -> SourceStatus {
            if self.fail_at == Some(self.next) {
                return SourceStatus::Error;
            }
            let Some((timecode, hold)) = self.script.get_mut(self.next) else {
                return SourceStatus::NoMoreData;
            };
            if *hold {
                *hold = false;
                return SourceStatus::Holding;
            }
            let packet = Packet::new(Bytes::from_static(&[0u8; 4]), *timecode);
            self.next += 1;
            self.queue.push(packet).expect("monotonic script");
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

        fn set_headers(&mut self) -> crate::Result<TrackDescriptor> {
            Ok(TrackDescriptor::new(MediaKind::Audio, "A_TEST"))
        }

        fn identify(&self) -> String {
            "scripted test source".to_string()
        }
    }

    fn drain(
        scheduler: &mut MuxScheduler,
        sources: &mut [Box<dyn PacketSource>],
    ) -> Vec<(usize, i64)> {
        let mut order = Vec::new();
        while let Some(packet) = scheduler.next_packet(sources).unwrap() {
            order.push((packet.source_id.0, packet.assigned_timecode));
        }
        order
    }

    #[test]
    fn lowest_timecode_wins() {
        let mut sources: Vec<Box<dyn PacketSource>> = vec![
            Box::new(Scripted::new(&[0, 40, 80])),
            Box::new(Scripted::new(&[20, 60])),
        ];
        let mut scheduler = MuxScheduler::new(2);
        let order = drain(&mut scheduler, &mut sources);
        assert_eq!(order, vec![(0, 0), (1, 20), (0, 40), (1, 60), (0, 80)]);
    }

    #[test]
    fn equal_timecodes_keep_ingestion_order() {
        // Source 0 is scanned first, so its packet at 1000 is ingested
        // first and must win the tie.
        let mut sources: Vec<Box<dyn PacketSource>> = vec![
            Box::new(Scripted::new(&[1000])),
            Box::new(Scripted::new(&[1000])),
        ];
        let mut scheduler = MuxScheduler::new(2);
        let order = drain(&mut scheduler, &mut sources);
        assert_eq!(order, vec![(0, 1000), (1, 1000)]);
    }

    #[test]
    fn holding_source_does_not_deadlock() {
        let mut sources: Vec<Box<dyn PacketSource>> = vec![
            Box::new(Scripted::new(&[50, 90]).holding_before_each()),
            Box::new(Scripted::new(&[10, 70])),
        ];
        let mut scheduler = MuxScheduler::new(2);
        let order = drain(&mut scheduler, &mut sources);
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], (1, 10));
        // every packet still comes out in timecode order
        let timecodes: Vec<i64> = order.iter().map(|(_, tc)| *tc).collect();
        assert_eq!(timecodes, vec![10, 50, 70, 90]);
    }

    #[test]
    fn failed_source_is_dropped_but_others_continue() {
        let mut failing = Scripted::new(&[0, 30]);
        failing.fail_at = Some(1);
        let mut sources: Vec<Box<dyn PacketSource>> = vec![
            Box::new(failing),
            Box::new(Scripted::new(&[10, 20])),
        ];
        let mut scheduler = MuxScheduler::new(2);
        let order = drain(&mut scheduler, &mut sources);
        assert_eq!(order, vec![(0, 0), (1, 10), (1, 20)]);
        assert_eq!(scheduler.failed_sources(), &[SourceId(0)]);
    }

    #[test]
    fn backwards_timecode_is_fatal() {
        // Bypass PacketQueue's own guard to exercise the scheduler's.
        struct Backwards {
            packets: Vec<Packet>,
        }
        impl PacketSource for Backwards {
            fn read(&mut self) -> SourceStatus {
                if self.packets.is_empty() {
                    SourceStatus::NoMoreData
                } else {
                    SourceStatus::MoreData
                }
            }
            fn packet_available(&self) -> usize {
                self.packets.len()
            }
            fn peek(&self) -> Option<&Packet> {
                self.packets.first()
            }
            fn pop(&mut self) -> Option<Packet> {
                if self.packets.is_empty() {
                    None
                } else {
                    Some(self.packets.remove(0))
                }
            }
            fn set_headers(&mut self) -> crate::Result<TrackDescriptor> {
                Ok(TrackDescriptor::new(MediaKind::Audio, "A_TEST"))
            }
            fn identify(&self) -> String {
                "backwards".to_string()
            }
        }

        let mut sources: Vec<Box<dyn PacketSource>> = vec![Box::new(Backwards {
            packets: vec![
                Packet::new(Bytes::new(), 40),
                Packet::new(Bytes::new(), 10),
            ],
        })];
        let mut scheduler = MuxScheduler::new(1);
        assert!(scheduler.next_packet(&mut sources).unwrap().is_some());
        let err = scheduler.next_packet(&mut sources).unwrap_err();
        assert!(matches!(err, crate::Error::TimecodeBackwards { .. }));
    }
}
