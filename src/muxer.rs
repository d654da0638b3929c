//! The muxer: wires the scheduler, cluster assembler, splitter and segment
//! layout together and drives the main loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::chapters::select_chapters_in_timeframe;
use crate::cluster::ClusterAssembler;
use crate::config::{MuxConfig, TIMECODE_SCALE};
use crate::cues::CueIndex;
use crate::layout::{FinishContext, SegmentLayout, SegmentUids};
use crate::leaf::{FileData, FileDescription, FileMimeType, FileName, FileUid};
use crate::master::{AttachedFile, Attachments, Chapters, Tags};
use crate::packet::{PacketSource, SourceId};
use crate::scheduler::MuxScheduler;
use crate::split::{OutputProvider, Splitter};
use crate::track::TrackRegistry;

/// An attachment to carry in the output.
#[derive(Debug, Clone)]
pub struct AttachmentSpec {
    /// File name stored in the attachment.
    pub file_name: String,
    /// MIME type.
    pub mime_type: String,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// The attachment payload.
    pub data: Vec<u8>,
    /// Attach to every output file of a split run, or only to the first.
    pub attach_to_all_files: bool,
}

/// What a mux run produced.
#[derive(Debug, Clone, Default)]
pub struct MuxOutcome {
    /// Number of output files written.
    pub files_written: u64,
    /// Warnings issued; any warning flips the suggested exit code to 1.
    pub warnings: u64,
    /// Sources dropped after a read error.
    pub source_errors: Vec<SourceId>,
    /// Whether the run was cut short by the interrupt flag.
    pub interrupted: bool,
}

impl MuxOutcome {
    /// The conventional process exit code: 0 success, 1 with warnings,
    /// 2 after a fatal condition (dropped source or interrupt).
    pub fn exit_code(&self) -> i32 {
        if !self.source_errors.is_empty() || self.interrupted {
            2
        } else if self.warnings > 0 {
            1
        } else {
            0
        }
    }
}

fn new_uid(no_variable_data: bool) -> [u8; 16] {
    if no_variable_data {
        [0u8; 16]
    } else {
        uuid::Uuid::new_v4().into_bytes()
    }
}

/// The segment UID chain across the files of one run.
struct UidChain {
    current: [u8; 16],
    next: [u8; 16],
    previous: Option<[u8; 16]>,
    no_variable_data: bool,
}

impl UidChain {
    fn first(config: &MuxConfig) -> Self {
        UidChain {
            current: new_uid(config.no_variable_data),
            next: new_uid(config.no_variable_data),
            previous: config.link_to_previous,
            no_variable_data: config.no_variable_data,
        }
    }

    fn roll(&mut self) {
        self.previous = Some(self.current);
        self.current = self.next;
        self.next = new_uid(self.no_variable_data);
    }

    fn for_file(&self, config: &MuxConfig) -> SegmentUids {
        let linking = !config.no_linking;
        SegmentUids {
            current: self.current,
            previous: self.previous.filter(|_| linking),
            next: if !linking {
                None
            } else if config.split.is_some() {
                Some(self.next)
            } else {
                config.link_to_next
            },
        }
    }
}

fn build_attachments(
    specs: &[AttachmentSpec],
    no_variable_data: bool,
    file_num: u64,
) -> Option<Attachments> {
    let attached_file: Vec<AttachedFile> = specs
        .iter()
        .enumerate()
        .filter(|(_, spec)| file_num == 1 || spec.attach_to_all_files)
        .map(|(index, spec)| AttachedFile {
            crc32: None,
            void: None,
            file_name: FileName(spec.file_name.clone()),
            file_mime_type: FileMimeType(spec.mime_type.clone()),
            file_data: FileData(spec.data.clone()),
            file_uid: FileUid(if no_variable_data {
                index as u64 + 1
            } else {
                u64::from_be_bytes(
                    uuid::Uuid::new_v4().into_bytes()[..8]
                        .try_into()
                        .expect("uuid is 16 bytes"),
                ) & 0xFFFF_FFFF
            }),
            file_description: spec.description.clone().map(FileDescription),
        })
        .collect();
    if attached_file.is_empty() {
        None
    } else {
        Some(Attachments {
            crc32: None,
            void: None,
            attached_file,
        })
    }
}

/// The muxing engine. Register sources, then [`run`](Muxer::run).
pub struct Muxer<P: OutputProvider> {
    config: MuxConfig,
    provider: P,
    sources: Vec<Box<dyn PacketSource>>,
    chapters: Option<Chapters>,
    tags: Option<Tags>,
    attachments: Vec<AttachmentSpec>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<P: OutputProvider> Muxer<P> {
    /// A muxer writing through `provider`. The configuration is validated
    /// when the run starts.
    pub fn new(config: MuxConfig, provider: P) -> Self {
        Muxer {
            config,
            provider,
            sources: Vec::new(),
            chapters: None,
            tags: None,
            attachments: Vec::new(),
            interrupt: None,
        }
    }

    /// Register a packet source. Sources are polled in registration order
    /// and their tracks numbered accordingly.
    pub fn add_source(&mut self, source: Box<dyn PacketSource>) -> SourceId {
        self.sources.push(source);
        SourceId(self.sources.len() - 1)
    }

    /// Chapters to write into the output (already parsed).
    pub fn set_chapters(&mut self, chapters: Chapters) {
        self.chapters = Some(chapters);
    }

    /// Tags to write into the output (already parsed).
    pub fn set_tags(&mut self, tags: Tags) {
        self.tags = Some(tags);
    }

    /// Add an attachment.
    pub fn add_attachment(&mut self, attachment: AttachmentSpec) {
        self.attachments.push(attachment);
    }

    /// A flag the host may set from a signal handler; it is polled between
    /// main-loop iterations and triggers the normal file-closure path, so
    /// the interrupted output stays playable.
    pub fn set_interrupt_flag(&mut self, flag: Arc<AtomicBool>) {
        self.interrupt = Some(flag);
    }

    /// Diagnostic description of every registered source.
    pub fn identify(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.identify()).collect()
    }

    /// Run the mux to completion (or interruption). Fatal errors abort the
    /// loop but still route through the file-closure path, so the output
    /// stays playable up to the last rendered cluster.
    pub fn run(self) -> crate::Result<MuxOutcome> {
        let Muxer {
            config,
            mut provider,
            mut sources,
            chapters,
            tags,
            attachments,
            interrupt,
        } = self;
        config.validate()?;
        let splitting = config.split.is_some();

        let mut registry = TrackRegistry::new();
        for (index, source) in sources.iter_mut().enumerate() {
            let descriptor = source.set_headers()?;
            registry.register(SourceId(index), descriptor, config.no_variable_data);
        }
        registry.resolve_cue_policies();

        let mut scheduler = MuxScheduler::new(sources.len());
        let mut assembler = ClusterAssembler::new(
            config.cluster_limits(),
            TIMECODE_SCALE,
            config.lacing,
            config.use_durations,
            config.use_timeslices,
            config.write_cues,
        );
        let mut splitter = Splitter::new(config.split, config.split_max_files);
        splitter.set_reference_source(registry.reference_source());
        let mut cues = CueIndex::new();
        let mut uids = UidChain::first(&config);
        let mut outcome = MuxOutcome::default();

        let (sink, file_name) = provider.open(1)?;
        let mut layout = SegmentLayout::open(
            sink,
            &file_name,
            None,
            &config,
            &registry,
            uids.for_file(&config),
            splitting,
            chapters.as_ref(),
            build_attachments(&attachments, config.no_variable_data, 1).as_ref(),
        )?;
        let mut prev_file_name = file_name;
        outcome.files_written = 1;

        let mut mux_loop = || -> crate::Result<()> {
            loop {
                if let Some(flag) = &interrupt {
                    if flag.load(Ordering::Relaxed) {
                        log::warn!("interrupt received; sanitizing the current output file");
                        outcome.interrupted = true;
                        return Ok(());
                    }
                }

                let Some(packet) = scheduler.next_packet(&mut sources)? else {
                    return Ok(());
                };

                // Header revisions (default duration, SBR output rate) are
                // folded into the reserved space behind the track headers.
                for (index, source) in sources.iter_mut().enumerate() {
                    if let Some(update) = source.header_update() {
                        registry.apply_update(SourceId(index), &update);
                        layout.rerender_tracks(&registry)?;
                    }
                }

                let writer_position = layout.writer_mut().position()?;
                if splitter.should_split(&packet, writer_position, cues.rendered_size()) {
                    let payload_start = layout.payload_start();
                    assembler.render(
                        &registry,
                        layout.writer_mut(),
                        payload_start,
                        &mut cues,
                    )?;

                    // The finished file's duration ends at the split
                    // packet; the true maximum comes back afterwards.
                    let old_max = assembler.max_timecode_raw();
                    assembler.set_max_timecode_raw(packet.assigned_timecode);
                    outcome.warnings += finish_file(
                        &mut layout,
                        &config,
                        &assembler,
                        &cues,
                        chapters.as_ref(),
                        tags.as_ref(),
                        false,
                    )?;
                    assembler.set_max_timecode_raw(old_max);

                    splitter.file_rolled();
                    uids.roll();
                    let file_num = splitter.file_num();
                    let (sink, file_name) = provider.open(file_num)?;
                    layout = SegmentLayout::open(
                        sink,
                        &file_name,
                        Some(prev_file_name.as_str()),
                        &config,
                        &registry,
                        uids.for_file(&config),
                        splitting,
                        chapters.as_ref(),
                        build_attachments(&attachments, config.no_variable_data, file_num)
                            .as_ref(),
                    )?;
                    prev_file_name = file_name;
                    outcome.files_written += 1;
                    assembler.begin_file(config.no_linking);
                    cues.clear();
                }

                let payload_start = layout.payload_start();
                assembler.add_packet(
                    packet,
                    &registry,
                    layout.writer_mut(),
                    payload_start,
                    &mut cues,
                )?;
            }
        };
        let loop_result = mux_loop();

        // The closure path always runs, so whatever was muxed so far stays
        // playable.
        let payload_start = layout.payload_start();
        let flush_result = assembler.render(
            &registry,
            layout.writer_mut(),
            payload_start,
            &mut cues,
        );
        let finish_result = finish_file(
            &mut layout,
            &config,
            &assembler,
            &cues,
            chapters.as_ref(),
            tags.as_ref(),
            true,
        );
        drop(layout.into_sink());

        loop_result?;
        flush_result?;
        outcome.warnings += finish_result?;
        outcome.source_errors = scheduler.failed_sources().to_vec();
        Ok(outcome)
    }
}

/// Close the current output file through the layout's closure path.
fn finish_file<W: std::io::Write + std::io::Seek>(
    layout: &mut SegmentLayout<W>,
    config: &MuxConfig,
    assembler: &ClusterAssembler,
    cues: &CueIndex,
    chapters: Option<&Chapters>,
    tags: Option<&Tags>,
    last_file: bool,
) -> crate::Result<u64> {
    let duration_ticks =
        (assembler.max_timecode() - assembler.first_timecode()) as f64 / TIMECODE_SCALE as f64;

    let selected_chapters = match (chapters, config.split.is_some()) {
        (Some(chapters), true) => {
            // Chapter times are absolute; the window and the shift both go
            // through the segment's timecode offset, since everything
            // written into the file already had it subtracted.
            let offset = assembler.timecode_offset();
            let start = assembler.first_timecode() + offset;
            let end = assembler.max_timecode() + offset;
            select_chapters_in_timeframe(chapters, start, end, offset)
        }
        _ => None,
    };

    layout.finish(
        config,
        cues,
        FinishContext {
            duration_ticks,
            cluster_positions: assembler.cluster_positions(),
            chapters: selected_chapters,
            tags,
            last_file,
            external_next_uid: config.link_to_next,
        },
    )
}
