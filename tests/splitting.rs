//! Split runs: segment chains, per-file chapters, timecode handling.

mod common;

use std::io::Cursor;

use common::*;
use mkv_mux::muxer::Muxer;
use mkv_mux::prelude::*;

/// 12 seconds of video: 200ms frames, one key frame per second.
fn twelve_second_video() -> ScriptedSource {
    ScriptedSource::new(video_descriptor(), video_gop_packets(60, 200, 5, 600))
}

fn chapter(uid: u64, start_ns: u64, name: &str) -> ChapterAtom {
    ChapterAtom {
        crc32: None,
        void: None,
        chapter_uid: ChapterUid(uid),
        chapter_time_start: ChapterTimeStart(start_ns),
        chapter_time_end: None,
        chapter_flag_hidden: None,
        chapter_flag_enabled: None,
        chapter_track: None,
        chapter_display: vec![ChapterDisplay {
            crc32: None,
            void: None,
            chap_string: ChapString(name.to_string()),
            chap_language: vec![ChapLanguage("eng".to_string())],
            chap_country: Vec::new(),
        }],
    }
}

fn test_chapters() -> Chapters {
    Chapters {
        crc32: None,
        void: None,
        edition_entry: vec![EditionEntry {
            crc32: None,
            void: None,
            edition_uid: Some(EditionUid(1)),
            edition_flag_hidden: None,
            edition_flag_default: None,
            chapter_atom: vec![chapter(1, 7_500_000_000, "midpoint")],
        }],
    }
}

fn run_split(config: MuxConfig, chapters: Option<Chapters>) -> Vec<Vec<u8>> {
    let output = MemoryOutput::new();
    let mut muxer = Muxer::new(config, output.clone());
    muxer.add_source(Box::new(twelve_second_video()));
    if let Some(chapters) = chapters {
        muxer.set_chapters(chapters);
    }
    muxer.run().expect("split run");
    output.files()
}

fn parse(bytes: &[u8]) -> (SegmentView, Cursor<&[u8]>) {
    let mut cursor = Cursor::new(bytes);
    let view = MatroskaView::new(&mut cursor).unwrap();
    (view.segment.into_iter().next().unwrap(), cursor)
}

#[test]
fn time_split_produces_a_linked_chain() {
    let config = MuxConfig {
        split: Some(SplitMode::Duration(5_000_000_000)),
        ..MuxConfig::default()
    };
    let files = run_split(config, None);
    assert_eq!(files.len(), 3);

    let (first, _) = parse(&files[0]);
    let (second, mut second_cursor) = parse(&files[1]);
    let (third, _) = parse(&files[2]);

    // durations: 5s, 5s, 2s
    assert_eq!(**first.info.duration.as_ref().unwrap(), 5_000.0);
    assert_eq!(**second.info.duration.as_ref().unwrap(), 5_000.0);
    assert_eq!(**third.info.duration.as_ref().unwrap(), 2_000.0);

    // the UID chain links the files in both directions
    let uid = |info: &Info| info.segment_uuid.as_ref().unwrap().0.clone();
    assert_eq!(first.info.next_uuid.as_ref().unwrap().0, uid(&second.info));
    assert_eq!(second.info.prev_uuid.as_ref().unwrap().0, uid(&first.info));
    assert_eq!(second.info.next_uuid.as_ref().unwrap().0, uid(&third.info));
    assert_eq!(third.info.prev_uuid.as_ref().unwrap().0, uid(&second.info));
    // the last file's NextUID is stripped on close
    assert!(third.info.next_uuid.is_none());

    // with linking, timecodes continue across the chain: the second file
    // starts at the 5s key frame
    let cluster = second
        .read_cluster(&mut second_cursor, second.cluster_positions[0])
        .unwrap();
    assert_eq!(*cluster.timestamp, 5_000);

    // split files record their names
    assert_eq!(
        &*first.info.segment_filename.as_ref().unwrap().0,
        "out-001.mkv"
    );
    assert_eq!(
        &*second.info.prev_filename.as_ref().unwrap().0,
        "out-001.mkv"
    );
}

#[test]
fn no_linking_restarts_the_clock() {
    let config = MuxConfig {
        split: Some(SplitMode::Duration(5_000_000_000)),
        no_linking: true,
        ..MuxConfig::default()
    };
    let files = run_split(config, None);
    assert_eq!(files.len(), 3);

    let (second, mut cursor) = parse(&files[1]);
    // no segment linking elements at all
    assert!(second.info.prev_uuid.is_none());
    assert!(second.info.next_uuid.is_none());
    // and the clock restarts at zero
    let cluster = second
        .read_cluster(&mut cursor, second.cluster_positions[0])
        .unwrap();
    assert_eq!(*cluster.timestamp, 0);
    assert_eq!(**second.info.duration.as_ref().unwrap(), 5_000.0);
}

#[test]
fn chapter_lands_in_the_file_covering_it() {
    let config = MuxConfig {
        split: Some(SplitMode::Duration(5_000_000_000)),
        ..MuxConfig::default()
    };
    let files = run_split(config, Some(test_chapters()));
    assert_eq!(files.len(), 3);

    let (first, _) = parse(&files[0]);
    let (second, _) = parse(&files[1]);
    let (third, _) = parse(&files[2]);

    assert!(first.chapters.is_none());
    assert!(third.chapters.is_none());
    let atoms = &second.chapters.as_ref().unwrap().edition_entry[0].chapter_atom;
    assert_eq!(atoms.len(), 1);
    // linking keeps the original clock
    assert_eq!(*atoms[0].chapter_time_start, 7_500_000_000);
}

#[test]
fn chapter_is_shifted_when_linking_is_off() {
    let config = MuxConfig {
        split: Some(SplitMode::Duration(5_000_000_000)),
        no_linking: true,
        ..MuxConfig::default()
    };
    let files = run_split(config, Some(test_chapters()));
    let (second, _) = parse(&files[1]);
    let atoms = &second.chapters.as_ref().unwrap().edition_entry[0].chapter_atom;
    assert_eq!(*atoms[0].chapter_time_start, 2_500_000_000);
}

#[test]
fn split_max_files_caps_the_chain() {
    let config = MuxConfig {
        split: Some(SplitMode::Duration(5_000_000_000)),
        split_max_files: 2,
        ..MuxConfig::default()
    };
    let files = run_split(config, None);
    assert_eq!(files.len(), 2);
    // the final file absorbs the rest of the stream
    let (second, _) = parse(&files[1]);
    assert_eq!(**second.info.duration.as_ref().unwrap(), 7_000.0);
}

#[test]
fn byte_split_rolls_over_near_the_threshold() {
    let config = MuxConfig {
        split: Some(SplitMode::Bytes(15_000)),
        cluster_length_ms: 1_000,
        ..MuxConfig::default()
    };
    let files = run_split(config, None);
    assert!(files.len() >= 2, "wrote {} files", files.len());
    // every file of the chain parses and carries clusters
    for bytes in &files {
        let (segment, _) = parse(bytes);
        assert!(!segment.cluster_positions.is_empty());
        assert_eq!(
            segment.segment_data_position + segment.segment_size,
            bytes.len() as u64
        );
    }
}

#[test]
fn external_link_uids_bracket_the_chain() {
    let previous = [0x11u8; 16];
    let next = [0x22u8; 16];
    let config = MuxConfig {
        split: Some(SplitMode::Duration(5_000_000_000)),
        link_to_previous: Some(previous),
        link_to_next: Some(next),
        ..MuxConfig::default()
    };
    let files = run_split(config, None);
    assert_eq!(files.len(), 3);

    let (first, _) = parse(&files[0]);
    let (second, _) = parse(&files[1]);
    let (third, _) = parse(&files[2]);

    // the external previous UID applies to the first file only
    assert_eq!(first.info.prev_uuid.as_ref().unwrap().0, previous.to_vec());
    assert_ne!(second.info.prev_uuid.as_ref().unwrap().0, previous.to_vec());
    // the external next UID replaces the stripped one on the last file
    assert_eq!(third.info.next_uuid.as_ref().unwrap().0, next.to_vec());
    assert_ne!(second.info.next_uuid.as_ref().unwrap().0, next.to_vec());
}

#[test]
fn keyframe_alignment_defers_the_split() {
    // key frames every second; asking for 2.5s files must split at 3s
    let config = MuxConfig {
        split: Some(SplitMode::Duration(2_500_000_000)),
        ..MuxConfig::default()
    };
    let files = run_split(config, None);
    let (first, _) = parse(&files[0]);
    assert_eq!(**first.info.duration.as_ref().unwrap(), 3_000.0);

    let (second, mut cursor) = parse(&files[1]);
    let cluster = second
        .read_cluster(&mut cursor, second.cluster_positions[0])
        .unwrap();
    // the second file opens with the 3s key frame
    assert_eq!(*cluster.timestamp, 3_000);
    let block = BlockView::parse(&cluster.block_group[0].block).unwrap();
    assert_eq!(block.relative_timecode, 0);
    assert!(cluster.block_group[0].reference_block.is_empty());
}
