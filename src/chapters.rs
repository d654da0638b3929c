//! Selecting and time-shifting chapters for split output files.

use crate::leaf::{ChapterTimeEnd, ChapterTimeStart};
use crate::master::{ChapterAtom, Chapters, EditionEntry};

/// The chapters that belong to the timeframe `[start, end)` of one output
/// file, with their timecodes shifted down by `offset` (all nanoseconds).
/// Atoms overlapping the boundary are kept, so a chapter spanning a split
/// appears in both files. Editions left without atoms are dropped; `None`
/// when nothing remains.
pub fn select_chapters_in_timeframe(
    chapters: &Chapters,
    start: i64,
    end: i64,
    offset: i64,
) -> Option<Chapters> {
    let edition_entry: Vec<EditionEntry> = chapters
        .edition_entry
        .iter()
        .filter_map(|edition| {
            let chapter_atom: Vec<ChapterAtom> = edition
                .chapter_atom
                .iter()
                .filter(|atom| overlaps(atom, start, end))
                .map(|atom| shift(atom, offset))
                .collect();
            if chapter_atom.is_empty() {
                None
            } else {
                Some(EditionEntry {
                    chapter_atom,
                    ..edition.clone()
                })
            }
        })
        .collect();

    if edition_entry.is_empty() {
        return None;
    }
    Some(Chapters {
        crc32: None,
        void: None,
        edition_entry,
    })
}

fn overlaps(atom: &ChapterAtom, start: i64, end: i64) -> bool {
    let atom_start = *atom.chapter_time_start as i64;
    let atom_end = atom
        .chapter_time_end
        .as_ref()
        .map(|e| **e as i64)
        .unwrap_or(atom_start);
    atom_start < end && atom_end >= start
}

fn shift(atom: &ChapterAtom, offset: i64) -> ChapterAtom {
    let mut shifted = atom.clone();
    shifted.chapter_time_start =
        ChapterTimeStart((*atom.chapter_time_start as i64 - offset).max(0) as u64);
    shifted.chapter_time_end = atom
        .chapter_time_end
        .as_ref()
        .map(|e| ChapterTimeEnd((**e as i64 - offset).max(0) as u64));
    shifted
}
